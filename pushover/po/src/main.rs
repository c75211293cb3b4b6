#![deny(
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications
)]

//! po is a command line application based on Pushover API.
//!
//! If Pushover app key is "token" and user key is "user",
//!
//! ```
//! $ po -t token -u user -m message
//! ```
//!
//! Or you can set environment variables instead,
//!
//! ```
//! $ export PUSHOVER_TOKEN=token
//! $ export PUSHOVER_USER=user
//! $ po -m message
//! ```
//!
//! Or read keys from the `[pushover]` section of a configuration file,
//! `~/.pushover` is tried when the given one cannot be parsed,
//!
//! ```
//! $ cat ~/.pushover
//! [pushover]
//! app_key = token
//! user_key = user
//! $ po -c ./pushover.ini -m message
//! ```
//!
//! For more information,
//!
//! ```
//! $ po -h
//! ```

use std::borrow::Cow;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use log::{debug, error, Level, LevelFilter};
use logging_timer::{finish, stimer};

use pushover::{truncate_chars, Client, Notification, MESSAGE_MAX_LENGTH};

#[doc(hidden)]
#[derive(Debug, Parser)]
#[command(about, author, version)]
struct Opts {
    /// Location of the Pushover configuration file, ~/.pushover is tried next.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// The app key of the message sender application. <https://pushover.net/api#identifiers>
    #[arg(short = 't', long, env = "PUSHOVER_TOKEN")]
    app_key: Option<String>,
    /// The user / group key of the message receiver. <https://pushover.net/api#identifiers>
    #[arg(short, long, env = "PUSHOVER_USER")]
    user_key: Option<String>,
    /// Log at the DEBUG level.
    #[arg(short, long)]
    debug: bool,
    /// The message to send, will truncate to 512 characters. <https://pushover.net/api#messages>
    #[arg(short, long)]
    message: Option<String>,
    /// Your message's title, otherwise your app's name is used. <https://pushover.net/api#messages>
    #[arg(long)]
    title: Option<String>,
    /// A supplementary URL to show with your message. <https://pushover.net/api#urls>
    #[arg(long)]
    url: Option<String>,
    /// A title for your supplementary URL, otherwise just the URL is shown. <https://pushover.net/api#urls>
    #[arg(long)]
    url_title: Option<String>,
    /// Users can choose from a number of different default sounds to play when receiving notifications. <https://pushover.net/api#sounds>
    #[arg(long)]
    sound: Option<String>,
    /// Messages may be sent with a different priority that affects how the message is presented to the user
    /// e.g. -2, -1, 0, 1, 2. <https://pushover.net/api#priority>
    #[arg(long, allow_hyphen_values = true)]
    priority: Option<String>,
    /// Your user's device name to send the message directly to that device, rather than all of the user's devices. <https://pushover.net/api#identifiers>
    #[arg(long)]
    device: Option<String>,
}

impl Opts {
    /// Non-empty message truncated to [`MESSAGE_MAX_LENGTH`] characters.
    fn message(&self) -> Option<Cow<'_, str>> {
        self.message
            .as_deref()
            .filter(|m| !m.is_empty())
            .map(|m| truncate_chars(m, MESSAGE_MAX_LENGTH))
    }

    fn notification<'a>(&'a self, client: &'a Client, message: &'a str) -> Notification<'a> {
        let mut n = client.notification(message);
        n.title = self.title.as_deref();
        n.url = self.url.as_deref();
        n.url_title = self.url_title.as_deref();
        n.sound = self.sound.as_deref();
        n.priority = self.priority.as_deref();
        n.device = self.device.as_deref();
        n
    }
}

fn init_logger(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

#[doc(hidden)]
fn main() -> anyhow::Result<()> {
    if std::env::args_os().len() <= 1 {
        Opts::command().print_help()?;
        std::process::exit(1);
    }

    let opts: Opts = Opts::parse();
    init_logger(opts.debug);

    let client = match Client::resolve(
        opts.app_key.as_deref(),
        opts.user_key.as_deref(),
        opts.config.as_deref(),
    ) {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let message = match opts.message() {
        Some(m) => m,
        None => Opts::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "can't do anything without a message",
            )
            .exit(),
    };

    let notification = opts.notification(&client, &message);
    debug!("send notification with message {message:?}");

    let tmr = stimer!(Level::Debug; "NOTIFY");
    let res = notification.send();
    finish!(tmr);

    if let Err(e) = res {
        error!("something went wrong: {e}");
        std::process::exit(1);
    }
    Ok(())
}
