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

//! Pushover is a synchronous Pushover API client with configuration file support in Rust 2021 edition.

use std::borrow::Cow;
use std::path::Path;

use log::debug;
use serde::Deserialize;
use thiserror::Error;

pub use credentials::{default_config_path, load_first, ConfigError, Credentials};

mod credentials;

/// Messages are limited to 512 characters. <https://pushover.net/api#limits>
pub const MESSAGE_MAX_LENGTH: usize = 512;

/// Titles longer than this are truncated to [`TITLE_TRUNCATED_LENGTH`].
pub const TITLE_MAX_LENGTH: usize = 100;

/// Length of a title after truncation.
pub const TITLE_TRUNCATED_LENGTH: usize = 75;

/// Notification error.
#[derive(Error, Debug)]
pub enum NotificationError {
    /// Wrapped [`crate::ConfigError`].
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Message is longer than [`MESSAGE_MAX_LENGTH`], nothing is sent.
    #[error("message has {length} characters, bigger than {limit} characters")]
    MessageTooBig {
        /// Characters in the message.
        length: usize,
        /// Characters allowed.
        limit: usize,
    },
    /// Pushover API responded with a status other than 200.
    #[error("HTTP status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body as is.
        body: String,
        /// `errors` array, if the body is a Pushover API error.
        errors: Option<Vec<String>>,
    },
    /// Transport error from [`ureq`] crate e.g. DNS, connection or TLS failure.
    #[error("ureq error: {0}")]
    Transport(#[from] Box<ureq::Error>),
    /// IO error while reading the response body.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Kind of [`NotificationError`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// No credentials, or no usable configuration file.
    Configuration,
    /// Message is too big.
    MessageTooBig,
    /// HTTP request failed or was rejected.
    Http,
}

impl NotificationError {
    /// Returns the [`ErrorKind`] of the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            NotificationError::Config(_) => ErrorKind::Configuration,
            NotificationError::MessageTooBig { .. } => ErrorKind::MessageTooBig,
            NotificationError::Status { .. }
            | NotificationError::Transport(_)
            | NotificationError::Io(_) => ErrorKind::Http,
        }
    }
}

/// Form field of Pushover API. <https://pushover.net/api#messages>
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::AsRefStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    /// Application key.
    Token,
    /// User or group key.
    User,
    /// Message.
    Message,
    /// Title.
    Title,
    /// Supplementary URL.
    Url,
    /// Title of the supplementary URL.
    UrlTitle,
    /// Sound.
    Sound,
    /// Priority.
    Priority,
    /// Device name.
    Device,
}

/// Form fields to be sent, in order.
pub type Payload<'a> = Vec<(Field, Cow<'a, str>)>;

/// Pushover API parameters. <https://pushover.net/api#messages>
///
/// Empty optional parameters are treated as absent.
#[derive(Default, Debug)]
pub struct Notification<'a> {
    token: Cow<'a, str>,
    identifier: Cow<'a, str>,
    message: Cow<'a, str>,
    /// Your user's device name to send the message directly to that device,
    /// rather than all of the user's devices (multiple devices may be separated by a comma).
    /// <https://pushover.net/api#identifiers>
    pub device: Option<&'a str>,
    /// Your message's title, otherwise your app's name is used. <https://pushover.net/api#messages>
    ///
    /// Titles longer than [`TITLE_MAX_LENGTH`] are truncated to [`TITLE_TRUNCATED_LENGTH`].
    pub title: Option<&'a str>,
    /// Messages may be sent with a different priority that affects
    /// how the message is presented to the user e.g. `-2` to `2`. <https://pushover.net/api#priority>
    pub priority: Option<&'a str>,
    /// A supplementary URL to show with your message. <https://pushover.net/api#urls>
    pub url: Option<&'a str>,
    /// A title for your supplementary URL,
    /// otherwise just the URL is shown. <https://pushover.net/api#urls>
    pub url_title: Option<&'a str>,
    /// Users can choose from a number of different default sounds
    /// to play when receiving notifications. <https://pushover.net/api#sounds>
    pub sound: Option<&'a str>,
}

#[cfg(test)]
fn server_url() -> String {
    mockito::server_url()
}

#[cfg(not(test))]
fn server_url() -> String {
    "https://api.pushover.net".to_string()
}

/// Shorthand function to send notification to Pushover.
/// ```no_run
/// use pushover::send_notification;
/// let _ = send_notification("token", "user", "message");
/// let _ = send_notification("token", "group", "message");
/// ```
pub fn send_notification<'a, S>(
    token: S,
    identifier: S,
    message: S,
) -> Result<(), NotificationError>
where
    S: Into<Cow<'a, str>>,
{
    Notification::new(token, identifier, message).send()
}

/// Keeps the first `max` characters.
#[doc(hidden)]
pub fn truncate_chars<'a, T>(s: T, max: usize) -> Cow<'a, str>
where
    T: Into<Cow<'a, str>>,
{
    let s = s.into();
    let cut = s.char_indices().nth(max).map(|(i, _)| i);
    match (cut, s) {
        (Some(i), Cow::Borrowed(b)) => Cow::Borrowed(&b[..i]),
        (Some(i), Cow::Owned(mut o)) => {
            o.truncate(i);
            Cow::Owned(o)
        }
        (None, s) => s,
    }
}

fn add_optional_text<'a>(p: &mut Payload<'a>, f: Field, v: Option<&'a str>) {
    if let Some(v) = v.filter(|v| !v.is_empty()) {
        p.push((f, Cow::Borrowed(v)));
    }
}

impl<'a> Notification<'a> {
    /// Creates a [`Notification`].
    ///
    /// Instead of a user key, a group key may be supplied. Group keys look identical
    /// to user keys and from your application's perspective, you do not need to
    /// distinguish between them.
    ///
    /// ```rust
    /// # use pushover::Notification;
    /// // Notify user
    /// Notification::new("token", "user", "message");
    /// // Notify group of users
    /// Notification::new("token", "group", "message");
    /// ```
    pub fn new<T>(token: T, identifier: T, message: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        Self {
            token: token.into(),
            identifier: identifier.into(),
            message: message.into(),
            ..Default::default()
        }
    }

    /// Validates the message and builds form fields without sending anything.
    pub fn payload(&self) -> Result<Payload<'_>, NotificationError> {
        let length = self.message.chars().count();
        if length > MESSAGE_MAX_LENGTH {
            return Err(NotificationError::MessageTooBig {
                length,
                limit: MESSAGE_MAX_LENGTH,
            });
        }

        let mut p = vec![
            (Field::Token, Cow::Borrowed(&*self.token)),
            (Field::User, Cow::Borrowed(&*self.identifier)), // User or group key
            (Field::Message, Cow::Borrowed(&*self.message)),
        ];

        if let Some(t) = self.title.filter(|t| !t.is_empty()) {
            let t = if t.chars().count() > TITLE_MAX_LENGTH {
                truncate_chars(t, TITLE_TRUNCATED_LENGTH)
            } else {
                Cow::Borrowed(t)
            };
            p.push((Field::Title, t));
        }
        add_optional_text(&mut p, Field::Url, self.url);
        add_optional_text(&mut p, Field::UrlTitle, self.url_title);
        add_optional_text(&mut p, Field::Sound, self.sound);
        add_optional_text(&mut p, Field::Priority, self.priority);
        add_optional_text(&mut p, Field::Device, self.device);

        Ok(p)
    }

    /// Send [`Notification`] to Pushover.
    pub fn send(&self) -> Result<(), NotificationError> {
        self.send_to(&server_url())
    }

    fn send_to(&self, host: &str) -> Result<(), NotificationError> {
        let payload = self.payload()?;
        let form: Vec<(&str, &str)> = payload
            .iter()
            .map(|(f, v)| (f.as_ref(), &**v))
            .collect();

        let uri = format!("{host}/1/messages.json");
        debug!("send notification to {uri}");

        let response = match ureq::post(&uri).send_form(&form) {
            Ok(r) => r,
            Err(ureq::Error::Status(_, r)) => return Err(status_error(r)),
            Err(e) => return Err(NotificationError::Transport(Box::new(e))),
        };
        if response.status() != 200 {
            return Err(status_error(response));
        }
        Ok(())
    }
}

fn status_error(response: ureq::Response) -> NotificationError {
    let status = response.status();
    let body = match response.into_string() {
        Ok(b) => b,
        Err(e) => return NotificationError::Io(e),
    };
    let errors = serde_json::from_str::<Response>(&body)
        .ok()
        .and_then(|r| r.errors);
    debug!("Pushover responded with {status}: {body}");
    NotificationError::Status {
        status,
        body,
        errors,
    }
}

/// Pushover API response. <https://pushover.net/api#response>
#[derive(Debug, Deserialize)]
pub struct Response {
    /// If POST request to API was valid, we will receive an HTTP 200 (OK) status, with a JSON object containing a status code of `1`.
    pub status: u8,
    /// The `request` parameter returned from all API calls is a randomly-generated unique token that we have associated with your request.
    pub request: String,
    /// ...and an `errors` array detailing which parameters were invalid.
    pub errors: Option<Vec<String>>,
}

/// Pushover client holding resolved [`Credentials`].
#[derive(Clone, Debug)]
pub struct Client {
    credentials: Credentials,
}

impl Client {
    /// Creates a [`Client`].
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    /// Creates a [`Client`] with [`Credentials::resolve`].
    pub fn resolve(
        app_key: Option<&str>,
        user_key: Option<&str>,
        config: Option<&Path>,
    ) -> Result<Self, NotificationError> {
        Ok(Self::new(Credentials::resolve(app_key, user_key, config)?))
    }

    /// Resolved [`Credentials`].
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Creates a [`Notification`] with keys of this client.
    ///
    /// ```rust
    /// # use pushover::{Client, Credentials};
    /// let client = Client::new(Credentials::new("token", "user"));
    /// let mut n = client.notification("message");
    /// n.title = Some("title");
    /// ```
    pub fn notification<'a>(&'a self, message: &'a str) -> Notification<'a> {
        Notification::new(
            self.credentials.app_key.as_str(),
            self.credentials.user_key.as_str(),
            message,
        )
    }

    /// Sends a message without optional parameters.
    pub fn send_message(&self, message: &str) -> Result<(), NotificationError> {
        self.notification(message).send()
    }
}
