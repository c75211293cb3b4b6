use std::borrow::Cow;
use std::path::{Path, PathBuf};

use ini::{Ini, ParseOption};
use log::debug;
use thiserror::Error;

/// Section holding the keys in the configuration file.
pub const CONFIG_SECTION: &str = "pushover";

/// Filename of the default configuration file in the home directory.
pub const DEFAULT_CONFIG_FILENAME: &str = ".pushover";

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Neither both keys nor a configuration file were given.
    #[error("no configuration provided")]
    NoConfiguration,
    /// None of the candidate configuration files could be read and parsed.
    #[error("no valid configuration found in {0:?}")]
    NoValidConfiguration(Vec<PathBuf>),
    /// Configuration file parsed but has no `[pushover]` section.
    #[error("section [{section}] not found in {path:?}")]
    MissingSection {
        /// Configuration file.
        path: PathBuf,
        /// Expected section.
        section: &'static str,
    },
    /// Configuration file parsed but the section lacks a key.
    #[error("key {key} not found in section [{section}] of {path:?}")]
    MissingKey {
        /// Configuration file.
        path: PathBuf,
        /// Section searched.
        section: &'static str,
        /// Missing key.
        key: &'static str,
    },
}

/// Application key and user key. <https://pushover.net/api#identifiers>
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Credentials {
    /// Your application's API token.
    pub app_key: String,
    /// The user / group key (not e-mail address) of your user (or you).
    pub user_key: String,
}

/// `~/.pushover`, or [`None`] if the home directory cannot be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(DEFAULT_CONFIG_FILENAME))
}

/// Values are taken literally: no quote stripping, no backslash escapes.
fn parse_option() -> ParseOption {
    ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..Default::default()
    }
}

/// Returns the first candidate which can be read and parsed as INI, along with its path.
pub fn load_first<I, P>(candidates: I) -> Option<(PathBuf, Ini)>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    candidates.into_iter().find_map(|p| {
        let p = p.as_ref();
        match Ini::load_from_file_opt(p, parse_option()) {
            Ok(ini) => {
                debug!("configuration loaded from {p:?}");
                Some((p.to_path_buf(), ini))
            }
            Err(e) => {
                debug!("skip configuration {p:?}: {e}");
                None
            }
        }
    })
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

impl Credentials {
    /// Creates [`Credentials`] from keys directly.
    pub fn new<'a, T>(app_key: T, user_key: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        Self {
            app_key: app_key.into().into_owned(),
            user_key: user_key.into().into_owned(),
        }
    }

    /// Resolves [`Credentials`].
    ///
    /// Keys given directly win when both are non-empty. Otherwise `config` is required,
    /// and `config` then `~/.pushover` are tried in order; the first one that parses is used.
    ///
    /// ```rust
    /// # use pushover::Credentials;
    /// let c = Credentials::resolve(Some("token"), Some("user"), None)?;
    /// assert_eq!("token", c.app_key);
    /// # Ok::<(), pushover::ConfigError>(())
    /// ```
    pub fn resolve(
        app_key: Option<&str>,
        user_key: Option<&str>,
        config: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        Self::resolve_with_default(app_key, user_key, config, default_config_path())
    }

    pub(crate) fn resolve_with_default(
        app_key: Option<&str>,
        user_key: Option<&str>,
        config: Option<&Path>,
        default: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        if let (Some(a), Some(u)) = (non_empty(app_key), non_empty(user_key)) {
            debug!("use provided app key and user key");
            return Ok(Self::new(a, u));
        }

        let config = match config {
            Some(c) => c,
            None => return Err(ConfigError::NoConfiguration),
        };

        debug!("use app key and user key from configuration file");
        let mut candidates = vec![config.to_path_buf()];
        candidates.extend(default);

        let (path, ini) = match load_first(&candidates) {
            Some(found) => found,
            None => return Err(ConfigError::NoValidConfiguration(candidates)),
        };
        Self::from_ini(&path, &ini)
    }

    fn from_ini(path: &Path, ini: &Ini) -> Result<Self, ConfigError> {
        let section = ini
            .section(Some(CONFIG_SECTION))
            .ok_or_else(|| ConfigError::MissingSection {
                path: path.to_path_buf(),
                section: CONFIG_SECTION,
            })?;
        // key names are case-insensitive
        let get = |key: &'static str| {
            section
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
                .ok_or_else(|| ConfigError::MissingKey {
                    path: path.to_path_buf(),
                    section: CONFIG_SECTION,
                    key,
                })
        };
        Ok(Self::new(get("app_key")?, get("user_key")?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write as _;

    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    fn resolve(
        app_key: Option<&str>,
        user_key: Option<&str>,
        config: Option<&Path>,
    ) -> Result<Credentials, ConfigError> {
        Credentials::resolve_with_default(app_key, user_key, config, None)
    }

    #[test]
    fn t_explicit_keys() -> Result<(), ConfigError> {
        let c = resolve(Some("k1"), Some("k2"), None)?;
        assert_eq!(Credentials::new("k1", "k2"), c);
        Ok(())
    }

    #[test]
    fn t_explicit_keys_over_config() -> Result<(), ConfigError> {
        let f = write_config("[pushover]\napp_key = file_app\nuser_key = file_user\n");
        let c = resolve(Some("k1"), Some("k2"), Some(f.path()))?;
        assert_eq!("k1", c.app_key);
        assert_eq!("k2", c.user_key);
        Ok(())
    }

    #[test]
    fn t_explicit_keys_bypass_malformed_config() -> Result<(), ConfigError> {
        let f = write_config("[pushover");
        let c = resolve(Some("k1"), Some("k2"), Some(f.path()))?;
        assert_eq!(Credentials::new("k1", "k2"), c);
        Ok(())
    }

    #[test]
    fn t_no_configuration() {
        let e = resolve(None, None, None).unwrap_err();
        assert!(matches!(e, ConfigError::NoConfiguration));

        // one key alone is not enough
        let e = resolve(Some("k1"), None, None).unwrap_err();
        assert!(matches!(e, ConfigError::NoConfiguration));

        let e = resolve(Some(""), Some(""), None).unwrap_err();
        assert!(matches!(e, ConfigError::NoConfiguration));
    }

    #[test]
    fn t_config_file() -> Result<(), ConfigError> {
        let f = write_config("[pushover]\napp_key = file_app\nuser_key = file_user\n");
        let c = resolve(None, None, Some(f.path()))?;
        assert_eq!(Credentials::new("file_app", "file_user"), c);

        let c = resolve(Some("k1"), Some(""), Some(f.path()))?;
        assert_eq!(Credentials::new("file_app", "file_user"), c);
        Ok(())
    }

    #[test]
    fn t_malformed_config() {
        let f = write_config("[pushover");
        let e = resolve(None, None, Some(f.path())).unwrap_err();
        match e {
            ConfigError::NoValidConfiguration(tried) => assert_eq!(vec![f.path().to_path_buf()], tried),
            e => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn t_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("nonexistent");
        let e = resolve(None, None, Some(&p)).unwrap_err();
        assert!(matches!(e, ConfigError::NoValidConfiguration(_)));
    }

    #[test]
    fn t_fallback_to_default() -> Result<(), ConfigError> {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nonexistent");
        let default = write_config("[pushover]\napp_key = home_app\nuser_key = home_user\n");
        let c = Credentials::resolve_with_default(
            None,
            None,
            Some(&missing),
            Some(default.path().to_path_buf()),
        )?;
        assert_eq!(Credentials::new("home_app", "home_user"), c);
        Ok(())
    }

    #[test]
    fn t_explicit_path_before_default() -> Result<(), ConfigError> {
        let explicit = write_config("[pushover]\napp_key = a1\nuser_key = u1\n");
        let default = write_config("[pushover]\napp_key = a2\nuser_key = u2\n");
        let c = Credentials::resolve_with_default(
            None,
            None,
            Some(explicit.path()),
            Some(default.path().to_path_buf()),
        )?;
        assert_eq!(Credentials::new("a1", "u1"), c);
        Ok(())
    }

    #[test]
    fn t_missing_section() {
        let f = write_config("[other]\napp_key = a\nuser_key = u\n");
        let e = resolve(None, None, Some(f.path())).unwrap_err();
        assert!(matches!(
            e,
            ConfigError::MissingSection {
                section: "pushover",
                ..
            }
        ));
    }

    #[test]
    fn t_literal_values() -> Result<(), ConfigError> {
        let f = write_config("[pushover]\napp_key = a\\tb\nuser_key = \"u v\"\n");
        let c = resolve(None, None, Some(f.path()))?;
        assert_eq!("a\\tb", c.app_key);
        assert_eq!("\"u v\"", c.user_key);
        Ok(())
    }

    #[test]
    fn t_key_case_insensitive() -> Result<(), ConfigError> {
        let f = write_config("[pushover]\nApp_Key = a\nUSER_KEY = u\n");
        let c = resolve(None, None, Some(f.path()))?;
        assert_eq!(Credentials::new("a", "u"), c);
        Ok(())
    }

    #[test]
    fn t_missing_key() {
        let f = write_config("[pushover]\napp_key = a\n");
        let e = resolve(None, None, Some(f.path())).unwrap_err();
        assert!(matches!(
            e,
            ConfigError::MissingKey {
                key: "user_key",
                ..
            }
        ));
    }

    #[test]
    fn t_load_first() {
        let dir = tempfile::tempdir().unwrap();
        let bad = write_config("[pushover");
        let good = write_config("[pushover]\napp_key = a\n");
        let candidates = vec![
            dir.path().join("nonexistent"),
            bad.path().to_path_buf(),
            good.path().to_path_buf(),
        ];
        let (path, ini) = load_first(&candidates).unwrap();
        assert_eq!(good.path(), path.as_path());
        assert_eq!(
            Some("a"),
            ini.section(Some(CONFIG_SECTION)).and_then(|s| s.get("app_key"))
        );

        assert!(load_first(&candidates[..2]).is_none());
        assert!(load_first(Vec::<PathBuf>::new()).is_none());
    }
}
