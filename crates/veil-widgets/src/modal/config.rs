#![forbid(unsafe_code)]

//! Modal configuration.
//!
//! With the `policy-config` feature a [`ModalConfig`] can be loaded from TOML
//! or JSON. Missing keys take their defaults; the fade duration travels as
//! `fade_duration_ms`.
//!
//! ```toml
//! close_on_esc = false
//! fade_duration_ms = 150
//! aria_labelledby = "settings-title"
//! ```

use std::time::Duration;

/// Default fade duration, also the initial-focus delay.
pub const DEFAULT_FADE_DURATION: Duration = Duration::from_millis(300);

/// Modal configuration.
///
/// Read-only for the lifetime of a session. Changing `close_on_esc` or
/// `fade_duration` on an open modal restarts its session; every other field
/// only re-renders.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "policy-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct ModalConfig {
    pub show_close_button: bool,
    pub close_on_esc: bool,
    pub close_on_overlay_click: bool,
    #[cfg_attr(
        feature = "policy-config",
        serde(rename = "fade_duration_ms", with = "duration_ms")
    )]
    pub fade_duration: Duration,
    pub show_spinner: bool,
    pub aria_labelledby: Option<String>,
    pub aria_describedby: Option<String>,
    pub overlay_class: String,
    pub modal_class: String,
}

impl Default for ModalConfig {
    fn default() -> Self {
        Self {
            show_close_button: true,
            close_on_esc: true,
            close_on_overlay_click: true,
            fade_duration: DEFAULT_FADE_DURATION,
            show_spinner: false,
            aria_labelledby: Some("modal-title".to_owned()),
            aria_describedby: Some("modal-description".to_owned()),
            overlay_class: String::new(),
            modal_class: String::new(),
        }
    }
}

impl ModalConfig {
    pub fn show_close_button(mut self, show: bool) -> Self {
        self.show_close_button = show;
        self
    }

    pub fn close_on_esc(mut self, close: bool) -> Self {
        self.close_on_esc = close;
        self
    }

    pub fn close_on_overlay_click(mut self, close: bool) -> Self {
        self.close_on_overlay_click = close;
        self
    }

    pub fn fade_duration(mut self, duration: Duration) -> Self {
        self.fade_duration = duration;
        self
    }

    pub fn show_spinner(mut self, show: bool) -> Self {
        self.show_spinner = show;
        self
    }

    /// Id of the element labelling the dialog. `None` omits the attribute.
    pub fn aria_labelledby(mut self, id: Option<impl Into<String>>) -> Self {
        self.aria_labelledby = id.map(Into::into);
        self
    }

    /// Id of the element describing the dialog. `None` omits the attribute.
    pub fn aria_describedby(mut self, id: Option<impl Into<String>>) -> Self {
        self.aria_describedby = id.map(Into::into);
        self
    }

    pub fn overlay_class(mut self, class: impl Into<String>) -> Self {
        self.overlay_class = class.into();
        self
    }

    pub fn modal_class(mut self, class: impl Into<String>) -> Self {
        self.modal_class = class.into();
        self
    }

    /// Whether moving from `self` to `next` requires a new session.
    ///
    /// Only the fields captured by the keydown listener and the focus timer
    /// count; the rest are read at render time.
    pub fn requires_restart(&self, next: &ModalConfig) -> bool {
        self.close_on_esc != next.close_on_esc || self.fade_duration != next.fade_duration
    }

    /// Whether moving from `self` to `next` changes which nodes the dialog
    /// holds. Other fields only touch attributes and handlers.
    pub fn rebuilds_content(&self, next: &ModalConfig) -> bool {
        self.show_close_button != next.show_close_button || self.show_spinner != next.show_spinner
    }
}

#[cfg(feature = "policy-config")]
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(feature = "policy-config")]
pub use loading::{ConfigError, ConfigFormat};

#[cfg(feature = "policy-config")]
mod loading {
    use std::fmt;
    use std::io;
    use std::path::{Path, PathBuf};

    use super::ModalConfig;

    /// Serialized config format.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ConfigFormat {
        Toml,
        Json,
    }

    impl ConfigFormat {
        /// Guess the format from a file extension.
        pub fn from_path(path: &Path) -> Option<Self> {
            match path.extension()?.to_str()? {
                ext if ext.eq_ignore_ascii_case("toml") => Some(Self::Toml),
                ext if ext.eq_ignore_ascii_case("json") => Some(Self::Json),
                _ => None,
            }
        }
    }

    impl fmt::Display for ConfigFormat {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::Toml => f.write_str("TOML"),
                Self::Json => f.write_str("JSON"),
            }
        }
    }

    /// Errors from loading a [`ModalConfig`].
    #[derive(Debug)]
    pub enum ConfigError {
        /// The file could not be read.
        Io { path: PathBuf, source: io::Error },
        /// The extension names no supported format.
        UnsupportedFormat(PathBuf),
        /// The text did not describe a valid config.
        Parse { format: ConfigFormat, message: String },
    }

    impl fmt::Display for ConfigError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::Io { path, source } => {
                    write!(f, "failed to read {}: {source}", path.display())
                }
                Self::UnsupportedFormat(path) => {
                    write!(f, "unsupported config format: {}", path.display())
                }
                Self::Parse { format, message } => write!(f, "invalid {format} config: {message}"),
            }
        }
    }

    impl std::error::Error for ConfigError {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            match self {
                Self::Io { source, .. } => Some(source),
                _ => None,
            }
        }
    }

    impl ModalConfig {
        pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
            toml::from_str(text).map_err(|err| ConfigError::Parse {
                format: ConfigFormat::Toml,
                message: err.to_string(),
            })
        }

        pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
            serde_json::from_str(text).map_err(|err| ConfigError::Parse {
                format: ConfigFormat::Json,
                message: err.to_string(),
            })
        }

        /// Load from a `.toml` or `.json` file.
        pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
            let path = path.as_ref();
            let format = ConfigFormat::from_path(path)
                .ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;
            let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let config = match format {
                ConfigFormat::Toml => Self::from_toml_str(&text)?,
                ConfigFormat::Json => Self::from_json_str(&text)?,
            };
            debug_event!(path = %path.display(), %format, "modal config loaded");
            Ok(config)
        }
    }
}
