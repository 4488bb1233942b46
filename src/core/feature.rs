//! Extension declarations and configure argument assembly.

use serde::{Deserialize, Serialize};

use crate::util::errors::NarError;

/// Configure arguments used for Unix builds when nothing else is given.
pub const DEFAULT_UNIX_CONFIGURE_ARGS: &str = "--enable-cli --enable-embed=shared";

/// Configure arguments used for Windows builds when nothing else is given.
pub const DEFAULT_WINDOWS_CONFIGURE_ARGS: &str = "--enable-cli";

/// A PHP extension switched on or off at configure time.
///
/// `enable` maps to `--enable-*`/`--disable-*`, `with` to
/// `--with-*`/`--without-*`. `shared` selects `=shared` or `=static` and is
/// ignored for disabled extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Extension {
    pub name: String,
    pub enable: Option<bool>,
    pub with: Option<bool>,
    pub shared: Option<bool>,
}

impl Extension {
    /// An `--enable-<name>` style extension.
    pub fn enable(name: impl Into<String>, enabled: bool) -> Self {
        Extension {
            name: name.into(),
            enable: Some(enabled),
            ..Default::default()
        }
    }

    /// A `--with-<name>` style extension.
    pub fn with(name: impl Into<String>, enabled: bool) -> Self {
        Extension {
            name: name.into(),
            with: Some(enabled),
            ..Default::default()
        }
    }

    /// Set the shared/static choice.
    pub fn shared(mut self, shared: bool) -> Self {
        self.shared = Some(shared);
        self
    }

    /// Render this extension as a single configure token.
    pub fn to_configure_flag(&self) -> Result<String, NarError> {
        if self.name.is_empty() {
            return Err(NarError::invalid_feature("extension name not set"));
        }

        let (switch, on) = match (self.enable, self.with) {
            (Some(on), with) => {
                if with.is_some() {
                    tracing::warn!(
                        "extension {} sets both enable and with; using enable",
                        self.name
                    );
                }
                (if on { "enable" } else { "disable" }, on)
            }
            (None, Some(on)) => (if on { "with" } else { "without" }, on),
            (None, None) => {
                return Err(NarError::invalid_feature(format!(
                    "either set enable or with flag for extension {}",
                    self.name
                )))
            }
        };

        let mut flag = format!("--{}-{}", switch, self.name);
        if on {
            match self.shared {
                Some(true) => flag.push_str("=shared"),
                Some(false) => flag.push_str("=static"),
                None => {}
            }
        }
        Ok(flag)
    }
}

/// Assemble the configure argument string.
///
/// The base is the item override, else the global override, else
/// `default_value` when both are missing or empty. One token per extension
/// follows, in declaration order.
pub fn configure_args(
    item_override: Option<&str>,
    global_override: Option<&str>,
    default_value: &str,
    extensions: &[Extension],
) -> Result<String, NarError> {
    let mut configure = item_override.or(global_override).unwrap_or("").to_string();
    if configure.is_empty() {
        configure = default_value.to_string();
    }

    for ext in extensions {
        let flag = ext.to_configure_flag()?;
        if !configure.is_empty() {
            configure.push(' ');
        }
        configure.push_str(&flag);
    }

    Ok(configure)
}
