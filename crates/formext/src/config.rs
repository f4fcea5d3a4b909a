//! # Configuration
//!
//! formext has very little to configure: the strings it invents on the
//! caller's behalf. Loading is handled by [`confique`].
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `FORMEXT_NOTIFICATION_ID_PREFIX`, `FORMEXT_LOOKUP_NAME_SEPARATOR`.
//! 2. **TOML file**: whatever path the host passes to [`FormConfig::load`].
//! 3. **Compiled Defaults**: `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `notification_id_prefix` | `setNotification_` | Prefix of the notification id used when none is given |
//! | `lookup_name_separator` | `, ` | Joins referenced names in lookup display values |

use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

pub const DEFAULT_NOTIFICATION_ID_PREFIX: &str = "setNotification_";
pub const DEFAULT_LOOKUP_NAME_SEPARATOR: &str = ", ";

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FormConfig {
    /// Prefix of the default notification id; the control name is appended.
    #[config(env = "FORMEXT_NOTIFICATION_ID_PREFIX", default = "setNotification_")]
    pub notification_id_prefix: String,

    /// Separator between referenced names when displaying a lookup.
    #[config(env = "FORMEXT_LOOKUP_NAME_SEPARATOR", default = ", ")]
    pub lookup_name_separator: String,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            notification_id_prefix: DEFAULT_NOTIFICATION_ID_PREFIX.to_string(),
            lookup_name_separator: DEFAULT_LOOKUP_NAME_SEPARATOR.to_string(),
        }
    }
}

impl FormConfig {
    /// Loads from the environment, then `path`, then defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::builder().env().file(path.as_ref()).load()?)
    }

    /// Loads from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Ok(Self::builder().env().load()?)
    }

    /// Id used for a control's notification when the caller gives none.
    pub fn notification_id(&self, control: &str) -> String {
        format!("{}{}", self.notification_id_prefix, control)
    }
}
