//! Session configuration

use crate::constants::DEFAULT_ROOT_CHANNEL;
use crate::error::{CashError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CashConfig {
    /// Root of the channel tree; coin channels live at `<root>/<organization>/coin`
    pub root_channel: String,

    /// Run the signature/ownership check on every delivered transaction
    /// before it reaches the ledger
    pub verify_signatures: bool,

    /// Default `tracing` filter, overridden by `RUST_LOG`
    pub log_filter: String,
}

impl Default for CashConfig {
    fn default() -> Self {
        Self {
            root_channel: DEFAULT_ROOT_CHANNEL.to_string(),
            verify_signatures: false,
            log_filter: "info".to_string(),
        }
    }
}

impl CashConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| CashError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CashError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    fn validate(&self) -> Result<()> {
        if !self.root_channel.starts_with('/') {
            return Err(CashError::Config(format!(
                "root_channel must start with '/': {}",
                self.root_channel
            )));
        }
        Ok(())
    }
}
