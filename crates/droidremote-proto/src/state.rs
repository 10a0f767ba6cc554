use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Shown in the address field when nothing is remembered.
pub const PLACEHOLDER_ADDRESS: &str = "192.168.1.XXX";

/// Connection bookkeeping owned by the bridge core.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionState {
    /// Address of the most recent connect request, used verbatim.
    pub address: String,
    /// Set by the first successful connect; a failed attempt leaves it as is.
    pub connected: bool,
    /// Connect attempts queued or running.
    pub connecting: u32,
}

impl ConnectionState {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            connected: false,
            connecting: 0,
        }
    }

    pub fn is_connecting(&self) -> bool {
        self.connecting > 0
    }
}

/// Single-line file remembering the last device address.
#[derive(Debug, Clone)]
pub struct RememberedAddress {
    path: PathBuf,
}

impl RememberedAddress {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The remembered address, if any. A missing or empty file means none;
    /// unreadable files are logged and treated the same way.
    pub fn load(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let address = content.lines().next().unwrap_or("");
                if address.trim().is_empty() {
                    None
                } else {
                    Some(address.to_string())
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!(
                    "Failed to read remembered address {}: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    pub fn save(&self, address: &str) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, format!("{}\n", address))?;
        debug!("Remembered address {} in {}", address, self.path.display());
        Ok(())
    }

    pub fn clear(&self) -> anyhow::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Removed remembered address {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply the remember-me toggle for a connect request.
    pub fn apply(&self, address: &str, remember: bool) -> anyhow::Result<()> {
        if remember {
            self.save(address)
        } else {
            self.clear()
        }
    }
}
