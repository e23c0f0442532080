use std::net::SocketAddr;
use std::path::Path;

use blobfs_store::StoreConfig;
use blobfs_types::MimePolicy;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

pub const DEFAULT_PORT: u16 = 8085;
pub const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024 * 1024;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreConfig,
    /// How request `Content-Type`s outside the supported set are handled.
    pub mime_policy: MimePolicy,
    /// Largest accepted request body, in bytes.
    pub max_body_size: usize,
}

impl ServerConfig {
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Read a TOML config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            store: StoreConfig::default(),
            mime_policy: MimePolicy::Strict,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}
