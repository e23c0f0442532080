use serde::{Deserialize, Serialize};

/// Connection settings for a [`RemoteStore`](crate::RemoteStore).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Server URL, e.g. `http://127.0.0.1:8085`.
    pub base_url: String,
    /// Prefix prepended to every logical path before it is sent.
    pub virtual_root: Option<String>,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_virtual_root(mut self, virtual_root: impl Into<String>) -> Self {
        self.virtual_root = Some(virtual_root.into());
        self
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8085".into(),
            virtual_root: None,
            timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = RemoteConfig::default();
        assert_eq!(c.base_url, "http://127.0.0.1:8085");
        assert!(c.virtual_root.is_none());
        assert_eq!(c.timeout_secs, 30);
    }

    #[test]
    fn from_toml() {
        let c: RemoteConfig =
            toml::from_str("base_url = \"http://blob:9000\"\nvirtual_root = \"tenant\"").unwrap();
        assert_eq!(c.base_url, "http://blob:9000");
        assert_eq!(c.virtual_root.as_deref(), Some("tenant"));
        assert_eq!(c.timeout_secs, 30);
    }
}
