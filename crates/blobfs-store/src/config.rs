use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How `set` treats a content type that differs from the stored one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetTypePolicy {
    /// Overwrite the content and keep the stored type.
    #[default]
    Keep,
    /// Re-encode the file name with the new type.
    Replace,
}

/// Configuration for [`FsBlobStore`](crate::FsBlobStore).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding one subdirectory per bucket.
    pub root: PathBuf,
    pub set_type_policy: SetTypePolicy,
}

impl StoreConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn with_set_type_policy(mut self, policy: SetTypePolicy) -> Self {
        self.set_type_policy = policy;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./blob"),
            set_type_policy: SetTypePolicy::Keep,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = StoreConfig::default();
        assert_eq!(c.root, PathBuf::from("./blob"));
        assert_eq!(c.set_type_policy, SetTypePolicy::Keep);
    }

    #[test]
    fn builder() {
        let c = StoreConfig::new("/data").with_set_type_policy(SetTypePolicy::Replace);
        assert_eq!(c.root, PathBuf::from("/data"));
        assert_eq!(c.set_type_policy, SetTypePolicy::Replace);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let c: StoreConfig = toml::from_str("root = \"/srv\"").unwrap();
        assert_eq!(c.root, PathBuf::from("/srv"));
        assert_eq!(c.set_type_policy, SetTypePolicy::Keep);

        let c: StoreConfig = toml::from_str("set_type_policy = \"replace\"").unwrap();
        assert_eq!(c.set_type_policy, SetTypePolicy::Replace);
    }
}
