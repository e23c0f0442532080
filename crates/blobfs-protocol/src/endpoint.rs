/// HTTP endpoint paths for the blobfs protocol.
pub mod endpoints {
    /// Blob routes: `/b/{bucket}/{name}`.
    pub const BLOB: &str = "/b";
    /// Bucket routes: `/d/{bucket}`.
    pub const BUCKET: &str = "/d";
    pub const HEALTH: &str = "/v1/health";
}

/// Health check response.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub protocol_version: u32,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            protocol_version: super::message::PROTOCOL_VERSION,
        }
    }
}
