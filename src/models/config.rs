//! Configuration model loaded from external sources.

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
/// Settings shared across handlers.
pub struct ServerConfig {
    pub domain: String,
    pub address: String,
    pub port: u16,
    pub database_url: String,
    /// Directory uploaded documents are written to.
    pub upload_dir: String,
    /// Public URL prefix the upload directory is served under.
    pub documents_url: String,
    /// HS256 secret for bearer tokens.
    pub secret: String,
    /// Allowed browser origin. Any origin is accepted when unset.
    #[serde(default)]
    pub cors_origin: Option<String>,
}
