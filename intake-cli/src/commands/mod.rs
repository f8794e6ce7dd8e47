pub mod key;
pub mod predict;
pub mod records;
pub mod register;

use crate::client::ApiClient;

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

/// Global context passed to all commands
pub struct Context {
    pub json_output: bool,
    pub server_override: Option<String>,
}

impl Context {
    /// Priority: --server flag > $INTAKE_SERVER env > default
    ///
    /// $INTAKE_SERVER is already folded into `server_override` by clap.
    pub fn server_url(&self) -> &str {
        self.server_override.as_deref().unwrap_or(DEFAULT_SERVER)
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(self.server_url().to_string())
    }
}
