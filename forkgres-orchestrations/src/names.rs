//! Name constants for emitted outputs and persisted state entries

/// Outputs emitted after a fork becomes ready
pub mod outputs {
    pub const SERVICE_ID: &str = "service_id";
    pub const NAME: &str = "name";
    pub const HOST: &str = "host";
    pub const PORT: &str = "port";
    /// Redacted from every log line once known
    pub const INITIAL_PASSWORD: &str = "initial_password";
}

/// Entries written by the fork phase and read by the teardown phase
pub mod state {
    /// `true` when the teardown phase should delete the fork
    pub const CLEANUP: &str = "cleanup";
    pub const SERVICE_ID: &str = "service_id";
    pub const PROJECT_ID: &str = "project_id";
    /// API key in `PUBLIC:SECRET` form
    pub const API_KEY: &str = "api_key";
}
