pub mod env {
    pub const APP_ENVIRONMENT_ENV_VAR: &str = "APP_ENVIRONMENT";
    pub const CONFIGURATION_DIR_ENV_VAR: &str = "KEYSTONE_CONFIGURATION_DIR";
    pub const ENV_PREFIX: &str = "KEYSTONE";
    pub const ENV_SEPARATOR: &str = "__";
}

pub const DEFAULT_ENVIRONMENT: &str = "local";
pub const DEFAULT_CONFIGURATION_DIR: &str = "configuration";

/// Values used by integration tests to stand up a throwaway service.
pub mod test {
    pub const HOST: &str = "127.0.0.1";
    pub const PORT: u16 = 0;
    pub const BASE_URL: &str = "http://localhost:8080";
    pub const SIGNING_KEY: &str = "keystone-test-signing-key";
    pub const POLL_INTERVAL_MS: u64 = 50;
    pub const WEBHOOK_TIMEOUT_MS: u64 = 200;
}
