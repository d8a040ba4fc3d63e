use core::time::Duration;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapConfig {
    /// Level passed to [`init_logging`](crate::init_logging)
    pub log_level: String,
    /// Whether native engine logging is enabled once the module is loaded
    pub native_logging: bool,
    pub session: SessionConfig,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            native_logging: true,
            session: SessionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// `None` waits for the engine indefinitely
    pub connect_timeout: Option<Duration>,
    pub credential_policy: CredentialPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            credential_policy: CredentialPolicy::Forward,
        }
    }
}

/// What happens to the credentials of a request before it reaches the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CredentialPolicy {
    /// Credentials are part of the session initiation call
    #[default]
    Forward,
    /// Credentials are stripped; the engine authenticates in a later phase
    Defer,
}
