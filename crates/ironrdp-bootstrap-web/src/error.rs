use core::fmt;

use wasm_bindgen::prelude::*;

#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineErrorKind {
    /// Catch-all error kind
    General,
    /// Couldn't connect to the WebSocket endpoint
    ProxyConnect,
    /// The WebSocket URL could not be built or was rejected by the browser
    InvalidAddress,
    /// The connection was closed
    ConnectionClosed,
}

/// Failure reported by the WebSocket engine.
#[derive(Debug)]
pub(crate) struct EngineError {
    kind: EngineErrorKind,
    source: anyhow::Error,
}

impl EngineError {
    #[must_use]
    pub(crate) fn with_kind(mut self, kind: EngineErrorKind) -> Self {
        self.kind = kind;
        self
    }

    pub(crate) fn kind(&self) -> EngineErrorKind {
        self.kind
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.source)
    }
}

impl core::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        self.source.source()
    }
}

impl From<anyhow::Error> for EngineError {
    fn from(e: anyhow::Error) -> Self {
        Self {
            kind: EngineErrorKind::General,
            source: e,
        }
    }
}

#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionErrorKind {
    /// The engine failed to connect, see `nativeKind`
    Native,
    /// The connection attempt timed out
    Timeout,
    /// The connection attempt was cancelled
    Cancelled,
    /// Another connection attempt is in progress
    Busy,
    /// The module is not loaded yet
    NotLoaded,
    /// The module failed to load
    LoadFailed,
}

impl From<ironrdp_bootstrap::SessionErrorKind> for SessionErrorKind {
    fn from(kind: ironrdp_bootstrap::SessionErrorKind) -> Self {
        use ironrdp_bootstrap::SessionErrorKind as Kind;

        match kind {
            Kind::Native => Self::Native,
            Kind::Timeout => Self::Timeout,
            Kind::Cancelled => Self::Cancelled,
            Kind::Busy => Self::Busy,
            Kind::NotLoaded => Self::NotLoaded,
            Kind::LoadFailed => Self::LoadFailed,
        }
    }
}

/// Error thrown to JavaScript by the client.
#[wasm_bindgen]
pub struct SessionError(ironrdp_bootstrap::SessionError<EngineError>);

#[wasm_bindgen]
impl SessionError {
    /// Display text of the failure. For engine failures, the engine's own rendering.
    pub fn message(&self) -> String {
        self.0.to_string()
    }

    pub fn kind(&self) -> SessionErrorKind {
        self.0.kind().into()
    }

    #[wasm_bindgen(js_name = nativeKind)]
    pub fn native_kind(&self) -> Option<EngineErrorKind> {
        self.0.native().map(|surface| surface.inner().kind())
    }

    pub fn backtrace(&self) -> String {
        format!("{:?}", self.0)
    }
}

impl From<ironrdp_bootstrap::SessionError<EngineError>> for SessionError {
    fn from(e: ironrdp_bootstrap::SessionError<EngineError>) -> Self {
        Self(e)
    }
}

impl From<ironrdp_bootstrap::LoadError> for SessionError {
    fn from(e: ironrdp_bootstrap::LoadError) -> Self {
        Self(ironrdp_bootstrap::SessionError::LoadFailed(e))
    }
}

impl From<EngineError> for SessionError {
    fn from(e: EngineError) -> Self {
        Self(ironrdp_bootstrap::SessionError::native_failure(e))
    }
}
