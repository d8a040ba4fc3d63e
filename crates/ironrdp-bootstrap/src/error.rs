//! Failures crossing the boundary between the native engine and its host.
//!
//! Every failure raised by the engine is wrapped into an [`ErrorSurface`], whose message is the
//! engine's own display rendering. The surface is then carried by [`SessionError::Native`], next
//! to the failures this layer produces by itself (timeouts, cancellation, and so on).
//!
//! # Example
//!
//! ```no_run
//! # use ironrdp_bootstrap::*;
//! # fn render<E: core::error::Error>(error: SessionError<E>) -> String {
//! match &error {
//!     SessionError::Native(surface) => {
//!         // Structured engine details are still reachable.
//!         let _engine_error: &E = surface.inner();
//!         surface.message().to_owned()
//!     }
//!     other => other.to_string(),
//! }
//! # }
//! ```

use core::fmt;
use core::time::Duration;

/// Host-side wrapper around a failure originating from the native engine.
///
/// The display text is captured when the surface is built and never recomputed, even if the
/// wrapped value has interior mutability.
pub struct ErrorSurface<E> {
    message: String,
    inner: E,
}

impl<E: fmt::Display> ErrorSurface<E> {
    #[cold]
    pub fn new(inner: E) -> Self {
        let message = inner.to_string();
        Self { message, inner }
    }
}

impl<E> ErrorSurface<E> {
    /// The display text of the wrapped value, as rendered at wrap time.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The exact value passed at construction.
    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn into_inner(self) -> E {
        self.inner
    }
}

impl<E: fmt::Debug> fmt::Debug for ErrorSurface<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorSurface")
            .field("message", &self.message)
            .field("inner", &self.inner)
            .finish()
    }
}

impl<E> fmt::Display for ErrorSurface<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl<E> core::error::Error for ErrorSurface<E>
where
    E: core::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        Some(&self.inner)
    }
}

/// The native module could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to load the native module: {reason}")]
pub struct LoadError {
    reason: String,
}

impl LoadError {
    #[cold]
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionErrorKind {
    /// The native engine reported a protocol or connection failure
    Native,
    /// The engine did not settle before the configured timeout
    Timeout,
    /// The attempt was cancelled by the host
    Cancelled,
    /// Another attempt is already in flight
    Busy,
    /// The native module has not finished loading
    NotLoaded,
    /// The native module failed to load
    LoadFailed,
}

impl SessionErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::Busy => "busy",
            Self::NotLoaded => "not-loaded",
            Self::LoadFailed => "load-failed",
        }
    }
}

impl fmt::Display for SessionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a failed session initiation.
#[derive(Debug)]
pub enum SessionError<E> {
    Native(ErrorSurface<E>),
    Timeout(Duration),
    Cancelled,
    Busy,
    NotLoaded,
    LoadFailed(LoadError),
}

impl<E> SessionError<E> {
    pub fn kind(&self) -> SessionErrorKind {
        match self {
            Self::Native(_) => SessionErrorKind::Native,
            Self::Timeout(_) => SessionErrorKind::Timeout,
            Self::Cancelled => SessionErrorKind::Cancelled,
            Self::Busy => SessionErrorKind::Busy,
            Self::NotLoaded => SessionErrorKind::NotLoaded,
            Self::LoadFailed(_) => SessionErrorKind::LoadFailed,
        }
    }

    /// The wrapped engine error, if this failure originates from the engine.
    pub fn native(&self) -> Option<&ErrorSurface<E>> {
        match self {
            Self::Native(surface) => Some(surface),
            _ => None,
        }
    }
}

impl<E: fmt::Display> SessionError<E> {
    #[cold]
    pub fn native_failure(error: E) -> Self {
        Self::Native(ErrorSurface::new(error))
    }
}

impl<E> fmt::Display for SessionError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(surface) => fmt::Display::fmt(surface, f),
            Self::Timeout(after) => write!(f, "connection attempt timed out after {} ms", after.as_millis()),
            Self::Cancelled => f.write_str("connection attempt cancelled"),
            Self::Busy => f.write_str("a connection attempt is already in progress"),
            Self::NotLoaded => f.write_str("the native module is not loaded yet"),
            Self::LoadFailed(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl<E> core::error::Error for SessionError<E>
where
    E: core::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Native(surface) => Some(surface.inner()),
            Self::LoadFailed(e) => Some(e),
            Self::Timeout(_) | Self::Cancelled | Self::Busy | Self::NotLoaded => None,
        }
    }
}
