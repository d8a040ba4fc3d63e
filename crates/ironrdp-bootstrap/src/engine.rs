use core::future::Future;
use core::time::Duration;

use crate::error::LoadError;
use crate::request::ConnectionRequest;

/// Entry points exposed by a loaded native RDP client engine.
pub trait NativeEngine {
    type Error: core::error::Error + 'static;

    /// Turns on diagnostic output of the engine.
    fn enable_logging(&self);

    /// Starts a connection attempt.
    ///
    /// The returned future is the engine's failure channel: it settles once the engine either
    /// reached a connected state or gave up.
    fn initiate_session(&self, request: &ConnectionRequest) -> impl Future<Output = Result<(), Self::Error>>;
}

/// Asynchronously produces a [`NativeEngine`].
pub trait ModuleLoader {
    type Engine: NativeEngine;

    fn load(self) -> impl Future<Output = Result<Self::Engine, LoadError>>;
}

/// Source of delays for connection timeouts.
pub trait Timer {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()>;
}
