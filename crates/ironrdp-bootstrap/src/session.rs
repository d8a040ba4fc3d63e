use core::cell::{Cell, RefCell};
use core::pin::pin;

use futures_util::future::{self, AbortHandle, Abortable, Either};

use crate::bootstrap::ModuleHandle;
use crate::config::{CredentialPolicy, SessionConfig};
use crate::engine::{NativeEngine, Timer};
use crate::error::SessionError;
use crate::request::ConnectionRequest;

/// Drives connection attempts against a loaded engine.
///
/// At most one attempt is in flight at any time: a concurrent call is rejected with
/// [`SessionError::Busy`] without reaching the engine. Once an attempt settles, whatever the
/// outcome, the launcher accepts a new one.
pub struct SessionLauncher<E, T> {
    handle: ModuleHandle<E>,
    timer: T,
    config: SessionConfig,
    in_flight: Cell<bool>,
    abort_handle: RefCell<Option<AbortHandle>>,
}

impl<E, T> SessionLauncher<E, T>
where
    E: NativeEngine,
    T: Timer,
{
    pub fn new(handle: ModuleHandle<E>, timer: T, config: SessionConfig) -> Self {
        Self {
            handle,
            timer,
            config,
            in_flight: Cell::new(false),
            abort_handle: RefCell::new(None),
        }
    }

    pub fn handle(&self) -> &ModuleHandle<E> {
        &self.handle
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_connecting(&self) -> bool {
        self.in_flight.get()
    }

    pub async fn initiate(&self, request: ConnectionRequest) -> Result<(), SessionError<E::Error>> {
        if self.in_flight.get() {
            warn!("Connection attempt rejected, another one is in progress");
            return Err(SessionError::Busy);
        }

        let _guard = InFlightGuard::enter(&self.in_flight, &self.abort_handle);

        let request = match self.config.credential_policy {
            CredentialPolicy::Forward => request,
            CredentialPolicy::Defer => request.without_credentials(),
        };

        info!(
            host = %request.host,
            port = %request.port,
            with_credentials = request.credentials.is_some(),
            "Initiate RDP session"
        );

        let (abort_handle, abort_registration) = AbortHandle::new_pair();
        *self.abort_handle.borrow_mut() = Some(abort_handle);

        match Abortable::new(self.attempt(&request), abort_registration).await {
            Ok(outcome) => outcome,
            Err(future::Aborted) => {
                info!("Connection attempt cancelled");
                Err(SessionError::Cancelled)
            }
        }
    }

    /// Aborts the in-flight attempt, if any.
    ///
    /// Returns `false` when there was nothing to cancel.
    pub fn cancel(&self) -> bool {
        let abort_handle = self.abort_handle.borrow_mut().take();

        match abort_handle {
            Some(abort_handle) => {
                abort_handle.abort();
                true
            }
            None => false,
        }
    }

    async fn attempt(&self, request: &ConnectionRequest) -> Result<(), SessionError<E::Error>> {
        let session = self.handle.engine().initiate_session(request);

        let outcome = match self.config.connect_timeout {
            Some(timeout) => {
                let sleep = self.timer.sleep(timeout);

                match future::select(pin!(session), pin!(sleep)).await {
                    Either::Left((outcome, _)) => outcome,
                    Either::Right(((), _)) => {
                        warn!(?timeout, "Connection attempt timed out");
                        return Err(SessionError::Timeout(timeout));
                    }
                }
            }
            None => session.await,
        };

        match outcome {
            Ok(()) => {
                info!("Connected!");
                Ok(())
            }
            Err(error) => {
                error!(%error, "Native engine failed to connect");
                Err(SessionError::native_failure(error))
            }
        }
    }
}

/// Clears the in-flight state when the attempt settles or is dropped.
struct InFlightGuard<'a> {
    in_flight: &'a Cell<bool>,
    abort_handle: &'a RefCell<Option<AbortHandle>>,
}

impl<'a> InFlightGuard<'a> {
    fn enter(in_flight: &'a Cell<bool>, abort_handle: &'a RefCell<Option<AbortHandle>>) -> Self {
        in_flight.set(true);
        Self {
            in_flight,
            abort_handle,
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.set(false);
        self.abort_handle.borrow_mut().take();
    }
}
