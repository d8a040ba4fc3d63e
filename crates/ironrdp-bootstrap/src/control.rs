use core::cell::{OnceCell, RefCell};

use crate::bootstrap::{ModuleBootstrap, ModuleHandle};
use crate::config::BootstrapConfig;
use crate::engine::{NativeEngine, Timer};
use crate::error::{LoadError, SessionError};
use crate::request::ConnectionRequest;
use crate::session::SessionLauncher;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlState {
    /// The native module is still loading, the control is disabled
    Loading,
    /// Loaded, no session; a connect request is forwarded
    Ready,
    /// An attempt is in flight, further requests are rejected as busy
    Connecting,
    /// The last attempt succeeded and the session is still up
    Connected,
    /// The native module failed to load, the control stays disabled
    LoadFailed(LoadError),
}

/// Host-agnostic model of a "connect" control.
///
/// Connection requests are only forwarded once [`attach`](Self::attach) observed a successful
/// load. Before that, submissions are rejected with an explicit error instead of being dropped.
pub struct ConnectControl<E, T> {
    bootstrap: ModuleBootstrap<E>,
    timer: T,
    config: BootstrapConfig,
    launcher: OnceCell<SessionLauncher<E, T>>,
    state: RefCell<ControlState>,
    last_error: RefCell<Option<String>>,
}

impl<E, T> ConnectControl<E, T>
where
    E: NativeEngine + 'static,
    T: Timer + Clone,
{
    pub fn new(bootstrap: ModuleBootstrap<E>, timer: T, config: BootstrapConfig) -> Self {
        Self {
            bootstrap,
            timer,
            config,
            launcher: OnceCell::new(),
            state: RefCell::new(ControlState::Loading),
            last_error: RefCell::new(None),
        }
    }

    /// Waits for the module to load, then enables the control.
    pub async fn attach(&self) -> Result<(), LoadError> {
        if self.launcher.get().is_some() {
            return Ok(());
        }

        match self.bootstrap.handle().await {
            Ok(handle) => {
                if self.config.native_logging {
                    handle.enable_logging();
                }

                let launcher = SessionLauncher::new(handle, self.timer.clone(), self.config.session);

                if self.launcher.set(launcher).is_ok() {
                    self.set_state(ControlState::Ready);
                }

                Ok(())
            }
            Err(error) => {
                self.set_state(ControlState::LoadFailed(error.clone()));
                Err(error)
            }
        }
    }

    pub async fn submit(&self, request: ConnectionRequest) -> Result<(), SessionError<E::Error>> {
        let Some(launcher) = self.launcher.get() else {
            let state = self.state();

            return match state {
                ControlState::LoadFailed(error) => Err(SessionError::LoadFailed(error)),
                _ => {
                    debug!("Connect request received before the module is loaded");
                    Err(SessionError::NotLoaded)
                }
            };
        };

        if launcher.is_connecting() {
            warn!("Connect request ignored, an attempt is already in progress");
            return Err(SessionError::Busy);
        }

        self.set_state(ControlState::Connecting);

        let result = launcher.initiate(request).await;

        match &result {
            Ok(()) => {
                self.last_error.replace(None);
                self.set_state(ControlState::Connected);
            }
            Err(error) => {
                self.last_error.replace(Some(error.to_string()));
                self.set_state(ControlState::Ready);
            }
        }

        result
    }

    pub fn cancel(&self) -> bool {
        self.launcher.get().is_some_and(|launcher| launcher.cancel())
    }

    /// Moves a `Connected` control back to `Ready` once the session is gone.
    ///
    /// Returns `false` in any other state, which is left untouched.
    pub fn mark_disconnected(&self) -> bool {
        if *self.state.borrow() != ControlState::Connected {
            return false;
        }

        info!("Session disconnected");
        self.set_state(ControlState::Ready);

        true
    }

    pub fn state(&self) -> ControlState {
        self.state.borrow().clone()
    }

    /// Whether a connect request would currently be forwarded to the engine.
    pub fn is_enabled(&self) -> bool {
        matches!(*self.state.borrow(), ControlState::Ready | ControlState::Connected)
    }

    /// Display text of the last failed attempt, cleared by a successful one.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.borrow().clone()
    }

    pub fn handle(&self) -> Option<&ModuleHandle<E>> {
        self.launcher.get().map(SessionLauncher::handle)
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    fn set_state(&self, state: ControlState) {
        let previous = self.state.replace(state);
        debug!(?previous, current = ?self.state.borrow(), "Connect control state changed");
    }
}
