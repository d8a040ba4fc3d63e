use core::time::Duration;
use std::rc::Rc;

use ironrdp_bootstrap::{
    BootstrapConfig, ConnectControl, ConnectionRequest, ControlState, CredentialPolicy, FormFields, ModuleBootstrap,
};
use wasm_bindgen::prelude::*;

use crate::engine::{WebSocketEngine, WebSocketLoader};
use crate::error::SessionError;
use crate::timer::BrowserTimer;

pub(crate) type Control = ConnectControl<WebSocketEngine, BrowserTimer>;

#[wasm_bindgen]
#[derive(Clone, Default)]
pub struct ClientConfig(BootstrapConfig);

#[wasm_bindgen]
impl ClientConfig {
    #[wasm_bindgen(constructor)]
    pub fn create() -> Self {
        Self::default()
    }

    #[wasm_bindgen(js_name = setLogLevel)]
    pub fn set_log_level(&mut self, log_level: String) {
        self.0.log_level = log_level;
    }

    #[wasm_bindgen(js_name = setNativeLogging)]
    pub fn set_native_logging(&mut self, enabled: bool) {
        self.0.native_logging = enabled;
    }

    /// `undefined` disables the timeout.
    #[wasm_bindgen(js_name = setConnectTimeout)]
    pub fn set_connect_timeout(&mut self, timeout_ms: Option<u32>) {
        self.0.session.connect_timeout = timeout_ms.map(|ms| Duration::from_millis(u64::from(ms)));
    }

    /// When set, credentials are not part of the connection request.
    #[wasm_bindgen(js_name = setDeferCredentials)]
    pub fn set_defer_credentials(&mut self, defer: bool) {
        self.0.session.credential_policy = if defer {
            CredentialPolicy::Defer
        } else {
            CredentialPolicy::Forward
        };
    }
}

#[wasm_bindgen]
pub struct RdpClient {
    control: Rc<Control>,
}

#[wasm_bindgen]
impl RdpClient {
    /// Registers the module load. Nothing happens until `load` is awaited.
    #[wasm_bindgen(constructor)]
    pub fn create(config: &ClientConfig) -> Self {
        let config = config.0.clone();
        let bootstrap = ModuleBootstrap::start(WebSocketLoader::new(config.log_level.clone()));

        Self {
            control: Rc::new(ConnectControl::new(bootstrap, BrowserTimer, config)),
        }
    }

    pub async fn load(&self) -> Result<(), SessionError> {
        self.control.attach().await.map_err(SessionError::from)
    }

    /// `port` may be a string or a number; it is forwarded without validation.
    pub async fn connect(
        &self,
        host: String,
        port: JsValue,
        username: Option<String>,
        password: Option<String>,
    ) -> Result<(), SessionError> {
        let request = ConnectionRequest::from_form(FormFields {
            host,
            port: port_to_string(&port),
            username: username.unwrap_or_default(),
            password: password.unwrap_or_default(),
        });

        self.control.submit(request).await.map_err(SessionError::from)
    }

    pub fn cancel(&self) -> bool {
        self.control.cancel()
    }

    /// Closes the active connection. The client is `ready` afterwards, even if closing failed.
    pub async fn disconnect(&self) -> Result<(), SessionError> {
        let Some(handle) = self.control.handle() else {
            return Err(SessionError::from(ironrdp_bootstrap::SessionError::NotLoaded));
        };

        let result = handle.engine().close().await;
        self.control.mark_disconnected();

        result.map_err(SessionError::from)
    }

    #[wasm_bindgen(js_name = isConnected)]
    pub fn is_connected(&self) -> bool {
        self.control
            .handle()
            .is_some_and(|handle| handle.engine().is_connected())
    }

    #[wasm_bindgen(js_name = isEnabled)]
    pub fn is_enabled(&self) -> bool {
        self.control.is_enabled()
    }

    pub fn state(&self) -> String {
        self.sync_connection_state();
        state_name(&self.control.state()).to_owned()
    }

    #[wasm_bindgen(js_name = lastError)]
    pub fn last_error(&self) -> Option<String> {
        self.control.last_error()
    }
}

impl RdpClient {
    pub(crate) fn control(&self) -> Rc<Control> {
        Rc::clone(&self.control)
    }

    /// The host may close the session on its own, the control only learns about it here.
    fn sync_connection_state(&self) {
        if self.control.state() == ControlState::Connected && !self.is_connected() {
            self.control.mark_disconnected();
        }
    }
}

fn state_name(state: &ControlState) -> &'static str {
    match state {
        ControlState::Loading => "loading",
        ControlState::Ready => "ready",
        ControlState::Connecting => "connecting",
        ControlState::Connected => "connected",
        ControlState::LoadFailed(_) => "load-failed",
    }
}

fn port_to_string(port: &JsValue) -> String {
    if let Some(port) = port.as_string() {
        port
    } else if let Some(port) = port.as_f64() {
        port.to_string()
    } else {
        String::new()
    }
}
