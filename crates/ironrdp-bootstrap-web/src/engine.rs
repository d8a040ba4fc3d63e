use core::cell::{Cell, RefCell};
use core::time::Duration;
use std::rc::{Rc, Weak};

use anyhow::Context as _;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt as _, StreamExt as _};
use gloo_net::websocket;
use gloo_net::websocket::futures::WebSocket;
use gloo_net::websocket::Message;
use ironrdp_bootstrap::{ConnectionRequest, LoadError, ModuleLoader, NativeEngine};
use wasm_bindgen_futures::spawn_local;

use crate::error::{EngineError, EngineErrorKind};

const STATE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Engine reaching the RDP host through a WebSocket endpoint.
pub(crate) struct WebSocketEngine {
    log_level: String,
    connection: Rc<RefCell<Option<ActiveConnection>>>,
    next_connection_id: Cell<u64>,
}

struct ActiveConnection {
    /// Tells a connection apart from the ones replacing it
    id: u64,
    url: String,
    with_credentials: bool,
    sink: SplitSink<WebSocket, Message>,
}

impl WebSocketEngine {
    pub(crate) fn new(log_level: String) -> Self {
        Self {
            log_level,
            connection: Rc::new(RefCell::new(None)),
            next_connection_id: Cell::new(0),
        }
    }

    /// Whether a connection is open. Cleared as soon as the host closes the stream.
    pub(crate) fn is_connected(&self) -> bool {
        self.connection.borrow().is_some()
    }

    /// Closes the outbound half of the active connection.
    pub(crate) async fn close(&self) -> Result<(), EngineError> {
        let connection = self.connection.borrow_mut().take();

        let Some(mut connection) = connection else {
            return Err(EngineError::from(anyhow::anyhow!("no active connection"))
                .with_kind(EngineErrorKind::ConnectionClosed));
        };

        info!(url = %connection.url, "Close WebSocket");

        connection
            .sink
            .close()
            .await
            .map_err(|e| anyhow::anyhow!("{e}"))
            .context("couldn't close WebSocket")?;

        Ok(())
    }
}

impl NativeEngine for WebSocketEngine {
    type Error = EngineError;

    fn enable_logging(&self) {
        ironrdp_bootstrap::init_logging(&self.log_level);
    }

    async fn initiate_session(&self, request: &ConnectionRequest) -> Result<(), EngineError> {
        // A new attempt supersedes the current connection, whatever its outcome.
        let previous = self.connection.borrow_mut().take();

        if let Some(previous) = previous {
            warn!(url = %previous.url, with_credentials = previous.with_credentials, "Closing active connection");
            spawn_local(close_in_background(previous));
        }

        let url = websocket_url(request);

        info!(%url, "Connect to RDP host");

        let ws = WebSocket::open(&url).map_err(|e| {
            EngineError::from(anyhow::anyhow!("couldn't open WebSocket to {url}: {e}"))
                .with_kind(EngineErrorKind::InvalidAddress)
        })?;

        // NOTE: errors happening while the WebSocket is being opened are not bubbled up by the
        // browser, so we poll the WebSocket state until we know it is connected.
        loop {
            match ws.state() {
                websocket::State::Closing | websocket::State::Closed => {
                    return Err(EngineError::from(anyhow::anyhow!(
                        "failed to connect to {url} (WebSocket is `{:?}`)",
                        ws.state()
                    ))
                    .with_kind(EngineErrorKind::ProxyConnect));
                }
                websocket::State::Connecting => {
                    trace!("WebSocket is connecting to {url}...");
                    gloo_timers::future::sleep(STATE_POLL_INTERVAL).await;
                }
                websocket::State::Open => {
                    debug!("WebSocket connected to {url} with success");
                    break;
                }
            }
        }

        let (sink, stream) = ws.split();

        let id = self.next_connection_id.get();
        self.next_connection_id.set(id.wrapping_add(1));

        spawn_local(read_task(stream, url.clone(), Rc::downgrade(&self.connection), id));

        let with_credentials = request.credentials.is_some();

        // Authentication happens later, during the protocol exchange.
        debug!(with_credentials, "WebSocket transport ready");

        let previous = self.connection.replace(Some(ActiveConnection {
            id,
            url,
            with_credentials,
            sink,
        }));

        if let Some(previous) = previous {
            warn!(url = %previous.url, "Replacing active connection");
            spawn_local(close_in_background(previous));
        }

        Ok(())
    }
}

async fn close_in_background(mut connection: ActiveConnection) {
    if let Err(error) = connection.sink.close().await {
        warn!(%error, url = %connection.url, "Couldn't close replaced WebSocket");
    }
}

async fn read_task(
    mut stream: SplitStream<WebSocket>,
    url: String,
    connection: Weak<RefCell<Option<ActiveConnection>>>,
    id: u64,
) {
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Bytes(data)) => trace!(frame_length = data.len(), "Frame received"),
            Ok(Message::Text(text)) => trace!(text_length = text.len(), "Text message received"),
            Err(error) => {
                error!(%error, "WebSocket error");
                break;
            }
        }
    }

    info!(%url, "Connection with host closed");

    // Only the connection this task reads from is released, never its successor.
    if let Some(connection) = connection.upgrade() {
        let mut connection = connection.borrow_mut();

        if connection.as_ref().is_some_and(|active| active.id == id) {
            *connection = None;
        }
    }
}

fn websocket_url(request: &ConnectionRequest) -> String {
    format!("ws://{}:{}/", request.host, request.port)
}

/// Loads the WebSocket engine, provided a browser window is available.
pub(crate) struct WebSocketLoader {
    log_level: String,
}

impl WebSocketLoader {
    pub(crate) fn new(log_level: String) -> Self {
        Self { log_level }
    }
}

impl ModuleLoader for WebSocketLoader {
    type Engine = WebSocketEngine;

    async fn load(self) -> Result<WebSocketEngine, LoadError> {
        if web_sys::window().is_none() {
            return Err(LoadError::new("no browser window available"));
        }

        debug!("WebSocket engine ready");

        Ok(WebSocketEngine::new(self.log_level))
    }
}
