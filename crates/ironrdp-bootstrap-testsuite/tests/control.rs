use core::pin::pin;
use core::time::Duration;

use futures_util::{join, poll};
use ironrdp_bootstrap::{
    BootstrapConfig, ConnectControl, ConnectionRequest, ControlState, FormFields, LoadError, ModuleBootstrap,
    SessionConfig, SessionErrorKind,
};
use ironrdp_bootstrap_testsuite::{FakeNativeError, Outcome, RecordingEngine, TestLoader, TokioTimer};

fn control(loader: TestLoader, config: BootstrapConfig) -> ConnectControl<RecordingEngine, TokioTimer> {
    ConnectControl::new(ModuleBootstrap::start(loader), TokioTimer, config)
}

fn connect_request() -> ConnectionRequest {
    ConnectionRequest::from_form(FormFields {
        host: "10.0.0.5".to_owned(),
        port: "3389".to_owned(),
        ..FormFields::default()
    })
}

#[tokio::test]
async fn submit_before_attach_is_rejected() {
    let engine = RecordingEngine::new();
    let log = engine.log();
    let control = control(TestLoader::ready(engine), BootstrapConfig::default());

    assert_eq!(control.state(), ControlState::Loading);
    assert!(!control.is_enabled());

    let error = control.submit(connect_request()).await.expect_err("not loaded");

    assert_eq!(error.kind(), SessionErrorKind::NotLoaded);
    assert!(log.calls().is_empty());
    assert_eq!(control.state(), ControlState::Loading);
}

#[tokio::test]
async fn engine_is_unreachable_until_the_load_settles() {
    let (loader, gate) = TestLoader::gated();
    let control = control(loader, BootstrapConfig::default());

    let mut attach = pin!(control.attach());
    assert!(poll!(attach.as_mut()).is_pending());

    assert_eq!(control.state(), ControlState::Loading);
    assert!(control.handle().is_none());
    assert!(!control.cancel());
    assert_eq!(
        control.submit(connect_request()).await.expect_err("not loaded").kind(),
        SessionErrorKind::NotLoaded
    );

    let engine = RecordingEngine::new();
    let log = engine.log();
    gate.open(engine);

    attach.await.expect("loaded");

    assert_eq!(control.state(), ControlState::Ready);
    assert!(control.is_enabled());
    assert!(log.calls().is_empty());
}

#[tokio::test]
async fn connect_after_load() {
    let engine = RecordingEngine::new();
    let log = engine.log();
    let control = control(TestLoader::ready(engine), BootstrapConfig::default());

    control.attach().await.expect("loaded");
    control.submit(connect_request()).await.expect("connected");

    assert_eq!(log.calls(), [ConnectionRequest::new("10.0.0.5", "3389")]);
    assert_eq!(control.state(), ControlState::Connected);
    assert!(control.is_enabled());
    assert_eq!(control.last_error(), None);
}

#[tokio::test]
async fn native_logging_is_enabled_once_on_attach() {
    let engine = RecordingEngine::new();
    let log = engine.log();
    let control = control(TestLoader::ready(engine), BootstrapConfig::default());

    control.attach().await.expect("loaded");
    control.attach().await.expect("loaded");

    assert_eq!(log.logging_calls(), 1);
    assert!(control.handle().expect("loaded").is_logging_enabled());
}

#[tokio::test]
async fn native_logging_can_be_turned_off() {
    let engine = RecordingEngine::new();
    let log = engine.log();
    let config = BootstrapConfig {
        native_logging: false,
        ..BootstrapConfig::default()
    };
    let control = control(TestLoader::ready(engine), config);

    control.attach().await.expect("loaded");

    assert_eq!(log.logging_calls(), 0);
}

#[tokio::test]
async fn load_failure_keeps_the_control_disabled() {
    let loader = TestLoader::failing("missing binary");
    let loads = loader.load_counter();
    let control = control(loader, BootstrapConfig::default());

    let error = control.attach().await.expect_err("load failure");
    assert_eq!(error, LoadError::new("missing binary"));

    assert_eq!(control.state(), ControlState::LoadFailed(LoadError::new("missing binary")));
    assert!(!control.is_enabled());
    assert!(control.handle().is_none());

    let error = control.submit(connect_request()).await.expect_err("load failed");
    assert_eq!(error.kind(), SessionErrorKind::LoadFailed);
    assert_eq!(error.to_string(), "failed to load the native module: missing binary");

    // The outcome is replayed, the loader does not run again.
    control.attach().await.expect_err("load failure");
    assert_eq!(loads.get(), 1);
}

#[tokio::test]
async fn failed_attempt_leaves_the_control_retryable() {
    let engine = RecordingEngine::with_outcomes([Outcome::Fail(FakeNativeError::new(40, "TLS handshake failed"))]);
    let log = engine.log();
    let control = control(TestLoader::ready(engine), BootstrapConfig::default());
    control.attach().await.expect("loaded");

    let error = control.submit(connect_request()).await.expect_err("native failure");

    assert_eq!(error.to_string(), "TLS handshake failed");
    assert_eq!(error.native().map(|surface| surface.inner().code), Some(40));
    assert_eq!(control.state(), ControlState::Ready);
    assert!(control.is_enabled());
    assert_eq!(control.last_error().as_deref(), Some("TLS handshake failed"));

    control.submit(connect_request()).await.expect("connected");

    assert_eq!(control.state(), ControlState::Connected);
    assert_eq!(control.last_error(), None);
    assert_eq!(log.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn timed_out_attempt_is_reported() {
    let config = BootstrapConfig {
        session: SessionConfig {
            connect_timeout: Some(Duration::from_secs(5)),
            ..SessionConfig::default()
        },
        ..BootstrapConfig::default()
    };
    let control = control(TestLoader::ready(RecordingEngine::with_outcomes([Outcome::Hang])), config);
    control.attach().await.expect("loaded");

    let error = control.submit(connect_request()).await.expect_err("timeout");

    assert_eq!(error.kind(), SessionErrorKind::Timeout);
    assert_eq!(control.state(), ControlState::Ready);
    assert_eq!(
        control.last_error().as_deref(),
        Some("connection attempt timed out after 5000 ms")
    );
}

#[tokio::test]
async fn double_submit_is_rejected_without_touching_the_attempt() {
    let (outcome, tx) = Outcome::wait();
    let engine = RecordingEngine::with_outcomes([outcome]);
    let log = engine.log();
    let control = control(TestLoader::ready(engine), BootstrapConfig::default());
    control.attach().await.expect("loaded");

    let (first, second) = join!(control.submit(connect_request()), async {
        tokio::task::yield_now().await;

        assert_eq!(control.state(), ControlState::Connecting);
        assert!(!control.is_enabled());

        let second = control.submit(connect_request()).await;

        assert_eq!(control.state(), ControlState::Connecting);
        tx.send(Ok(())).expect("receiver alive");

        second
    });

    first.expect("connected");
    assert_eq!(second.expect_err("busy").kind(), SessionErrorKind::Busy);
    assert_eq!(log.calls().len(), 1);
    assert_eq!(control.state(), ControlState::Connected);
}

#[tokio::test]
async fn cancel_returns_to_ready() {
    let engine = RecordingEngine::with_outcomes([Outcome::Hang]);
    let control = control(TestLoader::ready(engine), BootstrapConfig::default());
    control.attach().await.expect("loaded");

    let (result, cancelled) = join!(control.submit(connect_request()), async {
        tokio::task::yield_now().await;
        control.cancel()
    });

    assert!(cancelled);
    assert_eq!(result.expect_err("cancelled").kind(), SessionErrorKind::Cancelled);
    assert_eq!(control.state(), ControlState::Ready);
    assert_eq!(control.last_error().as_deref(), Some("connection attempt cancelled"));
}

#[tokio::test]
async fn disconnect_returns_to_ready() {
    let engine = RecordingEngine::new();
    let log = engine.log();
    let control = control(TestLoader::ready(engine), BootstrapConfig::default());

    assert!(!control.mark_disconnected());
    assert_eq!(control.state(), ControlState::Loading);

    control.attach().await.expect("loaded");
    assert!(!control.mark_disconnected());
    assert_eq!(control.state(), ControlState::Ready);

    control.submit(connect_request()).await.expect("connected");
    assert!(control.mark_disconnected());

    assert_eq!(control.state(), ControlState::Ready);
    assert!(control.is_enabled());
    assert!(!control.mark_disconnected());

    control.submit(connect_request()).await.expect("connected");
    assert_eq!(control.state(), ControlState::Connected);
    assert_eq!(log.calls().len(), 2);
}

#[tokio::test]
async fn disconnect_leaves_a_failed_load_alone() {
    let control = control(TestLoader::failing("missing binary"), BootstrapConfig::default());
    control.attach().await.expect_err("load failure");

    assert!(!control.mark_disconnected());
    assert_eq!(control.state(), ControlState::LoadFailed(LoadError::new("missing binary")));
}
