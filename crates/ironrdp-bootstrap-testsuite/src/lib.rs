//! Test doubles for the native engine, the module loader and the timer.

use core::cell::{Cell, RefCell};
use core::fmt;
use core::future::Future;
use core::time::Duration;
use std::collections::VecDeque;
use std::rc::Rc;

use futures_channel::oneshot;
use ironrdp_bootstrap::{ConnectionRequest, LoadError, ModuleLoader, NativeEngine, Timer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeNativeError {
    pub code: u32,
    pub display: String,
}

impl FakeNativeError {
    pub fn new(code: u32, display: impl Into<String>) -> Self {
        Self {
            code,
            display: display.into(),
        }
    }
}

impl fmt::Display for FakeNativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

impl core::error::Error for FakeNativeError {}

/// How the engine answers the next connection attempt.
pub enum Outcome {
    Succeed,
    Fail(FakeNativeError),
    /// Never settles
    Hang,
    /// Settles when the paired sender is used; hangs if it is dropped
    Wait(oneshot::Receiver<Result<(), FakeNativeError>>),
}

impl Outcome {
    pub fn wait() -> (Self, oneshot::Sender<Result<(), FakeNativeError>>) {
        let (tx, rx) = oneshot::channel();
        (Self::Wait(rx), tx)
    }
}

/// Everything the engine observed, shared with the test.
#[derive(Debug, Default)]
pub struct EngineLog {
    calls: RefCell<Vec<ConnectionRequest>>,
    logging_calls: Cell<usize>,
}

impl EngineLog {
    pub fn calls(&self) -> Vec<ConnectionRequest> {
        self.calls.borrow().clone()
    }

    pub fn logging_calls(&self) -> usize {
        self.logging_calls.get()
    }
}

/// Engine recording every call and answering with scripted outcomes.
///
/// Once the script is exhausted, every attempt succeeds.
pub struct RecordingEngine {
    log: Rc<EngineLog>,
    outcomes: RefCell<VecDeque<Outcome>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::with_outcomes([])
    }

    pub fn with_outcomes(outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        Self {
            log: Rc::default(),
            outcomes: RefCell::new(outcomes.into_iter().collect()),
        }
    }

    pub fn log(&self) -> Rc<EngineLog> {
        Rc::clone(&self.log)
    }

    pub fn push_outcome(&self, outcome: Outcome) {
        self.outcomes.borrow_mut().push_back(outcome);
    }
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeEngine for RecordingEngine {
    type Error = FakeNativeError;

    fn enable_logging(&self) {
        self.log.logging_calls.set(self.log.logging_calls.get() + 1);
    }

    fn initiate_session(&self, request: &ConnectionRequest) -> impl Future<Output = Result<(), Self::Error>> {
        self.log.calls.borrow_mut().push(request.clone());

        let outcome = self.outcomes.borrow_mut().pop_front().unwrap_or(Outcome::Succeed);

        async move {
            match outcome {
                Outcome::Succeed => Ok(()),
                Outcome::Fail(error) => Err(error),
                Outcome::Hang => futures_util::future::pending().await,
                Outcome::Wait(rx) => match rx.await {
                    Ok(result) => result,
                    Err(oneshot::Canceled) => futures_util::future::pending().await,
                },
            }
        }
    }
}

enum LoaderOutcome {
    Ready(RecordingEngine),
    Fail(String),
    Gated(oneshot::Receiver<Result<RecordingEngine, LoadError>>),
}

/// Loader with a scripted outcome, counting how many times it actually ran.
pub struct TestLoader {
    outcome: LoaderOutcome,
    loads: Rc<Cell<usize>>,
}

impl TestLoader {
    pub fn ready(engine: RecordingEngine) -> Self {
        Self::from_outcome(LoaderOutcome::Ready(engine))
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self::from_outcome(LoaderOutcome::Fail(reason.into()))
    }

    /// The load settles only when the returned gate is opened or failed.
    pub fn gated() -> (Self, LoadGate) {
        let (tx, rx) = oneshot::channel();
        (Self::from_outcome(LoaderOutcome::Gated(rx)), LoadGate(tx))
    }

    fn from_outcome(outcome: LoaderOutcome) -> Self {
        Self {
            outcome,
            loads: Rc::default(),
        }
    }

    pub fn load_counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.loads)
    }
}

impl ModuleLoader for TestLoader {
    type Engine = RecordingEngine;

    async fn load(self) -> Result<RecordingEngine, LoadError> {
        self.loads.set(self.loads.get() + 1);

        match self.outcome {
            LoaderOutcome::Ready(engine) => Ok(engine),
            LoaderOutcome::Fail(reason) => Err(LoadError::new(reason)),
            LoaderOutcome::Gated(rx) => match rx.await {
                Ok(result) => result,
                Err(oneshot::Canceled) => Err(LoadError::new("load gate dropped")),
            },
        }
    }
}

pub struct LoadGate(oneshot::Sender<Result<RecordingEngine, LoadError>>);

impl LoadGate {
    pub fn open(self, engine: RecordingEngine) {
        let _ = self.0.send(Ok(engine));
    }

    pub fn fail(self, reason: &str) {
        let _ = self.0.send(Err(LoadError::new(reason)));
    }
}

/// Timer driven by the tokio clock, so that tests can run with a paused clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

impl Timer for TokioTimer {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
        tokio::time::sleep(duration)
    }
}
