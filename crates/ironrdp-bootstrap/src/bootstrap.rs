use core::cell::Cell;
use std::rc::Rc;

use futures_util::future::{LocalBoxFuture, Shared};
use futures_util::FutureExt as _;

use crate::engine::{ModuleLoader, NativeEngine};
use crate::error::LoadError;

/// Shared, read-only handle on a loaded native engine.
///
/// Cloning is cheap and every clone refers to the same engine instance.
pub struct ModuleHandle<E> {
    inner: Rc<HandleInner<E>>,
}

struct HandleInner<E> {
    engine: E,
    logging_enabled: Cell<bool>,
}

impl<E> Clone for ModuleHandle<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: NativeEngine> ModuleHandle<E> {
    pub fn new(engine: E) -> Self {
        Self {
            inner: Rc::new(HandleInner {
                engine,
                logging_enabled: Cell::new(false),
            }),
        }
    }

    pub fn engine(&self) -> &E {
        &self.inner.engine
    }

    /// Enables diagnostic output of the engine.
    ///
    /// Only the first call reaches the engine.
    pub fn enable_logging(&self) {
        if !self.inner.logging_enabled.replace(true) {
            debug!("Enable native engine logging");
            self.inner.engine.enable_logging();
        }
    }

    pub fn is_logging_enabled(&self) -> bool {
        self.inner.logging_enabled.get()
    }

    /// Returns `true` if both handles refer to the same engine instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

type LoadFuture<E> = Shared<LocalBoxFuture<'static, Result<ModuleHandle<E>, LoadError>>>;

/// Asynchronous, single-shot loading of the native module.
///
/// The load makes progress when the bootstrap is awaited (through [`ModuleBootstrap::handle`]).
/// Its outcome is computed once and then replayed to every caller.
pub struct ModuleBootstrap<E> {
    load: LoadFuture<E>,
}

impl<E> Clone for ModuleBootstrap<E> {
    fn clone(&self) -> Self {
        Self { load: self.load.clone() }
    }
}

impl<E: NativeEngine + 'static> ModuleBootstrap<E> {
    pub fn start<L>(loader: L) -> Self
    where
        L: ModuleLoader<Engine = E> + 'static,
    {
        let load = async move {
            debug!("Loading native module");

            match loader.load().await {
                Ok(engine) => {
                    info!("Native module loaded");
                    Ok(ModuleHandle::new(engine))
                }
                Err(error) => {
                    error!(%error, "Native module failed to load");
                    Err(error)
                }
            }
        }
        .boxed_local()
        .shared();

        Self { load }
    }

    /// Waits for the load to settle.
    ///
    /// Every call resolves to the same outcome; on success, all returned handles are
    /// [`ptr_eq`](ModuleHandle::ptr_eq).
    pub async fn handle(&self) -> Result<ModuleHandle<E>, LoadError> {
        self.load.clone().await
    }

    /// Returns the outcome of the load if it already settled.
    pub fn try_handle(&self) -> Option<Result<ModuleHandle<E>, LoadError>> {
        self.load.peek().cloned()
    }
}
