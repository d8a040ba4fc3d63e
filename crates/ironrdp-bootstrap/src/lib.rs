#![cfg_attr(doc, doc = include_str!("../README.md"))]
#![cfg_attr(
    doc,
    doc(
        html_logo_url = "https://cdnweb.devolutions.net/images/projects/devolutions/logos/devolutions-icon-shadow.svg"
    )
)]

#[macro_use]
extern crate tracing;

mod bootstrap;
mod config;
mod control;
mod engine;
mod error;
mod profile;
mod request;
mod session;

pub use bootstrap::{ModuleBootstrap, ModuleHandle};
pub use config::{BootstrapConfig, CredentialPolicy, SessionConfig, DEFAULT_CONNECT_TIMEOUT};
pub use control::{ConnectControl, ControlState};
pub use engine::{ModuleLoader, NativeEngine, Timer};
pub use error::{ErrorSurface, LoadError, SessionError, SessionErrorKind};
pub use profile::{ConnectionProfile, ProfileError, ProfileErrorKind, ProfileValue, DEFAULT_RDP_PORT};
pub use request::{ConnectionRequest, Credentials, FormFields};
pub use session::SessionLauncher;

/// Installs the panic hook (when the `panic_hook` feature is enabled) and the logger.
///
/// In browsers, events go to the console and the panic hook reports through `console.error`.
/// Elsewhere, events go to the standard output and the panic hook is not installed.
///
/// Both are installed at most once; subsequent calls are no-ops. An unparsable `log_level`
/// leaves the logger uninstalled.
pub fn init_logging(log_level: &str) {
    // When the `console_error_panic_hook` feature is enabled, we can call the
    // `set_panic_hook` function at least once during initialization, and then
    // we will get better error messages if our code ever panics.
    //
    // For more details see
    // https://github.com/rustwasm/console_error_panic_hook#readme
    #[cfg(all(feature = "panic_hook", target_arch = "wasm32"))]
    console_error_panic_hook::set_once();

    if let Ok(level) = log_level.parse::<tracing::Level>() {
        set_logger_once(level);
    }
}

fn set_logger_once(level: tracing::Level) {
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::fmt::time::UtcTime;
    use tracing_subscriber::prelude::*;

    static INIT: std::sync::Once = std::sync::Once::new();

    INIT.call_once(|| {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_timer(UtcTime::rfc_3339()); // std::time is not available in browsers

        #[cfg(target_arch = "wasm32")]
        let fmt_layer = fmt_layer.with_writer(tracing_web::MakeConsoleWriter);

        let level_filter = LevelFilter::from_level(level);

        tracing_subscriber::registry().with(fmt_layer).with(level_filter).init();
    })
}
