use core::future::Future;
use core::time::Duration;

use ironrdp_bootstrap::Timer;

/// Timer backed by the browser's `setTimeout`.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct BrowserTimer;

impl Timer for BrowserTimer {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
        gloo_timers::future::sleep(duration)
    }
}
