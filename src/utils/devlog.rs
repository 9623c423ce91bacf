//! Developer events: commits, evictions, repairs and undone saves.
//!
//! `devlog!` routes each event to the `diskcache::events` log target. Tests can also opt
//! into a per-thread capture and read events back with [`drain`], which does not race the
//! global logger.

use std::cell::RefCell;

/// Log target used for developer events; routed by `utils::logger` when enabled.
pub const EVENTS_TARGET: &str = "diskcache::events";

thread_local! {
    static CAPTURED: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

fn with_capture<T>(f: impl FnOnce(&mut Option<Vec<String>>) -> T) -> T {
    CAPTURED.with(|c| f(&mut c.borrow_mut()))
}

/// Stops capturing on drop.
#[must_use = "capture ends when the guard is dropped"]
pub struct CaptureGuard(());

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        with_capture(|c| *c = None);
    }
}

/// Start capturing events emitted on the current thread.
pub fn enable_thread_sink() -> CaptureGuard {
    with_capture(|c| *c = Some(Vec::new()));
    CaptureGuard(())
}

#[doc(hidden)]
pub fn record(event: &str) {
    with_capture(|c| {
        if let Some(events) = c {
            events.push(event.to_owned());
        }
    });
}

/// Take the events captured so far on this thread (empty when not capturing).
pub fn drain() -> Vec<String> {
    with_capture(|c| c.as_mut().map(std::mem::take).unwrap_or_default())
}

/// Emit a developer event; captured too when the current thread is capturing.
#[macro_export]
macro_rules! devlog {
    ($($arg:tt)*) => {{
        let __s = format!($($arg)*);
        $crate::utils::devlog::record(&__s);
        log::log!(target: $crate::utils::devlog::EVENTS_TARGET, log::Level::Trace, "{}", __s);
    }};
}
