//! Fault isolation for user callbacks.
//!
//! Handlers are arbitrary user code.  A panic inside one of them must not take
//! down the router, the read loop, or sibling handlers, so every invocation
//! goes through [`isolate`], which catches the unwind and logs the panic
//! message together with the backtrace of the panicking thread.
//!
//! # How the backtrace is captured
//!
//! After `catch_unwind` returns, the stack of the panic site is already gone.
//! A panic hook runs *before* unwinding, so the first call to [`isolate`]
//! installs a hook that records a backtrace into a thread-local slot and then
//! delegates to whatever hook was installed before.  `isolate` takes the
//! recorded backtrace out of that slot when it reports the panic.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use tracing::error;

thread_local! {
    static LAST_BACKTRACE: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// Wrapper that formats a panic payload when logged or displayed.
///
/// `String` and `&'static str` payloads print as text; anything else falls
/// back to `Debug` formatting.
#[derive(Debug)]
pub struct PanicMessage(Box<dyn Any + Send>);

impl fmt::Display for PanicMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(s) = self.0.downcast_ref::<String>() {
            f.write_str(s)
        } else if let Some(s) = self.0.downcast_ref::<&'static str>() {
            f.write_str(s)
        } else {
            write!(f, "{:?}", self.0)
        }
    }
}

/// Creates a [`PanicMessage`] for the given payload.
pub fn format_panic(payload: Box<dyn Any + Send>) -> PanicMessage {
    PanicMessage(payload)
}

/// Runs `f`, containing any panic it raises.
///
/// Returns `true` if `f` completed normally and `false` if it panicked.  A
/// panic is logged at error level with `label`, the panic message, and the
/// backtrace of the panic site.
pub fn isolate<F: FnOnce()>(label: &str, f: F) -> bool {
    install_hook();
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(()) => true,
        Err(payload) => {
            let backtrace = LAST_BACKTRACE
                .with(|slot| slot.borrow_mut().take())
                .unwrap_or_else(Backtrace::force_capture);
            error!(
                "{label} handler panicked: {}\n{backtrace}",
                format_panic(payload)
            );
            false
        }
    }
}

fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            LAST_BACKTRACE.with(|slot| *slot.borrow_mut() = Some(Backtrace::force_capture()));
            previous(info);
        }));
    });
}

// ── Tests ─────────────────────────────────────────────────────────────────────
