//! The edge between host calls and the conversion pipeline: a process-wide
//! panic hook and a guard that turns unwinding panics into [`ConversionError`]s.

use std::any::Any;
use std::panic::{self, catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;
use crate::error::{ConversionError, Stage};

static INSTALL: Once = Once::new();
static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Routes panic reports through `log` (and the browser console on wasm32).
/// Calling it more than once has no further effect.
pub fn install_panic_hook() {
    INSTALL.call_once(|| {
        panic::set_hook(Box::new(|info| {
            let location = info
                .location()
                .map(|l| format!(" at {}:{}", l.file(), l.line()))
                .unwrap_or_default();
            let report = format!("panic{}: {}", location, panic_message(info.payload()));
            log::error!("{}", report);
            #[cfg(target_arch = "wasm32")]
            web_sys::console::error_1(&report.into());
        }));
        INSTALLED.store(true, Ordering::Release);
    });
}

pub fn is_installed() -> bool {
    INSTALLED.load(Ordering::Acquire)
}

/// Runs one pipeline stage, reporting a panic inside it as an internal fault.
///
/// On wasm32 builds compiled with `panic = "abort"` nothing unwinds, so only
/// the hook's console report survives.
pub(crate) fn guard<T>(stage: Stage, f: impl FnOnce() -> Result<T, ConversionError>) -> Result<T, ConversionError> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(%stage, %message, "stage panicked");
            Err(ConversionError::InternalFault { stage, message })
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
