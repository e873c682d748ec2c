use std::fmt;
use std::panic::{self, UnwindSafe};

use serde::Serialize;

/// A broken compiler invariant.
///
/// Internal errors are never user diagnostics: they mean the compiler itself
/// reached a state it considers impossible (a cache consulted before it was
/// filled, a storage slot count overflowing 256 bits, ...). They abort the
/// current pass by unwinding with this value as the panic payload, so a
/// driver can tell them apart from ordinary panics with [`catch_internal`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InternalError {
    pub message: String,
    pub file: &'static str,
    pub line: u32,
}

impl fmt::Display for InternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "internal compiler error: {} ({}:{})",
            self.message, self.file, self.line
        )
    }
}

impl std::error::Error for InternalError {}

/// Abort the current pass with an [`InternalError`].
///
/// Prefer the [`tsol_assert!`](crate::tsol_assert) and
/// [`tsol_unreachable!`](crate::tsol_unreachable) macros, which fill in the
/// source location.
#[cold]
#[track_caller]
pub fn fatal(message: String, file: &'static str, line: u32) -> ! {
    panic::panic_any(InternalError { message, file, line })
}

/// Run `f`, turning an unwinding [`InternalError`] into an `Err`.
///
/// Panics that do not carry an `InternalError` payload are resumed.
pub fn catch_internal<R>(f: impl FnOnce() -> R + UnwindSafe) -> Result<R, InternalError> {
    match panic::catch_unwind(f) {
        Ok(value) => Ok(value),
        Err(payload) => match payload.downcast::<InternalError>() {
            Ok(err) => Err(*err),
            Err(other) => panic::resume_unwind(other),
        },
    }
}

/// Check a compiler invariant, raising an [`InternalError`] when it fails.
#[macro_export]
macro_rules! tsol_assert {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            $crate::error::fatal(format!($($arg)+), file!(), line!())
        }
    };
}

/// Mark a state the compiler can never reach.
#[macro_export]
macro_rules! tsol_unreachable {
    ($($arg:tt)+) => {
        $crate::error::fatal(format!($($arg)+), file!(), line!())
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_error_display() {
        let err = InternalError {
            message: "Object too large for storage.".into(),
            file: "layout.rs",
            line: 12,
        };
        assert_eq!(
            err.to_string(),
            "internal compiler error: Object too large for storage. (layout.rs:12)"
        );
    }

    #[test]
    fn assert_passes_through_on_success() {
        let result = catch_internal(|| {
            tsol_assert!(1 + 1 == 2, "arithmetic is broken");
            7
        });
        assert_eq!(result, Ok(7));
    }

    #[test]
    fn assert_failure_is_caught_as_internal_error() {
        let err = catch_internal(|| {
            tsol_assert!(false, "slot {} out of range", 3);
        })
        .unwrap_err();
        assert_eq!(err.message, "slot 3 out of range");
        assert!(err.file.ends_with("error.rs"));
    }

    #[test]
    fn unreachable_is_caught_as_internal_error() {
        let err = catch_internal(|| -> u8 { tsol_unreachable!("unknown category") }).unwrap_err();
        assert_eq!(err.message, "unknown category");
    }

    #[test]
    fn ordinary_panics_are_resumed() {
        let outer = std::panic::catch_unwind(|| {
            let _ = catch_internal(|| panic!("plain panic"));
        });
        assert!(outer.is_err());
    }
}
