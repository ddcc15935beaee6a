// src/exit.rs
//! Process exit codes for `leakguard`.
//!
//! Provides a stable contract for scripts and CI.

use std::process::Termination;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum LeakGuardExit {
    /// Operation completed, nothing to report.
    Success = 0,
    /// Generic error (IO, config, parse).
    Error = 1,
    /// Invalid request (bad position, unknown leak type).
    InvalidInput = 2,
    /// The scan found leaks.
    FindingsPresent = 3,
    /// A fix could not be generated for the requested finding.
    FixFailure = 4,
}

impl LeakGuardExit {
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl Termination for LeakGuardExit {
    fn report(self) -> std::process::ExitCode {
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        std::process::ExitCode::from(self.code() as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(LeakGuardExit::Success.code(), 0);
        assert_eq!(LeakGuardExit::InvalidInput.code(), 2);
        assert_eq!(LeakGuardExit::FindingsPresent.code(), 3);
        assert_eq!(LeakGuardExit::FixFailure.code(), 4);
    }
}
