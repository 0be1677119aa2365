//! The top-level recovery checkpoint
//!
//! Runtime faults propagate as `Err(Trap)` up to exactly one place, the
//! checkpoint, which logs the trap and reports it with its category code.
//! It never retries; the caller decides whether to terminate or carry on.

use sylva_engine::{Trap, TrapKind};

/// Result of running work under the checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointOutcome<T> {
    /// The work finished normally
    Completed(T),
    /// The work trapped
    Trapped {
        /// Category
        kind: TrapKind,
        /// Category code
        code: i32,
        /// Rendered trap message
        message: String,
    },
}

impl<T> CheckpointOutcome<T> {
    /// Whether the work completed.
    pub fn is_completed(&self) -> bool {
        matches!(self, CheckpointOutcome::Completed(_))
    }

    /// Process exit code: 0 on completion, the trap code otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            CheckpointOutcome::Completed(_) => 0,
            CheckpointOutcome::Trapped { code, .. } => *code,
        }
    }

    /// The completed value, if any.
    pub fn completed(self) -> Option<T> {
        match self {
            CheckpointOutcome::Completed(value) => Some(value),
            CheckpointOutcome::Trapped { .. } => None,
        }
    }
}

/// Run `work`, converting any error into a trap report.
pub fn checkpoint<T, E, F>(work: F) -> CheckpointOutcome<T>
where
    F: FnOnce() -> Result<T, E>,
    E: Into<Trap>,
{
    match work() {
        Ok(value) => CheckpointOutcome::Completed(value),
        Err(err) => {
            let trap: Trap = err.into();
            tracing::error!(kind = %trap.kind, code = trap.code(), "{}", trap.message);
            CheckpointOutcome::Trapped {
                kind: trap.kind,
                code: trap.code(),
                message: trap.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed() {
        let outcome = checkpoint(|| Ok::<_, Trap>(7));
        assert!(outcome.is_completed());
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(outcome.completed(), Some(7));
    }

    #[test]
    fn test_trap_codes() {
        let cases = [
            (Trap::fault("boom"), 5),
            (Trap::assertion("x > 0"), 2),
            (Trap::abort("stop"), 3),
        ];
        for (trap, code) in cases {
            let kind = trap.kind;
            let outcome: CheckpointOutcome<()> = checkpoint(|| Err(trap));
            assert_eq!(outcome.exit_code(), code);
            match outcome {
                CheckpointOutcome::Trapped { kind: k, .. } => assert_eq!(k, kind),
                CheckpointOutcome::Completed(_) => panic!("expected a trap"),
            }
        }
    }

    #[test]
    fn test_message_includes_location() {
        let outcome: CheckpointOutcome<()> =
            checkpoint(|| Err(Trap::assertion("x > 0").at("main.bsq", 12)));
        match outcome {
            CheckpointOutcome::Trapped { message, .. } => {
                assert_eq!(message, "assertion failed: x > 0 (at main.bsq:12)")
            }
            CheckpointOutcome::Completed(_) => panic!("expected a trap"),
        }
    }
}
