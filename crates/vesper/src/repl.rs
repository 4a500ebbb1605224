//! Persistent interactive session: definitions and heap state survive
//! across `execute` calls, and an error leaves the session intact.

use crate::{error::EvalResult, heap::Heap, run::Runner};

/// Interpreter state for a read–eval–print loop. The line-editing front end
/// lives in the CLI; this type only evaluates and formats.
pub struct ReplSession {
    runner: Runner,
}

impl Default for ReplSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplSession {
    #[must_use]
    pub fn new() -> Self {
        Self { runner: Runner::new() }
    }

    pub fn set_debug_memory(&self, enabled: bool) {
        self.runner.set_debug_memory(enabled);
    }

    #[must_use]
    pub fn heap(&self) -> &Heap {
        self.runner.heap()
    }

    /// Evaluates one line of input. Returns the printed value of the last
    /// top-level form, or `None` when the line held no forms. On error the
    /// session keeps whatever definitions completed before the failure.
    pub fn execute(&mut self, source: &str) -> EvalResult<Option<String>> {
        let mut printed = self.runner.eval_source(source, "repl")?;
        Ok(printed.pop())
    }
}
