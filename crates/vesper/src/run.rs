//! Batch evaluation: one heap, one default environment, source in, printed
//! values out.

use std::{fs, path::Path};

use crate::{
    builtins, env,
    error::{Error, ErrorKind, EvalResult},
    eval::eval,
    heap::{Heap, Root},
    parse::read_source,
    print::render,
    value::Value,
};

/// Owns an interpreter instance: the heap and the default environment,
/// pre-populated with every primitive binding. The environment is pinned for
/// the runner's lifetime; everything defined into it stays reachable.
pub struct Runner {
    heap: Heap,
    global_env: Value,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    #[must_use]
    pub fn new() -> Self {
        let heap = Heap::new();
        let global_env = {
            let env = heap.alloc_env(None);
            builtins::install(&heap, &env);
            heap.pin(env.value());
            env.value()
        };
        Self { heap, global_env }
    }

    /// Forwards debug-memory mode (collect on every allocation) to the heap.
    pub fn set_debug_memory(&self, enabled: bool) {
        self.heap.set_debug_memory(enabled);
    }

    #[must_use]
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// A fresh lock handle on the default environment.
    #[must_use]
    pub fn global_env(&self) -> Root<'_> {
        self.heap.root(self.global_env)
    }

    /// Defines `name` in the default environment; handy for embedding.
    pub fn define(&self, name: &str, value: Value) {
        let symbol = self.heap.intern(name);
        let Value::Ref(sym) = symbol.value() else { unreachable!() };
        env::define(&self.heap, self.global_env, sym, value);
    }

    /// Evaluates every top-level form in `source` against the default
    /// environment, returning each form's printed result in order. The first
    /// error (syntax or runtime) aborts the rest of the source.
    pub fn eval_source(&self, source: &str, path: &str) -> EvalResult<Vec<String>> {
        let env = self.global_env();
        let forms = read_source(&self.heap, source, path)?;
        tracing::debug!(path, forms = forms.len(), "evaluating source");
        let mut printed = Vec::with_capacity(forms.len());
        for form in &forms {
            let result = eval(&self.heap, &env, form)?;
            printed.push(render(&self.heap, result.value()).to_string());
        }
        Ok(printed)
    }

    /// Reads and evaluates a script file. A file that cannot be read is an
    /// I/O error; the driver treats that differently from evaluation errors
    /// when choosing its exit status.
    pub fn eval_file(&self, path: &Path) -> EvalResult<Vec<String>> {
        let source = fs::read_to_string(path).map_err(|err| {
            Error::new(ErrorKind::Io, format!("failed to read {}: {err}", path.display()))
        })?;
        self.eval_source(&source, &path.display().to_string())
    }
}
