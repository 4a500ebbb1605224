//! Environment frames.
//!
//! A frame is an insertion-ordered map from interned symbol to value plus an
//! optional enclosing frame; frames live on the heap like everything else so
//! closures can capture them and the collector can see the cycle. Lookup
//! walks the enclosing chain; `define` always writes the current frame;
//! `set` rebinds the first occurrence up the chain.

use crate::{
    error::{Error, EvalResult},
    heap::{Heap, HeapId, Root},
    value::{HeapData, Value},
};

fn env_id(heap: &Heap, env: Value) -> HeapId {
    env.env_id(heap).expect("operated on a non-environment value")
}

/// Binds `sym` in the current frame, replacing any existing binding there.
pub fn define(heap: &Heap, env: Value, sym: HeapId, value: Value) {
    let id = env_id(heap, env);
    heap.with_data_mut(id, |data| {
        let HeapData::Env(env) = data else { unreachable!() };
        env.frame.insert(sym, value);
    });
}

/// Rebinds the first occurrence of `sym` along the enclosing chain.
/// Fails with "unbound variable" when no frame binds it.
pub fn set(heap: &Heap, env: Value, sym: HeapId, value: Value) -> EvalResult<()> {
    let mut current = env_id(heap, env);
    loop {
        let outcome = heap.with_data_mut(current, |data| {
            let HeapData::Env(env) = data else { unreachable!() };
            if let Some(slot) = env.frame.get_mut(&sym) {
                *slot = value;
                Ok(())
            } else {
                Err(env.enclosing)
            }
        });
        match outcome {
            Ok(()) => return Ok(()),
            Err(Some(enclosing)) => current = enclosing,
            Err(None) => return Err(Error::unbound(&heap.symbol_name(sym))),
        }
    }
}

/// Resolves `sym` along the enclosing chain.
pub fn lookup(heap: &Heap, env: Value, sym: HeapId) -> EvalResult<Value> {
    try_lookup(heap, env, sym).ok_or_else(|| Error::unbound(&heap.symbol_name(sym)))
}

/// Like [`lookup`] but silent on failure; used where an unbound name has a
/// meaning of its own (`else` and `=>` positions in `cond`/`case`).
#[must_use]
pub fn try_lookup(heap: &Heap, env: Value, sym: HeapId) -> Option<Value> {
    let mut current = env_id(heap, env);
    loop {
        let outcome = heap.with_data(current, |data| {
            let HeapData::Env(env) = data else { unreachable!() };
            match env.frame.get(&sym) {
                Some(&value) => Ok(value),
                None => Err(env.enclosing),
            }
        });
        match outcome {
            Ok(value) => return Some(value),
            Err(Some(enclosing)) => current = enclosing,
            Err(None) => return None,
        }
    }
}

/// A fresh frame enclosed by `enclosing`.
#[must_use]
pub fn new_scope<'h>(heap: &'h Heap, enclosing: &Root<'h>) -> Root<'h> {
    heap.alloc_env(Some(enclosing))
}
