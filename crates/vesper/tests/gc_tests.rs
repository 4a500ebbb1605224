//! Heap reachability and reclamation.

use pretty_assertions::assert_eq;
use vesper::{heap::Heap, print::render, Runner, Value};

/// Dropping the only lock handle makes a value collectable.
#[test]
fn unrooted_values_are_swept() {
    let heap = Heap::new();
    {
        let one = heap.root(Value::Int(1));
        let nil = heap.root(Value::EmptyList);
        let pair = heap.cons(&one, &nil);
        assert_eq!(heap.live_objects(), 1);
        assert_eq!(render(&heap, pair.value()).to_string(), "(1)");
    }
    heap.collect();
    assert_eq!(heap.live_objects(), 0, "nothing was rooted, so nothing survives");
}

/// A lock handle keeps its value and everything reachable from it alive.
#[test]
fn rooted_chains_survive_collection() {
    let heap = Heap::new();
    let one = heap.root(Value::Int(1));
    let nil = heap.root(Value::EmptyList);
    let inner = heap.cons(&one, &nil);
    let outer = heap.cons(&inner, &inner);
    drop(inner);

    heap.collect();
    assert_eq!(heap.live_objects(), 2, "outer pair and the inner pair it references");
    assert_eq!(render(&heap, outer.value()).to_string(), "((1) 1)");
}

/// Cloning a handle re-locks, so the original can be dropped freely.
#[test]
fn cloned_roots_lock_independently() {
    let heap = Heap::new();
    let nil = heap.root(Value::EmptyList);
    let one = heap.root(Value::Int(1));
    let first = heap.cons(&one, &nil);
    let second = first.clone();
    drop(first);
    heap.collect();
    assert_eq!(heap.live_objects(), 1);
    assert_eq!(render(&heap, second.value()).to_string(), "(1)");
}

/// Interning is identity: same name, same value.
#[test]
fn symbols_intern_to_the_same_value() {
    let heap = Heap::new();
    let a = heap.intern("foo");
    let b = heap.intern("foo");
    let c = heap.intern("bar");
    assert_eq!(a.value(), b.value(), "equal names must intern identically");
    assert!(a.value() != c.value());
    assert_eq!(heap.stats().interned_symbols, 2);
}

/// The interning table holds no lock: an unreferenced symbol is reclaimed
/// and its table entry removed, after which the name can intern afresh.
#[test]
fn symbol_table_is_weak() {
    let heap = Heap::new();
    {
        let _sym = heap.intern("transient");
        assert_eq!(heap.stats().interned_symbols, 1);
    }
    heap.collect();
    assert_eq!(heap.stats().interned_symbols, 0, "dead symbols leave the table");
    assert_eq!(heap.live_objects(), 0);

    let again = heap.intern("transient");
    heap.collect();
    assert_eq!(heap.stats().interned_symbols, 1);
    assert_eq!(render(&heap, again.value()).to_string(), "transient");
}

/// Environment frames keep both their values and their key symbols alive.
#[test]
fn environments_root_their_bindings() {
    let heap = Heap::new();
    let env = heap.alloc_env(None);
    {
        let sym = heap.intern("x");
        let one = heap.root(Value::Int(1));
        let nil = heap.root(Value::EmptyList);
        let list = heap.cons(&one, &nil);
        let Value::Ref(sym_id) = sym.value() else { unreachable!() };
        vesper::env::define(&heap, env.value(), sym_id, list.value());
    }
    heap.collect();
    // env + symbol + pair
    assert_eq!(heap.live_objects(), 3);
    assert_eq!(heap.stats().interned_symbols, 1, "frame keys pin their symbols");
}

/// Free slots are reused by later allocations.
#[test]
fn slots_recycle_through_the_free_list() {
    let heap = Heap::new();
    {
        let _garbage = heap.alloc_string(b"dead".to_vec(), false);
    }
    heap.collect();
    let before = heap.stats();
    assert_eq!(before.free_slots, 1);

    let _live = heap.alloc_string(b"live".to_vec(), false);
    let after = heap.stats();
    assert_eq!(after.total_slots, before.total_slots, "the freed slot is reused");
    assert_eq!(after.free_slots, 0);
}

#[test]
fn purge_drops_everything() {
    let heap = Heap::new();
    let keep = heap.intern("kept");
    drop(keep);
    heap.purge();
    let stats = heap.stats();
    assert_eq!(stats.live_objects, 0);
    assert_eq!(stats.interned_symbols, 0);
}

/// After evaluation with no outstanding handles, a collect returns the heap
/// to exactly what the default environment keeps reachable.
#[test]
fn evaluation_garbage_is_reclaimed() {
    let runner = Runner::new();
    runner.heap().collect();
    let baseline = runner.heap().live_objects();

    runner.eval_source("(vector (list 1 2 3) \"scratch\")", "test").unwrap();
    assert!(
        runner.heap().live_objects() > baseline,
        "the discarded result should linger until the next collection"
    );

    runner.heap().collect();
    assert_eq!(runner.heap().live_objects(), baseline, "only default-environment data survives");
}

/// Definitions hang off the pinned default environment and survive any
/// number of collections.
#[test]
fn definitions_survive_collection() {
    let runner = Runner::new();
    runner.eval_source("(define x (list 1 2 3))", "test").unwrap();
    runner.heap().collect();
    runner.heap().collect();
    let printed = runner.eval_source("x", "test").unwrap();
    assert_eq!(printed, vec!["(1 2 3)"]);
}

/// Debug-memory mode collects on every allocation; evaluation still works.
#[test]
fn debug_memory_mode_is_transparent() {
    let runner = Runner::new();
    runner.set_debug_memory(true);
    let printed = runner
        .eval_source("(define (sum l) (if (null? l) 0 (+ (car l) (sum (cdr l))))) (sum '(1 2 3 4))", "test")
        .unwrap();
    assert_eq!(printed.last().map(String::as_str), Some("10"));
}

/// Cyclic structure (closure ↔ environment) is exactly what mark-and-sweep
/// exists for: it must be reclaimed once unreachable.
#[test]
fn cycles_are_collected() {
    let runner = Runner::new();
    runner.heap().collect();
    let baseline = runner.heap().live_objects();

    // The let-scope environment and the closure capture each other.
    runner
        .eval_source("((let ((self '())) (set! self (lambda () self)) self))", "test")
        .unwrap();
    runner.heap().collect();
    assert_eq!(runner.heap().live_objects(), baseline, "closure/environment cycle was reclaimed");
}
