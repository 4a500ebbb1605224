use std::cell::{Cell, RefCell};

use ahash::AHashMap;

use crate::{
    error::{Error, EvalResult},
    value::{EnvData, HeapData, LambdaData, PairData, PromiseData, StrData, Value, VectorData},
};

/// Collection runs after this many allocations, unless debug-memory mode
/// forces a collection on every allocation.
pub const GC_INTERVAL: u32 = 1000;

/// Identity of a heap slot. Slot ids are reused after a sweep, so a `HeapId`
/// must never be held across an allocation without a [`Root`] keeping its
/// referent alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeapId(u32);

impl HeapId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
struct Slot {
    data: HeapData,
    /// Outstanding lock handles. Any slot with a positive count is a GC root.
    lock_count: u32,
    marked: bool,
}

/// Snapshot of heap occupancy, for tests and collection logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
    pub live_objects: usize,
    pub free_slots: usize,
    pub total_slots: usize,
    pub interned_symbols: usize,
}

/// Arena that owns every heap-resident value for one interpreter instance.
///
/// Slots are reused through a free list. Reclamation is non-incremental
/// mark-and-sweep: the mark phase starts from every slot with a positive lock
/// count and traverses owned edges (pair car/cdr, vector elements,
/// environment frames and their enclosing chain, lambda bodies and captured
/// environments, promise state); the sweep frees everything unmarked and
/// drops dead symbols from the interning map.
///
/// Interior mutability lets [`Root`] be an RAII guard borrowing the heap.
/// The one rule that follows: never allocate (or collect) while inside a
/// `with_data` closure — the arena is borrowed for the duration.
#[derive(Debug, Default)]
pub struct Heap {
    entries: RefCell<Vec<Option<Slot>>>,
    free_list: RefCell<Vec<HeapId>>,
    /// Interned symbol name → slot. Holds no lock: purely a lookup index,
    /// maintained by `intern` and the sweep.
    symbols: RefCell<AHashMap<Box<str>, HeapId>>,
    allocations_since_gc: Cell<u32>,
    debug_memory: Cell<bool>,
}

/// Lock handle: a stack-resident guard that keeps its value (and everything
/// reachable from it) alive across allocations. Cloning re-locks; dropping
/// releases. These are the only GC roots.
#[derive(Debug)]
pub struct Root<'h> {
    heap: &'h Heap,
    value: Value,
}

impl Root<'_> {
    #[must_use]
    pub fn value(&self) -> Value {
        self.value
    }
}

impl Clone for Root<'_> {
    fn clone(&self) -> Self {
        self.heap.root(self.value)
    }
}

impl Drop for Root<'_> {
    fn drop(&mut self) {
        self.heap.unlock(self.value);
    }
}

impl Heap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// When enabled, every allocation runs a full collection first.
    pub fn set_debug_memory(&self, enabled: bool) {
        self.debug_memory.set(enabled);
    }

    /// Acquires a lock handle for `value`.
    #[must_use]
    pub fn root(&self, value: Value) -> Root<'_> {
        self.lock(value);
        Root { heap: self, value }
    }

    /// Locks `value` for the rest of the heap's life, with no guard to
    /// release it. Used for the default environment.
    pub fn pin(&self, value: Value) {
        self.lock(value);
    }

    fn lock(&self, value: Value) {
        if let Value::Ref(id) = value {
            let mut entries = self.entries.borrow_mut();
            let slot = entries[id.index()].as_mut().expect("locked a freed heap slot");
            slot.lock_count += 1;
        }
    }

    fn unlock(&self, value: Value) {
        if let Value::Ref(id) = value {
            let mut entries = self.entries.borrow_mut();
            let slot = entries[id.index()].as_mut().expect("unlocked a freed heap slot");
            debug_assert!(slot.lock_count > 0, "lock count underflow");
            slot.lock_count -= 1;
        }
    }

    /// Allocates a slot for `data`, possibly collecting first, and returns it
    /// already rooted. Anything `data` references must be reachable from a
    /// live root at the point of the call.
    pub(crate) fn alloc(&self, data: HeapData) -> Root<'_> {
        if self.debug_memory.get() || self.allocations_since_gc.get() >= GC_INTERVAL {
            self.collect();
        }
        self.allocations_since_gc.set(self.allocations_since_gc.get() + 1);

        let slot = Slot {
            data,
            // Born locked: the slot is its own root until the returned
            // handle is dropped.
            lock_count: 1,
            marked: false,
        };
        let mut entries = self.entries.borrow_mut();
        let id = if let Some(id) = self.free_list.borrow_mut().pop() {
            entries[id.index()] = Some(slot);
            id
        } else {
            entries.push(Some(slot));
            HeapId(u32::try_from(entries.len() - 1).expect("heap slot count overflow"))
        };
        drop(entries);
        Root {
            heap: self,
            value: Value::Ref(id),
        }
    }

    /// Returns the canonical symbol for `name`, creating it on first use.
    /// Two calls with the same name return the identical value.
    #[must_use]
    pub fn intern(&self, name: &str) -> Root<'_> {
        let existing = self.symbols.borrow().get(name).copied();
        if let Some(id) = existing {
            return self.root(Value::Ref(id));
        }
        let root = self.alloc(HeapData::Symbol(name.into()));
        let Value::Ref(id) = root.value() else { unreachable!() };
        self.symbols.borrow_mut().insert(name.into(), id);
        root
    }

    /// Reads slot data under the arena borrow. The closure must not allocate
    /// or mutate the heap.
    pub(crate) fn with_data<R>(&self, id: HeapId, f: impl FnOnce(&HeapData) -> R) -> R {
        let entries = self.entries.borrow();
        let slot = entries[id.index()].as_ref().expect("accessed a freed heap slot");
        f(&slot.data)
    }

    pub(crate) fn with_data_mut<R>(&self, id: HeapId, f: impl FnOnce(&mut HeapData) -> R) -> R {
        let mut entries = self.entries.borrow_mut();
        let slot = entries[id.index()].as_mut().expect("accessed a freed heap slot");
        f(&mut slot.data)
    }

    // ------------------------------------------------------------------
    // Constructors. These take lock handles, not bare values: the caller
    // must already be keeping the children alive, because allocation can
    // trigger a collection before the new slot exists.
    // ------------------------------------------------------------------

    #[must_use]
    pub fn cons(&self, car: &Root<'_>, cdr: &Root<'_>) -> Root<'_> {
        self.alloc(HeapData::Pair(PairData {
            car: car.value(),
            cdr: cdr.value(),
            read_only: false,
        }))
    }

    #[must_use]
    pub fn cons_read_only(&self, car: &Root<'_>, cdr: &Root<'_>) -> Root<'_> {
        self.alloc(HeapData::Pair(PairData {
            car: car.value(),
            cdr: cdr.value(),
            read_only: true,
        }))
    }

    /// Builds a proper list from `items`, right to left.
    #[must_use]
    pub fn list(&self, items: &[Root<'_>]) -> Root<'_> {
        let mut tail = self.root(Value::EmptyList);
        for item in items.iter().rev() {
            tail = self.cons(item, &tail);
        }
        tail
    }

    #[must_use]
    pub fn alloc_string(&self, bytes: Vec<u8>, read_only: bool) -> Root<'_> {
        self.alloc(HeapData::Str(StrData { bytes, read_only }))
    }

    #[must_use]
    pub fn alloc_vector(&self, items: &[Root<'_>], read_only: bool) -> Root<'_> {
        let items = items.iter().map(Root::value).collect();
        self.alloc(HeapData::Vector(VectorData { items, read_only }))
    }

    /// Vector of `len` copies of an already-rooted fill value.
    #[must_use]
    pub fn alloc_vector_filled(&self, len: usize, fill: &Root<'_>) -> Root<'_> {
        self.alloc(HeapData::Vector(VectorData {
            items: vec![fill.value(); len],
            read_only: false,
        }))
    }

    #[must_use]
    pub fn alloc_env(&self, enclosing: Option<&Root<'_>>) -> Root<'_> {
        let enclosing = enclosing.map(|e| {
            let Value::Ref(id) = e.value() else {
                panic!("enclosing environment must be a heap value")
            };
            id
        });
        self.alloc(HeapData::Env(EnvData {
            frame: crate::value::Frame::default(),
            enclosing,
        }))
    }

    /// Allocates a closure. `params`, `rest`, and `body` must all be
    /// reachable from `datum_root` (the lambda form being evaluated), which
    /// keeps them alive across this allocation.
    pub(crate) fn alloc_lambda(
        &self,
        params: Vec<HeapId>,
        rest: Option<HeapId>,
        body: Vec<Value>,
        env: &Root<'_>,
    ) -> Root<'_> {
        let Value::Ref(env_id) = env.value() else {
            panic!("captured environment must be a heap value")
        };
        self.alloc(HeapData::Lambda(LambdaData {
            params,
            rest,
            body,
            env: env_id,
        }))
    }

    pub(crate) fn alloc_promise(&self, expr: &Root<'_>, env: &Root<'_>) -> Root<'_> {
        let Value::Ref(env_id) = env.value() else {
            panic!("captured environment must be a heap value")
        };
        self.alloc(HeapData::Promise(PromiseData {
            expr: expr.value(),
            env: env_id,
            forced: None,
        }))
    }

    // ------------------------------------------------------------------
    // Typed accessors and mutators.
    // ------------------------------------------------------------------

    #[must_use]
    pub(crate) fn symbol_name(&self, id: HeapId) -> String {
        self.with_data(id, |data| match data {
            HeapData::Symbol(name) => name.to_string(),
            other => panic!("expected symbol slot, found {}", other.type_name()),
        })
    }

    pub(crate) fn set_car(&self, id: HeapId, value: Value) -> EvalResult<()> {
        self.with_data_mut(id, |data| match data {
            HeapData::Pair(pair) if pair.read_only => Err(Error::read_only("pair")),
            HeapData::Pair(pair) => {
                pair.car = value;
                Ok(())
            }
            other => panic!("expected pair slot, found {}", other.type_name()),
        })
    }

    pub(crate) fn set_cdr(&self, id: HeapId, value: Value) -> EvalResult<()> {
        self.with_data_mut(id, |data| match data {
            HeapData::Pair(pair) if pair.read_only => Err(Error::read_only("pair")),
            HeapData::Pair(pair) => {
                pair.cdr = value;
                Ok(())
            }
            other => panic!("expected pair slot, found {}", other.type_name()),
        })
    }

    /// Copies a string's bytes out. Fine for the sizes Scheme programs throw
    /// around; keeps the arena borrow short.
    #[must_use]
    pub(crate) fn string_bytes(&self, id: HeapId) -> Vec<u8> {
        self.with_data(id, |data| match data {
            HeapData::Str(s) => s.bytes.clone(),
            other => panic!("expected string slot, found {}", other.type_name()),
        })
    }

    pub(crate) fn string_mutate<R>(&self, id: HeapId, f: impl FnOnce(&mut Vec<u8>) -> R) -> EvalResult<R> {
        self.with_data_mut(id, |data| match data {
            HeapData::Str(s) if s.read_only => Err(Error::read_only("string")),
            HeapData::Str(s) => Ok(f(&mut s.bytes)),
            other => panic!("expected string slot, found {}", other.type_name()),
        })
    }

    #[must_use]
    pub(crate) fn vector_items(&self, id: HeapId) -> Vec<Value> {
        self.with_data(id, |data| match data {
            HeapData::Vector(v) => v.items.clone(),
            other => panic!("expected vector slot, found {}", other.type_name()),
        })
    }

    #[must_use]
    pub(crate) fn vector_len(&self, id: HeapId) -> usize {
        self.with_data(id, |data| match data {
            HeapData::Vector(v) => v.items.len(),
            other => panic!("expected vector slot, found {}", other.type_name()),
        })
    }

    pub(crate) fn vector_mutate<R>(&self, id: HeapId, f: impl FnOnce(&mut Vec<Value>) -> R) -> EvalResult<R> {
        self.with_data_mut(id, |data| match data {
            HeapData::Vector(v) if v.read_only => Err(Error::read_only("vector")),
            HeapData::Vector(v) => Ok(f(&mut v.items)),
            other => panic!("expected vector slot, found {}", other.type_name()),
        })
    }

    /// Snapshot of a closure: (params, rest, body, captured env).
    #[must_use]
    pub(crate) fn lambda_parts(&self, id: HeapId) -> (Vec<HeapId>, Option<HeapId>, Vec<Value>, HeapId) {
        self.with_data(id, |data| match data {
            HeapData::Lambda(l) => (l.params.clone(), l.rest, l.body.clone(), l.env),
            other => panic!("expected lambda slot, found {}", other.type_name()),
        })
    }

    /// Snapshot of a promise: (memoized value, captured expr, captured env).
    #[must_use]
    pub(crate) fn promise_parts(&self, id: HeapId) -> (Option<Value>, Value, HeapId) {
        self.with_data(id, |data| match data {
            HeapData::Promise(p) => (p.forced, p.expr, p.env),
            other => panic!("expected promise slot, found {}", other.type_name()),
        })
    }

    /// Fulfills a promise. The memoized value is stable from here on.
    pub(crate) fn promise_fulfill(&self, id: HeapId, value: Value) {
        self.with_data_mut(id, |data| match data {
            HeapData::Promise(p) => {
                if p.forced.is_none() {
                    p.forced = Some(value);
                }
            }
            other => panic!("expected promise slot, found {}", other.type_name()),
        });
    }

    // ------------------------------------------------------------------
    // Collection.
    // ------------------------------------------------------------------

    /// Full mark-and-sweep. Roots are the slots with outstanding locks.
    pub fn collect(&self) {
        let mut entries = self.entries.borrow_mut();

        let mut pending: Vec<HeapId> = entries
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Some(slot) if slot.lock_count > 0 => Some(HeapId(index as u32)),
                _ => None,
            })
            .collect();

        while let Some(id) = pending.pop() {
            let slot = entries[id.index()].as_mut().expect("marked a freed heap slot");
            if slot.marked {
                continue;
            }
            slot.marked = true;
            push_children(&slot.data, &mut pending);
        }

        let mut symbols = self.symbols.borrow_mut();
        let mut free_list = self.free_list.borrow_mut();
        let mut freed = 0usize;
        for (index, entry) in entries.iter_mut().enumerate() {
            match entry {
                Some(slot) if slot.marked => slot.marked = false,
                Some(slot) => {
                    if let HeapData::Symbol(name) = &slot.data {
                        symbols.remove(name.as_ref());
                    }
                    *entry = None;
                    free_list.push(HeapId(index as u32));
                    freed += 1;
                }
                None => {}
            }
        }
        self.allocations_since_gc.set(0);

        let live = entries.iter().filter(|slot| slot.is_some()).count();
        tracing::debug!(freed, live, "heap collection");
    }

    /// Drops every value and the interning map. Used at shutdown; no lock
    /// handle may be outstanding.
    pub fn purge(&self) {
        self.entries.borrow_mut().clear();
        self.free_list.borrow_mut().clear();
        self.symbols.borrow_mut().clear();
        self.allocations_since_gc.set(0);
    }

    #[must_use]
    pub fn stats(&self) -> HeapStats {
        let entries = self.entries.borrow();
        let live_objects = entries.iter().filter(|slot| slot.is_some()).count();
        let total_slots = entries.len();
        HeapStats {
            live_objects,
            free_slots: total_slots - live_objects,
            total_slots,
            interned_symbols: self.symbols.borrow().len(),
        }
    }

    #[must_use]
    pub fn live_objects(&self) -> usize {
        self.stats().live_objects
    }
}

/// Pushes every heap reference owned by `data` onto the mark stack.
fn push_children(data: &HeapData, pending: &mut Vec<HeapId>) {
    fn push_value(value: Value, pending: &mut Vec<HeapId>) {
        if let Value::Ref(id) = value {
            pending.push(id);
        }
    }
    match data {
        HeapData::Str(_) | HeapData::Symbol(_) => {}
        HeapData::Pair(pair) => {
            push_value(pair.car, pending);
            push_value(pair.cdr, pending);
        }
        HeapData::Vector(vector) => {
            for &item in &vector.items {
                push_value(item, pending);
            }
        }
        HeapData::Env(env) => {
            // Frame keys are interned symbols: they are owned edges too, or
            // the sweep would drop a symbol that a frame still uses.
            for (&sym, &value) in &env.frame {
                pending.push(sym);
                push_value(value, pending);
            }
            if let Some(enclosing) = env.enclosing {
                pending.push(enclosing);
            }
        }
        HeapData::Lambda(lambda) => {
            pending.extend(lambda.params.iter().copied());
            if let Some(rest) = lambda.rest {
                pending.push(rest);
            }
            for &expr in &lambda.body {
                push_value(expr, pending);
            }
            pending.push(lambda.env);
        }
        HeapData::Promise(promise) => {
            push_value(promise.expr, pending);
            pending.push(promise.env);
            if let Some(forced) = promise.forced {
                push_value(forced, pending);
            }
        }
    }
}
