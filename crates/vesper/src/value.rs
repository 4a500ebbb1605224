use indexmap::IndexMap;

use crate::{
    builtins::Primitive,
    heap::{Heap, HeapId},
};

/// Environment frame: symbol id → value, insertion-ordered so frames print
/// deterministically, hashed on symbol identity (symbols are interned, so
/// identity equals name equality).
pub(crate) type Frame = IndexMap<HeapId, Value, ahash::RandomState>;

/// A Scheme value.
///
/// Small values are immediates stored inline; everything with identity or
/// interior mutability lives on the heap behind `Ref`. The singleton
/// invariants (one empty list, one `#t`, one `#f`) hold structurally:
/// immediates compare by value, which for these variants is the same thing.
///
/// `Copy` is deliberate: a `Value` is just a tag plus a payload word. It does
/// NOT keep its referent alive — that is the job of [`crate::heap::Root`]
/// lock handles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    EmptyList,
    Bool(bool),
    /// Exact integer.
    Int(i64),
    /// Inexact real.
    Float(f64),
    /// One byte; source text is treated as bytes throughout.
    Char(u8),
    /// A built-in procedure or special form. Special forms are recognized by
    /// matching this variant after resolving the head symbol through the
    /// environment, never by name.
    Primitive(Primitive),
    Ref(HeapId),
}

/// Heap-resident payloads referenced by [`Value::Ref`].
#[derive(Debug)]
pub(crate) enum HeapData {
    Str(StrData),
    /// Interned symbol name. The interning map does not pin the symbol; the
    /// sweep removes the map entry when the symbol dies.
    Symbol(Box<str>),
    Pair(PairData),
    Vector(VectorData),
    Env(EnvData),
    Lambda(LambdaData),
    Promise(PromiseData),
}

#[derive(Debug)]
pub(crate) struct StrData {
    pub bytes: Vec<u8>,
    pub read_only: bool,
}

#[derive(Debug)]
pub(crate) struct PairData {
    pub car: Value,
    pub cdr: Value,
    pub read_only: bool,
}

#[derive(Debug)]
pub(crate) struct VectorData {
    pub items: Vec<Value>,
    pub read_only: bool,
}

#[derive(Debug)]
pub(crate) struct EnvData {
    pub frame: Frame,
    pub enclosing: Option<HeapId>,
}

#[derive(Debug)]
pub(crate) struct LambdaData {
    /// Required parameters, as interned symbol ids, in order.
    pub params: Vec<HeapId>,
    /// Rest parameter, bound to a fresh proper list of the extra arguments.
    pub rest: Option<HeapId>,
    /// Body expressions, evaluated in order; the last produces the result.
    pub body: Vec<Value>,
    /// Captured lexical environment.
    pub env: HeapId,
}

#[derive(Debug)]
pub(crate) struct PromiseData {
    pub expr: Value,
    pub env: HeapId,
    /// Memoized result; set exactly once, stable afterwards.
    pub forced: Option<Value>,
}

impl HeapData {
    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::Pair(_) => "pair",
            Self::Vector(_) => "vector",
            Self::Env(_) => "environment",
            Self::Lambda(_) => "procedure",
            Self::Promise(_) => "promise",
        }
    }
}

impl Value {
    /// `eq?`: identity. For immediates identity and value coincide; for heap
    /// values it is slot identity.
    #[must_use]
    pub fn is_eq(self, other: Self) -> bool {
        self == other
    }

    /// `eqv?`: identity, then same-tag value comparison over the narrow set
    /// (numbers of the same tag, characters, booleans). With interned symbols
    /// and immediate scalars this collapses to `eq?`.
    #[must_use]
    pub fn is_eqv(self, other: Self) -> bool {
        self.is_eq(other)
    }

    #[must_use]
    pub fn is_false(self) -> bool {
        self == Self::Bool(false)
    }

    /// Everything but `#f` is true in a test position.
    #[must_use]
    pub fn is_truthy(self) -> bool {
        !self.is_false()
    }

    #[must_use]
    pub fn is_number(self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    #[must_use]
    pub fn as_symbol(self, heap: &Heap) -> Option<HeapId> {
        if let Self::Ref(id) = self
            && heap.with_data(id, |data| matches!(data, HeapData::Symbol(_)))
        {
            return Some(id);
        }
        None
    }

    #[must_use]
    pub fn as_pair(self, heap: &Heap) -> Option<(Self, Self)> {
        if let Self::Ref(id) = self {
            return heap.with_data(id, |data| match data {
                HeapData::Pair(pair) => Some((pair.car, pair.cdr)),
                _ => None,
            });
        }
        None
    }

    #[must_use]
    pub fn pair_id(self, heap: &Heap) -> Option<HeapId> {
        if let Self::Ref(id) = self
            && heap.with_data(id, |data| matches!(data, HeapData::Pair(_)))
        {
            return Some(id);
        }
        None
    }

    #[must_use]
    pub fn string_id(self, heap: &Heap) -> Option<HeapId> {
        if let Self::Ref(id) = self
            && heap.with_data(id, |data| matches!(data, HeapData::Str(_)))
        {
            return Some(id);
        }
        None
    }

    #[must_use]
    pub fn vector_id(self, heap: &Heap) -> Option<HeapId> {
        if let Self::Ref(id) = self
            && heap.with_data(id, |data| matches!(data, HeapData::Vector(_)))
        {
            return Some(id);
        }
        None
    }

    #[must_use]
    pub fn env_id(self, heap: &Heap) -> Option<HeapId> {
        if let Self::Ref(id) = self
            && heap.with_data(id, |data| matches!(data, HeapData::Env(_)))
        {
            return Some(id);
        }
        None
    }

    #[must_use]
    pub fn lambda_id(self, heap: &Heap) -> Option<HeapId> {
        if let Self::Ref(id) = self
            && heap.with_data(id, |data| matches!(data, HeapData::Lambda(_)))
        {
            return Some(id);
        }
        None
    }

    #[must_use]
    pub fn promise_id(self, heap: &Heap) -> Option<HeapId> {
        if let Self::Ref(id) = self
            && heap.with_data(id, |data| matches!(data, HeapData::Promise(_)))
        {
            return Some(id);
        }
        None
    }

    /// True for values `apply` and the evaluator accept in operator position.
    #[must_use]
    pub fn is_procedure(self, heap: &Heap) -> bool {
        match self {
            Self::Primitive(prim) => !prim.is_special(),
            _ => self.lambda_id(heap).is_some(),
        }
    }

    /// Type name used in diagnostics.
    #[must_use]
    pub fn type_name(self, heap: &Heap) -> &'static str {
        match self {
            Self::EmptyList => "empty list",
            Self::Bool(_) => "boolean",
            Self::Int(_) | Self::Float(_) => "number",
            Self::Char(_) => "character",
            Self::Primitive(_) => "procedure",
            Self::Ref(id) => heap.with_data(id, HeapData::type_name),
        }
    }
}

/// `equal?`: recurses through pairs and vectors, compares strings by
/// contents, and falls back to `eqv?` at the leaves.
///
/// Like the language it implements, this diverges on cyclic structure.
#[must_use]
pub fn is_equal(heap: &Heap, a: Value, b: Value) -> bool {
    if a.is_eqv(b) {
        return true;
    }
    let (Value::Ref(ia), Value::Ref(ib)) = (a, b) else {
        return false;
    };
    enum Shape {
        Str(Vec<u8>),
        Pair(Value, Value),
        Vector(Vec<Value>),
        Other,
    }
    let shape = |id: HeapId| {
        heap.with_data(id, |data| match data {
            HeapData::Str(s) => Shape::Str(s.bytes.clone()),
            HeapData::Pair(p) => Shape::Pair(p.car, p.cdr),
            HeapData::Vector(v) => Shape::Vector(v.items.clone()),
            _ => Shape::Other,
        })
    };
    match (shape(ia), shape(ib)) {
        (Shape::Str(sa), Shape::Str(sb)) => sa == sb,
        (Shape::Pair(car_a, cdr_a), Shape::Pair(car_b, cdr_b)) => {
            is_equal(heap, car_a, car_b) && is_equal(heap, cdr_a, cdr_b)
        }
        (Shape::Vector(va), Shape::Vector(vb)) => {
            va.len() == vb.len() && va.iter().zip(&vb).all(|(&x, &y)| is_equal(heap, x, y))
        }
        _ => false,
    }
}
