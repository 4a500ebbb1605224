use std::fmt;

use crate::{
    heap::{Heap, HeapId},
    value::{HeapData, Value},
};

/// Display adapter producing the written representation of a value.
///
/// Proper lists print as `(a b c)`, dotted chains as `(a b . c)`, vectors as
/// `#(...)`. The empty list prints as `()` so that printed datums read back
/// as `equal?` values. Cyclic structure is the caller's problem, as it is in
/// the language itself.
pub struct Render<'h> {
    heap: &'h Heap,
    value: Value,
}

#[must_use]
pub fn render(heap: &Heap, value: Value) -> Render<'_> {
    Render { heap, value }
}

impl fmt::Display for Render<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self.heap, self.value)
    }
}

fn write_value(f: &mut fmt::Formatter<'_>, heap: &Heap, value: Value) -> fmt::Result {
    match value {
        Value::EmptyList => write!(f, "()"),
        Value::Bool(true) => write!(f, "#t"),
        Value::Bool(false) => write!(f, "#f"),
        Value::Int(i) => write!(f, "{i}"),
        Value::Float(x) => write!(f, "{}", ryu::Buffer::new().format(x)),
        Value::Char(c) => write_char(f, c),
        Value::Primitive(prim) => write!(f, "#<primitive {}>", prim.name()),
        Value::Ref(id) => write_heap_value(f, heap, id),
    }
}

fn write_char(f: &mut fmt::Formatter<'_>, c: u8) -> fmt::Result {
    match c {
        b' ' => write!(f, "#\\space"),
        b'\n' => write!(f, "#\\newline"),
        _ => write!(f, "#\\{}", c as char),
    }
}

fn write_heap_value(f: &mut fmt::Formatter<'_>, heap: &Heap, id: HeapId) -> fmt::Result {
    enum Shape {
        Str(Vec<u8>),
        Symbol(String),
        Pair(Value, Value),
        Vector(Vec<Value>),
        Env,
        Lambda,
        Promise,
    }
    let shape = heap.with_data(id, |data| match data {
        HeapData::Str(s) => Shape::Str(s.bytes.clone()),
        HeapData::Symbol(name) => Shape::Symbol(name.to_string()),
        HeapData::Pair(p) => Shape::Pair(p.car, p.cdr),
        HeapData::Vector(v) => Shape::Vector(v.items.clone()),
        HeapData::Env(_) => Shape::Env,
        HeapData::Lambda(_) => Shape::Lambda,
        HeapData::Promise(_) => Shape::Promise,
    });
    match shape {
        Shape::Str(bytes) => write_string(f, &bytes),
        Shape::Symbol(name) => write!(f, "{name}"),
        Shape::Pair(car, cdr) => write_list(f, heap, car, cdr),
        Shape::Vector(items) => {
            write!(f, "#(")?;
            for (i, &item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write_value(f, heap, item)?;
            }
            write!(f, ")")
        }
        Shape::Env => write!(f, "#<environment>"),
        Shape::Lambda => write!(f, "#<procedure>"),
        Shape::Promise => write!(f, "#<promise>"),
    }
}

fn write_string(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    write!(f, "\"")?;
    for &b in bytes {
        match b {
            b'"' => write!(f, "\\\"")?,
            b'\\' => write!(f, "\\\\")?,
            _ => write!(f, "{}", b as char)?,
        }
    }
    write!(f, "\"")
}

fn write_list(f: &mut fmt::Formatter<'_>, heap: &Heap, car: Value, cdr: Value) -> fmt::Result {
    write!(f, "(")?;
    write_value(f, heap, car)?;
    let mut tail = cdr;
    loop {
        match tail {
            Value::EmptyList => break,
            _ => match tail.as_pair(heap) {
                Some((head, rest)) => {
                    write!(f, " ")?;
                    write_value(f, heap, head)?;
                    tail = rest;
                }
                None => {
                    write!(f, " . ")?;
                    write_value(f, heap, tail)?;
                    break;
                }
            },
        }
    }
    write!(f, ")")
}
