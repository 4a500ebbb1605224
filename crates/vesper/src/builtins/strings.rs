//! String and symbol operations.
//!
//! Strings are byte sequences. Comparisons are lexicographic over bytes;
//! the `-ci` flavors fold ASCII case. `symbol->string` returns a read-only
//! string, so a symbol's name can never be mutated out from under the
//! interning table.

use super::{expect_between, expect_exact, try_char, try_index, try_string, try_symbol, Primitive};
use crate::{
    error::{Error, ErrorKind, EvalResult},
    heap::{Heap, Root},
    value::Value,
};

pub(super) fn is_symbol<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    Ok(super::bool_value(heap, args[0].value().as_symbol(heap).is_some()))
}

pub(super) fn symbol_to_string<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let sym = try_symbol(heap, args[0].value())?;
    let name = heap.symbol_name(sym);
    Ok(heap.alloc_string(name.into_bytes(), true))
}

pub(super) fn string_to_symbol<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let id = try_string(heap, args[0].value())?;
    let name: String = heap.string_bytes(id).iter().map(|&b| b as char).collect();
    Ok(heap.intern(&name))
}

pub(super) fn is_string<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    Ok(super::bool_value(heap, args[0].value().string_id(heap).is_some()))
}

pub(super) fn make_string<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_between(prim, args, 1, 2)?;
    let len = try_index(heap, args[0].value())?;
    let fill = match args.get(1) {
        Some(c) => try_char(heap, c.value())?,
        None => b' ',
    };
    Ok(heap.alloc_string(vec![fill; len], false))
}

pub(super) fn string_of<'h>(heap: &'h Heap, _prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    let mut bytes = Vec::with_capacity(args.len());
    for arg in args {
        bytes.push(try_char(heap, arg.value())?);
    }
    Ok(heap.alloc_string(bytes, false))
}

pub(super) fn string_length<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let id = try_string(heap, args[0].value())?;
    Ok(heap.root(Value::Int(heap.string_bytes(id).len() as i64)))
}

fn check_index(index: usize, len: usize) -> EvalResult<usize> {
    if index < len {
        Ok(index)
    } else {
        Err(Error::new(
            ErrorKind::OutOfRange,
            format!("index {index} out of range for length {len}"),
        ))
    }
}

pub(super) fn string_ref<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 2)?;
    let id = try_string(heap, args[0].value())?;
    let index = try_index(heap, args[1].value())?;
    let bytes = heap.string_bytes(id);
    let index = check_index(index, bytes.len())?;
    Ok(heap.root(Value::Char(bytes[index])))
}

pub(super) fn string_set<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 3)?;
    let id = try_string(heap, args[0].value())?;
    let index = try_index(heap, args[1].value())?;
    let c = try_char(heap, args[2].value())?;
    heap.string_mutate(id, |bytes| {
        check_index(index, bytes.len()).map(|index| bytes[index] = c)
    })??;
    Ok(heap.root(Value::EmptyList))
}

pub(super) fn compare<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 2)?;
    let mut a = heap.string_bytes(try_string(heap, args[0].value())?);
    let mut b = heap.string_bytes(try_string(heap, args[1].value())?);
    let case_insensitive = matches!(
        prim,
        Primitive::StringCiEq | Primitive::StringCiLt | Primitive::StringCiGt | Primitive::StringCiLe | Primitive::StringCiGe
    );
    if case_insensitive {
        a.make_ascii_lowercase();
        b.make_ascii_lowercase();
    }
    let result = match prim {
        Primitive::StringEq | Primitive::StringCiEq => a == b,
        Primitive::StringLt | Primitive::StringCiLt => a < b,
        Primitive::StringGt | Primitive::StringCiGt => a > b,
        Primitive::StringLe | Primitive::StringCiLe => a <= b,
        Primitive::StringGe | Primitive::StringCiGe => a >= b,
        _ => unreachable!(),
    };
    Ok(super::bool_value(heap, result))
}

pub(super) fn substring<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 3)?;
    let id = try_string(heap, args[0].value())?;
    let start = try_index(heap, args[1].value())?;
    let end = try_index(heap, args[2].value())?;
    let bytes = heap.string_bytes(id);
    if start > end || end > bytes.len() {
        return Err(Error::new(
            ErrorKind::OutOfRange,
            format!("substring range {start}..{end} out of range for length {}", bytes.len()),
        ));
    }
    Ok(heap.alloc_string(bytes[start..end].to_vec(), false))
}

pub(super) fn string_append<'h>(heap: &'h Heap, _prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    let mut bytes = Vec::new();
    for arg in args {
        let id = try_string(heap, arg.value())?;
        bytes.extend(heap.string_bytes(id));
    }
    Ok(heap.alloc_string(bytes, false))
}

pub(super) fn string_to_list<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let id = try_string(heap, args[0].value())?;
    let chars: Vec<Root<'h>> = heap
        .string_bytes(id)
        .into_iter()
        .map(|b| heap.root(Value::Char(b)))
        .collect();
    Ok(heap.list(&chars))
}

pub(super) fn list_to_string<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let items = super::list_to_vec(heap, args[0].value())?;
    let mut bytes = Vec::with_capacity(items.len());
    for item in items {
        bytes.push(try_char(heap, item)?);
    }
    Ok(heap.alloc_string(bytes, false))
}

pub(super) fn string_copy<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let id = try_string(heap, args[0].value())?;
    Ok(heap.alloc_string(heap.string_bytes(id), false))
}

pub(super) fn string_fill<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 2)?;
    let id = try_string(heap, args[0].value())?;
    let c = try_char(heap, args[1].value())?;
    heap.string_mutate(id, |bytes| bytes.fill(c))?;
    Ok(heap.root(Value::EmptyList))
}
