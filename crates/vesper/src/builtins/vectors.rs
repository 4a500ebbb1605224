//! Vector operations.

use super::{expect_between, expect_exact, list_to_vec, try_index, try_vector, Primitive};
use crate::{
    error::{Error, ErrorKind, EvalResult},
    heap::{Heap, Root},
    value::Value,
};

pub(super) fn is_vector<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    Ok(super::bool_value(heap, args[0].value().vector_id(heap).is_some()))
}

pub(super) fn make_vector<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_between(prim, args, 1, 2)?;
    let len = try_index(heap, args[0].value())?;
    let fill = match args.get(1) {
        Some(fill) => fill.clone(),
        None => heap.root(Value::EmptyList),
    };
    Ok(heap.alloc_vector_filled(len, &fill))
}

pub(super) fn vector_of<'h>(heap: &'h Heap, _prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    Ok(heap.alloc_vector(args, false))
}

pub(super) fn vector_length<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let id = try_vector(heap, args[0].value())?;
    Ok(heap.root(Value::Int(heap.vector_len(id) as i64)))
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

pub(super) fn vector_ref<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 2)?;
    let id = try_vector(heap, args[0].value())?;
    let index = try_index(heap, args[1].value())?;
    let items = heap.vector_items(id);
    let index = check_index(index, items.len())?;
    Ok(heap.root(items[index]))
}

pub(super) fn vector_set<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 3)?;
    let id = try_vector(heap, args[0].value())?;
    let index = try_index(heap, args[1].value())?;
    let value = args[2].value();
    heap.vector_mutate(id, |items| {
        check_index(index, items.len()).map(|index| items[index] = value)
    })??;
    Ok(heap.root(Value::EmptyList))
}

pub(super) fn vector_to_list<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let id = try_vector(heap, args[0].value())?;
    let items: Vec<Root<'h>> = heap.vector_items(id).into_iter().map(|v| heap.root(v)).collect();
    Ok(heap.list(&items))
}

pub(super) fn list_to_vector<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let items: Vec<Root<'h>> = list_to_vec(heap, args[0].value())?
        .into_iter()
        .map(|v| heap.root(v))
        .collect();
    Ok(heap.alloc_vector(&items, false))
}

pub(super) fn vector_fill<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 2)?;
    let id = try_vector(heap, args[0].value())?;
    let value = args[1].value();
    heap.vector_mutate(id, |items| items.fill(value))?;
    Ok(heap.root(Value::EmptyList))
}
