//! Pair and list operations.

use ahash::AHashSet;

use super::{expect_at_least, expect_exact, list_to_vec, try_index, try_pair, Cxr, Primitive};
use crate::{
    error::{Error, EvalResult},
    heap::{Heap, Root},
    print::render,
    value::{is_equal, Value},
};

pub(super) fn is_pair<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    Ok(super::bool_value(heap, args[0].value().pair_id(heap).is_some()))
}

pub(super) fn cons<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 2)?;
    Ok(heap.cons(&args[0], &args[1]))
}

pub(super) fn car<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let (car, _) = try_pair(heap, args[0].value())?;
    Ok(heap.root(car))
}

pub(super) fn cdr<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let (_, cdr) = try_pair(heap, args[0].value())?;
    Ok(heap.root(cdr))
}

pub(super) fn cxr<'h>(heap: &'h Heap, cxr: Cxr, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(Primitive::Cxr(cxr), args, 1)?;
    Ok(heap.root(cxr.apply(heap, args[0].value())?))
}

pub(super) fn set_car<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 2)?;
    let id = args[0]
        .value()
        .pair_id(heap)
        .ok_or_else(|| Error::wrong_type("pair", render(heap, args[0].value())))?;
    heap.set_car(id, args[1].value())?;
    Ok(heap.root(Value::EmptyList))
}

pub(super) fn set_cdr<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 2)?;
    let id = args[0]
        .value()
        .pair_id(heap)
        .ok_or_else(|| Error::wrong_type("pair", render(heap, args[0].value())))?;
    heap.set_cdr(id, args[1].value())?;
    Ok(heap.root(Value::EmptyList))
}

pub(super) fn is_null<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    Ok(super::bool_value(heap, args[0].value() == Value::EmptyList))
}

/// Proper-list test. Walks with a seen-set so cyclic chains answer `#f`
/// instead of hanging.
pub(super) fn is_list<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let mut seen = AHashSet::new();
    let mut cur = args[0].value();
    loop {
        match cur {
            Value::EmptyList => return Ok(super::bool_value(heap, true)),
            _ => match cur.pair_id(heap) {
                Some(id) => {
                    if !seen.insert(id) {
                        return Ok(super::bool_value(heap, false));
                    }
                    let (_, cdr) = try_pair(heap, cur)?;
                    cur = cdr;
                }
                None => return Ok(super::bool_value(heap, false)),
            },
        }
    }
}

pub(super) fn list<'h>(heap: &'h Heap, _prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    Ok(heap.list(args))
}

pub(super) fn length<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let items = list_to_vec(heap, args[0].value())?;
    Ok(heap.root(Value::Int(items.len() as i64)))
}

/// Concatenation. Every argument but the last is copied; the last is shared
/// as the tail of the result, so `(append xs ys)` keeps `ys` intact.
pub(super) fn append<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_at_least(prim, args, 1)?;
    let (last, init) = args.split_last().expect("at least one arg");
    let mut copied = Vec::new();
    for arg in init {
        copied.extend(list_to_vec(heap, arg.value())?);
    }
    let mut result = last.clone();
    for &item in copied.iter().rev() {
        let item = heap.root(item);
        result = heap.cons(&item, &result);
    }
    Ok(result)
}

pub(super) fn reverse<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let items = list_to_vec(heap, args[0].value())?;
    let mut result = heap.root(Value::EmptyList);
    for &item in &items {
        let item = heap.root(item);
        result = heap.cons(&item, &result);
    }
    Ok(result)
}

fn tail_after<'h>(heap: &'h Heap, list: Value, k: usize) -> EvalResult<Value> {
    let mut cur = list;
    for _ in 0..k {
        let (_, cdr) = try_pair(heap, cur)?;
        cur = cdr;
    }
    Ok(cur)
}

pub(super) fn list_tail<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 2)?;
    let k = try_index(heap, args[1].value())?;
    Ok(heap.root(tail_after(heap, args[0].value(), k)?))
}

pub(super) fn list_ref<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 2)?;
    let k = try_index(heap, args[1].value())?;
    let tail = tail_after(heap, args[0].value(), k)?;
    let (car, _) = try_pair(heap, tail)?;
    Ok(heap.root(car))
}

fn matches(heap: &Heap, prim: Primitive, a: Value, b: Value) -> bool {
    match prim {
        Primitive::Memq | Primitive::Assq => a.is_eq(b),
        Primitive::Memv | Primitive::Assv => a.is_eqv(b),
        Primitive::Member | Primitive::Assoc => is_equal(heap, a, b),
        _ => unreachable!(),
    }
}

/// `memq`/`memv`/`member`: first sublist whose car matches, or `#f`.
pub(super) fn member<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 2)?;
    let needle = args[0].value();
    let mut cur = args[1].value();
    loop {
        match cur {
            Value::EmptyList => return Ok(super::bool_value(heap, false)),
            _ => {
                let (car, cdr) = try_pair(heap, cur)?;
                if matches(heap, prim, needle, car) {
                    return Ok(heap.root(cur));
                }
                cur = cdr;
            }
        }
    }
}

/// `assq`/`assv`/`assoc`: first entry pair whose car matches, or `#f`.
pub(super) fn assoc<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 2)?;
    let needle = args[0].value();
    let mut cur = args[1].value();
    loop {
        match cur {
            Value::EmptyList => return Ok(super::bool_value(heap, false)),
            _ => {
                let (entry, cdr) = try_pair(heap, cur)?;
                let (key, _) = try_pair(heap, entry)?;
                if matches(heap, prim, needle, key) {
                    return Ok(heap.root(entry));
                }
                cur = cdr;
            }
        }
    }
}
