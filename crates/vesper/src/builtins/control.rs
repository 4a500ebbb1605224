//! Higher-order control: `apply`, `map`, `for-each`, `force`.

use smallvec::SmallVec;

use super::{expect_at_least, expect_exact, list_to_vec, Primitive};
use crate::{
    error::{Error, ErrorKind, EvalResult},
    eval::{apply_procedure, eval},
    heap::{Heap, Root},
    print::render,
    value::Value,
};

pub(super) fn is_procedure<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    Ok(super::bool_value(heap, args[0].value().is_procedure(heap)))
}

/// `(apply proc arg ... args)`: the final operand must be a list, spliced
/// after the leading arguments.
pub(super) fn apply<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_at_least(prim, args, 2)?;
    let operator = &args[0];
    let (last, leading) = args[1..].split_last().expect("at least one operand");
    let mut call_args: SmallVec<[Root<'h>; 8]> = leading.iter().cloned().collect();
    for item in list_to_vec(heap, last.value())? {
        call_args.push(heap.root(item));
    }
    apply_procedure(heap, operator, &call_args)
}

/// Snapshots the element lists, rooting every element: the procedure being
/// mapped may mutate the very lists it walks, and an unrooted element would
/// be fair game for the collector.
fn map_lists<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Vec<Vec<Root<'h>>>> {
    let mut lists = Vec::with_capacity(args.len() - 1);
    for arg in &args[1..] {
        let items: Vec<Root<'h>> = list_to_vec(heap, arg.value())?
            .into_iter()
            .map(|item| heap.root(item))
            .collect();
        lists.push(items);
    }
    let len = lists[0].len();
    if lists.iter().any(|list| list.len() != len) {
        return Err(Error::new(
            ErrorKind::WrongArity,
            format!("{prim}: lists must have equal length"),
        ));
    }
    Ok(lists)
}

pub(super) fn map<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_at_least(prim, args, 2)?;
    let lists = map_lists(heap, prim, args)?;
    let mut results: Vec<Root<'h>> = Vec::with_capacity(lists[0].len());
    for i in 0..lists[0].len() {
        let call_args: SmallVec<[Root<'h>; 8]> = lists.iter().map(|list| list[i].clone()).collect();
        results.push(apply_procedure(heap, &args[0], &call_args)?);
    }
    Ok(heap.list(&results))
}

pub(super) fn for_each<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_at_least(prim, args, 2)?;
    let lists = map_lists(heap, prim, args)?;
    for i in 0..lists[0].len() {
        let call_args: SmallVec<[Root<'h>; 8]> = lists.iter().map(|list| list[i].clone()).collect();
        apply_procedure(heap, &args[0], &call_args)?;
    }
    Ok(heap.root(Value::EmptyList))
}

/// Evaluates a promise's expression in its captured environment, memoizing
/// the result. Forcing again returns the memoized value without re-running.
pub(super) fn force<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let value = args[0].value();
    let Some(id) = value.promise_id(heap) else {
        return Err(Error::wrong_type("promise", render(heap, value)));
    };
    let (forced, expr, env) = heap.promise_parts(id);
    if let Some(memoized) = forced {
        return Ok(heap.root(memoized));
    }
    let expr = heap.root(expr);
    let env = heap.root(Value::Ref(env));
    let result = eval(heap, &env, &expr)?;
    heap.promise_fulfill(id, result.value());
    Ok(result)
}
