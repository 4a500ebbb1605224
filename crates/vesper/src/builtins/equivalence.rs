//! Equivalence predicates and the boolean operations.

use super::{expect_exact, Primitive};
use crate::{
    heap::{Heap, Root},
    error::EvalResult,
    value::{is_equal as value_equal, Value},
};

pub(super) fn is_eq<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 2)?;
    Ok(super::bool_value(heap, args[0].value().is_eq(args[1].value())))
}

pub(super) fn is_eqv<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 2)?;
    Ok(super::bool_value(heap, args[0].value().is_eqv(args[1].value())))
}

pub(super) fn is_equal<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 2)?;
    Ok(super::bool_value(heap, value_equal(heap, args[0].value(), args[1].value())))
}

pub(super) fn not<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    Ok(super::bool_value(heap, args[0].value().is_false()))
}

pub(super) fn is_boolean<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    Ok(super::bool_value(heap, matches!(args[0].value(), Value::Bool(_))))
}
