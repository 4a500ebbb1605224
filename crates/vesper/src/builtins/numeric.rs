//! Arithmetic and numeric conversions.
//!
//! Exactness propagates through every operation: a result is exact only when
//! every operand was. `min`/`max` coerce an exact winner to float when any
//! operand was inexact.

use super::{expect_at_least, expect_between, expect_exact, try_int, try_number, try_string, Primitive};
use crate::{
    error::{Error, ErrorKind, EvalResult},
    heap::{Heap, Root},
    number::{format_number, parse_number, Number},
    print::render,
    value::Value,
};

fn number_result(heap: &Heap, n: Number) -> Root<'_> {
    heap.root(n.value())
}

pub(super) fn is_number<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    Ok(super::bool_value(heap, args[0].value().is_number()))
}

pub(super) fn is_integer<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let result = match args[0].value() {
        Value::Int(_) => true,
        Value::Float(x) => x.fract() == 0.0,
        _ => false,
    };
    Ok(super::bool_value(heap, result))
}

pub(super) fn is_exact<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let n = try_number(heap, args[0].value())?;
    Ok(super::bool_value(heap, n.is_exact()))
}

pub(super) fn is_inexact<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let n = try_number(heap, args[0].value())?;
    Ok(super::bool_value(heap, !n.is_exact()))
}

/// Variadic chained comparison: `(< a b c)` holds when every adjacent pair
/// does.
pub(super) fn compare<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_at_least(prim, args, 2)?;
    let holds = |a: Number, b: Number| match prim {
        Primitive::NumEq => a.num_eq(b),
        Primitive::NumLt => a.lt(b),
        Primitive::NumGt => b.lt(a),
        Primitive::NumLe => a.le(b),
        Primitive::NumGe => b.le(a),
        _ => unreachable!(),
    };
    let mut prev = try_number(heap, args[0].value())?;
    for arg in &args[1..] {
        let cur = try_number(heap, arg.value())?;
        if !holds(prev, cur) {
            return Ok(super::bool_value(heap, false));
        }
        prev = cur;
    }
    Ok(super::bool_value(heap, true))
}

pub(super) fn sign_test<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let n = try_number(heap, args[0].value())?;
    let zero = Number::Int(0);
    let result = match prim {
        Primitive::IsZero => n.num_eq(zero),
        Primitive::IsPositive => zero.lt(n),
        Primitive::IsNegative => n.lt(zero),
        _ => unreachable!(),
    };
    Ok(super::bool_value(heap, result))
}

/// An integer, exact or integral-inexact, for parity tests.
fn as_integer(heap: &Heap, value: Value) -> EvalResult<i64> {
    match value {
        Value::Int(i) => Ok(i),
        Value::Float(x) if x.fract() == 0.0 && (i64::MIN as f64..=i64::MAX as f64).contains(&x) => Ok(x as i64),
        _ => Err(Error::wrong_type("integer", render(heap, value))),
    }
}

pub(super) fn parity_test<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let i = as_integer(heap, args[0].value())?;
    let odd = i % 2 != 0;
    let result = match prim {
        Primitive::IsOdd => odd,
        Primitive::IsEven => !odd,
        _ => unreachable!(),
    };
    Ok(super::bool_value(heap, result))
}

/// `min`/`max`. The winner is coerced to float when any operand was inexact,
/// even if the winner itself was exact.
pub(super) fn extremum<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_at_least(prim, args, 1)?;
    let mut winner = try_number(heap, args[0].value())?;
    let mut saw_inexact = !winner.is_exact();
    for arg in &args[1..] {
        let n = try_number(heap, arg.value())?;
        saw_inexact |= !n.is_exact();
        let replace = match prim {
            Primitive::Max => winner.lt(n),
            Primitive::Min => n.lt(winner),
            _ => unreachable!(),
        };
        if replace {
            winner = n;
        }
    }
    if saw_inexact {
        winner = winner.to_inexact();
    }
    Ok(number_result(heap, winner))
}

pub(super) fn add<'h>(heap: &'h Heap, _prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    let mut acc = Number::Int(0);
    for arg in args {
        acc = acc.add(try_number(heap, arg.value())?);
    }
    Ok(number_result(heap, acc))
}

pub(super) fn mul<'h>(heap: &'h Heap, _prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    let mut acc = Number::Int(1);
    for arg in args {
        acc = acc.mul(try_number(heap, arg.value())?);
    }
    Ok(number_result(heap, acc))
}

pub(super) fn sub<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_at_least(prim, args, 1)?;
    let first = try_number(heap, args[0].value())?;
    if args.len() == 1 {
        return Ok(number_result(heap, first.neg()));
    }
    let mut acc = first;
    for arg in &args[1..] {
        acc = acc.sub(try_number(heap, arg.value())?);
    }
    Ok(number_result(heap, acc))
}

pub(super) fn div<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_at_least(prim, args, 1)?;
    let first = try_number(heap, args[0].value())?;
    if args.len() == 1 {
        return Ok(number_result(heap, Number::Int(1).div(first)?));
    }
    let mut acc = first;
    for arg in &args[1..] {
        acc = acc.div(try_number(heap, arg.value())?)?;
    }
    Ok(number_result(heap, acc))
}

pub(super) fn abs<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let n = match try_number(heap, args[0].value())? {
        Number::Int(i) => Number::Int(i.wrapping_abs()),
        Number::Float(x) => Number::Float(x.abs()),
    };
    Ok(number_result(heap, n))
}

fn integer_division<'h>(
    heap: &'h Heap,
    prim: Primitive,
    args: &[Root<'h>],
    op: impl Fn(i64, i64) -> i64,
) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 2)?;
    let a = try_int(heap, args[0].value())?;
    let b = try_int(heap, args[1].value())?;
    if b == 0 {
        return Err(Error::new(ErrorKind::Domain, "division by zero"));
    }
    Ok(heap.root(Value::Int(op(a, b))))
}

/// Truncated quotient.
pub(super) fn quotient<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    integer_division(heap, prim, args, |a, b| a.wrapping_div(b))
}

/// Sign follows the dividend.
pub(super) fn remainder<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    integer_division(heap, prim, args, |a, b| a.wrapping_rem(b))
}

/// Sign follows the divisor.
pub(super) fn modulo<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    integer_division(heap, prim, args, |a, b| {
        let r = a.wrapping_rem(b);
        if r != 0 && (r < 0) != (b < 0) { r + b } else { r }
    })
}

pub(super) fn round_to_integer<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let n = match try_number(heap, args[0].value())? {
        n @ Number::Int(_) => n,
        Number::Float(x) => Number::Float(match prim {
            Primitive::Floor => x.floor(),
            Primitive::Ceiling => x.ceil(),
            Primitive::Truncate => x.trunc(),
            // Round half to even, as the report requires.
            Primitive::Round => x.round_ties_even(),
            _ => unreachable!(),
        }),
    };
    Ok(number_result(heap, n))
}

/// Single-argument transcendental functions, all through f64.
pub(super) fn transcendental<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let x = try_number(heap, args[0].value())?.as_f64();
    let result = match prim {
        Primitive::Exp => x.exp(),
        Primitive::Log => x.ln(),
        Primitive::Sin => x.sin(),
        Primitive::Cos => x.cos(),
        Primitive::Tan => x.tan(),
        Primitive::Asin => x.asin(),
        Primitive::Acos => x.acos(),
        Primitive::Sqrt => x.sqrt(),
        _ => unreachable!(),
    };
    Ok(heap.root(Value::Float(result)))
}

/// `(atan y)` or `(atan y x)`.
pub(super) fn atan<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_between(prim, args, 1, 2)?;
    let y = try_number(heap, args[0].value())?.as_f64();
    let result = match args.get(1) {
        Some(x) => y.atan2(try_number(heap, x.value())?.as_f64()),
        None => y.atan(),
    };
    Ok(heap.root(Value::Float(result)))
}

pub(super) fn expt<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 2)?;
    let base = try_number(heap, args[0].value())?;
    let exponent = try_number(heap, args[1].value())?;
    // Exact base to a non-negative exact power stays exact.
    if let (Number::Int(b), Number::Int(e)) = (base, exponent)
        && (0..=u32::MAX as i64).contains(&e)
    {
        let mut acc = 1i64;
        let mut b = b;
        let mut e = e as u32;
        while e > 0 {
            if e & 1 == 1 {
                acc = acc.wrapping_mul(b);
            }
            b = b.wrapping_mul(b);
            e >>= 1;
        }
        return Ok(heap.root(Value::Int(acc)));
    }
    Ok(heap.root(Value::Float(base.as_f64().powf(exponent.as_f64()))))
}

pub(super) fn exact_to_inexact<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let n = try_number(heap, args[0].value())?;
    Ok(number_result(heap, n.to_inexact()))
}

pub(super) fn inexact_to_exact<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    match try_number(heap, args[0].value())? {
        n @ Number::Int(_) => Ok(number_result(heap, n)),
        Number::Float(x) if x.fract() == 0.0 && (i64::MIN as f64..=i64::MAX as f64).contains(&x) => {
            Ok(heap.root(Value::Int(x as i64)))
        }
        Number::Float(x) => Err(Error::new(
            ErrorKind::Domain,
            format!("{x} has no exact representation"),
        )),
    }
}

pub(super) fn number_to_string<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_between(prim, args, 1, 2)?;
    let n = try_number(heap, args[0].value())?;
    let radix = match args.get(1) {
        Some(r) => u32::try_from(try_int(heap, r.value())?)
            .map_err(|_| Error::new(ErrorKind::Domain, "radix must be one of 2 8 10 16"))?,
        None => 10,
    };
    let text = format_number(n, radix)?;
    Ok(heap.alloc_string(text.into_bytes(), false))
}

pub(super) fn string_to_number<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_between(prim, args, 1, 2)?;
    let id = try_string(heap, args[0].value())?;
    let radix = match args.get(1) {
        Some(r) => u32::try_from(try_int(heap, r.value())?)
            .map_err(|_| Error::new(ErrorKind::Domain, "radix must be one of 2 8 10 16"))?,
        None => 10,
    };
    let bytes = heap.string_bytes(id);
    let text: String = bytes.iter().map(|&b| b as char).collect();
    match parse_number(&text, radix) {
        Some(n) => Ok(number_result(heap, n)),
        None => Ok(super::bool_value(heap, false)),
    }
}
