//! Character operations. Characters are single bytes; classification and
//! case rules are ASCII.

use super::{expect_exact, try_char, try_int, Primitive};
use crate::{
    error::{Error, ErrorKind, EvalResult},
    heap::{Heap, Root},
    value::Value,
};

pub(super) fn is_char<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    Ok(super::bool_value(heap, matches!(args[0].value(), Value::Char(_))))
}

pub(super) fn compare<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 2)?;
    let mut a = try_char(heap, args[0].value())?;
    let mut b = try_char(heap, args[1].value())?;
    if matches!(
        prim,
        Primitive::CharCiEq | Primitive::CharCiLt | Primitive::CharCiGt | Primitive::CharCiLe | Primitive::CharCiGe
    ) {
        a = a.to_ascii_lowercase();
        b = b.to_ascii_lowercase();
    }
    let result = match prim {
        Primitive::CharEq | Primitive::CharCiEq => a == b,
        Primitive::CharLt | Primitive::CharCiLt => a < b,
        Primitive::CharGt | Primitive::CharCiGt => a > b,
        Primitive::CharLe | Primitive::CharCiLe => a <= b,
        Primitive::CharGe | Primitive::CharCiGe => a >= b,
        _ => unreachable!(),
    };
    Ok(super::bool_value(heap, result))
}

pub(super) fn classify<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let c = try_char(heap, args[0].value())?;
    let result = match prim {
        Primitive::IsCharAlphabetic => c.is_ascii_alphabetic(),
        Primitive::IsCharNumeric => c.is_ascii_digit(),
        Primitive::IsCharWhitespace => c.is_ascii_whitespace(),
        Primitive::IsCharUpperCase => c.is_ascii_uppercase(),
        Primitive::IsCharLowerCase => c.is_ascii_lowercase(),
        _ => unreachable!(),
    };
    Ok(super::bool_value(heap, result))
}

pub(super) fn char_to_integer<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let c = try_char(heap, args[0].value())?;
    Ok(heap.root(Value::Int(i64::from(c))))
}

pub(super) fn integer_to_char<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let i = try_int(heap, args[0].value())?;
    let c = u8::try_from(i)
        .map_err(|_| Error::new(ErrorKind::OutOfRange, format!("{i} is not a character code")))?;
    Ok(heap.root(Value::Char(c)))
}

pub(super) fn convert_case<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    expect_exact(prim, args, 1)?;
    let c = try_char(heap, args[0].value())?;
    let converted = match prim {
        Primitive::CharUpcase => c.to_ascii_uppercase(),
        Primitive::CharDowncase => c.to_ascii_lowercase(),
        _ => unreachable!(),
    };
    Ok(heap.root(Value::Char(converted)))
}
