//! The primitive library: every built-in procedure and special form exposed
//! by the default environment.
//!
//! `Primitive` is a flat sum. The evaluator recognizes special forms by
//! matching this value after resolving the head symbol through the
//! environment — identity, never name — so a local binding shadows the
//! special behavior, exactly as a user would hope.

use std::{borrow::Cow, fmt};

use crate::{
    env,
    error::{Error, ErrorKind, EvalResult},
    heap::{Heap, HeapId, Root},
    number::Number,
    print::render,
    value::Value,
};

mod chars;
mod control;
mod equivalence;
mod lists;
mod numeric;
mod strings;
mod vectors;

macro_rules! primitives {
    (
        special { $($svar:ident => $sname:literal,)* }
        procedures { $($pvar:ident => $pname:literal,)* }
        stubs { $($uvar:ident => $uname:literal,)* }
    ) => {
        /// Identity of a built-in. Fieldless except for the generated
        /// `c[ad]{2,4}r` accessors, which pack their operation sequence.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Primitive {
            $($svar,)*
            $($pvar,)*
            $($uvar,)*
            Cxr(Cxr),
        }

        impl Primitive {
            /// The name this primitive is bound to in the default environment.
            #[must_use]
            pub fn name(self) -> Cow<'static, str> {
                match self {
                    $(Self::$svar => Cow::Borrowed($sname),)*
                    $(Self::$pvar => Cow::Borrowed($pname),)*
                    $(Self::$uvar => Cow::Borrowed($uname),)*
                    Self::Cxr(cxr) => Cow::Owned(cxr.name()),
                }
            }

            /// Special forms receive their operand datums unevaluated and
            /// are dispatched by the evaluator, not through application.
            #[must_use]
            pub fn is_special(self) -> bool {
                matches!(self, $(Self::$svar)|*)
            }

            /// Recognized names whose invocation raises "not implemented".
            #[must_use]
            pub fn is_stub(self) -> bool {
                matches!(self, $(Self::$uvar)|*)
            }

            fn named() -> impl Iterator<Item = Self> {
                [$(Self::$svar,)* $(Self::$pvar,)* $(Self::$uvar,)*].into_iter()
            }
        }
    };
}

primitives! {
    special {
        Quote => "quote",
        Lambda => "lambda",
        If => "if",
        Set => "set!",
        Define => "define",
        Begin => "begin",
        Cond => "cond",
        Case => "case",
        And => "and",
        Or => "or",
        Let => "let",
        LetStar => "let*",
        LetRec => "letrec",
        Delay => "delay",
        Else => "else",
        Arrow => "=>",
        Do => "do",
        Quasiquote => "quasiquote",
        Unquote => "unquote",
        UnquoteSplicing => "unquote-splicing",
        LetSyntax => "let-syntax",
        LetRecSyntax => "letrec-syntax",
        SyntaxRules => "syntax-rules",
        DefineSyntax => "define-syntax",
    }
    procedures {
        IsEq => "eq?",
        IsEqv => "eqv?",
        IsEqual => "equal?",
        Not => "not",
        IsBoolean => "boolean?",

        IsNumber => "number?",
        IsComplex => "complex?",
        IsReal => "real?",
        IsRational => "rational?",
        IsInteger => "integer?",
        IsExact => "exact?",
        IsInexact => "inexact?",
        NumEq => "=",
        NumLt => "<",
        NumGt => ">",
        NumLe => "<=",
        NumGe => ">=",
        IsZero => "zero?",
        IsPositive => "positive?",
        IsNegative => "negative?",
        IsOdd => "odd?",
        IsEven => "even?",
        Max => "max",
        Min => "min",
        Add => "+",
        Mul => "*",
        Sub => "-",
        Div => "/",
        Abs => "abs",
        Quotient => "quotient",
        Remainder => "remainder",
        Modulo => "modulo",
        Floor => "floor",
        Ceiling => "ceiling",
        Truncate => "truncate",
        Round => "round",
        Exp => "exp",
        Log => "log",
        Sin => "sin",
        Cos => "cos",
        Tan => "tan",
        Asin => "asin",
        Acos => "acos",
        Atan => "atan",
        Sqrt => "sqrt",
        Expt => "expt",
        ExactToInexact => "exact->inexact",
        InexactToExact => "inexact->exact",
        NumberToString => "number->string",
        StringToNumber => "string->number",

        IsPair => "pair?",
        Cons => "cons",
        Car => "car",
        Cdr => "cdr",
        SetCar => "set-car!",
        SetCdr => "set-cdr!",
        IsNull => "null?",
        IsList => "list?",
        List => "list",
        Length => "length",
        Append => "append",
        Reverse => "reverse",
        ListTail => "list-tail",
        ListRef => "list-ref",
        Memq => "memq",
        Memv => "memv",
        Member => "member",
        Assq => "assq",
        Assv => "assv",
        Assoc => "assoc",

        IsSymbol => "symbol?",
        SymbolToString => "symbol->string",
        StringToSymbol => "string->symbol",

        IsChar => "char?",
        CharEq => "char=?",
        CharLt => "char<?",
        CharGt => "char>?",
        CharLe => "char<=?",
        CharGe => "char>=?",
        CharCiEq => "char-ci=?",
        CharCiLt => "char-ci<?",
        CharCiGt => "char-ci>?",
        CharCiLe => "char-ci<=?",
        CharCiGe => "char-ci>=?",
        IsCharAlphabetic => "char-alphabetic?",
        IsCharNumeric => "char-numeric?",
        IsCharWhitespace => "char-whitespace?",
        IsCharUpperCase => "char-upper-case?",
        IsCharLowerCase => "char-lower-case?",
        CharToInteger => "char->integer",
        IntegerToChar => "integer->char",
        CharUpcase => "char-upcase",
        CharDowncase => "char-downcase",

        IsString => "string?",
        MakeString => "make-string",
        StringOf => "string",
        StringLength => "string-length",
        StringRef => "string-ref",
        StringSet => "string-set!",
        StringEq => "string=?",
        StringCiEq => "string-ci=?",
        StringLt => "string<?",
        StringGt => "string>?",
        StringLe => "string<=?",
        StringGe => "string>=?",
        StringCiLt => "string-ci<?",
        StringCiGt => "string-ci>?",
        StringCiLe => "string-ci<=?",
        StringCiGe => "string-ci>=?",
        Substring => "substring",
        StringAppend => "string-append",
        StringToList => "string->list",
        ListToString => "list->string",
        StringCopy => "string-copy",
        StringFill => "string-fill!",

        IsVector => "vector?",
        MakeVector => "make-vector",
        VectorOf => "vector",
        VectorLength => "vector-length",
        VectorRef => "vector-ref",
        VectorSet => "vector-set!",
        VectorToList => "vector->list",
        ListToVector => "list->vector",
        VectorFill => "vector-fill!",

        IsProcedure => "procedure?",
        Apply => "apply",
        Map => "map",
        ForEach => "for-each",
        Force => "force",
    }
    stubs {
        Gcd => "gcd",
        Lcm => "lcm",
        Numerator => "numerator",
        Denominator => "denominator",
        Rationalize => "rationalize",
        MakeRectangular => "make-rectangular",
        MakePolar => "make-polar",
        RealPart => "real-part",
        ImagPart => "imag-part",
        Magnitude => "magnitude",
        Angle => "angle",
        CallCc => "call-with-current-continuation",
        Values => "values",
        CallWithValues => "call-with-values",
        DynamicWind => "dynamic-wind",
        SchemeEval => "eval",
        SchemeReportEnvironment => "scheme-report-environment",
        NullEnvironment => "null-environment",
        InteractionEnvironment => "interaction-environment",
        CallWithInputFile => "call-with-input-file",
        CallWithOutputFile => "call-with-output-file",
        IsInputPort => "input-port?",
        IsOutputPort => "output-port?",
        CurrentInputPort => "current-input-port",
        CurrentOutputPort => "current-output-port",
        WithInputFromFile => "with-input-from-file",
        WithOutputToFile => "with-output-to-file",
        OpenInputFile => "open-input-file",
        OpenOutputFile => "open-output-file",
        CloseInputPort => "close-input-port",
        CloseOutputPort => "close-output-port",
        Read => "read",
        ReadChar => "read-char",
        PeekChar => "peek-char",
        IsEofObject => "eof-object?",
        IsCharReady => "char-ready?",
        Write => "write",
        Display => "display",
        Newline => "newline",
        WriteChar => "write-char",
        Load => "load",
        TranscriptOn => "transcript-on",
        TranscriptOff => "transcript-off",
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A `c[ad]{2,4}r` accessor: up to four car/cdr steps packed into a byte.
/// Bit `k` set means step `k` (counting from the left of the name) takes the
/// car; steps apply right to left, innermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cxr {
    len: u8,
    ops: u8,
}

impl Cxr {
    fn all() -> impl Iterator<Item = Self> {
        (2..=4u8).flat_map(|len| (0..1u8 << len).map(move |ops| Self { len, ops }))
    }

    #[must_use]
    pub fn name(self) -> String {
        let mut name = String::from("c");
        for k in 0..self.len {
            name.push(if self.ops & (1 << k) != 0 { 'a' } else { 'd' });
        }
        name.push('r');
        name
    }

    pub(crate) fn apply(self, heap: &Heap, mut value: Value) -> EvalResult<Value> {
        for k in (0..self.len).rev() {
            let (car, cdr) = value
                .as_pair(heap)
                .ok_or_else(|| Error::wrong_type("pair", render(heap, value)))?;
            value = if self.ops & (1 << k) != 0 { car } else { cdr };
        }
        Ok(value)
    }
}

/// Populates `env` with every primitive binding, `else` and `=>` included.
pub fn install(heap: &Heap, env: &Root<'_>) {
    for prim in Primitive::named() {
        bind(heap, env, prim);
    }
    for cxr in Cxr::all() {
        bind(heap, env, Primitive::Cxr(cxr));
    }
}

fn bind(heap: &Heap, env: &Root<'_>, prim: Primitive) {
    let symbol = heap.intern(&prim.name());
    let Value::Ref(sym_id) = symbol.value() else { unreachable!() };
    env::define(heap, env.value(), sym_id, Value::Primitive(prim));
}

/// Applies an ordinary primitive to already-evaluated, rooted arguments.
pub(crate) fn call<'h>(heap: &'h Heap, prim: Primitive, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    if prim.is_stub() {
        return Err(Error::not_implemented(&prim.name()));
    }
    if prim.is_special() {
        return Err(Error::wrong_type(
            "procedure",
            format!("the '{prim}' special form"),
        ));
    }
    match prim {
        Primitive::IsEq => equivalence::is_eq(heap, prim, args),
        Primitive::IsEqv => equivalence::is_eqv(heap, prim, args),
        Primitive::IsEqual => equivalence::is_equal(heap, prim, args),
        Primitive::Not => equivalence::not(heap, prim, args),
        Primitive::IsBoolean => equivalence::is_boolean(heap, prim, args),

        Primitive::IsNumber | Primitive::IsComplex | Primitive::IsReal | Primitive::IsRational => {
            numeric::is_number(heap, prim, args)
        }
        Primitive::IsInteger => numeric::is_integer(heap, prim, args),
        Primitive::IsExact => numeric::is_exact(heap, prim, args),
        Primitive::IsInexact => numeric::is_inexact(heap, prim, args),
        Primitive::NumEq | Primitive::NumLt | Primitive::NumGt | Primitive::NumLe | Primitive::NumGe => {
            numeric::compare(heap, prim, args)
        }
        Primitive::IsZero | Primitive::IsPositive | Primitive::IsNegative => numeric::sign_test(heap, prim, args),
        Primitive::IsOdd | Primitive::IsEven => numeric::parity_test(heap, prim, args),
        Primitive::Max | Primitive::Min => numeric::extremum(heap, prim, args),
        Primitive::Add => numeric::add(heap, prim, args),
        Primitive::Mul => numeric::mul(heap, prim, args),
        Primitive::Sub => numeric::sub(heap, prim, args),
        Primitive::Div => numeric::div(heap, prim, args),
        Primitive::Abs => numeric::abs(heap, prim, args),
        Primitive::Quotient => numeric::quotient(heap, prim, args),
        Primitive::Remainder => numeric::remainder(heap, prim, args),
        Primitive::Modulo => numeric::modulo(heap, prim, args),
        Primitive::Floor | Primitive::Ceiling | Primitive::Truncate | Primitive::Round => {
            numeric::round_to_integer(heap, prim, args)
        }
        Primitive::Exp
        | Primitive::Log
        | Primitive::Sin
        | Primitive::Cos
        | Primitive::Tan
        | Primitive::Asin
        | Primitive::Acos
        | Primitive::Sqrt => numeric::transcendental(heap, prim, args),
        Primitive::Atan => numeric::atan(heap, prim, args),
        Primitive::Expt => numeric::expt(heap, prim, args),
        Primitive::ExactToInexact => numeric::exact_to_inexact(heap, prim, args),
        Primitive::InexactToExact => numeric::inexact_to_exact(heap, prim, args),
        Primitive::NumberToString => numeric::number_to_string(heap, prim, args),
        Primitive::StringToNumber => numeric::string_to_number(heap, prim, args),

        Primitive::IsPair => lists::is_pair(heap, prim, args),
        Primitive::Cons => lists::cons(heap, prim, args),
        Primitive::Car => lists::car(heap, prim, args),
        Primitive::Cdr => lists::cdr(heap, prim, args),
        Primitive::SetCar => lists::set_car(heap, prim, args),
        Primitive::SetCdr => lists::set_cdr(heap, prim, args),
        Primitive::IsNull => lists::is_null(heap, prim, args),
        Primitive::IsList => lists::is_list(heap, prim, args),
        Primitive::List => lists::list(heap, prim, args),
        Primitive::Length => lists::length(heap, prim, args),
        Primitive::Append => lists::append(heap, prim, args),
        Primitive::Reverse => lists::reverse(heap, prim, args),
        Primitive::ListTail => lists::list_tail(heap, prim, args),
        Primitive::ListRef => lists::list_ref(heap, prim, args),
        Primitive::Memq | Primitive::Memv | Primitive::Member => lists::member(heap, prim, args),
        Primitive::Assq | Primitive::Assv | Primitive::Assoc => lists::assoc(heap, prim, args),
        Primitive::Cxr(cxr) => lists::cxr(heap, cxr, args),

        Primitive::IsSymbol => strings::is_symbol(heap, prim, args),
        Primitive::SymbolToString => strings::symbol_to_string(heap, prim, args),
        Primitive::StringToSymbol => strings::string_to_symbol(heap, prim, args),

        Primitive::IsChar => chars::is_char(heap, prim, args),
        Primitive::CharEq
        | Primitive::CharLt
        | Primitive::CharGt
        | Primitive::CharLe
        | Primitive::CharGe
        | Primitive::CharCiEq
        | Primitive::CharCiLt
        | Primitive::CharCiGt
        | Primitive::CharCiLe
        | Primitive::CharCiGe => chars::compare(heap, prim, args),
        Primitive::IsCharAlphabetic
        | Primitive::IsCharNumeric
        | Primitive::IsCharWhitespace
        | Primitive::IsCharUpperCase
        | Primitive::IsCharLowerCase => chars::classify(heap, prim, args),
        Primitive::CharToInteger => chars::char_to_integer(heap, prim, args),
        Primitive::IntegerToChar => chars::integer_to_char(heap, prim, args),
        Primitive::CharUpcase | Primitive::CharDowncase => chars::convert_case(heap, prim, args),

        Primitive::IsString => strings::is_string(heap, prim, args),
        Primitive::MakeString => strings::make_string(heap, prim, args),
        Primitive::StringOf => strings::string_of(heap, prim, args),
        Primitive::StringLength => strings::string_length(heap, prim, args),
        Primitive::StringRef => strings::string_ref(heap, prim, args),
        Primitive::StringSet => strings::string_set(heap, prim, args),
        Primitive::StringEq
        | Primitive::StringCiEq
        | Primitive::StringLt
        | Primitive::StringGt
        | Primitive::StringLe
        | Primitive::StringGe
        | Primitive::StringCiLt
        | Primitive::StringCiGt
        | Primitive::StringCiLe
        | Primitive::StringCiGe => strings::compare(heap, prim, args),
        Primitive::Substring => strings::substring(heap, prim, args),
        Primitive::StringAppend => strings::string_append(heap, prim, args),
        Primitive::StringToList => strings::string_to_list(heap, prim, args),
        Primitive::ListToString => strings::list_to_string(heap, prim, args),
        Primitive::StringCopy => strings::string_copy(heap, prim, args),
        Primitive::StringFill => strings::string_fill(heap, prim, args),

        Primitive::IsVector => vectors::is_vector(heap, prim, args),
        Primitive::MakeVector => vectors::make_vector(heap, prim, args),
        Primitive::VectorOf => vectors::vector_of(heap, prim, args),
        Primitive::VectorLength => vectors::vector_length(heap, prim, args),
        Primitive::VectorRef => vectors::vector_ref(heap, prim, args),
        Primitive::VectorSet => vectors::vector_set(heap, prim, args),
        Primitive::VectorToList => vectors::vector_to_list(heap, prim, args),
        Primitive::ListToVector => vectors::list_to_vector(heap, prim, args),
        Primitive::VectorFill => vectors::vector_fill(heap, prim, args),

        Primitive::IsProcedure => control::is_procedure(heap, prim, args),
        Primitive::Apply => control::apply(heap, prim, args),
        Primitive::Map => control::map(heap, prim, args),
        Primitive::ForEach => control::for_each(heap, prim, args),
        Primitive::Force => control::force(heap, prim, args),

        _ => unreachable!("special forms and stubs are filtered above"),
    }
}

// ----------------------------------------------------------------------
// Shared argument plumbing.
// ----------------------------------------------------------------------

pub(crate) fn expect_exact(prim: Primitive, args: &[Root<'_>], n: usize) -> EvalResult<()> {
    if args.len() == n {
        Ok(())
    } else {
        Err(Error::new(
            ErrorKind::WrongArity,
            format!("{prim}: expected {n} args, got {}", args.len()),
        ))
    }
}

pub(crate) fn expect_at_least(prim: Primitive, args: &[Root<'_>], n: usize) -> EvalResult<()> {
    if args.len() >= n {
        Ok(())
    } else {
        Err(Error::new(
            ErrorKind::WrongArity,
            format!("{prim}: expected at least {n} args, got {}", args.len()),
        ))
    }
}

pub(crate) fn expect_between(prim: Primitive, args: &[Root<'_>], lo: usize, hi: usize) -> EvalResult<()> {
    if (lo..=hi).contains(&args.len()) {
        Ok(())
    } else {
        Err(Error::new(
            ErrorKind::WrongArity,
            format!("{prim}: expected {lo} to {hi} args, got {}", args.len()),
        ))
    }
}

pub(crate) fn try_number(heap: &Heap, value: Value) -> EvalResult<Number> {
    Number::from_value(value).ok_or_else(|| Error::wrong_type("number", render(heap, value)))
}

pub(crate) fn try_int(heap: &Heap, value: Value) -> EvalResult<i64> {
    match value {
        Value::Int(i) => Ok(i),
        _ => Err(Error::wrong_type("integer", render(heap, value))),
    }
}

/// A non-negative integer used as an index or size.
pub(crate) fn try_index(heap: &Heap, value: Value) -> EvalResult<usize> {
    let i = try_int(heap, value)?;
    usize::try_from(i).map_err(|_| Error::new(ErrorKind::OutOfRange, format!("negative index {i}")))
}

pub(crate) fn try_char(heap: &Heap, value: Value) -> EvalResult<u8> {
    match value {
        Value::Char(c) => Ok(c),
        _ => Err(Error::wrong_type("character", render(heap, value))),
    }
}

pub(crate) fn try_string(heap: &Heap, value: Value) -> EvalResult<HeapId> {
    value
        .string_id(heap)
        .ok_or_else(|| Error::wrong_type("string", render(heap, value)))
}

pub(crate) fn try_symbol(heap: &Heap, value: Value) -> EvalResult<HeapId> {
    value
        .as_symbol(heap)
        .ok_or_else(|| Error::wrong_type("symbol", render(heap, value)))
}

pub(crate) fn try_vector(heap: &Heap, value: Value) -> EvalResult<HeapId> {
    value
        .vector_id(heap)
        .ok_or_else(|| Error::wrong_type("vector", render(heap, value)))
}

pub(crate) fn try_pair(heap: &Heap, value: Value) -> EvalResult<(Value, Value)> {
    value
        .as_pair(heap)
        .ok_or_else(|| Error::wrong_type("pair", render(heap, value)))
}

/// Flattens a proper list into a vector of element values. The result is only
/// safe to hold while the list itself stays rooted.
pub(crate) fn list_to_vec(heap: &Heap, list: Value) -> EvalResult<Vec<Value>> {
    let mut items = Vec::new();
    let mut cur = list;
    loop {
        match cur {
            Value::EmptyList => return Ok(items),
            _ => match cur.as_pair(heap) {
                Some((car, cdr)) => {
                    items.push(car);
                    cur = cdr;
                }
                None => return Err(Error::wrong_type("proper list", render(heap, cur))),
            },
        }
    }
}

pub(crate) fn bool_value(heap: &Heap, b: bool) -> Root<'_> {
    heap.root(Value::Bool(b))
}
