//! The tree-walking evaluator.
//!
//! `eval` dispatches on the value shape: symbols resolve through the
//! environment, pairs are forms, everything else evaluates to itself. A form
//! whose head resolves to a special-form primitive hands its operand datums
//! over unevaluated; any other head is a procedure application with strict
//! left-to-right argument evaluation.
//!
//! Every intermediate result is held in a lock handle before the next
//! allocation can happen — the collector only honors roots.

use smallvec::SmallVec;

use crate::{
    builtins::{self, Primitive},
    env,
    error::{Error, EvalResult},
    heap::{Heap, HeapId, Root},
    print::render,
    value::{HeapData, Value},
};

/// Evaluates `expr` in `env`, producing a rooted result.
pub fn eval<'h>(heap: &'h Heap, env: &Root<'h>, expr: &Root<'h>) -> EvalResult<Root<'h>> {
    let Value::Ref(id) = expr.value() else {
        return Ok(expr.clone());
    };
    enum Shape {
        Symbol(HeapId),
        Form(Value, Value),
        SelfEval,
    }
    let shape = heap.with_data(id, |data| match data {
        HeapData::Symbol(_) => Shape::Symbol(id),
        HeapData::Pair(p) => Shape::Form(p.car, p.cdr),
        _ => Shape::SelfEval,
    });
    match shape {
        Shape::Symbol(sym) => env::lookup(heap, env.value(), sym).map(|v| heap.root(v)),
        Shape::Form(head, tail) => eval_form(heap, env, head, tail),
        Shape::SelfEval => Ok(expr.clone()),
    }
}

/// `head` and `tail` stay reachable through the caller's rooted form.
fn eval_form<'h>(heap: &'h Heap, env: &Root<'h>, head: Value, tail: Value) -> EvalResult<Root<'h>> {
    let head_datum = heap.root(head);
    let operator = eval(heap, env, &head_datum)?;

    if let Value::Primitive(prim) = operator.value()
        && prim.is_special()
    {
        return eval_special(heap, env, prim, tail);
    }

    let mut args: SmallVec<[Root<'h>; 8]> = SmallVec::new();
    let mut cur = tail;
    loop {
        match cur {
            Value::EmptyList => break,
            _ => match cur.as_pair(heap) {
                Some((car, cdr)) => {
                    let datum = heap.root(car);
                    args.push(eval(heap, env, &datum)?);
                    cur = cdr;
                }
                None => {
                    return Err(Error::bad_form("application", "argument list must be a proper list"));
                }
            },
        }
    }
    apply_procedure(heap, &operator, &args)
}

/// Applies a procedure value to already-evaluated, rooted arguments. This is
/// the single application path shared by the evaluator, `apply`, `map`,
/// `for-each`, and `cond`'s `=>` clauses.
pub fn apply_procedure<'h>(heap: &'h Heap, operator: &Root<'h>, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    match operator.value() {
        Value::Primitive(prim) => builtins::call(heap, prim, args),
        value => match value.lambda_id(heap) {
            Some(id) => apply_lambda(heap, id, args),
            None => Err(Error::wrong_type("procedure", render(heap, value))),
        },
    }
}

fn apply_lambda<'h>(heap: &'h Heap, id: HeapId, args: &[Root<'h>]) -> EvalResult<Root<'h>> {
    let (params, rest, body, captured) = heap.lambda_parts(id);

    if args.len() < params.len() {
        return Err(Error::new(
            crate::error::ErrorKind::WrongArity,
            format!(
                "expected {}{} args, got {}",
                if rest.is_some() { "at least " } else { "" },
                params.len(),
                args.len()
            ),
        ));
    }
    if rest.is_none() && args.len() > params.len() {
        return Err(Error::new(
            crate::error::ErrorKind::WrongArity,
            format!("expected {} args, got {}", params.len(), args.len()),
        ));
    }

    let captured = heap.root(Value::Ref(captured));
    let scope = env::new_scope(heap, &captured);
    for (&param, arg) in params.iter().zip(args) {
        env::define(heap, scope.value(), param, arg.value());
    }
    if let Some(rest_param) = rest {
        let rest_list = heap.list(&args[params.len()..]);
        env::define(heap, scope.value(), rest_param, rest_list.value());
    }

    eval_body(heap, &scope, &body)
}

/// Evaluates body expressions in order, returning the last result. At least
/// one expression is required.
fn eval_body<'h>(heap: &'h Heap, env: &Root<'h>, body: &[Value]) -> EvalResult<Root<'h>> {
    let (last, init) = body.split_last().ok_or_else(|| Error::bad_form("body", "empty sequence"))?;
    for &expr in init {
        let expr = heap.root(expr);
        eval(heap, env, &expr)?;
    }
    let last = heap.root(*last);
    eval(heap, env, &last)
}

/// Evaluates a proper list of expressions in order; the clause bodies of
/// `cond`, `case`, and `begin` all come through here.
fn eval_sequence<'h>(heap: &'h Heap, env: &Root<'h>, exprs: Value, form: &str) -> EvalResult<Root<'h>> {
    let body = builtins::list_to_vec(heap, exprs).map_err(|_| Error::bad_form(form, "malformed body"))?;
    eval_body(heap, env, &body)
}

// ----------------------------------------------------------------------
// Special forms. `tail` is the unevaluated operand list of the form, kept
// alive by the caller's root on the whole expression.
// ----------------------------------------------------------------------

fn eval_special<'h>(heap: &'h Heap, env: &Root<'h>, prim: Primitive, tail: Value) -> EvalResult<Root<'h>> {
    match prim {
        Primitive::Quote => special_quote(heap, tail),
        Primitive::If => special_if(heap, env, tail),
        Primitive::Set => special_set(heap, env, tail),
        Primitive::Define => special_define(heap, env, tail),
        Primitive::Lambda => special_lambda(heap, env, tail),
        Primitive::Begin => special_begin(heap, env, tail),
        Primitive::Cond => special_cond(heap, env, tail),
        Primitive::Case => special_case(heap, env, tail),
        Primitive::And => special_and(heap, env, tail),
        Primitive::Or => special_or(heap, env, tail),
        Primitive::Let => special_let(heap, env, tail),
        Primitive::LetStar => special_let_star(heap, env, tail),
        Primitive::LetRec => special_letrec(heap, env, tail),
        Primitive::Delay => special_delay(heap, env, tail),
        Primitive::Else | Primitive::Arrow => Err(Error::bad_form(
            &prim.name(),
            "only meaningful inside a cond or case clause",
        )),
        Primitive::Do
        | Primitive::Quasiquote
        | Primitive::Unquote
        | Primitive::UnquoteSplicing
        | Primitive::LetSyntax
        | Primitive::LetRecSyntax
        | Primitive::SyntaxRules
        | Primitive::DefineSyntax => Err(Error::not_implemented(&prim.name())),
        _ => unreachable!("eval_special called on a non-special primitive"),
    }
}

fn form_operands(heap: &Heap, tail: Value, form: &str) -> EvalResult<Vec<Value>> {
    builtins::list_to_vec(heap, tail).map_err(|_| Error::bad_form(form, "expected a proper list of operands"))
}

fn expect_operands(form: &str, operands: &[Value], lo: usize, hi: usize) -> EvalResult<()> {
    if (lo..=hi).contains(&operands.len()) {
        Ok(())
    } else if lo == hi {
        Err(Error::bad_form(form, format!("expected {lo} operands, got {}", operands.len())))
    } else {
        Err(Error::bad_form(form, format!("expected {lo} to {hi} operands, got {}", operands.len())))
    }
}

fn special_quote<'h>(heap: &'h Heap, tail: Value) -> EvalResult<Root<'h>> {
    let operands = form_operands(heap, tail, "quote")?;
    expect_operands("quote", &operands, 1, 1)?;
    Ok(heap.root(operands[0]))
}

fn special_if<'h>(heap: &'h Heap, env: &Root<'h>, tail: Value) -> EvalResult<Root<'h>> {
    let operands = form_operands(heap, tail, "if")?;
    expect_operands("if", &operands, 2, 3)?;
    let test = heap.root(operands[0]);
    let test = eval(heap, env, &test)?;
    if test.value().is_truthy() {
        let consequent = heap.root(operands[1]);
        eval(heap, env, &consequent)
    } else if let Some(&alternate) = operands.get(2) {
        let alternate = heap.root(alternate);
        eval(heap, env, &alternate)
    } else {
        Ok(heap.root(Value::EmptyList))
    }
}

fn special_set<'h>(heap: &'h Heap, env: &Root<'h>, tail: Value) -> EvalResult<Root<'h>> {
    let operands = form_operands(heap, tail, "set!")?;
    expect_operands("set!", &operands, 2, 2)?;
    let sym = builtins::try_symbol(heap, operands[0])?;
    let expr = heap.root(operands[1]);
    let value = eval(heap, env, &expr)?;
    env::set(heap, env.value(), sym, value.value())?;
    Ok(heap.root(Value::EmptyList))
}

fn special_define<'h>(heap: &'h Heap, env: &Root<'h>, tail: Value) -> EvalResult<Root<'h>> {
    let operands = form_operands(heap, tail, "define")?;
    if operands.is_empty() {
        return Err(Error::bad_form("define", "expected a name and a value"));
    }

    // Procedure shorthand: (define (name . formals) body...).
    if let Some((name, formals)) = operands[0].as_pair(heap) {
        let sym = builtins::try_symbol(heap, name)?;
        let body = operands[1..].to_vec();
        if body.is_empty() {
            return Err(Error::bad_form("define", "procedure body may not be empty"));
        }
        let (params, rest) = parse_formals(heap, formals)?;
        let lambda = heap.alloc_lambda(params, rest, body, env);
        env::define(heap, env.value(), sym, lambda.value());
        return Ok(heap.root(Value::EmptyList));
    }

    expect_operands("define", &operands, 2, 2)?;
    let sym = builtins::try_symbol(heap, operands[0])?;
    let expr = heap.root(operands[1]);
    let value = eval(heap, env, &expr)?;
    env::define(heap, env.value(), sym, value.value());
    Ok(heap.root(Value::EmptyList))
}

fn special_lambda<'h>(heap: &'h Heap, env: &Root<'h>, tail: Value) -> EvalResult<Root<'h>> {
    let operands = form_operands(heap, tail, "lambda")?;
    if operands.len() < 2 {
        return Err(Error::bad_form("lambda", "expected formals and at least one body expression"));
    }
    let (params, rest) = parse_formals(heap, operands[0])?;
    let body = operands[1..].to_vec();
    Ok(heap.alloc_lambda(params, rest, body, env))
}

/// Formals are an empty list, a single rest symbol, or a possibly-improper
/// list of symbols whose dotted tail becomes the rest parameter.
fn parse_formals(heap: &Heap, formals: Value) -> EvalResult<(Vec<HeapId>, Option<HeapId>)> {
    let mut params = Vec::new();
    let mut cur = formals;
    loop {
        match cur {
            Value::EmptyList => return Ok((params, None)),
            _ => {
                if let Some(sym) = cur.as_symbol(heap) {
                    return Ok((params, Some(sym)));
                }
                match cur.as_pair(heap) {
                    Some((car, cdr)) => {
                        let sym = car
                            .as_symbol(heap)
                            .ok_or_else(|| Error::bad_form("lambda", "formals must be symbols"))?;
                        params.push(sym);
                        cur = cdr;
                    }
                    None => return Err(Error::bad_form("lambda", "malformed formals")),
                }
            }
        }
    }
}

fn special_begin<'h>(heap: &'h Heap, env: &Root<'h>, tail: Value) -> EvalResult<Root<'h>> {
    if tail == Value::EmptyList {
        return Ok(heap.root(Value::EmptyList));
    }
    eval_sequence(heap, env, tail, "begin")
}

/// True when `test` is a symbol currently bound to the given reserved
/// primitive — how `else` and `=>` are recognized, so shadowing them turns
/// the special meaning off.
fn resolves_to(heap: &Heap, env: &Root<'_>, datum: Value, prim: Primitive) -> bool {
    datum
        .as_symbol(heap)
        .and_then(|sym| env::try_lookup(heap, env.value(), sym))
        .is_some_and(|value| value == Value::Primitive(prim))
}

fn special_cond<'h>(heap: &'h Heap, env: &Root<'h>, tail: Value) -> EvalResult<Root<'h>> {
    let clauses = form_operands(heap, tail, "cond")?;
    for (i, &clause) in clauses.iter().enumerate() {
        let (test, body) = clause
            .as_pair(heap)
            .ok_or_else(|| Error::bad_form("cond", "clause is not a test-body pair"))?;

        if i == clauses.len() - 1 && resolves_to(heap, env, test, Primitive::Else) {
            return eval_sequence(heap, env, body, "cond");
        }

        let test = heap.root(test);
        let value = eval(heap, env, &test)?;
        if value.value().is_false() {
            continue;
        }

        if body == Value::EmptyList {
            return Ok(value);
        }

        // (test => receiver): apply the receiver to the test's value.
        let body_items = builtins::list_to_vec(heap, body).map_err(|_| Error::bad_form("cond", "malformed clause"))?;
        if resolves_to(heap, env, body_items[0], Primitive::Arrow) {
            if body_items.len() != 2 {
                return Err(Error::bad_form("cond", "expected exactly one receiver after =>"));
            }
            let receiver = heap.root(body_items[1]);
            let receiver = eval(heap, env, &receiver)?;
            return apply_procedure(heap, &receiver, &[value]);
        }

        return eval_body(heap, env, &body_items);
    }
    Ok(heap.root(Value::EmptyList))
}

fn special_case<'h>(heap: &'h Heap, env: &Root<'h>, tail: Value) -> EvalResult<Root<'h>> {
    let operands = form_operands(heap, tail, "case")?;
    if operands.is_empty() {
        return Err(Error::bad_form("case", "expected a key expression"));
    }
    let key_expr = heap.root(operands[0]);
    let key = eval(heap, env, &key_expr)?;

    let clauses = &operands[1..];
    for (i, &clause) in clauses.iter().enumerate() {
        let (datums, body) = clause
            .as_pair(heap)
            .ok_or_else(|| Error::bad_form("case", "clause is not a datum-body pair"))?;

        if i == clauses.len() - 1 && resolves_to(heap, env, datums, Primitive::Else) {
            return eval_sequence(heap, env, body, "case");
        }

        let datums = builtins::list_to_vec(heap, datums)
            .map_err(|_| Error::bad_form("case", "clause datums must form a list"))?;
        if datums.iter().any(|&datum| key.value().is_eqv(datum)) {
            return eval_sequence(heap, env, body, "case");
        }
    }
    Ok(heap.root(Value::EmptyList))
}

fn special_and<'h>(heap: &'h Heap, env: &Root<'h>, tail: Value) -> EvalResult<Root<'h>> {
    let operands = form_operands(heap, tail, "and")?;
    let mut last = heap.root(Value::Bool(true));
    for &operand in &operands {
        let operand = heap.root(operand);
        last = eval(heap, env, &operand)?;
        if last.value().is_false() {
            return Ok(last);
        }
    }
    Ok(last)
}

fn special_or<'h>(heap: &'h Heap, env: &Root<'h>, tail: Value) -> EvalResult<Root<'h>> {
    let operands = form_operands(heap, tail, "or")?;
    for &operand in &operands {
        let operand = heap.root(operand);
        let value = eval(heap, env, &operand)?;
        if value.value().is_truthy() {
            return Ok(value);
        }
    }
    Ok(heap.root(Value::Bool(false)))
}

/// Pulls `(var val)` pairs out of a binding list.
fn parse_bindings(heap: &Heap, form: &str, bindings: Value) -> EvalResult<Vec<(HeapId, Value)>> {
    let bindings =
        builtins::list_to_vec(heap, bindings).map_err(|_| Error::bad_form(form, "malformed binding list"))?;
    let mut parsed = Vec::with_capacity(bindings.len());
    for &binding in &bindings {
        let items = builtins::list_to_vec(heap, binding).map_err(|_| Error::bad_form(form, "expected (var val)"))?;
        let &[var, val] = items.as_slice() else {
            return Err(Error::bad_form(form, "expected (var val)"));
        };
        let sym = var
            .as_symbol(heap)
            .ok_or_else(|| Error::bad_form(form, "binding name must be a symbol"))?;
        parsed.push((sym, val));
    }
    Ok(parsed)
}

fn let_operands(heap: &Heap, form: &str, tail: Value) -> EvalResult<(Vec<(HeapId, Value)>, Vec<Value>)> {
    let operands = form_operands(heap, tail, form)?;
    if operands.len() < 2 {
        return Err(Error::bad_form(form, "expected bindings and a body"));
    }
    let bindings = parse_bindings(heap, form, operands[0])?;
    Ok((bindings, operands[1..].to_vec()))
}

fn special_let<'h>(heap: &'h Heap, env: &Root<'h>, tail: Value) -> EvalResult<Root<'h>> {
    let (bindings, body) = let_operands(heap, "let", tail)?;
    // All values evaluate in the enclosing scope before any binding exists.
    let mut evaluated: Vec<(HeapId, Root<'h>)> = Vec::with_capacity(bindings.len());
    for (sym, val_expr) in bindings {
        let val_expr = heap.root(val_expr);
        evaluated.push((sym, eval(heap, env, &val_expr)?));
    }
    let scope = env::new_scope(heap, env);
    for (sym, value) in &evaluated {
        env::define(heap, scope.value(), *sym, value.value());
    }
    eval_body(heap, &scope, &body)
}

fn special_let_star<'h>(heap: &'h Heap, env: &Root<'h>, tail: Value) -> EvalResult<Root<'h>> {
    let (bindings, body) = let_operands(heap, "let*", tail)?;
    // Each value sees the bindings before it.
    let scope = env::new_scope(heap, env);
    for (sym, val_expr) in bindings {
        let val_expr = heap.root(val_expr);
        let value = eval(heap, &scope, &val_expr)?;
        env::define(heap, scope.value(), sym, value.value());
    }
    eval_body(heap, &scope, &body)
}

fn special_letrec<'h>(heap: &'h Heap, env: &Root<'h>, tail: Value) -> EvalResult<Root<'h>> {
    let (bindings, body) = let_operands(heap, "letrec", tail)?;
    // Pre-bind every name so the value expressions can refer to each other,
    // then assign in order.
    let scope = env::new_scope(heap, env);
    for (sym, _) in &bindings {
        env::define(heap, scope.value(), *sym, Value::EmptyList);
    }
    for (sym, val_expr) in bindings {
        let val_expr = heap.root(val_expr);
        let value = eval(heap, &scope, &val_expr)?;
        env::set(heap, scope.value(), sym, value.value())?;
    }
    eval_body(heap, &scope, &body)
}

fn special_delay<'h>(heap: &'h Heap, env: &Root<'h>, tail: Value) -> EvalResult<Root<'h>> {
    let operands = form_operands(heap, tail, "delay")?;
    expect_operands("delay", &operands, 1, 1)?;
    let expr = heap.root(operands[0]);
    Ok(heap.alloc_promise(&expr, env))
}
