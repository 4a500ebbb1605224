//! End-to-end evaluator behavior: source text in, printed value out.

use pretty_assertions::assert_eq;
use vesper::{Error, ErrorKind, ReplSession};

/// Evaluates `source` in a fresh session and returns the printed value of
/// its last top-level form.
fn run(source: &str) -> String {
    let mut session = ReplSession::new();
    session
        .execute(source)
        .unwrap_or_else(|err| panic!("evaluation of {source:?} failed: {err}"))
        .expect("source should produce a value")
}

fn run_err(source: &str) -> Error {
    let mut session = ReplSession::new();
    session
        .execute(source)
        .expect_err(&format!("evaluation of {source:?} should fail"))
}

// =======================================================================
// Self-evaluation and variable lookup
// =======================================================================

/// Literals evaluate to themselves.
#[test]
fn literals_self_evaluate() {
    assert_eq!(run("5"), "5");
    assert_eq!(run("2.5"), "2.5");
    assert_eq!(run("#t"), "#t");
    assert_eq!(run("#f"), "#f");
    assert_eq!(run("#\\a"), "#\\a");
    assert_eq!(run("\"hi\""), "\"hi\"");
    assert_eq!(run("'#(1 2)"), "#(1 2)");
}

#[test]
fn unbound_variable_reports_its_name() {
    let err = run_err("nope");
    assert_eq!(err.kind(), ErrorKind::Unbound);
    assert!(err.to_string().contains("nope"), "{err}");
}

// =======================================================================
// The concrete scenarios from the acceptance list
// =======================================================================

#[test]
fn identity_lambda() {
    assert_eq!(run("((lambda (x) x) 42)"), "42");
}

#[test]
fn rest_parameter_collects_extra_args() {
    assert_eq!(run("((lambda (x y . z) z) 3 4 5 6)"), "(5 6)");
}

#[test]
fn if_with_and_without_alternate() {
    assert_eq!(run("(if #f 42 43)"), "43");
    assert_eq!(run("(if #t 42)"), "42");
    assert_eq!(run("(if #f 42)"), "()");
}

#[test]
fn cond_with_arrow_clause() {
    assert_eq!(run("(cond (#f 3) ((+ 4 3) => (lambda (x) (+ x 3))) (else 4))"), "10");
}

#[test]
fn case_matches_with_eqv() {
    assert_eq!(run("(case (* 2 3) ((2 3 5 7) 'prime) ((1 4 6 8 9) 'composite))"), "composite");
}

#[test]
fn variadic_arithmetic() {
    assert_eq!(run("(+ 22 12 3 5)"), "42");
    assert_eq!(run("(* 21 -2 -1)"), "42");
    assert_eq!(run("(- 84 20 22)"), "42");
    assert_eq!(run("(/ 504 -6 -2)"), "42");
}

#[test]
fn define_then_set() {
    assert_eq!(run("(define foo 42) foo"), "42");
    assert_eq!(run("(define foo 42) (set! foo 7) foo"), "7");
}

#[test]
fn quoted_forms_are_data() {
    assert_eq!(run("'(+ 1 2)"), "(+ 1 2)");
}

#[test]
fn closures_capture_their_environment() {
    assert_eq!(run("(((lambda () (lambda (x) (+ 5 x)))) 7)"), "12");
}

// =======================================================================
// Special forms
// =======================================================================

#[test]
fn quote_returns_operand_unevaluated() {
    assert_eq!(run("(quote (a b))"), "(a b)");
    assert_eq!(run("''a"), "(quote a)");
}

#[test]
fn begin_sequences_left_to_right() {
    assert_eq!(run("(define x 0) (begin (set! x 1) (set! x (+ x 1)) x)"), "2");
    assert_eq!(run("(begin)"), "()");
}

#[test]
fn and_or_short_circuit() {
    assert_eq!(run("(and)"), "#t");
    assert_eq!(run("(or)"), "#f");
    assert_eq!(run("(and 1 2 3)"), "3");
    assert_eq!(run("(and 1 #f 3)"), "#f");
    assert_eq!(run("(or #f 2 3)"), "2");
    // The unbound variable after the short circuit is never touched.
    assert_eq!(run("(and #f nope)"), "#f");
    assert_eq!(run("(or 1 nope)"), "1");
}

#[test]
fn cond_returns_test_value_when_clause_has_no_body() {
    assert_eq!(run("(cond (#f) (7))"), "7");
    assert_eq!(run("(cond (#f 1))"), "()");
}

#[test]
fn let_evaluates_values_in_the_enclosing_scope() {
    assert_eq!(run("(define x 5) (let ((x 1) (y x)) y)"), "5");
}

#[test]
fn let_star_sees_prior_bindings() {
    assert_eq!(run("(let* ((x 1) (y (+ x 1))) (* x y))"), "2");
}

#[test]
fn letrec_supports_mutual_recursion() {
    let source = "(letrec ((even? (lambda (n) (if (= n 0) #t (odd? (- n 1)))))
                          (odd? (lambda (n) (if (= n 0) #f (even? (- n 1))))))
                    (even? 10))";
    assert_eq!(run(source), "#t");
}

#[test]
fn define_procedure_shorthand() {
    assert_eq!(run("(define (add a b) (+ a b)) (add 2 3)"), "5");
    assert_eq!(run("(define (tail a . rest) rest) (tail 1 2 3)"), "(2 3)");
    assert_eq!(run("(define (fact n) (if (= n 0) 1 (* n (fact (- n 1))))) (fact 10)"), "3628800");
}

#[test]
fn delay_is_lazy_and_force_memoizes() {
    let source = "(define counter 0)
                  (define p (delay (begin (set! counter (+ counter 1)) counter)))
                  (force p)
                  (force p)";
    assert_eq!(run(source), "1", "the delayed expression must run exactly once");
    assert_eq!(run("(define p (delay nope)) 'untouched"), "untouched", "delay must not evaluate");
}

// =======================================================================
// Special forms are identities, not keywords
// =======================================================================

/// Rebinding `if` turns it into an ordinary procedure in that scope.
#[test]
fn special_forms_can_be_shadowed() {
    assert_eq!(run("(define if (lambda (a b c) c)) (if 1 2 3)"), "3");
}

/// A shadowed `else` is just a variable; the clause becomes a normal test.
#[test]
fn shadowed_else_loses_its_meaning() {
    assert_eq!(run("(let ((else #f)) (cond (else 1) (#t 2)))"), "2");
}

#[test]
fn else_outside_cond_is_an_error() {
    assert_eq!(run_err("(else 1)").kind(), ErrorKind::BadForm);
}

// =======================================================================
// Arity
// =======================================================================

#[test]
fn too_few_args_raise() {
    assert_eq!(run_err("((lambda (x) x))").kind(), ErrorKind::WrongArity);
}

#[test]
fn too_many_args_without_rest_raise() {
    assert_eq!(run_err("((lambda (x) x) 1 2)").kind(), ErrorKind::WrongArity);
}

#[test]
fn extra_args_bind_to_rest_as_a_proper_list() {
    assert_eq!(run("((lambda (x . r) r) 1 2 3)"), "(2 3)");
    assert_eq!(run("((lambda (x . r) r) 1)"), "()");
    assert_eq!(run("((lambda args args) 1 2)"), "(1 2)");
}

// =======================================================================
// Recognized but unimplemented
// =======================================================================

#[test]
fn syntax_stubs_raise_not_implemented() {
    for source in [
        "(do ((i 0)) (#t i))",
        "`(1 2)",
        "(define-syntax foo (syntax-rules () ()))",
        "(let-syntax () 1)",
    ] {
        let err = run_err(source);
        assert_eq!(err.kind(), ErrorKind::NotImplemented, "{source} -> {err}");
    }
}

#[test]
fn procedure_stubs_raise_not_implemented() {
    for source in [
        "(call-with-current-continuation car)",
        "(values 1 2)",
        "(dynamic-wind car car car)",
        "(gcd 4 6)",
        "(eval '(+ 1 2))",
        "(display 1)",
        "(newline)",
    ] {
        let err = run_err(source);
        assert_eq!(err.kind(), ErrorKind::NotImplemented, "{source} -> {err}");
    }
}

// =======================================================================
// Error propagation
// =======================================================================

#[test]
fn applying_a_non_procedure_is_a_type_error() {
    assert_eq!(run_err("(1 2 3)").kind(), ErrorKind::WrongType);
}

#[test]
fn malformed_forms_are_rejected() {
    assert_eq!(run_err("(lambda)").kind(), ErrorKind::BadForm);
    assert_eq!(run_err("(lambda (x))").kind(), ErrorKind::BadForm);
    assert_eq!(run_err("(let ((x)) x)").kind(), ErrorKind::BadForm);
    assert_eq!(run_err("(if)").kind(), ErrorKind::BadForm);
}

#[test]
fn set_of_unbound_variable_fails() {
    assert_eq!(run_err("(set! nope 1)").kind(), ErrorKind::Unbound);
}
