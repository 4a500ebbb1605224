//! Primitive library behavior, one family at a time.

use pretty_assertions::assert_eq;
use vesper::{Error, ErrorKind, ReplSession};

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
// Arithmetic and exactness
// =======================================================================

/// Any inexact operand makes the result inexact.
#[test]
fn exactness_propagates_through_arithmetic() {
    assert_eq!(run("(+ 1 2)"), "3");
    assert_eq!(run("(+ 1 2.5)"), "3.5");
    assert_eq!(run("(* 2 3.0)"), "6.0");
    assert_eq!(run("(- 1.0 1)"), "0.0");
}

/// Exact division stays exact only when the quotient is whole.
#[test]
fn division_falls_to_float_when_not_exact() {
    assert_eq!(run("(/ 6 3)"), "2");
    assert_eq!(run("(/ 1 2)"), "0.5");
    assert_eq!(run("(/ 1.0 4)"), "0.25");
}

#[test]
fn exact_division_by_zero_is_a_domain_error() {
    assert_eq!(run_err("(/ 1 0)").kind(), ErrorKind::Domain);
    assert_eq!(run_err("(quotient 1 0)").kind(), ErrorKind::Domain);
    assert_eq!(run_err("(modulo 1 0)").kind(), ErrorKind::Domain);
}

#[test]
fn unary_minus_negates_and_unary_slash_inverts() {
    assert_eq!(run("(- 5)"), "-5");
    assert_eq!(run("(- 5.5)"), "-5.5");
    assert_eq!(run("(/ 4)"), "0.25");
    assert_eq!(run("(/ 1)"), "1");
}

#[test]
fn comparisons_chain_across_all_operands() {
    assert_eq!(run("(< 1 2 3)"), "#t");
    assert_eq!(run("(< 1 3 2)"), "#f");
    assert_eq!(run("(<= 1 1 2)"), "#t");
    assert_eq!(run("(= 2 2 2)"), "#t");
    assert_eq!(run("(> 3 2 1)"), "#t");
    assert_eq!(run("(>= 3 3 4)"), "#f");
    assert_eq!(run("(= 2 2.0)"), "#t", "= compares numerically across exactness");
}

#[test]
fn numeric_predicates() {
    assert_eq!(run("(number? 1)"), "#t");
    assert_eq!(run("(number? 'a)"), "#f");
    assert_eq!(run("(integer? 5)"), "#t");
    assert_eq!(run("(integer? 5.0)"), "#t");
    assert_eq!(run("(integer? 5.5)"), "#f");
    assert_eq!(run("(exact? 5)"), "#t");
    assert_eq!(run("(exact? 5.0)"), "#f");
    assert_eq!(run("(inexact? 5.0)"), "#t");
    assert_eq!(run("(zero? 0)"), "#t");
    assert_eq!(run("(positive? 3)"), "#t");
    assert_eq!(run("(negative? -3)"), "#t");
    assert_eq!(run("(odd? 3)"), "#t");
    assert_eq!(run("(even? 4)"), "#t");
    assert_eq!(run("(even? 4.0)"), "#t", "integral inexact numbers have parity");
}

/// quotient truncates; remainder follows the dividend's sign; modulo follows
/// the divisor's.
#[test]
fn integer_division_sign_conventions() {
    assert_eq!(run("(quotient 7 2)"), "3");
    assert_eq!(run("(quotient 7 -2)"), "-3");
    assert_eq!(run("(remainder 7 -2)"), "1");
    assert_eq!(run("(remainder -7 2)"), "-1");
    assert_eq!(run("(modulo 7 -2)"), "-1");
    assert_eq!(run("(modulo -7 2)"), "1");
    assert_eq!(run("(modulo 7 2)"), "1");
}

/// min/max coerce to float when any operand was inexact, even if the chosen
/// extreme is exact.
#[test]
fn min_max_inexactness_is_contagious() {
    assert_eq!(run("(max 1 2 3)"), "3");
    assert_eq!(run("(min 1 2 3)"), "1");
    assert_eq!(run("(max 3 2.0)"), "3.0");
    assert_eq!(run("(min 1 2.0)"), "1.0");
}

#[test]
fn rounding_family() {
    assert_eq!(run("(floor -1.5)"), "-2.0");
    assert_eq!(run("(ceiling 1.2)"), "2.0");
    assert_eq!(run("(truncate -1.7)"), "-1.0");
    assert_eq!(run("(round 2.5)"), "2.0", "round halves to even");
    assert_eq!(run("(round 3.5)"), "4.0");
    assert_eq!(run("(floor 3)"), "3", "exact integers pass through");
}

#[test]
fn transcendental_functions_are_inexact() {
    assert_eq!(run("(exp 0)"), "1.0");
    assert_eq!(run("(log 1)"), "0.0", "log is the natural logarithm");
    assert_eq!(run("(sin 0)"), "0.0");
    assert_eq!(run("(cos 0)"), "1.0");
    assert_eq!(run("(sqrt 16)"), "4.0");
    assert_eq!(run("(atan 0)"), "0.0");
    assert_eq!(run("(atan 0 -1)"), run("(* 4 (atan 1))"), "two-argument atan is atan2");
}

#[test]
fn expt_keeps_exactness_for_exact_powers() {
    assert_eq!(run("(expt 2 10)"), "1024");
    assert_eq!(run("(expt 2 0)"), "1");
    assert_eq!(run("(expt 2.0 2)"), "4.0");
    assert_eq!(run("(expt 4 0.5)"), "2.0");
}

#[test]
fn exactness_conversions() {
    assert_eq!(run("(exact->inexact 5)"), "5.0");
    assert_eq!(run("(inexact->exact 5.0)"), "5");
    assert_eq!(run_err("(inexact->exact 5.5)").kind(), ErrorKind::Domain);
}

#[test]
fn number_string_conversions() {
    assert_eq!(run("(number->string 42)"), "\"42\"");
    assert_eq!(run("(number->string 255 16)"), "\"ff\"");
    assert_eq!(run("(number->string -5 2)"), "\"-101\"");
    assert_eq!(run("(number->string 1.5)"), "\"1.5\"");
    assert_eq!(run_err("(number->string 1.5 16)").kind(), ErrorKind::Domain);
    assert_eq!(run("(string->number \"42\")"), "42");
    assert_eq!(run("(string->number \"1e3\")"), "1000.0");
    assert_eq!(run("(string->number \"ff\" 16)"), "255");
    assert_eq!(run("(string->number \"#xff\")"), "255");
    assert_eq!(run("(string->number \"foo\")"), "#f");
    assert_eq!(run("(string->number \"3+4i\")"), "#f", "complex forms are rejected");
}

// =======================================================================
// Equivalence
// =======================================================================

#[test]
fn eq_is_identity() {
    assert_eq!(run("(eq? 'a 'a)"), "#t", "symbols are interned");
    assert_eq!(run("(eq? '() '())"), "#t", "the empty list is a singleton");
    assert_eq!(run("(eq? \"a\" \"a\")"), "#f", "distinct strings are distinct");
    assert_eq!(run("(define x (list 1)) (eq? x x)"), "#t");
    assert_eq!(run("(eq? (list 1) (list 1))"), "#f");
}

#[test]
fn eqv_compares_scalars_by_value() {
    assert_eq!(run("(eqv? 5 5)"), "#t");
    assert_eq!(run("(eqv? 5 5.0)"), "#f", "different tags are never eqv");
    assert_eq!(run("(eqv? 1.5 1.5)"), "#t");
    assert_eq!(run("(eqv? #\\a #\\a)"), "#t");
    assert_eq!(run("(eqv? #t #t)"), "#t");
}

#[test]
fn equal_recurses_through_structure() {
    assert_eq!(run("(equal? '(1 (2 3)) '(1 (2 3)))"), "#t");
    assert_eq!(run("(equal? '(1 2) '(1 3))"), "#f");
    assert_eq!(run("(equal? \"ab\" \"ab\")"), "#t");
    assert_eq!(run("(equal? (vector 1 2) (vector 1 2))"), "#t");
    assert_eq!(run("(equal? (vector 1 2) (vector 1 2 3))"), "#f");
}

#[test]
fn not_and_boolean() {
    assert_eq!(run("(not #f)"), "#t");
    assert_eq!(run("(not 0)"), "#f", "only #f is false");
    assert_eq!(run("(boolean? #f)"), "#t");
    assert_eq!(run("(boolean? '())"), "#f");
}

// =======================================================================
// Pairs and lists
// =======================================================================

#[test]
fn cons_car_cdr() {
    assert_eq!(run("(cons 1 2)"), "(1 . 2)");
    assert_eq!(run("(car '(1 2))"), "1");
    assert_eq!(run("(cdr '(1 2))"), "(2)");
    assert_eq!(run_err("(car 5)").kind(), ErrorKind::WrongType);
}

#[test]
fn generated_cxr_accessors() {
    assert_eq!(run("(cadr '(1 2 3))"), "2");
    assert_eq!(run("(cddr '(1 2 3))"), "(3)");
    assert_eq!(run("(caar '((1) 2))"), "1");
    assert_eq!(run("(caddr '(1 2 3))"), "3");
    assert_eq!(run("(cadddr '(1 2 3 4))"), "4");
    assert_eq!(run("(cdadr '(1 (2 3)))"), "(3)");
}

#[test]
fn mutation_on_fresh_pairs() {
    assert_eq!(run("(define p (cons 1 2)) (set-car! p 9) p"), "(9 . 2)");
    assert_eq!(run("(define p (cons 1 2)) (set-cdr! p '(3)) p"), "(1 3)");
}

/// Literal structure from the reader is constant.
#[test]
fn quoted_data_is_read_only() {
    assert_eq!(run_err("(set-car! '(1 2) 9)").kind(), ErrorKind::ReadOnly);
    assert_eq!(run_err("(vector-set! '#(1 2) 0 9)").kind(), ErrorKind::ReadOnly);
}

#[test]
fn list_predicates() {
    assert_eq!(run("(pair? '(1))"), "#t");
    assert_eq!(run("(pair? '())"), "#f");
    assert_eq!(run("(null? '())"), "#t");
    assert_eq!(run("(null? '(1))"), "#f");
    assert_eq!(run("(list? '(1 2))"), "#t");
    assert_eq!(run("(list? '(1 . 2))"), "#f");
}

/// A cyclic chain is not a list, and the test must terminate on it.
#[test]
fn list_test_detects_cycles() {
    let source = "(define l (list 1 2)) (set-cdr! (cdr l) l) (list? l)";
    assert_eq!(run(source), "#f");
}

#[test]
fn length_append_reverse() {
    assert_eq!(run("(length '())"), "0");
    assert_eq!(run("(length '(1 2 3))"), "3");
    assert_eq!(run_err("(length '(1 . 2))").kind(), ErrorKind::WrongType);
    assert_eq!(run("(append '(1 2) '(3) '(4 5))"), "(1 2 3 4 5)");
    assert_eq!(run("(append '(1) 2)"), "(1 . 2)", "the last argument need not be a list");
    assert_eq!(run("(reverse '(1 2 3))"), "(3 2 1)");
}

/// `append` copies every argument except the last, which the result shares.
#[test]
fn append_shares_its_final_argument() {
    let source = "(define tail (list 1 2)) (define joined (append (list 0) tail)) (eq? (cdr joined) tail)";
    assert_eq!(run(source), "#t");
    let copied = "(define head (list 0)) (define joined (append head (list 1))) (eq? joined head)";
    assert_eq!(run(copied), "#f");
}

#[test]
fn list_tail_and_ref() {
    assert_eq!(run("(list-tail '(1 2 3) 0)"), "(1 2 3)");
    assert_eq!(run("(list-tail '(1 2 3) 2)"), "(3)");
    assert_eq!(run("(list-ref '(1 2 3) 2)"), "3");
    assert_eq!(run_err("(list-ref '(1) 5)").kind(), ErrorKind::WrongType);
}

#[test]
fn member_family_uses_the_three_equivalences() {
    assert_eq!(run("(memq 'c '(a b c))"), "(c)");
    assert_eq!(run("(memq (list 1) '((1)))"), "#f", "memq is identity only");
    assert_eq!(run("(memv 2 '(1 2 3))"), "(2 3)");
    assert_eq!(run("(member (list 1) '((1) (2)))"), "((1) (2))");
}

#[test]
fn assoc_family() {
    assert_eq!(run("(assq 'b '((a 1) (b 2)))"), "(b 2)");
    assert_eq!(run("(assq 'z '((a 1)))"), "#f");
    assert_eq!(run("(assv 2 '((1 one) (2 two)))"), "(2 two)");
    assert_eq!(run("(assoc \"b\" '((\"a\" 1) (\"b\" 2)))"), "(\"b\" 2)");
}

// =======================================================================
// Symbols and strings
// =======================================================================

#[test]
fn symbol_string_conversions_intern() {
    assert_eq!(run("(symbol->string 'hello)"), "\"hello\"");
    assert_eq!(run("(string->symbol \"hello\")"), "hello");
    assert_eq!(run("(eq? (string->symbol \"x\") 'x)"), "#t", "runtime symbols intern with read symbols");
    assert_eq!(run("(symbol? 'a)"), "#t");
    assert_eq!(run("(symbol? \"a\")"), "#f");
}

/// The string behind a symbol's name is immutable.
#[test]
fn symbol_to_string_is_read_only() {
    assert_eq!(run_err("(string-set! (symbol->string 'foo) 0 #\\x)").kind(), ErrorKind::ReadOnly);
    assert_eq!(run_err("(string-fill! (symbol->string 'foo) #\\x)").kind(), ErrorKind::ReadOnly);
}

#[test]
fn string_construction_and_access() {
    assert_eq!(run("(make-string 3 #\\a)"), "\"aaa\"");
    assert_eq!(run("(string #\\a #\\b)"), "\"ab\"");
    assert_eq!(run("(string-length \"hello\")"), "5");
    assert_eq!(run("(string-ref \"abc\" 1)"), "#\\b");
    assert_eq!(run_err("(string-ref \"abc\" 3)").kind(), ErrorKind::OutOfRange);
}

#[test]
fn string_mutation() {
    assert_eq!(run("(define s (make-string 3 #\\a)) (string-set! s 1 #\\b) s"), "\"aba\"");
    assert_eq!(run("(define s (string-copy \"xyz\")) (string-fill! s #\\q) s"), "\"qqq\"");
}

#[test]
fn string_comparisons_in_both_flavors() {
    assert_eq!(run("(string=? \"abc\" \"abc\")"), "#t");
    assert_eq!(run("(string<? \"abc\" \"abd\")"), "#t");
    assert_eq!(run("(string>? \"b\" \"a\")"), "#t");
    assert_eq!(run("(string<=? \"a\" \"a\")"), "#t");
    assert_eq!(run("(string=? \"ABC\" \"abc\")"), "#f");
    assert_eq!(run("(string-ci=? \"ABC\" \"abc\")"), "#t");
    assert_eq!(run("(string-ci<? \"ABC\" \"abd\")"), "#t");
}

#[test]
fn substring_append_and_lists() {
    assert_eq!(run("(substring \"hello\" 1 3)"), "\"el\"");
    assert_eq!(run_err("(substring \"hi\" 1 5)").kind(), ErrorKind::OutOfRange);
    assert_eq!(run("(string-append \"foo\" \"bar\" \"\")"), "\"foobar\"");
    assert_eq!(run("(string->list \"ab\")"), "(#\\a #\\b)");
    assert_eq!(run("(list->string '(#\\a #\\b))"), "\"ab\"");
}

/// `string-copy` returns a mutable copy even of a read-only string.
#[test]
fn string_copy_is_mutable() {
    assert_eq!(
        run("(define s (string-copy (symbol->string 'foo))) (string-set! s 0 #\\b) s"),
        "\"boo\""
    );
}

// =======================================================================
// Characters
// =======================================================================

#[test]
fn char_comparisons() {
    assert_eq!(run("(char=? #\\a #\\a)"), "#t");
    assert_eq!(run("(char<? #\\a #\\b)"), "#t");
    assert_eq!(run("(char>? #\\b #\\a)"), "#t");
    assert_eq!(run("(char=? #\\a #\\A)"), "#f");
    assert_eq!(run("(char-ci=? #\\a #\\A)"), "#t");
    assert_eq!(run("(char-ci<? #\\A #\\b)"), "#t");
}

#[test]
fn char_classification() {
    assert_eq!(run("(char-alphabetic? #\\a)"), "#t");
    assert_eq!(run("(char-alphabetic? #\\1)"), "#f");
    assert_eq!(run("(char-numeric? #\\7)"), "#t");
    assert_eq!(run("(char-whitespace? #\\space)"), "#t");
    assert_eq!(run("(char-upper-case? #\\A)"), "#t");
    assert_eq!(run("(char-lower-case? #\\a)"), "#t");
}

#[test]
fn char_integer_conversions() {
    assert_eq!(run("(char->integer #\\A)"), "65");
    assert_eq!(run("(integer->char 97)"), "#\\a");
    assert_eq!(run_err("(integer->char 300)").kind(), ErrorKind::OutOfRange);
    assert_eq!(run_err("(integer->char -1)").kind(), ErrorKind::OutOfRange);
}

#[test]
fn char_case_conversion() {
    assert_eq!(run("(char-upcase #\\a)"), "#\\A");
    assert_eq!(run("(char-downcase #\\A)"), "#\\a");
    assert_eq!(run("(char-upcase #\\5)"), "#\\5");
}

// =======================================================================
// Vectors
// =======================================================================

#[test]
fn vector_construction_and_access() {
    assert_eq!(run("(make-vector 2 7)"), "#(7 7)");
    assert_eq!(run("(vector 1 'a \"s\")"), "#(1 a \"s\")");
    assert_eq!(run("(vector-length (make-vector 3 0))"), "3");
    assert_eq!(run("(vector-ref (vector 1 2 3) 1)"), "2");
    assert_eq!(run_err("(vector-ref (vector 1) 1)").kind(), ErrorKind::OutOfRange);
}

#[test]
fn vector_mutation() {
    assert_eq!(run("(define v (make-vector 2 0)) (vector-set! v 1 9) v"), "#(0 9)");
    assert_eq!(run("(define v (make-vector 3 0)) (vector-fill! v 5) v"), "#(5 5 5)");
    assert_eq!(run_err("(vector-set! (make-vector 1 0) 5 1)").kind(), ErrorKind::OutOfRange);
}

#[test]
fn vector_list_conversions() {
    assert_eq!(run("(vector->list (vector 1 2))"), "(1 2)");
    assert_eq!(run("(list->vector '(1 2))"), "#(1 2)");
    assert_eq!(run("(vector? (vector))"), "#t");
    assert_eq!(run("(vector? '(1))"), "#f");
}

// =======================================================================
// Higher-order procedures
// =======================================================================

#[test]
fn procedure_predicate() {
    assert_eq!(run("(procedure? car)"), "#t");
    assert_eq!(run("(procedure? (lambda () 1))"), "#t");
    assert_eq!(run("(procedure? 'car)"), "#f");
}

#[test]
fn apply_splices_its_final_list() {
    assert_eq!(run("(apply + '(1 2 3))"), "6");
    assert_eq!(run("(apply + 1 2 '(3 4))"), "10");
    assert_eq!(run("(apply car '((5 6)))"), "5", "spliced values are not re-evaluated");
    assert_eq!(run_err("(apply + 1 2)").kind(), ErrorKind::WrongType);
}

#[test]
fn map_over_one_and_many_lists() {
    assert_eq!(run("(map (lambda (x) (* x x)) '(1 2 3))"), "(1 4 9)");
    assert_eq!(run("(map + '(1 2) '(10 20))"), "(11 22)");
    assert_eq!(run("(map car '((1 2) (3 4)))"), "(1 3)");
    assert_eq!(run_err("(map + '(1 2) '(1))").kind(), ErrorKind::WrongArity);
}

#[test]
fn for_each_runs_for_effect() {
    let source = "(define acc '()) (for-each (lambda (x) (set! acc (cons x acc))) '(1 2 3)) acc";
    assert_eq!(run(source), "(3 2 1)");
    assert_eq!(run("(for-each car '((1)))"), "()");
}

#[test]
fn force_requires_a_promise() {
    assert_eq!(run_err("(force 5)").kind(), ErrorKind::WrongType);
}
