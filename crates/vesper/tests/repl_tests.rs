//! Session behavior: state persists across inputs, errors recover at the
//! top level.

use pretty_assertions::assert_eq;
use vesper::{ErrorKind, ReplSession};

/// Definitions made in one input are visible in later inputs.
#[test]
fn definitions_persist_across_inputs() {
    let mut session = ReplSession::new();
    assert_eq!(session.execute("(define x 42)").unwrap(), Some("()".to_string()));
    assert_eq!(session.execute("x").unwrap(), Some("42".to_string()));
    assert_eq!(session.execute("(+ x 1)").unwrap(), Some("43".to_string()));
}

/// Empty input produces no value rather than an error.
#[test]
fn empty_input_yields_nothing() {
    let mut session = ReplSession::new();
    assert_eq!(session.execute("").unwrap(), None);
    assert_eq!(session.execute("  ; only a comment").unwrap(), None);
}

/// Only the last form's value is reported, but all forms run.
#[test]
fn last_value_wins() {
    let mut session = ReplSession::new();
    let printed = session.execute("(define a 1) (define b 2) (+ a b)").unwrap();
    assert_eq!(printed, Some("3".to_string()));
}

/// An error unwinds to the driver; the session and its definitions survive.
#[test]
fn errors_leave_the_session_intact() {
    let mut session = ReplSession::new();
    session.execute("(define x 42)").unwrap();

    let err = session.execute("(car 5)").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WrongType);

    assert_eq!(session.execute("x").unwrap(), Some("42".to_string()));
}

/// Whatever completed before the failing form is kept; nothing after it ran.
#[test]
fn partial_progress_is_kept_on_error() {
    let mut session = ReplSession::new();
    let err = session.execute("(define done 1) (car 5) (define never 2)").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WrongType);

    assert_eq!(session.execute("done").unwrap(), Some("1".to_string()));
    assert_eq!(session.execute("never").unwrap_err().kind(), ErrorKind::Unbound);
}

/// Syntax errors are reported with the repl pseudo-path and recover too.
#[test]
fn syntax_errors_recover() {
    let mut session = ReplSession::new();
    let err = session.execute("(1 2").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert!(err.to_string().starts_with("repl:"), "{err}");

    assert_eq!(session.execute("'ok").unwrap(), Some("ok".to_string()));
}

/// Closures created in one input keep working in later ones.
#[test]
fn closures_span_inputs() {
    let mut session = ReplSession::new();
    session.execute("(define (make-counter) (let ((n 0)) (lambda () (set! n (+ n 1)) n)))").unwrap();
    session.execute("(define tick (make-counter))").unwrap();
    assert_eq!(session.execute("(tick)").unwrap(), Some("1".to_string()));
    assert_eq!(session.execute("(tick)").unwrap(), Some("2".to_string()));
    assert_eq!(session.execute("(tick)").unwrap(), Some("3".to_string()));
}

/// Collections between inputs cannot disturb session state.
#[test]
fn collection_between_inputs_is_invisible() {
    let mut session = ReplSession::new();
    session.execute("(define xs (list 1 2 3))").unwrap();
    session.heap().collect();
    assert_eq!(session.execute("(length xs)").unwrap(), Some("3".to_string()));
}
