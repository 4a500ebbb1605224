use std::fmt;

use strum::{Display, EnumString, IntoStaticStr};

use crate::mark::Mark;

/// Result type alias for operations that can produce an interpreter error.
pub type EvalResult<T> = Result<T, Error>;

/// The failure categories the interpreter can raise.
///
/// Syntax errors come from the lexer and reader and carry a source mark.
/// Everything else is raised by the evaluator or a primitive and unwinds to
/// the driver, which reports it and resumes reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum ErrorKind {
    #[strum(serialize = "syntax error")]
    Syntax,
    #[strum(serialize = "unbound variable")]
    Unbound,
    #[strum(serialize = "wrong type")]
    WrongType,
    #[strum(serialize = "wrong arity")]
    WrongArity,
    #[strum(serialize = "out of range")]
    OutOfRange,
    #[strum(serialize = "read-only")]
    ReadOnly,
    #[strum(serialize = "domain error")]
    Domain,
    #[strum(serialize = "not implemented")]
    NotImplemented,
    #[strum(serialize = "bad form")]
    BadForm,
    #[strum(serialize = "io error")]
    Io,
}

/// An interpreter error: category, human-readable message, and the source
/// mark when one is available (always for syntax errors, never for runtime
/// errors raised from primitive bodies).
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    mark: Option<Mark>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            mark: None,
        }
    }

    pub fn syntax(message: impl Into<String>, mark: Mark) -> Self {
        Self {
            kind: ErrorKind::Syntax,
            message: message.into(),
            mark: Some(mark),
        }
    }

    pub fn unbound(name: &str) -> Self {
        Self::new(ErrorKind::Unbound, name)
    }

    pub fn wrong_type(expected: &str, got: impl fmt::Display) -> Self {
        Self::new(ErrorKind::WrongType, format!("expected {expected}, got {got}"))
    }

    pub fn not_implemented(what: &str) -> Self {
        Self::new(ErrorKind::NotImplemented, what)
    }

    pub fn bad_form(form: &str, detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadForm, format!("{form}: {}", detail.into()))
    }

    pub fn read_only(what: &str) -> Self {
        Self::new(ErrorKind::ReadOnly, format!("cannot mutate read-only {what}"))
    }

    #[must_use]
    pub fn with_mark(mut self, mark: Mark) -> Self {
        self.mark = Some(mark);
        self
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn mark(&self) -> Option<&Mark> {
        self.mark.as_ref()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.mark {
            Some(mark) => write!(f, "{mark}: {}: {}", self.kind, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for Error {}
