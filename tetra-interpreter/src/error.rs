use std::fmt;
use std::rc::Rc;

/// The kind of a runtime error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ArgumentError,
    TypeError,
    UndefinedMethodError,
    InternalError,
    NameError,
    UnsupportedMethodError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::ArgumentError => "ArgumentError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::UndefinedMethodError => "UndefinedMethodError",
            ErrorKind::InternalError => "InternalError",
            ErrorKind::NameError => "NameError",
            ErrorKind::UnsupportedMethodError => "UnsupportedMethodError",
        };
        f.write_str(name)
    }
}

/// A typed runtime error.
///
/// Errors travel as `Result::Err` through primitives and the interpreter loop;
/// the location is attached at the faulting send and preserved through
/// unwinding, so the error that reaches the top level reports the deepest
/// fault site.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    pub file: Option<Rc<str>>,
    pub line: Option<u32>,
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> RuntimeError {
        RuntimeError {
            kind,
            message: message.into(),
            file: None,
            line: None,
        }
    }

    pub fn wrong_number_of_arguments(expected: usize, got: usize) -> RuntimeError {
        let unit = if expected == 1 { "argument" } else { "arguments" };
        Self::new(
            ErrorKind::ArgumentError,
            format!("Expect {expected} {unit}. got: {got}"),
        )
    }

    pub fn wrong_number_of_arguments_range(min: usize, max: usize, got: usize) -> RuntimeError {
        Self::new(
            ErrorKind::ArgumentError,
            format!("Expect {min}..{max} argument. got: {got}"),
        )
    }

    pub fn wrong_number_of_arguments_at_least(min: usize, got: usize) -> RuntimeError {
        Self::new(
            ErrorKind::ArgumentError,
            format!("Expect {min} or more arguments. got: {got}"),
        )
    }

    pub fn wrong_argument_type(expected: &str, got: &str) -> RuntimeError {
        Self::new(
            ErrorKind::TypeError,
            format!("Expect argument to be {expected}. got: {got}"),
        )
    }

    pub fn undefined_method(name: &str, receiver: &str) -> RuntimeError {
        Self::new(
            ErrorKind::UndefinedMethodError,
            format!("Undefined Method '{name}' for {receiver}"),
        )
    }

    pub fn module_inheritance(module_name: &str) -> RuntimeError {
        Self::new(
            ErrorKind::InternalError,
            format!("Module inheritance is not supported: {module_name}"),
        )
    }

    pub fn yield_without_block() -> RuntimeError {
        Self::new(ErrorKind::InternalError, "can't yield without a block")
    }

    pub fn cant_require(name: &str) -> RuntimeError {
        Self::new(ErrorKind::InternalError, format!("Can't require \"{name}\""))
    }

    pub fn unsupported_new(class_name: &str) -> RuntimeError {
        Self::new(
            ErrorKind::UnsupportedMethodError,
            format!("Unsupported Method #new for {class_name}"),
        )
    }

    pub fn uninitialized_constant(name: &str) -> RuntimeError {
        Self::new(ErrorKind::NameError, format!("uninitialized constant {name}"))
    }

    pub fn divided_by_zero() -> RuntimeError {
        Self::new(ErrorKind::InternalError, "Divided by 0")
    }

    /// Attach a source location, keeping an already-attached (deeper) one.
    pub fn with_location(mut self, file: &Rc<str>, line: u32) -> RuntimeError {
        if self.file.is_none() {
            self.file = Some(file.clone());
            self.line = Some(line);
        }
        self
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for RuntimeError {}
