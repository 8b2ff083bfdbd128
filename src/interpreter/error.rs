use thiserror::Error;

use crate::object::Object;

/// Anything that unwinds evaluation. A `return` statement travels through the
/// same channel as a runtime error so it can cross any number of nested
/// blocks; the function-call boundary picks it back out.
#[derive(Debug, Error, PartialEq)]
pub enum RuntimeInterrupt {
    #[error("{msg}\n[line {line}]")]
    Error { line: i32, msg: String },

    // Caught by LoxFunction::call; the resolver rejects top-level returns,
    // so this variant is never displayed.
    #[error("'return' outside of any function")]
    Return { value: Object },
}

impl RuntimeInterrupt {
    pub fn error(line: i32, msg: impl AsRef<str>) -> Self {
        Self::Error { line, msg: msg.as_ref().to_owned() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_error_prints_message_then_line() {
        let e = RuntimeInterrupt::error(3, "Operands must be numbers.");
        assert_eq!(e.to_string(), "Operands must be numbers.\n[line 3]");
    }
}
