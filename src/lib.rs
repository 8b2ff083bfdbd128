#![allow(clippy::new_without_default)]
mod ast;
mod interpreter;
mod object;
mod parser;
mod printer;
mod scanner;
mod token;

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::interpreter::*;
    pub use crate::object::*;
    pub use crate::parser::*;
    pub use crate::printer::*;
    pub use crate::scanner::*;
    pub use crate::token::*;
}

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use log::debug;

use prelude::{Interpreter, Parser, Resolver, RuntimeInterrupt, Scanner};

pub type SharedErrorReporter = Rc<RefCell<dyn ErrorReporter>>;

/// Sink for diagnostics from every pipeline stage. The driver reads the
/// flags back to gate later stages and to pick the process exit code.
pub trait ErrorReporter: std::fmt::Debug {
    /// A static diagnostic. `location` is `" at 'lexeme'"`, `" at end"`, or
    /// empty for scan errors.
    fn report(&mut self, line: i32, location: &str, message: &str);

    fn error(&mut self, line: i32, message: &str) {
        self.report(line, "", message);
    }

    fn runtime_error(&mut self, error: &RuntimeInterrupt);

    fn had_error(&self) -> bool;
    fn had_runtime_error(&self) -> bool;

    /// Forget recorded errors; the REPL calls this between lines.
    fn reset(&mut self);
}

/// The default reporter: one diagnostic per line on stderr.
#[derive(Debug, Default)]
pub struct StderrReporter {
    had_error: bool,
    had_runtime_error: bool,
}

impl ErrorReporter for StderrReporter {
    fn report(&mut self, line: i32, location: &str, message: &str) {
        eprintln!("[line {}] Error{}: {}", line, location, message);
        self.had_error = true;
    }

    fn runtime_error(&mut self, error: &RuntimeInterrupt) {
        eprintln!("{}", error);
        self.had_runtime_error = true;
    }

    fn had_error(&self) -> bool {
        self.had_error
    }

    fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    fn reset(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }
}

pub struct Lox {
    interpreter: Interpreter,
    error_reporter: SharedErrorReporter,
}

impl Lox {
    pub fn new() -> Self {
        let error_reporter: SharedErrorReporter =
            Rc::new(RefCell::new(StderrReporter::default()));
        let interpreter = Interpreter::new().with_error_reporting(error_reporter.clone());

        Self { interpreter, error_reporter }
    }

    pub fn had_error(&self) -> bool {
        self.error_reporter.borrow().had_error()
    }

    pub fn had_runtime_error(&self) -> bool {
        self.error_reporter.borrow().had_runtime_error()
    }

    pub fn run_file(&mut self, filename: &str) -> Result<(), anyhow::Error> {
        let content = std::fs::read_to_string(filename)?;
        self.run(content.as_ref());
        Ok(())
    }

    pub fn run_prompt(&mut self) -> Result<(), anyhow::Error> {
        let reader = std::io::stdin();

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let mut line = String::new();
            let n = reader.read_line(&mut line)?;
            if n == 0 {
                return Ok(());
            }

            self.run(line.trim_end());

            // A bad line must not poison the next prompt
            self.error_reporter.borrow_mut().reset();
        }
    }

    /// Run a program through the whole pipeline. Diagnostics land in the
    /// error reporter; a program with static errors is never executed.
    pub fn run(&mut self, input: &str) {
        let mut scanner =
            Scanner::new(input).with_error_reporting(self.error_reporter.clone());
        let tokens = scanner.scan_tokens();
        debug!("scanned {} tokens", tokens.len());

        let mut parser = Parser::new(tokens).with_error_reporting(self.error_reporter.clone());
        let statements = parser.parse();
        if self.had_error() {
            return;
        }
        debug!("parsed {} top-level statements", statements.len());

        let mut resolver = Resolver::new(&mut self.interpreter)
            .with_error_reporting(self.error_reporter.clone());
        resolver.resolve(&statements);
        if self.had_error() {
            return;
        }

        self.interpreter.interpret(&statements);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_errors_refuse_the_program() {
        let mut lox = Lox::new();
        lox.run("var a = @;");
        assert!(lox.had_error());
        assert!(!lox.had_runtime_error());
    }

    #[test]
    fn parse_errors_refuse_the_program() {
        let mut lox = Lox::new();
        lox.run("print 1 +;");
        assert!(lox.had_error());
    }

    #[test]
    fn resolver_errors_refuse_the_program() {
        let mut lox = Lox::new();
        lox.run("{ var x = x; }");
        assert!(lox.had_error());
    }

    #[test]
    fn top_level_self_reference_is_a_global_lookup() {
        // At the top level `var x = x;` is legal; the lookup just fails at
        // runtime if the global is missing -- here it is defined, as nil.
        let mut lox = Lox::new();
        lox.run("var x = nil; var y = x; print y;");
        assert!(!lox.had_error());
        assert!(!lox.had_runtime_error());
    }

    #[test]
    fn runtime_errors_are_recorded() {
        let mut lox = Lox::new();
        lox.run("print \"a\" - 1;");
        assert!(!lox.had_error());
        assert!(lox.had_runtime_error());
    }

    #[test]
    fn a_clean_program_leaves_no_flags() {
        let mut lox = Lox::new();
        lox.run("var a = 1 + 2; { var b = a; a = b * 2; }");
        assert!(!lox.had_error());
        assert!(!lox.had_runtime_error());
    }
}
