mod class;
mod environment;
mod error;
mod expr;
mod func;
mod native;
mod resolver;
mod stmt;

use std::collections::HashMap;

pub use class::{Class, Instance};
pub use environment::Environment;
pub use error::RuntimeInterrupt;
pub use func::{Callable, LoxFunction};
pub use resolver::Resolver;

use crate::ast::ExprId;
use crate::object::{Object, Shared};
use crate::SharedErrorReporter;

pub(crate) type InterpreterResult = Result<Object, RuntimeInterrupt>;

pub struct Interpreter {
    pub globals: Shared<Environment>,
    environment: Shared<Environment>,
    // Resolver output: expression id -> number of frames to climb
    locals: HashMap<ExprId, usize>,
    error_reporter: Option<SharedErrorReporter>,
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Environment::new().as_shared();
        let environment = globals.clone();

        globals.borrow_mut().define("clock", Object::Callable(native::clock()));

        Self { globals, environment, locals: HashMap::new(), error_reporter: None }
    }

    pub fn with_error_reporting(self, error_reporter: SharedErrorReporter) -> Self {
        Self { error_reporter: Some(error_reporter), ..self }
    }

    /// Called by the resolver for every local reference it pins down.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    fn runtime_error(&self, e: RuntimeInterrupt) {
        if let Some(reporter) = self.error_reporter.as_ref() {
            reporter.borrow_mut().runtime_error(&e);
        }
    }
}
