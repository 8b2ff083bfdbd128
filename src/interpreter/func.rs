use std::fmt::{Debug, Display};
use std::rc::Rc;

use crate::prelude::*;

pub trait Callable: Debug + Display {
    fn arity(&self) -> usize;
    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: &[Object],
    ) -> Result<Object, RuntimeInterrupt>;
}

#[derive(Debug, Clone)]
pub struct LoxFunction {
    name: Token,
    params: Vec<Token>,
    body: Vec<Rc<Stmt>>,
    closure: Shared<Environment>,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        name: Token,
        params: Vec<Token>,
        body: &[Rc<Stmt>],
        closure: Shared<Environment>,
        is_initializer: bool,
    ) -> Self {
        Self { name, params, body: body.to_vec(), closure, is_initializer }
    }

    /// Produce a copy of this function whose closure has `this` bound to the
    /// given instance. Looking a method up on an instance goes through here.
    pub fn bind(&self, this: Object) -> Rc<LoxFunction> {
        let env = Environment::new().with_enclosing(self.closure.clone()).as_shared();
        env.borrow_mut().define("this", this);

        Rc::new(LoxFunction::new(
            self.name.clone(),
            self.params.clone(),
            &self.body,
            env,
            self.is_initializer,
        ))
    }

    fn new_env_for_call(&self, arguments: &[Object]) -> Shared<Environment> {
        // Every call gets a fresh environment (its "stack frame"). With a
        // single shared frame, recursive calls would clobber each others'
        // parameters.
        let mut environment = Environment::new().with_enclosing(self.closure.clone());

        for (arg, param) in arguments.iter().zip(&self.params) {
            environment.define(param.lexeme.as_str(), arg.clone());
        }

        environment.as_shared()
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> usize {
        self.params.len()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: &[Object],
    ) -> Result<Object, RuntimeInterrupt> {
        let environment = self.new_env_for_call(arguments);

        let res = interpreter.execute_block(&self.body, environment);

        // An initializer always evaluates to `this` -- on fall-through and on
        // a bare `return;` alike. Runtime errors still propagate.
        if self.is_initializer
            && (matches!(res, Ok(_)) || matches!(res, Err(RuntimeInterrupt::Return { .. })))
        {
            let this = Token::new(TokenType::This, "this", None, self.name.line);
            return self.closure.borrow().get_at(0, &this);
        }

        // A 'Return' interrupt means the body hit a return statement; its
        // value is the call's result. Otherwise the function fell through.
        if let Err(RuntimeInterrupt::Return { value }) = res {
            Ok(value)
        } else {
            res.map(|_| Object::Null)
        }
    }
}

impl Display for LoxFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<fn {}>", self.name.lexeme)
    }
}
