use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::RuntimeInterrupt;
use crate::object::Object;
use crate::token::Token;

#[derive(Debug, Default)]
pub struct Environment {
    pub enclosing: Option<Rc<RefCell<Environment>>>,
    values: HashMap<String, Object>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(self, enclosing: Rc<RefCell<Environment>>) -> Self {
        Self { enclosing: Some(enclosing), ..Default::default() }
    }

    pub fn as_shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }

    pub fn define(&mut self, name: &str, value: Object) {
        self.values.insert(name.to_owned(), value);
    }

    pub fn assign(&mut self, name: &Token, value: Object) -> Result<(), RuntimeInterrupt> {
        if !self.values.contains_key(&name.lexeme) {
            // Ask one level above if possible
            if let Some(ref e) = self.enclosing {
                return e.borrow_mut().assign(name, value);
            }

            return Err(RuntimeInterrupt::error(
                name.line,
                format!("Undefined variable '{}'.", name.lexeme),
            ));
        }

        self.values.insert(name.lexeme.clone(), value);
        Ok(())
    }

    pub fn get(&self, name: &Token) -> Result<Object, RuntimeInterrupt> {
        if let Some(value) = self.values.get(&name.lexeme) {
            return Ok(value.clone());
        }

        // Ask one level above if possible
        if let Some(ref e) = self.enclosing {
            return e.borrow().get(name);
        }

        Err(RuntimeInterrupt::error(name.line, format!("Undefined variable '{}'.", name.lexeme)))
    }

    /// Read `name` from the frame exactly `distance` parent links up. The
    /// resolver already proved which frame holds the binding, so unlike
    /// `get` this never falls through to an enclosing frame.
    pub fn get_at(&self, distance: usize, name: &Token) -> Result<Object, RuntimeInterrupt> {
        if distance == 0 {
            return self.get_local(name);
        }

        match self.ancestor(distance) {
            Some(frame) => frame.borrow().get_local(name),
            None => Err(RuntimeInterrupt::error(
                name.line,
                format!("No enclosing environment at distance {} for '{}'.", distance, name.lexeme),
            )),
        }
    }

    /// Write `name` in the frame exactly `distance` parent links up.
    pub fn assign_at(
        &mut self,
        distance: usize,
        name: &Token,
        value: Object,
    ) -> Result<(), RuntimeInterrupt> {
        if distance == 0 {
            self.values.insert(name.lexeme.clone(), value);
            return Ok(());
        }

        match self.ancestor(distance) {
            Some(frame) => {
                frame.borrow_mut().values.insert(name.lexeme.clone(), value);
                Ok(())
            }
            None => Err(RuntimeInterrupt::error(
                name.line,
                format!("No enclosing environment at distance {} for '{}'.", distance, name.lexeme),
            )),
        }
    }

    fn get_local(&self, name: &Token) -> Result<Object, RuntimeInterrupt> {
        self.values.get(&name.lexeme).cloned().ok_or_else(|| {
            RuntimeInterrupt::error(name.line, format!("Undefined variable '{}'.", name.lexeme))
        })
    }

    fn ancestor(&self, distance: usize) -> Option<Rc<RefCell<Environment>>> {
        let mut env = self.enclosing.clone()?;

        for _ in 1..distance {
            let parent = env.borrow().enclosing.clone()?;
            env = parent;
        }

        Some(env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn name(n: &str) -> Token {
        Token::new(TokenType::Identifier, n, None, 1)
    }

    #[test]
    fn define_then_get() {
        let mut env = Environment::new();
        env.define("x", Object::Number(1.0));
        assert_eq!(env.get(&name("x")).unwrap(), Object::Number(1.0));
    }

    #[test]
    fn get_falls_back_to_enclosing() {
        let mut globals = Environment::new();
        globals.define("x", Object::Number(1.0));
        let inner = Environment::new().with_enclosing(globals.as_shared());
        assert_eq!(inner.get(&name("x")).unwrap(), Object::Number(1.0));
    }

    #[test]
    fn get_reports_undefined_variables() {
        let env = Environment::new();
        let err = env.get(&name("missing")).unwrap_err();
        assert_eq!(err, RuntimeInterrupt::error(1, "Undefined variable 'missing'."));
    }

    #[test]
    fn assign_writes_to_the_defining_frame() {
        let globals = Environment::new().as_shared();
        globals.borrow_mut().define("x", Object::Number(1.0));

        let mut inner = Environment::new().with_enclosing(globals.clone());
        inner.assign(&name("x"), Object::Number(2.0)).unwrap();

        assert_eq!(globals.borrow().get(&name("x")).unwrap(), Object::Number(2.0));
    }

    #[test]
    fn assign_never_creates_a_binding() {
        let mut env = Environment::new();
        assert!(env.assign(&name("x"), Object::Null).is_err());
    }

    #[test]
    fn get_at_does_not_fall_through() {
        // `x` lives only in the parent; a distance-0 read must not find it.
        let globals = Environment::new().as_shared();
        globals.borrow_mut().define("x", Object::Number(1.0));
        let inner = Environment::new().with_enclosing(globals);

        assert!(inner.get(&name("x")).is_ok());
        assert!(inner.get_at(0, &name("x")).is_err());
        assert_eq!(inner.get_at(1, &name("x")).unwrap(), Object::Number(1.0));
    }

    #[test]
    fn get_at_skips_shadowing_frames() {
        let globals = Environment::new().as_shared();
        globals.borrow_mut().define("x", Object::String("outer".to_owned()));

        let middle = Environment::new().with_enclosing(globals).as_shared();
        middle.borrow_mut().define("x", Object::String("middle".to_owned()));

        let inner = Environment::new().with_enclosing(middle);
        assert_eq!(
            inner.get_at(2, &name("x")).unwrap(),
            Object::String("outer".to_owned())
        );
        assert_eq!(
            inner.get_at(1, &name("x")).unwrap(),
            Object::String("middle".to_owned())
        );
    }

    #[test]
    fn assign_at_targets_one_frame_only() {
        let globals = Environment::new().as_shared();
        globals.borrow_mut().define("x", Object::Number(1.0));

        let middle = Environment::new().with_enclosing(globals.clone()).as_shared();
        middle.borrow_mut().define("x", Object::Number(2.0));

        let mut inner = Environment::new().with_enclosing(middle.clone());
        inner.assign_at(2, &name("x"), Object::Number(99.0)).unwrap();

        assert_eq!(globals.borrow().get_at(0, &name("x")).unwrap(), Object::Number(99.0));
        assert_eq!(middle.borrow().get_at(0, &name("x")).unwrap(), Object::Number(2.0));
    }
}
