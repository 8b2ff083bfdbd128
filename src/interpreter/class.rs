use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Display;
use std::rc::Rc;

use crate::prelude::*;

#[derive(Debug, Clone)]
pub struct Class {
    name: String,
    methods: HashMap<String, Rc<LoxFunction>>,
    superclass: Option<Rc<RefCell<Self>>>,
}

impl Class {
    pub fn new(
        name: impl AsRef<str>,
        methods: HashMap<String, Rc<LoxFunction>>,
        superclass: Option<Rc<RefCell<Self>>>,
    ) -> Self {
        Self { name: name.as_ref().to_owned(), methods, superclass }
    }

    /// Calling a class allocates an instance and runs its `init` method (own
    /// or inherited) bound to it, if the class has one.
    pub fn construct(
        class: Rc<RefCell<Class>>,
        arguments: &[Object],
        interpreter: &mut Interpreter,
    ) -> Result<Shared<Instance>, RuntimeInterrupt> {
        let instance = Rc::new(RefCell::new(Instance::new(class.clone())));

        let initializer = class.borrow().find_method("init");
        if let Some(initializer) = initializer {
            initializer.bind(Object::Instance(instance.clone())).call(interpreter, arguments)?;
        }

        Ok(instance)
    }

    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        if let Some(method) = self.methods.get(name) {
            return Some(method.clone());
        }

        if let Some(superclass) = &self.superclass {
            return superclass.borrow().find_method(name);
        }

        None
    }

    pub fn arity(&self) -> usize {
        if let Some(initializer) = self.find_method("init") { initializer.arity() } else { 0 }
    }
}

impl Display for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug)]
pub struct Instance {
    class: Rc<RefCell<Class>>,
    fields: HashMap<String, Object>,
}

impl Instance {
    pub fn new(class: Rc<RefCell<Class>>) -> Self {
        Self { class, fields: HashMap::new() }
    }

    /// Property access: fields shadow methods, and a found method comes back
    /// bound to this instance.
    pub fn get(&self, field: &Token, instance: &Object) -> Result<Object, RuntimeInterrupt> {
        if let Some(object) = self.fields.get(&field.lexeme) {
            Ok(object.clone())
        } else if let Some(method) = self.class.borrow().find_method(&field.lexeme) {
            Ok(Object::Callable(method.bind(instance.clone())))
        } else {
            Err(RuntimeInterrupt::error(
                field.line,
                format!("Undefined property '{}'.", field.lexeme),
            ))
        }
    }

    pub fn set(&mut self, field: &Token, value: Object) {
        self.fields.insert(field.lexeme.clone(), value);
    }
}

impl Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} instance", self.class.borrow())
    }
}
