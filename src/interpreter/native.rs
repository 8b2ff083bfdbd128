use std::fmt::Display;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::prelude::*;

#[derive(Debug)]
struct Clock;

impl Callable for Clock {
    fn arity(&self) -> usize {
        0
    }

    fn call(
        &self,
        _interpreter: &mut Interpreter,
        _arguments: &[Object],
    ) -> Result<Object, RuntimeInterrupt> {
        let since_epoch =
            SystemTime::now().duration_since(UNIX_EPOCH).expect("time went backward");

        Ok(Object::Number(since_epoch.as_millis() as f64 / 1000.0))
    }
}

impl Display for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<native fn>")
    }
}

pub fn clock() -> Rc<dyn Callable> {
    Rc::new(Clock)
}
