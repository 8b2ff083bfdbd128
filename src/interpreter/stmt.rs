use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::prelude::*;

impl Interpreter {
    pub fn interpret(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            if let Err(e) = self.execute(stmt) {
                // The first runtime error aborts the program
                self.runtime_error(e);
                return;
            }
        }
    }

    pub fn execute_block<I, R>(
        &mut self,
        statements: I,
        environment: Rc<RefCell<Environment>>,
    ) -> Result<(), RuntimeInterrupt>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<Stmt>,
    {
        let prev_env = self.environment.clone();
        self.environment = environment;

        for s in statements {
            let result = self.execute(s.as_ref());
            if result.is_err() {
                // Restore the previous frame on the error path too; a
                // 'Return' interrupt passes through here for every block it
                // unwinds across.
                self.environment = prev_env;
                return result;
            }
        }

        self.environment = prev_env;
        Ok(())
    }

    pub fn execute(&mut self, stmt: &Stmt) -> Result<(), RuntimeInterrupt> {
        match stmt {
            Stmt::Expression { expr } => {
                self.evaluate_expr(expr)?;
            }
            Stmt::Class { name, superclass, methods } => {
                self.execute_class_decl(name, superclass, methods)?
            }
            Stmt::Function { name, params, body } => {
                // self.environment is the active environment at declaration
                // time, NOT call time. For nested functions it refers to the
                // parent function's environment -- that is the closure.
                let env = self.environment.clone();
                let function = LoxFunction::new(name.clone(), params.to_vec(), body, env, false);
                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Object::Callable(Rc::new(function)));
            }
            Stmt::Return { keyword: _, value } => {
                let value =
                    if let Some(expr) = value { self.evaluate_expr(expr)? } else { Object::Null };

                return Err(RuntimeInterrupt::Return { value });
            }
            Stmt::Print { expr } => {
                let value = self.evaluate_expr(expr)?;
                println!("{value}");
            }
            Stmt::Var { name, initializer } => {
                let value = if let Some(expr) = initializer {
                    self.evaluate_expr(expr)?
                } else {
                    Object::Null
                };

                self.environment.borrow_mut().define(&name.lexeme, value);
            }
            Stmt::Block { statements } => {
                // Fresh environment for the block's scope
                let new_env = Environment::new().with_enclosing(self.environment.clone()).as_shared();

                self.execute_block(statements, new_env)?;
            }
            Stmt::If { condition, then_branch, else_branch } => {
                let condition_result = self.evaluate_expr(condition)?;

                if self.is_truthy(&condition_result) {
                    self.execute(then_branch.as_ref())?;
                } else if let Some(stmt) = else_branch {
                    self.execute(stmt.as_ref())?;
                }
            }
            Stmt::While { condition, body } => loop {
                let value = self.evaluate_expr(condition)?;
                if !self.is_truthy(&value) {
                    break;
                }

                self.execute(body)?;
            },
        };
        Ok(())
    }

    fn execute_class_decl(
        &mut self,
        name: &Token,
        superclass: &Option<Expr>,
        methods: &[Stmt],
    ) -> Result<(), RuntimeInterrupt> {
        let superclass = match superclass {
            Some(s) => match self.evaluate_expr(s)? {
                Object::Class(c) => Some(c),
                _ => {
                    let Expr::Variable { name: super_name, .. } = s else {
                        panic!("superclass is not held in a variable expression");
                    };
                    return Err(RuntimeInterrupt::error(
                        super_name.line,
                        "Superclass must be a class.",
                    ));
                }
            },
            None => None,
        };

        // Defined in two steps so methods can refer to the class by name
        self.environment.borrow_mut().define(&name.lexeme, Object::Null);

        if let Some(ref superclass) = superclass {
            // Methods close over an extra frame holding 'super'
            self.environment =
                Environment::new().with_enclosing(self.environment.clone()).as_shared();

            self.environment.borrow_mut().define("super", Object::Class(superclass.clone()));
        }

        let mut method_funcs = HashMap::new();
        for method in methods {
            let Stmt::Function { name, params, body } = method else {
                panic!("class method is not a function statement");
            };

            let is_initializer = name.lexeme == "init";

            method_funcs.insert(
                name.lexeme.clone(),
                Rc::new(LoxFunction::new(
                    name.clone(),
                    params.to_vec(),
                    body,
                    self.environment.clone(),
                    is_initializer,
                )),
            );
        }

        let class =
            Rc::new(RefCell::new(Class::new(&name.lexeme, method_funcs, superclass.clone())));

        if superclass.is_some() {
            let enclosing =
                self.environment.borrow().enclosing.clone().expect("'super' frame has a parent");
            self.environment = enclosing;
        }

        self.environment.borrow_mut().assign(name, Object::Class(class))
    }
}
