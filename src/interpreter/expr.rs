use super::InterpreterResult;
use crate::ast::ExprId;
use crate::prelude::*;

// Divisors closer to zero than this raise "Cannot divide by 0.". Inherited
// behavior; note that it also rejects small legitimate divisors.
const DIVISION_EPSILON: f64 = 1e-5;

impl Interpreter {
    pub fn evaluate_expr(&mut self, expr: &Expr) -> InterpreterResult {
        match expr {
            Expr::Literal { value } => Ok(value.clone()),
            Expr::Grouping { expr: inner } => self.evaluate_expr(inner.as_ref()),
            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),
            Expr::Binary { left, operator, right } => self.evaluate_binary(left, operator, right),
            Expr::Variable { id, name } => self.lookup_variable(name, *id),
            Expr::Assignment { id, name, value } => {
                let value = self.evaluate_expr(value.as_ref())?;

                if let Some(&distance) = self.locals.get(id) {
                    self.environment.borrow_mut().assign_at(distance, name, value.clone())?;
                } else {
                    self.globals.borrow_mut().assign(name, value.clone())?;
                }

                Ok(value)
            }
            Expr::Get { object, name } => {
                let object = self.evaluate_expr(object)?;
                if let Object::Instance(ref instance) = object {
                    instance.borrow().get(name, &object)
                } else {
                    Err(RuntimeInterrupt::error(name.line, "Only instances have properties."))
                }
            }
            Expr::Set { object, name, value } => {
                let object = self.evaluate_expr(object)?;

                if let Object::Instance(instance) = object {
                    let value = self.evaluate_expr(value)?;
                    instance.borrow_mut().set(name, value.clone());
                    Ok(value)
                } else {
                    Err(RuntimeInterrupt::error(name.line, "Only instances have fields."))
                }
            }
            Expr::Super { id, keyword, method } => self.evaluate_super(*id, keyword, method),
            Expr::This { id, keyword } => self.lookup_variable(keyword, *id),
            Expr::Logical { left, operator, right } => {
                let left_val = self.evaluate_expr(left)?;

                if operator.token_type == TokenType::Or {
                    if self.is_truthy(&left_val) {
                        return Ok(left_val);
                    }
                } else {
                    // TokenType::And
                    if !self.is_truthy(&left_val) {
                        return Ok(left_val);
                    }
                }

                self.evaluate_expr(right)
            }
            Expr::Call { callee, paren, arguments } => {
                self.evaluate_call(callee, paren.line, arguments)
            }
        }
    }

    pub(super) fn is_truthy(&self, value: &Object) -> bool {
        !matches!(value, Object::Null | Object::Boolean(false))
    }

    fn evaluate_call(&mut self, callee: &Expr, line: i32, arguments: &[Expr]) -> InterpreterResult {
        let callee = self.evaluate_expr(callee)?;

        match callee {
            Object::Callable(callable) => {
                let args = self.evaluate_arguments(arguments)?;
                self.check_arity(callable.arity(), args.len(), line)?;

                callable.call(self, &args)
            }
            Object::Class(class) => {
                let args = self.evaluate_arguments(arguments)?;
                let arity = class.borrow().arity();
                self.check_arity(arity, args.len(), line)?;

                Class::construct(class, &args, self).map(Object::Instance)
            }
            _ => Err(RuntimeInterrupt::error(line, "Can only call functions and classes.")),
        }
    }

    fn evaluate_arguments(&mut self, arguments: &[Expr]) -> Result<Vec<Object>, RuntimeInterrupt> {
        let mut args = Vec::with_capacity(arguments.len());
        for arg in arguments {
            args.push(self.evaluate_expr(arg)?);
        }

        Ok(args)
    }

    fn check_arity(&self, expected: usize, got: usize, line: i32) -> Result<(), RuntimeInterrupt> {
        if expected == got {
            Ok(())
        } else {
            Err(RuntimeInterrupt::error(
                line,
                format!("Expected {} arguments, but got {} arguments.", expected, got),
            ))
        }
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method_name: &Token) -> InterpreterResult {
        let distance = *self.locals.get(&id).expect("resolver should pin down every 'super'");

        let superclass = self.environment.borrow().get_at(distance, keyword)?;
        let superclass = match superclass {
            Object::Class(c) => c,
            _ => panic!("'super' is not bound to a class"),
        };

        // The implicit receiver lives one frame closer than 'super'
        let this = Token::new(TokenType::This, "this", None, keyword.line);
        let instance = self.environment.borrow().get_at(distance - 1, &this)?;

        let method = superclass.borrow().find_method(&method_name.lexeme);

        if let Some(method) = method {
            Ok(Object::Callable(method.bind(instance)))
        } else {
            Err(RuntimeInterrupt::error(
                method_name.line,
                format!("Undefined property '{}'.", method_name.lexeme),
            ))
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> InterpreterResult {
        let value = self.evaluate_expr(right)?;
        match operator.token_type {
            TokenType::Minus => {
                if let Object::Number(n) = value {
                    Ok(Object::Number(-n))
                } else {
                    Err(RuntimeInterrupt::error(operator.line, "Operand must be a number."))
                }
            }
            TokenType::Bang => Ok(Object::Boolean(!self.is_truthy(&value))),

            // Unreachable; the parser only produces the two unary operators above.
            _ => Ok(Object::Null),
        }
    }

    fn evaluate_binary(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> InterpreterResult {
        let left_value = self.evaluate_expr(left)?;
        let right_value = self.evaluate_expr(right)?;

        match operator.token_type {
            TokenType::Plus => {
                if let (Some(l), Some(r)) = (left_value.number(), right_value.number()) {
                    Ok(Object::Number(l + r))
                } else if let (Some(l), Some(r)) = (left_value.string(), right_value.string()) {
                    Ok(Object::String(format!("{l}{r}")))
                } else {
                    Err(RuntimeInterrupt::error(
                        operator.line,
                        "Operands must be two numbers or two strings.",
                    ))
                }
            }
            TokenType::Minus => self
                .check_number_operands(operator, &left_value, &right_value)
                .map(|(l, r)| Object::Number(l - r)),
            TokenType::Star => self
                .check_number_operands(operator, &left_value, &right_value)
                .map(|(l, r)| Object::Number(l * r)),
            TokenType::Slash => {
                let (l, r) = self.check_number_operands(operator, &left_value, &right_value)?;
                if r.abs() < DIVISION_EPSILON {
                    return Err(RuntimeInterrupt::error(operator.line, "Cannot divide by 0."));
                }

                Ok(Object::Number(l / r))
            }
            TokenType::Greater => self
                .check_number_operands(operator, &left_value, &right_value)
                .map(|(l, r)| Object::Boolean(l > r)),
            TokenType::GreaterEqual => self
                .check_number_operands(operator, &left_value, &right_value)
                .map(|(l, r)| Object::Boolean(l >= r)),
            TokenType::Less => self
                .check_number_operands(operator, &left_value, &right_value)
                .map(|(l, r)| Object::Boolean(l < r)),
            TokenType::LessEqual => self
                .check_number_operands(operator, &left_value, &right_value)
                .map(|(l, r)| Object::Boolean(l <= r)),

            TokenType::EqualEqual => Ok(Object::Boolean(left_value == right_value)),
            TokenType::BangEqual => Ok(Object::Boolean(left_value != right_value)),

            // Unreachable
            _ => Ok(Object::Null),
        }
    }

    fn check_number_operands(
        &self,
        operator: &Token,
        left: &Object,
        right: &Object,
    ) -> Result<(f64, f64), RuntimeInterrupt> {
        if let (Some(l), Some(r)) = (left.number(), right.number()) {
            Ok((l, r))
        } else {
            Err(RuntimeInterrupt::error(operator.line, "Operands must be numbers."))
        }
    }

    fn lookup_variable(&self, name: &Token, id: ExprId) -> Result<Object, RuntimeInterrupt> {
        if let Some(&distance) = self.locals.get(&id) {
            self.environment.borrow().get_at(distance, name)
        } else {
            self.globals.borrow().get(name)
        }
    }
}
