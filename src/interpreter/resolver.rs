use std::collections::HashMap;
use std::rc::Rc;

use super::Interpreter;
use crate::ast::ExprId;
use crate::prelude::{Expr, Stmt};
use crate::token::{Token, TokenType};
use crate::SharedErrorReporter;

#[derive(Debug, Clone, PartialEq, Copy)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

#[derive(Debug, Clone, PartialEq, Copy)]
enum ClassType {
    None,
    Class,
    SubClass,
}

/// Static analysis pass that pins every local variable reference to the
/// environment frame holding its binding, and rejects the handful of
/// constructs that cannot be checked at runtime. Errors go to the reporter
/// and resolution carries on, so one bad binding doesn't hide the next.
pub struct Resolver<'i> {
    interpreter: &'i mut Interpreter,
    scopes: Vec<HashMap<String, bool>>,
    current_function: FunctionType,
    current_class: ClassType,
    error_reporter: Option<SharedErrorReporter>,
}

impl<'i> Resolver<'i> {
    pub fn new(interpreter: &'i mut Interpreter) -> Self {
        Self {
            interpreter,
            scopes: vec![],
            current_function: FunctionType::None,
            current_class: ClassType::None,
            error_reporter: None,
        }
    }

    pub fn with_error_reporting(self, error_reporter: SharedErrorReporter) -> Self {
        Self { error_reporter: Some(error_reporter), ..self }
    }

    pub fn resolve<I, R>(&mut self, statements: I)
    where
        I: IntoIterator<Item = R>,
        R: AsRef<Stmt>,
    {
        for stmt in statements {
            self.resolve_stmt(stmt.as_ref());
        }
    }

    fn resolve_stmt(&mut self, input: &Stmt) {
        match input {
            Stmt::Block { statements } => {
                self.begin_scope();
                self.resolve(statements);
                self.end_scope();
            }
            Stmt::Var { name, initializer } => {
                // Three steps -- declare, resolve the initializer, define --
                // so the initializer cannot read the name it initializes
                self.declare(name);
                if let Some(initializer) = initializer {
                    self.resolve_expr(initializer);
                }
                self.define(name);
            }
            Stmt::Class { name, superclass, methods } => {
                self.resolve_class(name, superclass, methods)
            }
            Stmt::Function { params, body, name } => {
                // Unlike variables, functions are defined before their body
                // is resolved, so they can call themselves recursively.
                self.declare(name);
                self.define(name);

                self.resolve_function(params, body, FunctionType::Function);
            }
            Stmt::Expression { expr } => self.resolve_expr(expr),
            Stmt::If { condition, then_branch, else_branch } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(stmt) = else_branch {
                    self.resolve_stmt(stmt);
                }
            }
            Stmt::Print { expr } => self.resolve_expr(expr),
            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Cannot return from top-level code.");
                }

                if let Some(expr) = value {
                    // "init" implicitly returns the instance; an explicit
                    // value would be discarded, so reject it
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword, "Cannot return a value from an initializer.");
                    }
                    self.resolve_expr(expr);
                }
            }
            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }
        }
    }

    fn resolve_class(&mut self, name: &Token, superclass: &Option<Expr>, methods: &[Stmt]) {
        let enclosing_class = self.current_class;
        self.current_class = ClassType::Class;

        self.declare(name);
        self.define(name);

        if let Some(superclass) = superclass {
            if let Expr::Variable { name: super_name, .. } = superclass {
                if super_name.lexeme == name.lexeme {
                    self.error(super_name, "A class cannot inherit from itself.");
                }
            }

            self.current_class = ClassType::SubClass;
            self.resolve_expr(superclass);

            // Methods of a subclass see 'super' through one extra scope
            self.begin_scope();
            self.scope_define("super");
        }

        self.begin_scope();
        self.scope_define("this");

        for method in methods {
            let Stmt::Function { name, params, body } = method else {
                // The parser only ever puts function statements here
                continue;
            };

            let func_type = if name.lexeme == "init" {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };

            self.resolve_function(params, body, func_type);
        }

        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    fn resolve_function(&mut self, params: &[Token], body: &[Rc<Stmt>], func_type: FunctionType) {
        let enclosing_func = self.current_function;
        self.current_function = func_type;

        self.begin_scope();
        for param in params {
            self.declare(param);
            self.define(param);
        }

        self.resolve(body);
        self.end_scope();
        self.current_function = enclosing_func;
    }

    fn resolve_expr(&mut self, input: &Expr) {
        match input {
            Expr::Variable { id, name } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.error(name, "Cannot read local variable in its own initializer.");
                    }
                }

                self.resolve_local(*id, name);
            }
            Expr::Assignment { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }
            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Cannot use 'this' outside of a class.");
                    return;
                }

                self.resolve_local(*id, keyword);
            }
            Expr::Super { id, keyword, method: _ } => match self.current_class {
                ClassType::None => self.error(keyword, "Cannot use 'super' outside of a class."),
                ClassType::Class => {
                    self.error(keyword, "Cannot use 'super' in a class with no superclass.")
                }
                ClassType::SubClass => self.resolve_local(*id, keyword),
            },
            Expr::Binary { left, operator: _, right } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::Logical { left, operator: _, right } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::Call { callee, paren: _, arguments } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }
            Expr::Get { object, name: _ } => self.resolve_expr(object),
            Expr::Set { object, name: _, value } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }
            Expr::Grouping { expr } => self.resolve_expr(expr),
            Expr::Literal { value: _ } => {}
            Expr::Unary { operator: _, right } => self.resolve_expr(right),
        }
    }

    /// Scan scopes innermost-outward; the first hit fixes the lexical
    /// distance. No hit means the name is (hopefully) a global.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (i, scope) in self.scopes.iter().enumerate().rev() {
            if scope.contains_key(&name.lexeme) {
                self.interpreter.resolve(id, self.scopes.len() - i - 1);
                return;
            }
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else {
            // Top level; globals may be redeclared freely
            return;
        };

        if scope.contains_key(&name.lexeme) {
            self.error(name, "Already a variable with this name in this scope.");
            return;
        }

        scope.insert(name.lexeme.clone(), false);
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    /// Install a synthetic name ('this' / 'super') as already defined in the
    /// innermost scope.
    fn scope_define(&mut self, name: &str) {
        self.scopes
            .last_mut()
            .expect("a scope is opened right before synthetic names are defined")
            .insert(name.to_owned(), true);
    }

    fn error(&self, token: &Token, message: &str) {
        let Some(reporter) = self.error_reporter.as_ref() else {
            return;
        };

        if token.token_type == TokenType::EOF {
            reporter.borrow_mut().report(token.line, " at end", message);
        } else {
            reporter.borrow_mut().report(token.line, &format!(" at '{}'", token.lexeme), message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    fn resolve_source(source: &str) -> Interpreter {
        let tokens = Scanner::new(source).scan_tokens();
        let statements = Parser::new(tokens).parse();

        let mut interpreter = Interpreter::new();
        Resolver::new(&mut interpreter).resolve(&statements);
        interpreter
    }

    #[test]
    fn global_references_stay_out_of_the_side_table() {
        let interpreter = resolve_source("var a = 1; print a;");
        assert!(interpreter.locals.is_empty());
    }

    #[test]
    fn local_references_get_a_distance() {
        let interpreter = resolve_source("{ var a = 1; print a; }");
        let distances: Vec<_> = interpreter.locals.values().copied().collect();
        assert_eq!(distances, vec![0]);
    }

    #[test]
    fn distances_count_intervening_scopes() {
        let interpreter = resolve_source("{ var a = 1; { { print a; } } }");
        let distances: Vec<_> = interpreter.locals.values().copied().collect();
        assert_eq!(distances, vec![2]);
    }

    #[test]
    fn function_bodies_add_one_scope() {
        let interpreter = resolve_source("{ var a = 1; fun f() { print a; } }");
        // Two entries: the read of `a` inside f (distance 1, through the
        // parameter scope) -- and none for the declaration of f itself.
        let mut distances: Vec<_> = interpreter.locals.values().copied().collect();
        distances.sort();
        assert_eq!(distances, vec![1]);
    }

    #[test]
    fn rerunning_the_resolver_yields_the_same_table() {
        let tokens = Scanner::new("{ var a = 1; fun f() { print a; } f(); }").scan_tokens();
        let statements = Parser::new(tokens).parse();

        let mut interpreter = Interpreter::new();
        Resolver::new(&mut interpreter).resolve(&statements);
        let first = interpreter.locals.clone();

        Resolver::new(&mut interpreter).resolve(&statements);
        assert_eq!(first, interpreter.locals);
    }
}
