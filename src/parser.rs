use std::rc::Rc;

use crate::{prelude::*, SharedErrorReporter};

const MAX_CALL_ARGS: usize = 255;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    error_reporter: Option<SharedErrorReporter>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0, error_reporter: None }
    }

    pub fn with_error_reporting(self, error_reporter: SharedErrorReporter) -> Self {
        Self { error_reporter: Some(error_reporter), ..self }
    }

    /// Parse the token stream into a list of statements. Statements that fail
    /// to parse are dropped after synchronizing to the next declaration
    /// boundary; the error reporter decides whether the program may run.
    pub fn parse(&mut self) -> Vec<Stmt> {
        let mut statements = vec![];
        while !self.is_at_end() {
            match self.declaration() {
                Some(stmt) => statements.push(stmt),
                None => self.synchronize(),
            }
        }

        statements
    }

    fn declaration(&mut self) -> Option<Stmt> {
        if self.match_tt(&[TokenType::Class]) {
            self.class_declaration()
        } else if self.match_tt(&[TokenType::Fun]) {
            self.function("function")
        } else if self.match_tt(&[TokenType::Var]) {
            self.var_declaration()
        } else {
            self.statement()
        }
    }

    fn class_declaration(&mut self) -> Option<Stmt> {
        let name = self.consume(TokenType::Identifier, "Expect class name.")?;

        let superclass = if self.match_tt(&[TokenType::Less]) {
            let super_name = self.consume(TokenType::Identifier, "Expect superclass name.")?;
            Some(Expr::variable(super_name))
        } else {
            None
        };

        self.consume(TokenType::LeftBrace, "Expect '{' before class body.")?;

        let mut methods = vec![];
        while !self.check(&TokenType::RightBrace) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(TokenType::RightBrace, "Expect '}' after class body.")?;

        Some(Stmt::Class { name, superclass, methods })
    }

    fn var_declaration(&mut self) -> Option<Stmt> {
        let name = self.consume(TokenType::Identifier, "Expect variable name.")?;

        let initializer =
            if self.match_tt(&[TokenType::Equal]) { Some(self.expression()?) } else { None };

        self.consume(TokenType::Semicolon, "Expect ';' after variable declaration.")?;

        Some(Stmt::Var { name, initializer })
    }

    fn function(&mut self, kind: &str) -> Option<Stmt> {
        let name = self.consume(TokenType::Identifier, &format!("Expect {} name.", kind))?;

        self.consume(TokenType::LeftParen, &format!("Expect '(' after {} name.", kind))?;

        let mut parameters = vec![];
        if !self.check(&TokenType::RightParen) {
            loop {
                if parameters.len() >= MAX_CALL_ARGS {
                    // Report, but keep parsing the parameter list
                    self.error(self.peek().clone(), "Can't have more than 255 parameters.");
                }

                parameters.push(self.consume(TokenType::Identifier, "Expect parameter name.")?);
                if !self.match_tt(&[TokenType::Comma]) {
                    break;
                }
            }
        }

        self.consume(TokenType::RightParen, "Expect ')' after parameters.")?;
        self.consume(TokenType::LeftBrace, &format!("Expect '{{' before {} body.", kind))?;

        let body = self.block()?.into_iter().map(Rc::new).collect::<Vec<_>>();

        Some(Stmt::Function { name, params: parameters, body })
    }

    fn statement(&mut self) -> Option<Stmt> {
        if self.match_tt(&[TokenType::If]) {
            self.if_statement()
        } else if self.match_tt(&[TokenType::While]) {
            self.while_statement()
        } else if self.match_tt(&[TokenType::Return]) {
            self.return_statement()
        } else if self.match_tt(&[TokenType::For]) {
            self.for_statement()
        } else if self.match_tt(&[TokenType::Print]) {
            self.print_statement()
        } else if self.match_tt(&[TokenType::LeftBrace]) {
            Some(Stmt::Block { statements: self.block()? })
        } else {
            self.expression_statement()
        }
    }

    fn if_statement(&mut self) -> Option<Stmt> {
        self.consume(TokenType::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenType::RightParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_tt(&[TokenType::Else]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Some(Stmt::If { condition, then_branch, else_branch })
    }

    fn return_statement(&mut self) -> Option<Stmt> {
        let keyword = self.previous();
        let value =
            if !self.check(&TokenType::Semicolon) { Some(self.expression()?) } else { None };

        self.consume(TokenType::Semicolon, "Expect ';' after return value.")?;
        Some(Stmt::Return { keyword, value })
    }

    fn while_statement(&mut self) -> Option<Stmt> {
        self.consume(TokenType::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenType::RightParen, "Expect ')' after while condition.")?;

        let body = Box::new(self.statement()?);
        Some(Stmt::While { condition, body })
    }

    fn for_statement(&mut self) -> Option<Stmt> {
        self.consume(TokenType::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if self.match_tt(&[TokenType::Semicolon]) {
            None
        } else if self.match_tt(&[TokenType::Var]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(&TokenType::Semicolon) {
            self.expression()?
        } else {
            Expr::Literal { value: Object::Boolean(true) }
        };
        self.consume(TokenType::Semicolon, "Expect ';' after loop condition.")?;

        let increment =
            if !self.check(&TokenType::RightParen) { Some(self.expression()?) } else { None };
        self.consume(TokenType::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;

        // Desugar to a while loop: { init; while (cond) { body; inc; } }
        if let Some(increment) = increment {
            body = Stmt::Block { statements: vec![body, Stmt::Expression { expr: increment }] };
        }

        body = Stmt::While { condition, body: Box::new(body) };

        if let Some(initializer) = initializer {
            body = Stmt::Block { statements: vec![initializer, body] };
        }

        Some(body)
    }

    fn print_statement(&mut self) -> Option<Stmt> {
        let expr = self.expression()?;
        self.consume(TokenType::Semicolon, "Expect ';' after value.")?;
        Some(Stmt::Print { expr })
    }

    fn block(&mut self) -> Option<Vec<Stmt>> {
        let mut statements = vec![];

        while !self.check(&TokenType::RightBrace) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }

        self.consume(TokenType::RightBrace, "Expect '}' after block.")?;
        Some(statements)
    }

    fn expression_statement(&mut self) -> Option<Stmt> {
        let expr = self.expression()?;
        self.consume(TokenType::Semicolon, "Expect ';' after expression.")?;
        Some(Stmt::Expression { expr })
    }

    fn expression(&mut self) -> Option<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Option<Expr> {
        let expr = self.or()?;

        if self.match_tt(&[TokenType::Equal]) {
            let equals = self.previous();
            // Right-associative: recurse instead of looping
            let value = self.assignment()?;

            match expr {
                Expr::Variable { name, .. } => return Some(Expr::assignment(name, value)),
                Expr::Get { object, name } => {
                    return Some(Expr::Set { object, name, value: Box::new(value) })
                }
                _ => self.error(equals, "Invalid assignment target."),
            }
        }

        Some(expr)
    }

    fn or(&mut self) -> Option<Expr> {
        let mut expr = self.and()?;

        while self.match_tt(&[TokenType::Or]) {
            let operator = self.previous();
            let right = self.and()?;
            expr = Expr::Logical { left: Box::new(expr), operator, right: Box::new(right) };
        }

        Some(expr)
    }

    fn and(&mut self) -> Option<Expr> {
        let mut expr = self.equality()?;

        while self.match_tt(&[TokenType::And]) {
            let operator = self.previous();
            let right = self.equality()?;
            expr = Expr::Logical { left: Box::new(expr), operator, right: Box::new(right) };
        }

        Some(expr)
    }

    fn equality(&mut self) -> Option<Expr> {
        let mut expr = self.comparison()?;

        while self.match_tt(&[TokenType::BangEqual, TokenType::EqualEqual]) {
            let operator: Token = self.previous();
            let right = self.comparison()?;
            expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
        }
        Some(expr)
    }

    fn comparison(&mut self) -> Option<Expr> {
        let mut expr = self.term()?;

        while self.match_tt(&[
            TokenType::GreaterEqual,
            TokenType::Greater,
            TokenType::LessEqual,
            TokenType::Less,
        ]) {
            let operator: Token = self.previous();
            let right = self.term()?;
            expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
        }
        Some(expr)
    }

    fn term(&mut self) -> Option<Expr> {
        let mut expr = self.factor()?;

        while self.match_tt(&[TokenType::Minus, TokenType::Plus]) {
            let operator: Token = self.previous();
            let right = self.factor()?;
            expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
        }
        Some(expr)
    }

    fn factor(&mut self) -> Option<Expr> {
        let mut expr = self.unary()?;

        while self.match_tt(&[TokenType::Slash, TokenType::Star]) {
            let operator: Token = self.previous();
            let right = self.unary()?;
            expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
        }
        Some(expr)
    }

    fn unary(&mut self) -> Option<Expr> {
        if self.match_tt(&[TokenType::Bang, TokenType::Minus]) {
            let operator = self.previous();
            let right = self.unary()?;
            return Some(Expr::Unary { operator, right: Box::new(right) });
        }

        self.call()
    }

    fn call(&mut self) -> Option<Expr> {
        let mut expr = self.primary()?;

        loop {
            if self.match_tt(&[TokenType::LeftParen]) {
                expr = self.finish_call(expr)?;
            } else if self.match_tt(&[TokenType::Dot]) {
                let name =
                    self.consume(TokenType::Identifier, "Expect property name after '.'.")?;
                expr = Expr::Get { object: Box::new(expr), name };
            } else {
                break;
            }
        }

        Some(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Option<Expr> {
        let mut arguments = vec![];

        if !self.check(&TokenType::RightParen) {
            loop {
                if arguments.len() >= MAX_CALL_ARGS {
                    // Just report the error; the rest of the call still parses
                    self.error(self.peek().clone(), "Can't have more than 255 arguments.");
                }

                arguments.push(self.expression()?);

                if !self.match_tt(&[TokenType::Comma]) {
                    break;
                }
            }
        }

        let paren = self.consume(TokenType::RightParen, "Expect ')' after arguments.")?;
        Some(Expr::Call { callee: Box::new(callee), paren, arguments })
    }

    fn primary(&mut self) -> Option<Expr> {
        if self.match_tt(&[TokenType::False]) {
            return Some(Expr::Literal { value: Object::Boolean(false) });
        }
        if self.match_tt(&[TokenType::True]) {
            return Some(Expr::Literal { value: Object::Boolean(true) });
        }
        if self.match_tt(&[TokenType::Nil]) {
            return Some(Expr::Literal { value: Object::Null });
        }
        if self.match_tt(&[TokenType::Number, TokenType::StringLiteral]) {
            return Some(Expr::Literal {
                value: self.previous().literal.expect("literal token should carry a value"),
            });
        }
        if self.match_tt(&[TokenType::Super]) {
            let keyword = self.previous();
            self.consume(TokenType::Dot, "Expect '.' after 'super'.")?;
            let method = self.consume(TokenType::Identifier, "Expect superclass method name.")?;
            return Some(Expr::super_access(keyword, method));
        }
        if self.match_tt(&[TokenType::This]) {
            return Some(Expr::this(self.previous()));
        }
        if self.match_tt(&[TokenType::Identifier]) {
            return Some(Expr::variable(self.previous()));
        }
        if self.match_tt(&[TokenType::LeftParen]) {
            let expr = self.expression()?;
            self.consume(TokenType::RightParen, "Expect ')' after expression.")?;
            return Some(Expr::Grouping { expr: Box::new(expr) });
        }

        self.error(self.peek().clone(), "Expect expression.");
        None
    }

    /// Return the next token if its `token_type` matches the given type.
    /// Otherwise, report the error message and return `None`.
    fn consume(&mut self, token_type: TokenType, message: &str) -> Option<Token> {
        if self.check(&token_type) {
            return Some(self.advance());
        }

        self.error(self.peek().clone(), message);
        None
    }

    fn error(&self, token: Token, message: &str) {
        let Some(reporter) = self.error_reporter.as_ref() else {
            return;
        };

        if token.token_type == TokenType::EOF {
            reporter.borrow_mut().report(token.line, " at end", message);
        } else {
            reporter.borrow_mut().report(token.line, &format!(" at '{}'", token.lexeme), message);
        }
    }

    fn match_tt(&mut self, types: &[TokenType]) -> bool {
        for tt in types {
            if self.check(tt) {
                self.advance();
                return true;
            }
        }

        false
    }

    /// Check whether the next token's type matches the given `token_type`.
    fn check(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == *token_type
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::EOF
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.current).expect("token stream should end with EOF")
    }

    fn previous(&mut self) -> Token {
        self.tokens.get(self.current - 1).expect("no token has been consumed yet").clone()
    }

    /// Panic-mode recovery: discard tokens until just past a `;`, or right
    /// before a keyword that can begin a declaration.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().token_type == TokenType::Semicolon {
                return;
            }

            match self.peek().token_type {
                TokenType::Class
                | TokenType::Fun
                | TokenType::Var
                | TokenType::For
                | TokenType::If
                | TokenType::While
                | TokenType::Print
                | TokenType::Return => return,
                _ => {}
            }

            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;

    fn parse(source: &str) -> Vec<Stmt> {
        let tokens = Scanner::new(source).scan_tokens();
        Parser::new(tokens).parse()
    }

    #[test]
    fn parses_a_print_statement() {
        let statements = parse("print 1 + 2;");
        assert_eq!(statements.len(), 1);
        assert!(matches!(statements[0], Stmt::Print { .. }));
    }

    #[test]
    fn for_desugars_to_block_and_while() {
        let statements = parse("for (var i = 0; i < 3; i = i + 1) print i;");
        assert_eq!(statements.len(), 1);

        let Stmt::Block { statements: outer } = &statements[0] else {
            panic!("for should desugar to a block");
        };
        assert!(matches!(outer[0], Stmt::Var { .. }));
        assert!(matches!(outer[1], Stmt::While { .. }));
    }

    #[test]
    fn for_without_clauses_is_a_bare_while() {
        let statements = parse("for (;;) print 1;");
        assert_eq!(statements.len(), 1);
        assert!(matches!(statements[0], Stmt::While { .. }));
    }

    #[test]
    fn assignment_is_right_associative() {
        let statements = parse("a = b = 1;");
        let Stmt::Expression { expr: Expr::Assignment { value, .. } } = &statements[0] else {
            panic!("expected an assignment");
        };
        assert!(matches!(value.as_ref(), Expr::Assignment { .. }));
    }

    #[test]
    fn dotted_assignment_becomes_a_set() {
        let statements = parse("obj.field = 1;");
        let Stmt::Expression { expr } = &statements[0] else {
            panic!("expected an expression statement");
        };
        assert!(matches!(expr, Expr::Set { .. }));
    }

    #[test]
    fn class_with_superclass_and_methods() {
        let statements = parse("class B < A { init(x) {} twice() {} }");
        let Stmt::Class { superclass, methods, .. } = &statements[0] else {
            panic!("expected a class declaration");
        };
        assert!(superclass.is_some());
        assert_eq!(methods.len(), 2);
    }

    #[test]
    fn recovers_after_a_bad_declaration() {
        // The first statement is garbage; the parser must synchronize and
        // still produce the second one.
        let statements = parse("var = 1; print 2;");
        assert_eq!(statements.len(), 1);
        assert!(matches!(statements[0], Stmt::Print { .. }));
    }

    #[test]
    fn each_variable_reference_gets_its_own_id() {
        let statements = parse("a; a;");
        let ids: Vec<_> = statements
            .iter()
            .map(|s| match s {
                Stmt::Expression { expr: Expr::Variable { id, .. } } => *id,
                _ => panic!("expected variable expressions"),
            })
            .collect();
        assert_ne!(ids[0], ids[1]);
    }
}
