use crate::prelude::*;

/// Renders an expression as a parenthesized prefix form. Handy when debugging
/// the parser; nothing in the pipeline depends on it.
pub struct AstPrinter;

impl AstPrinter {
    pub fn to_string(expr: &Expr) -> String {
        match expr {
            Expr::Literal { value } => format!("{value}"),
            Expr::Grouping { expr } => format!("(group {})", Self::to_string(expr)),
            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::to_string(right))
            }
            Expr::Binary { left, operator, right } => {
                format!("({} {} {})", operator.lexeme, Self::to_string(left), Self::to_string(right))
            }
            Expr::Logical { left, operator, right } => {
                format!("({} {} {})", operator.lexeme, Self::to_string(left), Self::to_string(right))
            }
            Expr::Variable { name, .. } => name.lexeme.clone(),
            Expr::Assignment { name, value, .. } => {
                format!("(= {} {})", name.lexeme, Self::to_string(value))
            }
            Expr::Call { callee, arguments, .. } => {
                let args =
                    arguments.iter().map(Self::to_string).collect::<Vec<_>>().join(" ");
                format!("(call {} {})", Self::to_string(callee), args)
            }
            Expr::Get { object, name } => format!("(. {} {})", Self::to_string(object), name.lexeme),
            Expr::Set { object, name, value } => {
                format!("(.= {} {} {})", Self::to_string(object), name.lexeme, Self::to_string(value))
            }
            Expr::This { .. } => "this".to_owned(),
            Expr::Super { method, .. } => format!("(super {})", method.lexeme),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    #[test]
    fn print_an_ast() {
        // This is '-123 * (45.67)'
        let expr = Expr::Binary {
            left: Box::new(Expr::Unary {
                operator: Token::new(TokenType::Minus, "-", None, 1),
                right: Box::new(Expr::int_literal(123.0)),
            }),
            operator: Token::new(TokenType::Star, "*", None, 1),
            right: Box::new(Expr::Grouping { expr: Box::new(Expr::int_literal(45.67)) }),
        };

        let res = AstPrinter::to_string(&expr);
        assert_eq!(res, "(* (- 123) (group 45.67))".to_owned());
    }

    #[test]
    fn print_an_assignment() {
        let expr = Expr::assignment(
            Token::new(TokenType::Identifier, "x", None, 1),
            Expr::int_literal(1.0),
        );
        assert_eq!(AstPrinter::to_string(&expr), "(= x 1)");
    }
}
