use crate::ast::{BinaryOp, ClassDecl, Expr, Literal, LogicalOp, MethodDecl, Stmt, UnaryOp};
use crate::error::parser_error::Error;
use crate::lexer::{Lexer, Token};

pub fn parse(source: &str) -> Result<Vec<Stmt>, Error> {
    let mut parser = Parser {
        lexer: Lexer::new(source),
    };
    parser.program()
}

/// Recursive descent over the lexer's one-token lookahead. Statement
/// boundaries are the lexer's Newline/Indent/Dedent tokens.
struct Parser {
    lexer: Lexer,
}

impl Parser {
    fn program(&mut self) -> Result<Vec<Stmt>, Error> {
        let mut stmts = Vec::new();
        while *self.lexer.current_token() != Token::Eof {
            if self.matches(&Token::Newline) {
                continue;
            }
            stmts.push(self.statement()?);
        }
        Ok(stmts)
    }

    fn statement(&mut self) -> Result<Stmt, Error> {
        match self.lexer.current_token() {
            Token::Class => self.class_decl(),
            Token::If => self.if_stmt(),
            Token::Print => self.print_stmt(),
            Token::Return => self.return_stmt(),
            _ => self.expr_stmt(),
        }
    }

    fn class_decl(&mut self) -> Result<Stmt, Error> {
        self.lexer.next_token();
        let name = self.expect_id()?;
        let superclass = if self.matches(&Token::Char('(')) {
            let parent = self.expect_id()?;
            self.expect(Token::Char(')'))?;
            Some(parent)
        } else {
            None
        };
        self.expect(Token::Char(':'))?;
        self.expect(Token::Newline)?;
        self.expect(Token::Indent)?;
        let mut methods = Vec::new();
        loop {
            if self.matches(&Token::Dedent) {
                break;
            }
            if self.matches(&Token::Newline) {
                continue;
            }
            methods.push(self.method_decl()?);
        }
        Ok(Stmt::ClassDecl(ClassDecl {
            name,
            superclass,
            methods,
        }))
    }

    fn method_decl(&mut self) -> Result<MethodDecl, Error> {
        self.expect(Token::Def)?;
        let name = self.expect_id()?;
        self.expect(Token::Char('('))?;
        let receiver = self.expect_id()?;
        if receiver != "self" {
            return Err(Error::MethodWithoutSelf {
                method: name,
                found: receiver,
            });
        }
        let mut params = Vec::new();
        while self.matches(&Token::Char(',')) {
            params.push(self.expect_id()?);
        }
        self.expect(Token::Char(')'))?;
        self.expect(Token::Char(':'))?;
        let body = self.suite()?;
        Ok(MethodDecl { name, params, body })
    }

    fn if_stmt(&mut self) -> Result<Stmt, Error> {
        self.lexer.next_token();
        let cond = self.expression()?;
        self.expect(Token::Char(':'))?;
        let then_branch = self.suite()?;
        let else_branch = if self.matches(&Token::Else) {
            self.expect(Token::Char(':'))?;
            self.suite()?
        } else {
            Vec::new()
        };
        Ok(Stmt::If(cond, then_branch, else_branch))
    }

    fn print_stmt(&mut self) -> Result<Stmt, Error> {
        self.lexer.next_token();
        let mut args = Vec::new();
        if !self.check(&Token::Newline) {
            args.push(self.expression()?);
            while self.matches(&Token::Char(',')) {
                args.push(self.expression()?);
            }
        }
        self.expect(Token::Newline)?;
        Ok(Stmt::Print(args))
    }

    fn return_stmt(&mut self) -> Result<Stmt, Error> {
        self.lexer.next_token();
        let value = if self.check(&Token::Newline) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(Token::Newline)?;
        Ok(Stmt::Return(value))
    }

    fn expr_stmt(&mut self) -> Result<Stmt, Error> {
        let expr = self.expression()?;
        if self.matches(&Token::Char('=')) {
            let value = self.expression()?;
            self.expect(Token::Newline)?;
            return match expr {
                Expr::Variable(name) => Ok(Stmt::Assign(name, value)),
                Expr::Get(object, field) => Ok(Stmt::Set(*object, field, value)),
                _ => Err(Error::InvalidAssignment),
            };
        }
        self.expect(Token::Newline)?;
        Ok(Stmt::Expr(expr))
    }

    fn suite(&mut self) -> Result<Vec<Stmt>, Error> {
        self.expect(Token::Newline)?;
        self.expect(Token::Indent)?;
        let mut stmts = Vec::new();
        loop {
            if self.matches(&Token::Dedent) {
                break;
            }
            if self.matches(&Token::Newline) {
                continue;
            }
            if self.check(&Token::Eof) {
                return Err(Error::UnexpectedToken(Token::Eof));
            }
            stmts.push(self.statement()?);
        }
        Ok(stmts)
    }

    fn expression(&mut self) -> Result<Expr, Error> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Expr, Error> {
        let mut expr = self.and_expr()?;
        while self.matches(&Token::Or) {
            let rhs = self.and_expr()?;
            expr = Expr::Logical(Box::new(expr), LogicalOp::Or, Box::new(rhs));
        }
        Ok(expr)
    }

    fn and_expr(&mut self) -> Result<Expr, Error> {
        let mut expr = self.not_expr()?;
        while self.matches(&Token::And) {
            let rhs = self.not_expr()?;
            expr = Expr::Logical(Box::new(expr), LogicalOp::And, Box::new(rhs));
        }
        Ok(expr)
    }

    fn not_expr(&mut self) -> Result<Expr, Error> {
        if self.matches(&Token::Not) {
            let operand = self.not_expr()?;
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(operand)));
        }
        self.comparison()
    }

    // Comparisons do not chain: `a < b < c` is a parse error at the second
    // operator.
    fn comparison(&mut self) -> Result<Expr, Error> {
        let lhs = self.addition()?;
        let op = match self.lexer.current_token() {
            Token::Eq => Some(BinaryOp::EqualEqual),
            Token::NotEq => Some(BinaryOp::NotEqual),
            Token::LessOrEq => Some(BinaryOp::LessEqual),
            Token::GreaterOrEq => Some(BinaryOp::GreaterEqual),
            Token::Char('<') => Some(BinaryOp::Less),
            Token::Char('>') => Some(BinaryOp::Greater),
            _ => None,
        };
        match op {
            Some(op) => {
                self.lexer.next_token();
                let rhs = self.addition()?;
                Ok(Expr::Binary(Box::new(lhs), op, Box::new(rhs)))
            }
            None => Ok(lhs),
        }
    }

    fn addition(&mut self) -> Result<Expr, Error> {
        let mut expr = self.mult()?;
        loop {
            let op = match self.lexer.current_token() {
                Token::Char('+') => BinaryOp::Plus,
                Token::Char('-') => BinaryOp::Minus,
                _ => break,
            };
            self.lexer.next_token();
            let rhs = self.mult()?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(rhs));
        }
        Ok(expr)
    }

    fn mult(&mut self) -> Result<Expr, Error> {
        let mut expr = self.unary()?;
        loop {
            let op = match self.lexer.current_token() {
                Token::Char('*') => BinaryOp::Star,
                Token::Char('/') => BinaryOp::Slash,
                _ => break,
            };
            self.lexer.next_token();
            let rhs = self.unary()?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(rhs));
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, Error> {
        if self.matches(&Token::Char('-')) {
            let operand = self.unary()?;
            return Ok(Expr::Unary(UnaryOp::Minus, Box::new(operand)));
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, Error> {
        let mut expr = self.primary()?;
        loop {
            if self.matches(&Token::Char('.')) {
                let name = self.expect_id()?;
                if self.matches(&Token::Char('(')) {
                    let args = self.arguments()?;
                    expr = Expr::MethodCall(Box::new(expr), name, args);
                } else {
                    expr = Expr::Get(Box::new(expr), name);
                }
            } else if self.matches(&Token::Char('(')) {
                let args = self.arguments()?;
                expr = Expr::Call(Box::new(expr), args);
            } else {
                break;
            }
        }
        Ok(expr)
    }

    // The opening parenthesis is already consumed.
    fn arguments(&mut self) -> Result<Vec<Expr>, Error> {
        let mut args = Vec::new();
        if !self.check(&Token::Char(')')) {
            args.push(self.expression()?);
            while self.matches(&Token::Char(',')) {
                args.push(self.expression()?);
            }
        }
        self.expect(Token::Char(')'))?;
        Ok(args)
    }

    fn primary(&mut self) -> Result<Expr, Error> {
        let expr = match self.lexer.current_token() {
            Token::Number(n) => Expr::Literal(Literal::Number(*n)),
            Token::String(s) => Expr::Literal(Literal::Str(s.clone())),
            Token::True => Expr::Literal(Literal::True),
            Token::False => Expr::Literal(Literal::False),
            Token::None => Expr::Literal(Literal::None),
            Token::Id(name) => Expr::Variable(name.clone()),
            Token::Char('(') => {
                self.lexer.next_token();
                let inner = self.expression()?;
                self.expect(Token::Char(')'))?;
                return Ok(inner);
            }
            other => return Err(Error::UnexpectedToken(other.clone())),
        };
        self.lexer.next_token();
        Ok(expr)
    }

    fn check(&self, token: &Token) -> bool {
        self.lexer.current_token() == token
    }

    fn matches(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.lexer.next_token();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), Error> {
        if self.check(&expected) {
            self.lexer.next_token();
            return Ok(());
        }
        Err(Error::TokenMismatch {
            expected,
            found: self.lexer.current_token().clone(),
        })
    }

    fn expect_id(&mut self) -> Result<String, Error> {
        match self.lexer.current_token() {
            Token::Id(name) => {
                let name = name.clone();
                self.lexer.next_token();
                Ok(name)
            }
            other => Err(Error::ExpectedIdentifier {
                found: other.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment_and_expression() {
        let stmts = parse("x = 1\nx\n").unwrap();
        assert_eq!(stmts.len(), 2);
        assert!(matches!(
            &stmts[0],
            Stmt::Assign(name, Expr::Literal(Literal::Number(1))) if name == "x"
        ));
        assert!(matches!(&stmts[1], Stmt::Expr(Expr::Variable(name)) if name == "x"));
    }

    #[test]
    fn test_parse_field_assignment() {
        let stmts = parse("p.x = 2\n").unwrap();
        assert!(matches!(
            &stmts[0],
            Stmt::Set(Expr::Variable(object), field, Expr::Literal(Literal::Number(2)))
                if object == "p" && field == "x"
        ));
    }

    #[test]
    fn test_parse_class_with_methods() {
        let source = "class Rect(Shape):\n\
                      \x20 def __init__(self, w, h):\n\
                      \x20   self.w = w\n\
                      \x20   self.h = h\n\
                      \x20 def area(self):\n\
                      \x20   return self.w * self.h\n";
        let stmts = parse(source).unwrap();
        assert_eq!(stmts.len(), 1);
        match &stmts[0] {
            Stmt::ClassDecl(decl) => {
                assert_eq!(decl.name, "Rect");
                assert_eq!(decl.superclass.as_deref(), Some("Shape"));
                assert_eq!(decl.methods.len(), 2);
                assert_eq!(decl.methods[0].name, "__init__");
                assert_eq!(decl.methods[0].params, vec!["w", "h"]);
                assert_eq!(decl.methods[1].name, "area");
                assert!(decl.methods[1].params.is_empty());
            }
            other => panic!("expected a class declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_if_else() {
        let source = "if x < 1:\n\
                      \x20 print x\n\
                      else:\n\
                      \x20 print 0\n";
        let stmts = parse(source).unwrap();
        match &stmts[0] {
            Stmt::If(cond, then_branch, else_branch) => {
                assert!(matches!(cond, Expr::Binary(_, BinaryOp::Less, _)));
                assert_eq!(then_branch.len(), 1);
                assert_eq!(else_branch.len(), 1);
            }
            other => panic!("expected an if statement, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_precedence() {
        let stmts = parse("print 1 + 2 * 3\n").unwrap();
        match &stmts[0] {
            Stmt::Print(args) => match &args[0] {
                Expr::Binary(lhs, BinaryOp::Plus, rhs) => {
                    assert!(matches!(**lhs, Expr::Literal(Literal::Number(1))));
                    assert!(matches!(**rhs, Expr::Binary(_, BinaryOp::Star, _)));
                }
                other => panic!("expected addition at the top, got {:?}", other),
            },
            other => panic!("expected a print statement, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_logical_wraps_comparison() {
        let stmts = parse("x = not a == b and c\n").unwrap();
        match &stmts[0] {
            Stmt::Assign(_, Expr::Logical(lhs, LogicalOp::And, _)) => {
                assert!(matches!(**lhs, Expr::Unary(UnaryOp::Not, _)));
            }
            other => panic!("expected and at the top, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_method_call_chain() {
        let stmts = parse("a.b.c(1).d\n").unwrap();
        match &stmts[0] {
            Stmt::Expr(Expr::Get(inner, field)) => {
                assert_eq!(field, "d");
                assert!(matches!(**inner, Expr::MethodCall(_, _, _)));
            }
            other => panic!("expected a field access, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_constructor_call() {
        let stmts = parse("p = Point(1, 2)\n").unwrap();
        match &stmts[0] {
            Stmt::Assign(_, Expr::Call(callee, args)) => {
                assert!(matches!(**callee, Expr::Variable(ref name) if name == "Point"));
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected a call, got {:?}", other),
        }
    }

    #[test]
    fn test_method_requires_self() {
        let source = "class C:\n\
                      \x20 def m(this):\n\
                      \x20   return 0\n";
        assert_eq!(
            parse(source),
            Err(Error::MethodWithoutSelf {
                method: "m".to_string(),
                found: "this".to_string(),
            })
        );
    }

    #[test]
    fn test_invalid_assignment_target() {
        assert_eq!(parse("1 = 2\n"), Err(Error::InvalidAssignment));
    }

    #[test]
    fn test_missing_colon_reports_mismatch() {
        let err = parse("if x\n  print x\n").unwrap_err();
        assert_eq!(
            err,
            Error::TokenMismatch {
                expected: Token::Char(':'),
                found: Token::Newline,
            }
        );
    }

    #[test]
    fn test_chained_comparison_is_rejected() {
        let err = parse("a < b < c\n").unwrap_err();
        assert_eq!(
            err,
            Error::TokenMismatch {
                expected: Token::Newline,
                found: Token::Char('<'),
            }
        );
    }

    #[test]
    fn test_unterminated_suite() {
        assert_eq!(
            parse("if x:\n"),
            Err(Error::TokenMismatch {
                expected: Token::Indent,
                found: Token::Eof,
            })
        );
    }
}
