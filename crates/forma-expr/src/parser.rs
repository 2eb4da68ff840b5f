use forma_schema::FieldValue;

use crate::ast::{BinaryOp, Expr, LogicalOp, UnaryOp};
use crate::error::EvalError;
use crate::lexer::{Spanned, Token, tokenize};

/// Name of the only namespace a formula can reach besides its context.
pub(crate) const HELPERS: &str = "helpers";

type Level = fn(&mut Parser) -> Result<Expr, EvalError>;

/// Parse a whole formula. Trailing input is an error.
pub(crate) fn parse(src: &str, max_depth: usize) -> Result<Expr, EvalError> {
    let mut parser = Parser {
        tokens: tokenize(src)?,
        pos: 0,
        depth: 0,
        max_depth,
    };
    let expr = parser.expr()?;
    match parser.peek() {
        Token::Eof => Ok(expr),
        other => Err(EvalError::syntax(
            parser.offset(),
            format!("unexpected {} after expression", describe(other)),
        )),
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos].token
    }

    fn offset(&self) -> usize {
        self.tokens[self.pos].pos
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].token.clone();
        if token != Token::Eof {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), EvalError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(EvalError::syntax(
                self.offset(),
                format!("expected {what}, found {}", describe(self.peek())),
            ))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, EvalError> {
        match self.peek() {
            Token::Ident(_) => match self.advance() {
                Token::Ident(name) => Ok(name),
                _ => unreachable!("peeked an identifier"),
            },
            other => Err(EvalError::syntax(
                self.offset(),
                format!("expected {what}, found {}", describe(other)),
            )),
        }
    }

    /// Runs `f` one nesting level deeper, failing once the limit is passed.
    fn nested(&mut self, f: Level) -> Result<Expr, EvalError> {
        self.descend()?;
        let out = f(self);
        self.depth -= 1;
        out
    }

    /// One level deeper. Chained operators and property accesses each count
    /// as a level, since every link adds one to the height of the tree.
    fn descend(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(EvalError::TooDeep {
                max: self.max_depth,
            });
        }
        Ok(())
    }

    // ── Precedence levels, lowest first ─────────────────────────

    fn expr(&mut self) -> Result<Expr, EvalError> {
        self.nested(Parser::conditional)
    }

    fn conditional(&mut self) -> Result<Expr, EvalError> {
        let cond = self.logical_or()?;
        if !self.eat(&Token::Question) {
            return Ok(cond);
        }
        let then = self.expr()?;
        self.expect(Token::Colon, "':' in conditional")?;
        let otherwise = self.expr()?;
        Ok(Expr::Conditional {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn logical_or(&mut self) -> Result<Expr, EvalError> {
        self.logical(Token::OrOr, LogicalOp::Or, Parser::logical_and)
    }

    fn logical_and(&mut self) -> Result<Expr, EvalError> {
        self.logical(Token::AndAnd, LogicalOp::And, Parser::equality)
    }

    fn logical(&mut self, token: Token, op: LogicalOp, next: Level) -> Result<Expr, EvalError> {
        let base = self.depth;
        let mut left = next(self)?;
        while self.eat(&token) {
            self.descend()?;
            let right = next(self)?;
            left = Expr::Logical {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = base;
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr, EvalError> {
        self.binary(
            &[(Token::EqEq, BinaryOp::Eq), (Token::NotEq, BinaryOp::Ne)],
            Parser::comparison,
        )
    }

    fn comparison(&mut self) -> Result<Expr, EvalError> {
        self.binary(
            &[
                (Token::Lt, BinaryOp::Lt),
                (Token::Le, BinaryOp::Le),
                (Token::Gt, BinaryOp::Gt),
                (Token::Ge, BinaryOp::Ge),
            ],
            Parser::additive,
        )
    }

    fn additive(&mut self) -> Result<Expr, EvalError> {
        self.binary(
            &[(Token::Plus, BinaryOp::Add), (Token::Minus, BinaryOp::Sub)],
            Parser::multiplicative,
        )
    }

    fn multiplicative(&mut self) -> Result<Expr, EvalError> {
        self.binary(
            &[
                (Token::Star, BinaryOp::Mul),
                (Token::Slash, BinaryOp::Div),
                (Token::Percent, BinaryOp::Rem),
            ],
            Parser::unary,
        )
    }

    /// Left-associative fold: `a-b-c` becomes `(a-b)-c`.
    fn binary(&mut self, table: &[(Token, BinaryOp)], next: Level) -> Result<Expr, EvalError> {
        let base = self.depth;
        let mut left = next(self)?;
        loop {
            let Some(op) = table
                .iter()
                .find(|(token, _)| token == self.peek())
                .map(|(_, op)| *op)
            else {
                break;
            };
            self.advance();
            self.descend()?;
            let right = next(self)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = base;
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, EvalError> {
        let op = match self.peek() {
            Token::Minus => UnaryOp::Neg,
            Token::Bang => UnaryOp::Not,
            _ => return self.postfix(),
        };
        self.advance();
        let operand = self.nested(Parser::unary)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn postfix(&mut self) -> Result<Expr, EvalError> {
        let base = self.depth;
        let mut expr = self.primary()?;
        loop {
            match self.peek() {
                Token::Dot => {
                    self.advance();
                    self.descend()?;
                    let name = self.expect_ident("property name")?;
                    expr = Expr::Property {
                        base: Box::new(expr),
                        name,
                    };
                }
                Token::LParen => {
                    return Err(EvalError::syntax(
                        self.offset(),
                        format!("only {HELPERS}.<name>(...) can be called"),
                    ));
                }
                _ => {
                    self.depth = base;
                    return Ok(expr);
                }
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, EvalError> {
        let pos = self.offset();
        match self.advance() {
            Token::Number(n) => Ok(Expr::Literal(FieldValue::Number(n))),
            Token::Str(s) => Ok(Expr::Literal(FieldValue::Text(s))),
            Token::True => Ok(Expr::Literal(FieldValue::Bool(true))),
            Token::False => Ok(Expr::Literal(FieldValue::Bool(false))),
            Token::Null => Ok(Expr::Literal(FieldValue::Null)),
            Token::LParen => {
                let inner = self.expr()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            // `helpers` shadows a context variable of the same name.
            Token::Ident(name) if name == HELPERS => self.helper_call(),
            Token::Ident(name) => Ok(Expr::Var(name)),
            other => Err(EvalError::syntax(
                pos,
                format!("expected expression, found {}", describe(&other)),
            )),
        }
    }

    /// `helpers` has already been consumed; parses `.name(arg, ...)`.
    fn helper_call(&mut self) -> Result<Expr, EvalError> {
        self.expect(Token::Dot, "'.' after helpers")?;
        let name = self.expect_ident("helper name")?;
        self.expect(Token::LParen, "'(' to call helper")?;

        let mut args = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                args.push(self.expr()?);
                if self.eat(&Token::RParen) {
                    break;
                }
                self.expect(Token::Comma, "',' or ')'")?;
            }
        }
        Ok(Expr::HelperCall { name, args })
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(n) => format!("number {n}"),
        Token::Str(s) => format!("string {s:?}"),
        Token::Ident(name) => format!("identifier {name}"),
        Token::Eof => "end of formula".to_string(),
        other => format!("{other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(src: &str) -> Expr {
        parse(src, 64).unwrap()
    }

    fn var(name: &str) -> Box<Expr> {
        Box::new(Expr::Var(name.into()))
    }

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::Literal(FieldValue::Number(n)))
    }

    #[test]
    fn precedence_mul_over_add() {
        assert_eq!(
            p("a + b * 2"),
            Expr::Binary {
                op: BinaryOp::Add,
                left: var("a"),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    left: var("b"),
                    right: num(2.0),
                }),
            }
        );
    }

    #[test]
    fn subtraction_is_left_associative() {
        assert_eq!(
            p("a - b - c"),
            Expr::Binary {
                op: BinaryOp::Sub,
                left: Box::new(Expr::Binary {
                    op: BinaryOp::Sub,
                    left: var("a"),
                    right: var("b"),
                }),
                right: var("c"),
            }
        );
    }

    #[test]
    fn parentheses_override_precedence() {
        assert!(matches!(
            p("(a + b) * 2"),
            Expr::Binary { op: BinaryOp::Mul, .. }
        ));
    }

    #[test]
    fn helper_call_with_args() {
        assert_eq!(
            p("helpers.getAge(dob)"),
            Expr::HelperCall {
                name: "getAge".into(),
                args: vec![Expr::Var("dob".into())],
            }
        );
    }

    #[test]
    fn conditional_and_logic() {
        let expr = p("age >= 18 && consent ? 'adult' : 'minor'");
        match expr {
            Expr::Conditional { cond, .. } => {
                assert!(matches!(*cond, Expr::Logical { op: LogicalOp::And, .. }));
            }
            other => panic!("expected Conditional, got {other:?}"),
        }
    }

    #[test]
    fn property_access() {
        assert_eq!(
            p("tags.length"),
            Expr::Property {
                base: var("tags"),
                name: "length".into(),
            }
        );
    }

    #[test]
    fn non_helper_call_rejected() {
        let err = parse("alert(1)", 64).unwrap_err();
        assert!(err.to_string().contains("can be called"), "{err}");
        assert!(parse("a.b(1)", 64).is_err());
    }

    #[test]
    fn bare_helpers_rejected() {
        assert!(parse("helpers", 64).is_err());
        assert!(parse("helpers.getAge", 64).is_err());
    }

    #[test]
    fn trailing_tokens_rejected() {
        let err = parse("a b", 64).unwrap_err();
        assert!(err.to_string().contains("after expression"), "{err}");
    }

    #[test]
    fn unbalanced_parens_rejected() {
        assert!(parse("(a + b", 64).is_err());
        assert!(parse("a + b)", 64).is_err());
        assert!(parse("", 64).is_err());
    }

    #[test]
    fn nesting_limit() {
        let deep = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(parse(&deep, 64), Err(EvalError::TooDeep { max: 64 }));
        let negs = format!("{}1", "-".repeat(100));
        assert_eq!(parse(&negs, 64), Err(EvalError::TooDeep { max: 64 }));
        assert!(parse("((1))", 64).is_ok());
    }

    #[test]
    fn operator_chains_count_toward_depth() {
        let chain = |op: &str, n: usize| format!("1{}", format!(" {op} 1").repeat(n));
        assert!(parse(&chain("+", 60), 64).is_ok());
        for op in ["+", "*", "==", "<", "&&", "||"] {
            assert_eq!(
                parse(&chain(op, 100), 64),
                Err(EvalError::TooDeep { max: 64 }),
                "{op}"
            );
        }
        let props = format!("tags{}", ".length".repeat(100));
        assert_eq!(parse(&props, 64), Err(EvalError::TooDeep { max: 64 }));
    }

    #[test]
    fn sibling_chains_do_not_accumulate() {
        // Depth is the height of the tree, not the operator count.
        let group = format!("({})", vec!["1"; 40].join(" + "));
        let src = vec![group; 3].join(" * ");
        assert!(parse(&src, 64).is_ok());
    }

    #[test]
    fn variables_are_collected_once() {
        let expr = p("a + b * a + helpers.getAge(c)");
        assert_eq!(expr.variables(), ["a", "b", "c"]);
    }
}
