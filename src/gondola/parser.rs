//! Recursive-descent parser for the Gondola surface syntax.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! expr    := and ("or" and)*
//! and     := cmp ("and" cmp)*
//! cmp     := add (("<" | ">" | "<=" | ">=" | "==" | "!=") add)?
//! add     := mul (("+" | "-") mul)*
//! mul     := unary (("*" | "/") unary)*
//! unary   := "-" unary | atom
//! atom    := number | "true" | "false" | "(" expr ")"
//!          | "not" "(" expr ")"
//!          | "if" "(" expr ")" "{" expr "}" "else" "{" expr "}"
//!          | name "(" args ")" | name
//! ```

use super::expression::{BinaryOp, CalendarField, Expression, UnaryOp, WindowStat};
use super::variables::Variables;
use crate::error::{GondolaError, Result};
use crate::types::QuoteKind;

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Integer(i64),
    Float(f64),
    Ident(String),
    Str(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    Ne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    span: Span,
}

fn line_col(input: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for b in input.as_bytes().iter().take(offset.min(input.len())) {
        if *b == b'\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

fn parse_error(input: &str, offset: usize, msg: impl AsRef<str>) -> GondolaError {
    let (line, col) = line_col(input, offset);
    GondolaError::Parse(format!("line {}, col {}: {}", line, col, msg.as_ref()))
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let start = i;
        if i + 1 < bytes.len() {
            let two = match &bytes[i..i + 2] {
                b"<=" => Some(TokenKind::Le),
                b">=" => Some(TokenKind::Ge),
                b"==" => Some(TokenKind::EqEq),
                b"!=" => Some(TokenKind::Ne),
                _ => None,
            };
            if let Some(kind) = two {
                i += 2;
                tokens.push(Token { kind, span: Span { start, end: i } });
                continue;
            }
        }

        let kind = match b {
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b',' => TokenKind::Comma,
            b'<' => TokenKind::Lt,
            b'>' => TokenKind::Gt,
            b'"' => {
                let close = input[i + 1..]
                    .find('"')
                    .ok_or_else(|| parse_error(input, i, "unterminated string"))?;
                let text = input[i + 1..i + 1 + close].to_string();
                i += close + 2;
                tokens.push(Token {
                    kind: TokenKind::Str(text),
                    span: Span { start, end: i },
                });
                continue;
            }
            _ if b.is_ascii_digit() || b == b'.' => {
                let mut is_float = false;
                while i < bytes.len() {
                    let c = bytes[i];
                    if c.is_ascii_digit() {
                        i += 1;
                    } else if c == b'.' || c == b'e' || c == b'E' {
                        is_float = true;
                        i += 1;
                    } else if (c == b'+' || c == b'-') && matches!(bytes[i - 1], b'e' | b'E') {
                        i += 1;
                    } else {
                        break;
                    }
                }
                let text = &input[start..i];
                let kind = if is_float {
                    text.parse::<f64>().map(TokenKind::Float).ok()
                } else {
                    text.parse::<i64>().map(TokenKind::Integer).ok()
                };
                let kind = kind.ok_or_else(|| {
                    parse_error(input, start, format!("invalid number '{}'", text))
                })?;
                tokens.push(Token { kind, span: Span { start, end: i } });
                continue;
            }
            _ if b.is_ascii_alphabetic() || b == b'_' => {
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Ident(input[start..i].to_string()),
                    span: Span { start, end: i },
                });
                continue;
            }
            _ => {
                let ch = input[i..].chars().next().unwrap_or('?');
                return Err(parse_error(input, i, format!("unexpected character '{}'", ch)));
            }
        };
        i += 1;
        tokens.push(Token { kind, span: Span { start, end: i } });
    }

    Ok(tokens)
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    variables: &'a Variables,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(TokenKind::Ident(name)) if name == keyword)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.span.start)
            .unwrap_or(self.input.len())
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: TokenKind, what: &str) -> Result<()> {
        let offset = self.offset();
        match self.advance() {
            Some(token) if token.kind == expected => Ok(()),
            Some(token) => Err(parse_error(
                self.input,
                offset,
                format!("expected {}, got {:?}", what, token.kind),
            )),
            None => Err(parse_error(
                self.input,
                offset,
                format!("expected {}, got end of input", what),
            )),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if self.peek_keyword(keyword) {
            self.pos += 1;
            Ok(())
        } else {
            Err(parse_error(self.input, self.offset(), format!("expected '{}'", keyword)))
        }
    }

    fn parse_or(&mut self) -> Result<Expression> {
        let mut lhs = self.parse_and()?;
        while self.peek_keyword("or") {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Expression::binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expression> {
        let mut lhs = self.parse_cmp()?;
        while self.peek_keyword("and") {
            self.advance();
            let rhs = self.parse_cmp()?;
            lhs = Expression::binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_cmp(&mut self) -> Result<Expression> {
        let lhs = self.parse_add()?;
        let op = match self.peek() {
            Some(TokenKind::Lt) => BinaryOp::LessThan,
            Some(TokenKind::Gt) => BinaryOp::GreaterThan,
            Some(TokenKind::Le) => BinaryOp::LessEqual,
            Some(TokenKind::Ge) => BinaryOp::GreaterEqual,
            Some(TokenKind::EqEq) => BinaryOp::Equal,
            Some(TokenKind::Ne) => BinaryOp::NotEqual,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.parse_add()?;
        Ok(Expression::binary(op, lhs, rhs))
    }

    fn parse_add(&mut self) -> Result<Expression> {
        let mut lhs = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Subtract,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_mul()?;
            lhs = Expression::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_mul(&mut self) -> Result<Expression> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Star) => BinaryOp::Multiply,
                Some(TokenKind::Slash) => BinaryOp::Divide,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expression::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        if self.peek() != Some(&TokenKind::Minus) {
            return self.parse_atom();
        }
        self.advance();
        // A minus directly before a number is part of the literal.
        match self.peek() {
            Some(TokenKind::Integer(value)) => {
                let value = -*value;
                self.advance();
                Ok(Expression::Integer(value))
            }
            Some(TokenKind::Float(value)) => {
                let value = -*value;
                self.advance();
                Ok(Expression::Float(value))
            }
            _ => Ok(Expression::negate(self.parse_unary()?)),
        }
    }

    fn parse_atom(&mut self) -> Result<Expression> {
        let offset = self.offset();
        let token = self
            .advance()
            .ok_or_else(|| {
                parse_error(self.input, offset, "expected expression, got end of input")
            })?;

        match token.kind {
            TokenKind::Integer(value) => Ok(Expression::Integer(value)),
            TokenKind::Float(value) => Ok(Expression::Float(value)),
            TokenKind::LParen => {
                let inner = self.parse_or()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::Ident(name) => self.parse_name(&name, offset),
            other => Err(parse_error(
                self.input,
                offset,
                format!("expected number, name or '(', got {:?}", other),
            )),
        }
    }

    fn parse_name(&mut self, name: &str, offset: usize) -> Result<Expression> {
        match name {
            "true" => return Ok(Expression::Boolean(true)),
            "false" => return Ok(Expression::Boolean(false)),
            "if" => return self.parse_if(),
            _ => {}
        }

        if self.peek() != Some(&TokenKind::LParen) {
            if let Some(kind) = QuoteKind::from_name(name) {
                return Ok(Expression::Quote(kind));
            }
            return match self.variables.type_of(name) {
                Some(ty) => Ok(Expression::variable(name, ty)),
                None => Err(parse_error(
                    self.input,
                    offset,
                    format!("unknown variable '{}'", name),
                )),
            };
        }

        self.advance();
        let expr = if let Some(field) = CalendarField::from_name(name) {
            Expression::Calendar(field)
        } else if let Some(stat) = WindowStat::from_name(name) {
            let quote = self.parse_or()?;
            self.expect(TokenKind::Comma, "','")?;
            let period = self.parse_or()?;
            self.expect(TokenKind::Comma, "','")?;
            let lag = self.parse_or()?;
            Expression::window(stat, quote, period, lag)
        } else {
            match name {
                "not" => Expression::unary(UnaryOp::Not, self.parse_or()?),
                "abs" => Expression::unary(UnaryOp::Abs, self.parse_or()?),
                "sqrt" => Expression::unary(UnaryOp::Sqrt, self.parse_or()?),
                "lag" => {
                    let quote = self.parse_or()?;
                    self.expect(TokenKind::Comma, "','")?;
                    Expression::lag(quote, self.parse_or()?)
                }
                "corr" => {
                    let quote = self.parse_or()?;
                    self.expect(TokenKind::Comma, "','")?;
                    let partner_offset = self.offset();
                    let partner = match self.advance().map(|t| t.kind) {
                        Some(TokenKind::Str(text)) => text,
                        _ => {
                            return Err(parse_error(
                                self.input,
                                partner_offset,
                                "expected quoted symbol for 'corr'",
                            ))
                        }
                    };
                    self.expect(TokenKind::Comma, "','")?;
                    let period = self.parse_or()?;
                    self.expect(TokenKind::Comma, "','")?;
                    Expression::correlation(quote, partner, period, self.parse_or()?)
                }
                _ => {
                    return Err(parse_error(
                        self.input,
                        offset,
                        format!("unknown function '{}'", name),
                    ))
                }
            }
        };
        self.expect(TokenKind::RParen, "')'")?;
        Ok(expr)
    }

    fn parse_if(&mut self) -> Result<Expression> {
        self.expect(TokenKind::LParen, "'('")?;
        let condition = self.parse_or()?;
        self.expect(TokenKind::RParen, "')'")?;
        self.expect(TokenKind::LBrace, "'{'")?;
        let then = self.parse_or()?;
        self.expect(TokenKind::RBrace, "'}'")?;
        self.expect_keyword("else")?;
        self.expect(TokenKind::LBrace, "'{'")?;
        let otherwise = self.parse_or()?;
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(Expression::if_else(condition, then, otherwise))
    }
}

impl Expression {
    /// Parses Gondola text. Bare names that are not quote kinds must be
    /// declared in `variables`.
    pub fn parse(text: &str, variables: &Variables) -> Result<Expression> {
        let tokens = tokenize(text)?;
        let mut parser = Parser {
            input: text,
            tokens,
            pos: 0,
            variables,
        };
        let expr = parser.parse_or()?;
        if parser.pos < parser.tokens.len() {
            return Err(parse_error(text, parser.offset(), "unexpected trailing input"));
        }
        Ok(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    fn variables() -> Variables {
        let mut variables = Variables::new();
        for name in ["a", "b", "x", "y"] {
            variables.add(name, Type::Integer, true).unwrap();
        }
        variables.add("p", Type::Boolean, true).unwrap();
        variables
    }

    fn parse(text: &str) -> Expression {
        Expression::parse(text, &variables()).unwrap()
    }

    #[test]
    fn test_commutative_operators_equal() {
        assert_eq!(parse("a+b"), parse("b+a"));
        assert_eq!(parse("a*b"), parse("b*a"));
        assert_ne!(parse("a+b"), parse("a-b"));
        assert_ne!(parse("a-b"), parse("b-a"));
    }

    #[test]
    fn test_precedence() {
        assert_eq!(parse("a+b*x").to_string(), "a+b*x");
        assert_eq!(parse("(a+b)*x").to_string(), "(a+b)*x");
        let expr = parse("a > 1 and b < 2 or p");
        assert!(matches!(expr, Expression::Binary { op: BinaryOp::Or, .. }));
    }

    #[test]
    fn test_negative_literal() {
        assert_eq!(parse("-5"), Expression::Integer(-5));
        assert_eq!(parse("avg(close, 5, -1)").to_string(), "avg(close, 5, -1)");
        assert!(matches!(parse("-x"), Expression::Unary { op: UnaryOp::Negate, .. }));
    }

    #[test]
    fn test_round_trip_of_canonical_text() {
        for text in [
            "lag(close, -1)>avg(close, 5, -1)",
            "if(p) {x} else {y+1}",
            "not(x>y) or p",
            "corr(close, \"CBA\", 30, 0)>0.5",
            "dayofweek()==2 and held>5",
            "x-(-5)",
            "rsi(close, 14, 0)<30.0",
        ] {
            let mut vars = variables();
            vars.add("held", Type::Integer, true).unwrap();
            let expr = Expression::parse(text, &vars).unwrap();
            assert_eq!(expr.to_string(), text);
            assert_eq!(Expression::parse(&expr.to_string(), &vars).unwrap(), expr);
        }
    }

    #[test]
    fn test_unknown_variable_rejected() {
        let err = Expression::parse("zz > 1", &variables()).unwrap_err();
        assert!(err.to_string().contains("unknown variable 'zz'"));
    }

    #[test]
    fn test_error_reports_position() {
        let err = Expression::parse("a +\n  )", &variables()).unwrap_err();
        assert!(err.to_string().contains("line 2, col 3"), "{}", err);
    }

    #[test]
    fn test_trailing_input_rejected() {
        assert!(Expression::parse("a b", &variables()).is_err());
        assert!(Expression::parse("avg(close, 5)", &variables()).is_err());
    }
}
