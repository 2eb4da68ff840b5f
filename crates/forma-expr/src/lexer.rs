use crate::error::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    True,
    False,
    Null,
    LParen,
    RParen,
    Comma,
    Dot,
    Question,
    Colon,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Eof,
}

/// A token plus the byte offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub pos: usize,
}

pub(crate) fn tokenize(src: &str) -> Result<Vec<Spanned>, EvalError> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let start = i;
        let token = match c {
            b'0'..=b'9' => {
                let (n, end) = lex_number(src, i)?;
                i = end;
                Token::Number(n)
            }
            b'.' if bytes.get(i + 1).is_some_and(u8::is_ascii_digit) => {
                let (n, end) = lex_number(src, i)?;
                i = end;
                Token::Number(n)
            }
            b'"' | b'\'' => {
                let (s, end) = lex_string(src, i)?;
                i = end;
                Token::Str(s)
            }
            c if is_ident_start(c) => {
                let end = bytes[i..]
                    .iter()
                    .position(|b| !is_ident_continue(*b))
                    .map_or(bytes.len(), |n| i + n);
                let word = &src[i..end];
                i = end;
                match word {
                    "true" => Token::True,
                    "false" => Token::False,
                    "null" | "undefined" => Token::Null,
                    _ => Token::Ident(word.to_string()),
                }
            }
            _ => {
                let (token, len) = lex_punct(bytes, i)?;
                i += len;
                token
            }
        };
        tokens.push(Spanned { token, pos: start });
    }

    tokens.push(Spanned {
        token: Token::Eof,
        pos: src.len(),
    });
    Ok(tokens)
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'$'
}

fn is_ident_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'$'
}

fn lex_punct(bytes: &[u8], i: usize) -> Result<(Token, usize), EvalError> {
    let next = bytes.get(i + 1).copied();
    let after = bytes.get(i + 2).copied();
    let pair = |single: Token, double: Token| {
        if next == Some(b'=') {
            (double, 2)
        } else {
            (single, 1)
        }
    };

    let out = match bytes[i] {
        b'(' => (Token::LParen, 1),
        b')' => (Token::RParen, 1),
        b',' => (Token::Comma, 1),
        b'.' => (Token::Dot, 1),
        b'?' => (Token::Question, 1),
        b':' => (Token::Colon, 1),
        b'+' => (Token::Plus, 1),
        b'-' => (Token::Minus, 1),
        b'*' => (Token::Star, 1),
        b'/' => (Token::Slash, 1),
        b'%' => (Token::Percent, 1),
        b'<' => pair(Token::Lt, Token::Le),
        b'>' => pair(Token::Gt, Token::Ge),
        // `===` and `!==` are accepted as spellings of `==` and `!=`.
        b'=' if next == Some(b'=') => (Token::EqEq, if after == Some(b'=') { 3 } else { 2 }),
        b'!' if next == Some(b'=') => (Token::NotEq, if after == Some(b'=') { 3 } else { 2 }),
        b'!' => (Token::Bang, 1),
        b'&' if next == Some(b'&') => (Token::AndAnd, 2),
        b'|' if next == Some(b'|') => (Token::OrOr, 2),
        b'=' => return Err(EvalError::syntax(i, "assignment is not allowed")),
        other => {
            return Err(EvalError::syntax(
                i,
                format!("unexpected character {:?}", other as char),
            ));
        }
    };
    Ok(out)
}

fn lex_number(src: &str, start: usize) -> Result<(f64, usize), EvalError> {
    let bytes = src.as_bytes();
    let mut i = start;
    let digits = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };

    i = digits(i);
    if bytes.get(i) == Some(&b'.') && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
        i = digits(i + 1);
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        if bytes.get(j).is_some_and(u8::is_ascii_digit) {
            i = digits(j);
        }
    }

    let text = &src[start..i];
    text.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(|n| (n, i))
        .ok_or_else(|| EvalError::syntax(start, format!("invalid number {text:?}")))
}

fn lex_string(src: &str, start: usize) -> Result<(String, usize), EvalError> {
    let quote = src.as_bytes()[start] as char;
    let mut out = String::new();
    let mut chars = src[start + 1..].char_indices();

    while let Some((offset, c)) = chars.next() {
        match c {
            c if c == quote => return Ok((out, start + 1 + offset + 1)),
            '\\' => {
                let Some((_, escaped)) = chars.next() else {
                    break;
                };
                out.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '0' => '\0',
                    other => other,
                });
            }
            c => out.push(c),
        }
    }
    Err(EvalError::syntax(start, "unterminated string"))
}
