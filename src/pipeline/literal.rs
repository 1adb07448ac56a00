//! Permissive literal-structure parser.
//!
//! Models that "almost" produce JSON usually slip into scripting-language
//! literal syntax: single-quoted strings, `True`/`False`/`None`, trailing
//! commas, tuples, the odd `#` comment. This parser accepts that superset
//! and produces an ordinary [`serde_json::Value`], so the rest of the
//! pipeline never sees the difference.
//!
//! Accepted grammar (whitespace and `#` line comments allowed between tokens):
//!
//! ```text
//! value  := object | array | tuple | string+ | number | keyword
//! object := '{' [ key ':' value { ',' key ':' value } [','] ] '}'
//! array  := '[' [ value { ',' value } [','] ] ']'
//! tuple  := '(' [ value { ',' value } [','] ] ')'
//! key    := string+ | number | keyword          (stored as its text)
//! keyword:= true | false | null | True | False | None
//! ```
//!
//! Adjacent string literals concatenate (`'a' "b"` → `"ab"`). The whole input
//! must be consumed; anything else is an error.

use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Nesting limit; deeper input is rejected rather than risking the stack.
const MAX_DEPTH: usize = 128;

/// Why a literal could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid literal at byte {offset}: {reason}")]
pub struct LiteralError {
    pub offset: usize,
    pub reason: String,
}

/// Parse `input` as a permissive literal structure.
pub fn parse_literal(input: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser {
        src: input,
        pos: 0,
        depth: 0,
    };
    let value = parser.value()?;
    parser.skip_trivia();
    if parser.pos < parser.src.len() {
        return Err(parser.error("unexpected trailing content"));
    }
    Ok(value)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, reason: impl Into<String>) -> LiteralError {
        LiteralError {
            offset: self.pos,
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn expect(&mut self, expected: char) -> Result<(), LiteralError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += c.len_utf8();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    /// Skip whitespace and `#` comments.
    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else if c == '#' {
                match self.src[self.pos..].find('\n') {
                    Some(nl) => self.pos += nl + 1,
                    None => self.pos = self.src.len(),
                }
            } else {
                break;
            }
        }
    }

    fn value(&mut self) -> Result<Value, LiteralError> {
        self.skip_trivia();
        match self.peek() {
            Some('{') => self.nested(|p| p.object()),
            Some('[') => self.nested(|p| p.sequence('[', ']')),
            Some('(') => self.nested(|p| p.sequence('(', ')')),
            Some('\'') | Some('"') => self.strings().map(Value::String),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.keyword(),
            Some(c) => Err(self.error(format!("unexpected character '{c}'"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn nested(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<Value, LiteralError>,
    ) -> Result<Value, LiteralError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn object(&mut self) -> Result<Value, LiteralError> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_trivia();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(Value::Object(map));
            }
            let key = self.key()?;
            self.skip_trivia();
            self.expect(':')?;
            let value = self.value()?;
            map.insert(key, value);
            self.skip_trivia();
            match self.bump() {
                Some(',') => continue,
                Some('}') => return Ok(Value::Object(map)),
                Some(c) => return Err(self.error(format!("expected ',' or '}}', found '{c}'"))),
                None => return Err(self.error("unterminated object")),
            }
        }
    }

    fn key(&mut self) -> Result<String, LiteralError> {
        match self.value()? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Null => Ok("null".to_string()),
            Value::Array(_) | Value::Object(_) => Err(self.error("object keys must be scalars")),
        }
    }

    fn sequence(&mut self, open: char, close: char) -> Result<Value, LiteralError> {
        self.expect(open)?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            if self.peek() == Some(close) {
                self.bump();
                return Ok(Value::Array(items));
            }
            items.push(self.value()?);
            self.skip_trivia();
            match self.bump() {
                Some(',') => continue,
                Some(c) if c == close => return Ok(Value::Array(items)),
                Some(c) => {
                    return Err(self.error(format!("expected ',' or '{close}', found '{c}'")))
                }
                None => return Err(self.error("unterminated sequence")),
            }
        }
    }

    /// One or more adjacent string literals, concatenated.
    fn strings(&mut self) -> Result<String, LiteralError> {
        let mut out = self.string()?;
        loop {
            let save = self.pos;
            self.skip_trivia();
            match self.peek() {
                Some('\'') | Some('"') => out.push_str(&self.string()?),
                _ => {
                    self.pos = save;
                    return Ok(out);
                }
            }
        }
    }

    fn string(&mut self) -> Result<String, LiteralError> {
        let quote = self
            .bump()
            .ok_or_else(|| self.error("expected string"))?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => out.push(self.escape()?),
                Some(c) => out.push(c),
            }
        }
    }

    fn escape(&mut self) -> Result<char, LiteralError> {
        let c = self
            .bump()
            .ok_or_else(|| self.error("unterminated escape"))?;
        Ok(match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{08}',
            'f' => '\u{0C}',
            '0' => '\0',
            '/' => '/',
            '\\' | '\'' | '"' => c,
            'x' => self.hex_escape(2)?,
            'u' => self.unicode_escape()?,
            // Unknown escapes keep the character, as lenient parsers do.
            other => other,
        })
    }

    fn hex_digits(&mut self, len: usize) -> Result<u32, LiteralError> {
        let end = self.pos + len;
        let digits = self
            .src
            .get(self.pos..end)
            .ok_or_else(|| self.error("truncated escape"))?;
        let code =
            u32::from_str_radix(digits, 16).map_err(|_| self.error("invalid hex escape"))?;
        self.pos = end;
        Ok(code)
    }

    fn hex_escape(&mut self, len: usize) -> Result<char, LiteralError> {
        let code = self.hex_digits(len)?;
        char::from_u32(code).ok_or_else(|| self.error("invalid escaped code point"))
    }

    /// `\uXXXX`, joining UTF-16 surrogate pairs the way JSON encodes them.
    fn unicode_escape(&mut self) -> Result<char, LiteralError> {
        let high = self.hex_digits(4)?;
        if (0xD800..0xDC00).contains(&high) && self.src[self.pos..].starts_with("\\u") {
            self.pos += 2;
            let low = self.hex_digits(4)?;
            if (0xDC00..0xE000).contains(&low) {
                let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                return char::from_u32(code).ok_or_else(|| self.error("invalid surrogate pair"));
            }
            return Err(self.error("unpaired surrogate"));
        }
        char::from_u32(high).ok_or_else(|| self.error("invalid escaped code point"))
    }

    fn number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        if matches!(self.peek(), Some('-') | Some('+')) {
            self.bump();
        }
        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' | '_' => {}
                '.' | 'e' | 'E' => is_float = true,
                '-' | '+' if matches!(self.src[..self.pos].chars().last(), Some('e' | 'E')) => {}
                _ => break,
            }
            self.bump();
        }
        let text: String = self.src[start..self.pos].chars().filter(|&c| c != '_').collect();
        let text = text.strip_prefix('+').unwrap_or(&text);

        if !is_float {
            if let Ok(n) = text.parse::<i64>() {
                return Ok(Value::Number(n.into()));
            }
            if let Ok(n) = text.parse::<u64>() {
                return Ok(Value::Number(n.into()));
            }
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| LiteralError {
                offset: start,
                reason: format!("invalid number '{text}'"),
            })
    }

    fn keyword(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        match &self.src[start..self.pos] {
            "true" | "True" => Ok(Value::Bool(true)),
            "false" | "False" => Ok(Value::Bool(false)),
            "null" | "None" => Ok(Value::Null),
            word => Err(LiteralError {
                offset: start,
                reason: format!("unknown identifier '{word}'"),
            }),
        }
    }
}
