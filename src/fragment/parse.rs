//! Reading implementor fragments.
//!
//! Two layouts are accepted. The legacy one declares an empty object and
//! assigns each crate separately:
//!
//! ```text
//! (function() {var implementors = {};
//! implementors['unicase'] = ["impl ... for UniCase",];
//! ...
//! ```
//!
//! Later generators put everything in the declaration, either as an object
//! or as a list of `[crate, items]` pairs:
//!
//! ```text
//! (function() {var implementors = {"unicase":["impl ... for UniCase"]};
//! (function() {var implementors = Object.fromEntries([["unicase",[["impl ... for UniCase",0,["unicase::UniCase"]]]]]);
//! ```
//!
//! Items are either the description string, an array whose first string is
//! the description, or an object carrying it in `text`.
//!
//! Only the literals are read; the surrounding registration code is ignored.

use crate::error::FragmentError;
use crate::types::ImplementorMap;
use regex::Regex;
use std::sync::LazyLock;

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:var|let|const)\s+implementors\s*=\s*").expect("valid declaration regex")
});

static FROM_ENTRIES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Object\.fromEntries\s*\(").expect("valid fromEntries regex"));

static ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^implementors\s*\[").expect("valid assignment regex"));

/// A JavaScript literal as far as fragments use them.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Literal {
    Str(String),
    Array(Vec<Literal>),
    Object(Vec<(String, Literal)>),
    /// Numbers, `null`, booleans and other bare words.
    Bare(String),
}

/// Parse a fragment script into its implementors mapping.
pub fn parse_fragment(source: &str) -> Result<ImplementorMap, FragmentError> {
    let declaration = DECLARATION
        .find(source)
        .ok_or(FragmentError::MissingDeclaration)?;

    let mut cursor = Cursor::new(source, declaration.end());
    let mut implementors = ImplementorMap::new();

    cursor.skip_trivia();
    if let Some(call) = FROM_ENTRIES.find(&source[cursor.pos..]) {
        cursor.pos += call.end();
        let start = cursor.pos;
        for (group, value) in entry_pairs(cursor.literal()?, start)? {
            implementors.insert(group, descriptions(value, start)?);
        }
        cursor.expect(')', "`)`")?;
    } else {
        let start = cursor.pos;
        match cursor.literal()? {
            Literal::Object(entries) => {
                for (group, value) in entries {
                    implementors.insert(group, descriptions(value, start)?);
                }
            }
            _ => {
                return Err(FragmentError::Unexpected {
                    expected: "object literal",
                    found: None,
                    offset: start,
                });
            }
        }
    }

    while cursor.seek_assignment()? {
        let group = cursor.string()?;
        cursor.expect(']', "`]`")?;
        cursor.expect('=', "`=`")?;
        cursor.skip_trivia();
        let start = cursor.pos;
        let value = cursor.literal()?;
        implementors.insert(group, descriptions(value, start)?);
    }

    Ok(implementors)
}

/// Split the argument of `Object.fromEntries` into `(group, items)` pairs.
fn entry_pairs(value: Literal, offset: usize) -> Result<Vec<(String, Literal)>, FragmentError> {
    let unexpected = || FragmentError::Unexpected {
        expected: "array of `[name, items]` pairs",
        found: None,
        offset,
    };
    let Literal::Array(pairs) = value else {
        return Err(unexpected());
    };

    pairs
        .into_iter()
        .map(|pair| match pair {
            Literal::Array(parts) => {
                let mut parts = parts.into_iter();
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(Literal::Str(group)), Some(items), None) => Ok((group, items)),
                    _ => Err(unexpected()),
                }
            }
            _ => Err(unexpected()),
        })
        .collect()
}

/// Flatten an array literal into descriptions.
///
/// Every item must yield a description; anything else is an error rather
/// than a silently shorter list.
fn descriptions(value: Literal, offset: usize) -> Result<Vec<String>, FragmentError> {
    let Literal::Array(items) = value else {
        return Err(FragmentError::Unexpected {
            expected: "array of descriptions",
            found: None,
            offset,
        });
    };

    items
        .into_iter()
        .map(|item| {
            description(item).ok_or(FragmentError::Unexpected {
                expected: "description string",
                found: None,
                offset,
            })
        })
        .collect()
}

fn description(item: Literal) -> Option<String> {
    match item {
        Literal::Str(text) => Some(text),
        Literal::Array(parts) => parts.into_iter().find_map(|part| match part {
            Literal::Str(text) => Some(text),
            _ => None,
        }),
        Literal::Object(fields) => fields.into_iter().find_map(|(key, value)| match value {
            Literal::Str(text) if key == "text" => Some(text),
            _ => None,
        }),
        Literal::Bare(_) => None,
    }
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    const fn new(src: &'a str, pos: usize) -> Self {
        Self { src, pos }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skip whitespace and comments.
    fn skip_trivia(&mut self) {
        loop {
            let rest = &self.src[self.pos..];
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();

            if trimmed.starts_with("//") {
                self.pos += trimmed.find('\n').unwrap_or(trimmed.len());
            } else if let Some(body) = trimmed.strip_prefix("/*") {
                self.pos += body.find("*/").map_or(trimmed.len(), |end| end + 4);
            } else {
                break;
            }
        }
    }

    /// Move past the next `implementors[` outside strings and comments.
    ///
    /// Returns `false` at end of input.
    fn seek_assignment(&mut self) -> Result<bool, FragmentError> {
        loop {
            self.skip_trivia();
            let at_boundary = !self.src[..self.pos]
                .chars()
                .next_back()
                .is_some_and(is_word_char);
            if at_boundary && let Some(found) = ASSIGNMENT.find(&self.src[self.pos..]) {
                self.pos += found.end();
                return Ok(true);
            }
            match self.peek() {
                None => return Ok(false),
                Some('"' | '\'') => {
                    self.string()?;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn expect(&mut self, want: char, expected: &'static str) -> Result<(), FragmentError> {
        self.skip_trivia();
        match self.peek() {
            Some(c) if c == want => {
                self.bump();
                Ok(())
            }
            found => Err(self.unexpected(expected, found)),
        }
    }

    const fn unexpected(&self, expected: &'static str, found: Option<char>) -> FragmentError {
        FragmentError::Unexpected {
            expected,
            found,
            offset: self.pos,
        }
    }

    fn literal(&mut self) -> Result<Literal, FragmentError> {
        self.skip_trivia();
        match self.peek() {
            Some('"' | '\'') => self.string().map(Literal::Str),
            Some('[') => self.array(),
            Some('{') => self.object(),
            Some(c) if is_word_char(c) => Ok(Literal::Bare(self.word())),
            found => Err(self.unexpected("literal", found)),
        }
    }

    fn array(&mut self) -> Result<Literal, FragmentError> {
        self.expect('[', "`[`")?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            if self.peek() == Some(']') {
                self.bump();
                return Ok(Literal::Array(items));
            }
            items.push(self.literal()?);
            self.skip_trivia();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(']') => {}
                found => return Err(self.unexpected("`,` or `]`", found)),
            }
        }
    }

    fn object(&mut self) -> Result<Literal, FragmentError> {
        self.expect('{', "`{`")?;
        let mut entries = Vec::new();
        loop {
            self.skip_trivia();
            let key = match self.peek() {
                Some('}') => {
                    self.bump();
                    return Ok(Literal::Object(entries));
                }
                Some('"' | '\'') => self.string()?,
                Some(c) if is_word_char(c) => self.word(),
                found => return Err(self.unexpected("object key", found)),
            };
            self.expect(':', "`:`")?;
            let value = self.literal()?;
            entries.push((key, value));
            self.skip_trivia();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {}
                found => return Err(self.unexpected("`,` or `}`", found)),
            }
        }
    }

    fn word(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_word_char) {
            self.bump();
        }
        self.src[start..self.pos].to_string()
    }

    fn string(&mut self) -> Result<String, FragmentError> {
        self.skip_trivia();
        let start = self.pos;
        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            found => return Err(self.unexpected("string literal", found)),
        };
        self.bump();

        let mut out = String::new();
        loop {
            let escape_at = self.pos;
            match self.bump() {
                None => return Err(FragmentError::UnterminatedString { offset: start }),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => self.escape(&mut out, escape_at)?,
                Some(c) => out.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String, offset: usize) -> Result<(), FragmentError> {
        let invalid = FragmentError::InvalidEscape { offset };
        match self.bump().ok_or(invalid.clone())? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            '0' => out.push('\0'),
            c @ ('\\' | '\'' | '"' | '/') => out.push(c),
            // Line continuation.
            '\n' => {}
            'x' => {
                let code = self.hex(2).ok_or(invalid.clone())?;
                out.push(char::from_u32(code).ok_or(invalid)?);
            }
            'u' => {
                let high = self.hex(4).ok_or(invalid.clone())?;
                let code = if (0xD800..0xDC00).contains(&high) && self.src[self.pos..].starts_with("\\u") {
                    let saved = self.pos;
                    self.pos += 2;
                    match self.hex(4) {
                        Some(low) if (0xDC00..0xE000).contains(&low) => {
                            0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
                        }
                        _ => {
                            self.pos = saved;
                            high
                        }
                    }
                } else {
                    high
                };
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            _ => return Err(invalid),
        }
        Ok(())
    }

    fn hex(&mut self, digits: usize) -> Option<u32> {
        let text = self.src.get(self.pos..self.pos + digits)?;
        if !text.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let value = u32::from_str_radix(text, 16).ok()?;
        self.pos += digits;
        Some(value)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.' | '-')
}
