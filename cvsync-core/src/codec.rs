//! Record codec: TypeScript data files <-> ordered record sequences.
//!
//! The input files are program fragments: zero or more imports, zero or more
//! comments, and exactly one exported declaration binding a name to an array
//! literal of record-shaped object literals. The codec treats this as a small
//! parsing problem, not a chain of substitutions: string literals are
//! tokenized first (with escape handling) so that comment-like sequences
//! inside field values are never touched, and the array span is isolated by
//! bracket matching rather than first-`[`/last-`]` guessing.
//!
//! `encode` splices the re-serialized array over the old balanced span,
//! leaving every byte outside it untouched, so imports, comments and the
//! declaration itself survive a round trip.

use crate::error::{Result, SyncError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

const BOM: char = '\u{feff}';

/// Decode the exported array literal in `content` into records.
///
/// `path` is used for error context only. Fails with a ParseError if no
/// exported array is found or a record does not match the target schema;
/// a failure yields no records at all.
pub fn decode<T: DeserializeOwned>(path: &str, content: &str) -> Result<Vec<T>> {
    let span = find_export_array(content).map_err(|e| e.into_parse(path, content))?;
    let values = parse_array_literal(content, span).map_err(|e| e.into_parse(path, content))?;

    let mut records = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        let rendered = value.to_string();
        match serde_json::from_value(value) {
            Ok(record) => records.push(record),
            Err(e) => {
                return Err(SyncError::parse(
                    path,
                    format!("record {} does not match the collection schema: {}", index, e),
                    truncate(&rendered, 80),
                ));
            }
        }
    }
    Ok(records)
}

/// Re-serialize `records` into the data file form.
///
/// With `original` present, the new pretty-printed array literal replaces the
/// old balanced `[...]` span; everything before the declaration's `=` and
/// everything after the closing `]` (trailing `;`, comments) is preserved
/// byte for byte. Without `original`, a minimal fresh declaration is emitted;
/// this loses any imports/comments the file used to carry, which is the
/// documented degradation path.
pub fn encode<T: Serialize>(
    path: &str,
    records: &[T],
    original: Option<&str>,
    type_name: &str,
    variable: &str,
) -> Result<String> {
    let literal = serde_json::to_string_pretty(records).map_err(|e| {
        SyncError::parse(path, format!("failed to serialize records: {}", e), String::new())
    })?;

    match original {
        None => Ok(format!(
            "export const {}: {}[] = {};\n",
            variable, type_name, literal
        )),
        Some(orig) => {
            let span = find_export_array(orig).map_err(|e| e.into_parse(path, orig))?;
            let mut out = String::with_capacity(orig.len() + literal.len());
            out.push_str(&orig[..span.start]);
            out.push_str(&literal);
            out.push_str(&orig[span.end..]);
            Ok(out)
        }
    }
}

// ─────────────────────────────────────────────────────
// Scanner
// ─────────────────────────────────────────────────────

/// Internal scan/parse failure with a byte offset into the source.
struct RawError {
    pos: usize,
    message: String,
}

type RawResult<T> = std::result::Result<T, RawError>;

impl RawError {
    fn new(pos: usize, message: impl Into<String>) -> Self {
        Self {
            pos,
            message: message.into(),
        }
    }

    fn into_parse(self, path: &str, src: &str) -> SyncError {
        SyncError::parse(path, self.message, excerpt_at(src, self.pos))
    }
}

fn excerpt_at(src: &str, pos: usize) -> String {
    let mut start = pos.min(src.len());
    while start > 0 && !src.is_char_boundary(start) {
        start -= 1;
    }
    truncate(&src[start..], 60)
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_quote(c: char) -> bool {
    matches!(c, '\'' | '"' | '`')
}

/// Byte-offset cursor over the source. Cheap to copy, so speculative
/// parses work on a copy and commit by assignment.
#[derive(Clone, Copy)]
struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.src[self.pos..].starts_with(prefix)
    }

    /// Skip whitespace, the BOM, and line/block comments.
    fn skip_trivia(&mut self) -> RawResult<()> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() || c == BOM => {
                    self.bump();
                }
                Some('/') if self.starts_with("//") => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.starts_with("/*") => {
                    let open = self.pos;
                    self.bump();
                    self.bump();
                    loop {
                        if self.starts_with("*/") {
                            self.bump();
                            self.bump();
                            break;
                        }
                        if self.bump().is_none() {
                            return Err(RawError::new(open, "unterminated block comment"));
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Skip over a string literal without decoding it. `peek()` must be the
    /// opening quote.
    fn skip_string(&mut self) -> RawResult<()> {
        let open = self.pos;
        let quote = self.bump().expect("caller checked for a quote");
        loop {
            match self.bump() {
                None => return Err(RawError::new(open, "unterminated string literal")),
                Some('\\') => {
                    self.bump();
                }
                Some(c) if c == quote => return Ok(()),
                Some(_) => {}
            }
        }
    }

    fn read_ident(&mut self) -> Option<&'a str> {
        let start = self.pos;
        match self.peek() {
            Some(c) if is_ident_start(c) => {
                self.bump();
            }
            _ => return None,
        }
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                self.bump();
            } else {
                break;
            }
        }
        Some(&self.src[start..self.pos])
    }
}

// ─────────────────────────────────────────────────────
// Export declaration locator
// ─────────────────────────────────────────────────────

/// Byte span of the exported array literal, `start` at `[`, `end` just past
/// the matching `]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArraySpan {
    start: usize,
    end: usize,
}

/// Locate the exported array literal, scanning past imports, comments and
/// unrelated declarations. String and comment spans are skipped as units so
/// their contents can never confuse the search or the bracket matching.
fn find_export_array(src: &str) -> RawResult<ArraySpan> {
    let mut sc = Scanner::new(src);
    loop {
        sc.skip_trivia()?;
        match sc.peek() {
            None => {
                return Err(RawError::new(
                    0,
                    "no exported array declaration found in data file",
                ))
            }
            Some(c) if is_quote(c) => sc.skip_string()?,
            Some(c) if is_ident_start(c) => {
                let word = sc.read_ident().expect("checked ident start");
                if word == "export" {
                    if let Some(span) = try_parse_export(&mut sc)? {
                        return Ok(span);
                    }
                }
            }
            Some(_) => {
                sc.bump();
            }
        }
    }
}

/// After an `export` keyword, try to match `const|let|var name[: T[]] = [`.
/// Returns the array span on a match; `None` if this export binds something
/// else (the caller keeps scanning).
fn try_parse_export(sc: &mut Scanner<'_>) -> RawResult<Option<ArraySpan>> {
    let mut probe = *sc;

    probe.skip_trivia()?;
    if !matches!(probe.read_ident(), Some("const" | "let" | "var")) {
        return Ok(None);
    }

    probe.skip_trivia()?;
    if probe.read_ident().is_none() {
        return Ok(None);
    }

    probe.skip_trivia()?;
    if probe.peek() == Some(':') {
        probe.bump();
        skip_type_annotation(&mut probe)?;
    }

    if probe.peek() != Some('=') {
        return Ok(None);
    }
    probe.bump();

    probe.skip_trivia()?;
    if probe.peek() != Some('[') {
        // Exported scalar/object; not the collection we are after.
        return Ok(None);
    }

    let start = probe.pos;
    skip_balanced_array(&mut probe)?;
    let end = probe.pos;

    *sc = probe;
    Ok(Some(ArraySpan { start, end }))
}

/// Skip a type annotation up to the `=` sign. Annotations may contain string
/// literal types and `[]` suffixes, so strings and comments are skipped as
/// units here too.
fn skip_type_annotation(sc: &mut Scanner<'_>) -> RawResult<()> {
    let open = sc.pos;
    loop {
        sc.skip_trivia()?;
        match sc.peek() {
            None => return Err(RawError::new(open, "unterminated type annotation")),
            Some(c) if is_quote(c) => sc.skip_string()?,
            Some('=') => return Ok(()),
            Some(_) => {
                sc.bump();
            }
        }
    }
}

/// Consume a balanced `[...]` span. `peek()` must be the opening bracket.
fn skip_balanced_array(sc: &mut Scanner<'_>) -> RawResult<()> {
    let open = sc.pos;
    sc.bump();
    let mut depth = 1usize;
    loop {
        sc.skip_trivia()?;
        match sc.peek() {
            None => return Err(RawError::new(open, "unbalanced brackets in array literal")),
            Some(c) if is_quote(c) => sc.skip_string()?,
            Some('[') => {
                sc.bump();
                depth += 1;
            }
            Some(']') => {
                sc.bump();
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Some(_) => {
                sc.bump();
            }
        }
    }
}

// ─────────────────────────────────────────────────────
// Literal parser
// ─────────────────────────────────────────────────────

/// Parse the isolated array span into JSON values with a recursive-descent
/// parser. Accepts the object-literal syntax the data files use: unquoted
/// keys, single/double/backtick strings, trailing commas, and bare
/// identifiers standing in for asset references (normalized to strings).
fn parse_array_literal(src: &str, span: ArraySpan) -> RawResult<Vec<Value>> {
    let mut parser = LiteralParser {
        sc: Scanner {
            src: &src[..span.end],
            pos: span.start,
        },
    };
    match parser.parse_value()? {
        Value::Array(items) => Ok(items),
        _ => Err(RawError::new(span.start, "expected an array literal")),
    }
}

struct LiteralParser<'a> {
    sc: Scanner<'a>,
}

impl<'a> LiteralParser<'a> {
    fn parse_value(&mut self) -> RawResult<Value> {
        self.sc.skip_trivia()?;
        match self.sc.peek() {
            None => Err(self.err("unexpected end of input")),
            Some('[') => self.parse_array(),
            Some('{') => self.parse_object(),
            Some(c) if is_quote(c) => Ok(Value::String(self.parse_string()?)),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => {
                self.parse_number()
            }
            Some(c) if is_ident_start(c) => {
                let ident = self.read_dotted_ident();
                Ok(match ident.as_str() {
                    "true" => Value::Bool(true),
                    "false" => Value::Bool(false),
                    "null" | "undefined" => Value::Null,
                    // Bare identifier used as an asset-reference placeholder.
                    _ => Value::String(ident),
                })
            }
            Some(c) => Err(self.err(format!("unexpected character '{}'", c))),
        }
    }

    fn parse_array(&mut self) -> RawResult<Value> {
        self.sc.bump();
        let mut items = Vec::new();
        loop {
            self.sc.skip_trivia()?;
            if self.sc.peek() == Some(']') {
                self.sc.bump();
                return Ok(Value::Array(items));
            }
            items.push(self.parse_value()?);
            self.sc.skip_trivia()?;
            match self.sc.peek() {
                Some(',') => {
                    self.sc.bump();
                }
                Some(']') => {}
                _ => return Err(self.err("expected ',' or ']' in array literal")),
            }
        }
    }

    fn parse_object(&mut self) -> RawResult<Value> {
        self.sc.bump();
        let mut map = serde_json::Map::new();
        loop {
            self.sc.skip_trivia()?;
            if self.sc.peek() == Some('}') {
                self.sc.bump();
                return Ok(Value::Object(map));
            }
            let key = self.parse_key()?;
            self.sc.skip_trivia()?;
            if self.sc.peek() != Some(':') {
                return Err(self.err(format!("expected ':' after key '{}'", key)));
            }
            self.sc.bump();
            let value = self.parse_value()?;
            map.insert(key, value);
            self.sc.skip_trivia()?;
            match self.sc.peek() {
                Some(',') => {
                    self.sc.bump();
                }
                Some('}') => {}
                _ => return Err(self.err("expected ',' or '}' in object literal")),
            }
        }
    }

    fn parse_key(&mut self) -> RawResult<String> {
        match self.sc.peek() {
            Some(c) if is_quote(c) => self.parse_string(),
            Some(c) if is_ident_start(c) => {
                Ok(self.sc.read_ident().expect("checked ident start").to_string())
            }
            Some(c) if c.is_ascii_digit() => {
                let start = self.sc.pos;
                while matches!(self.sc.peek(), Some(d) if d.is_ascii_digit()) {
                    self.sc.bump();
                }
                Ok(self.sc.src[start..self.sc.pos].to_string())
            }
            _ => Err(self.err("expected an object key")),
        }
    }

    /// Decode a string literal, handling the escapes TypeScript sources use.
    fn parse_string(&mut self) -> RawResult<String> {
        let open = self.sc.pos;
        let quote = self.sc.bump().expect("caller checked for a quote");
        let mut out = String::new();
        loop {
            match self.sc.bump() {
                None => return Err(RawError::new(open, "unterminated string literal")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => {
                    let escaped = self
                        .sc
                        .bump()
                        .ok_or_else(|| RawError::new(open, "unterminated escape sequence"))?;
                    match escaped {
                        'n' => out.push('\n'),
                        'r' => out.push('\r'),
                        't' => out.push('\t'),
                        'b' => out.push('\u{0008}'),
                        'f' => out.push('\u{000c}'),
                        'v' => out.push('\u{000b}'),
                        '0' => out.push('\0'),
                        // Line continuation: backslash-newline is dropped.
                        '\n' => {}
                        '\r' => {
                            if self.sc.peek() == Some('\n') {
                                self.sc.bump();
                            }
                        }
                        'u' => out.push(self.parse_unicode_escape()?),
                        'x' => {
                            let code = self.parse_hex_digits(2)?;
                            out.push(
                                char::from_u32(code)
                                    .ok_or_else(|| self.err("invalid \\x escape"))?,
                            );
                        }
                        other => out.push(other),
                    }
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_unicode_escape(&mut self) -> RawResult<char> {
        let code = if self.sc.peek() == Some('{') {
            self.sc.bump();
            let start = self.sc.pos;
            while matches!(self.sc.peek(), Some(c) if c.is_ascii_hexdigit()) {
                self.sc.bump();
            }
            let digits = &self.sc.src[start..self.sc.pos];
            if self.sc.peek() != Some('}') {
                return Err(self.err("unterminated \\u{...} escape"));
            }
            self.sc.bump();
            u32::from_str_radix(digits, 16).map_err(|_| self.err("invalid \\u{...} escape"))?
        } else {
            self.parse_hex_digits(4)?
        };

        // Combine a UTF-16 surrogate pair written as two \uXXXX escapes.
        if (0xD800..0xDC00).contains(&code) && self.sc.starts_with("\\u") {
            let mut probe = self.sc;
            probe.bump();
            probe.bump();
            let mut low_parser = LiteralParser { sc: probe };
            let low = low_parser.parse_hex_digits(4)?;
            if (0xDC00..0xE000).contains(&low) {
                self.sc = low_parser.sc;
                let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                return char::from_u32(combined).ok_or_else(|| self.err("invalid surrogate pair"));
            }
        }

        char::from_u32(code).ok_or_else(|| self.err("invalid \\u escape"))
    }

    fn parse_hex_digits(&mut self, count: usize) -> RawResult<u32> {
        let start = self.sc.pos;
        for _ in 0..count {
            match self.sc.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    self.sc.bump();
                }
                _ => return Err(self.err("expected hex digits in escape sequence")),
            }
        }
        u32::from_str_radix(&self.sc.src[start..self.sc.pos], 16)
            .map_err(|_| self.err("invalid hex escape"))
    }

    fn parse_number(&mut self) -> RawResult<Value> {
        let start = self.sc.pos;
        if matches!(self.sc.peek(), Some('+') | Some('-')) {
            self.sc.bump();
        }
        while let Some(c) = self.sc.peek() {
            if c.is_ascii_digit() || c == '.' {
                self.sc.bump();
            } else if c == 'e' || c == 'E' {
                self.sc.bump();
                if matches!(self.sc.peek(), Some('+') | Some('-')) {
                    self.sc.bump();
                }
            } else {
                break;
            }
        }
        let text = &self.sc.src[start..self.sc.pos];
        if let Ok(i) = text.parse::<i64>() {
            return Ok(Value::Number(i.into()));
        }
        let f: f64 = text
            .parse()
            .map_err(|_| RawError::new(start, format!("invalid number literal '{}'", text)))?;
        // Source numbers have no int/float distinction; keep whole values
        // integral so they re-serialize without a fractional part.
        if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
            return Ok(Value::Number((f as i64).into()));
        }
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| RawError::new(start, format!("non-finite number literal '{}'", text)))
    }

    fn read_dotted_ident(&mut self) -> String {
        let mut out = String::new();
        out.push_str(self.sc.read_ident().expect("caller checked ident start"));
        // Allow dotted references like `assets.profilePhoto`.
        while self.sc.peek() == Some('.') {
            let mut probe = self.sc;
            probe.bump();
            match probe.read_ident() {
                Some(part) => {
                    out.push('.');
                    out.push_str(part);
                    self.sc = probe;
                }
                None => break,
            }
        }
        out
    }

    fn err(&self, message: impl Into<String>) -> RawError {
        RawError::new(self.sc.pos, message)
    }
}
