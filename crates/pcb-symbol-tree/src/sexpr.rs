//! Minimal S-expression reader for KiCad library files.
//!
//! Atoms keep the distinction between quoted strings and bare symbols, which
//! matters for KiCad files where `(name "1")` and `(in_bom yes)` coexist.

use std::iter::Peekable;
use std::str::CharIndices;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SexprError {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("unclosed list starting at byte {0}")]
    UnclosedList(usize),

    #[error("unterminated string starting at byte {0}")]
    UnterminatedString(usize),

    #[error("unexpected ')' at byte {0}")]
    UnexpectedClose(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sexpr {
    /// Unquoted atom
    Symbol(String),
    /// Quoted atom
    String(String),
    Int(i64),
    Float(f64),
    List(Vec<Sexpr>),
}

impl Sexpr {
    pub fn as_sym(&self) -> Option<&str> {
        match self {
            Sexpr::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Sexpr::String(s) => Some(s),
            _ => None,
        }
    }

    /// Either kind of textual atom.
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Sexpr::Symbol(s) | Sexpr::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Sexpr::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Sexpr]> {
        match self {
            Sexpr::List(items) => Some(items),
            _ => None,
        }
    }

    /// The leading symbol of a list, e.g. `symbol` for `(symbol "R" ...)`.
    pub fn head(&self) -> Option<&str> {
        self.as_list()?.first()?.as_sym()
    }

    /// Direct child lists whose head is `name`.
    pub fn lists_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a [Sexpr]> {
        self.as_list()
            .unwrap_or_default()
            .iter()
            .filter_map(Sexpr::as_list)
            .filter(move |items| items.first().and_then(Sexpr::as_sym) == Some(name))
    }

    /// First direct child list whose head is `name`.
    pub fn list_named(&self, name: &str) -> Option<&[Sexpr]> {
        self.lists_named(name).next()
    }

    /// Textual value of a `(name "value")` child.
    pub fn child_value(&self, name: &str) -> Option<&str> {
        self.list_named(name)?.get(1)?.as_atom()
    }
}

/// Parse the first S-expression in `input`.
pub fn parse(input: &str) -> Result<Sexpr, SexprError> {
    log::trace!("parsing {} bytes of s-expression input", input.len());
    let mut reader = Reader::new(input);
    reader.skip_trivia();
    reader.read()
}

struct Reader<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    fn pos(&mut self) -> usize {
        self.chars.peek().map(|(i, _)| *i).unwrap_or(self.input.len())
    }

    fn read(&mut self) -> Result<Sexpr, SexprError> {
        match self.chars.peek().copied() {
            None => Err(SexprError::UnexpectedEof),
            Some((_, '(')) => self.read_list(),
            Some((at, ')')) => Err(SexprError::UnexpectedClose(at)),
            Some((_, '"')) => self.read_string(),
            Some(_) => Ok(self.read_bare()),
        }
    }

    fn read_list(&mut self) -> Result<Sexpr, SexprError> {
        let start = self.pos();
        self.chars.next();
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            match self.chars.peek() {
                None => return Err(SexprError::UnclosedList(start)),
                Some((_, ')')) => {
                    self.chars.next();
                    return Ok(Sexpr::List(items));
                }
                Some(_) => items.push(self.read()?),
            }
        }
    }

    fn read_string(&mut self) -> Result<Sexpr, SexprError> {
        let start = self.pos();
        self.chars.next();
        let mut out = String::new();
        while let Some((_, ch)) = self.chars.next() {
            match ch {
                '"' => return Ok(Sexpr::String(out)),
                '\\' => match self.chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, 'r')) => out.push('\r'),
                    Some((_, other)) => out.push(other),
                    None => break,
                },
                other => out.push(other),
            }
        }
        Err(SexprError::UnterminatedString(start))
    }

    fn read_bare(&mut self) -> Sexpr {
        let start = self.pos();
        while let Some((_, ch)) = self.chars.peek() {
            if ch.is_whitespace() || *ch == '(' || *ch == ')' || *ch == '"' {
                break;
            }
            self.chars.next();
        }
        let end = self.pos();
        let text = &self.input[start..end];
        if let Ok(n) = text.parse::<i64>() {
            Sexpr::Int(n)
        } else if let Ok(f) = text.parse::<f64>() {
            Sexpr::Float(f)
        } else {
            Sexpr::Symbol(text.to_string())
        }
    }

    /// Whitespace and `;` line comments.
    fn skip_trivia(&mut self) {
        while let Some((_, ch)) = self.chars.peek().copied() {
            if ch.is_whitespace() {
                self.chars.next();
            } else if ch == ';' {
                for (_, c) in self.chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }
}
