use thiserror::Error;
use tracing::debug;

use crate::{definitions::Definitions, term::Term};

pub type Span = std::ops::Range<usize>;

const LAMBDA_MARKERS: [&str; 2] = ["λ", "\\"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("Empty term")]
    Empty,
    #[error("Expected `.` after the bound variable")]
    MissingDot,
    #[error("Abstraction without a bound variable")]
    MissingBinder,
    #[error("Unclosed `(`")]
    Unclosed,
    #[error("Unmatched parenthesis in `{0}`")]
    UnmatchedParen(String),
    #[error("Invalid name `{0}`")]
    InvalidName(String),
    #[error("Numeral `{0}` is too large")]
    NumeralTooLarge(String),
}

/// Where the text being parsed came from.
#[derive(Clone, PartialEq, Eq, derive_more::Display, Debug)]
pub enum Origin {
    #[display(fmt = "the input")]
    Input,
    #[display(fmt = "definition `{_0}`")]
    Definition(String),
    #[display(fmt = "numeral {_0}")]
    Numeral(usize),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} in {origin}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// The text `span` points into.
    pub text: String,
    /// Byte range in `text`.
    pub span: Span,
    pub origin: Origin,
}
pub type Result<T, E = ParseError> = std::result::Result<T, E>;

pub fn parse(text: &str, definitions: &Definitions) -> Result<Term> {
    Parser { definitions }.parse_source(text, Origin::Input)
}

/// Whether the leading `(` of `text` is closed by its last character or not
/// at all.
fn wrapped_in_parens(text: &str) -> bool {
    let bytes = text.as_bytes();
    if bytes.len() < 2 || bytes[0] != b'(' {
        return false;
    }
    let mut depth = 0isize;
    for &b in &bytes[..bytes.len() - 1] {
        match b {
            b'(' => depth += 1,
            b')' => depth -= 1,
            _ => {}
        }
        if depth == 0 {
            return false;
        }
    }
    true
}

/// Index of the rightmost space outside of any parentheses.
fn split_point(text: &str) -> Option<usize> {
    let mut depth = 0isize;
    for (i, b) in text.bytes().enumerate().rev() {
        match b {
            b')' => depth += 1,
            b'(' => depth -= 1,
            b' ' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

fn is_reserved(c: char) -> bool {
    matches!(c, ' ' | '(' | ')' | '.' | 'λ' | '\\')
}

fn church_numeral(n: usize) -> String {
    format!("λf.λx.{}x{}", "f (".repeat(n), ")".repeat(n))
}

fn trim_spaces(text: &str, span: Span) -> Span {
    let slice = &text[span.clone()];
    let start = span.end - slice.trim_start_matches(' ').len();
    let end = span.start + slice.trim_end_matches(' ').len();
    start..end.max(start)
}

struct Source<'s> {
    text: &'s str,
    origin: Origin,
}
impl Source<'_> {
    fn error(&self, kind: ParseErrorKind, span: Span) -> ParseError {
        ParseError {
            kind,
            text: self.text.to_string(),
            span,
            origin: self.origin.clone(),
        }
    }
}

struct Parser<'d> {
    definitions: &'d Definitions,
}

impl Parser<'_> {
    fn parse_source(&self, text: &str, origin: Origin) -> Result<Term> {
        self.parse_span(&Source { text, origin }, 0..text.len())
    }

    fn parse_span(&self, source: &Source, span: Span) -> Result<Term> {
        let span = trim_spaces(source.text, span);
        let text = &source.text[span.clone()];
        if text.is_empty() {
            return Err(source.error(ParseErrorKind::Empty, span));
        }

        if wrapped_in_parens(text) {
            if !text.ends_with(')') {
                return Err(source.error(ParseErrorKind::Unclosed, span.start..span.start + 1));
            }
            return self.parse_span(source, span.start + 1..span.end - 1);
        }

        if let Some(marker) = LAMBDA_MARKERS.iter().find(|m| text.starts_with(**m)) {
            return self.parse_abs(source, span.clone(), span.start + marker.len());
        }

        match split_point(text) {
            Some(i) => {
                let at = span.start + i;
                let lhs = self.parse_span(source, span.start..at)?;
                let rhs = self.parse_span(source, at + 1..span.end)?;
                Ok(Term::apply(lhs, rhs))
            }
            None => self.parse_atom(source, span),
        }
    }

    fn parse_abs(&self, source: &Source, span: Span, binder_start: usize) -> Result<Term> {
        let dot = source.text[binder_start..span.end]
            .find('.')
            .map(|i| binder_start + i)
            .ok_or_else(|| source.error(ParseErrorKind::MissingDot, span.clone()))?;
        let binder = trim_spaces(source.text, binder_start..dot);
        let bound = &source.text[binder.clone()];
        if bound.is_empty() {
            return Err(source.error(ParseErrorKind::MissingBinder, span.start..dot + 1));
        }
        if bound.contains(is_reserved) {
            return Err(source.error(ParseErrorKind::InvalidName(bound.to_string()), binder));
        }
        let body = self.parse_span(source, dot + 1..span.end)?;
        Ok(Term::abs(bound, body))
    }

    fn parse_atom(&self, source: &Source, span: Span) -> Result<Term> {
        let name = &source.text[span.clone()];
        if let Some(text) = self.definitions.get(name) {
            debug!(name, "expanding definition");
            return self.parse_source(text, Origin::Definition(name.to_string()));
        }
        if name.bytes().all(|b| b.is_ascii_digit()) {
            let n = name.parse::<usize>().map_err(|_| {
                source.error(ParseErrorKind::NumeralTooLarge(name.to_string()), span.clone())
            })?;
            debug!(n, "expanding numeral");
            return self.parse_source(&church_numeral(n), Origin::Numeral(n));
        }
        if name.contains(|c| c == '(' || c == ')') {
            return Err(source.error(ParseErrorKind::UnmatchedParen(name.to_string()), span));
        }
        if name.contains(is_reserved) {
            return Err(source.error(ParseErrorKind::InvalidName(name.to_string()), span));
        }
        Ok(Term::var(name))
    }
}
