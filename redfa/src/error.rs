//! The compile-time error taxonomy, exposed as a `thiserror`-derived enum
//! instead of ad hoc string formatting scattered through the parser — the
//! same treatment the crate this one descends from gives its own parse
//! errors (see its `NfaParseError`).

use std::fmt;

use thiserror::Error;

use crate::lexer::stripped_with_caret_column;
use crate::token::Token;

/// What a parser production expected to see next, for the "expected X"
/// half of a syntax diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    /// A literal byte or wildcard.
    Literal,
    /// One specific token.
    Token(Token),
    /// A literal, `(`, or `[` — anything that can start a `group`.
    GroupStart,
    /// The character immediately before this position as the low end of a
    /// `lo-hi` range inside `[...]`.
    RangeUpperBound,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Literal => write!(f, "a literal character"),
            Expected::Token(t) => write!(f, "{t}"),
            Expected::GroupStart => write!(f, "a literal, '(', or '['"),
            Expected::RangeUpperBound => write!(f, "a literal to close the range"),
        }
    }
}

/// A structured compile error. Carries enough to re-render the exact
/// caret diagnostic of the source this crate descends from, without the
/// library performing any I/O itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("illegal escape sequence")]
    IllegalEscape { pos: usize },

    #[error("expected {expected}, instead found {found}")]
    UnexpectedToken {
        pos: usize,
        expected: Expected,
        found: Token,
    },

    #[error("empty group '()' is not allowed")]
    EmptyGroup { pos: usize },

    #[error("empty character class '[]' is not allowed")]
    EmptyClass { pos: usize },

    #[error("range's upper bound {hi} exceeds left bound {lo}", lo = *lo as char, hi = *hi as char)]
    InvertedRange { pos: usize, lo: u8, hi: u8 },

    #[error("trailing input after a complete regex")]
    TrailingInput { pos: usize, found: Token },

    /// The cooperative-cancellation case (§5): a `|` alternative failed to
    /// parse a right-hand operand, and no enclosing production may accept
    /// `)`/EOF as a valid way to recover.
    #[error("parse aborted: an alternation operand failed to parse")]
    Aborted,
}

impl CompileError {
    fn pos(&self) -> Option<usize> {
        match self {
            CompileError::IllegalEscape { pos }
            | CompileError::UnexpectedToken { pos, .. }
            | CompileError::EmptyGroup { pos }
            | CompileError::EmptyClass { pos }
            | CompileError::InvertedRange { pos, .. }
            | CompileError::TrailingInput { pos, .. } => Some(*pos),
            CompileError::Aborted => None,
        }
    }

    /// Builds the `Diagnostic` this error renders to: the message plus,
    /// unless the error carries no source position (the `Aborted`
    /// case — it fires after a nested production already printed its own
    /// positioned diagnostic, so there is nothing further to point at),
    /// the two-line caret block mirroring the lexer's `print_error`
    /// (source with CR/LF stripped, then a caret aligned to the
    /// offending byte — tabs count as reaching the next
    /// multiple-of-8 column).
    pub fn diagnostic(&self, source: &[u8]) -> Diagnostic {
        let caret = self
            .pos()
            .map(|pos| stripped_with_caret_column(source, pos));
        Diagnostic {
            message: self.to_string(),
            caret,
        }
    }
}

/// A rendered compile diagnostic: a message, plus — unless suppressed by
/// the error carrying no position — a `(source-with-CR/LF-stripped,
/// caret-column)` pair to print underneath it. Kept as a value distinct
/// from `CompileError` itself (SPEC_FULL.md 7/10.1): the library never
/// writes to a stream, it only hands callers the pieces needed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub caret: Option<(String, usize)>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some((text, col)) = &self.caret {
            write!(f, "\n{text}\n")?;
            for _ in 0..*col {
                write!(f, " ")?;
            }
            write!(f, "^")?;
        }
        Ok(())
    }
}
