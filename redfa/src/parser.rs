//! Recursive-descent parser driving Thompson's construction.
//!
//! Six mutually recursive productions, one token of lookahead, over the
//! grammar:
//!
//! ```text
//! regex     -> group gprime
//! group     -> '(' regex ')' quantifier
//!            | pattern
//!            | range quantifier
//! gprime    -> group gprime
//!            | '|' group gprime
//!            | epsilon                 (lookahead is EOF or ')')
//! quantifier-> '*' | '?' | '+' | epsilon
//! pattern   -> literal+ (each followed by an optional quantifier)
//! range     -> '[' allowed ']'
//! allowed   -> ( literal | literal '-' literal )+
//! ```
//!
//! The source this parser descends from threads a mutable "compiler
//! control" struct through every production and keeps a cooperative abort
//! flag on it so that `(a|)`-shaped failures don't let an enclosing
//! production mistake `)`/EOF for a clean parse. Here that control block
//! is just `&mut Parser`, and the abort flag becomes `self.aborted`; a
//! failed production returns `Err` and its partially built `Nfa` values
//! are freed by ordinary scope exit rather than a manual free pass.

use crate::error::{CompileError, Expected};
use crate::lexer::{Lexer, Spanned};
use crate::nfa::Nfa;
use crate::token::Token;

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Spanned,
    aborted: bool,
}

/// Parses `source` as a complete regex and returns the Thompson NFA it
/// builds. A successful parse requires the token immediately following
/// the regex to be EOF; trailing garbage is an error.
pub fn parse(source: &[u8]) -> Result<Nfa, CompileError> {
    let mut p = Parser::new(source)?;
    let nfa = p.regex()?;
    if p.current.token != Token::Eof {
        return Err(CompileError::TrailingInput {
            pos: p.current.pos,
            found: p.current.token,
        });
    }
    Ok(nfa)
}

impl<'a> Parser<'a> {
    fn new(source: &'a [u8]) -> Result<Self, CompileError> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next();
        if current.token == Token::Illegal {
            return Err(CompileError::IllegalEscape { pos: current.pos });
        }
        Ok(Parser {
            lexer,
            current,
            aborted: false,
        })
    }

    /// Advances to the next token, eagerly surfacing an illegal escape as
    /// soon as it becomes current (per the error taxonomy in SPEC_FULL.md
    /// 7: "surfaced by the parser when it becomes the current token").
    fn bump(&mut self) -> Result<(), CompileError> {
        self.current = self.lexer.next();
        if self.current.token == Token::Illegal {
            return Err(CompileError::IllegalEscape {
                pos: self.current.pos,
            });
        }
        Ok(())
    }

    fn regex(&mut self) -> Result<Nfa, CompileError> {
        let local = self.group()?;
        match self.gprime(local)? {
            Some(nfa) => Ok(nfa),
            None if self.aborted => {
                // The abort flag short-circuits here: an alternation whose
                // right-hand side failed to parse must not let this level
                // mistake a following ')' for a clean parse.
                Err(CompileError::Aborted)
            }
            None => Err(CompileError::UnexpectedToken {
                pos: self.current.pos,
                expected: Expected::Token(Token::Pipe),
                found: self.current.token,
            }),
        }
    }

    fn group(&mut self) -> Result<Nfa, CompileError> {
        match self.current.token {
            Token::LParen => {
                let lparen_pos = self.current.pos;
                self.bump()?;
                if self.current.token == Token::RParen {
                    return Err(CompileError::EmptyGroup { pos: lparen_pos });
                }
                let inner = self.regex()?;
                if self.current.token != Token::RParen {
                    return Err(CompileError::UnexpectedToken {
                        pos: self.current.pos,
                        expected: Expected::Token(Token::RParen),
                        found: self.current.token,
                    });
                }
                self.bump()?;
                self.quantifier(inner)
            }
            Token::LBracket => {
                let inner = self.range()?;
                self.quantifier(inner)
            }
            _ => self.pattern(),
        }
    }

    /// `gprime -> group gprime | '|' group gprime | epsilon`. Returns
    /// `Ok(Some(nfa))` on a successful (possibly empty) continuation,
    /// `Ok(None)` when the continuation fails and the failure should be
    /// judged by the caller (it may still be a legal stopping point).
    fn gprime(&mut self, local: Nfa) -> Result<Option<Nfa>, CompileError> {
        if starts_group(self.current.token) {
            let rhs = self.group()?;
            return self.gprime(local.concat(rhs));
        }
        if self.current.token == Token::Pipe {
            self.bump()?;
            if !starts_group(self.current.token) {
                // `(a|)`: the alternative has no right-hand operand.
                self.aborted = true;
                return Ok(None);
            }
            let rhs = self.group()?;
            return self.gprime(local.alternate(rhs));
        }
        if self.current.token == Token::Eof || self.current.token == Token::RParen {
            return Ok(Some(local));
        }
        Ok(None)
    }

    /// `quantifier -> '*' | '?' | '+' | epsilon`. The epsilon production is
    /// unconditionally valid — whether whatever follows is itself legal in
    /// context (another atom to concatenate, a legal group terminator, ...)
    /// is each caller's own concern (`pattern`'s continuation check,
    /// `gprime`'s, the `)`-expecting check in `group`), not this
    /// production's.
    fn quantifier(&mut self, group: Nfa) -> Result<Nfa, CompileError> {
        let applied = match self.current.token {
            Token::Star => {
                self.bump()?;
                group.star()
            }
            Token::Question => {
                self.bump()?;
                group.optional()
            }
            Token::Plus => {
                self.bump()?;
                group.plus()
            }
            _ => group,
        };
        Ok(applied)
    }

    fn pattern(&mut self) -> Result<Nfa, CompileError> {
        let Some(first) = atom_nfa(self.current.token) else {
            return Err(CompileError::UnexpectedToken {
                pos: self.current.pos,
                expected: Expected::GroupStart,
                found: self.current.token,
            });
        };
        self.bump()?;
        let mut nfa = self.quantifier(first)?;

        while let Some(next_atom) = atom_nfa(self.current.token) {
            self.bump()?;
            let next = self.quantifier(next_atom)?;
            nfa = nfa.concat(next);
        }

        if can_follow_group(self.current.token) {
            Ok(nfa)
        } else {
            Err(CompileError::UnexpectedToken {
                pos: self.current.pos,
                expected: Expected::GroupStart,
                found: self.current.token,
            })
        }
    }

    fn range(&mut self) -> Result<Nfa, CompileError> {
        debug_assert_eq!(self.current.token, Token::LBracket);
        self.bump()?;
        if self.current.token == Token::RBracket {
            return Err(CompileError::EmptyClass {
                pos: self.current.pos,
            });
        }

        let mut nfa: Option<Nfa> = None;
        while let Some(lo) = literal_byte(self.current.token) {
            let lo_pos = self.current.pos;
            self.bump()?;
            let segment = if self.current.token == Token::Literal(b'-') {
                // A literal '-' can only mean "start of a lo-hi range" here;
                // the lexer hands it back as an ordinary literal byte.
                self.bump()?;
                let Some(hi) = literal_byte(self.current.token) else {
                    return Err(CompileError::UnexpectedToken {
                        pos: self.current.pos,
                        expected: Expected::RangeUpperBound,
                        found: self.current.token,
                    });
                };
                if hi < lo {
                    return Err(CompileError::InvertedRange {
                        pos: lo_pos,
                        lo,
                        hi,
                    });
                }
                self.bump()?;
                Nfa::range(lo, hi)
            } else {
                Nfa::literal(lo)
            };
            nfa = Some(match nfa {
                Some(acc) => acc.alternate(segment),
                None => segment,
            });
        }

        if self.current.token != Token::RBracket {
            // Nothing parsed yet (the very first byte after `[` was
            // neither a literal nor `]`) means a literal was expected
            // here; once at least one segment has parsed, only `]` can
            // legally follow.
            let expected = if nfa.is_none() {
                Expected::Literal
            } else {
                Expected::Token(Token::RBracket)
            };
            return Err(CompileError::UnexpectedToken {
                pos: self.current.pos,
                expected,
                found: self.current.token,
            });
        }
        self.bump()?;

        match nfa {
            Some(nfa) => Ok(nfa),
            None => Err(CompileError::EmptyClass {
                pos: self.current.pos,
            }),
        }
    }
}

/// A literal byte this token stands for, if any. Deliberately excludes
/// the wildcard: per SPEC_FULL.md 4.3, a character-class range bound
/// must be a literal `<= '~' (0x7E)`, and the wildcard's token value
/// `0x7F` is reserved internally rather than a matchable byte, so it
/// can never be a literal in that sense -- only `range`'s `lo`/`hi`
/// parsing consults this function.
fn literal_byte(tok: Token) -> Option<u8> {
    match tok {
        Token::Literal(b) => Some(b),
        _ => None,
    }
}

/// The NFA a single atom compiles to, if `tok` starts one: a literal
/// byte transition, or (for the wildcard) the expanded
/// `[\x20-\x7E]` + tab + newline alternation (`Nfa::wildcard`).
fn atom_nfa(tok: Token) -> Option<Nfa> {
    match tok {
        Token::Literal(b) => Some(Nfa::literal(b)),
        Token::Wildcard => Some(Nfa::wildcard()),
        _ => None,
    }
}

/// True for tokens that can start a `group` production.
fn starts_group(tok: Token) -> bool {
    matches!(tok, Token::LParen | Token::LBracket | Token::Wildcard) || literal_byte(tok).is_some()
}

/// True for tokens legally following a complete group/pattern: EOF, `(`,
/// `)`, `[`, `|` (mirrors the original `cc->token <= TK_PIPE` check, which
/// relied on those tokens being contiguous and low-valued).
fn can_follow_group(tok: Token) -> bool {
    matches!(
        tok,
        Token::Eof | Token::LParen | Token::RParen | Token::LBracket | Token::Pipe
    )
}
