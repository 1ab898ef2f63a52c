//! `redfa` compiles a user-supplied regular expression over 7-bit ASCII
//! into a minimized deterministic finite automaton and exposes a visitor
//! interface for rendering it (a Graphviz DOT renderer ships as the
//! default implementation).
//!
//! The pipeline is strictly leaves-first: [`lexer`] tokenizes a byte
//! buffer, [`parser`] drives [`nfa`]'s Thompson constructors to build an
//! NFA, [`dfa`] performs subset construction, and [`minimize`] refines
//! the result into a minimal DFA that [`emit`] knows how to walk.
//!
//! ```
//! let dfa = redfa::compile(b"a(b|c)*").unwrap();
//! assert_eq!(dfa.size(), 2);
//! let dot = redfa::emit::to_dot(&dfa);
//! assert!(dot.starts_with("digraph dfa {"));
//! ```
//!
//! This crate never performs I/O and never matches a string against the
//! automaton it compiles -- it is a compiler whose output is a
//! description, not a runtime engine (see `redfa-cli` for the thin
//! wrapper that reads a file and writes one).

pub mod alphabet;
pub mod dfa;
pub mod emit;
pub mod error;
pub mod lexer;
pub mod minimize;
pub mod nfa;
pub mod parser;
pub mod token;

pub use error::{CompileError, Diagnostic};
pub use minimize::MinimalDfa;

/// Runs the full pipeline -- lex, parse, subset-construct, minimize --
/// over `source` and returns the minimal DFA.
#[tracing::instrument(skip(source), fields(len = source.len()))]
pub fn compile(source: &[u8]) -> Result<MinimalDfa, CompileError> {
    let nfa = {
        let _span = tracing::debug_span!("parse").entered();
        parser::parse(source)?
    };
    tracing::debug!(states = nfa.state_count(), "built Thompson NFA");

    let dfa = {
        let _span = tracing::debug_span!("subset_construct").entered();
        dfa::Dfa::from_nfa(&nfa)
    };
    tracing::debug!(states = dfa.size(), "subset-constructed DFA");

    let minimal = {
        let _span = tracing::debug_span!("minimize").entered();
        minimize::MinimalDfa::from_dfa(&dfa)
    };
    tracing::debug!(states = minimal.size(), "minimized DFA");

    Ok(minimal)
}
