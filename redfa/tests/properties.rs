//! Property-based tests (SPEC_FULL.md 10.4) exercising invariant #3 from
//! SPEC_FULL.md 8 ("round trip"): for any regex `r` and any string `s`,
//! simulating the minimized DFA on `s` accepts iff `s` is in `L(r)`.
//!
//! Regexes are generated as a small internal AST (`ReTree`), not by
//! parsing random text, so every generated case is guaranteed syntactically
//! valid; the AST also supplies its own backtracking matcher as the
//! ground truth the compiled automaton is checked against.

use proptest::prelude::*;
use redfa::minimize::MinimalDfa;

const ALPHABET: [u8; 3] = [b'a', b'b', b'c'];

#[derive(Debug, Clone)]
enum ReTree {
    Lit(u8),
    Concat(Box<ReTree>, Box<ReTree>),
    Alt(Box<ReTree>, Box<ReTree>),
    Star(Box<ReTree>),
    Plus(Box<ReTree>),
    Opt(Box<ReTree>),
}

impl ReTree {
    fn render(&self, out: &mut String) {
        match self {
            ReTree::Lit(b) => out.push(*b as char),
            ReTree::Concat(a, b) => {
                a.render(out);
                b.render(out);
            }
            ReTree::Alt(a, b) => {
                out.push('(');
                a.render(out);
                out.push('|');
                b.render(out);
                out.push(')');
            }
            ReTree::Star(a) => {
                out.push('(');
                a.render(out);
                out.push_str(")*");
            }
            ReTree::Plus(a) => {
                out.push('(');
                a.render(out);
                out.push_str(")+");
            }
            ReTree::Opt(a) => {
                out.push('(');
                a.render(out);
                out.push_str(")?");
            }
        }
    }

    fn to_regex(&self) -> String {
        let mut s = String::new();
        self.render(&mut s);
        s
    }

    /// Ground-truth acceptance via a backtracking continuation-passing
    /// matcher, independent of the compiled automaton.
    fn matches(&self, s: &[u8]) -> bool {
        go(self, s, &|rest| rest.is_empty())
    }
}

fn go(tree: &ReTree, s: &[u8], k: &dyn Fn(&[u8]) -> bool) -> bool {
    match tree {
        ReTree::Lit(b) => !s.is_empty() && s[0] == *b && k(&s[1..]),
        ReTree::Concat(a, b) => go(a, s, &|rest| go(b, rest, k)),
        ReTree::Alt(a, b) => go(a, s, k) || go(b, s, k),
        ReTree::Opt(a) => k(s) || go(a, s, k),
        // Only accept a loop iteration that strictly shortens the
        // remaining input, so an inner pattern that can match the empty
        // string (e.g. `(a?)*`) can't recurse forever.
        ReTree::Star(a) => k(s) || go(a, s, &|rest| rest.len() < s.len() && go(tree, rest, k)),
        ReTree::Plus(a) => go(a, s, &|rest| go(&ReTree::Star(a.clone()), rest, k)),
    }
}

fn tree_strategy() -> impl Strategy<Value = ReTree> {
    let leaf = prop::sample::select(&ALPHABET[..]).prop_map(ReTree::Lit);
    leaf.prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| ReTree::Concat(Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| ReTree::Alt(Box::new(a), Box::new(b))),
            inner.clone().prop_map(|a| ReTree::Star(Box::new(a))),
            inner.clone().prop_map(|a| ReTree::Plus(Box::new(a))),
            inner.prop_map(|a| ReTree::Opt(Box::new(a))),
        ]
    })
}

fn input_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(&ALPHABET[..]), 0..6)
}

/// Walks `dfa` on `input` using only its public edge representation.
fn accepts(dfa: &MinimalDfa, input: &[u8]) -> bool {
    let mut state = dfa.start();
    for &b in input {
        let Some((_, dst, _)) = dfa.edges().find(|(src, _, labels)| {
            *src == state && labels.runs().iter().any(|&(lo, hi)| lo <= b && b <= hi)
        }) else {
            return false;
        };
        state = dst;
    }
    dfa.state(state).is_accept()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn round_trip_matches_reference_matcher(tree in tree_strategy(), input in input_strategy()) {
        let src = tree.to_regex();
        let dfa = redfa::compile(src.as_bytes())
            .unwrap_or_else(|e| panic!("generated regex {src:?} failed to compile: {e}"));
        prop_assert_eq!(
            accepts(&dfa, &input),
            tree.matches(&input),
            "regex {:?} on input {:?}",
            src,
            String::from_utf8_lossy(&input),
        );
    }
}
