//! Subset construction: turning a Thompson NFA into a DFA.
//!
//! Classical Rabin-Scott. Because `Nfa` already keeps its states in a
//! dense, pre-indexed arena (see `nfa` module docs), there is no separate
//! "number every NFA state" pass to run first the way the source this
//! crate descended from required one (`index_states`) before subset
//! equality could be checked by integer comparison -- `StateId` already
//! is that integer.

use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::nfa::{Nfa, StateId};

/// One DFA state: a dense row of transitions indexed by alphabet
/// position, an accept flag, and the NFA-state subset it was built from.
#[derive(Debug, Clone)]
pub struct DfaState {
    outs: Vec<Option<usize>>,
    accept: bool,
    subset: BTreeSet<StateId>,
}

impl DfaState {
    pub fn is_accept(&self) -> bool {
        self.accept
    }

    /// The originating NFA-state subset (§3's "back-reference").
    pub fn nfa_subset(&self) -> &BTreeSet<StateId> {
        &self.subset
    }
}

/// A deterministic finite automaton built by subset construction over an
/// `Nfa`. `outs`/`delta` are the same table: because DFA states are
/// allocated into a dense `Vec` at construction time (like the NFA arena),
/// the separate "post-pass transition table" the source computes after
/// the fact collapses into reading `DfaState::outs` directly -- there is
/// no second pass to write.
#[derive(Debug, Clone)]
pub struct Dfa {
    states: Vec<DfaState>,
    start: usize,
    /// The compacted alphabet, ascending by ordinal ordinal (invariant
    /// (a): length equals the popcount of the NFA's alphabet bitset).
    alphabet: Vec<u8>,
    /// Maps an ASCII byte to its position in `alphabet`, or `None`.
    char_to_alpha: [Option<usize>; 128],
}

impl Dfa {
    pub fn from_nfa(nfa: &Nfa) -> Dfa {
        let alphabet: Vec<u8> = nfa.alphabet().iter().collect();
        let mut char_to_alpha: [Option<usize>; 128] = [None; 128];
        for (i, &c) in alphabet.iter().enumerate() {
            char_to_alpha[c as usize] = Some(i);
        }

        let mut states: Vec<DfaState> = Vec::new();
        let mut index_of: HashMap<BTreeSet<StateId>, usize> = HashMap::new();
        let mut worklist: VecDeque<usize> = VecDeque::new();

        let q0 = nfa.epsilon_closure([nfa.start()]);
        let accept0 = q0.contains(&nfa.accept());
        index_of.insert(q0.clone(), 0);
        states.push(DfaState {
            outs: vec![None; alphabet.len()],
            accept: accept0,
            subset: q0,
        });
        worklist.push_back(0);

        while let Some(s_idx) = worklist.pop_front() {
            let subset = states[s_idx].subset.clone();
            for (i, &c) in alphabet.iter().enumerate() {
                let mut t: BTreeSet<StateId> = BTreeSet::new();
                for &s in &subset {
                    let st = nfa.state(s);
                    if st.ch == c {
                        if let Some(out1) = st.out1 {
                            t.extend(nfa.epsilon_closure([out1]));
                        }
                    }
                }
                if t.is_empty() {
                    continue;
                }
                let dest = match index_of.get(&t) {
                    Some(&existing) => existing,
                    None => {
                        let idx = states.len();
                        let accept = t.contains(&nfa.accept());
                        index_of.insert(t.clone(), idx);
                        states.push(DfaState {
                            outs: vec![None; alphabet.len()],
                            accept,
                            subset: t,
                        });
                        worklist.push_back(idx);
                        idx
                    }
                };
                states[s_idx].outs[i] = Some(dest);
            }
        }

        Dfa {
            states,
            start: 0,
            alphabet,
            char_to_alpha,
        }
    }

    pub fn size(&self) -> usize {
        self.states.len()
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn alphabet(&self) -> &[u8] {
        &self.alphabet
    }

    pub fn is_accept(&self, state: usize) -> bool {
        self.states[state].accept
    }

    pub fn state(&self, idx: usize) -> &DfaState {
        &self.states[idx]
    }

    fn alpha_index(&self, ch: u8) -> Option<usize> {
        if ch < 128 {
            self.char_to_alpha[ch as usize]
        } else {
            None
        }
    }

    /// `delta[state][c]`: the destination state on character `c` from
    /// `state`, or `None` ("DEAD" -- no transition, never a real state).
    pub fn delta(&self, state: usize, ch: u8) -> Option<usize> {
        let i = self.alpha_index(ch)?;
        self.states[state].outs[i]
    }

    /// `delta` indexed directly by alphabet position, for callers (the
    /// minimizer) that already iterate `alphabet()` and have the index in
    /// hand.
    pub fn delta_at(&self, state: usize, alpha_idx: usize) -> Option<usize> {
        self.states[state].outs[alpha_idx]
    }

    /// Builds a `Dfa` directly from a transition table, bypassing subset
    /// construction. Used by tests that need to re-feed an already
    /// minimized automaton's shape back through the minimizer (property
    /// #4, idempotence) without round-tripping it through a regex.
    #[cfg(test)]
    pub(crate) fn from_raw(
        start: usize,
        accepts: Vec<bool>,
        alphabet: Vec<u8>,
        outs: Vec<Vec<Option<usize>>>,
    ) -> Dfa {
        let mut char_to_alpha: [Option<usize>; 128] = [None; 128];
        for (i, &c) in alphabet.iter().enumerate() {
            char_to_alpha[c as usize] = Some(i);
        }
        let states = accepts
            .into_iter()
            .zip(outs)
            .map(|(accept, outs)| DfaState {
                outs,
                accept,
                subset: BTreeSet::new(),
            })
            .collect();
        Dfa {
            states,
            start,
            alphabet,
            char_to_alpha,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn build(src: &str) -> Dfa {
        Dfa::from_nfa(&parse(src.as_bytes()).unwrap())
    }

    #[test]
    fn literal_has_start_and_one_more_state() {
        let dfa = build("a");
        assert_eq!(dfa.size(), 2);
        assert!(!dfa.is_accept(dfa.start()));
        let dest = dfa.delta(dfa.start(), b'a').unwrap();
        assert!(dfa.is_accept(dest));
    }

    #[test]
    fn star_collapses_to_a_single_looping_state() {
        // a(b|c)*: after the DFA (pre-minimization) has a start state, a
        // state after 'a' that loops to itself on b/c.
        let dfa = build("a(b|c)*");
        let after_a = dfa.delta(dfa.start(), b'a').unwrap();
        assert!(dfa.is_accept(after_a));
        assert_eq!(dfa.delta(after_a, b'b'), dfa.delta(after_a, b'c'));
        assert_eq!(dfa.delta(after_a, b'b'), Some(after_a));
    }

    #[test]
    fn dead_transitions_are_none() {
        let dfa = build("a");
        let accept = dfa.delta(dfa.start(), b'a').unwrap();
        assert_eq!(dfa.delta(accept, b'a'), None);
    }

    #[test]
    fn alphabet_length_matches_distinct_literals() {
        let dfa = build("who|what|where");
        assert_eq!(
            dfa.alphabet().len(),
            "whoatre".chars().collect::<std::collections::BTreeSet<_>>().len()
        );
    }
}
