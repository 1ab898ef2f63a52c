//! Hopcroft-style partition refinement, collapsing a `Dfa` into its
//! minimal equivalent and materializing the inverse (destination-keyed)
//! transition table the emitter renders from.

use std::collections::{HashMap, HashSet};

use crate::dfa::Dfa;

/// Sentinel meaning "the dead/error state" in the `distinguishable`
/// recursion -- never a real DFA-state index. Kept as a literal
/// out-of-range constant (rather than `Option<usize>`) only at this
/// boundary, because the algorithm below is specified as flat integer
/// comparisons against a sentinel, not as `match` arms threaded through
/// recursion; everywhere else in this crate DEAD is `None`.
const DEAD: usize = usize::MAX;

/// A cell of the `(N-1) x N` indistinguishability table. `Visited` reuses
/// the same cell `merge[i][i+1]` as a per-state marker during
/// equivalence-class construction (SPEC_FULL.md 4.5.3) rather than a
/// second array, matching the source this crate descended from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Merge {
    Distinguishable,
    Indistinguishable,
    Visited,
}

/// A 128-bit label set (two 64-bit halves named the way the data model
/// in SPEC_FULL.md 4.5.4 names them, since that split is part of the
/// specified representation at this boundary, not an implementation
/// detail -- contrast `crate::alphabet::Alphabet`, which uses one `u128`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelSet {
    low: u64,
    high: u64,
}

impl LabelSet {
    pub fn empty() -> Self {
        LabelSet::default()
    }

    pub fn insert(&mut self, ch: u8) {
        if ch < 64 {
            self.low |= 1u64 << ch;
        } else {
            self.high |= 1u64 << (ch - 64);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.low == 0 && self.high == 0
    }

    fn contains(&self, ch: u8) -> bool {
        if ch < 64 {
            self.low & (1u64 << ch) != 0
        } else {
            self.high & (1u64 << (ch - 64)) != 0
        }
    }

    /// Maximal runs of consecutive set bits, ascending, as `(lo, hi)`
    /// inclusive pairs -- the shape the emitter collapses into `c`,
    /// `[lo-hi]`, or `[lohi]` labels.
    pub fn runs(&self) -> Vec<(u8, u8)> {
        let mut runs = Vec::new();
        let mut run_start: Option<u8> = None;
        for ch in 0u8..128 {
            if self.contains(ch) {
                if run_start.is_none() {
                    run_start = Some(ch);
                }
            } else if let Some(lo) = run_start.take() {
                runs.push((lo, ch - 1));
            }
        }
        if let Some(lo) = run_start {
            runs.push((lo, 127));
        }
        runs
    }
}

/// One state of the minimized automaton: the pre-minimization DFA-state
/// indices that collapsed into it.
#[derive(Debug, Clone)]
pub struct MinimalState {
    accept: bool,
    members: Vec<usize>,
}

impl MinimalState {
    pub fn is_accept(&self) -> bool {
        self.accept
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }
}

#[derive(Debug, Clone)]
pub struct MinimalDfa {
    states: Vec<MinimalState>,
    start: usize,
    /// `delta[src][dst]` = the set of characters labeling that edge.
    /// Dense `M x M` where `M` is the minimal state count, matching
    /// SPEC_FULL.md 4.5.4's "at most M^2 edges" shift in representation.
    delta: Vec<Vec<LabelSet>>,
}

impl MinimalDfa {
    pub fn size(&self) -> usize {
        self.states.len()
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn state(&self, idx: usize) -> &MinimalState {
        &self.states[idx]
    }

    pub fn states(&self) -> impl Iterator<Item = (usize, &MinimalState)> {
        self.states.iter().enumerate()
    }

    /// The non-empty edges, as `(src, dst, labels)`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, &LabelSet)> {
        self.delta.iter().enumerate().flat_map(move |(src, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, labels)| !labels.is_empty())
                .map(move |(dst, labels)| (src, dst, labels))
        })
    }

    pub fn from_dfa(dfa: &Dfa) -> MinimalDfa {
        let n = dfa.size();
        if n == 0 {
            return MinimalDfa {
                states: Vec::new(),
                start: 0,
                delta: Vec::new(),
            };
        }
        if n == 1 {
            let accept = dfa.is_accept(0);
            return MinimalDfa {
                states: vec![MinimalState {
                    accept,
                    members: vec![0],
                }],
                start: 0,
                delta: vec![vec![LabelSet::empty()]],
            };
        }

        let mut merge = build_indistinguishability_table(dfa);
        refine(dfa, &mut merge);
        let classes = build_equivalence_classes(dfa, &mut merge);

        let mut class_of = vec![0usize; n];
        for (class_idx, members) in classes.iter().enumerate() {
            for &m in members {
                class_of[m] = class_idx;
            }
        }

        let states: Vec<MinimalState> = classes
            .into_iter()
            .map(|members| {
                let accept = members.iter().any(|&m| dfa.is_accept(m));
                MinimalState { accept, members }
            })
            .collect();

        let m = states.len();
        let mut delta = vec![vec![LabelSet::empty(); m]; m];
        for (class_idx, state) in states.iter().enumerate() {
            let h = state.members[0];
            for (i, &c) in dfa.alphabet().iter().enumerate() {
                if let Some(o) = dfa.delta_at(h, i) {
                    delta[class_idx][class_of[o]].insert(c);
                }
            }
        }

        MinimalDfa {
            start: class_of[dfa.start()],
            states,
            delta,
        }
    }
}

/// SPEC_FULL.md 4.5.1: `merge[i][j] = Distinguishable` iff exactly one of
/// `i, j` accepts; `Indistinguishable` otherwise. Rows `0..N-1`, columns
/// `0..N` (only `j > i` is ever read).
fn build_indistinguishability_table(dfa: &Dfa) -> Vec<Vec<Merge>> {
    let n = dfa.size();
    let mut merge = vec![vec![Merge::Indistinguishable; n]; n - 1];
    for i in 0..n - 1 {
        for j in (i + 1)..n {
            merge[i][j] = if dfa.is_accept(i) != dfa.is_accept(j) {
                Merge::Distinguishable
            } else {
                Merge::Indistinguishable
            };
        }
    }
    merge
}

/// Moore-style fixed point: repeat until no cell changes, re-testing
/// every cell still marked `Indistinguishable` with `distinguishable`.
fn refine(dfa: &Dfa, merge: &mut Vec<Vec<Merge>>) {
    let n = dfa.size();
    loop {
        let mut changed = false;
        for i in 0..n - 1 {
            for j in (i + 1)..n {
                if merge[i][j] == Merge::Indistinguishable {
                    let mut memo = HashMap::new();
                    let mut in_progress = HashSet::new();
                    if distinguishable(i, j, dfa, merge, &mut memo, &mut in_progress) {
                        merge[i][j] = Merge::Distinguishable;
                        changed = true;
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }
}

/// `distinguishable(i, j)`: true if some suffix drives exactly one of
/// `i, j` to an accepting state. Recursive over suffixes, per
/// SPEC_FULL.md 4.5.2; the `in_progress` set is an explicit "assume
/// indistinguishable, reconcile after" guard, in place of relying on the
/// caller's fixed point alone to rescue a cyclic recursion.
fn distinguishable(
    i: usize,
    j: usize,
    dfa: &Dfa,
    merge: &[Vec<Merge>],
    memo: &mut HashMap<(usize, usize), bool>,
    in_progress: &mut HashSet<(usize, usize)>,
) -> bool {
    if i == j {
        return false;
    }
    let (lo, hi) = if i < j { (i, j) } else { (j, i) };

    if i != DEAD && j != DEAD {
        if let Merge::Distinguishable = merge[lo][hi] {
            return true;
        }
    }

    let accept_i = i != DEAD && dfa.is_accept(i);
    let accept_j = j != DEAD && dfa.is_accept(j);
    if accept_i != accept_j {
        return true;
    }

    let key = (lo, hi);
    if let Some(&verdict) = memo.get(&key) {
        return verdict;
    }
    if !in_progress.insert(key) {
        // Re-entered through a cycle before a verdict was reached: assume
        // indistinguishable for now, this call's own letters may still
        // overturn that once the rest of the recursion returns.
        return false;
    }

    let mut verdict = false;
    for &c in dfa.alphabet() {
        let oi = if i == DEAD { DEAD } else { dfa.delta(i, c).unwrap_or(DEAD) };
        let oj = if j == DEAD { DEAD } else { dfa.delta(j, c).unwrap_or(DEAD) };
        if distinguishable(oi, oj, dfa, merge, memo, in_progress) {
            verdict = true;
            break;
        }
    }

    in_progress.remove(&key);
    memo.insert(key, verdict);
    verdict
}

/// SPEC_FULL.md 4.5.3: visit rows `0..N-2` in order; each unvisited row
/// starts a new class, greedily (and recursively) absorbing every
/// indistinguishable column to its right.
fn build_equivalence_classes(dfa: &Dfa, merge: &mut [Vec<Merge>]) -> Vec<Vec<usize>> {
    let n = dfa.size();
    let mut classes: Vec<Vec<usize>> = Vec::new();
    let mut last_swept = false;

    for i in 0..n - 1 {
        if merge[i][i + 1] == Merge::Visited {
            continue;
        }
        let mut class = Vec::new();
        gather(i, n, merge, &mut class, &mut last_swept);
        classes.push(class);
    }
    if !last_swept {
        classes.push(vec![n - 1]);
    }
    classes
}

fn gather(
    state: usize,
    n: usize,
    merge: &mut [Vec<Merge>],
    class: &mut Vec<usize>,
    last_swept: &mut bool,
) {
    class.push(state);
    if state == n - 1 {
        *last_swept = true;
    }
    // Scan the whole row before marking `state` visited: the "visited"
    // marker lives at `merge[state][state + 1]`, the same cell `k`'s loop
    // below tests first (`k` starts at `state + 1`) -- writing it up front
    // would clobber that cell before it's ever read, so `state` could never
    // be merged with its immediate successor even when they're
    // indistinguishable.
    if state < merge.len() {
        for k in (state + 1)..n {
            if merge[state][k] == Merge::Indistinguishable {
                gather(k, n, merge, class, last_swept);
            }
        }
    }
    if state + 1 < n {
        merge[state][state + 1] = Merge::Visited;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dfa::Dfa;
    use crate::parser::parse;
    use proptest::prelude::*;

    fn minimize(src: &str) -> MinimalDfa {
        let nfa = parse(src.as_bytes()).unwrap();
        let dfa = Dfa::from_nfa(&nfa);
        MinimalDfa::from_dfa(&dfa)
    }

    #[test]
    fn a_b_or_c_star() {
        // The star only wraps `(b|c)`, not the leading `a`, so the empty
        // string is rejected and the start state is not itself accepting --
        // only the post-`a` state, which then loops on b/c, is.
        let min = minimize("a(b|c)*");
        assert_eq!(min.size(), 2);
        assert!(!min.state(min.start()).is_accept());
        let accepts = min.states().filter(|(_, s)| s.is_accept()).count();
        assert_eq!(accepts, 1);
    }

    #[test]
    fn ab_or_ac_star() {
        let min = minimize("(ab|ac)*");
        assert_eq!(min.size(), 2);
        assert!(min.state(min.start()).is_accept());
    }

    #[test]
    fn who_what_where_trie() {
        // The three word-ending states all reject every further character,
        // so they share one residual language (the empty string) and
        // collapse to a single accepting class: 7 states, 1 accept.
        let min = minimize("who|what|where");
        assert_eq!(min.size(), 7);
        let accepts = min.states().filter(|(_, s)| s.is_accept()).count();
        assert_eq!(accepts, 1);
    }

    #[test]
    fn mod_three_counter() {
        let min = minimize("(0|(1(01*(00)*0)*1)*)*");
        assert_eq!(min.size(), 3);
        assert!(min.state(min.start()).is_accept());
    }

    #[test]
    fn for_or_f_to_h_star() {
        // States: start, after one `f` (still eligible for the `for`
        // branch), mid-`[f-h]*` run (two-plus chars, or first char g/h),
        // after `fo` (committed to `for`, not accepting), and after `for`.
        // Only the `fo` state rejects on empty continuation: 5 states, 4
        // accepts.
        let min = minimize("for|[f-h]*");
        assert_eq!(min.size(), 5);
        assert!(min.state(min.start()).is_accept());
        let accepts = min.states().filter(|(_, s)| s.is_accept()).count();
        assert_eq!(accepts, 4);
    }

    #[test]
    fn c_identifier() {
        let min = minimize("[A-Za-z_][A-Za-z0-9_]*");
        assert_eq!(min.size(), 2);
        assert!(!min.state(min.start()).is_accept());
        let accepts = min.states().filter(|(_, s)| s.is_accept()).count();
        assert_eq!(accepts, 1);
    }

    #[test]
    fn minimizing_a_minimal_dfa_is_idempotent() {
        let nfa = parse(b"(0|(1(01*(00)*0)*1)*)*").unwrap();
        let dfa = Dfa::from_nfa(&nfa);
        let min = MinimalDfa::from_dfa(&dfa);

        // Re-express the minimal DFA's character-set-labeled edges as a
        // plain one-transition-per-character Dfa, and minimize again: a
        // correct minimizer must return an isomorphic automaton.
        let min_dfa = rebuild_as_dfa(&min);
        let min_again = MinimalDfa::from_dfa(&min_dfa);
        assert_eq!(min.size(), min_again.size());
        assert_eq!(
            min.states().filter(|(_, s)| s.is_accept()).count(),
            min_again.states().filter(|(_, s)| s.is_accept()).count(),
        );
    }

    /// Re-expresses a `MinimalDfa`'s character-set-labeled edges as a
    /// plain `Dfa` (one transition per character) so it can be fed back
    /// through the minimizer.
    fn rebuild_as_dfa(min: &MinimalDfa) -> Dfa {
        let accepts: Vec<bool> = min.states().map(|(_, s)| s.is_accept()).collect();
        let alphabet: Vec<u8> = {
            let mut chars = std::collections::BTreeSet::new();
            for (_, _, labels) in min.edges() {
                for (lo, hi) in labels.runs() {
                    for c in lo..=hi {
                        chars.insert(c);
                    }
                }
            }
            chars.into_iter().collect()
        };
        let mut outs = vec![vec![None; alphabet.len()]; min.size()];
        for (src, dst, labels) in min.edges() {
            for (lo, hi) in labels.runs() {
                for c in lo..=hi {
                    let i = alphabet.iter().position(|&a| a == c).unwrap();
                    outs[src][i] = Some(dst);
                }
            }
        }
        Dfa::from_raw(min.start(), accepts, alphabet, outs)
    }

    /// A small recursive generator of syntactically valid regex text
    /// (not a semantic AST -- the idempotence property below only needs
    /// *a* regex to minimize twice, not a ground truth to check matches
    /// against).
    fn regex_strategy() -> impl Strategy<Value = String> {
        let leaf = prop::sample::select(&["a", "b", "c"][..]).prop_map(|s| s.to_string());
        leaf.prop_recursive(3, 20, 3, |inner| {
            prop_oneof![
                (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{a}{b}")),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("({a}|{b})")),
                inner.clone().prop_map(|a| format!("({a})*")),
                inner.prop_map(|a| format!("({a})?")),
            ]
        })
    }

    proptest! {
        /// Invariant #4 (SPEC_FULL.md 8): minimizing a minimal DFA produces
        /// an isomorphic minimal DFA. Checked by re-expressing the minimal
        /// DFA's character-set edges as a plain `Dfa` and minimizing again.
        #[test]
        fn minimizing_a_minimal_dfa_is_idempotent_prop(src in regex_strategy()) {
            let nfa = parse(src.as_bytes()).unwrap();
            let dfa = Dfa::from_nfa(&nfa);
            let min = MinimalDfa::from_dfa(&dfa);

            let min_dfa = rebuild_as_dfa(&min);
            let min_again = MinimalDfa::from_dfa(&min_dfa);

            prop_assert_eq!(min.size(), min_again.size());
            prop_assert_eq!(
                min.states().filter(|(_, s)| s.is_accept()).count(),
                min_again.states().filter(|(_, s)| s.is_accept()).count(),
            );
        }
    }
}
