//! Rendering a minimal DFA. Exposed as a visitor trait, so the DOT
//! renderer is one implementation among possibly others, and tests can
//! substitute a recording visitor instead of asserting on formatted text.

use std::fmt::Write as _;

use crate::minimize::MinimalDfa;

/// Receives the minimal DFA one state and one edge at a time, in a fixed
/// order: every state (ascending by index), then every edge (ascending by
/// source, then destination).
pub trait Visitor {
    fn start(&mut self);
    fn state(&mut self, index: usize, accepting: bool, is_start: bool);
    fn edge(&mut self, src: usize, dst: usize, label: &str);
    fn finish(&mut self);
}

/// Walks `dfa`, driving `visitor` through every state and edge.
pub fn walk(dfa: &MinimalDfa, visitor: &mut impl Visitor) {
    visitor.start();
    for (index, state) in dfa.states() {
        visitor.state(index, state.is_accept(), index == dfa.start());
    }
    for (src, dst, labels) in dfa.edges() {
        visitor.edge(src, dst, &edge_label(labels));
    }
    visitor.finish();
}

/// Builds the label for one edge: maximal runs of consecutive characters
/// become either a single escaped character, `[lo-hi]`, or `[lohi]`
/// (no hyphen when `hi - lo == 1`); multiple runs are joined by DOT's
/// literal `\n`.
fn edge_label(labels: &crate::minimize::LabelSet) -> String {
    let runs = labels.runs();
    let mut pieces = Vec::with_capacity(runs.len());
    for (lo, hi) in runs {
        let piece = if lo == hi {
            escape_dot(lo)
        } else if hi - lo == 1 {
            format!("[{}{}]", escape_dot(lo), escape_dot(hi))
        } else {
            format!("[{}-{}]", escape_dot(lo), escape_dot(hi))
        };
        pieces.push(piece);
    }
    pieces.join(r"\n")
}

/// Escapes a byte for inclusion inside a DOT quoted string label.
fn escape_dot(ch: u8) -> String {
    match ch {
        b'\t' => r"\t".to_string(),
        b'\n' => r"\n".to_string(),
        b'"' => "\\\"".to_string(),
        b'\\' => r"\\".to_string(),
        c if c.is_ascii_graphic() || c == b' ' => (c as char).to_string(),
        c => format!("\\x{c:02x}"),
    }
}

/// Renders a minimal DFA as a Graphviz DOT digraph: left-to-right rank
/// order, Helvetica-family fonts, double circles for accepts, single
/// circles otherwise, one edge per non-empty entry of the inverse delta.
pub struct DotVisitor {
    out: String,
}

impl DotVisitor {
    pub fn new() -> Self {
        DotVisitor { out: String::new() }
    }

    pub fn into_dot(self) -> String {
        self.out
    }
}

impl Default for DotVisitor {
    fn default() -> Self {
        Self::new()
    }
}

impl Visitor for DotVisitor {
    fn start(&mut self) {
        self.out.push_str("digraph dfa {\n");
        self.out.push_str("    rankdir=LR;\n");
        self.out.push_str("    node [fontname=\"Helvetica\"];\n");
        self.out.push_str("    edge [fontname=\"Helvetica\"];\n");
    }

    fn state(&mut self, index: usize, accepting: bool, is_start: bool) {
        let shape = if accepting { "doublecircle" } else { "circle" };
        let _ = writeln!(self.out, "    {index} [shape={shape}];");
        if is_start {
            let _ = writeln!(
                self.out,
                "    start_arrow_{index} [shape=point, style=invis];"
            );
            let _ = writeln!(self.out, "    start_arrow_{index} -> {index};");
        }
    }

    fn edge(&mut self, src: usize, dst: usize, label: &str) {
        let _ = writeln!(self.out, "    {src} -> {dst} [label=\"{label}\"];");
    }

    fn finish(&mut self) {
        self.out.push_str("}\n");
    }
}

/// Convenience entry point: renders `dfa` as DOT text.
pub fn to_dot(dfa: &MinimalDfa) -> String {
    let mut visitor = DotVisitor::new();
    walk(dfa, &mut visitor);
    visitor.into_dot()
}
