use tracing::debug;

use crate::automaton::Symbol;
use crate::nfa::EpsilonNfa;
use crate::regex::RegexNode;

/// Fragment of the machine under construction: one entry state and one
/// exit state, both freshly allocated for the fragment.
struct Fragment {
    start: String,
    accept: String,
}

/// Allocates state names and assembles fragments. The counter is owned by
/// the builder, so concurrent constructions never share numbering.
struct ThompsonBuilder {
    nfa: EpsilonNfa,
    counter: usize,
}

impl ThompsonBuilder {
    fn new() -> Self {
        ThompsonBuilder {
            nfa: EpsilonNfa::new(),
            counter: 0,
        }
    }

    fn fresh_state(&mut self) -> String {
        self.counter += 1;
        format!("q{}", self.counter)
    }

    /// New start/accept pair joined by a single edge on `symbol`.
    fn leaf(&mut self, symbol: Symbol) -> Fragment {
        let start = self.fresh_state();
        let accept = self.fresh_state();
        self.nfa.add_state(&start, false, false);
        self.nfa.add_state(&accept, true, false);
        self.nfa.add_transition(&start, &accept, symbol);
        Fragment { start, accept }
    }

    fn build(&mut self, node: &RegexNode) -> Fragment {
        match node {
            RegexNode::Epsilon => self.leaf(Symbol::Epsilon),
            RegexNode::Char(c) => self.leaf(Symbol::Char(*c)),

            RegexNode::Concat(left, right) => {
                let left = self.build(left);
                let right = self.build(right);

                // The joint fragment keeps only the right accept
                self.nfa.clear_accept_state(&left.accept);
                self.nfa
                    .add_transition(&left.accept, &right.start, Symbol::Epsilon);

                Fragment {
                    start: left.start,
                    accept: right.accept,
                }
            }

            RegexNode::Or(left, right) => {
                let left = self.build(left);
                let right = self.build(right);

                let start = self.fresh_state();
                let accept = self.fresh_state();
                self.nfa.add_state(&start, false, false);
                self.nfa.add_state(&accept, true, false);

                self.nfa.clear_accept_state(&left.accept);
                self.nfa.clear_accept_state(&right.accept);

                self.nfa.add_transition(&start, &left.start, Symbol::Epsilon);
                self.nfa
                    .add_transition(&start, &right.start, Symbol::Epsilon);
                self.nfa
                    .add_transition(&left.accept, &accept, Symbol::Epsilon);
                self.nfa
                    .add_transition(&right.accept, &accept, Symbol::Epsilon);

                Fragment { start, accept }
            }

            RegexNode::Star(inner) => self.closure(inner, true),
            RegexNode::Plus(inner) => self.closure(inner, false),
        }
    }

    /// Shared star/plus construction; plus omits the skip edge so at least
    /// one pass through the inner fragment is forced.
    fn closure(&mut self, inner: &RegexNode, allow_skip: bool) -> Fragment {
        let inner = self.build(inner);

        let start = self.fresh_state();
        let accept = self.fresh_state();
        self.nfa.add_state(&start, false, false);
        self.nfa.add_state(&accept, true, false);

        self.nfa.clear_accept_state(&inner.accept);

        self.nfa
            .add_transition(&start, &inner.start, Symbol::Epsilon); // enter
        if allow_skip {
            self.nfa.add_transition(&start, &accept, Symbol::Epsilon); // skip
        }
        self.nfa
            .add_transition(&inner.accept, &inner.start, Symbol::Epsilon); // loop
        self.nfa
            .add_transition(&inner.accept, &accept, Symbol::Epsilon); // exit

        Fragment { start, accept }
    }
}

/// Thompson's construction: regex AST to ε-NFA via fragment composition.
/// The result has exactly one start state and one accept state.
pub fn build_epsilon_nfa(ast: &RegexNode) -> EpsilonNfa {
    let mut builder = ThompsonBuilder::new();
    let fragment = builder.build(ast);

    let mut nfa = builder.nfa;
    nfa.set_start_state(&fragment.start);

    debug!(
        states = nfa.core().state_count(),
        transitions = nfa.core().transition_count(),
        "thompson construction finished"
    );

    nfa
}
