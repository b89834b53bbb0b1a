use std::collections::{BTreeSet, HashMap, VecDeque};

use color_eyre::{Report, Result};
use itertools::Itertools;
use tracing::debug;

use crate::automaton::Symbol;
use crate::dfa::Dfa;
use crate::nfa::{EpsilonNfa, Nfa};

/// Remove epsilon transitions, preserving state identities. A state is
/// accepting in the result iff its epsilon closure meets the original
/// accept set; its successors on a symbol are the closure of the moves of
/// its closure.
pub fn eliminate_epsilons(enfa: &EpsilonNfa) -> Nfa {
    let mut nfa = Nfa::new();

    for name in enfa.core().states().keys() {
        nfa.add_state(name, false, false);
    }
    if let Some(start) = enfa.core().start_state() {
        nfa.set_start_state(start);
    }

    for name in enfa.core().states().keys().sorted() {
        let closure = enfa.epsilon_closure(&BTreeSet::from([name.clone()]));

        if closure.iter().any(|state| enfa.core().is_accept(state)) {
            nfa.set_accept_state(name);
        }

        for symbol in enfa.core().alphabet() {
            let mut moves = BTreeSet::new();
            for state in &closure {
                moves.extend(enfa.next_states(state, Symbol::Char(*symbol)));
            }
            if moves.is_empty() {
                continue;
            }
            for target in enfa.epsilon_closure(&moves) {
                nfa.add_transition(name, &target, *symbol);
            }
        }
    }

    debug!(
        states = nfa.core().state_count(),
        transitions = nfa.core().transition_count(),
        "epsilon elimination finished"
    );

    nfa
}

/// Powerset construction. Each DFA state stands for a non-empty reachable
/// subset of NFA states; subsets are keyed by `BTreeSet`, so structurally
/// equal subsets always map to the same DFA state regardless of discovery
/// order. Empty successor subsets emit no transition, so the result may be
/// partial. Terminates because subsets are bounded by 2^|states|.
pub fn determinize(nfa: &Nfa) -> Result<Dfa> {
    let mut dfa = Dfa::new();

    let start = match nfa.core().start_state() {
        Some(start) => start.clone(),
        None => return Ok(dfa),
    };

    let mut names: HashMap<BTreeSet<String>, String> = HashMap::new();
    let mut counter = 0usize;
    // Each subset is enqueued exactly once, when first admitted
    let mut worklist: VecDeque<(String, BTreeSet<String>)> = VecDeque::new();

    let mut admit = |subset: BTreeSet<String>,
                     dfa: &mut Dfa,
                     worklist: &mut VecDeque<(String, BTreeSet<String>)>|
     -> String {
        if let Some(existing) = names.get(&subset) {
            return existing.clone();
        }
        counter += 1;
        let name = format!("q{}", counter);
        let accepting = subset.iter().any(|state| nfa.core().is_accept(state));
        dfa.add_state(&name, accepting, false);
        names.insert(subset.clone(), name.clone());
        worklist.push_back((name.clone(), subset));
        name
    };

    let start_subset = BTreeSet::from([start]);
    let start_name = admit(start_subset, &mut dfa, &mut worklist);
    dfa.set_start_state(&start_name);

    while let Some((from, subset)) = worklist.pop_front() {
        for symbol in nfa.core().alphabet().iter().copied() {
            let mut successors = BTreeSet::new();
            for state in &subset {
                successors.extend(nfa.next_states(state, symbol));
            }
            if successors.is_empty() {
                continue;
            }

            let to = admit(successors, &mut dfa, &mut worklist);
            dfa.add_transition(&from, &to, symbol).map_err(Report::new)?;
        }
    }

    debug!(
        states = dfa.core().state_count(),
        transitions = dfa.core().transition_count(),
        "subset construction finished"
    );

    Ok(dfa)
}
