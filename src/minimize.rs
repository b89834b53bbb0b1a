use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use color_eyre::{Report, Result};
use tracing::debug;

use crate::dfa::Dfa;

/// States reachable from the start state by following defined transitions.
fn reachable_states(dfa: &Dfa) -> BTreeSet<String> {
    let mut reachable = BTreeSet::new();
    let mut queue = VecDeque::new();

    if let Some(start) = dfa.core().start_state() {
        queue.push_back(start.clone());
    }

    while let Some(state) = queue.pop_front() {
        if !reachable.insert(state.clone()) {
            continue;
        }
        for symbol in dfa.core().alphabet() {
            if let Some(next) = dfa.next_state(&state, *symbol) {
                if !reachable.contains(next) {
                    queue.push_back(next.clone());
                }
            }
        }
    }

    reachable
}

fn block_of(blocks: &[BTreeSet<String>], state: &str) -> Option<usize> {
    blocks.iter().position(|block| block.contains(state))
}

/// Split one block by transition signature: the tuple, over the alphabet in
/// sorted order, of the block each symbol-successor falls into (None for an
/// undefined edge). Grouping through a BTreeMap keeps the sub-block order
/// deterministic.
fn split_block(
    dfa: &Dfa,
    block: &BTreeSet<String>,
    blocks: &[BTreeSet<String>],
) -> Vec<BTreeSet<String>> {
    if block.len() <= 1 {
        return vec![block.clone()];
    }

    let mut groups: BTreeMap<Vec<Option<usize>>, BTreeSet<String>> = BTreeMap::new();

    for state in block {
        let signature: Vec<Option<usize>> = dfa
            .core()
            .alphabet()
            .iter()
            .map(|symbol| {
                dfa.next_state(state, *symbol)
                    .and_then(|next| block_of(blocks, next))
            })
            .collect();
        groups.entry(signature).or_default().insert(state.clone());
    }

    groups.into_values().collect()
}

/// Minimize a DFA by partition refinement. Unreachable states are dropped
/// first; the accept / non-accept split is then refined with full passes
/// until no block splits. Two reachable states land in the same final
/// block iff no suffix distinguishes them, so the result is the minimal
/// equivalent DFA. The pass count is bounded by the state count.
pub fn minimize(dfa: &Dfa) -> Result<Dfa> {
    let reachable = reachable_states(dfa);
    if reachable.is_empty() {
        return Ok(Dfa::new());
    }

    let accepting: BTreeSet<String> = reachable
        .iter()
        .filter(|state| dfa.core().is_accept(state))
        .cloned()
        .collect();
    let rejecting: BTreeSet<String> = reachable.difference(&accepting).cloned().collect();

    let mut blocks: Vec<BTreeSet<String>> = Vec::new();
    if !accepting.is_empty() {
        blocks.push(accepting);
    }
    if !rejecting.is_empty() {
        blocks.push(rejecting);
    }

    loop {
        let mut changed = false;
        let mut refined = Vec::new();

        for block in &blocks {
            let split = split_block(dfa, block, &blocks);
            if split.len() > 1 {
                changed = true;
            }
            refined.extend(split);
        }

        blocks = refined;
        if !changed {
            break;
        }
    }

    // One representative state per block, named by block position
    let mut membership: HashMap<String, usize> = HashMap::new();
    for (index, block) in blocks.iter().enumerate() {
        for state in block {
            membership.insert(state.clone(), index);
        }
    }

    let mut minimal = Dfa::new();
    for (index, block) in blocks.iter().enumerate() {
        // All members agree on acceptance by the refinement invariant
        let accepting = block.iter().any(|state| dfa.core().is_accept(state));
        minimal.add_state(&format!("q{}", index), accepting, false);
    }

    if let Some(start) = dfa.core().start_state() {
        if let Some(index) = membership.get(start) {
            minimal.set_start_state(&format!("q{}", index));
        }
    }

    for (index, block) in blocks.iter().enumerate() {
        // First member in name order: arbitrary but deterministic
        let sample = match block.iter().next() {
            Some(sample) => sample,
            None => continue,
        };
        for symbol in dfa.core().alphabet() {
            if let Some(next) = dfa.next_state(sample, *symbol) {
                if let Some(target) = membership.get(next) {
                    minimal
                        .add_transition(&format!("q{}", index), &format!("q{}", target), *symbol)
                        .map_err(Report::new)?;
                }
            }
        }
    }

    debug!(
        original = dfa.core().state_count(),
        reachable = reachable.len(),
        minimal = minimal.core().state_count(),
        "partition refinement finished"
    );

    Ok(minimal)
}
