use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::automaton::{MachineCore, Symbol, ValidationError};

/// Nondeterministic finite automaton without epsilon transitions. The
/// lookup table maps `(state, symbol)` to the set of successor states.
/// State sets are kept as `BTreeSet` so that traces and subset keys are
/// canonical regardless of insertion order.
#[derive(Debug, Clone, Default)]
pub struct Nfa {
    core: MachineCore,
    table: HashMap<(String, char), BTreeSet<String>>,
}

impl Nfa {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn core(&self) -> &MachineCore {
        &self.core
    }

    pub fn add_state(&mut self, name: &str, is_accept: bool, is_start: bool) {
        self.core.add_state(name, is_accept, is_start);
    }

    pub fn set_start_state(&mut self, name: &str) {
        self.core.set_start_state(name);
    }

    pub fn set_accept_state(&mut self, name: &str) {
        self.core.set_accept_state(name);
    }

    pub fn add_transition(&mut self, from: &str, to: &str, symbol: char) {
        self.core
            .record_transition(from, to, Symbol::Char(symbol), None);
        self.table
            .entry((from.to_string(), symbol))
            .or_default()
            .insert(to.to_string());
    }

    /// All successor states for `(state, symbol)`; empty if undefined.
    pub fn next_states(&self, state: &str, symbol: char) -> BTreeSet<String> {
        self.table
            .get(&(state.to_string(), symbol))
            .cloned()
            .unwrap_or_default()
    }

    pub fn accepts(&self, input: &str) -> bool {
        let start = match self.core.start_state() {
            Some(start) => start.clone(),
            None => return false,
        };

        let mut current: BTreeSet<String> = BTreeSet::from([start]);

        for symbol in input.chars() {
            let mut next = BTreeSet::new();
            for state in &current {
                next.extend(self.next_states(state, symbol));
            }
            if next.is_empty() {
                return false;
            }
            current = next;
        }

        current.iter().any(|state| self.core.is_accept(state))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.core.validate()
    }
}

/// NFA additionally permitting epsilon transitions. The table is keyed by
/// `Symbol` so that epsilon edges live alongside character edges without
/// polluting the public alphabet.
#[derive(Debug, Clone, Default)]
pub struct EpsilonNfa {
    core: MachineCore,
    table: HashMap<(String, Symbol), BTreeSet<String>>,
}

impl EpsilonNfa {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn core(&self) -> &MachineCore {
        &self.core
    }

    pub fn add_state(&mut self, name: &str, is_accept: bool, is_start: bool) {
        self.core.add_state(name, is_accept, is_start);
    }

    pub fn set_start_state(&mut self, name: &str) {
        self.core.set_start_state(name);
    }

    pub fn set_accept_state(&mut self, name: &str) {
        self.core.set_accept_state(name);
    }

    pub fn clear_accept_state(&mut self, name: &str) {
        self.core.clear_accept_state(name);
    }

    pub fn add_transition(&mut self, from: &str, to: &str, symbol: Symbol) {
        self.core.record_transition(from, to, symbol, None);
        self.table
            .entry((from.to_string(), symbol))
            .or_default()
            .insert(to.to_string());
    }

    pub fn next_states(&self, state: &str, symbol: Symbol) -> BTreeSet<String> {
        self.table
            .get(&(state.to_string(), symbol))
            .cloned()
            .unwrap_or_default()
    }

    /// Fixpoint of the set reachable through epsilon edges alone. Always
    /// contains the seed states themselves.
    pub fn epsilon_closure(&self, states: &BTreeSet<String>) -> BTreeSet<String> {
        let mut closure = states.clone();
        let mut queue: VecDeque<String> = states.iter().cloned().collect();

        while let Some(state) = queue.pop_front() {
            for next in self.next_states(&state, Symbol::Epsilon) {
                if closure.insert(next.clone()) {
                    queue.push_back(next);
                }
            }
        }

        closure
    }

    pub fn accepts(&self, input: &str) -> bool {
        let start = match self.core.start_state() {
            Some(start) => start.clone(),
            None => return false,
        };

        let mut current = self.epsilon_closure(&BTreeSet::from([start]));

        for symbol in input.chars() {
            let mut next = BTreeSet::new();
            for state in &current {
                next.extend(self.next_states(state, Symbol::Char(symbol)));
            }
            if next.is_empty() {
                return false;
            }
            current = self.epsilon_closure(&next);
        }

        current.iter().any(|state| self.core.is_accept(state))
    }

    /// All epsilon edges as `(from, to)` pairs, in insertion order.
    pub fn epsilon_transitions(&self) -> Vec<(String, String)> {
        self.core
            .transitions()
            .iter()
            .filter(|t| t.symbol == Symbol::Epsilon)
            .map(|t| (t.from.clone(), t.to.clone()))
            .collect()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.core.validate()
    }
}
