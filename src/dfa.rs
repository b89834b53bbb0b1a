use std::collections::HashMap;

use crate::automaton::{MachineCore, Symbol, ValidationError};

/// Deterministic finite automaton. The lookup table maps `(state, symbol)`
/// to the unique successor state; inserting a second entry for an existing
/// key fails instead of silently overwriting it.
#[derive(Debug, Clone, Default)]
pub struct Dfa {
    core: MachineCore,
    table: HashMap<(String, char), String>,
}

impl Dfa {
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

    /// Add a deterministic transition. Fails at the offending call if a
    /// transition from `(from, symbol)` already exists.
    pub fn add_transition(
        &mut self,
        from: &str,
        to: &str,
        symbol: char,
    ) -> Result<(), ValidationError> {
        let key = (from.to_string(), symbol);
        if self.table.contains_key(&key) {
            return Err(ValidationError::DuplicateTransition(
                from.to_string(),
                symbol,
            ));
        }
        self.core
            .record_transition(from, to, Symbol::Char(symbol), None);
        self.table.insert(key, to.to_string());
        Ok(())
    }

    pub fn next_state(&self, state: &str, symbol: char) -> Option<&String> {
        self.table.get(&(state.to_string(), symbol))
    }

    /// Deterministic walk; an undefined transition rejects immediately.
    pub fn accepts(&self, input: &str) -> bool {
        let mut current = match self.core.start_state() {
            Some(start) => start.clone(),
            None => return false,
        };

        for symbol in input.chars() {
            match self.next_state(&current, symbol) {
                Some(next) => current = next.clone(),
                None => return false,
            }
        }

        self.core.is_accept(&current)
    }

    /// A DFA is complete when every `(state, symbol)` pair has a transition.
    pub fn is_complete(&self) -> bool {
        for name in self.core.states().keys() {
            for symbol in self.core.alphabet() {
                if !self.table.contains_key(&(name.clone(), *symbol)) {
                    return false;
                }
            }
        }
        true
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.core.validate()?;

        // The table cannot hold duplicates, so determinism is re-checked
        // against the recorded transition list.
        let mut seen = std::collections::HashSet::new();
        for transition in self.core.transitions() {
            if let Symbol::Char(c) = transition.symbol {
                if !seen.insert((transition.from.clone(), c)) {
                    return Err(ValidationError::DuplicateTransition(
                        transition.from.clone(),
                        c,
                    ));
                }
            }
        }

        Ok(())
    }
}
