use std::collections::{BTreeSet, HashMap};

use crate::automaton::{MachineCore, Symbol, ValidationError};

/// Mealy machine: outputs ride on transitions. Every transition carries an
/// output by construction, so the table value is always a `(next, output)`
/// pair.
#[derive(Debug, Clone, Default)]
pub struct MealyMachine {
    core: MachineCore,
    table: HashMap<(String, char), (String, String)>,
    output_alphabet: BTreeSet<String>,
}

impl MealyMachine {
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

    pub fn add_transition(&mut self, from: &str, to: &str, symbol: char, output: &str) {
        self.core
            .record_transition(from, to, Symbol::Char(symbol), Some(output.to_string()));
        self.table.insert(
            (from.to_string(), symbol),
            (to.to_string(), output.to_string()),
        );
        self.output_alphabet.insert(output.to_string());
    }

    pub fn step(&self, state: &str, symbol: char) -> Option<&(String, String)> {
        self.table.get(&(state.to_string(), symbol))
    }

    pub fn output_alphabet(&self) -> &BTreeSet<String> {
        &self.output_alphabet
    }

    /// Distinct outputs on the state's outgoing transitions, collected in
    /// the fixed (sorted) alphabet order.
    pub fn outgoing_outputs(&self, state: &str) -> Vec<String> {
        let mut outputs = Vec::new();
        for symbol in self.core.alphabet() {
            if let Some((_, output)) = self.step(state, *symbol) {
                if !outputs.contains(output) {
                    outputs.push(output.clone());
                }
            }
        }
        outputs
    }

    /// Walk the machine, accumulating the output sequence. An undefined
    /// transition stops the walk and reports failure with the partial
    /// output collected so far.
    pub fn process(&self, input: &str) -> (bool, Vec<String>) {
        let mut current = match self.core.start_state() {
            Some(start) => start.clone(),
            None => return (false, Vec::new()),
        };

        let mut outputs = Vec::new();

        for symbol in input.chars() {
            match self.step(&current, symbol) {
                Some((next, output)) => {
                    outputs.push(output.clone());
                    current = next.clone();
                }
                None => return (false, outputs),
            }
        }

        (true, outputs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.core.validate()
    }
}

/// Moore machine: outputs ride on states. The transition table is
/// deterministic; the per-state output lives in its own map and is also
/// mirrored onto the `State` entry.
#[derive(Debug, Clone, Default)]
pub struct MooreMachine {
    core: MachineCore,
    table: HashMap<(String, char), String>,
    outputs: HashMap<String, String>,
    output_alphabet: BTreeSet<String>,
}

impl MooreMachine {
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

    /// Assign the output of a state. Fails immediately if the state has not
    /// been defined.
    pub fn set_state_output(&mut self, state: &str, output: &str) -> Result<(), ValidationError> {
        match self.core.get_state_mut(state) {
            Some(entry) => entry.output = Some(output.to_string()),
            None => return Err(ValidationError::UnknownState(state.to_string())),
        }
        self.outputs.insert(state.to_string(), output.to_string());
        self.output_alphabet.insert(output.to_string());
        Ok(())
    }

    pub fn add_transition(&mut self, from: &str, to: &str, symbol: char) {
        self.core
            .record_transition(from, to, Symbol::Char(symbol), None);
        self.table
            .insert((from.to_string(), symbol), to.to_string());
    }

    pub fn next_state(&self, state: &str, symbol: char) -> Option<&String> {
        self.table.get(&(state.to_string(), symbol))
    }

    pub fn state_output(&self, state: &str) -> Option<&String> {
        self.outputs.get(state)
    }

    pub fn output_alphabet(&self) -> &BTreeSet<String> {
        &self.output_alphabet
    }

    /// Walk the machine. The output sequence starts with the start state's
    /// output, before any input symbol is consumed. An unassigned output
    /// contributes an empty string; validation reports it separately.
    pub fn process(&self, input: &str) -> (bool, Vec<String>) {
        let mut current = match self.core.start_state() {
            Some(start) => start.clone(),
            None => return (false, Vec::new()),
        };

        let mut outputs = vec![self.state_output(&current).cloned().unwrap_or_default()];

        for symbol in input.chars() {
            match self.next_state(&current, symbol) {
                Some(next) => {
                    current = next.clone();
                    outputs.push(self.state_output(&current).cloned().unwrap_or_default());
                }
                None => return (false, outputs),
            }
        }

        (true, outputs)
    }

    /// Structural validity plus the Moore invariant: every state of a
    /// finished machine must carry an output.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.core.validate()?;

        for name in self.core.states().keys() {
            if !self.outputs.contains_key(name) {
                return Err(ValidationError::MissingStateOutput(name.clone()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod mealy_moore_tests {
    use super::*;

    fn edge_detector_mealy() -> MealyMachine {
        // Outputs "1" whenever the input bit differs from the previous one
        let mut mealy = MealyMachine::new();
        mealy.add_state("seen0", false, true);
        mealy.add_state("seen1", false, false);
        mealy.add_transition("seen0", "seen0", '0', "0");
        mealy.add_transition("seen0", "seen1", '1', "1");
        mealy.add_transition("seen1", "seen0", '0', "1");
        mealy.add_transition("seen1", "seen1", '1', "0");
        mealy
    }

    #[test]
    fn test_mealy_process_outputs() {
        let mealy = edge_detector_mealy();
        let (ok, outputs) = mealy.process("0110");
        assert!(ok);
        assert_eq!(outputs, vec!["0", "1", "0", "1"]);
    }

    #[test]
    fn test_mealy_undefined_transition_truncates() {
        let mealy = edge_detector_mealy();
        let (ok, outputs) = mealy.process("0x1");
        assert!(!ok);
        assert_eq!(outputs, vec!["0"]);
    }

    #[test]
    fn test_mealy_outgoing_outputs_fixed_order() {
        let mealy = edge_detector_mealy();
        // Alphabet order is '0' then '1'
        assert_eq!(mealy.outgoing_outputs("seen0"), vec!["0", "1"]);
        assert_eq!(mealy.outgoing_outputs("seen1"), vec!["1", "0"]);
    }

    fn parity_moore() -> MooreMachine {
        let mut moore = MooreMachine::new();
        moore.add_state("even", false, true);
        moore.add_state("odd", false, false);
        moore.set_state_output("even", "E").unwrap();
        moore.set_state_output("odd", "O").unwrap();
        moore.add_transition("even", "odd", '1');
        moore.add_transition("odd", "even", '1');
        moore.add_transition("even", "even", '0');
        moore.add_transition("odd", "odd", '0');
        moore
    }

    #[test]
    fn test_moore_emits_start_output_first() {
        let moore = parity_moore();
        let (ok, outputs) = moore.process("");
        assert!(ok);
        assert_eq!(outputs, vec!["E"]);

        let (ok, outputs) = moore.process("11");
        assert!(ok);
        assert_eq!(outputs, vec!["E", "O", "E"]);
    }

    #[test]
    fn test_moore_undefined_transition_truncates() {
        let moore = parity_moore();
        let (ok, outputs) = moore.process("1x");
        assert!(!ok);
        assert_eq!(outputs, vec!["E", "O"]);
    }

    #[test]
    fn test_moore_output_on_unknown_state_fails() {
        let mut moore = parity_moore();
        let result = moore.set_state_output("ghost", "X");
        match result {
            Err(ValidationError::UnknownState(name)) => assert_eq!(name, "ghost"),
            other => panic!("Expected UnknownState, got {:?}", other),
        }
    }

    #[test]
    fn test_moore_validation_requires_outputs() {
        let mut moore = MooreMachine::new();
        moore.add_state("a", false, true);
        moore.add_state("b", false, false);
        moore.set_state_output("a", "x").unwrap();
        match moore.validate() {
            Err(ValidationError::MissingStateOutput(name)) => assert_eq!(name, "b"),
            other => panic!("Expected MissingStateOutput, got {:?}", other),
        }
    }
}
