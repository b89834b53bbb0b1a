use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use crate::dfa::Dfa;
use crate::mealy_moore::{MealyMachine, MooreMachine};
use crate::nfa::{EpsilonNfa, Nfa};
use crate::pda::Pda;

use color_eyre::{Report, Result};

/// An input symbol. `Epsilon` is the reserved marker for transitions that
/// consume no input; it is never inserted into a machine's public alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    Epsilon,
    Char(char),
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Epsilon => write!(f, "ε"),
            Symbol::Char(c) => write!(f, "{}", c),
        }
    }
}

/// A named state. The name is the state's identity within its automaton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub name: String,
    pub is_start: bool,
    pub is_accept: bool,
    /// Only Moore machines assign state outputs.
    pub output: Option<String>,
}

/// A recorded transition, kept in insertion order for inspection.
/// Identity is `(from, to, symbol)`; `output` is set for Mealy machines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: String,
    pub to: String,
    pub symbol: Symbol,
    pub output: Option<String>,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.output {
            Some(output) => write!(
                f,
                "{} --{}/{}--> {}",
                self.from, self.symbol, output, self.to
            ),
            None => write!(f, "{} --{}--> {}", self.from, self.symbol, self.to),
        }
    }
}

#[derive(Debug)]
pub enum ValidationError {
    NoStates,
    NoStartState,
    UndefinedStartState(String),
    UndefinedTransitionState(String),
    DuplicateTransition(String, char),
    MissingStateOutput(String),
    UnknownState(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NoStates => write!(f, "Error: No states defined!"),
            ValidationError::NoStartState => write!(f, "Error: No start state defined!"),
            ValidationError::UndefinedStartState(name) => {
                write!(f, "Error: Start state {} is not a defined state!", name)
            }
            ValidationError::UndefinedTransitionState(name) => {
                write!(f, "Error: Transition references undefined state {}!", name)
            }
            ValidationError::DuplicateTransition(state, symbol) => write!(
                f,
                "Error: A transition from state {} on symbol {} already exists!",
                state, symbol
            ),
            ValidationError::MissingStateOutput(name) => {
                write!(f, "Error: State {} has no output assigned!", name)
            }
            ValidationError::UnknownState(name) => {
                write!(f, "Error: State {} does not exist!", name)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Raised when an operation is invoked on the wrong automaton kind.
#[derive(Debug)]
pub struct ConversionError {
    pub expected: &'static str,
    pub found: &'static str,
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error: Operation expects a {} but a {} was provided!",
            self.expected, self.found
        )
    }
}

impl std::error::Error for ConversionError {}

/// Shared storage for every automaton kind: the name-keyed state map, the
/// public alphabet, the start/accept bookkeeping and the ordered transition
/// list. Kind-specific lookup tables live in the owning machine.
#[derive(Debug, Clone, Default)]
pub struct MachineCore {
    states: HashMap<String, State>,
    alphabet: BTreeSet<char>,
    start_state: Option<String>,
    accept_states: HashSet<String>,
    transitions: Vec<Transition>,
}

impl MachineCore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a state. Re-adding an existing name overwrites its flags.
    pub fn add_state(&mut self, name: &str, is_accept: bool, is_start: bool) {
        self.states.insert(
            name.to_string(),
            State {
                name: name.to_string(),
                is_start,
                is_accept,
                output: None,
            },
        );
        if is_accept {
            self.accept_states.insert(name.to_string());
        }
        if is_start {
            self.start_state = Some(name.to_string());
        }
    }

    pub fn set_start_state(&mut self, name: &str) {
        if let Some(state) = self.states.get_mut(name) {
            state.is_start = true;
        }
        self.start_state = Some(name.to_string());
    }

    pub fn set_accept_state(&mut self, name: &str) {
        if let Some(state) = self.states.get_mut(name) {
            state.is_accept = true;
        }
        self.accept_states.insert(name.to_string());
    }

    pub fn clear_accept_state(&mut self, name: &str) {
        if let Some(state) = self.states.get_mut(name) {
            state.is_accept = false;
        }
        self.accept_states.remove(name);
    }

    /// Record a transition in the ordered list. Non-epsilon symbols join the
    /// public alphabet; the epsilon marker never does.
    pub fn record_transition(
        &mut self,
        from: &str,
        to: &str,
        symbol: Symbol,
        output: Option<String>,
    ) {
        if let Symbol::Char(c) = symbol {
            self.alphabet.insert(c);
        }
        self.transitions.push(Transition {
            from: from.to_string(),
            to: to.to_string(),
            symbol,
            output,
        });
    }

    pub fn has_state(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    pub fn get_state(&self, name: &str) -> Option<&State> {
        self.states.get(name)
    }

    pub fn get_state_mut(&mut self, name: &str) -> Option<&mut State> {
        self.states.get_mut(name)
    }

    pub fn states(&self) -> &HashMap<String, State> {
        &self.states
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    pub fn alphabet(&self) -> &BTreeSet<char> {
        &self.alphabet
    }

    pub fn start_state(&self) -> Option<&String> {
        self.start_state.as_ref()
    }

    pub fn accept_states(&self) -> &HashSet<String> {
        &self.accept_states
    }

    pub fn is_accept(&self, name: &str) -> bool {
        self.accept_states.contains(name)
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Structural checks shared by every kind: states exist, a start state
    /// is set and defined, and every transition references defined states.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.states.is_empty() {
            return Err(ValidationError::NoStates);
        }

        let start = match &self.start_state {
            Some(start) => start,
            None => return Err(ValidationError::NoStartState),
        };

        if !self.states.contains_key(start) {
            return Err(ValidationError::UndefinedStartState(start.clone()));
        }

        for transition in &self.transitions {
            if !self.states.contains_key(&transition.from) {
                return Err(ValidationError::UndefinedTransitionState(
                    transition.from.clone(),
                ));
            }
            if !self.states.contains_key(&transition.to) {
                return Err(ValidationError::UndefinedTransitionState(
                    transition.to.clone(),
                ));
            }
        }

        Ok(())
    }
}

/// Closed set of automaton kinds. Every cross-kind entry point (simulation,
/// validation, kind-checked conversions) dispatches by matching on this
/// enum rather than inspecting types at runtime.
#[derive(Debug, Clone)]
pub enum Automaton {
    Dfa(Dfa),
    Nfa(Nfa),
    EpsilonNfa(EpsilonNfa),
    Pda(Pda),
    Mealy(MealyMachine),
    Moore(MooreMachine),
}

impl Automaton {
    pub fn kind(&self) -> &'static str {
        match self {
            Automaton::Dfa(_) => "DFA",
            Automaton::Nfa(_) => "NFA",
            Automaton::EpsilonNfa(_) => "epsilon-NFA",
            Automaton::Pda(_) => "PDA",
            Automaton::Mealy(_) => "Mealy machine",
            Automaton::Moore(_) => "Moore machine",
        }
    }

    pub fn core(&self) -> &MachineCore {
        match self {
            Automaton::Dfa(m) => m.core(),
            Automaton::Nfa(m) => m.core(),
            Automaton::EpsilonNfa(m) => m.core(),
            Automaton::Pda(m) => m.core(),
            Automaton::Mealy(m) => m.core(),
            Automaton::Moore(m) => m.core(),
        }
    }

    /// Validate the machine's structure, including kind-specific invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Automaton::Dfa(m) => m.validate(),
            Automaton::Nfa(m) => m.validate(),
            Automaton::EpsilonNfa(m) => m.validate(),
            Automaton::Pda(m) => m.validate(),
            Automaton::Mealy(m) => m.validate(),
            Automaton::Moore(m) => m.validate(),
        }
    }

    /// Run the machine over the input string and report acceptance. For a
    /// PDA this may fail with a search-limit error instead of a verdict.
    pub fn accepts(&self, input: &str) -> Result<bool> {
        match self {
            Automaton::Dfa(m) => Ok(m.accepts(input)),
            Automaton::Nfa(m) => Ok(m.accepts(input)),
            Automaton::EpsilonNfa(m) => Ok(m.accepts(input)),
            Automaton::Pda(m) => m.accepts(input).map_err(Report::new),
            Automaton::Mealy(m) => Ok(m.process(input).0),
            Automaton::Moore(m) => Ok(m.process(input).0),
        }
    }

    pub fn expect_dfa(&self) -> Result<&Dfa, ConversionError> {
        match self {
            Automaton::Dfa(m) => Ok(m),
            other => Err(ConversionError {
                expected: "DFA",
                found: other.kind(),
            }),
        }
    }

    pub fn expect_mealy(&self) -> Result<&MealyMachine, ConversionError> {
        match self {
            Automaton::Mealy(m) => Ok(m),
            other => Err(ConversionError {
                expected: "Mealy machine",
                found: other.kind(),
            }),
        }
    }

    pub fn expect_moore(&self) -> Result<&MooreMachine, ConversionError> {
        match self {
            Automaton::Moore(m) => Ok(m),
            other => Err(ConversionError {
                expected: "Moore machine",
                found: other.kind(),
            }),
        }
    }
}
