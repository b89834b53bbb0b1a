use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fmt;

use crate::automaton::{MachineCore, Symbol, ValidationError};

/// Explored-configuration cap for the acceptance search. PDA membership is
/// not decidable in general under push-only cycles, so the search must be
/// cut off with an explicit "undecided" outcome.
pub const DEFAULT_SEARCH_LIMIT: usize = 10_000;

/// Step cap for the illustrative deterministic trace walk.
pub const TRACE_STEP_LIMIT: usize = 100;

#[derive(Debug)]
pub enum SimulationError {
    LimitExceeded(usize),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::LimitExceeded(limit) => write!(
                f,
                "Error: PDA acceptance search explored {} configurations without a verdict; result is undecided!",
                limit
            ),
        }
    }
}

impl std::error::Error for SimulationError {}

/// A PDA transition: read `input` (or ε), pop `pop` from the stack, push
/// `push` with its first element ending up on top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdaTransition {
    pub from: String,
    pub to: String,
    pub input: Symbol,
    pub pop: char,
    pub push: Vec<char>,
}

impl fmt::Display for PdaTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let push: String = if self.push.is_empty() {
            "ε".to_string()
        } else {
            self.push.iter().collect()
        };
        write!(
            f,
            "{} --{},{}/{}--> {}",
            self.from, self.input, self.pop, push, self.to
        )
    }
}

/// Instantaneous snapshot of a PDA run. The stack keeps its top at the end
/// of the vec. Configurations are created per search step and never
/// mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdaConfiguration {
    pub state: String,
    pub remaining: String,
    pub stack: Vec<char>,
}

impl fmt::Display for PdaConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let input = if self.remaining.is_empty() {
            "ε"
        } else {
            &self.remaining
        };
        let stack: String = if self.stack.is_empty() {
            "⊥".to_string()
        } else {
            // Printed top-first
            self.stack.iter().rev().collect()
        };
        write!(f, "({}, {}, {})", self.state, input, stack)
    }
}

/// Pushdown automaton accepting by final state with exhausted input.
#[derive(Debug, Clone)]
pub struct Pda {
    core: MachineCore,
    transitions: Vec<PdaTransition>,
    stack_alphabet: BTreeSet<char>,
    bottom_symbol: char,
    search_limit: usize,
}

impl Default for Pda {
    fn default() -> Self {
        Pda {
            core: MachineCore::new(),
            transitions: Vec::new(),
            stack_alphabet: BTreeSet::new(),
            bottom_symbol: 'Z',
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl Pda {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the acceptance-search configuration cap.
    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
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

    pub fn bottom_symbol(&self) -> char {
        self.bottom_symbol
    }

    pub fn set_bottom_symbol(&mut self, symbol: char) {
        self.bottom_symbol = symbol;
        self.stack_alphabet.insert(symbol);
    }

    pub fn stack_alphabet(&self) -> &BTreeSet<char> {
        &self.stack_alphabet
    }

    pub fn pda_transitions(&self) -> &[PdaTransition] {
        &self.transitions
    }

    pub fn add_pda_transition(
        &mut self,
        from: &str,
        to: &str,
        input: Symbol,
        pop: char,
        push: &[char],
    ) {
        self.stack_alphabet.insert(pop);
        self.stack_alphabet.extend(push.iter().copied());
        // Mirror into the shared transition list so inspection and
        // structural validation see the edge.
        self.core.record_transition(from, to, input, None);
        self.transitions.push(PdaTransition {
            from: from.to_string(),
            to: to.to_string(),
            input,
            pop,
            push: push.to_vec(),
        });
    }

    /// Transitions usable from `state` with the given unread input symbol
    /// and stack top: the required pop must match, and the label must be ε
    /// or equal to the input symbol.
    pub fn applicable_transitions(
        &self,
        state: &str,
        input: Option<char>,
        stack_top: char,
    ) -> Vec<&PdaTransition> {
        self.transitions
            .iter()
            .filter(|t| t.from == state && t.pop == stack_top)
            .filter(|t| match t.input {
                Symbol::Epsilon => true,
                Symbol::Char(c) => input == Some(c),
            })
            .collect()
    }

    fn apply(&self, config: &PdaConfiguration, transition: &PdaTransition) -> PdaConfiguration {
        let mut stack = config.stack.clone();
        stack.pop();
        // push is top-first, so it goes on in reverse
        stack.extend(transition.push.iter().rev());

        let remaining = match transition.input {
            Symbol::Epsilon => config.remaining.clone(),
            Symbol::Char(_) => config.remaining.chars().skip(1).collect(),
        };

        PdaConfiguration {
            state: transition.to.clone(),
            remaining,
            stack,
        }
    }

    fn initial_configuration(&self, input: &str, start: &str) -> PdaConfiguration {
        PdaConfiguration {
            state: start.to_string(),
            remaining: input.to_string(),
            stack: vec![self.bottom_symbol],
        }
    }

    fn is_accepting(&self, config: &PdaConfiguration) -> bool {
        config.remaining.is_empty() && self.core.is_accept(&config.state)
    }

    /// Existential acceptance: breadth-first search over the configuration
    /// graph, returning true as soon as any run reaches an accepting state
    /// with exhausted input. The visited set prunes revisits, but push-only
    /// cycles still produce unboundedly many distinct configurations, so
    /// the search fails with `LimitExceeded` once the cap is hit.
    pub fn accepts(&self, input: &str) -> Result<bool, SimulationError> {
        let start = match self.core.start_state() {
            Some(start) => start.clone(),
            None => return Ok(false),
        };

        let mut queue = VecDeque::new();
        let mut visited: HashSet<(String, String, Vec<char>)> = HashSet::new();
        queue.push_back(self.initial_configuration(input, &start));

        while let Some(config) = queue.pop_front() {
            let key = (
                config.state.clone(),
                config.remaining.clone(),
                config.stack.clone(),
            );
            if !visited.insert(key) {
                continue;
            }
            if visited.len() > self.search_limit {
                return Err(SimulationError::LimitExceeded(self.search_limit));
            }

            if self.is_accepting(&config) {
                return Ok(true);
            }

            let stack_top = match config.stack.last() {
                Some(top) => *top,
                None => continue,
            };
            let symbol = config.remaining.chars().next();

            for transition in self.applicable_transitions(&config.state, symbol, stack_top) {
                queue.push_back(self.apply(&config, transition));
            }
        }

        Ok(false)
    }

    /// One deterministic run for display: always take the first applicable
    /// transition, stop on acceptance, a dead configuration, or the step
    /// cap. The path illustrates a single run and is no proof of the
    /// search verdict.
    pub fn trace_walk(&self, input: &str) -> Vec<(PdaConfiguration, Option<PdaTransition>)> {
        let start = match self.core.start_state() {
            Some(start) => start.clone(),
            None => return Vec::new(),
        };

        let mut config = self.initial_configuration(input, &start);
        let mut path = vec![(config.clone(), None)];

        for _ in 0..TRACE_STEP_LIMIT {
            if self.is_accepting(&config) {
                break;
            }

            let stack_top = match config.stack.last() {
                Some(top) => *top,
                None => break,
            };
            let symbol = config.remaining.chars().next();

            let transition = match self
                .applicable_transitions(&config.state, symbol, stack_top)
                .first()
            {
                Some(transition) => (*transition).clone(),
                None => break,
            };

            config = self.apply(&config, &transition);
            path.push((config.clone(), Some(transition)));
        }

        path
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.core.validate()
    }
}
