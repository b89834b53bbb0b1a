//! # fsmkit
//!
//! An automata construction and simulation library.
//!
//! This library provides functionality to:
//! - Parse regular expressions into syntax trees
//! - Convert regular expressions to ε-NFAs using Thompson Construction
//! - Eliminate epsilon transitions and determinize NFAs using Subset Construction
//! - Minimize DFAs using partition refinement
//! - Convert between Mealy and Moore machines
//! - Simulate DFAs, NFAs, ε-NFAs, PDAs, Mealy and Moore machines step by step

// Re-export the modules
pub mod automaton;
pub mod convert;
pub mod dfa;
pub mod mealy_moore;
pub mod minimize;
pub mod nfa;
pub mod pda;
pub mod regex;
pub mod simulate;
pub mod subset;
pub mod thompson;

// Re-export commonly used items for convenience
pub use automaton::{Automaton, Symbol};
pub use convert::{mealy_to_moore, moore_to_mealy};
pub use minimize::minimize;
pub use regex::parse_regex;
pub use simulate::{simulate, SimulationResult, Step};
pub use subset::{determinize, eliminate_epsilons};
pub use thompson::build_epsilon_nfa;
