use std::collections::BTreeSet;
use std::fmt;

use color_eyre::{Report, Result};
use itertools::Itertools;
use tracing::debug;

use crate::automaton::{Automaton, Symbol};
use crate::dfa::Dfa;
use crate::mealy_moore::{MealyMachine, MooreMachine};
use crate::nfa::{EpsilonNfa, Nfa};
use crate::pda::{Pda, PdaConfiguration, PdaTransition};

/// One step of a simulation trace. Deterministic machines step between
/// single states, nondeterministic ones between state sets, and a PDA step
/// is the configuration reached plus the transition that produced it.
#[derive(Debug, Clone)]
pub enum Step {
    Dfa {
        from: String,
        symbol: char,
        /// None when the move is undefined and the run dies.
        to: Option<String>,
    },
    Sets {
        from: BTreeSet<String>,
        symbol: char,
        to: BTreeSet<String>,
    },
    Mealy {
        from: String,
        symbol: char,
        output: String,
        to: String,
    },
    Moore {
        from: String,
        symbol: char,
        to: String,
        output: String,
    },
    Pda {
        configuration: PdaConfiguration,
        taken: Option<PdaTransition>,
    },
}

fn format_set(states: &BTreeSet<String>) -> String {
    if states.is_empty() {
        "∅".to_string()
    } else {
        format!("{{{}}}", states.iter().join(", "))
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Dfa { from, symbol, to } => match to {
                Some(to) => write!(f, "{} --{}--> {}", from, symbol, to),
                None => write!(f, "{} --{}--> ∅", from, symbol),
            },
            Step::Sets { from, symbol, to } => {
                write!(f, "{} --{}--> {}", format_set(from), symbol, format_set(to))
            }
            Step::Mealy {
                from,
                symbol,
                output,
                to,
            } => write!(f, "{} --{}/{}--> {}", from, symbol, output, to),
            Step::Moore {
                from,
                symbol,
                to,
                output,
            } => write!(f, "{} --{}--> {} [{}]", from, symbol, to, output),
            Step::Pda {
                configuration,
                taken,
            } => match taken {
                Some(transition) => write!(f, "{} ⊢ {}", transition, configuration),
                None => write!(f, "{}", configuration),
            },
        }
    }
}

/// Verdict and trace of one simulation run. `final_output` is set for
/// transducers only; for acceptors it stays `None`.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub accepted: bool,
    pub steps: Vec<Step>,
    pub final_output: Option<Vec<String>>,
}

fn simulate_dfa(dfa: &Dfa, input: &str) -> SimulationResult {
    let mut steps = Vec::new();

    let mut current = match dfa.core().start_state() {
        Some(start) => start.clone(),
        None => {
            return SimulationResult {
                accepted: false,
                steps,
                final_output: None,
            }
        }
    };

    for symbol in input.chars() {
        let next = dfa.next_state(&current, symbol).cloned();
        steps.push(Step::Dfa {
            from: current.clone(),
            symbol,
            to: next.clone(),
        });
        match next {
            Some(next) => current = next,
            None => {
                return SimulationResult {
                    accepted: false,
                    steps,
                    final_output: None,
                }
            }
        }
    }

    SimulationResult {
        accepted: dfa.core().is_accept(&current),
        steps,
        final_output: None,
    }
}

fn simulate_nfa(nfa: &Nfa, input: &str) -> SimulationResult {
    let mut steps = Vec::new();

    let start = match nfa.core().start_state() {
        Some(start) => start.clone(),
        None => {
            return SimulationResult {
                accepted: false,
                steps,
                final_output: None,
            }
        }
    };

    let mut current = BTreeSet::from([start]);

    for symbol in input.chars() {
        let mut next = BTreeSet::new();
        for state in &current {
            next.extend(nfa.next_states(state, symbol));
        }
        steps.push(Step::Sets {
            from: current.clone(),
            symbol,
            to: next.clone(),
        });
        if next.is_empty() {
            return SimulationResult {
                accepted: false,
                steps,
                final_output: None,
            };
        }
        current = next;
    }

    SimulationResult {
        accepted: current.iter().any(|state| nfa.core().is_accept(state)),
        steps,
        final_output: None,
    }
}

fn simulate_epsilon_nfa(enfa: &EpsilonNfa, input: &str) -> SimulationResult {
    let mut steps = Vec::new();

    let start = match enfa.core().start_state() {
        Some(start) => start.clone(),
        None => {
            return SimulationResult {
                accepted: false,
                steps,
                final_output: None,
            }
        }
    };

    let mut current = enfa.epsilon_closure(&BTreeSet::from([start]));

    for symbol in input.chars() {
        let mut moves = BTreeSet::new();
        for state in &current {
            moves.extend(enfa.next_states(state, Symbol::Char(symbol)));
        }
        let next = if moves.is_empty() {
            moves
        } else {
            enfa.epsilon_closure(&moves)
        };
        steps.push(Step::Sets {
            from: current.clone(),
            symbol,
            to: next.clone(),
        });
        if next.is_empty() {
            return SimulationResult {
                accepted: false,
                steps,
                final_output: None,
            };
        }
        current = next;
    }

    SimulationResult {
        accepted: current.iter().any(|state| enfa.core().is_accept(state)),
        steps,
        final_output: None,
    }
}

fn simulate_mealy(mealy: &MealyMachine, input: &str) -> SimulationResult {
    let mut steps = Vec::new();
    let mut outputs = Vec::new();

    let mut current = match mealy.core().start_state() {
        Some(start) => start.clone(),
        None => {
            return SimulationResult {
                accepted: false,
                steps,
                final_output: Some(outputs),
            }
        }
    };

    for symbol in input.chars() {
        match mealy.step(&current, symbol) {
            Some((next, output)) => {
                steps.push(Step::Mealy {
                    from: current.clone(),
                    symbol,
                    output: output.clone(),
                    to: next.clone(),
                });
                outputs.push(output.clone());
                current = next.clone();
            }
            None => {
                return SimulationResult {
                    accepted: false,
                    steps,
                    final_output: Some(outputs),
                }
            }
        }
    }

    SimulationResult {
        accepted: true,
        steps,
        final_output: Some(outputs),
    }
}

fn simulate_moore(moore: &MooreMachine, input: &str) -> SimulationResult {
    let mut steps = Vec::new();

    let mut current = match moore.core().start_state() {
        Some(start) => start.clone(),
        None => {
            return SimulationResult {
                accepted: false,
                steps,
                final_output: Some(Vec::new()),
            }
        }
    };

    // The start state's output is emitted before any symbol is read
    let mut outputs = vec![moore.state_output(&current).cloned().unwrap_or_default()];

    for symbol in input.chars() {
        match moore.next_state(&current, symbol) {
            Some(next) => {
                let output = moore.state_output(next).cloned().unwrap_or_default();
                steps.push(Step::Moore {
                    from: current.clone(),
                    symbol,
                    to: next.clone(),
                    output: output.clone(),
                });
                outputs.push(output);
                current = next.clone();
            }
            None => {
                return SimulationResult {
                    accepted: false,
                    steps,
                    final_output: Some(outputs),
                }
            }
        }
    }

    SimulationResult {
        accepted: true,
        steps,
        final_output: Some(outputs),
    }
}

fn simulate_pda(pda: &Pda, input: &str) -> Result<SimulationResult> {
    // The verdict comes from the exhaustive search; the trace is one
    // illustrative run and may end without reaching an accepting state.
    let accepted = pda.accepts(input).map_err(Report::new)?;

    let steps = pda
        .trace_walk(input)
        .into_iter()
        .map(|(configuration, taken)| Step::Pda {
            configuration,
            taken,
        })
        .collect();

    Ok(SimulationResult {
        accepted,
        steps,
        final_output: None,
    })
}

/// Run any automaton over an input string, producing the verdict and a
/// step-by-step trace. The only fallible case is the PDA, whose acceptance
/// search can exhaust its configuration cap without a verdict.
pub fn simulate(automaton: &Automaton, input: &str) -> Result<SimulationResult> {
    let result = match automaton {
        Automaton::Dfa(m) => simulate_dfa(m, input),
        Automaton::Nfa(m) => simulate_nfa(m, input),
        Automaton::EpsilonNfa(m) => simulate_epsilon_nfa(m, input),
        Automaton::Pda(m) => simulate_pda(m, input)?,
        Automaton::Mealy(m) => simulate_mealy(m, input),
        Automaton::Moore(m) => simulate_moore(m, input),
    };

    debug!(
        kind = automaton.kind(),
        input,
        accepted = result.accepted,
        steps = result.steps.len(),
        "simulation finished"
    );

    Ok(result)
}

#[cfg(test)]
mod simulate_tests {
    use super::*;

    fn even_zeros_dfa() -> Dfa {
        let mut dfa = Dfa::new();
        dfa.add_state("even", true, true);
        dfa.add_state("odd", false, false);
        dfa.add_transition("even", "odd", '0').unwrap();
        dfa.add_transition("odd", "even", '0').unwrap();
        dfa.add_transition("even", "even", '1').unwrap();
        dfa.add_transition("odd", "odd", '1').unwrap();
        dfa
    }

    #[test]
    fn test_dfa_trace_follows_run() {
        let automaton = Automaton::Dfa(even_zeros_dfa());
        let result = simulate(&automaton, "001").unwrap();
        assert!(result.accepted);
        assert!(result.final_output.is_none());
        assert_eq!(result.steps.len(), 3);
        match &result.steps[0] {
            Step::Dfa { from, symbol, to } => {
                assert_eq!(from, "even");
                assert_eq!(*symbol, '0');
                assert_eq!(to.as_deref(), Some("odd"));
            }
            other => panic!("Expected DFA step, got {:?}", other),
        }
    }

    #[test]
    fn test_dfa_trace_records_dead_move() {
        let automaton = Automaton::Dfa(even_zeros_dfa());
        let result = simulate(&automaton, "0x0").unwrap();
        assert!(!result.accepted);
        assert_eq!(result.steps.len(), 2);
        match &result.steps[1] {
            Step::Dfa { to, .. } => assert!(to.is_none()),
            other => panic!("Expected DFA step, got {:?}", other),
        }
        assert_eq!(result.steps[1].to_string(), "odd --x--> ∅");
    }

    #[test]
    fn test_nfa_trace_uses_state_sets() {
        let mut nfa = Nfa::new();
        nfa.add_state("q0", false, true);
        nfa.add_state("q1", false, false);
        nfa.add_state("q2", true, false);
        nfa.add_transition("q0", "q0", 'a');
        nfa.add_transition("q0", "q1", 'a');
        nfa.add_transition("q1", "q2", 'b');

        let result = simulate(&Automaton::Nfa(nfa), "ab").unwrap();
        assert!(result.accepted);
        match &result.steps[0] {
            Step::Sets { from, to, .. } => {
                assert_eq!(from.len(), 1);
                assert_eq!(to.len(), 2);
            }
            other => panic!("Expected set step, got {:?}", other),
        }
        assert_eq!(result.steps[0].to_string(), "{q0} --a--> {q0, q1}");
    }

    #[test]
    fn test_epsilon_nfa_trace_closes_sets() {
        let mut enfa = EpsilonNfa::new();
        enfa.add_state("q0", false, true);
        enfa.add_state("q1", false, false);
        enfa.add_state("q2", true, false);
        enfa.add_transition("q0", "q1", Symbol::Epsilon);
        enfa.add_transition("q1", "q2", Symbol::Char('a'));

        let result = simulate(&Automaton::EpsilonNfa(enfa), "a").unwrap();
        assert!(result.accepted);
        match &result.steps[0] {
            Step::Sets { from, to, .. } => {
                // The source set is already epsilon-closed
                assert!(from.contains("q0"));
                assert!(from.contains("q1"));
                assert_eq!(to, &BTreeSet::from(["q2".to_string()]));
            }
            other => panic!("Expected set step, got {:?}", other),
        }
    }

    #[test]
    fn test_mealy_collects_outputs() {
        let mut mealy = MealyMachine::new();
        mealy.add_state("s", false, true);
        mealy.add_transition("s", "s", 'a', "x");

        let result = simulate(&Automaton::Mealy(mealy), "aaa").unwrap();
        assert!(result.accepted);
        assert_eq!(result.final_output, Some(vec!["x".into(), "x".into(), "x".into()]));
        assert_eq!(result.steps[0].to_string(), "s --a/x--> s");
    }

    #[test]
    fn test_moore_leads_with_start_output() {
        let mut moore = MooreMachine::new();
        moore.add_state("even", false, true);
        moore.add_state("odd", false, false);
        moore.set_state_output("even", "E").unwrap();
        moore.set_state_output("odd", "O").unwrap();
        moore.add_transition("even", "odd", '1');
        moore.add_transition("odd", "even", '1');

        let result = simulate(&Automaton::Moore(moore), "11").unwrap();
        assert!(result.accepted);
        assert_eq!(
            result.final_output,
            Some(vec!["E".into(), "O".into(), "E".into()])
        );
        // One step per consumed symbol, outputs lead by one
        assert_eq!(result.steps.len(), 2);
    }

    #[test]
    fn test_pda_trace_and_verdict() {
        let mut pda = Pda::new();
        pda.add_state("q0", true, true);
        pda.add_pda_transition("q0", "q0", Symbol::Char('('), 'Z', &['A', 'Z']);
        pda.add_pda_transition("q0", "q0", Symbol::Char('('), 'A', &['A', 'A']);
        pda.add_pda_transition("q0", "q0", Symbol::Char(')'), 'A', &[]);

        let result = simulate(&Automaton::Pda(pda), "(())").unwrap();
        assert!(result.accepted);
        match &result.steps[0] {
            Step::Pda { taken, .. } => assert!(taken.is_none()),
            other => panic!("Expected PDA step, got {:?}", other),
        }
        assert!(result.steps.len() > 1);
    }

    #[test]
    fn test_pda_limit_propagates() {
        let mut pda = Pda::new().with_search_limit(200);
        pda.add_state("q0", false, true);
        pda.add_state("q1", true, false);
        pda.add_pda_transition("q0", "q0", Symbol::Epsilon, 'Z', &['Z', 'Z']);

        let err = simulate(&Automaton::Pda(pda), "a").unwrap_err();
        assert!(matches!(
            err.downcast_ref(),
            Some(crate::pda::SimulationError::LimitExceeded(200))
        ));
    }
}
