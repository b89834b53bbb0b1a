use std::collections::HashMap;

use color_eyre::{Report, Result};
use itertools::Itertools;
use tracing::debug;

use crate::mealy_moore::{MealyMachine, MooreMachine};

/// Convert a Mealy machine to a Moore machine by state splitting. A state
/// entered with k distinct transition outputs becomes k Moore states named
/// `{state}_{output}`, each carrying one of those outputs; a state no
/// transition enters keeps its name and an empty output. All copies of a
/// state share the same outgoing edges, so the Moore machine emits, after
/// the initial state output, exactly the sequence the Mealy machine emits.
///
/// The start state's pre-input output is not defined by the source machine.
/// When the start state was split, the copy carrying the first incoming
/// output (states and symbols scanned in sorted order) is chosen, so the
/// leading element of the output sequence is arbitrary but reproducible.
pub fn mealy_to_moore(mealy: &MealyMachine) -> Result<MooreMachine> {
    let mut moore = MooreMachine::new();

    // Distinct incoming outputs per state, in scan order
    let mut incoming: HashMap<String, Vec<String>> = HashMap::new();
    for from in mealy.core().states().keys().sorted() {
        for symbol in mealy.core().alphabet() {
            if let Some((to, output)) = mealy.step(from, *symbol) {
                let outputs = incoming.entry(to.clone()).or_default();
                if !outputs.contains(output) {
                    outputs.push(output.clone());
                }
            }
        }
    }

    let split_name = |state: &str, output: &str| format!("{}_{}", state, output);

    for name in mealy.core().states().keys().sorted() {
        let accepting = mealy.core().is_accept(name);
        match incoming.get(name) {
            Some(outputs) => {
                for output in outputs {
                    let copy = split_name(name, output);
                    moore.add_state(&copy, accepting, false);
                    moore.set_state_output(&copy, output).map_err(Report::new)?;
                }
            }
            None => {
                moore.add_state(name, accepting, false);
                moore.set_state_output(name, "").map_err(Report::new)?;
            }
        }
    }

    // Every copy of a state inherits its full outgoing edge set; targets
    // resolve exactly because the transition output names the target copy.
    for name in mealy.core().states().keys().sorted() {
        let copies: Vec<String> = match incoming.get(name) {
            Some(outputs) => outputs
                .iter()
                .map(|output| split_name(name, output))
                .collect(),
            None => vec![name.clone()],
        };

        for symbol in mealy.core().alphabet() {
            if let Some((to, output)) = mealy.step(name, *symbol) {
                let target = split_name(to, output);
                for copy in &copies {
                    moore.add_transition(copy, &target, *symbol);
                }
            }
        }
    }

    if let Some(start) = mealy.core().start_state() {
        let node = match incoming.get(start).and_then(|outputs| outputs.first()) {
            Some(first) => split_name(start, first),
            None => start.clone(),
        };
        moore.set_start_state(&node);
    }

    debug!(
        mealy_states = mealy.core().state_count(),
        moore_states = moore.core().state_count(),
        "mealy to moore conversion finished"
    );

    Ok(moore)
}

/// Convert a Moore machine to a Mealy machine. The state set is preserved;
/// each transition takes over the output of its target state, so the Mealy
/// output sequence equals the Moore sequence with the initial state output
/// dropped.
pub fn moore_to_mealy(moore: &MooreMachine) -> MealyMachine {
    let mut mealy = MealyMachine::new();

    for name in moore.core().states().keys().sorted() {
        mealy.add_state(name, moore.core().is_accept(name), false);
    }
    if let Some(start) = moore.core().start_state() {
        mealy.set_start_state(start);
    }

    for from in moore.core().states().keys().sorted() {
        for symbol in moore.core().alphabet() {
            if let Some(to) = moore.next_state(from, *symbol) {
                let output = moore.state_output(to).cloned().unwrap_or_default();
                mealy.add_transition(from, to, *symbol, &output);
            }
        }
    }

    debug!(
        states = mealy.core().state_count(),
        "moore to mealy conversion finished"
    );

    mealy
}
