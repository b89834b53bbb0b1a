use clap::{Arg, Command};
use color_eyre::{eyre::eyre, Result};
use tracing::info;

use fsmkit::automaton::Automaton;
use fsmkit::{
    build_epsilon_nfa, determinize, eliminate_epsilons, minimize, parse_regex, simulate,
};

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Command::new("fsmkit")
        .version("0.1.0")
        .about("Build automata from regular expressions and simulate them on input strings")
        .arg(
            Arg::new("regex")
                .short('r')
                .long("regex")
                .value_name("REGEX")
                .help("Regular expression to compile. Supports *, +, |, grouping and ε")
                .value_parser(clap::value_parser!(String))
                .required(true),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("INPUT STRING")
                .help("Input string to simulate against the constructed automaton. May be given multiple times")
                .action(clap::ArgAction::Append)
                .value_parser(clap::value_parser!(String)),
        )
        .arg(
            Arg::new("stage")
                .short('s')
                .long("stage")
                .value_name("ENFA, NFA, DFA, MINIMAL")
                .help("Construction stage to simulate with. Defaults to the minimal DFA")
                .value_parser(clap::value_parser!(String)),
        )
        .get_matches();

    let pattern = match args.get_one::<String>("regex") {
        Some(pattern) => pattern,
        None => return Err(eyre!("Error: No regular expression provided!")),
    };

    let stage = args.get_one::<String>("stage");
    let stage = match stage {
        None => "minimal",
        Some(str) => {
            if str.eq_ignore_ascii_case("enfa") {
                "enfa"
            } else if str.eq_ignore_ascii_case("nfa") {
                "nfa"
            } else if str.eq_ignore_ascii_case("dfa") {
                "dfa"
            } else if str.eq_ignore_ascii_case("minimal") {
                "minimal"
            } else {
                return Err(eyre!("Error: stage should be one of ENFA | NFA | DFA | MINIMAL"));
            }
        }
    };

    let ast = parse_regex(pattern)?;

    let enfa = build_epsilon_nfa(&ast);
    info!(states = enfa.core().state_count(), "constructed epsilon-NFA");

    let automaton = if stage == "enfa" {
        Automaton::EpsilonNfa(enfa)
    } else {
        let nfa = eliminate_epsilons(&enfa);
        info!(states = nfa.core().state_count(), "eliminated epsilon transitions");

        if stage == "nfa" {
            Automaton::Nfa(nfa)
        } else {
            let dfa = determinize(&nfa)?;
            info!(states = dfa.core().state_count(), "determinized");

            if stage == "dfa" {
                Automaton::Dfa(dfa)
            } else {
                let minimal = minimize(&dfa)?;
                info!(states = minimal.core().state_count(), "minimized");
                Automaton::Dfa(minimal)
            }
        }
    };

    automaton.validate()?;

    let inputs: Vec<&String> = args
        .get_many::<String>("input")
        .map(|values| values.collect())
        .unwrap_or_default();

    for input in inputs {
        let result = simulate(&automaton, input)?;
        let verdict = if result.accepted { "accepted" } else { "rejected" };
        println!("{:?}: {}", input, verdict);
        for step in &result.steps {
            println!("  {}", step);
        }
    }

    Ok(())
}
