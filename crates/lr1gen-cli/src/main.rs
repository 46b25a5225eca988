use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use lr1gen::{dfa::DFA, first_follow::FirstFollow, grammar::Grammar};
use std::{fmt::Write as _, fs, path::PathBuf, time::Instant};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// What to emit. May be given more than once.
    #[arg(long, value_enum)]
    emit: Vec<Emit>,

    /// Write the report to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// The path of grammar definition file.
    input: PathBuf,
}

#[derive(Debug, Copy, Clone, PartialEq, ValueEnum)]
enum Emit {
    /// The augmented grammar.
    Grammar,
    /// FIRST and FOLLOW sets of each nonterminal.
    FirstFollow,
    /// States and transitions of the canonical LR(1) automaton.
    Automaton,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    tracing::debug!("parsed CLI args = {:?}", args);

    process_file(&args)
        .with_context(|| anyhow::anyhow!("errored during processing {}", args.input.display()))?;

    Ok(())
}

fn process_file(args: &Args) -> anyhow::Result<()> {
    let emit = if args.emit.is_empty() {
        vec![Emit::FirstFollow, Emit::Automaton]
    } else {
        args.emit.clone()
    };

    let s = Instant::now();
    let grammar = Grammar::from_file(&args.input)?;
    tracing::info!("load grammar: {:?} elapsed", s.elapsed());

    let empty_nonterminals: Vec<_> = grammar
        .unproductive_nonterminals()
        .map(|n| n.name())
        .collect();
    if !empty_nonterminals.is_empty() {
        eprintln!(
            "[warning] The following nonterminals have no associated production rule: {:?}",
            empty_nonterminals
        );
    }

    let s = Instant::now();
    let sets = FirstFollow::compute(&grammar);
    tracing::info!("compute FIRST/FOLLOW: {:?} elapsed", s.elapsed());

    let mut report = String::new();
    if emit.contains(&Emit::Grammar) {
        writeln!(report, "{}", grammar)?;
    }
    if emit.contains(&Emit::FirstFollow) {
        writeln!(report, "{}", sets.display(&grammar))?;
    }
    if emit.contains(&Emit::Automaton) {
        let s = Instant::now();
        let dfa = DFA::generate_with(&grammar, &sets);
        tracing::info!("generate automaton: {:?} elapsed", s.elapsed());
        write!(report, "{}", dfa.display(&grammar))?;
    }

    match &args.output {
        Some(out_file) => fs::write(out_file, report).with_context(|| {
            anyhow::anyhow!("failed to write the report to {}", out_file.display())
        })?,
        None => print!("{}", report),
    }

    Ok(())
}
