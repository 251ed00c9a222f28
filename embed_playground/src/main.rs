//! # Embed Playground
//!
//! Main entry point for the playground binary.

use embed_playground::{PlaygroundRuntime, RunSummary, Scenario};
use std::env;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Parsed command line
#[derive(Debug, Default)]
struct Options {
    scenario: Option<PathBuf>,
    log_messages: bool,
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let options = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        print_usage(&args[0]);
        process::exit(1);
    });

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let scenario = match &options.scenario {
        Some(path) => Scenario::load(path),
        None => Scenario::demo(),
    };
    let mut scenario = scenario.unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });
    scenario.log_messages |= options.log_messages;

    match PlaygroundRuntime::new(scenario).run() {
        Ok(summary) => print_summary(&summary),
        Err(e) => {
            eprintln!("Playground error: {}", e);
            process::exit(1);
        }
    }
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut options = Options::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--scenario" | "-s" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --scenario".to_string());
                }
                options.scenario = Some(PathBuf::from(&args[i]));
            }
            "--log-messages" => {
                options.log_messages = true;
            }
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other => {
                return Err(format!("Unknown option: {}", other));
            }
        }
        i += 1;
    }

    Ok(options)
}

fn print_summary(summary: &RunSummary) {
    println!("instances embedded: {}", summary.instances);
    for (index, step) in summary.steps.iter().enumerate() {
        let target = step.target.as_deref().unwrap_or("-");
        match &step.result {
            Ok(value) => println!("{:>3} {:<16} {:<10} ok {}", index, step.op, target, value),
            Err(e) => println!("{:>3} {:<16} {:<10} FAILED {}", index, step.op, target, e),
        }
    }
    println!("events:");
    for line in &summary.events {
        println!("  {}", line);
    }
    println!("{} step(s) failed", summary.failures());
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} [OPTIONS]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -s, --scenario <FILE>    Scenario file (JSON); runs the bundled demo when omitted");
    eprintln!("  --log-messages           Trace every message between the windows");
    eprintln!("  -h, --help               Show this help message");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} --scenario embed_playground/scenarios/demo.json", program);
    eprintln!("  RUST_LOG=debug {} --log-messages", program);
}
