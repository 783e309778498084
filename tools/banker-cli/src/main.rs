//! Banker CLI
//!
//! Loads a state descriptor, reports whether it is safe, then evaluates one
//! resource request against it.
//!
//! ```text
//! banker-cli <descriptor> [pid r0 .. rm-1] [--json]
//! ```
//!
//! Without request arguments the request line is read from stdin. Any
//! decision (grant, deny or wait) exits 0; malformed input exits 1.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use banker::report::{explain, render_decision, render_safety, DecisionReport};
use banker::{descriptor, Banker, BankerConfig};
use banker_core::{is_safe, SafetyReport};
use serde::Serialize;

const USAGE: &str = "usage: banker-cli <descriptor> [pid r0 .. rm-1] [--json]";

struct Args {
    descriptor: PathBuf,
    request: Option<String>,
    json: bool,
}

fn parse_args(raw: impl Iterator<Item = String>) -> Option<Args> {
    let mut json = false;
    let mut positional = Vec::new();
    for arg in raw {
        match arg.as_str() {
            "--json" => json = true,
            "-h" | "--help" => return None,
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let descriptor = PathBuf::from(positional.next()?);
    let rest: Vec<String> = positional.collect();
    Some(Args {
        descriptor,
        request: (!rest.is_empty()).then(|| rest.join(" ")),
        json,
    })
}

#[derive(Serialize)]
struct JsonOutput {
    initial: SafetyReport,
    decision: DecisionReport,
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let state = descriptor::load(&args.descriptor)?;
    let initial = is_safe(&state);
    if !args.json {
        println!("{}", render_safety(&initial));
        println!();
    }

    let line = match args.request {
        Some(line) => line,
        None => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            input
        }
    };
    let (pid, request) = descriptor::parse_request(&line, state.resource_count())?;

    let banker = Banker::with_config(state, BankerConfig::from_env());
    let decision = banker.request(pid, &request)?;
    let after = banker.snapshot();

    if args.json {
        let output = JsonOutput {
            initial,
            decision: DecisionReport::new(pid, &request, &decision, after.available()),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", render_decision(&decision));
        if let Some(detail) = explain(&decision) {
            log::info!("{} {:?}: {}", pid, request, detail);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let Some(args) = parse_args(std::env::args().skip(1)) else {
        eprintln!("{}", USAGE);
        return ExitCode::FAILURE;
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
