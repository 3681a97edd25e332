//! upcheck - Safe dependency advance checker CLI
//!
//! Reads declared dependency lines, queries a package registry through the
//! resilient fetch client, validates each candidate against the dependency
//! graph, and reports which packages can be advanced.

use std::collections::HashMap;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use upcheck::cli::{parse_dependency_line, CliArgs};
use upcheck::fetch::FetchClient;
use upcheck::orchestrator::Orchestrator;
use upcheck::registry::create_registry;
use upcheck::report;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    let default_filter = if args.quiet { "upcheck=error" } else { "upcheck=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with_writer(io::stderr)
        .init();

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let content = std::fs::read_to_string(&args.deps_file)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", args.deps_file.display()))?;

    let dependencies: Vec<_> = content.lines().filter_map(parse_dependency_line).collect();
    if dependencies.is_empty() {
        if !args.quiet {
            println!("No dependencies declared in {}.", args.deps_file.display());
        }
        return Ok(ExitCode::SUCCESS);
    }

    let mut client = FetchClient::new()?;
    if let Some(deadline) = args.deadline {
        client = client.with_deadline(deadline);
    }
    let client = Arc::new(client);

    let registry = create_registry(args.registry, args.effective_index_url(), Arc::clone(&client));
    let mut orchestrator = Orchestrator::new(Arc::from(registry), Arc::clone(&client));

    let constraints: HashMap<String, String> = dependencies
        .iter()
        .map(|d| (d.name.clone(), d.constraint.clone()))
        .collect();

    let outcome = orchestrator.run(&dependencies).await;

    let snapshot = args.verbose.then(|| client.metrics_snapshot());
    let mut stdout = io::stdout().lock();
    report::render(&outcome, &constraints, snapshot.as_ref(), &mut stdout)?;
    stdout.flush()?;

    // Partial success when any fetch failed; constraint skips are normal.
    if outcome.has_fetch_failures() {
        Ok(ExitCode::from(2))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
