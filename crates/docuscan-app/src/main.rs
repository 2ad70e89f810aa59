// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DocuScan: photographed-document scanner.
//
// Entry point. Initialises logging, parses the command line, and prints the
// command report as JSON on stdout. Logs go to stderr.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use docuscan_core::DocuScanError;
use serde::Serialize;

use cli::{Cli, Commands};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(command = ?cli.command, "DocuScan starting");

    let result = match &cli.command {
        Commands::Detect(args) => commands::run_detect(args).and_then(|r| print_report(&r)),
        Commands::Process(args) => commands::run_process(args).and_then(|r| print_report(&r)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            exit_code_for(&e)
        }
    }
}

fn print_report<T: Serialize>(report: &T) -> docuscan_core::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Usage problems exit with 2, everything else with 1.
fn exit_code_for(err: &DocuScanError) -> ExitCode {
    match err {
        DocuScanError::InvalidSettings(_) | DocuScanError::Config(_) => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}
