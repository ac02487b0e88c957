//! # ncgen
//!
//! Command-line front end: generate container files from configuration
//! documents, dump their structure, check configurations and write demos.
//!
//! ## Usage
//!
//! ```bash
//! # Compile a configuration and its data into a container
//! ncgen generate pwat.toml pwat.ncz --data pwat_data.json
//!
//! # Show the structure of a file
//! ncgen dump pwat.ncz -H
//!
//! # Validate a configuration without writing anything
//! ncgen check pwat.toml
//!
//! # Write the bundled demo files
//! ncgen demo demo_out/
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
