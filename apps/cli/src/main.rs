//! feedbundle CLI: validate OPML feed lists and build merged bundles.
//!
//! Every `*.opml.xml` at the repository root is validated, then every bundle
//! specification under `bundles/` is merged into `dist/`.

mod commands;

use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
