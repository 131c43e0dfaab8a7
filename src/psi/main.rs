use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::debug;
use ot_matrix_psi::cli_utils::Args;
use ot_matrix_psi::psi::run;

fn main() -> Result<()> {
    pretty_env_logger::init();

    let args = Args::parse();

    debug!("{:?}", args);

    if args.role.is_none() {
        Args::command()
            .print_help()
            .with_context(|| "Failed to print the usage.")?;
        return Ok(());
    }

    let report = run(args).with_context(|| "Failed to run the protocol.")?;

    println!("{}", report);

    Ok(())
}
