//! dbdump: logical SQL dumps of a live MySQL database.
//!
//! Logs go to stderr; with `-o -` the dump itself goes to stdout.

use anyhow::Context;
use clap::Parser;
use dbdump::{Cli, build_settings_map, parse_dsn, parse_table_limits, parse_table_wheres};
use dbdump_core::{
    Destination, Dumper, FileSink, Settings, init_logging,
    source::{Credentials, mysql::MySqlSource},
};
use std::io::Write;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.global.verbose, cli.global.quiet) {
        eprintln!("{}", e);
        std::process::exit(2);
    }

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let dsn = parse_dsn(&cli.dsn)?;
    let settings = Settings::new(build_settings_map(&cli)?).context("Invalid dump settings")?;
    let wheres = parse_table_wheres(&cli.dump.where_table)?;
    let limits = parse_table_limits(&cli.dump.limit_table)?;
    let destination = Destination::from_arg(&cli.output);

    let password = if cli.password_prompt {
        Some(read_password()?)
    } else {
        cli.password.clone()
    };
    let credentials = Credentials::new(cli.user.clone(), password);

    let source = MySqlSource::connect(&dsn, &credentials).await?;
    let sink = FileSink::new(settings.compress(), settings.compress_level());

    let mut dumper = Dumper::new(&cli.dsn, settings, Box::new(source), Box::new(sink))?;
    dumper.set_table_wheres(wheres);
    dumper.set_table_limits(limits);
    dumper.set_info_hook(|table| {
        info!("Dumped {} row(s) from '{}'", table.row_count, table.name);
    });
    dumper.start(&destination).await?;
    Ok(())
}

/// Reads the password from the terminal, prompting on stderr.
fn read_password() -> anyhow::Result<String> {
    eprint!("Enter password: ");
    std::io::stderr()
        .flush()
        .context("Failed to flush stderr before reading password")?;
    rpassword::read_password().context("Failed to read password")
}
