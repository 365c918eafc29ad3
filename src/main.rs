use anyhow::{Context, Result};
use clap::Parser;
use sql_to_xsd::cli::Cli;
use sql_to_xsd::config::AppConfig;
use sql_to_xsd::db::SqlServerSource;
use sql_to_xsd::schema::read_schema;
use sql_to_xsd::xsd::{write_schema_file, XsdOptions};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error!!!");
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let read_options = config.read_options(cli.include_relationships());

    println!("Reading schema from database...");

    let mut source = SqlServerSource::connect(&cli.connection)
        .await
        .context("Could not open the database")?;
    let schema = read_schema(&mut source, read_options)
        .await
        .context("Could not read the database schema")?;
    drop(source);

    println!("Found:");
    println!("{} Tables.", schema.tables.len());
    println!("{} Primary Keys.", schema.primary_keys.len());
    if read_options.include_relationships {
        println!("{} Foreign Keys.", schema.foreign_keys.len());
    }
    println!();
    println!("Writing schema to file...");

    let options = XsdOptions {
        include_relationships: read_options.include_relationships,
        layout: config.layout(),
        ..XsdOptions::new(cli.schema_id, cli.dataset_name)
    };
    write_schema_file(&schema, &options, &cli.target_file)
        .with_context(|| format!("Could not write {}", cli.target_file.display()))?;

    println!("Done!");
    Ok(())
}
