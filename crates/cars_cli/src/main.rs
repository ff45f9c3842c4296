//! Command-line front end for the cars store.
//!
//! # Responsibility
//! - Load store properties, wire the SQLite repository, run one operation.
//! - Print results one car per line.

use std::path::PathBuf;

use anyhow::{Context, Result};
use cars_core::{
    default_log_level, init_logging, Car, CarId, CarRepository, LegacyCarRepository, Repository,
    SqliteCarRepository, SqliteConnectionProvider, StoreProperties,
};
use clap::{Parser, Subcommand};
use log::info;

#[derive(Parser, Debug)]
#[command(name = "cars", version, about = "Query and edit the cars store")]
struct Cli {
    /// Properties file with `db.url` and optional credentials.
    /// Falls back to `CARS_DB_*` environment variables when omitted.
    #[arg(long, env = "CARS_CONFIG")]
    config: Option<PathBuf>,

    /// Absolute directory for rolling log files; logging is off when omitted.
    #[arg(long, env = "CARS_LOG_DIR")]
    log_dir: Option<String>,

    /// Log verbosity; only meaningful together with `--log-dir`.
    #[arg(long, env = "CARS_LOG_LEVEL", requires = "log_dir")]
    log_level: Option<String>,

    /// Swallow store failures (logged only) instead of failing the command.
    #[arg(long)]
    legacy: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every car.
    List,
    /// List cars with an exact manufacturer match.
    ByManufacturer { manufacturer: String },
    /// List cars built between two years, inclusive.
    BetweenYears { min: i32, max: i32 },
    /// Store a new car and print it with its assigned id.
    Add {
        manufacturer: String,
        model: String,
        year: i32,
    },
    /// Overwrite the car with the given id.
    Update {
        id: CarId,
        manufacturer: String,
        model: String,
        year: i32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli
            .log_level
            .clone()
            .unwrap_or_else(|| default_log_level().to_string());
        init_logging(&level, log_dir).context("failed to initialize logging")?;
    }

    let properties = match cli.config.as_ref() {
        Some(path) => StoreProperties::from_file(path)?,
        None => StoreProperties::from_env()?,
    };
    let provider = SqliteConnectionProvider::from_properties(&properties)
        .context("failed to open cars store")?;
    let repo = SqliteCarRepository::try_new(provider)?;
    info!("event=cli_command module=cli status=start command={:?}", cli.command);

    if cli.legacy {
        run_legacy(LegacyCarRepository::new(repo), cli.command);
        return Ok(());
    }
    run(&repo, cli.command)
}

fn run(repo: &impl CarRepository, command: Command) -> Result<()> {
    match command {
        Command::List => print_cars(&repo.find_all()?),
        Command::ByManufacturer { manufacturer } => {
            print_cars(&repo.find_by_manufacturer(&manufacturer)?)
        }
        Command::BetweenYears { min, max } => print_cars(&repo.find_between_years(min, max)?),
        Command::Add {
            manufacturer,
            model,
            year,
        } => println!("{}", repo.add(&Car::new(manufacturer, model, year))?),
        Command::Update {
            id,
            manufacturer,
            model,
            year,
        } => {
            let changed = repo.update(id, &Car::new(manufacturer, model, year))?;
            println!("updated {changed} car(s)");
        }
    }
    Ok(())
}

fn run_legacy<R: CarRepository>(repo: LegacyCarRepository<R>, command: Command) {
    match command {
        Command::List => print_cars(&repo.find_all()),
        Command::ByManufacturer { manufacturer } => {
            print_cars(&repo.find_by_manufacturer(&manufacturer))
        }
        Command::BetweenYears { min, max } => print_cars(&repo.find_between_years(min, max)),
        Command::Add {
            manufacturer,
            model,
            year,
        } => repo.add(&Car::new(manufacturer, model, year)),
        Command::Update {
            id,
            manufacturer,
            model,
            year,
        } => repo.update(id, &Car::new(manufacturer, model, year)),
    }
}

fn print_cars(cars: &[Car]) {
    for car in cars {
        println!("{car}");
    }
}
