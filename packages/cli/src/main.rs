#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal dashboard for the traffic log.
//!
//! ```text
//! traffic_log_cli reconcile
//! traffic_log_cli recent [--country India] [--violation Speeding] [--limit 10]
//! traffic_log_cli submit
//! traffic_log_cli insight [top-violations]
//! traffic_log_cli serve
//! ```
//!
//! Running with no subcommand enters the interactive dashboard.

mod interactive;
mod render;

use clap::{Parser, Subcommand};
use switchy_database::Database;
use traffic_log_database::{db, queries, reconcile};
use traffic_log_database_models::{SqlDialect, StopFilter, StopSchema};
use traffic_log_insights::{InsightKind, run_insight};

#[derive(Parser)]
#[command(name = "traffic_log_cli", about = "Traffic stop records dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the active stop table schema
    Reconcile,
    /// Show the latest stop records
    Recent {
        /// Exact-match country filter
        #[arg(long)]
        country: Option<String>,
        /// Exact-match violation filter
        #[arg(long)]
        violation: Option<String>,
        /// Maximum number of records to show
        #[arg(long, default_value = "10")]
        limit: u32,
    },
    /// Submit a new stop record (prompts for each field)
    Submit,
    /// Run one insight by id
    Insight {
        /// Insight id (e.g. top-violations); omit to list the catalog
        id: Option<String>,
    },
    /// Start the API server
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive::run().await;
    };

    match command {
        Commands::Serve => {
            traffic_log_server::run_server().await?;
            Ok(())
        }
        command => {
            let (db, dialect) = db::connect_from_env().await?;
            let schema = db::schema_from_env();
            run_command(command, db.as_ref(), dialect, schema).await
        }
    }
}

async fn run_command(
    command: Commands,
    db: &dyn Database,
    dialect: SqlDialect,
    schema: StopSchema,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Reconcile => {
            let report = reconcile::reconcile(db, dialect, schema).await?;

            if report == reconcile::ReconcileReport::default() {
                println!("{} already reconciled.", schema.table());
            } else {
                println!("Reconciled {}:", schema.table());
                println!("  columns added:       {:?}", report.columns_added);
                println!("  drug rows flagged:   {}", report.drug_flagged);
                println!("  locations defaulted: {}", report.locations_defaulted);
                println!("  countries inferred:  {}", report.countries_inferred);
                println!("  datetimes derived:   {}", report.datetimes_derived);
            }
        }
        Commands::Recent {
            country,
            violation,
            limit,
        } => {
            reconcile::reconcile(db, dialect, schema).await?;

            let filter = StopFilter {
                country,
                violation,
                limit,
            };
            let rows = queries::recent_stops(db, dialect, schema, &filter).await?;
            render::stops_table(&rows);
        }
        Commands::Submit => {
            reconcile::reconcile(db, dialect, schema).await?;

            let stop = interactive::prompt_new_stop(db, schema).await?;
            queries::insert_stop(db, dialect, schema, &stop).await?;
            println!("Stop record submitted.");
        }
        Commands::Insight { id: None } => {
            println!("{:<36} TITLE", "ID");
            println!("{}", "-".repeat(76));
            for kind in InsightKind::ALL {
                println!("{:<36} {}", kind.as_ref(), kind.title());
            }
        }
        Commands::Insight { id: Some(id) } => {
            let Ok(kind) = id.parse::<InsightKind>() else {
                eprintln!("Unknown insight id: {id} (run `insight` with no id to list the catalog)");
                std::process::exit(1);
            };

            reconcile::reconcile(db, dialect, schema).await?;

            let result = run_insight(db, dialect, schema, kind).await?;
            render::insight(&result);
        }
        Commands::Serve => unreachable!("handled before connecting"),
    }

    Ok(())
}
