use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod config;
mod db;
mod http;
mod models;
mod notify;
mod report;
mod schedule;
mod sweep;

use config::AppConfig;
use http::AppState;
use models::EvaluationFilter;
use notify::CalendarClient;

#[derive(Parser)]
#[command(name = "perfcycle")]
#[command(about = "Multi-tenant performance review backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a realistic demo tenant
    Seed,
    /// Import employees from a CSV file (idempotent on e-mail)
    ImportEmployees {
        #[arg(long)]
        csv: PathBuf,
        /// Company the imported employees belong to
        #[arg(long)]
        company: Option<Uuid>,
        /// Acting user recorded as the creator
        #[arg(long)]
        created_by: Uuid,
    },
    /// Run the REST API with the background sweep loop
    Serve,
    /// Execute every due scheduled appraisal task once
    Sweep {
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Write a markdown completion report for one initiated appraisal
    Report {
        #[arg(long)]
        appraisal: Uuid,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::ImportEmployees {
            csv,
            company,
            created_by,
        } => {
            let imported =
                db::people::import_employees_csv(&pool, &csv, company, created_by).await?;
            println!("Imported {imported} employees from {}.", csv.display());
        }
        Commands::Serve => {
            let state = AppState {
                pool: pool.clone(),
                config: Arc::new(config.clone()),
                calendar: CalendarClient::new(),
            };
            tokio::spawn(sweep::run_periodic(
                pool,
                config.smtp.clone(),
                config.sweep_interval_secs,
            ));
            http::serve(state).await?;
        }
        Commands::Sweep { as_of } => {
            let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());
            let outcome = sweep::run_sweep(&pool, config.smtp.as_ref(), as_of).await?;
            println!(
                "Sweep done: {} executed, {} failed, {} evaluations created, {} reminders sent.",
                outcome.executed, outcome.failed, outcome.evaluations_created, outcome.reminders_sent
            );
        }
        Commands::Report { appraisal, out } => {
            let appraisal_row = db::appraisals::get_appraisal_unscoped(&pool, appraisal)
                .await?
                .context("no such initiated appraisal")?;
            let evaluations = db::evaluations::list_evaluations(
                &pool,
                &EvaluationFilter {
                    initiated_appraisal_id: Some(appraisal),
                    ..EvaluationFilter::default()
                },
            )
            .await?;

            let mut period_names = HashMap::new();
            if let Some(calendar_id) = appraisal_row.frequency_calendar_id {
                for detail in db::cycles::active_details_for_calendar(&pool, calendar_id).await? {
                    period_names.insert(detail.id, detail.display_name);
                }
            }

            let summary = report::summarize(appraisal, &evaluations, &period_names);
            let pending = db::evaluations::pending_employees(&pool, appraisal).await?;
            let text = report::build_report(&appraisal_row, &summary, &pending);
            std::fs::write(&out, text)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
