use crate::infra::Backend;
use card_intake::applications::{
    ApplicationService, ApplicationStatus, ImportSummary, Overview,
};
use card_intake::auth::IdentityProvider;
use card_intake::config::AppConfig;
use card_intake::error::AppError;
use card_intake::store::RecordStore;
use card_intake::telemetry;
use chrono::{DateTime, Local};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// CSV export whose header row names primary-table columns
    #[arg(long)]
    pub(crate) file: PathBuf,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ReportArgs {
    /// Print the report as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) async fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let csv = tokio::fs::read_to_string(&args.file).await?;
    let batch_size = config.store.batch_size;
    let summary = match Backend::from_config(&config.store) {
        Backend::Hosted(store) => import(store.clone(), store, batch_size, &csv).await?,
        Backend::Memory { store, identity } => import(store, identity, batch_size, &csv).await?,
    };

    println!("{}", render_import(&args.file, &summary));
    Ok(())
}

pub(crate) async fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let batch_size = config.store.batch_size;
    let overview = match Backend::from_config(&config.store) {
        Backend::Hosted(store) => overview(store.clone(), store, batch_size).await?,
        Backend::Memory { store, identity } => overview(store, identity, batch_size).await?,
    };

    if args.json {
        let rendered = serde_json::to_string_pretty(&overview).map_err(std::io::Error::from)?;
        println!("{rendered}");
    } else {
        print!("{}", render_overview(&overview, Local::now()));
    }
    Ok(())
}

async fn import<S, I>(
    store: Arc<S>,
    identity: Arc<I>,
    batch_size: usize,
    csv: &str,
) -> Result<ImportSummary, AppError>
where
    S: RecordStore + 'static,
    I: IdentityProvider + 'static,
{
    let service = ApplicationService::new(store, identity, batch_size);
    Ok(service.import_unchecked(csv).await?)
}

async fn overview<S, I>(store: Arc<S>, identity: Arc<I>, batch_size: usize) -> Result<Overview, AppError>
where
    S: RecordStore + 'static,
    I: IdentityProvider + 'static,
{
    let service = ApplicationService::new(store, identity, batch_size);
    Ok(service.overview().await?)
}

fn render_import(file: &std::path::Path, summary: &ImportSummary) -> String {
    let mut output = format!(
        "Imported {}: {} parsed, {} inserted, {} failed",
        file.display(),
        summary.parsed,
        summary.inserted,
        summary.failed
    );
    for error in &summary.errors {
        output.push_str(&format!("\n  {error}"));
    }
    output
}

pub(crate) fn render_overview(overview: &Overview, generated_at: DateTime<Local>) -> String {
    let mut lines = vec![
        format!("Application report ({})", generated_at.format("%Y-%m-%d %H:%M")),
        format!("Total applications: {}", overview.counts.total),
    ];
    lines.extend(
        overview
            .counts
            .by_status
            .iter()
            .map(|(status, count)| format!("  {:<12} {count:>6}", status.label())),
    );

    lines.push(String::new());
    lines.push(format!(
        "{:<16} {:>9} {:>8} {:>8} {:>8} {:>8}",
        "Bank", "Requested", "Records", "Approved", "Pending", "Rejected"
    ));
    lines.extend(overview.banks.iter().map(|bank| {
        format!(
            "{:<16} {:>9} {:>8} {:>8} {:>8} {:>8}",
            bank.display_name,
            bank.requested,
            bank.statuses.total,
            bank.statuses.count(ApplicationStatus::Approved),
            bank.statuses.count(ApplicationStatus::Pending),
            bank.statuses.count(ApplicationStatus::Rejected),
        )
    }));

    let mut output = lines.join("\n");
    output.push('\n');
    output
}
