//! Record inspection and lifecycle command handlers.

use super::commands::OutputFormat;
use super::session::Session;
use chronicle::{
    ChronicleError, ChronicleLifecycle, ChronicleRecord, ChronicleRepository, ChronicleResult,
    ChronicleStatus, ConfigError, JsonError, RecordFilter, StepError, StepErrorKind, word_count,
};
use std::str::FromStr;

fn to_json<T: serde::Serialize>(value: &T) -> ChronicleResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| JsonError::new(e.to_string()).into())
}

async fn load(session: &Session, id: &str) -> ChronicleResult<ChronicleRecord> {
    session.repository()?.get(id).await?.ok_or_else(|| {
        ChronicleError::from(StepError::new(StepErrorKind::ChronicleNotFound(id.to_string())))
    })
}

/// Show one record.
pub async fn show(session: &Session, id: &str, format: OutputFormat) -> ChronicleResult<()> {
    let record = load(session, id).await?;
    match format {
        OutputFormat::Json => println!("{}", to_json(&record)?),
        OutputFormat::Human => {
            println!("Chronicle {}", record.id);
            println!("{:-<80}", "");
            println!("Status:   {}", record.status());
            println!(
                "Title:    {}",
                record.title.as_ref().map(|t| t.title.as_str()).unwrap_or("(untitled)")
            );
            println!(
                "Style:    {} ({})",
                record.context.style.name, record.context.style.format
            );
            println!(
                "Versions: {} (active {})",
                record.versions.len(),
                record.active_version_id.as_deref().unwrap_or("none")
            );
            println!(
                "Cost:     ${:.4} over {} calls",
                record.costs.totals.actual_cost, record.costs.totals.calls
            );
            if let Some(failure) = &record.failure {
                println!("Failed:   {} ({})", failure.message, failure.step);
            }
            if let Some(summary) = &record.summary {
                println!("Summary:  {}", summary.text);
            }
            if let Some(content) = record.current_content() {
                println!("{:-<80}", "");
                println!("{}", content);
                println!("{:-<80}", "");
                println!("{} words", word_count(content));
            }
        }
    }
    Ok(())
}

/// List records, newest first.
pub async fn list(
    session: &Session,
    status: Option<&str>,
    limit: usize,
    offset: usize,
    format: OutputFormat,
) -> ChronicleResult<()> {
    let mut filter = RecordFilter::new().with_limit(limit).with_offset(offset);
    if let Some(status) = status {
        let status = ChronicleStatus::from_str(status)
            .map_err(|_| ConfigError::new(format!("Unknown status: {}", status)))?;
        filter = filter.with_status(status);
    }
    let summaries = session.repository()?.list(&filter).await?;

    match format {
        OutputFormat::Json => println!("{}", to_json(&summaries)?),
        OutputFormat::Human => {
            for s in &summaries {
                println!(
                    "{:<38} {:<14} {:>3}v {:>6}w ${:>8.4}  {}",
                    s.id,
                    s.status.to_string(),
                    s.version_count,
                    s.word_count,
                    s.actual_cost,
                    s.title.as_deref().unwrap_or("")
                );
            }
            println!("Total: {} chronicles", summaries.len());
        }
    }
    Ok(())
}

/// List the versions of a record.
pub async fn versions(session: &Session, id: &str) -> ChronicleResult<()> {
    let record = load(session, id).await?;
    for v in record.version_summaries() {
        let marker = if v.is_active { "*" } else { " " };
        println!(
            "{} {:<38} {:<11} {:<7} {:>6}w  {}",
            marker,
            v.id,
            v.step.to_string(),
            v.sampling_mode.to_string(),
            v.word_count,
            v.generated_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}

/// A lifecycle operation requested from the command line.
#[derive(Debug, Clone)]
pub enum LifecycleAction {
    /// Accept the active version
    Accept,
    /// Clear the accepted content
    Unpublish,
    /// Delete and recreate the shell
    Restart,
    /// Point the active version elsewhere
    Activate(String),
    /// Delete a version
    DeleteVersion(String),
}

/// Apply a lifecycle operation and report the resulting status.
pub async fn lifecycle(session: &Session, id: &str, action: LifecycleAction) -> ChronicleResult<()> {
    let repository = session.repository()?;
    let lifecycle = ChronicleLifecycle::new(&repository);
    let record = match &action {
        LifecycleAction::Accept => lifecycle.accept(id).await?,
        LifecycleAction::Unpublish => lifecycle.unpublish(id).await?,
        LifecycleAction::Restart => lifecycle.restart(id).await?,
        LifecycleAction::Activate(version) => lifecycle.set_active_version(id, version).await?,
        LifecycleAction::DeleteVersion(version) => lifecycle.delete_version(id, version).await?,
    };
    println!(
        "{}: {} ({} versions)",
        record.id,
        record.status(),
        record.versions.len()
    );
    Ok(())
}

/// Print the resolved configuration as TOML.
pub fn print_config(session: &Session) -> ChronicleResult<()> {
    print!("{}", session.config().to_toml_string()?);
    Ok(())
}
