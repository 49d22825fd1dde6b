//! Chronicle CLI binary.
//!
//! This binary provides command-line access to the chronicle pipeline:
//! - Submit generation contexts and run pipeline steps
//! - Inspect records, versions and costs
//! - Accept, unpublish, restart and edit version history

use chronicle::observability::{ObservabilityConfig, init_observability};
use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, LifecycleAction, Session, StepArgs};

    // Load .env for ANTHROPIC_API_KEY
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut logging = ObservabilityConfig::default().with_json_logs(cli.json_logs);
    if cli.verbose {
        logging = logging.with_log_level("debug");
    }
    init_observability(logging)?;

    let session = Session::open(cli.config.as_deref(), cli.store)?;

    let result = match cli.command {
        Commands::Submit {
            context,
            temporal,
            id,
            generate,
        } => cli::submit(&session, context, temporal, id, generate).await?,

        Commands::Run {
            step,
            id,
            version,
            sampling,
            image_ref,
            context,
        } => {
            let args = StepArgs {
                step,
                id,
                version,
                sampling,
                image_ref,
                context,
            };
            Some(cli::run_step(&session, args).await?)
        }

        Commands::Show { id, format } => {
            cli::show(&session, &id, format).await?;
            None
        }

        Commands::List {
            status,
            limit,
            offset,
            format,
        } => {
            cli::list(&session, status.as_deref(), limit, offset, format).await?;
            None
        }

        Commands::Versions { id } => {
            cli::versions(&session, &id).await?;
            None
        }

        Commands::Accept { id } => {
            cli::lifecycle(&session, &id, LifecycleAction::Accept).await?;
            None
        }

        Commands::Unpublish { id } => {
            cli::lifecycle(&session, &id, LifecycleAction::Unpublish).await?;
            None
        }

        Commands::Restart { id } => {
            cli::lifecycle(&session, &id, LifecycleAction::Restart).await?;
            None
        }

        Commands::Activate { id, version } => {
            cli::lifecycle(&session, &id, LifecycleAction::Activate(version)).await?;
            None
        }

        Commands::DeleteVersion { id, version } => {
            cli::lifecycle(&session, &id, LifecycleAction::DeleteVersion(version)).await?;
            None
        }

        Commands::Config => {
            cli::print_config(&session)?;
            None
        }
    };

    // A failed step has already been printed as a result
    if result.is_some_and(|r| !r.success) {
        std::process::exit(1);
    }
    Ok(())
}
