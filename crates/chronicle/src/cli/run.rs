//! Step execution command handlers.

use super::session::{Session, read_json};
use chronicle::{
    AbortSignal, ChronicleContext, ChronicleLifecycle, ChronicleResult, ConfigError, JsonError,
    SamplingMode, TaskRequest, TaskResult, TemporalContext,
};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// Arguments of the `run` command.
#[derive(Debug, Default)]
pub struct StepArgs {
    /// Step name
    pub step: String,
    /// Chronicle id
    pub id: Option<String>,
    /// Targeted version
    pub version: Option<String>,
    /// Sampling mode name
    pub sampling: Option<String>,
    /// Targeted image placement
    pub image_ref: Option<String>,
    /// Context file for generate_v2
    pub context: Option<PathBuf>,
}

/// An abort signal tripped by Ctrl-C.
///
/// The step stops after its in-flight call returns; that call is still billed.
fn interrupt_signal() -> AbortSignal {
    let signal = AbortSignal::new();
    let watcher = signal.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current call");
            watcher.abort();
        }
    });
    signal
}

/// Print a task result as JSON on stdout.
fn print_result(result: &TaskResult) -> ChronicleResult<()> {
    let json = serde_json::to_string_pretty(result)
        .map_err(|e| JsonError::new(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

/// Run one step through the dispatcher.
pub async fn run_step(session: &Session, args: StepArgs) -> ChronicleResult<TaskResult> {
    let sampling_mode = args
        .sampling
        .as_deref()
        .map(|mode| {
            SamplingMode::from_str(mode)
                .map_err(|_| ConfigError::new(format!("Unknown sampling mode: {}", mode)))
        })
        .transpose()?;
    let chronicle_context = args
        .context
        .as_deref()
        .map(read_json::<ChronicleContext>)
        .transpose()?;

    let request = TaskRequest {
        chronicle_id: args.id,
        step: args.step,
        chronicle_context,
        temporal_context: None,
        version_id: args.version,
        sampling_mode,
        image_ref_id: args.image_ref,
    };

    let dispatcher = session.dispatcher()?;
    let result = dispatcher
        .dispatch_request(request, &interrupt_signal())
        .await;
    print_result(&result)?;
    Ok(result)
}

/// Create a pending shell, optionally running the initial generation.
pub async fn submit(
    session: &Session,
    context: PathBuf,
    temporal: Option<PathBuf>,
    id: Option<String>,
    generate: bool,
) -> ChronicleResult<Option<TaskResult>> {
    let context: ChronicleContext = read_json(&context)?;
    let temporal = temporal
        .as_deref()
        .map(read_json::<TemporalContext>)
        .transpose()?;

    let repository = session.repository()?;
    let shell = ChronicleLifecycle::new(&repository)
        .submit_generation(context, temporal, id)
        .await?;
    info!(chronicle_id = %shell.id, "Submitted");
    println!("{}", shell.id);

    if !generate {
        return Ok(None);
    }
    let args = StepArgs {
        step: "generate_v2".to_string(),
        id: Some(shell.id),
        ..Default::default()
    };
    run_step(session, args).await.map(Some)
}
