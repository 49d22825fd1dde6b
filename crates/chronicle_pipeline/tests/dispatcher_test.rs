//! End-to-end step dispatch against the scripted text service.

mod test_utils;

use chronicle_core::{
    CallType, ChronicleStatus, QuickCheckAssessment, SamplingMode, StyleFormat, VersionStep,
};
use chronicle_interface::ChronicleRepository;
use chronicle_pipeline::{
    AbortSignal, ChronicleLifecycle, ChronicleTask, Step, StepPayload, TaskResult,
};
use test_utils::{DRAFT, MockGenerator, MockResponse, PERSPECTIVE, TestDispatcher, dispatcher};

const CHRONICLE_ID: &str = "chr-harbor";

async fn run(dispatcher: &TestDispatcher, step: Step) -> TaskResult {
    dispatcher
        .dispatch(
            &ChronicleTask::for_chronicle(step, CHRONICLE_ID),
            &AbortSignal::new(),
        )
        .await
}

/// A dispatcher holding a freshly generated chronicle.
async fn generated() -> anyhow::Result<TestDispatcher> {
    let dispatcher = dispatcher(MockGenerator::new_texts(&[PERSPECTIVE, DRAFT]));
    let task = ChronicleTask::builder()
        .step(Step::GenerateV2)
        .chronicle_id(CHRONICLE_ID)
        .context(test_utils::harbor_context())
        .build()?;
    let result = dispatcher.dispatch(&task, &AbortSignal::new()).await;
    assert!(result.success, "generation failed: {:?}", result.error);
    Ok(dispatcher)
}

async fn version_count(dispatcher: &TestDispatcher) -> anyhow::Result<usize> {
    let record = dispatcher
        .repository()
        .get(CHRONICLE_ID)
        .await?
        .ok_or_else(|| anyhow::anyhow!("record missing"))?;
    Ok(record.versions.len())
}

#[tokio::test]
async fn generate_v2_creates_record_with_one_version() -> anyhow::Result<()> {
    let dispatcher = generated().await?;
    assert_eq!(dispatcher.generator().call_count(), 2);

    let record = dispatcher
        .repository()
        .get(CHRONICLE_ID)
        .await?
        .ok_or_else(|| anyhow::anyhow!("record missing"))?;
    assert_eq!(record.versions.len(), 1);
    assert_eq!(record.versions[0].step, VersionStep::Generate);
    assert_eq!(record.current_content(), Some(DRAFT));
    assert_eq!(record.status(), ChronicleStatus::AssemblyReady);
    assert!(record.prompts.is_some());

    let perspective = record
        .perspective
        .ok_or_else(|| anyhow::anyhow!("perspective missing"))?;
    assert_eq!(perspective.output.suggested_motifs, vec!["salt", "ledger ink"]);
    assert!(perspective.output.temporal_narrative.is_none());

    assert_eq!(record.costs.totals.calls, 2);
    assert_eq!(record.costs.totals.input_tokens, 200);
    assert!(record.costs.totals.actual_cost > 0.0);
    assert_eq!(record.costs.by_call_type[&CallType::Perspective].calls, 1);
    assert_eq!(record.costs.by_call_type[&CallType::Generation].calls, 1);
    assert_eq!(dispatcher.cost_sink().records().await.len(), 2);
    Ok(())
}

#[tokio::test]
async fn generate_v2_reports_costs_in_result() -> anyhow::Result<()> {
    let dispatcher = dispatcher(MockGenerator::new_texts(&[PERSPECTIVE, DRAFT]));
    let task = ChronicleTask::builder()
        .step(Step::GenerateV2)
        .context(test_utils::harbor_context())
        .build()?;
    let result = dispatcher.dispatch(&task, &AbortSignal::new()).await;

    let output = result
        .result
        .ok_or_else(|| anyhow::anyhow!("no output: {:?}", result.error))?;
    assert!(!output.chronicle_id.is_empty());
    assert_eq!(output.input_tokens, 200);
    assert_eq!(output.output_tokens, 100);
    assert_eq!(output.model.as_deref(), Some("claude-sonnet-4-5"));
    assert!(matches!(
        output.payload,
        StepPayload::Version {
            step: VersionStep::Generate,
            ..
        }
    ));
    assert!(dispatcher.repository().get(&output.chronicle_id).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn each_editing_step_appends_exactly_one_version() -> anyhow::Result<()> {
    let dispatcher = generated().await?;

    let steps = [
        (Step::RegenerateFull, vec![PERSPECTIVE, "A second telling of the shortfall."]),
        (Step::RegenerateCreative, vec!["The ledger itself speaks."]),
        (Step::RegenerateTemperature, vec!["A cooler third telling."]),
        (Step::Combine, vec!["The best of every telling."]),
        (Step::CopyEdit, vec!["The best of every telling, polished."]),
    ];
    for (expected, (step, texts)) in steps.into_iter().enumerate() {
        dispatcher.generator().push_texts(&texts);
        let before = dispatcher.generator().call_count();

        let result = run(&dispatcher, step).await;

        assert!(result.success, "{} failed: {:?}", step, result.error);
        assert_eq!(dispatcher.generator().call_count() - before, texts.len());
        assert_eq!(version_count(&dispatcher).await?, expected + 2);
    }

    let record = dispatcher
        .repository()
        .get(CHRONICLE_ID)
        .await?
        .ok_or_else(|| anyhow::anyhow!("record missing"))?;
    let steps: Vec<VersionStep> = record.versions.iter().map(|v| v.step).collect();
    assert_eq!(
        steps,
        vec![
            VersionStep::Generate,
            VersionStep::Regenerate,
            VersionStep::Creative,
            VersionStep::Regenerate,
            VersionStep::Combine,
            VersionStep::CopyEdit,
        ]
    );
    assert_eq!(
        record.current_content(),
        Some("The best of every telling, polished.")
    );
    assert_eq!(record.status(), ChronicleStatus::Editing);
    Ok(())
}

#[tokio::test]
async fn regenerate_temperature_varies_only_top_p() -> anyhow::Result<()> {
    let dispatcher = generated().await?;
    dispatcher.generator().push_texts(&["Resampled."]);
    let stored = dispatcher
        .repository()
        .get(CHRONICLE_ID)
        .await?
        .and_then(|r| r.prompts)
        .ok_or_else(|| anyhow::anyhow!("prompts missing"))?;

    let task = ChronicleTask::builder()
        .step(Step::RegenerateTemperature)
        .chronicle_id(CHRONICLE_ID)
        .sampling_mode(SamplingMode::Low)
        .build()?;
    let result = dispatcher.dispatch(&task, &AbortSignal::new()).await;
    assert!(result.success, "{:?}", result.error);

    let request = dispatcher
        .generator()
        .last_request()
        .ok_or_else(|| anyhow::anyhow!("no request"))?;
    assert_eq!(request.sampling().temperature, None);
    assert_eq!(request.sampling().top_p, Some(0.9));
    assert_eq!(request.system_prompt(), &stored.system);
    assert_eq!(request.user_prompt(), &stored.user);

    let record = dispatcher
        .repository()
        .get(CHRONICLE_ID)
        .await?
        .ok_or_else(|| anyhow::anyhow!("record missing"))?;
    let active = record
        .active_version()
        .ok_or_else(|| anyhow::anyhow!("no active version"))?;
    assert_eq!(active.sampling_mode, SamplingMode::Low);
    Ok(())
}

#[tokio::test]
async fn compare_with_one_version_fails_without_a_call() -> anyhow::Result<()> {
    let dispatcher = generated().await?;
    let before = dispatcher.generator().call_count();

    let result = run(&dispatcher, Step::Compare).await;

    assert!(!result.success);
    assert!(result.error.unwrap_or_default().contains("at least 2"));
    assert_eq!(dispatcher.generator().call_count(), before);
    Ok(())
}

#[tokio::test]
async fn compare_stores_report_and_feeds_combine() -> anyhow::Result<()> {
    let dispatcher = generated().await?;
    dispatcher
        .generator()
        .push_texts(&[PERSPECTIVE, "A second telling."]);
    assert!(run(&dispatcher, Step::RegenerateFull).await.success);

    let report = "Version A is tighter; Version B has the better ending.\n\n\
                  ## Combine Instructions\nKeep A's opening and B's final scene.";
    dispatcher.generator().push_texts(&[report, "Merged telling."]);
    let result = run(&dispatcher, Step::Compare).await;
    let Some(StepPayload::Comparison { report }) = result.payload() else {
        anyhow::bail!("unexpected result: {:?}", result);
    };
    assert_eq!(report.version_ids.len(), 2);
    assert!(
        report
            .combine_instructions
            .as_deref()
            .is_some_and(|i| i.contains("B's final scene"))
    );
    assert_eq!(version_count(&dispatcher).await?, 2);

    assert!(run(&dispatcher, Step::Combine).await.success);
    let combine_request = dispatcher
        .generator()
        .last_request()
        .ok_or_else(|| anyhow::anyhow!("no request"))?;
    assert!(combine_request.user_prompt().contains("B's final scene"));
    assert_eq!(version_count(&dispatcher).await?, 3);
    Ok(())
}

#[tokio::test]
async fn accepted_chronicle_rejects_editing_steps() -> anyhow::Result<()> {
    let dispatcher = generated().await?;
    let accepted = ChronicleLifecycle::new(dispatcher.repository())
        .accept(CHRONICLE_ID)
        .await?;
    assert_eq!(accepted.final_content.as_deref(), Some(DRAFT));
    let before = dispatcher.generator().call_count();

    for step in [
        Step::RegenerateFull,
        Step::RegenerateTemperature,
        Step::CopyEdit,
        Step::Summary,
    ] {
        let result = run(&dispatcher, step).await;
        assert!(!result.success, "{} should be locked", step);
        assert!(result.error.unwrap_or_default().contains("accepted"));
    }
    assert_eq!(dispatcher.generator().call_count(), before);
    assert_eq!(version_count(&dispatcher).await?, 1);

    dispatcher.generator().push_texts(&[
        r#"{"sceneDescription": "Aldric Venn alone on the quay at dusk, counting barrels."}"#,
    ]);
    let result = run(&dispatcher, Step::CoverImageScene).await;
    assert!(result.success, "cover scene should run after acceptance: {:?}", result.error);
    Ok(())
}

#[tokio::test]
async fn title_is_title_cased_and_deduplicated() -> anyhow::Result<()> {
    let dispatcher = generated().await?;
    dispatcher.generator().push_texts(&[
        r#"{"fragments": ["the shortfall", "grey tide"]}"#,
        r#"{"titles": ["the salt ledger", "The Salt Ledger", "what the tide kept", "Grey Tide"]}"#,
    ]);

    let result = run(&dispatcher, Step::Title).await;

    let Some(StepPayload::Title {
        title,
        candidates,
        fragments,
    }) = result.payload()
    else {
        anyhow::bail!("unexpected result: {:?}", result);
    };
    assert_eq!(title, "The Salt Ledger");
    assert_eq!(candidates, &vec!["The Salt Ledger", "What the Tide Kept"]);
    assert_eq!(fragments.len(), 2);

    let stored = dispatcher
        .repository()
        .get(CHRONICLE_ID)
        .await?
        .and_then(|r| r.title)
        .ok_or_else(|| anyhow::anyhow!("title missing"))?;
    assert_eq!(stored.title, "The Salt Ledger");
    Ok(())
}

#[tokio::test]
async fn title_survives_failed_fragment_phase() -> anyhow::Result<()> {
    let dispatcher = generated().await?;
    dispatcher
        .generator()
        .push(MockResponse::Error("Overloaded".into()));
    dispatcher
        .generator()
        .push_texts(&["1. the count\n2. a cold quay"]);

    let result = run(&dispatcher, Step::Title).await;

    let Some(StepPayload::Title {
        title, fragments, ..
    }) = result.payload()
    else {
        anyhow::bail!("unexpected result: {:?}", result);
    };
    assert_eq!(title, "The Count");
    assert!(fragments.is_empty());
    Ok(())
}

#[tokio::test]
async fn quick_check_never_reports_cast_names() -> anyhow::Result<()> {
    let dispatcher = dispatcher(MockGenerator::new_texts(&[
        PERSPECTIVE,
        "The tide came in grey. Aldric Venn met Oskar Thrane on the quay at Greyharbor.",
    ]));
    let task = ChronicleTask::builder()
        .step(Step::GenerateV2)
        .chronicle_id(CHRONICLE_ID)
        .context(test_utils::harbor_context())
        .build()?;
    assert!(dispatcher.dispatch(&task, &AbortSignal::new()).await.success);

    dispatcher.generator().push_texts(&[r#"{"suspects": [
        {"phrase": "Oskar Thrane", "context": "met Oskar Thrane on the quay", "confidence": "high", "reason": "not in the world"},
        {"phrase": "Aldric Venn", "context": "Aldric Venn met", "confidence": "medium", "reason": "unsure"},
        {"phrase": "Greyharbor", "context": "at Greyharbor", "confidence": "low", "reason": "unsure"}
    ]}"#]);
    let result = run(&dispatcher, Step::QuickCheck).await;

    let Some(StepPayload::QuickCheck { report }) = result.payload() else {
        anyhow::bail!("unexpected result: {:?}", result);
    };
    let phrases: Vec<&str> = report.suspects.iter().map(|s| s.phrase.as_str()).collect();
    assert_eq!(phrases, vec!["Oskar Thrane"]);
    assert_eq!(report.assessment, QuickCheckAssessment::Flagged);

    let quick_check_request = dispatcher
        .generator()
        .last_request()
        .ok_or_else(|| anyhow::anyhow!("no request"))?;
    assert!(quick_check_request.user_prompt().contains("Oskar Thrane"));

    let record = dispatcher
        .repository()
        .get(CHRONICLE_ID)
        .await?
        .ok_or_else(|| anyhow::anyhow!("record missing"))?;
    assert_eq!(record.status(), ChronicleStatus::Validating);
    Ok(())
}

#[tokio::test]
async fn quick_check_on_clean_text_makes_no_call() -> anyhow::Result<()> {
    let dispatcher = generated().await?;
    let before = dispatcher.generator().call_count();

    let result = run(&dispatcher, Step::QuickCheck).await;

    let Some(StepPayload::QuickCheck { report }) = result.payload() else {
        anyhow::bail!("unexpected result: {:?}", result);
    };
    assert!(report.suspects.is_empty());
    assert_eq!(report.assessment, QuickCheckAssessment::Clean);
    assert_eq!(dispatcher.generator().call_count(), before);
    Ok(())
}

#[tokio::test]
async fn summary_is_stored_against_its_version() -> anyhow::Result<()> {
    let dispatcher = generated().await?;
    dispatcher
        .generator()
        .push_texts(&["**Summary:** A clerk finds the harbor's books do not balance."]);

    let result = run(&dispatcher, Step::Summary).await;
    assert!(result.success, "{:?}", result.error);

    let record = dispatcher
        .repository()
        .get(CHRONICLE_ID)
        .await?
        .ok_or_else(|| anyhow::anyhow!("record missing"))?;
    let summary = record
        .summary
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("summary missing"))?;
    assert_eq!(summary.text, "A clerk finds the harbor's books do not balance.");
    assert_eq!(Some(summary.source_version_id.as_str()), record.active_version_id.as_deref());
    assert_eq!(record.costs.by_call_type[&CallType::Summary].calls, 1);
    Ok(())
}

#[tokio::test]
async fn abort_records_cost_but_writes_nothing() -> anyhow::Result<()> {
    let dispatcher = generated().await?;
    let before = dispatcher
        .repository()
        .get(CHRONICLE_ID)
        .await?
        .ok_or_else(|| anyhow::anyhow!("record missing"))?;
    let ledger_before = dispatcher.cost_sink().records().await.len();

    let signal = AbortSignal::new();
    dispatcher.generator().abort_during_call(1, signal.clone());
    dispatcher.generator().push_texts(&["A telling nobody will keep."]);
    let result = dispatcher
        .dispatch(
            &ChronicleTask::for_chronicle(Step::RegenerateTemperature, CHRONICLE_ID),
            &signal,
        )
        .await;

    assert!(!result.success);
    assert_eq!(result.debug.as_deref(), Some("A telling nobody will keep."));
    assert_eq!(dispatcher.cost_sink().records().await.len(), ledger_before + 1);

    let after = dispatcher
        .repository()
        .get(CHRONICLE_ID)
        .await?
        .ok_or_else(|| anyhow::anyhow!("record missing"))?;
    assert_eq!(after.versions.len(), before.versions.len());
    assert_eq!(after.costs, before.costs);
    Ok(())
}

async fn stored(dispatcher: &TestDispatcher) -> anyhow::Result<chronicle_core::ChronicleRecord> {
    dispatcher
        .repository()
        .get(CHRONICLE_ID)
        .await?
        .ok_or_else(|| anyhow::anyhow!("record missing"))
}

#[tokio::test]
async fn regenerate_full_upstream_error_writes_nothing() -> anyhow::Result<()> {
    let dispatcher = generated().await?;
    let before = stored(&dispatcher).await?;
    dispatcher
        .generator()
        .push(MockResponse::Error("Overloaded".into()));

    let result = run(&dispatcher, Step::RegenerateFull).await;
    assert!(!result.success);
    assert!(result.error.unwrap_or_default().contains("Overloaded"));

    let after = stored(&dispatcher).await?;
    assert_eq!(after.versions.len(), before.versions.len());
    assert_eq!(after.active_version_id, before.active_version_id);
    assert_eq!(after.costs, before.costs);
    Ok(())
}

#[tokio::test]
async fn combine_empty_response_is_reported_and_non_fatal() -> anyhow::Result<()> {
    let dispatcher = generated().await?;
    dispatcher
        .generator()
        .push_texts(&[PERSPECTIVE, "A second telling."]);
    assert!(run(&dispatcher, Step::RegenerateFull).await.success);
    let before = stored(&dispatcher).await?;
    let ledger_before = dispatcher.cost_sink().records().await.len();

    dispatcher.generator().push_texts(&["   \n  "]);
    let result = run(&dispatcher, Step::Combine).await;
    assert!(!result.success);
    assert!(result.error.unwrap_or_default().contains("Empty response"));

    let after = stored(&dispatcher).await?;
    assert_eq!(after.versions.len(), before.versions.len());
    assert_eq!(after.active_version_id, before.active_version_id);
    assert_eq!(after.costs, before.costs);
    // The blank call was still billed
    assert_eq!(dispatcher.cost_sink().records().await.len(), ledger_before + 1);

    dispatcher.generator().push_texts(&["Merged telling."]);
    let retry = run(&dispatcher, Step::Combine).await;
    assert!(retry.success, "combine retry failed: {:?}", retry.error);
    let merged = stored(&dispatcher).await?;
    assert_eq!(merged.versions.len(), before.versions.len() + 1);
    assert_eq!(merged.current_content(), Some("Merged telling."));
    Ok(())
}

#[tokio::test]
async fn failed_step_still_accumulates_completed_calls() -> anyhow::Result<()> {
    let dispatcher = generated().await?;
    let before = stored(&dispatcher).await?;
    dispatcher
        .generator()
        .push(MockResponse::Success(PERSPECTIVE.into()));
    dispatcher
        .generator()
        .push(MockResponse::Error("Overloaded".into()));

    let result = run(&dispatcher, Step::RegenerateFull).await;
    assert!(!result.success);

    let after = stored(&dispatcher).await?;
    assert_eq!(after.versions.len(), before.versions.len());
    assert_eq!(after.active_version_id, before.active_version_id);
    assert_eq!(after.costs.totals.calls, before.costs.totals.calls + 1);
    assert_eq!(after.costs.by_call_type[&CallType::Perspective].calls, 2);
    assert!(after.costs.totals.actual_cost > before.costs.totals.actual_cost);
    Ok(())
}

#[tokio::test]
async fn unknown_step_is_rejected_without_a_call() -> anyhow::Result<()> {
    let dispatcher = dispatcher(MockGenerator::new_texts(&[]));

    let result = dispatcher
        .dispatch_json(
            serde_json::json!({"step": "frobnicate", "chronicleId": CHRONICLE_ID}),
            &AbortSignal::new(),
        )
        .await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Unknown step: frobnicate"));
    assert_eq!(dispatcher.generator().call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn missing_chronicle_is_reported() -> anyhow::Result<()> {
    let dispatcher = dispatcher(MockGenerator::new_texts(&[]));

    let result = run(&dispatcher, Step::Summary).await;

    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("Chronicle not found: chr-harbor")
    );
    assert_eq!(dispatcher.generator().call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn failed_initial_generation_marks_the_shell() -> anyhow::Result<()> {
    let dispatcher = dispatcher(MockGenerator::new_sequence(vec![
        MockResponse::Success(PERSPECTIVE.into()),
        MockResponse::Error("Overloaded".into()),
    ]));
    let shell = ChronicleLifecycle::new(dispatcher.repository())
        .submit_generation(test_utils::harbor_context(), None, Some(CHRONICLE_ID.into()))
        .await?;
    assert_eq!(shell.status(), ChronicleStatus::Generating);

    let result = run(&dispatcher, Step::GenerateV2).await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Overloaded"));
    let record = dispatcher
        .repository()
        .get(CHRONICLE_ID)
        .await?
        .ok_or_else(|| anyhow::anyhow!("record missing"))?;
    assert_eq!(record.status(), ChronicleStatus::Failed);
    assert!(record.versions.is_empty());
    assert_eq!(
        record.failure.map(|f| f.step),
        Some("generate_v2".to_string())
    );
    // Perspective call was still billed to the ledger.
    assert_eq!(dispatcher.cost_sink().records().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn malformed_perspective_carries_raw_response() -> anyhow::Result<()> {
    let dispatcher = dispatcher(MockGenerator::new_texts(&["I would rather not."]));
    let task = ChronicleTask::builder()
        .step(Step::GenerateV2)
        .chronicle_id(CHRONICLE_ID)
        .context(test_utils::harbor_context())
        .build()?;

    let result = dispatcher.dispatch(&task, &AbortSignal::new()).await;

    assert!(!result.success);
    assert_eq!(result.debug.as_deref(), Some("I would rather not."));
    assert!(dispatcher.repository().get(CHRONICLE_ID).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn creative_regeneration_requires_story_format() -> anyhow::Result<()> {
    let dispatcher = dispatcher(MockGenerator::new_texts(&[PERSPECTIVE, "Ledger entries."]));
    let mut context = test_utils::harbor_context();
    context.style.format = StyleFormat::Document;
    context.style.document_type = Some("merchant's ledger".into());
    let task = ChronicleTask::builder()
        .step(Step::GenerateV2)
        .chronicle_id(CHRONICLE_ID)
        .context(context)
        .build()?;
    assert!(dispatcher.dispatch(&task, &AbortSignal::new()).await.success);
    let before = dispatcher.generator().call_count();

    let result = run(&dispatcher, Step::RegenerateCreative).await;

    assert!(!result.success);
    assert!(result.error.unwrap_or_default().contains("story-format"));
    assert_eq!(dispatcher.generator().call_count(), before);
    Ok(())
}

#[tokio::test]
async fn requests_use_configured_call_settings() -> anyhow::Result<()> {
    let dispatcher = generated().await?;
    let requests = dispatcher.generator().requests();

    let perspective = dispatcher.profile().get(CallType::Perspective);
    let generation = dispatcher.profile().get(CallType::Generation);
    assert_eq!(requests[0].sampling(), &perspective.sampling());
    assert_eq!(requests[1].sampling(), &generation.sampling());
    assert!(requests[1].system_prompt().contains("Harbor Tale"));
    assert!(requests[1].user_prompt().contains("A harbor reckoning"));
    Ok(())
}

#[tokio::test]
async fn temporal_check_needs_a_temporal_context() -> anyhow::Result<()> {
    let dispatcher = generated().await?;
    let before = dispatcher.generator().call_count();

    let result = run(&dispatcher, Step::TemporalCheck).await;
    assert!(!result.success);
    assert!(result.error.unwrap_or_default().contains("temporal context"));
    assert_eq!(dispatcher.generator().call_count(), before);
    Ok(())
}

#[tokio::test]
async fn temporal_check_stores_report_for_the_active_version() -> anyhow::Result<()> {
    let dispatcher = generated().await?;
    let temporal = chronicle_core::TemporalContext {
        focal_era: "The Salt Years".into(),
        touched_eras: vec!["The Salt Years".into()],
        start_tick: 30,
        end_tick: 60,
        ..Default::default()
    };
    ChronicleLifecycle::new(dispatcher.repository())
        .update_temporal_context(CHRONICLE_ID, temporal)
        .await?;
    dispatcher.generator().push_texts(&[
        r#"{"alignment": "Strong", "issues": ["Barrels are counted before the flood"], "summary": "Fits the period."}"#,
    ]);

    let result = run(&dispatcher, Step::TemporalCheck).await;
    assert!(result.success, "temporal check failed: {:?}", result.error);

    let record = dispatcher
        .repository()
        .get(CHRONICLE_ID)
        .await?
        .ok_or_else(|| anyhow::anyhow!("record missing"))?;
    let report = record
        .temporal_check
        .clone()
        .ok_or_else(|| anyhow::anyhow!("report missing"))?;
    assert_eq!(report.alignment, chronicle_core::TemporalAlignment::Strong);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(Some(report.version_id.as_str()), record.active_version_id.as_deref());
    assert_eq!(record.status(), ChronicleStatus::Validating);
    Ok(())
}

#[tokio::test]
async fn unknown_temporal_alignment_is_a_parse_failure() -> anyhow::Result<()> {
    let dispatcher = generated().await?;
    ChronicleLifecycle::new(dispatcher.repository())
        .update_temporal_context(CHRONICLE_ID, chronicle_core::TemporalContext::default())
        .await?;
    let raw = r#"{"alignment": "timeless"}"#;
    dispatcher.generator().push_texts(&[raw]);

    let result = run(&dispatcher, Step::TemporalCheck).await;
    assert!(!result.success);
    assert_eq!(result.debug.as_deref(), Some(raw));
    Ok(())
}
