//! Tests for the persisted shape of chronicle records.

use chronicle_core::{
    CallType, ChronicleContext, ChronicleRecord, ChronicleVersion, CostRecord, ImagePlacement,
    SamplingMode, VersionStep,
};

fn cost(call_type: CallType, actual: f64) -> CostRecord {
    CostRecord {
        id: uuid::Uuid::new_v4().to_string(),
        chronicle_id: "chr-1".to_string(),
        call_type,
        model: "test-model".to_string(),
        estimated_cost: 0.001,
        actual_cost: actual,
        input_tokens: 10,
        output_tokens: 20,
        created_at: chrono::Utc::now(),
    }
}

#[test]
fn record_survives_json_storage() -> anyhow::Result<()> {
    let mut record = ChronicleRecord::new("chr-1", ChronicleContext::default(), None);
    record.push_version(ChronicleVersion::new(
        "First light over the harbor.",
        VersionStep::Generate,
        SamplingMode::Normal,
    ));
    record.costs.add(&cost(CallType::Generation, 0.5));
    record.costs.add(&cost(CallType::Summary, 0.25));

    let json = serde_json::to_string(&record)?;
    assert!(json.contains("\"generation\""));
    assert!(json.contains("\"step\":\"generate\""));

    let restored: ChronicleRecord = serde_json::from_str(&json)?;
    assert_eq!(restored, record);
    assert_eq!(restored.costs.totals.calls, 2);
    assert!((restored.costs.totals.actual_cost - 0.75).abs() < 1e-9);
    Ok(())
}

#[test]
fn placement_is_tagged_by_type() -> anyhow::Result<()> {
    let placement = ImagePlacement::PromptRequest {
        scene_description: "A storm over the salt flats".to_string(),
        entity_ids: vec!["ent-1".to_string()],
    };
    let value = serde_json::to_value(&placement)?;
    assert_eq!(value["type"], "prompt_request");
    Ok(())
}

#[test]
fn version_step_names_parse() {
    assert_eq!("copy_edit".parse::<VersionStep>().ok(), Some(VersionStep::CopyEdit));
    assert_eq!(VersionStep::Creative.to_string(), "creative");
}
