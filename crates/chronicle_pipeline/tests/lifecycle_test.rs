//! Lifecycle operations over the in-memory store.

mod test_utils;

use chrono::Utc;
use chronicle_core::{
    ChronicleContext, ChronicleStatus, ChronicleVersion, ImagePlacement, ImageRef, ImageRefsRecord,
    ImageSize, ImageStatus, SamplingMode, TemporalContext, VersionStep,
};
use chronicle_interface::ChronicleRepository;
use chronicle_pipeline::{ChronicleLifecycle, InMemoryChronicleRepository};
use test_utils::harbor_context;

const ID: &str = "chr-life";

/// A stored record with three versions; returns their ids oldest first.
async fn three_versions(store: &InMemoryChronicleRepository) -> anyhow::Result<Vec<String>> {
    let mut record = ChronicleLifecycle::new(store)
        .submit_generation(harbor_context(), None, Some(ID.into()))
        .await?;
    for (content, step) in [
        ("First telling.", VersionStep::Generate),
        ("Second telling.", VersionStep::Regenerate),
        ("Third telling.", VersionStep::Combine),
    ] {
        record.push_version(ChronicleVersion::new(content, step, SamplingMode::Normal));
    }
    store.put(&record).await?;
    Ok(record.versions.iter().map(|v| v.id.clone()).collect())
}

#[tokio::test]
async fn submit_requires_a_cast() -> anyhow::Result<()> {
    let store = InMemoryChronicleRepository::new();
    let result = ChronicleLifecycle::new(&store)
        .submit_generation(ChronicleContext::default(), None, None)
        .await;
    assert!(result.is_err());
    assert!(store.is_empty().await);
    Ok(())
}

#[tokio::test]
async fn deleting_the_active_version_moves_to_the_newest() -> anyhow::Result<()> {
    let store = InMemoryChronicleRepository::new();
    let ids = three_versions(&store).await?;
    let lifecycle = ChronicleLifecycle::new(&store);

    lifecycle.set_active_version(ID, &ids[1]).await?;
    let record = lifecycle.delete_version(ID, &ids[1]).await?;
    assert_eq!(record.versions.len(), 2);
    assert_eq!(record.active_version_id.as_deref(), Some(ids[2].as_str()));
    assert_eq!(record.current_content(), Some("Third telling."));

    let record = lifecycle.delete_version(ID, &ids[0]).await?;
    assert_eq!(record.active_version_id.as_deref(), Some(ids[2].as_str()));
    assert!(lifecycle.delete_version(ID, &ids[2]).await.is_err());
    assert!(lifecycle.delete_version(ID, "v-missing").await.is_err());
    Ok(())
}

#[tokio::test]
async fn accepted_chronicles_refuse_edits_until_unpublished() -> anyhow::Result<()> {
    let store = InMemoryChronicleRepository::new();
    let ids = three_versions(&store).await?;
    let lifecycle = ChronicleLifecycle::new(&store);

    let accepted = lifecycle.accept(ID).await?;
    assert_eq!(accepted.status(), ChronicleStatus::Complete);
    assert_eq!(accepted.final_content.as_deref(), Some("Third telling."));
    assert!(lifecycle.accept(ID).await.is_err());
    assert!(lifecycle.set_active_version(ID, &ids[0]).await.is_err());
    assert!(
        lifecycle
            .update_temporal_context(ID, TemporalContext::default())
            .await
            .is_err()
    );

    let draft = lifecycle.unpublish(ID).await?;
    assert!(!draft.is_accepted());
    assert!(lifecycle.unpublish(ID).await.is_err());
    lifecycle.set_active_version(ID, &ids[0]).await?;
    Ok(())
}

#[tokio::test]
async fn image_status_updates_are_allowed_after_acceptance() -> anyhow::Result<()> {
    let store = InMemoryChronicleRepository::new();
    let ids = three_versions(&store).await?;
    store
        .update_image_refs(
            ID,
            ImageRefsRecord {
                refs: vec![ImageRef {
                    id: "img-1".into(),
                    placement: ImagePlacement::EntityRef {
                        entity_id: "ent-aldric".into(),
                        entity_name: "Aldric Venn".into(),
                    },
                    anchor_text: "First telling".into(),
                    anchor_offset: Some(0),
                    chunk_index: 0,
                    size: ImageSize::Small,
                    caption: None,
                    status: ImageStatus::Pending,
                    image_id: None,
                    error: None,
                }],
                source_version_id: ids[2].clone(),
                generated_at: Utc::now(),
            },
        )
        .await?;

    let lifecycle = ChronicleLifecycle::new(&store);
    lifecycle.accept(ID).await?;
    lifecycle
        .update_image_ref_status(ID, "img-1", ImageStatus::Complete, Some("asset-9".into()), None)
        .await?;
    assert!(
        lifecycle
            .update_image_ref_status(ID, "img-404", ImageStatus::Error, None, Some("gone".into()))
            .await
            .is_err()
    );

    let record = store
        .get(ID)
        .await?
        .ok_or_else(|| anyhow::anyhow!("record missing"))?;
    let image = &record
        .image_refs
        .ok_or_else(|| anyhow::anyhow!("image refs missing"))?
        .refs[0];
    assert_eq!(image.status, ImageStatus::Complete);
    assert_eq!(image.image_id.as_deref(), Some("asset-9"));
    Ok(())
}

#[tokio::test]
async fn restart_keeps_id_and_inputs_but_drops_content() -> anyhow::Result<()> {
    let store = InMemoryChronicleRepository::new();
    three_versions(&store).await?;
    let temporal = TemporalContext {
        focal_era: "The Salt Years".into(),
        start_tick: 30,
        end_tick: 60,
        ..Default::default()
    };
    let lifecycle = ChronicleLifecycle::new(&store);
    lifecycle.update_temporal_context(ID, temporal.clone()).await?;

    let shell = lifecycle.restart(ID).await?;
    assert_eq!(shell.id, ID);
    assert!(shell.versions.is_empty());
    assert_eq!(shell.status(), ChronicleStatus::Generating);
    assert_eq!(shell.temporal_context, Some(temporal));
    assert_eq!(shell.context, harbor_context());
    assert_eq!(store.len().await, 1);
    Ok(())
}
