// ABOUTME: Integration tests for the suggestion moderation workflow
// ABOUTME: Promotion idempotence, status guards, attachment moves, rollback, and ownership scoping

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use pretty_assertions::assert_eq;
use quadbase_attachments::{AttachmentInput, AttachmentOwner, AttachmentStorage, MemoryBlobStore};
use quadbase_catalog::families::{
    AngleType, Antenna, AntennaDetail, BladeCount, Frame, FrameConfiguration, FrameDetail,
    FrameMaterial, Propeller,
};
use quadbase_catalog::{
    CatalogStorage, ComponentHeader, ComponentKind, ComponentSpec, LookupData, LookupKind,
};
use quadbase_core::constants::LAST_DETAIL_MESSAGE;
use quadbase_core::Actor;
use quadbase_storage::test_utils::TestDatabase;
use quadbase_suggestions::{
    DetailSuggestionInput, DetailSuggestionStorage, LookupSuggestionInput,
    LookupSuggestionStorage, ModerationEngine, ModerationError, ModerationStatus, NestedDetail,
    SuggestionInput, SuggestionQuery, SuggestionStorage, APPROVED_READ_ONLY_MESSAGE,
};
use std::sync::Arc;

struct Fixture {
    _db: TestDatabase,
    catalog: CatalogStorage,
    attachments: Arc<AttachmentStorage>,
    blobs: Arc<MemoryBlobStore>,
    suggestions: SuggestionStorage,
    engine: Arc<ModerationEngine>,
    submitter: Actor,
    moderator: Actor,
    dipole: String,
    sma: String,
    ufl: String,
}

async fn fixture() -> Fixture {
    let db = TestDatabase::new().await;
    let catalog = CatalogStorage::new(db.pool.clone());
    let blobs = Arc::new(MemoryBlobStore::new());
    let attachments = Arc::new(AttachmentStorage::new(db.pool.clone(), blobs.clone()));
    let suggestions = SuggestionStorage::new(db.pool.clone(), attachments.clone());
    let engine = Arc::new(ModerationEngine::with_flag_policy(db.pool.clone()));

    let dipole = catalog
        .create_lookup(&LookupData::AntennaType {
            name: "Dipole".to_string(),
            direction: Default::default(),
            polarization: Default::default(),
        })
        .await
        .unwrap()
        .id;
    let sma = catalog
        .create_lookup(&LookupData::AntennaConnector { name: "SMA".to_string() })
        .await
        .unwrap()
        .id;
    let ufl = catalog
        .create_lookup(&LookupData::AntennaConnector { name: "UFL".to_string() })
        .await
        .unwrap()
        .id;

    Fixture {
        _db: db,
        catalog,
        attachments,
        blobs,
        suggestions,
        engine,
        submitter: Actor::user("user-1"),
        moderator: Actor::moderator("mod-1"),
        dipole,
        sma,
        ufl,
    }
}

fn antenna(type_id: &str, model: &str) -> Antenna {
    Antenna {
        header: ComponentHeader::new("Foxeer", model),
        antenna_type: type_id.to_string(),
        center_frequency: 5800.0,
        bandwidth_min: 5600.0,
        bandwidth_max: 6000.0,
        swr: Some(1.3),
        gain: Some(2.5),
        radiation: None,
    }
}

fn connector(connector_id: &str, weight: f64) -> AntennaDetail {
    AntennaDetail {
        connector_type: connector_id.to_string(),
        weight,
        angle_type: AngleType::Straight,
    }
}

fn photo(name: &str, body: &[u8]) -> AttachmentInput {
    AttachmentInput::upload(name, BASE64.encode(body))
}

impl Fixture {
    fn new_antenna_input(&self, model: &str) -> SuggestionInput<Antenna> {
        SuggestionInput::new(antenna(&self.dipole, model))
            .with_details(vec![connector(&self.sma, 5.0), connector(&self.ufl, 4.0)])
            .with_images(vec![photo("front.png", b"\x89PNG front")])
    }

    async fn canonical_detail_count(&self, component_id: &str) -> usize {
        self.catalog
            .list_details::<Antenna>(component_id)
            .await
            .unwrap()
            .len()
    }
}

#[tokio::test]
async fn test_accept_new_entity_with_two_details() {
    let f = fixture().await;
    let suggestion = f
        .suggestions
        .create(&f.submitter, &f.new_antenna_input("Lollipop 4"))
        .await
        .unwrap();
    assert_eq!(suggestion.status(), ModerationStatus::Pending);
    assert_eq!(suggestion.details.len(), 2);
    assert_eq!(suggestion.images.len(), 1);
    assert!(!suggestion.images[0].accepted());

    let promotion = f
        .engine
        .accept::<Antenna>(&f.moderator, suggestion.id())
        .await
        .unwrap();
    assert!(promotion.created);
    assert_eq!(promotion.details_created, 2);
    assert_eq!(promotion.attachments_moved, 1);

    assert_eq!(f.catalog.count_components(ComponentKind::Antenna).await.unwrap(), 1);
    let entry = f
        .catalog
        .get_component::<Antenna>(&promotion.component_id)
        .await
        .unwrap();
    assert!(entry.item.is_public());
    assert_eq!(entry.item.data.model(), "Lollipop 4");
    assert_eq!(entry.details.len(), 2);

    let image = f.attachments.get(&suggestion.images[0].id).await.unwrap();
    assert!(image.accepted());
    assert_eq!(image.component_id(), Some(promotion.component_id.as_str()));

    let approved = f
        .suggestions
        .get::<Antenna>(&f.submitter, suggestion.id())
        .await
        .unwrap();
    assert_eq!(approved.status(), ModerationStatus::Approved);
    assert_eq!(
        approved.meta.related_instance_id.as_deref(),
        Some(promotion.component_id.as_str())
    );
    assert!(approved.meta.reviewed_at.is_some());
    assert!(approved.details.iter().all(|d| d.related_instance_id.is_some()));
    assert!(approved.images.is_empty());
}

#[tokio::test]
async fn test_accept_twice_is_idempotent() {
    let f = fixture().await;
    let suggestion = f
        .suggestions
        .create(&f.submitter, &f.new_antenna_input("Lollipop 4"))
        .await
        .unwrap();

    let first = f.engine.accept::<Antenna>(&f.moderator, suggestion.id()).await.unwrap();
    let second = f.engine.accept::<Antenna>(&f.moderator, suggestion.id()).await.unwrap();

    assert_eq!(first.component_id, second.component_id);
    assert!(!second.created);
    assert_eq!(second.details_created, 0);
    assert_eq!(second.details_updated, 2);
    assert_eq!(second.attachments_moved, 0);
    assert_eq!(f.catalog.count_components(ComponentKind::Antenna).await.unwrap(), 1);
    assert_eq!(f.canonical_detail_count(&first.component_id).await, 2);
}

#[tokio::test]
async fn test_accept_edit_of_existing_entity() {
    let f = fixture().await;
    let existing = f
        .catalog
        .create_component(None, &antenna(&f.dipole, "Pagoda"), &[connector(&f.sma, 6.0)])
        .await
        .unwrap();
    let existing_detail_id = existing.details[0].id.clone();

    let mut changed = antenna(&f.dipole, "Pagoda 2");
    changed.gain = Some(3.1);
    let input = SuggestionInput::new(changed)
        .editing(&existing.item.id)
        .with_details(vec![connector(&f.ufl, 4.5)]);
    let suggestion = f.suggestions.create(&f.submitter, &input).await.unwrap();

    let promotion = f.engine.accept::<Antenna>(&f.moderator, suggestion.id()).await.unwrap();
    assert!(!promotion.created);
    assert_eq!(promotion.component_id, existing.item.id);

    let entry = f.catalog.get_component::<Antenna>(&existing.item.id).await.unwrap();
    assert_eq!(entry.item.data.model(), "Pagoda 2");
    assert_eq!(entry.item.data.gain, Some(3.1));
    assert_eq!(entry.details.len(), 2);

    let untouched = entry
        .details
        .iter()
        .find(|d| d.id == existing_detail_id)
        .unwrap();
    assert_eq!(untouched.data, connector(&f.sma, 6.0));
    assert_eq!(f.catalog.count_components(ComponentKind::Antenna).await.unwrap(), 1);
}

#[tokio::test]
async fn test_deny_leaves_catalog_untouched() {
    let f = fixture().await;
    let input = SuggestionInput::new(antenna(&f.dipole, "Stubby"))
        .with_details(vec![connector(&f.sma, 3.0)])
        .with_images(vec![photo("side.png", b"\x89PNG side")]);
    let suggestion = f.suggestions.create(&f.submitter, &input).await.unwrap();

    let meta = f
        .engine
        .deny::<Antenna>(&f.moderator, suggestion.id(), Some("needs more photos"))
        .await
        .unwrap();
    assert_eq!(meta.status, ModerationStatus::Denied);
    assert_eq!(meta.admin_comment.as_deref(), Some("needs more photos"));

    assert_eq!(f.catalog.count_components(ComponentKind::Antenna).await.unwrap(), 0);
    let image = f.attachments.get(&suggestion.images[0].id).await.unwrap();
    assert_eq!(image.owner, AttachmentOwner::suggestion(suggestion.id()));
    assert!(!image.accepted());
}

#[tokio::test]
async fn test_deny_without_comment_keeps_previous_comment() {
    let f = fixture().await;
    let suggestion = f
        .suggestions
        .create(&f.submitter, &f.new_antenna_input("Stubby"))
        .await
        .unwrap();

    f.engine
        .deny::<Antenna>(&f.moderator, suggestion.id(), Some("blurry"))
        .await
        .unwrap();
    let meta = f
        .engine
        .deny::<Antenna>(&f.moderator, suggestion.id(), None)
        .await
        .unwrap();
    assert_eq!(meta.admin_comment.as_deref(), Some("blurry"));
}

#[tokio::test]
async fn test_deny_with_blank_comment_keeps_previous_comment() {
    let f = fixture().await;
    let suggestion = f
        .suggestions
        .create(&f.submitter, &f.new_antenna_input("Stubby"))
        .await
        .unwrap();

    f.engine
        .deny::<Antenna>(&f.moderator, suggestion.id(), Some("Duplicate"))
        .await
        .unwrap();
    for blank in ["", "   ", "\t\n"] {
        let meta = f
            .engine
            .deny::<Antenna>(&f.moderator, suggestion.id(), Some(blank))
            .await
            .unwrap();
        assert_eq!(meta.admin_comment.as_deref(), Some("Duplicate"));
    }

    let meta = f
        .engine
        .deny::<Antenna>(&f.moderator, suggestion.id(), Some("  Blurry photos "))
        .await
        .unwrap();
    assert_eq!(meta.admin_comment.as_deref(), Some("Blurry photos"));
}

#[tokio::test]
async fn test_approved_suggestion_is_read_only() {
    let f = fixture().await;
    let suggestion = f
        .suggestions
        .create(&f.submitter, &f.new_antenna_input("Lollipop 4"))
        .await
        .unwrap();
    f.engine.accept::<Antenna>(&f.moderator, suggestion.id()).await.unwrap();

    let err = f
        .suggestions
        .update(
            &f.submitter,
            suggestion.id(),
            &SuggestionInput::new(antenna(&f.dipole, "Renamed")),
        )
        .await
        .unwrap_err();
    match err {
        ModerationError::StateConflict(message) => assert_eq!(message, APPROVED_READ_ONLY_MESSAGE),
        other => panic!("expected state conflict, got {:?}", other),
    }

    let after = f.suggestions.get::<Antenna>(&f.submitter, suggestion.id()).await.unwrap();
    assert_eq!(after.data.model(), "Lollipop 4");
    assert_eq!(after.status(), ModerationStatus::Approved);

    let err = f
        .engine
        .deny::<Antenna>(&f.moderator, suggestion.id(), Some("late"))
        .await
        .unwrap_err();
    assert!(matches!(err, ModerationError::StateConflict(_)));
}

#[tokio::test]
async fn test_editing_denied_suggestion_reopens_it() {
    let f = fixture().await;
    let suggestion = f
        .suggestions
        .create(&f.submitter, &f.new_antenna_input("Lollipop 4"))
        .await
        .unwrap();
    f.engine
        .deny::<Antenna>(&f.moderator, suggestion.id(), Some("wrong gain"))
        .await
        .unwrap();

    let mut fixed = antenna(&f.dipole, "Lollipop 4");
    fixed.gain = Some(2.2);
    let updated = f
        .suggestions
        .update(&f.submitter, suggestion.id(), &SuggestionInput::new(fixed))
        .await
        .unwrap();

    assert_eq!(updated.status(), ModerationStatus::Pending);
    assert_eq!(updated.data.gain, Some(2.2));
    // Sets that were not sent stay as they were
    assert_eq!(updated.details.len(), 2);
    assert_eq!(updated.images.len(), 1);
}

#[tokio::test]
async fn test_update_replaces_nested_sets() {
    let f = fixture().await;
    let suggestion = f
        .suggestions
        .create(&f.submitter, &f.new_antenna_input("Lollipop 4"))
        .await
        .unwrap();
    let kept_detail = suggestion.details[0].clone();
    let old_image = suggestion.images[0].clone();

    let mut input = SuggestionInput::new(antenna(&f.dipole, "Lollipop 4"));
    input.details = Some(vec![
        NestedDetail::existing(&kept_detail.id, connector(&f.sma, 7.5)),
        NestedDetail::new(connector(&f.ufl, 2.0)),
    ]);
    input.images = Some(vec![photo("new.png", b"\x89PNG new")]);

    let updated = f
        .suggestions
        .update(&f.submitter, suggestion.id(), &input)
        .await
        .unwrap();

    assert_eq!(updated.details.len(), 2);
    let kept = updated.details.iter().find(|d| d.id == kept_detail.id).unwrap();
    assert_eq!(kept.data.weight, 7.5);
    assert!(!updated.details.iter().any(|d| d.id == suggestion.details[1].id));

    assert_eq!(updated.images.len(), 1);
    assert_ne!(updated.images[0].id, old_image.id);
    assert!(f.attachments.get(&old_image.id).await.is_err());
}

#[tokio::test]
async fn test_nested_ids_from_other_suggestions_are_rejected() {
    let f = fixture().await;
    let mine = f
        .suggestions
        .create(&f.submitter, &f.new_antenna_input("Mine"))
        .await
        .unwrap();
    let theirs = f
        .suggestions
        .create(&Actor::user("user-2"), &f.new_antenna_input("Theirs"))
        .await
        .unwrap();

    let mut input = SuggestionInput::new(antenna(&f.dipole, "Mine"));
    input.details = Some(vec![NestedDetail::existing(
        &theirs.details[0].id,
        connector(&f.sma, 1.0),
    )]);
    let err = f
        .suggestions
        .update(&f.submitter, mine.id(), &input)
        .await
        .unwrap_err();
    assert!(matches!(err, ModerationError::NotFound(_)));

    let input = SuggestionInput::new(antenna(&f.dipole, "Mine"))
        .with_images(vec![AttachmentInput::existing(&theirs.images[0].id)]);
    let err = f
        .suggestions
        .update(&f.submitter, mine.id(), &input)
        .await
        .unwrap_err();
    assert!(matches!(err, ModerationError::NotFound(_)));

    // Nothing changed on either side
    let theirs_after = f
        .suggestions
        .get::<Antenna>(&f.moderator, theirs.id())
        .await
        .unwrap();
    assert_eq!(theirs_after.details.len(), 2);
    assert_eq!(theirs_after.images.len(), 1);
}

#[tokio::test]
async fn test_last_suggested_detail_is_protected() {
    let f = fixture().await;
    let suggestion = f
        .suggestions
        .create(&f.submitter, &f.new_antenna_input("Lollipop 4"))
        .await
        .unwrap();

    f.suggestions
        .delete_detail::<Antenna>(&f.submitter, suggestion.id(), &suggestion.details[0].id)
        .await
        .unwrap();
    let after = f.suggestions.get::<Antenna>(&f.submitter, suggestion.id()).await.unwrap();
    assert_eq!(after.details.len(), 1);

    let err = f
        .suggestions
        .delete_detail::<Antenna>(&f.submitter, suggestion.id(), &after.details[0].id)
        .await
        .unwrap_err();
    match err {
        ModerationError::StateConflict(message) => assert_eq!(message, LAST_DETAIL_MESSAGE),
        other => panic!("expected state conflict, got {:?}", other),
    }
    let after = f.suggestions.get::<Antenna>(&f.submitter, suggestion.id()).await.unwrap();
    assert_eq!(after.details.len(), 1);
}

#[tokio::test]
async fn test_failed_detail_rolls_back_whole_promotion() {
    let f = fixture().await;
    let suggestion = f
        .suggestions
        .create(&f.submitter, &f.new_antenna_input("Lollipop 4"))
        .await
        .unwrap();

    // The second detail's connector disappears before review
    sqlx::query("DELETE FROM lookups WHERE id = ?")
        .bind(&f.ufl)
        .execute(f.catalog.pool())
        .await
        .unwrap();

    let err = f
        .engine
        .accept::<Antenna>(&f.moderator, suggestion.id())
        .await
        .unwrap_err();
    match err {
        ModerationError::Validation(errors) => {
            assert!(errors.has_field("details[1].connector_type"))
        }
        other => panic!("expected validation error, got {:?}", other),
    }

    assert_eq!(f.catalog.count_components(ComponentKind::Antenna).await.unwrap(), 0);
    let detail_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM component_details")
        .fetch_one(f.catalog.pool())
        .await
        .unwrap();
    assert_eq!(detail_rows, 0);

    let after = f.suggestions.get::<Antenna>(&f.submitter, suggestion.id()).await.unwrap();
    assert_eq!(after.status(), ModerationStatus::Pending);
    assert!(after.meta.related_instance_id.is_none());
    assert_eq!(after.images.len(), 1);
    assert!(after.details.iter().all(|d| d.related_instance_id.is_none()));
}

#[tokio::test]
async fn test_non_moderator_cannot_accept_or_deny() {
    let f = fixture().await;
    let suggestion = f
        .suggestions
        .create(&f.submitter, &f.new_antenna_input("Lollipop 4"))
        .await
        .unwrap();

    let err = f
        .engine
        .accept::<Antenna>(&f.submitter, suggestion.id())
        .await
        .unwrap_err();
    assert!(matches!(err, ModerationError::Unauthorized));
    let err = f
        .engine
        .deny::<Antenna>(&f.submitter, suggestion.id(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ModerationError::Unauthorized));

    assert_eq!(f.catalog.count_components(ComponentKind::Antenna).await.unwrap(), 0);
    let after = f.suggestions.get::<Antenna>(&f.submitter, suggestion.id()).await.unwrap();
    assert_eq!(after.status(), ModerationStatus::Pending);
}

#[tokio::test]
async fn test_suggestions_are_scoped_to_their_owner() {
    let f = fixture().await;
    let stranger = Actor::user("user-2");
    let suggestion = f
        .suggestions
        .create(&f.submitter, &f.new_antenna_input("Lollipop 4"))
        .await
        .unwrap();
    f.suggestions
        .create(&stranger, &f.new_antenna_input("Other"))
        .await
        .unwrap();

    let err = f
        .suggestions
        .get::<Antenna>(&stranger, suggestion.id())
        .await
        .unwrap_err();
    assert!(matches!(err, ModerationError::NotFound(_)));
    let err = f
        .suggestions
        .delete::<Antenna>(&stranger, suggestion.id())
        .await
        .unwrap_err();
    assert!(matches!(err, ModerationError::NotFound(_)));

    let (mine, total) = f
        .suggestions
        .list::<Antenna>(&f.submitter, &SuggestionQuery::default())
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(mine[0].id(), suggestion.id());

    let (all, total) = f
        .suggestions
        .list::<Antenna>(&f.moderator, &SuggestionQuery::default())
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(all.len(), 2);

    let (pending, _) = f
        .suggestions
        .list::<Antenna>(
            &f.moderator,
            &SuggestionQuery {
                status: Some(ModerationStatus::Denied),
                ..SuggestionQuery::default()
            },
        )
        .await
        .unwrap();
    assert!(pending.is_empty());

    // A suggestion of another family with the same id does not exist
    let err = f
        .suggestions
        .get::<Propeller>(&f.submitter, suggestion.id())
        .await
        .unwrap_err();
    assert!(matches!(err, ModerationError::NotFound(_)));
}

#[tokio::test]
async fn test_new_entity_suggestion_needs_details() {
    let f = fixture().await;
    let err = f
        .suggestions
        .create(
            &f.submitter,
            &SuggestionInput::new(antenna(&f.dipole, "Bare")),
        )
        .await
        .unwrap_err();
    match err {
        ModerationError::Validation(errors) => assert!(errors.has_field("details")),
        other => panic!("expected validation error, got {:?}", other),
    }

    let frame = Frame {
        header: ComponentHeader::new("ImpulseRC", "Apex"),
        prop_size: "5".to_string(),
        size: "224".to_string(),
        weight: Some(110.0),
        material: FrameMaterial::Fibre,
        configuration: FrameConfiguration::X,
    };
    let input = SuggestionInput::new(frame).with_details(vec![
        FrameDetail::Camera { height: 20.0, width: 20.0 },
        FrameDetail::Motor { height: 16.0, width: 16.0 },
    ]);
    let err = f.suggestions.create(&f.submitter, &input).await.unwrap_err();
    match err {
        ModerationError::Validation(errors) => {
            assert_eq!(
                errors.messages_for("details"),
                vec!["At least one vtx_mount detail is required."]
            )
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_submission_field_errors_are_prefixed() {
    let f = fixture().await;
    let mut bad = antenna(&f.dipole, "Broken");
    bad.center_frequency = 7000.0;
    let input = SuggestionInput::new(bad)
        .with_details(vec![connector(&f.sma, 1.0), connector("lkp-missing", -1.0)])
        .editing("cmp-missing");

    let err = f.suggestions.create(&f.submitter, &input).await.unwrap_err();
    let ModerationError::Validation(errors) = err else {
        panic!("expected validation error");
    };
    assert!(errors.has_field("__all__"));
    assert!(errors.has_field("related_instance_id"));
    assert!(errors.has_field("details[1].connector_type"));
    assert!(errors.has_field("details[1].weight"));
    assert!(!errors.has_field("details[0].connector_type"));
}

#[tokio::test]
async fn test_invalid_upload_fails_submission() {
    let f = fixture().await;
    let input = SuggestionInput::new(antenna(&f.dipole, "Lollipop 4"))
        .with_details(vec![connector(&f.sma, 5.0)])
        .with_images(vec![photo("ok.png", b"\x89PNG ok"), AttachmentInput::upload("bad.png", "%%%")]);

    let err = f.suggestions.create(&f.submitter, &input).await.unwrap_err();
    match err {
        ModerationError::Validation(errors) => assert!(errors.has_field("images[1].data")),
        other => panic!("expected validation error, got {:?}", other),
    }
    let (rows, _) = f
        .suggestions
        .list::<Antenna>(&f.moderator, &SuggestionQuery::default())
        .await
        .unwrap();
    assert!(rows.is_empty());
    assert!(f.blobs.is_empty().await);
}

#[tokio::test]
async fn test_deleting_suggestions_respects_promotion() {
    let f = fixture().await;
    let pending = f
        .suggestions
        .create(&f.submitter, &f.new_antenna_input("Pending"))
        .await
        .unwrap();
    let approved = f
        .suggestions
        .create(&f.submitter, &f.new_antenna_input("Approved"))
        .await
        .unwrap();
    let promotion = f.engine.accept::<Antenna>(&f.moderator, approved.id()).await.unwrap();

    f.suggestions.delete::<Antenna>(&f.submitter, pending.id()).await.unwrap();
    assert!(f.attachments.get(&pending.images[0].id).await.is_err());

    f.suggestions.delete::<Antenna>(&f.submitter, approved.id()).await.unwrap();
    let image = f.attachments.get(&approved.images[0].id).await.unwrap();
    assert!(image.accepted());
    assert_eq!(image.origin_suggestion_id, None);
    assert_eq!(f.canonical_detail_count(&promotion.component_id).await, 2);

    let (left, _) = f
        .suggestions
        .list::<Antenna>(&f.submitter, &SuggestionQuery::default())
        .await
        .unwrap();
    assert!(left.is_empty());
}

#[tokio::test]
async fn test_detailless_family_promotes_without_details() {
    let f = fixture().await;
    let prop = Propeller {
        header: ComponentHeader::new("HQProp", "5x4.3x3"),
        size: 5,
        pitch: 4.3,
        blade_count: BladeCount::Three,
        weight: Some(4.1),
    };
    let suggestion = f
        .suggestions
        .create(&f.submitter, &SuggestionInput::new(prop.clone()))
        .await
        .unwrap();
    let promotion = f
        .engine
        .accept::<Propeller>(&f.moderator, suggestion.id())
        .await
        .unwrap();

    let entry = f
        .catalog
        .get_component::<Propeller>(&promotion.component_id)
        .await
        .unwrap();
    assert_eq!(entry.item.data, prop);
    assert!(entry.details.is_empty());
}

#[tokio::test]
async fn test_concurrent_accepts_create_one_component() {
    let f = fixture().await;
    let suggestion = f
        .suggestions
        .create(&f.submitter, &f.new_antenna_input("Lollipop 4"))
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        f.engine.accept::<Antenna>(&f.moderator, suggestion.id()),
        f.engine.accept::<Antenna>(&f.moderator, suggestion.id()),
    );
    let a = a.unwrap();
    let b = b.unwrap();

    assert_eq!(a.component_id, b.component_id);
    assert!(a.created != b.created);
    assert_eq!(f.catalog.count_components(ComponentKind::Antenna).await.unwrap(), 1);
    assert_eq!(f.canonical_detail_count(&a.component_id).await, 2);
}

#[tokio::test]
async fn test_detail_suggestion_lifecycle() {
    let f = fixture().await;
    let storage = DetailSuggestionStorage::new(f.catalog.pool().clone());
    let existing = f
        .catalog
        .create_component(None, &antenna(&f.dipole, "Pagoda"), &[connector(&f.sma, 6.0)])
        .await
        .unwrap();

    let input = DetailSuggestionInput {
        component_id: existing.item.id.clone(),
        request_description: Some("RP-SMA variant exists".to_string()),
        data: connector(&f.ufl, 5.5),
    };
    let suggestion = storage.create::<Antenna>(&f.submitter, &input).await.unwrap();
    assert_eq!(suggestion.meta.status, ModerationStatus::Pending);
    assert_eq!(suggestion.detail_kind, "connector");

    let first = f
        .engine
        .accept_detail::<Antenna>(&f.moderator, &suggestion.meta.id)
        .await
        .unwrap();
    let second = f
        .engine
        .accept_detail::<Antenna>(&f.moderator, &suggestion.meta.id)
        .await
        .unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(f.canonical_detail_count(&existing.item.id).await, 2);

    let approved = storage.get::<Antenna>(&f.submitter, &suggestion.meta.id).await.unwrap();
    assert_eq!(approved.meta.status, ModerationStatus::Approved);
    assert_eq!(approved.meta.related_instance_id.as_deref(), Some(first.id.as_str()));

    let err = storage
        .update::<Antenna>(&f.submitter, &suggestion.meta.id, &input)
        .await
        .unwrap_err();
    assert!(matches!(err, ModerationError::StateConflict(_)));
}

#[tokio::test]
async fn test_detail_suggestion_requires_visible_component() {
    let f = fixture().await;
    let storage = DetailSuggestionStorage::new(f.catalog.pool().clone());
    let private = f
        .catalog
        .create_component(
            Some("user-2"),
            &antenna(&f.dipole, "Secret"),
            &[connector(&f.sma, 6.0)],
        )
        .await
        .unwrap();

    let input = DetailSuggestionInput {
        component_id: private.item.id.clone(),
        request_description: None,
        data: connector(&f.ufl, 5.5),
    };
    let err = storage.create::<Antenna>(&f.submitter, &input).await.unwrap_err();
    match err {
        ModerationError::Validation(errors) => assert!(errors.has_field("component_id")),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_lookup_suggestion_lifecycle() {
    let f = fixture().await;
    let storage = LookupSuggestionStorage::new(f.catalog.pool().clone());

    let input = LookupSuggestionInput {
        related_instance_id: None,
        request_description: None,
        data: LookupData::AntennaConnector { name: "MMCX".to_string() },
    };
    let suggestion = storage
        .create(&f.submitter, LookupKind::AntennaConnector, &input)
        .await
        .unwrap();
    assert_eq!(suggestion.label, "MMCX");

    let lookup = f
        .engine
        .accept_lookup(&f.moderator, LookupKind::AntennaConnector, &suggestion.meta.id)
        .await
        .unwrap();
    assert_eq!(lookup.label, "MMCX");

    let again = f
        .engine
        .accept_lookup(&f.moderator, LookupKind::AntennaConnector, &suggestion.meta.id)
        .await
        .unwrap();
    assert_eq!(again.id, lookup.id);
    assert_eq!(
        f.catalog
            .list_lookups(LookupKind::AntennaConnector)
            .await
            .unwrap()
            .len(),
        3
    );

    let rename = LookupSuggestionInput {
        related_instance_id: Some(f.sma.clone()),
        request_description: Some("It is RP-SMA".to_string()),
        data: LookupData::AntennaConnector { name: "RP-SMA".to_string() },
    };
    let suggestion = storage
        .create(&f.submitter, LookupKind::AntennaConnector, &rename)
        .await
        .unwrap();
    let renamed = f
        .engine
        .accept_lookup(&f.moderator, LookupKind::AntennaConnector, &suggestion.meta.id)
        .await
        .unwrap();
    assert_eq!(renamed.id, f.sma);
    assert_eq!(renamed.label, "RP-SMA");
}

#[tokio::test]
async fn test_lookup_suggestion_kind_must_match() {
    let f = fixture().await;
    let storage = LookupSuggestionStorage::new(f.catalog.pool().clone());
    let input = LookupSuggestionInput {
        related_instance_id: Some(f.dipole.clone()),
        request_description: None,
        data: LookupData::VideoFormat { name: "PAL".to_string() },
    };

    let err = storage
        .create(&f.submitter, LookupKind::AntennaConnector, &input)
        .await
        .unwrap_err();
    let ModerationError::Validation(errors) = err else {
        panic!("expected validation error");
    };
    assert!(errors.has_field("kind"));
    assert!(errors.has_field("related_instance_id"));
}
