use super::common::{gallery, photo, valid_draft, video};
use crate::editor::domain::{Draft, ResolvedPlace};
use crate::editor::media::MediaSet;
use crate::editor::validation::{check_draft, FieldKey, ValidationConfig, ValidationState};

#[test]
fn complete_draft_passes_every_rule() {
    let errors = check_draft(&valid_draft(), &gallery(), &ValidationConfig::default());
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
}

#[test]
fn empty_draft_fails_every_rule_with_media_first() {
    let errors = check_draft(&Draft::new(), &MediaSet::new(), &ValidationConfig::default());
    assert_eq!(errors.len(), FieldKey::ordered().len());
    assert_eq!(errors.first_in_order(), Some(FieldKey::Media));
}

#[test]
fn too_few_media_items_is_the_only_error() {
    let media = MediaSet::from_items(vec![video("vid-1"), photo("pic-1"), photo("pic-2")]);
    let errors = check_draft(&valid_draft(), &media, &ValidationConfig::default());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first_in_order(), Some(FieldKey::Media));
}

#[test]
fn gallery_without_video_fails_media_rule() {
    let media = MediaSet::from_items(vec![
        photo("pic-1"),
        photo("pic-2"),
        photo("pic-3"),
        photo("pic-4"),
    ]);
    let errors = check_draft(&valid_draft(), &media, &ValidationConfig::default());
    assert!(errors.error(FieldKey::Media).is_some());
}

#[test]
fn free_text_address_needs_district_and_city() {
    let mut draft = valid_draft();
    draft.address_input = "Bonapriso".to_string();
    let errors = check_draft(&draft, &gallery(), &ValidationConfig::default());
    assert!(errors.error(FieldKey::Address).is_some());

    draft.address_input = "Bonapriso, Douala".to_string();
    let errors = check_draft(&draft, &gallery(), &ValidationConfig::default());
    assert!(errors.error(FieldKey::Address).is_none());

    // Empty comma parts do not count.
    draft.address_input = "Bonapriso, ".to_string();
    let errors = check_draft(&draft, &gallery(), &ValidationConfig::default());
    assert!(errors.error(FieldKey::Address).is_some());
}

#[test]
fn resolved_place_bypasses_the_address_heuristic() {
    let mut draft = valid_draft();
    draft.address_input = "Rue Njo-Njo".to_string();
    draft.resolved_place = Some(ResolvedPlace {
        place_id: "pl-bonapriso".to_string(),
        latitude: 4.0244,
        longitude: 9.6921,
        formatted_address: "Rue Njo-Njo, Bonapriso, Douala".to_string(),
        city: Some("Douala".to_string()),
        district: Some("Bonapriso".to_string()),
    });
    let errors = check_draft(&draft, &gallery(), &ValidationConfig::default());
    assert!(errors.error(FieldKey::Address).is_none());
}

#[test]
fn price_parsing_strips_group_separators() {
    let mut draft = valid_draft();
    draft.price_input = "1,250,000".to_string();
    assert_eq!(draft.parsed_price(), Some(1_250_000.0));

    draft.price_input = "0".to_string();
    let errors = check_draft(&draft, &gallery(), &ValidationConfig::default());
    assert!(errors.error(FieldKey::Price).is_some());

    draft.price_input = "gratuit".to_string();
    let errors = check_draft(&draft, &gallery(), &ValidationConfig::default());
    assert!(errors.error(FieldKey::Price).is_some());
}

#[test]
fn description_length_counts_characters_not_bytes() {
    let mut draft = valid_draft();
    // 100 two-byte characters satisfy the 100-character minimum.
    draft.description = "é".repeat(100);
    let errors = check_draft(&draft, &gallery(), &ValidationConfig::default());
    assert!(errors.error(FieldKey::Description).is_none());

    draft.description = "é".repeat(99);
    let errors = check_draft(&draft, &gallery(), &ValidationConfig::default());
    assert!(errors.error(FieldKey::Description).is_some());
}

#[test]
fn errors_appear_only_on_explicit_validate() {
    let mut state = ValidationState::new(ValidationConfig::default());
    let draft = Draft::new();
    let media = MediaSet::new();

    // Edits before any validate never surface errors.
    state.refresh(&draft, &media);
    assert!(state.shown().is_empty());

    let (errors, first) = state.validate(&draft, &media);
    assert!(!errors.is_empty());
    assert_eq!(first, Some(FieldKey::Media));
}

#[test]
fn refresh_clears_fixed_fields_and_keeps_failing_ones() {
    let mut state = ValidationState::new(ValidationConfig::default());
    let mut draft = Draft::new();
    let media = MediaSet::new();
    state.validate(&draft, &media);
    let shown_before = state.shown().len();

    draft.title = "Appartement à Akwa".to_string();
    draft.room_counts.insert(crate::editor::domain::RoomKind::Chambre, 2);
    state.refresh(&draft, &media);

    assert!(state.shown().error(FieldKey::Title).is_none());
    assert!(state.shown().error(FieldKey::Rooms).is_none());
    assert_eq!(state.shown().len(), shown_before - 2);
    assert!(state.shown().error(FieldKey::Description).is_some());
}

#[test]
fn refresh_never_introduces_new_errors() {
    let mut state = ValidationState::new(ValidationConfig::default());
    let mut draft = valid_draft();
    let media = gallery();
    state.validate(&draft, &media);
    assert!(state.shown().is_empty());

    // Breaking a field after a clean validate stays silent until the next
    // explicit validate.
    draft.title.clear();
    state.refresh(&draft, &media);
    assert!(state.shown().is_empty());

    let (errors, first) = state.validate(&draft, &media);
    assert_eq!(errors.len(), 1);
    assert_eq!(first, Some(FieldKey::Title));
}
