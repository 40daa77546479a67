use super::common::{gallery, photo, video};
use crate::editor::domain::{MediaId, MediaKind, RoomKind};
use crate::editor::media::{MediaError, MediaSet};

#[test]
fn first_item_must_be_a_video() {
    let mut set = MediaSet::new();
    assert_eq!(set.append(photo("pic-1")), Err(MediaError::LeadVideoRequired));
    assert!(set.is_empty());

    set.append(video("vid-1")).expect("video opens the gallery");
    set.append(photo("pic-1")).expect("photos follow the lead video");
    assert_eq!(set.len(), 2);
}

#[test]
fn lead_video_stays_at_the_front() {
    let mut set = MediaSet::new();
    set.append(video("vid-1")).expect("append video");
    set.append(photo("pic-1")).expect("append photo");
    set.append(photo("pic-2")).expect("append photo");
    set.append(video("vid-2")).expect("append second video");

    assert!(set.items()[0].is_video());
    assert_eq!(set.items()[0].id, MediaId("vid-1".to_string()));
}

#[test]
fn video_added_to_legacy_photo_set_is_promoted() {
    // Photo-only sets exist on listings that predate the lead-video rule.
    let mut set = MediaSet::from_items(vec![photo("pic-1"), photo("pic-2")]);
    assert!(!set.has_video());

    set.append(video("vid-1")).expect("append video");
    assert_eq!(set.items()[0].id, MediaId("vid-1".to_string()));
    // Photo order survives the promotion.
    assert_eq!(set.items()[1].id, MediaId("pic-1".to_string()));
    assert_eq!(set.items()[2].id, MediaId("pic-2".to_string()));
}

#[test]
fn removing_the_only_video_is_rejected_while_photos_remain() {
    let mut set = gallery();
    assert_eq!(
        set.remove(&MediaId("vid-1".to_string())),
        Err(MediaError::LeadVideoRemoval)
    );
    assert_eq!(set.len(), 4, "rejected removal leaves the set untouched");
}

#[test]
fn removing_the_last_remaining_item_empties_the_set() {
    let mut set = MediaSet::new();
    set.append(video("vid-1")).expect("append video");
    set.remove(&MediaId("vid-1".to_string()))
        .expect("sole item can be removed");
    assert!(set.is_empty());
}

#[test]
fn second_video_can_be_removed() {
    let mut set = gallery();
    set.append(video("vid-2")).expect("append second video");
    set.remove(&MediaId("vid-2".to_string()))
        .expect("redundant video can go");
    assert!(set.has_video());
}

#[test]
fn remove_unknown_id_reports_not_found() {
    let mut set = gallery();
    assert_eq!(
        set.remove(&MediaId("ghost".to_string())),
        Err(MediaError::NotFound)
    );
}

#[test]
fn room_tag_toggles_off_when_reassigned() {
    let mut set = gallery();
    let id = MediaId("pic-1".to_string());

    set.toggle_room(&id, RoomKind::Cuisine).expect("assign room");
    assert_eq!(set.get(&id).expect("item").assigned_room, Some(RoomKind::Cuisine));

    set.toggle_room(&id, RoomKind::Salon).expect("reassign room");
    assert_eq!(set.get(&id).expect("item").assigned_room, Some(RoomKind::Salon));

    set.toggle_room(&id, RoomKind::Salon).expect("clear room");
    assert_eq!(set.get(&id).expect("item").assigned_room, None);
}

#[test]
fn mute_applies_only_to_videos() {
    let mut set = gallery();
    set.set_muted(&MediaId("vid-1".to_string()), true)
        .expect("videos can be muted");
    assert!(set.get(&MediaId("vid-1".to_string())).expect("item").muted);

    assert_eq!(
        set.set_muted(&MediaId("pic-1".to_string()), true),
        Err(MediaError::NotAVideo)
    );
    assert_eq!(
        set.get(&MediaId("pic-1".to_string()))
            .expect("item")
            .kind,
        MediaKind::Photo
    );
}
