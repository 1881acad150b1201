//! Integration tests for the mirror's update/diff/dispatch pipeline.

use gateway_mirror::{
    ChangeEvent, EntityId, EventKind, Mirror, MirrorConfig, Permissions, UserStatus,
};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

fn test_mirror() -> Mirror {
    Mirror::new(MirrorConfig {
        worker_threads: 2,
        ..Default::default()
    })
}

/// Collects every event dispatched for one kind.
fn collect(mirror: &Mirror, kind: EventKind) -> Arc<Mutex<Vec<ChangeEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    mirror.register(kind, move |event| {
        sink.lock().push(event.clone());
    });
    events
}

// --- Scenario tests ---

#[test]
fn test_rename_scenario() {
    let mirror = test_mirror();
    let renames = collect(&mirror, EventKind::Renamed);

    mirror.on_update(
        "PRESENCE_UPDATE",
        &json!({"user": {"id": 42, "username": "Alpha"}}),
    );
    mirror.flush();
    assert_eq!(mirror.user(EntityId(42)).unwrap().name(), "Alpha");
    assert!(renames.lock().is_empty());

    mirror.on_update(
        "PRESENCE_UPDATE",
        &json!({"user": {"id": 42, "username": "Beta"}}),
    );
    mirror.flush();

    assert_eq!(mirror.user(EntityId(42)).unwrap().name(), "Beta");
    let events = renames.lock();
    assert_eq!(events.len(), 1);
    match &events[0] {
        ChangeEvent::Renamed { old, new, .. } => {
            assert_eq!(old, "Alpha");
            assert_eq!(new, "Beta");
        }
        other => panic!("expected Renamed, got {:?}", other),
    }
    drop(events);
    mirror.shutdown();
}

#[test]
fn test_permission_override_add_scenario() {
    let mirror = test_mirror();

    mirror.on_update(
        "CHANNEL_CREATE",
        &json!({"id": 1, "server_id": 100, "name": "general", "position": 0}),
    );
    let channel = mirror.channel(EntityId(1)).unwrap();
    assert!(channel.role_overwrites().is_empty());
    assert!(channel.user_overwrites().is_empty());

    mirror.on_update(
        "CHANNEL_UPDATE",
        &json!({
            "id": 1,
            "permission_overwrites": [
                {"id": 7, "type": "role", "allow": 8, "deny": 0}
            ],
        }),
    );

    let overwrite = channel.role_overwrite(EntityId(7));
    assert!(overwrite.allows(8));
    assert_eq!(overwrite, Permissions::new(8, 0));
    assert!(channel.user_overwrites().is_empty());
    mirror.shutdown();
}

#[test]
fn test_unknown_overwrite_type_dropped_silently() {
    let mirror = test_mirror();
    mirror.on_update(
        "CHANNEL_CREATE",
        &json!({
            "id": 1,
            "server_id": 100,
            "name": "general",
            "position": 0,
            "permission_overwrites": [
                {"id": 7, "type": "webhook", "allow": 8, "deny": 0},
                {"id": 9, "type": "member", "allow": 1, "deny": 2}
            ],
        }),
    );

    let channel = mirror.channel(EntityId(1)).unwrap();
    assert!(channel.role_overwrites().is_empty());
    assert_eq!(channel.user_overwrite(EntityId(9)), Permissions::new(1, 2));
    mirror.shutdown();
}

#[test]
fn test_redundant_status_update_scenario() {
    let mirror = test_mirror();

    mirror.on_update(
        "PRESENCE_UPDATE",
        &json!({"user": {"id": 99, "username": "Gamma"}, "status": "online"}),
    );
    mirror.flush();
    assert_eq!(mirror.user(EntityId(99)).unwrap().status(), UserStatus::Online);

    let statuses = collect(&mirror, EventKind::StatusChanged);
    mirror.on_update(
        "PRESENCE_UPDATE",
        &json!({"user": {"id": 99}, "status": "online"}),
    );
    mirror.flush();

    assert!(statuses.lock().is_empty());
    mirror.shutdown();
}

// --- Property tests from the design contract ---

#[test]
fn test_idempotent_redelivery_fires_once() {
    let mirror = test_mirror();
    let renames = collect(&mirror, EventKind::Renamed);

    mirror.on_update(
        "PRESENCE_UPDATE",
        &json!({"user": {"id": 1, "username": "Alpha"}}),
    );
    let record = json!({"user": {"id": 1, "username": "Beta"}});
    mirror.on_update("PRESENCE_UPDATE", &record);
    mirror.on_update("PRESENCE_UPDATE", &record);
    mirror.flush();

    assert_eq!(renames.lock().len(), 1);
    mirror.shutdown();
}

#[test]
fn test_ordering_same_entity_same_field() {
    let mirror = test_mirror();
    let statuses = collect(&mirror, EventKind::StatusChanged);

    mirror.on_update(
        "PRESENCE_UPDATE",
        &json!({"user": {"id": 5, "username": "D"}, "status": "online"}),
    );
    mirror.on_update(
        "PRESENCE_UPDATE",
        &json!({"user": {"id": 5}, "status": "idle"}),
    );
    mirror.flush();

    let events = statuses.lock();
    assert_eq!(events.len(), 2);
    match (&events[0], &events[1]) {
        (
            ChangeEvent::StatusChanged { old: o1, new: n1, .. },
            ChangeEvent::StatusChanged { old: o2, new: n2, .. },
        ) => {
            assert_eq!((*o1, *n1), (UserStatus::Offline, UserStatus::Online));
            assert_eq!((*o2, *n2), (UserStatus::Online, UserStatus::Idle));
        }
        other => panic!("expected two StatusChanged events, got {:?}", other),
    }
    drop(events);
    mirror.shutdown();
}

#[test]
fn test_deletion_visibility() {
    let mirror = test_mirror();
    let deletions = collect(&mirror, EventKind::Deleted);

    mirror.on_update(
        "CHANNEL_CREATE",
        &json!({"id": 3, "server_id": 100, "name": "tmp", "position": 1}),
    );
    let original = mirror.channel(EntityId(3)).unwrap();

    mirror.on_update("CHANNEL_DELETE", &json!({"id": 3}));
    assert!(mirror.channel(EntityId(3)).is_none());
    assert!(!mirror
        .server(EntityId(100))
        .unwrap()
        .channels()
        .contains(&EntityId(3)));

    // Deleting an absent id is a no-op.
    mirror.on_update("CHANNEL_DELETE", &json!({"id": 3}));

    // Re-creation yields a fresh record.
    mirror.on_update(
        "CHANNEL_CREATE",
        &json!({"id": 3, "server_id": 100, "name": "tmp2", "position": 1}),
    );
    let recreated = mirror.channel(EntityId(3)).unwrap();
    assert!(!Arc::ptr_eq(&original, &recreated));
    assert_eq!(recreated.name(), "tmp2");

    mirror.flush();
    assert_eq!(deletions.lock().len(), 1);
    mirror.shutdown();
}

// --- Relationship side effects ---

#[test]
fn test_presence_attaches_membership_unconditionally() {
    let mirror = test_mirror();

    mirror.on_update(
        "ROLE_CREATE",
        &json!({"id": 7, "server_id": 100, "name": "admin", "position": 1}),
    );

    let record = json!({
        "user": {"id": 42, "username": "Alpha"},
        "server_id": 100,
        "roles": [7],
        "status": "online",
    });
    mirror.on_update("PRESENCE_UPDATE", &record);
    // Second delivery: attachment is applied again, harmlessly.
    mirror.on_update("PRESENCE_UPDATE", &record);

    assert!(mirror.server(EntityId(100)).unwrap().has_member(EntityId(42)));
    assert!(mirror.role(EntityId(7)).unwrap().has_member(EntityId(42)));
    mirror.shutdown();
}

#[test]
fn test_member_add_remove_round_trip() {
    let mirror = test_mirror();
    let memberships = collect(&mirror, EventKind::MembershipChanged);

    mirror.on_update(
        "MEMBER_ADD",
        &json!({"server_id": 100, "user": {"id": 42, "username": "Alpha"}}),
    );
    // Redundant add: no second event.
    mirror.on_update(
        "MEMBER_ADD",
        &json!({"server_id": 100, "user": {"id": 42}}),
    );
    mirror.on_update(
        "MEMBER_REMOVE",
        &json!({"server_id": 100, "user": {"id": 42}}),
    );
    mirror.flush();

    let events = memberships.lock();
    assert_eq!(events.len(), 2);
    match (&events[0], &events[1]) {
        (
            ChangeEvent::MembershipChanged { joined: j1, user: u1, .. },
            ChangeEvent::MembershipChanged { joined: j2, user: u2, .. },
        ) => {
            assert!(*j1);
            assert!(!*j2);
            assert_eq!(*u1, EntityId(42));
            assert_eq!(*u2, EntityId(42));
        }
        other => panic!("expected membership events, got {:?}", other),
    }
    drop(events);
    assert!(!mirror.server(EntityId(100)).unwrap().has_member(EntityId(42)));
    mirror.shutdown();
}

#[test]
fn test_role_update_hoist_and_move() {
    let mirror = test_mirror();
    let hoists = collect(&mirror, EventKind::HoistChanged);
    let moves = collect(&mirror, EventKind::Moved);

    mirror.on_update(
        "ROLE_CREATE",
        &json!({"id": 7, "server_id": 100, "name": "admin", "position": 1}),
    );
    mirror.on_update(
        "ROLE_UPDATE",
        &json!({"id": 7, "position": 3, "hoist": true}),
    );
    mirror.flush();

    assert_eq!(hoists.lock().len(), 1);
    assert_eq!(moves.lock().len(), 1);
    let role = mirror.role(EntityId(7)).unwrap();
    assert!(role.is_hoisted());
    assert_eq!(role.position(), 3);
    mirror.shutdown();
}

#[test]
fn test_server_lifecycle_cascades() {
    let mirror = test_mirror();
    let renames = collect(&mirror, EventKind::Renamed);
    let deletions = collect(&mirror, EventKind::Deleted);

    mirror.on_update("SERVER_CREATE", &json!({"id": 100, "name": "Guild"}));
    mirror.on_update(
        "CHANNEL_CREATE",
        &json!({"id": 1, "server_id": 100, "name": "general", "position": 0}),
    );
    mirror.on_update(
        "ROLE_CREATE",
        &json!({"id": 7, "server_id": 100, "name": "admin", "position": 1}),
    );

    mirror.on_update("SERVER_UPDATE", &json!({"id": 100, "name": "Renamed Guild"}));
    mirror.flush();
    assert_eq!(renames.lock().len(), 1);
    assert_eq!(mirror.server(EntityId(100)).unwrap().name(), "Renamed Guild");

    mirror.on_update("SERVER_DELETE", &json!({"id": 100}));
    mirror.flush();

    assert!(mirror.server(EntityId(100)).is_none());
    assert!(mirror.channel(EntityId(1)).is_none());
    assert!(mirror.role(EntityId(7)).is_none());
    // One Deleted event each for the channel, the role, and the server.
    assert_eq!(deletions.lock().len(), 3);
    mirror.shutdown();
}

#[test]
fn test_overwrite_removal_on_update() {
    let mirror = test_mirror();
    let overwrites = collect(&mirror, EventKind::OverwritesChanged);

    mirror.on_update(
        "CHANNEL_CREATE",
        &json!({
            "id": 1,
            "server_id": 100,
            "name": "general",
            "position": 0,
            "permission_overwrites": [
                {"id": 7, "type": "role", "allow": 8, "deny": 0}
            ],
        }),
    );

    // Update with an empty overwrite list removes the existing override.
    mirror.on_update(
        "CHANNEL_UPDATE",
        &json!({"id": 1, "permission_overwrites": []}),
    );
    mirror.flush();

    let events = overwrites.lock();
    assert_eq!(events.len(), 1);
    match &events[0] {
        ChangeEvent::OverwritesChanged { old, new, .. } => {
            assert_eq!(*old, Some(Permissions::new(8, 0)));
            assert_eq!(*new, None);
        }
        other => panic!("expected OverwritesChanged, got {:?}", other),
    }
    drop(events);
    assert!(mirror
        .channel(EntityId(1))
        .unwrap()
        .role_overwrites()
        .is_empty());
    mirror.shutdown();
}

// --- Malformed field handling ---

#[test]
fn test_non_string_avatar_is_skipped_not_cleared() {
    let mirror = test_mirror();

    mirror.on_update(
        "PRESENCE_UPDATE",
        &json!({"user": {"id": 1, "username": "Alpha", "avatar": "abc"}}),
    );
    mirror.flush();
    let user = mirror.user(EntityId(1)).unwrap();
    assert_eq!(user.avatar().as_deref(), Some("abc"));

    // A numeric avatar field is malformed, not a clear. The cached hash
    // must survive and no change event may fire.
    let avatars = collect(&mirror, EventKind::AvatarChanged);
    mirror.on_update("PRESENCE_UPDATE", &json!({"user": {"id": 1, "avatar": 42}}));
    mirror.flush();

    assert_eq!(user.avatar().as_deref(), Some("abc"));
    assert!(avatars.lock().is_empty());

    // An explicit null still clears it.
    mirror.on_update(
        "PRESENCE_UPDATE",
        &json!({"user": {"id": 1, "avatar": null}}),
    );
    mirror.flush();
    assert!(user.avatar().is_none());
    assert_eq!(avatars.lock().len(), 1);
    mirror.shutdown();
}

#[test]
fn test_out_of_range_position_is_skipped() {
    let mirror = test_mirror();
    let moves = collect(&mirror, EventKind::Moved);

    mirror.on_update(
        "CHANNEL_CREATE",
        &json!({"id": 1, "server_id": 100, "name": "general", "position": 2}),
    );
    mirror.on_update(
        "ROLE_CREATE",
        &json!({"id": 7, "server_id": 100, "name": "admin", "position": 1}),
    );

    let too_big = i64::from(i32::MAX) + 1;
    mirror.on_update("CHANNEL_UPDATE", &json!({"id": 1, "position": too_big}));
    mirror.on_update("ROLE_UPDATE", &json!({"id": 7, "position": too_big}));
    mirror.flush();

    assert_eq!(mirror.channel(EntityId(1)).unwrap().position(), 2);
    assert_eq!(mirror.role(EntityId(7)).unwrap().position(), 1);
    assert!(moves.lock().is_empty());
    mirror.shutdown();
}

// --- Voice connections ---

#[test]
fn test_voice_state_join_move_leave() {
    let mirror = test_mirror();

    mirror.on_update(
        "PRESENCE_UPDATE",
        &json!({"user": {"id": 42, "username": "Alpha"}}),
    );
    let user = mirror.user(EntityId(42)).unwrap();
    assert_eq!(user.connected_voice_channel(), None);

    mirror.on_update(
        "VOICE_STATE_UPDATE",
        &json!({"user_id": 42, "channel_id": 10}),
    );
    assert_eq!(user.connected_voice_channel(), Some(EntityId(10)));

    mirror.on_update(
        "VOICE_STATE_UPDATE",
        &json!({"user_id": 42, "channel_id": 11}),
    );
    assert_eq!(user.connected_voice_channel(), Some(EntityId(11)));

    mirror.on_update(
        "VOICE_STATE_UPDATE",
        &json!({"user_id": 42, "channel_id": null}),
    );
    assert_eq!(user.connected_voice_channel(), None);
    mirror.shutdown();
}

#[test]
fn test_channel_delete_disconnects_voice_users() {
    let mirror = test_mirror();

    mirror.on_update(
        "CHANNEL_CREATE",
        &json!({"id": 10, "server_id": 100, "name": "voice", "position": 0}),
    );
    mirror.on_update(
        "VOICE_STATE_UPDATE",
        &json!({"user_id": 42, "channel_id": 10}),
    );
    let user = mirror.user(EntityId(42)).unwrap();
    assert_eq!(user.connected_voice_channel(), Some(EntityId(10)));

    mirror.on_update("CHANNEL_DELETE", &json!({"id": 10}));
    assert_eq!(user.connected_voice_channel(), None);
    mirror.shutdown();
}

#[test]
fn test_server_delete_disconnects_voice_users() {
    let mirror = test_mirror();

    mirror.on_update("SERVER_CREATE", &json!({"id": 100, "name": "Guild"}));
    mirror.on_update(
        "CHANNEL_CREATE",
        &json!({"id": 10, "server_id": 100, "name": "voice", "position": 0}),
    );
    mirror.on_update(
        "VOICE_STATE_UPDATE",
        &json!({"user_id": 42, "channel_id": 10}),
    );

    mirror.on_update("SERVER_DELETE", &json!({"id": 100}));
    assert_eq!(
        mirror.user(EntityId(42)).unwrap().connected_voice_channel(),
        None
    );
    mirror.shutdown();
}

#[test]
fn test_presence_updates_discriminator() {
    let mirror = test_mirror();

    mirror.on_update(
        "PRESENCE_UPDATE",
        &json!({"user": {"id": 1, "username": "Alpha", "discriminator": "1234"}}),
    );
    let user = mirror.user(EntityId(1)).unwrap();
    assert_eq!(user.discriminator(), 1234);

    mirror.on_update(
        "PRESENCE_UPDATE",
        &json!({"user": {"id": 1, "discriminator": "5678"}}),
    );
    assert_eq!(user.discriminator(), 5678);

    // An unparseable discriminator leaves the cached value alone.
    mirror.on_update(
        "PRESENCE_UPDATE",
        &json!({"user": {"id": 1, "discriminator": "not-a-number"}}),
    );
    assert_eq!(user.discriminator(), 5678);
    mirror.shutdown();
}
