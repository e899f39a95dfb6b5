mod common;

use common::{blob_fields, blob_registry, host_tick, remote_read, ScopeSet, TestBlob};
use ghostwire_shared::{
    DiffMask, GhostConfig, GhostConnection, GhostEvent, GhostState, GlobalGhostManager,
    RemoteGhostManager, ScopeMode,
};

fn dirty_bit(globals: &mut GlobalGhostManager, id: ghostwire_shared::ObjectId, bit: u8) {
    let mut mask = DiffMask::empty();
    mask.set_bit(bit);
    globals.mark_dirty(id, mask);
}

/// Create a ghost and settle it into `Steady`.
fn settled_ghost(
    globals: &mut GlobalGhostManager,
    conn: &mut GhostConnection,
    scope: &mut ScopeSet,
    remote: &mut RemoteGhostManager,
    registry: &ghostwire_shared::ClassRegistry,
) {
    let bytes = host_tick(globals, conn, scope, 1);
    remote_read(registry, remote, &bytes);
    remote.take_incoming_events();
    conn.notify_packet_delivered(globals, 1);
}

#[test]
fn dropped_update_resends_only_bits_no_later_packet_carries() {
    let (registry, tag) = blob_registry();
    let mut globals = GlobalGhostManager::new();
    let mut conn = GhostConnection::new(1, &GhostConfig::default());
    let mut remote = RemoteGhostManager::new();

    let id = globals.register(Box::new(TestBlob::new([1, 2, 3, 4])), tag, ScopeMode::Normal);
    let mut scope = ScopeSet::of(&[id]);
    settled_ghost(&mut globals, &mut conn, &mut scope, &mut remote, &registry);
    let slot = conn.table().slot_of(&id).unwrap();

    // packet 2 carries fields 0 and 1; packet 3 carries field 1 again
    dirty_bit(&mut globals, id, 0);
    dirty_bit(&mut globals, id, 1);
    host_tick(&mut globals, &mut conn, &mut scope, 2);
    dirty_bit(&mut globals, id, 1);
    host_tick(&mut globals, &mut conn, &mut scope, 3);
    assert!(conn.table().record(slot).unwrap().residual().is_clear());

    // packet 3 still carries field 1, so only field 0 was truly lost
    conn.notify_packet_dropped(&mut globals, 2);
    assert_eq!(conn.table().record(slot).unwrap().residual().bits(), 0b01);

    // now packet 3 dies too and field 1 comes back as well
    conn.notify_packet_dropped(&mut globals, 3);
    assert_eq!(conn.table().record(slot).unwrap().residual().bits(), 0b11);
}

#[test]
fn dropped_create_is_rewound_and_resent() {
    let (registry, tag) = blob_registry();
    let mut globals = GlobalGhostManager::new();
    let mut conn = GhostConnection::new(1, &GhostConfig::default());
    let mut remote = RemoteGhostManager::new();

    let id = globals.register(Box::new(TestBlob::new([9, 8, 7, 6])), tag, ScopeMode::Normal);
    let mut scope = ScopeSet::of(&[id]);

    // the first create never arrives
    host_tick(&mut globals, &mut conn, &mut scope, 1);
    conn.notify_packet_dropped(&mut globals, 1);

    let slot = conn.table().slot_of(&id).unwrap();
    let record = conn.table().record(slot).unwrap();
    assert_eq!(record.state(), GhostState::NotYetCreated);
    assert!(!record.residual().is_clear());

    // the retry carries the full state again
    let bytes = host_tick(&mut globals, &mut conn, &mut scope, 2);
    remote_read(&registry, &mut remote, &bytes);
    assert_eq!(remote.take_incoming_events(), vec![GhostEvent::Spawned(0)]);
    assert_eq!(blob_fields(&remote, 0), [9, 8, 7, 6]);

    conn.notify_packet_delivered(&mut globals, 2);
    assert_eq!(conn.table().record(slot).unwrap().state(), GhostState::Steady);
}

#[test]
fn dropped_destroy_is_retried() {
    let (registry, tag) = blob_registry();
    let mut globals = GlobalGhostManager::new();
    let mut conn = GhostConnection::new(1, &GhostConfig::default());
    let mut remote = RemoteGhostManager::new();

    let id = globals.register(Box::new(TestBlob::new([1, 1, 1, 1])), tag, ScopeMode::Normal);
    let mut scope = ScopeSet::of(&[id]);
    settled_ghost(&mut globals, &mut conn, &mut scope, &mut remote, &registry);
    let slot = conn.table().slot_of(&id).unwrap();

    scope.visible.clear();
    host_tick(&mut globals, &mut conn, &mut scope, 2);
    conn.notify_packet_dropped(&mut globals, 2);
    assert_eq!(conn.table().record(slot).unwrap().state(), GhostState::Destroying);
    assert!(!conn.table().record(slot).unwrap().residual().is_clear());

    let bytes = host_tick(&mut globals, &mut conn, &mut scope, 3);
    remote_read(&registry, &mut remote, &bytes);
    assert_eq!(remote.take_incoming_events(), vec![GhostEvent::Despawned(0)]);

    conn.notify_packet_delivered(&mut globals, 3);
    assert_eq!(conn.table().ghost_count(), 0);
}

#[test]
fn duplicate_outcome_notifications_are_no_ops() {
    let (registry, tag) = blob_registry();
    let mut globals = GlobalGhostManager::new();
    let mut conn = GhostConnection::new(1, &GhostConfig::default());
    let mut remote = RemoteGhostManager::new();

    let id = globals.register(Box::new(TestBlob::new([1, 2, 3, 4])), tag, ScopeMode::Normal);
    let mut scope = ScopeSet::of(&[id]);
    settled_ghost(&mut globals, &mut conn, &mut scope, &mut remote, &registry);
    let slot = conn.table().slot_of(&id).unwrap();

    dirty_bit(&mut globals, id, 0);
    host_tick(&mut globals, &mut conn, &mut scope, 2);

    conn.notify_packet_dropped(&mut globals, 2);
    let after_first = conn.table().record(slot).unwrap().residual();

    // the transport stutters: same outcome twice, then a contradictory
    // delivered for an already-resolved packet
    conn.notify_packet_dropped(&mut globals, 2);
    conn.notify_packet_delivered(&mut globals, 2);
    assert_eq!(conn.table().record(slot).unwrap().residual(), after_first);
}

#[test]
fn stale_generation_outcomes_do_not_touch_slot_successors() {
    let (registry, tag) = blob_registry();
    let mut globals = GlobalGhostManager::new();
    let mut conn = GhostConnection::new(1, &GhostConfig::default());
    let mut remote = RemoteGhostManager::new();

    let first = globals.register(Box::new(TestBlob::new([1, 2, 3, 4])), tag, ScopeMode::Normal);
    let mut scope = ScopeSet::of(&[first]);
    settled_ghost(&mut globals, &mut conn, &mut scope, &mut remote, &registry);
    let slot = conn.table().slot_of(&first).unwrap();

    // packet 2 (update) stays in flight while packet 3 destroys the ghost
    dirty_bit(&mut globals, first, 0);
    host_tick(&mut globals, &mut conn, &mut scope, 2);
    scope.visible.clear();
    host_tick(&mut globals, &mut conn, &mut scope, 3);
    conn.notify_packet_delivered(&mut globals, 3);
    assert_eq!(conn.table().ghost_count(), 0);

    // the freed slot is reused by a new object
    let second = globals.register(Box::new(TestBlob::new([5, 5, 5, 5])), tag, ScopeMode::Normal);
    scope.visible = vec![second];
    host_tick(&mut globals, &mut conn, &mut scope, 4);
    assert_eq!(conn.table().slot_of(&second), Some(slot));
    conn.notify_packet_delivered(&mut globals, 4);

    // the stale update outcome must not dirty the successor
    conn.notify_packet_dropped(&mut globals, 2);
    assert!(conn.table().record(slot).unwrap().residual().is_clear());
}
