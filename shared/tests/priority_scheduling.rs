mod common;

use common::{blob_registry, host_tick, remote_read, ScopeSet, TestBlob};
use ghostwire_shared::{
    BitWriter, DiffMask, GhostConfig, GhostConnection, GhostEvent, GlobalGhostManager, ObjectId,
    PacketIndex, RemoteGhostManager, ScopeMode,
};

/// A host tick with a deliberately tiny packet budget.
fn small_tick(
    globals: &mut GlobalGhostManager,
    conn: &mut GhostConnection,
    scope: &mut ScopeSet,
    packet_index: PacketIndex,
    budget_bits: u32,
) -> Vec<u8> {
    conn.run_scope_pass(globals, scope);
    let dirty = globals.take_dirty();
    conn.merge_dirty(&dirty);
    let mut writer = BitWriter::with_max_bits(budget_bits);
    conn.write_ghost_section(globals, packet_index, &mut writer);
    writer.to_bytes()
}

fn dirty_bit(globals: &mut GlobalGhostManager, id: ObjectId, bit: u8) {
    let mut mask = DiffMask::empty();
    mask.set_bit(bit);
    globals.mark_dirty(id, mask);
}

/// Two settled ghosts on one connection.
fn two_settled(
    registry: &ghostwire_shared::ClassRegistry,
    tag: ghostwire_shared::ClassTag,
    globals: &mut GlobalGhostManager,
    conn: &mut GhostConnection,
    remote: &mut RemoteGhostManager,
) -> (ObjectId, ObjectId, ScopeSet) {
    let a = globals.register(Box::new(TestBlob::new([1, 0, 0, 0])), tag, ScopeMode::Normal);
    let b = globals.register(Box::new(TestBlob::new([2, 0, 0, 0])), tag, ScopeMode::Normal);
    let mut scope = ScopeSet::of(&[a, b]);
    let bytes = host_tick(globals, conn, &mut scope, 1);
    remote_read(registry, remote, &bytes);
    remote.take_incoming_events();
    conn.notify_packet_delivered(globals, 1);
    (a, b, scope)
}

// Each single-field update entry needs 41 bits on the wire, plus the
// 4-bit section framing: a 60-bit budget fits exactly one.
const ONE_UPDATE_BUDGET: u32 = 60;

#[test]
fn skipped_ghosts_win_the_next_packet() {
    let (registry, tag) = blob_registry();
    let mut globals = GlobalGhostManager::new();
    let mut conn = GhostConnection::new(1, &GhostConfig::default());
    let mut remote = RemoteGhostManager::new();
    let (a, b, mut scope) = two_settled(&registry, tag, &mut globals, &mut conn, &mut remote);

    dirty_bit(&mut globals, a, 0);
    dirty_bit(&mut globals, b, 0);

    let bytes = small_tick(&mut globals, &mut conn, &mut scope, 2, ONE_UPDATE_BUDGET);
    remote_read(&registry, &mut remote, &bytes);
    let first = remote.take_incoming_events();
    assert_eq!(first.len(), 1);

    let slot_a = conn.table().slot_of(&a).unwrap();
    let slot_b = conn.table().slot_of(&b).unwrap();
    let residuals = [
        conn.table().record(slot_a).unwrap().residual().is_clear(),
        conn.table().record(slot_b).unwrap().residual().is_clear(),
    ];
    // exactly one of the two got through
    assert_eq!(residuals.iter().filter(|clear| **clear).count(), 1);

    // the starved one has accumulated priority and must win next
    let bytes = small_tick(&mut globals, &mut conn, &mut scope, 3, ONE_UPDATE_BUDGET);
    remote_read(&registry, &mut remote, &bytes);
    let second = remote.take_incoming_events();
    assert_eq!(second.len(), 1);
    assert_ne!(first, second);

    assert!(conn.table().record(slot_a).unwrap().residual().is_clear());
    assert!(conn.table().record(slot_b).unwrap().residual().is_clear());
}

// With ten live slots the index field takes 4 bits, so a single-field
// update entry is 42 bits: a 280-bit budget fits exactly six.
const SIX_UPDATE_BUDGET: u32 = 280;

#[test]
fn sustained_overload_rotates_without_starvation() {
    let (registry, tag) = blob_registry();
    let mut globals = GlobalGhostManager::new();
    let mut conn = GhostConnection::new(1, &GhostConfig::default());
    let mut remote = RemoteGhostManager::new();

    let ids: Vec<_> = (0..10u32)
        .map(|n| globals.register(Box::new(TestBlob::new([n, 0, 0, 0])), tag, ScopeMode::Normal))
        .collect();
    let mut scope = ScopeSet::of(&ids);
    let bytes = host_tick(&mut globals, &mut conn, &mut scope, 1);
    remote_read(&registry, &mut remote, &bytes);
    assert_eq!(remote.take_incoming_events().len(), 10);
    conn.notify_packet_delivered(&mut globals, 1);

    // every object dirtied every tick, bandwidth for only six of ten
    for tick in 0..4u16 {
        for id in &ids {
            dirty_bit(&mut globals, *id, 0);
        }
        let bytes = small_tick(&mut globals, &mut conn, &mut scope, 2 + tick, SIX_UPDATE_BUDGET);
        remote_read(&registry, &mut remote, &bytes);
        assert_eq!(remote.take_incoming_events().len(), 6);

        // skip-count priority keeps the rotation fair: nobody is ever
        // passed over more than twice in a row
        for id in &ids {
            let slot = conn.table().slot_of(id).unwrap();
            assert!(conn.table().record(slot).unwrap().skip_count() <= 2);
        }
    }
}

#[test]
fn destroys_outrank_updates() {
    let (registry, tag) = blob_registry();
    let mut globals = GlobalGhostManager::new();
    let mut conn = GhostConnection::new(1, &GhostConfig::default());
    let mut remote = RemoteGhostManager::new();
    let (a, b, mut scope) = two_settled(&registry, tag, &mut globals, &mut conn, &mut remote);

    let slot_a = conn.table().slot_of(&a).unwrap();
    let slot_b = conn.table().slot_of(&b).unwrap();

    dirty_bit(&mut globals, a, 0);
    scope.visible = vec![a];

    // room for the 5-bit destroy entry but not the 41-bit update
    let bytes = small_tick(&mut globals, &mut conn, &mut scope, 2, 16);
    remote_read(&registry, &mut remote, &bytes);
    assert_eq!(
        remote.take_incoming_events(),
        vec![GhostEvent::Despawned(slot_b)]
    );

    // the update was passed over, not lost
    assert_eq!(conn.table().record(slot_a).unwrap().residual().bits(), 0b1);
    assert!(conn.table().record(slot_a).unwrap().skip_count() > 0);
}

#[test]
fn section_stops_at_first_entry_that_does_not_fit() {
    let (registry, tag) = blob_registry();
    let mut globals = GlobalGhostManager::new();
    let mut conn = GhostConnection::new(1, &GhostConfig::default());
    let mut remote = RemoteGhostManager::new();
    let (a, b, mut scope) = two_settled(&registry, tag, &mut globals, &mut conn, &mut remote);

    dirty_bit(&mut globals, a, 0);
    dirty_bit(&mut globals, b, 0);

    let bytes = small_tick(&mut globals, &mut conn, &mut scope, 2, ONE_UPDATE_BUDGET);
    // the section still terminates cleanly and decodes
    remote_read(&registry, &mut remote, &bytes);
    assert_eq!(remote.take_incoming_events().len(), 1);

    let slot_a = conn.table().slot_of(&a).unwrap();
    let slot_b = conn.table().slot_of(&b).unwrap();
    let leftover = [slot_a, slot_b]
        .into_iter()
        .find(|slot| !conn.table().record(*slot).unwrap().residual().is_clear())
        .expect("one record should still owe its update");
    assert_eq!(conn.table().record(leftover).unwrap().skip_count(), 1);
}
