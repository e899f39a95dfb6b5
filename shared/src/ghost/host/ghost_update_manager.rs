use std::collections::HashMap;

use crate::{
    ghost::diff_mask::DiffMask,
    types::{GhostIndex, PacketIndex},
    wrapping_number::{sequence_greater_than, sequence_less_than},
};

/// What one packet carried for one ghost record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentGhost {
    /// Create notice plus full initial state.
    Create,
    /// Delta update; the mask records exactly which bits this packet
    /// was responsible for delivering.
    Update(DiffMask),
    /// Destroy notice.
    Destroy,
}

/// One entry in a packet's notification list. The generation guards
/// against a freed-and-reused slot being touched by a stale outcome.
#[derive(Debug, Clone, Copy)]
pub struct AckNode {
    pub slot: GhostIndex,
    pub generation: u16,
    pub sent: SentGhost,
}

/// In-flight bookkeeping for every packet the ghost writer has
/// produced but the transport has not yet resolved.
///
/// There is no timer here on purpose: loss is only ever learned from
/// the transport's delivered/dropped notification, and retry happens
/// naturally because undelivered bits flow back into residual masks.
pub struct GhostUpdateManager {
    sent_packets: HashMap<PacketIndex, Vec<AckNode>>,
    last_sent_packet: PacketIndex,
    has_sent: bool,
}

impl GhostUpdateManager {
    pub fn new() -> Self {
        Self {
            sent_packets: HashMap::new(),
            last_sent_packet: 0,
            has_sent: false,
        }
    }

    pub fn record(&mut self, packet_index: PacketIndex, node: AckNode) {
        self.sent_packets
            .entry(packet_index)
            .or_default()
            .push(node);
        if !self.has_sent || sequence_greater_than(packet_index, self.last_sent_packet) {
            self.last_sent_packet = packet_index;
            self.has_sent = true;
        }
    }

    /// Detach a packet's notification list. The second call for the
    /// same packet returns `None`, which is what makes duplicate
    /// outcome notifications no-ops.
    pub fn take_packet(&mut self, packet_index: PacketIndex) -> Option<Vec<AckNode>> {
        self.sent_packets.remove(&packet_index)
    }

    /// Given a dropped packet's sent mask for one record, subtract
    /// every bit that a later, still-unresolved packet also carries —
    /// those are not lost, so resending them now would be redundant.
    pub fn undelivered_mask(
        &self,
        dropped_packet: PacketIndex,
        slot: GhostIndex,
        generation: u16,
        sent_mask: DiffMask,
    ) -> DiffMask {
        let mut mask = sent_mask;
        if !self.has_sent || !sequence_less_than(dropped_packet, self.last_sent_packet) {
            return mask;
        }
        // walk from just past the dropped packet up through the most
        // recently sent one
        let mut packet_index = dropped_packet.wrapping_add(1);
        let end = self.last_sent_packet.wrapping_add(1);
        while packet_index != end {
            if let Some(nodes) = self.sent_packets.get(&packet_index) {
                for node in nodes {
                    if node.slot != slot || node.generation != generation {
                        continue;
                    }
                    if let SentGhost::Update(later_mask) = node.sent {
                        mask.nand(&later_mask);
                    }
                }
            }
            packet_index = packet_index.wrapping_add(1);
        }
        mask
    }

    pub fn in_flight_packets(&self) -> usize {
        self.sent_packets.len()
    }

    pub fn clear(&mut self) {
        self.sent_packets.clear();
        self.has_sent = false;
    }
}

impl Default for GhostUpdateManager {
    fn default() -> Self {
        Self::new()
    }
}
