use crate::{
    ghost::{remote::ghost_event::GhostEvent, replicable::Replicable},
    types::GhostIndex,
};

/// The remote half of one connection: proxy objects indexed by the
/// slot numbers the host assigned, plus the event queue the
/// application drains each tick.
pub struct RemoteGhostManager {
    ghosts: Vec<Option<Box<dyn Replicable>>>,
    incoming_events: Vec<GhostEvent>,
    ghost_count: usize,
}

impl RemoteGhostManager {
    pub fn new() -> Self {
        Self {
            ghosts: Vec::new(),
            incoming_events: Vec::new(),
            ghost_count: 0,
        }
    }

    pub fn ghost(&self, slot: GhostIndex) -> Option<&dyn Replicable> {
        self.ghosts
            .get(slot as usize)?
            .as_ref()
            .map(|object| object.as_ref())
    }

    pub fn ghost_mut(&mut self, slot: GhostIndex) -> Option<&mut dyn Replicable> {
        match self.ghosts.get_mut(slot as usize)? {
            Some(object) => Some(&mut **object),
            None => None,
        }
    }

    pub fn ghost_count(&self) -> usize {
        self.ghost_count
    }

    pub fn take_incoming_events(&mut self) -> Vec<GhostEvent> {
        std::mem::take(&mut self.incoming_events)
    }

    /// Drop every proxy and pending event, as on disconnect.
    pub fn reset(&mut self) {
        self.ghosts.clear();
        self.incoming_events.clear();
        self.ghost_count = 0;
    }

    pub(crate) fn insert(&mut self, slot: GhostIndex, object: Box<dyn Replicable>) {
        let index = slot as usize;
        if index >= self.ghosts.len() {
            self.ghosts.resize_with(index + 1, || None);
        }
        debug_assert!(self.ghosts[index].is_none());
        self.ghosts[index] = Some(object);
        self.ghost_count += 1;
    }

    pub(crate) fn take(&mut self, slot: GhostIndex) -> Option<Box<dyn Replicable>> {
        let object = self.ghosts.get_mut(slot as usize)?.take();
        if object.is_some() {
            self.ghost_count -= 1;
        }
        object
    }

    pub(crate) fn push_event(&mut self, event: GhostEvent) {
        self.incoming_events.push(event);
    }
}

impl Default for RemoteGhostManager {
    fn default() -> Self {
        Self::new()
    }
}
