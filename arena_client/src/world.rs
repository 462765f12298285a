//! Entity store.
//!
//! Holds the last validated server snapshot and the identity of the locally
//! controlled entity. The store is a pure echo of the server: no prediction,
//! no smoothing, no staleness tracking. Whatever the last snapshot reported
//! is the entire truth, so a peer the server stopped reporting can never be
//! rendered.

use std::collections::HashMap;

use arena_shared::entity::Entity;
use arena_shared::protocol::{map_wire_to_entities, WirePlayer};

/// Authoritative world snapshot plus the local-entity designation.
#[derive(Debug, Default)]
pub struct World {
    entities: HashMap<String, Entity>,
    local_id: Option<String>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every known entity. Order is unspecified and
    /// may vary between calls.
    pub fn all(&self) -> Vec<Entity> {
        self.entities.values().cloned().collect()
    }

    /// Inserts or overwrites the entity with that id. `kind` is not
    /// validated here.
    pub fn upsert(&mut self, entity: Entity) {
        self.entities.insert(entity.id.clone(), entity);
    }

    /// Records `id` as the locally controlled entity. The id does not have
    /// to exist yet — a welcome's world payload lands in the same logical
    /// step.
    pub fn set_local_player(&mut self, id: impl Into<String>) {
        self.local_id = Some(id.into());
    }

    /// The recorded local designation, whether or not that entity currently
    /// exists.
    pub fn local_id(&self) -> Option<&str> {
        self.local_id.as_deref()
    }

    /// The locally controlled entity; absent if never designated or if the
    /// id is not in the current snapshot.
    pub fn local_player(&self) -> Option<&Entity> {
        self.entities.get(self.local_id.as_ref()?)
    }

    /// Atomically replaces the whole entity set with the mapped snapshot.
    ///
    /// The sole mechanism for reconciling with the network; there is no
    /// notion of missing or stale entities.
    pub fn replace_all(&mut self, players: &[WirePlayer]) {
        self.entities = map_wire_to_entities(players)
            .into_iter()
            .map(|e| (e.id.clone(), e))
            .collect();
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
