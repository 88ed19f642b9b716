//=========================================================================
// Command Component
//=========================================================================
//
// Contract between the command system and whatever stores entities.
//
// The command system only enumerates entities and their type masks; it
// never creates or destroys them. `TypeMaskTable` is a ready-made
// implementation for applications without their own entity storage.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::RwLock;

use log::debug;

//=== Internal Dependencies ===============================================

use super::Mask;

//=== Entity ==============================================================

/// Opaque entity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(u32);

impl Entity {
    /// Creates an entity handle from a raw id.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[inline]
    pub const fn id(self) -> u32 {
        self.0
    }
}

//=== CommandComponent Trait ==============================================

/// Source of entities and their type masks for command dispatch.
///
/// Implementations are shared with other systems, so enumeration works
/// through `&self`.
pub trait CommandComponent: Send + Sync {
    /// Returns every tracked entity with its type mask.
    ///
    /// Called once per queued command, so effects of an earlier command
    /// (spawns, despawns, mask changes) are visible to later ones.
    fn tracked(&self) -> Vec<(Entity, Mask)>;
}

//=== TypeMaskTable =======================================================

/// Thread-safe table of entity type masks.
#[derive(Debug, Default)]
pub struct TypeMaskTable {
    masks: RwLock<BTreeMap<Entity, Mask>>,
    next_id: AtomicU32,
}

impl TypeMaskTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new entity with `mask` and returns it.
    pub fn spawn(&self, mask: Mask) -> Entity {
        let entity = Entity(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.set_type_mask(entity, mask);
        entity
    }

    /// Sets (or starts tracking) the type mask of `entity`.
    pub fn set_type_mask(&self, entity: Entity, mask: Mask) {
        debug!("Entity {:?} type mask set to {:#b}", entity, mask.bits());
        self.write().insert(entity, mask);
    }

    /// Returns the type mask of `entity`, if tracked.
    pub fn type_mask(&self, entity: Entity) -> Option<Mask> {
        self.read().get(&entity).copied()
    }

    /// Stops tracking `entity`. Returns its last mask.
    pub fn despawn(&self, entity: Entity) -> Option<Mask> {
        self.write().remove(&entity)
    }

    /// Returns the number of tracked entities.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true if no entities are tracked.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    //--- Internal Helpers -------------------------------------------------

    // A poisoned lock only means a writer panicked mid-insert; the map
    // itself is still consistent.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<Entity, Mask>> {
        self.masks.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<Entity, Mask>> {
        self.masks.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl CommandComponent for TypeMaskTable {
    fn tracked(&self) -> Vec<(Entity, Mask)> {
        self.read().iter().map(|(&e, &m)| (e, m)).collect()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_assigns_distinct_ids() {
        let table = TypeMaskTable::new();
        let a = table.spawn(Mask::from_bits_retain(0b01));
        let b = table.spawn(Mask::from_bits_retain(0b10));

        assert_ne!(a, b);
        assert_eq!(table.len(), 2);
        assert_eq!(table.type_mask(a), Some(Mask::from_bits_retain(0b01)));
        assert_eq!(table.type_mask(b), Some(Mask::from_bits_retain(0b10)));
    }

    #[test]
    fn set_type_mask_overwrites() {
        let table = TypeMaskTable::new();
        let e = table.spawn(Mask::from_bits_retain(0b01));
        table.set_type_mask(e, Mask::from_bits_retain(0b11));
        assert_eq!(table.type_mask(e), Some(Mask::from_bits_retain(0b11)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn despawn_stops_tracking() {
        let table = TypeMaskTable::new();
        let e = table.spawn(Mask::from_bits_retain(0b01));

        assert_eq!(table.despawn(e), Some(Mask::from_bits_retain(0b01)));
        assert_eq!(table.despawn(e), None);
        assert!(table.is_empty());
        assert!(table.tracked().is_empty());
    }

    #[test]
    fn tracked_is_ordered_by_entity() {
        let table = TypeMaskTable::new();
        table.set_type_mask(Entity::new(7), Mask::from_bits_retain(1));
        table.set_type_mask(Entity::new(3), Mask::from_bits_retain(2));

        let tracked = table.tracked();
        assert_eq!(
            tracked,
            vec![
                (Entity::new(3), Mask::from_bits_retain(2)),
                (Entity::new(7), Mask::from_bits_retain(1)),
            ]
        );
    }
}
