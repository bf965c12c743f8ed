//! Entity registry: the master iteration order, id to handle lookup, and the
//! per-system membership index.

use std::collections::HashMap;

use hecs::Entity;

use starlane_core::types::{EntityId, SystemId};

#[derive(Debug, Default)]
pub struct Registry {
    order: Vec<EntityId>,
    handles: HashMap<EntityId, Entity>,
    members: HashMap<SystemId, Vec<EntityId>>,
}

impl Registry {
    pub fn insert(&mut self, id: EntityId, handle: Entity, system: &SystemId) {
        self.order.push(id.clone());
        self.members.entry(system.clone()).or_default().push(id.clone());
        self.handles.insert(id, handle);
    }

    pub fn remove(&mut self, id: &EntityId, system: &SystemId) -> Option<Entity> {
        let handle = self.handles.remove(id)?;
        self.order.retain(|e| e != id);
        if let Some(members) = self.members.get_mut(system) {
            members.retain(|e| e != id);
        }
        Some(handle)
    }

    /// Moves `id` between membership lists, keeping `to` in master order.
    pub fn move_system(&mut self, id: &EntityId, from: &SystemId, to: &SystemId) {
        if let Some(members) = self.members.get_mut(from) {
            members.retain(|e| e != id);
        }
        let order = &self.order;
        let rank = |e: &EntityId| order.iter().position(|o| o == e);
        let target = rank(id);
        let members = self.members.entry(to.clone()).or_default();
        let index = members
            .iter()
            .position(|e| rank(e) > target)
            .unwrap_or(members.len());
        members.insert(index, id.clone());
    }

    pub fn handle(&self, id: &EntityId) -> Option<Entity> {
        self.handles.get(id).copied()
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.handles.contains_key(id)
    }

    /// Every live entity, in insertion order.
    pub fn order(&self) -> &[EntityId] {
        &self.order
    }

    /// Entities in `system`, in insertion order.
    pub fn members(&self, system: &SystemId) -> &[EntityId] {
        self.members.get(system).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moved_member_keeps_master_order() {
        let mut world = hecs::World::new();
        let mut registry = Registry::default();
        let alpha = SystemId::new("alpha");
        let beta = SystemId::new("beta");
        let ids: Vec<EntityId> = ["a", "b", "c", "d"].into_iter().map(EntityId::from).collect();
        registry.insert(ids[0].clone(), world.spawn(()), &alpha);
        registry.insert(ids[1].clone(), world.spawn(()), &beta);
        registry.insert(ids[2].clone(), world.spawn(()), &alpha);
        registry.insert(ids[3].clone(), world.spawn(()), &beta);

        registry.move_system(&ids[2], &alpha, &beta);
        assert_eq!(registry.members(&beta), &ids[1..]);
        assert_eq!(registry.members(&alpha), &ids[..1]);

        registry.move_system(&ids[0], &alpha, &beta);
        assert_eq!(registry.members(&beta), registry.order());
        assert!(registry.members(&alpha).is_empty());
    }
}
