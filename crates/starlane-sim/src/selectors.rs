//! Entity selectors for operator tooling.
//!
//! `*` matches everything, `@name` matches by name, `#id` by id and `.kind`
//! by entity kind (substring of the kind name, so `.pla` finds planets
//! and players).

use starlane_core::components::Identity;
use starlane_core::types::EntityId;
use starlane_core::SimError;

use crate::level::Level;

impl Level {
    /// Ids of the entities matching `selector`, in master order.
    pub fn select_entities(&self, selector: &str) -> Result<Vec<EntityId>, SimError> {
        let selector = selector.trim();
        let matches: Box<dyn Fn(&Identity) -> bool + '_> = match selector.chars().next() {
            Some('*') if selector.len() == 1 => Box::new(|_| true),
            Some('@') => Box::new(move |identity| identity.name == selector[1..]),
            Some('#') => Box::new(move |identity| identity.id.as_str() == &selector[1..]),
            Some('.') if selector.len() > 1 => {
                Box::new(move |identity| identity.kind.name().contains(&selector[1..]))
            }
            _ => return Err(SimError::InvalidSelector(selector.to_string())),
        };
        Ok(self
            .entity_ids()
            .iter()
            .filter(|id| {
                self.read::<Identity>(id)
                    .map(|identity| matches(&identity))
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }
}
