//! Game-world collaborator
//!
//! Built-in functions that need to know about characters, items or rooms ask
//! the host through [`World`]. Every call is synchronous: whatever the host
//! needs to look up must already be available when the prog runs.

use mud_core::{CharacterId, ItemId, LocationId};
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// World queries and effects available to progs
pub trait World: Send + Sync {
    fn character_name(&self, id: CharacterId) -> Option<String>;

    fn item_name(&self, id: ItemId) -> Option<String>;

    fn location_name(&self, id: LocationId) -> Option<String>;

    /// Where a character currently is, if anywhere
    fn character_location(&self, id: CharacterId) -> Option<LocationId>;

    fn characters_at(&self, location: LocationId) -> Vec<CharacterId>;

    /// Items lying in a location
    fn items_at(&self, location: LocationId) -> Vec<ItemId>;

    /// Items carried by a character
    fn inventory(&self, id: CharacterId) -> Vec<ItemId>;

    /// Deliver a message to one character
    fn send(&self, id: CharacterId, message: &str);

    /// Deliver a message to everyone in a location
    fn echo(&self, location: LocationId, message: &str);
}

#[derive(Debug, Clone)]
struct CharacterRecord {
    name: String,
    location: Option<LocationId>,
    inventory: Vec<ItemId>,
}

#[derive(Debug, Clone)]
struct LocationRecord {
    name: String,
    items: Vec<ItemId>,
}

/// In-process world used by tests and the content host
///
/// Messages sent through it are recorded rather than delivered.
#[derive(Debug, Default)]
pub struct MemoryWorld {
    characters: BTreeMap<CharacterId, CharacterRecord>,
    items: BTreeMap<ItemId, String>,
    locations: BTreeMap<LocationId, LocationRecord>,
    sent: Mutex<Vec<(CharacterId, String)>>,
    echoed: Mutex<Vec<(LocationId, String)>>,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_location(&mut self, id: LocationId, name: impl Into<String>) -> &mut Self {
        self.locations.insert(
            id,
            LocationRecord {
                name: name.into(),
                items: Vec::new(),
            },
        );
        self
    }

    pub fn add_character(
        &mut self,
        id: CharacterId,
        name: impl Into<String>,
        location: Option<LocationId>,
    ) -> &mut Self {
        self.characters.insert(
            id,
            CharacterRecord {
                name: name.into(),
                location,
                inventory: Vec::new(),
            },
        );
        self
    }

    /// Place an item on the ground in a location
    pub fn add_item_at(&mut self, id: ItemId, name: impl Into<String>, location: LocationId) -> &mut Self {
        self.items.insert(id, name.into());
        if let Some(record) = self.locations.get_mut(&location) {
            record.items.push(id);
        }
        self
    }

    /// Put an item in a character's inventory
    pub fn give_item(&mut self, id: ItemId, name: impl Into<String>, owner: CharacterId) -> &mut Self {
        self.items.insert(id, name.into());
        if let Some(record) = self.characters.get_mut(&owner) {
            record.inventory.push(id);
        }
        self
    }

    /// Messages delivered to a character so far
    pub fn sent_to(&self, id: CharacterId) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|(target, _)| *target == id)
            .map(|(_, message)| message.clone())
            .collect()
    }

    /// Messages echoed into a location so far
    pub fn echoes_at(&self, location: LocationId) -> Vec<String> {
        self.echoed
            .lock()
            .iter()
            .filter(|(target, _)| *target == location)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

impl World for MemoryWorld {
    fn character_name(&self, id: CharacterId) -> Option<String> {
        self.characters.get(&id).map(|record| record.name.clone())
    }

    fn item_name(&self, id: ItemId) -> Option<String> {
        self.items.get(&id).cloned()
    }

    fn location_name(&self, id: LocationId) -> Option<String> {
        self.locations.get(&id).map(|record| record.name.clone())
    }

    fn character_location(&self, id: CharacterId) -> Option<LocationId> {
        self.characters.get(&id).and_then(|record| record.location)
    }

    fn characters_at(&self, location: LocationId) -> Vec<CharacterId> {
        self.characters
            .iter()
            .filter(|(_, record)| record.location == Some(location))
            .map(|(id, _)| *id)
            .collect()
    }

    fn items_at(&self, location: LocationId) -> Vec<ItemId> {
        self.locations
            .get(&location)
            .map(|record| record.items.clone())
            .unwrap_or_default()
    }

    fn inventory(&self, id: CharacterId) -> Vec<ItemId> {
        self.characters
            .get(&id)
            .map(|record| record.inventory.clone())
            .unwrap_or_default()
    }

    fn send(&self, id: CharacterId, message: &str) {
        tracing::trace!("send to {}: {}", id, message);
        self.sent.lock().push((id, message.to_string()));
    }

    fn echo(&self, location: LocationId, message: &str) {
        tracing::trace!("echo in {}: {}", location, message);
        self.echoed.lock().push((location, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tavern() -> MemoryWorld {
        let mut world = MemoryWorld::new();
        world
            .add_location(LocationId::new(1), "The Tavern")
            .add_character(CharacterId::new(10), "Aldric", Some(LocationId::new(1)))
            .add_character(CharacterId::new(11), "Brenna", Some(LocationId::new(1)))
            .add_character(CharacterId::new(12), "Ghost", None)
            .add_item_at(ItemId::new(100), "a mug", LocationId::new(1))
            .give_item(ItemId::new(101), "a dagger", CharacterId::new(10));
        world
    }

    #[test]
    fn test_lookups() {
        let world = tavern();
        assert_eq!(world.character_name(CharacterId::new(10)).as_deref(), Some("Aldric"));
        assert_eq!(world.character_location(CharacterId::new(12)), None);
        assert_eq!(
            world.characters_at(LocationId::new(1)),
            vec![CharacterId::new(10), CharacterId::new(11)]
        );
        assert_eq!(world.items_at(LocationId::new(1)), vec![ItemId::new(100)]);
        assert_eq!(world.inventory(CharacterId::new(10)), vec![ItemId::new(101)]);
    }

    #[test]
    fn test_messages_are_recorded() {
        let world = tavern();
        world.send(CharacterId::new(10), "hello");
        world.echo(LocationId::new(1), "a bell rings");

        assert_eq!(world.sent_to(CharacterId::new(10)), vec!["hello".to_string()]);
        assert!(world.sent_to(CharacterId::new(11)).is_empty());
        assert_eq!(world.echoes_at(LocationId::new(1)), vec!["a bell rings".to_string()]);
    }
}
