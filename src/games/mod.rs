pub mod hearts;
pub mod kachuful;
pub mod traitor;

use std::collections::HashMap;

use crate::engine::plugin::{DynGame, SnapshotAdapter};

use hearts::plugin::HeartsPlugin;
use kachuful::plugin::KachufulPlugin;
use traitor::plugin::TraitorPlugin;

/// Registry of available game plugins.
pub struct GameRegistry {
    plugins: HashMap<String, Box<dyn DynGame>>,
}

impl GameRegistry {
    pub fn new() -> Self {
        Self {
            plugins: HashMap::new(),
        }
    }

    pub fn register(&mut self, plugin: Box<dyn DynGame>) {
        let id = plugin.game_id().to_string();
        self.plugins.insert(id, plugin);
    }

    pub fn get(&self, game_id: &str) -> Option<&dyn DynGame> {
        self.plugins.get(game_id).map(|p| p.as_ref())
    }

    pub fn list_game_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.plugins.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for GameRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry with every built-in game.
pub fn default_registry() -> GameRegistry {
    let mut registry = GameRegistry::new();
    registry.register(Box::new(SnapshotAdapter(HeartsPlugin)));
    registry.register(Box::new(SnapshotAdapter(KachufulPlugin)));
    registry.register(Box::new(SnapshotAdapter(TraitorPlugin)));
    registry
}
