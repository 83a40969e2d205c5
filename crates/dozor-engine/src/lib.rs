//! Game-state engine for the Dozor scavenger hunt.
//!
//! Each inbound chat message is handled independently; everything that has
//! to survive between messages lives in the [`Database`]. The engine keeps
//! no in-process cache, so concurrent invocations only coordinate through
//! the store's conditional writes.

pub mod answers;
pub mod codes;
pub mod config;
pub mod conversation;
pub mod error;
pub mod leaderboard;
pub mod profiles;
pub mod replies;
pub mod router;

use std::sync::Arc;

use dozor_db::Database;

pub use config::{AnswerGroup, GameConfig};
pub use error::EngineError;
pub use router::CommandRouter;

#[derive(Clone)]
pub struct Engine {
    db: Arc<Database>,
    config: Arc<GameConfig>,
}

impl Engine {
    pub fn new(db: Arc<Database>, config: GameConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn db(&self) -> &Database {
        &self.db
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn engine() -> Engine {
        engine_with(GameConfig::default())
    }

    pub fn engine_with(config: GameConfig) -> Engine {
        let db = Database::open_in_memory().expect("in-memory database");
        Engine::new(Arc::new(db), config)
    }
}
