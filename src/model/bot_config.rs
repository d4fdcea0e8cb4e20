use serde::{Deserialize, Serialize};

use crate::model::PlayerId;

/// Binds a bot `Player` to an entry in the engine registry (C5). Only
/// meaningful for players with `is_bot`; `config_blob` is opaque JSON passed
/// through to the engine's chooser unmodified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub player: PlayerId,
    pub engine_key: String,
    #[serde(default)]
    pub config_blob: serde_json::Value,
}

impl BotConfig {
    pub fn new(player: PlayerId, engine_key: impl Into<String>) -> BotConfig {
        BotConfig {
            player,
            engine_key: engine_key.into(),
            config_blob: serde_json::Value::Null,
        }
    }
}
