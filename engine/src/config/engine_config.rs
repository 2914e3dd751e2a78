use serde::{Deserialize, Serialize};

use crate::{
    config::config_manager::Config,
    limits::{
        DEFAULT_BUFFER_DISTANCE, DEFAULT_CHUNK_RESOLUTION, DEFAULT_CHUNK_SIZE,
        DEFAULT_POOL_PREWARM, DEFAULT_VIEW_DISTANCE, DEFAULT_ZONE,
    },
};

#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub streaming: StreamingConfig,
    pub pools: PoolConfig,
}

impl Config for EngineConfig {
    fn get_path() -> &'static str {
        "engine.ron"
    }

    fn is_valid(&self) -> bool {
        self.streaming.is_valid()
    }
}

/// Tunables for the chunk lifecycle manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamingConfig {
    pub chunk_size: f32,
    pub chunk_resolution: u32,
    pub view_distance: u32,
    pub buffer_distance: u32,
    /// Used whenever the zone resolver is missing or has no zone for a position.
    pub default_zone: String,
    pub zone_seed: u32,
    /// Zones the noise resolver picks from. Empty means only `default_zone`.
    pub zone_names: Vec<String>,
}

impl StreamingConfig {
    pub fn is_valid(&self) -> bool {
        self.chunk_size > 0.0
            && self.chunk_size.is_finite()
            && self.chunk_resolution > 0
            && self.view_distance > 0
            && !self.default_zone.is_empty()
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        StreamingConfig {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_resolution: DEFAULT_CHUNK_RESOLUTION,
            view_distance: DEFAULT_VIEW_DISTANCE,
            buffer_distance: DEFAULT_BUFFER_DISTANCE,
            default_zone: DEFAULT_ZONE.to_string(),
            zone_seed: 1337,
            zone_names: ["Forest", "Desert", "Mountains", "Swamp"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PoolConfig {
    pub prewarm: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            prewarm: DEFAULT_POOL_PREWARM,
        }
    }
}
