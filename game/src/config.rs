use engine::config::config_manager::Config;
use serde::{Deserialize, Serialize};

use crate::fps_counter::{MAX_MULTIPLIER, MIN_MULTIPLIER};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Number of simulation ticks before the client exits.
    pub ticks: u64,
    pub updates_per_s: u32,
    pub player_speed: f32,
    pub save_path: Option<String>,
    pub enemies_per_chunk: usize,
    pub enemy_pool_prewarm: usize,
    pub stats_interval_ticks: u64,
    /// Frame time the draw distance multiplier aims for.
    pub target_frame_time_ms: f32,
    /// Multiplier the last session settled on. Used until frame times are measured.
    pub draw_distance_multiplier: f32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            ticks: 1800,
            updates_per_s: 30,
            player_speed: 1.0,
            save_path: Some("world.ron".to_owned()),
            enemies_per_chunk: 1,
            enemy_pool_prewarm: 4,
            stats_interval_ticks: 150,
            target_frame_time_ms: 4.0,
            draw_distance_multiplier: 1.0,
        }
    }
}

impl Config for ClientConfig {
    fn get_path() -> &'static str {
        "client.ron"
    }

    fn is_valid(&self) -> bool {
        self.updates_per_s > 0
            && self.player_speed.is_finite()
            && self.target_frame_time_ms > 0.0
            && self.stats_interval_ticks > 0
            && (MIN_MULTIPLIER..=MAX_MULTIPLIER).contains(&self.draw_distance_multiplier)
    }
}
