use std::sync::Arc;

use crate::{
    config::{config_manager::Config, engine_config::EngineConfig},
    player::Player,
    scene::HeadlessScene,
    terrain::{
        streaming::ChunkLifecycleManager, templates::TerrainTemplateCache,
        zones::NoiseZoneResolver,
    },
    worldgen::feature_scatter::FeatureScatter,
};

pub mod actors;
pub mod config;
pub mod game_loop;
pub mod limits;
pub mod memory;
pub mod player;
pub mod scene;
pub mod terrain;
pub mod world_stats;
pub mod worldgen;

pub struct EngineContext {
    pub streaming: ChunkLifecycleManager,
    pub player: Player,
}

/// A chunk lifecycle manager over a headless scene, with noise zones and scattered features.
pub fn create_chunk_manager(config: &EngineConfig) -> ChunkLifecycleManager {
    let streaming = &config.streaming;
    let mut zone_names = streaming.zone_names.clone();
    if zone_names.is_empty() {
        zone_names.push(streaming.default_zone.clone());
    }

    ChunkLifecycleManager::new(
        streaming.clone(),
        HeadlessScene::new(),
        Arc::new(TerrainTemplateCache::new()),
        config.pools.prewarm,
    )
    .with_zone_resolver(Box::new(NoiseZoneResolver::new(
        streaming.zone_seed,
        zone_names,
    )))
    .with_structure_generator(Box::new(FeatureScatter::new(
        streaming.zone_seed as u64,
        streaming.chunk_size,
    )))
    .with_environment_generator(Box::new(FeatureScatter::new(
        streaming.zone_seed as u64,
        streaming.chunk_size,
    )))
}

pub fn init_engine() -> anyhow::Result<EngineContext> {
    let config = EngineConfig::create_manager()?.snapshot();
    log::info!(
        "Streaming with view distance {}, buffer distance {}",
        config.streaming.view_distance,
        config.streaming.buffer_distance
    );
    let streaming = create_chunk_manager(&config);

    Ok(EngineContext {
        streaming,
        player: Player::new(),
    })
}
