use std::{collections::BTreeMap, path::Path};

use bytesize::ByteSize;
use glam::Vec3;

use engine::{
    EngineContext,
    actors::enemy::{Enemy, EnemyPool, EnemySpawn},
    config::config_manager::ConfigManager,
    game_loop::{Game, GameLoopTime},
    memory::entity_pools::PooledEntity,
    scene::SceneSink,
    terrain::{coord::ChunkKey, persistence::WorldSave},
};

use crate::{config::ClientConfig, fps_counter::FpsCounter};

const CREATURE_TYPES: [&str; 5] = ["Wolf", "Goblin", "Skeleton", "Spider", "Troll"];

/// Creature type living on a chunk. Stable for a given key.
fn creature_type_for(key: ChunkKey) -> &'static str {
    let hash = key.x().wrapping_mul(31).wrapping_add(key.z());
    CREATURE_TYPES[hash.rem_euclid(CREATURE_TYPES.len() as i32) as usize]
}

pub struct ClientGame {
    engine_context: EngineContext,
    config_manager: ConfigManager<ClientConfig>,
    client_config: ClientConfig,
    fps_counter: FpsCounter,
    view_distance: Option<u32>,
    enemy_pool: EnemyPool,
    enemies: BTreeMap<ChunkKey, Vec<Enemy>>,
    ticks: u64,
}

impl ClientGame {
    pub fn new(engine_context: EngineContext, config_manager: ConfigManager<ClientConfig>) -> Self {
        let client_config = config_manager.snapshot();
        let enemy_pool = EnemyPool::new(client_config.enemy_pool_prewarm);

        ClientGame {
            engine_context,
            config_manager,
            client_config,
            fps_counter: FpsCounter::new(),
            view_distance: None,
            enemy_pool,
            enemies: BTreeMap::new(),
            ticks: 0,
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn restore(&mut self, path: &Path) -> anyhow::Result<()> {
        let save = WorldSave::load_from_path(path)?;
        log::info!(
            "Restoring {} chunks from {}",
            save.chunks.len(),
            path.display()
        );
        self.engine_context.streaming.restore(save);
        Ok(())
    }

    /// Keeps `enemies_per_chunk` enemies on every active chunk and releases the enemies of
    /// chunks that stopped being active back to the pool.
    #[profiling::function]
    fn sync_enemies(&mut self) {
        let streaming = &mut self.engine_context.streaming;
        let chunk_size = streaming.config().chunk_size;

        let departed: Vec<ChunkKey> = self
            .enemies
            .keys()
            .filter(|key| streaming.active_chunk(**key).is_none())
            .copied()
            .collect();

        for key in departed {
            for enemy in self.enemies.remove(&key).unwrap_or_default() {
                streaming.scene_mut().detach(enemy.drawable());
                self.enemy_pool.release(enemy);
            }
        }

        if self.client_config.enemies_per_chunk == 0 {
            return;
        }

        let arrived: Vec<ChunkKey> = streaming
            .active_keys()
            .filter(|key| !self.enemies.contains_key(key))
            .collect();

        for key in arrived {
            let center = key.world_center(chunk_size);
            let creature_type = creature_type_for(key);
            // Farther from the origin means tougher enemies
            let level = 1 + key.chebyshev_distance(ChunkKey::new(0, 0)) / 4;

            let spawned: Vec<Enemy> = (0..self.client_config.enemies_per_chunk)
                .map(|i| {
                    let offset = chunk_size * 0.25 * i as f32;
                    let spawn = EnemySpawn {
                        position: center + Vec3::new(offset, 0.0, -offset),
                        level,
                    };
                    let enemy = self.enemy_pool.get(creature_type, &spawn);
                    streaming.scene_mut().attach(enemy.drawable());
                    enemy
                })
                .collect();

            self.enemies.insert(key, spawned);
        }
    }

    fn log_statistics(&self) {
        let stats = self.engine_context.streaming.statistics();
        let enemy_stats = self.enemy_pool.stats();

        log::info!(
            "Tick {}: player at {}, {} active, {} buffered ({} placeholders), {} drawables, ~{} terrain",
            self.ticks,
            self.engine_context
                .player
                .chunk_key(self.engine_context.streaming.config().chunk_size),
            stats.active_chunks,
            stats.buffered_chunks(),
            stats.placeholder_chunks,
            stats.attached_drawables,
            ByteSize::b(stats.approximate_memory_usage_bytes as u64),
        );
        log::info!(
            "Pools: {} terrain meshes idle, {} enemies active, {} enemies idle, avg frame {:.2?}",
            stats.chunk_pool.total_idle(),
            enemy_stats.total_active(),
            enemy_stats.total_idle(),
            self.fps_counter.average_frame_time(),
        );
    }

    /// Writes the client config and the save file (if configured), then releases every pooled
    /// resource.
    pub fn shutdown(mut self) -> anyhow::Result<()> {
        self.log_statistics();
        self.config_manager.save_now()?;

        if let Some(save_path) = &self.client_config.save_path {
            let save = self.engine_context.streaming.save();
            save.save_to_path(Path::new(save_path))?;
            log::info!("Saved {} chunks to {}", save.chunks.len(), save_path);
        }

        let streaming = &mut self.engine_context.streaming;
        for (_, enemies) in std::mem::take(&mut self.enemies) {
            for enemy in enemies {
                streaming.scene_mut().detach(enemy.drawable());
                self.enemy_pool.release(enemy);
            }
        }
        self.enemy_pool.clear(streaming.scene_mut());
        streaming.teardown();

        Ok(())
    }
}

impl Game for ClientGame {
    #[profiling::function]
    fn update(&mut self, time: &GameLoopTime) -> anyhow::Result<()> {
        self.fps_counter.begin_frame();

        self.engine_context.player.update(time);
        let chunk_size = self.engine_context.streaming.config().chunk_size;
        let center = self.engine_context.player.chunk_key(chunk_size);
        let multiplier = self
            .fps_counter
            .draw_distance_multiplier(self.client_config.target_frame_time_ms)
            .unwrap_or(self.client_config.draw_distance_multiplier);

        let update = self.engine_context.streaming.stream(center, multiplier);
        if self.view_distance != Some(update.view_distance) {
            log::debug!("View distance is now {}", update.view_distance);
            self.view_distance = Some(update.view_distance);
            // Next session starts from the tuned draw distance
            self.config_manager
                .update_and_save(|config| config.draw_distance_multiplier = multiplier);
        }
        self.sync_enemies();

        self.fps_counter.end_frame();
        self.ticks += 1;

        if self.ticks % self.client_config.stats_interval_ticks == 0 {
            self.log_statistics();
        }

        Ok(())
    }

    fn end_frame(&mut self, _time: &GameLoopTime) -> anyhow::Result<()> {
        profiling::finish_frame!();
        Ok(())
    }

    fn should_exit(&self) -> bool {
        self.ticks >= self.client_config.ticks
    }
}
