use std::{collections::BTreeMap, sync::Arc};

use ahash::{AHashMap, AHashSet};
use thiserror::Error;

use crate::{
    config::engine_config::StreamingConfig,
    memory::entity_pools::PoolStats,
    scene::{HeadlessScene, SceneSink},
    terrain::{
        chunk::{BufferedChunk, TerrainChunk},
        chunk_pool::TerrainChunkPool,
        coord::ChunkKey,
        persistence::{PersistedChunk, PersistenceReconciliation, WorldSave},
        templates::TerrainTemplates,
        zones::ZoneResolver,
    },
    world_stats::StreamingStatistics,
    worldgen::{
        EnvironmentGenerator, SavedEnvironmentObject, SavedStructure, StructureGenerator,
    },
};

pub mod visibility;

#[cfg(test)]
mod test_utils;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StreamingError {
    #[error("chunk {0} is not in the buffer")]
    NotBuffered(ChunkKey),
}

/// Where a chunk key currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkMembership {
    Absent,
    Placeholder,
    /// Buffered with a real mesh, detached from the scene.
    Hidden,
    Active,
}

/// Decides which terrain chunks exist, which are fully built, and which are drawn.
///
/// Every key is in at most one of the active set and the buffer. Active chunks are always
/// materialized and attached to the scene; buffered chunks are either placeholders or hidden
/// meshes. Meshes come from (and go back to) a [`TerrainChunkPool`].
pub struct ChunkLifecycleManager<S: SceneSink = HeadlessScene> {
    config: StreamingConfig,
    scene: S,
    chunk_pool: TerrainChunkPool,
    zones: Option<Box<dyn ZoneResolver>>,
    structures: Option<Box<dyn StructureGenerator>>,
    environment: Option<Box<dyn EnvironmentGenerator>>,
    reconciliation: PersistenceReconciliation,
    saved_structures: BTreeMap<ChunkKey, Vec<SavedStructure>>,
    saved_environment: BTreeMap<ChunkKey, Vec<SavedEnvironmentObject>>,
    active: AHashMap<ChunkKey, TerrainChunk>,
    buffered: AHashMap<ChunkKey, BufferedChunk>,
    visible: AHashSet<ChunkKey>,
}

impl<S: SceneSink> ChunkLifecycleManager<S> {
    pub fn new(
        config: StreamingConfig,
        scene: S,
        templates: Arc<dyn TerrainTemplates>,
        pool_prewarm: usize,
    ) -> Self {
        let chunk_pool = TerrainChunkPool::new(
            templates,
            config.chunk_size,
            config.chunk_resolution,
            pool_prewarm,
        );

        ChunkLifecycleManager {
            config,
            scene,
            chunk_pool,
            zones: None,
            structures: None,
            environment: None,
            reconciliation: PersistenceReconciliation::new(),
            saved_structures: BTreeMap::new(),
            saved_environment: BTreeMap::new(),
            active: AHashMap::new(),
            buffered: AHashMap::new(),
            visible: AHashSet::new(),
        }
    }

    pub fn with_zone_resolver(mut self, zones: Box<dyn ZoneResolver>) -> Self {
        self.zones = Some(zones);
        self
    }

    pub fn with_structure_generator(mut self, structures: Box<dyn StructureGenerator>) -> Self {
        self.structures = Some(structures);
        self
    }

    pub fn with_environment_generator(
        mut self,
        environment: Box<dyn EnvironmentGenerator>,
    ) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn reconciliation(&self) -> &PersistenceReconciliation {
        &self.reconciliation
    }

    pub fn structures(&self) -> Option<&dyn StructureGenerator> {
        self.structures.as_deref()
    }

    pub fn environment(&self) -> Option<&dyn EnvironmentGenerator> {
        self.environment.as_deref()
    }

    pub fn membership(&self, key: ChunkKey) -> ChunkMembership {
        if self.active.contains_key(&key) {
            return ChunkMembership::Active;
        }

        match self.buffered.get(&key) {
            Some(BufferedChunk::Placeholder { .. }) => ChunkMembership::Placeholder,
            Some(BufferedChunk::Materialized(_)) => ChunkMembership::Hidden,
            None => ChunkMembership::Absent,
        }
    }

    pub fn active_chunk(&self, key: ChunkKey) -> Option<&TerrainChunk> {
        self.active.get(&key)
    }

    pub fn buffered_chunk(&self, key: ChunkKey) -> Option<&BufferedChunk> {
        self.buffered.get(&key)
    }

    pub fn active_keys(&self) -> impl Iterator<Item = ChunkKey> + '_ {
        self.active.keys().copied()
    }

    pub fn buffered_keys(&self) -> impl Iterator<Item = ChunkKey> + '_ {
        self.buffered.keys().copied()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn buffered_count(&self) -> usize {
        self.buffered.len()
    }

    /// The visible set recorded by the last visibility pass.
    pub fn visible_chunks(&self) -> &AHashSet<ChunkKey> {
        &self.visible
    }

    pub fn chunk_pool_stats(&self) -> PoolStats {
        self.chunk_pool.stats()
    }

    pub fn statistics(&self) -> StreamingStatistics {
        let placeholder_chunks = self
            .buffered
            .values()
            .filter(|entry| entry.is_placeholder())
            .count();

        let hidden_memory: usize = self
            .buffered
            .values()
            .filter_map(|entry| match entry {
                BufferedChunk::Materialized(chunk) => Some(chunk.drawable().approximate_size()),
                BufferedChunk::Placeholder { .. } => None,
            })
            .sum();
        let active_memory: usize = self
            .active
            .values()
            .map(|chunk| chunk.drawable().approximate_size())
            .sum();

        StreamingStatistics {
            active_chunks: self.active.len(),
            hidden_chunks: self.buffered.len() - placeholder_chunks,
            placeholder_chunks,
            visible_chunks: self.visible.len(),
            attached_drawables: self.scene.attached_count(),
            approximate_memory_usage_bytes: hidden_memory + active_memory,
            chunk_pool: self.chunk_pool.stats(),
        }
    }

    fn resolve_zone(&self, key: ChunkKey) -> String {
        let center = key.world_center(self.config.chunk_size);
        self.zones
            .as_ref()
            .and_then(|zones| zones.zone_at(center))
            .map(|zone| zone.name)
            .unwrap_or_else(|| self.config.default_zone.clone())
    }

    fn materialize(&mut self, key: ChunkKey, zone: &str) -> TerrainChunk {
        let position = key.world_center(self.config.chunk_size);
        let mesh = self.chunk_pool.get(zone, position);
        TerrainChunk { key, mesh }
    }

    /// Runs full structure/environment generation for a chunk that just became active. Chunks
    /// that were saved in a previous session replay their saved objects instead.
    fn populate(&mut self, key: ChunkKey) {
        if let Some(structures) = self.structures.as_mut() {
            match self.saved_structures.get(&key) {
                Some(saved) => structures.load_structures_for_chunk(key, saved),
                None => structures.generate_structures_for_chunk(key, false),
            }
        }

        if let Some(environment) = self.environment.as_mut() {
            match self.saved_environment.get(&key) {
                Some(saved) => environment.load_environment_objects_for_chunk(key, saved),
                None => environment.generate_environment_for_chunk(key),
            }
        }
    }

    /// Lets the generators drop their data for a chunk that left the world.
    fn forget(&mut self, key: ChunkKey) {
        if let Some(structures) = self.structures.as_mut() {
            structures.forget_structures_for_chunk(key);
        }
        if let Some(environment) = self.environment.as_mut() {
            environment.forget_environment_for_chunk(key);
        }
    }

    fn activate(&mut self, mut chunk: TerrainChunk) {
        let key = chunk.key;
        chunk.set_visible(true);
        self.scene.attach(chunk.drawable());
        self.active.insert(key, chunk);
        self.populate(key);
    }

    /// Moves a buffered chunk into the active set, building its mesh first if it's a
    /// placeholder. Returns false if the key isn't buffered.
    fn promote(&mut self, key: ChunkKey) -> bool {
        let Some(entry) = self.buffered.remove(&key) else {
            return false;
        };

        let chunk = match entry {
            BufferedChunk::Placeholder { zone, .. } => self.materialize(key, &zone),
            BufferedChunk::Materialized(chunk) => chunk,
        };

        log::debug!("Promoting chunk {} to active", key);
        self.activate(chunk);
        true
    }

    /// Returns the active chunk for `key`, promoting or creating it as needed.
    ///
    /// Returns `None` when a loaded save doesn't contain the chunk; that chunk is deliberately
    /// never created.
    #[profiling::function]
    pub fn create_chunk(&mut self, key: ChunkKey) -> Option<&TerrainChunk> {
        if self.active.contains_key(&key) {
            return self.active.get(&key);
        }

        if self.promote(key) {
            return self.active.get(&key);
        }

        if !self.reconciliation.should_create(key) {
            log::debug!("Chunk {} is not in the persisted index, skipping", key);
            return None;
        }

        let zone = self.resolve_zone(key);
        let chunk = self.materialize(key, &zone);
        log::debug!("Created chunk {} ({})", key, zone);
        self.activate(chunk);
        self.active.get(&key)
    }

    /// Adds a cheap placeholder for `key` to the buffer. The zone template is warmed and
    /// structures get a data-only pass so a later promotion is fast.
    pub fn create_buffered_chunk(&mut self, key: ChunkKey) {
        if self.active.contains_key(&key) || self.buffered.contains_key(&key) {
            return;
        }

        if !self.reconciliation.should_create(key) {
            return;
        }

        let zone = self.resolve_zone(key);
        self.chunk_pool.warm_template(&zone);

        if !self.saved_structures.contains_key(&key) {
            if let Some(structures) = self.structures.as_mut() {
                structures.generate_structures_for_chunk(key, true);
            }
        }

        self.buffered
            .insert(key, BufferedChunk::Placeholder { key, zone });
    }

    /// Builds the mesh for a buffered placeholder in place. The chunk stays in the buffer and
    /// stays detached. Already materialized entries are left alone.
    pub fn convert_placeholder_to_real_chunk(
        &mut self,
        key: ChunkKey,
    ) -> Result<(), StreamingError> {
        let zone = match self.buffered.get(&key) {
            None => return Err(StreamingError::NotBuffered(key)),
            Some(BufferedChunk::Materialized(_)) => return Ok(()),
            Some(BufferedChunk::Placeholder { zone, .. }) => zone.clone(),
        };

        let mut chunk = self.materialize(key, &zone);
        chunk.set_visible(false);
        self.buffered.insert(key, BufferedChunk::Materialized(chunk));
        Ok(())
    }

    /// Summary of every chunk this session knows about, for the save subsystem.
    pub fn save(&self) -> WorldSave {
        let mut save = WorldSave::default();

        for key in self.active.keys() {
            save.chunks.insert(*key, PersistedChunk::ACTIVE);
        }
        for key in self.buffered.keys() {
            save.chunks.insert(*key, PersistedChunk::BUFFERED);
        }

        // Saved objects of chunks that weren't rebuilt this session, overridden by live data
        let mut structures = self.saved_structures.clone();
        if let Some(generator) = &self.structures {
            structures.extend(generator.export_structures());
        }
        structures.retain(|key, _| save.chunks.contains_key(key));
        save.structures = structures;

        let mut environment = self.saved_environment.clone();
        if let Some(generator) = &self.environment {
            environment.extend(generator.export_environment());
        }
        environment.retain(|key, _| save.chunks.contains_key(key));
        save.environment = environment;

        save
    }

    /// Loads a previous session. From now on only chunks in the save can be created; chunks
    /// that were buffered come back as placeholders.
    pub fn restore(&mut self, save: WorldSave) {
        self.reconciliation.load(save.chunks);
        self.saved_structures = save.structures;
        self.saved_environment = save.environment;

        let buffered: Vec<ChunkKey> = self.reconciliation.buffered_keys().collect();
        for key in buffered {
            self.create_buffered_chunk(key);
        }
    }

    /// Detaches everything, returns all meshes to the pool and then destroys the pool contents.
    pub fn teardown(&mut self) {
        for (_, chunk) in self.active.drain() {
            self.scene.detach(chunk.drawable());
            self.chunk_pool.release(chunk.mesh);
        }

        for (_, entry) in self.buffered.drain() {
            if let BufferedChunk::Materialized(chunk) = entry {
                self.scene.detach(chunk.drawable());
                self.chunk_pool.release(chunk.mesh);
            }
        }

        self.visible.clear();
        self.chunk_pool.clear(&mut self.scene);
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::{
        memory::entity_pools::PooledEntity,
        terrain::{
            persistence::PersistedChunkIndex,
            zones::{FixedZoneResolver, Zone},
        },
    };

    use super::test_utils::*;

    #[test]
    fn test_create_chunk_is_idempotent() {
        let mut manager = test_manager(3, 5);
        let key = ChunkKey::new(1, 2);

        let first = manager.create_chunk(key).unwrap().drawable().id();
        let second = manager.create_chunk(key).unwrap().drawable().id();
        assert_eq!(first, second, "Second call should return the same chunk");
        assert_eq!(manager.active_count(), 1);
        assert_eq!(manager.scene().attached_count(), 1);
    }

    #[test]
    fn test_create_chunk_positions_at_chunk_center() {
        let mut manager = test_manager(3, 5);
        let chunk = manager.create_chunk(ChunkKey::new(2, -1)).unwrap();
        assert_eq!(chunk.position(), Vec3::new(125.0, 0.0, -25.0));
        let id = chunk.drawable().id();
        assert_eq!(
            manager.scene().position_of(id),
            Some(Vec3::new(125.0, 0.0, -25.0))
        );
    }

    #[test]
    fn test_persisted_index_gates_creation() {
        let mut manager = test_manager(3, 5);
        manager.restore(WorldSave {
            chunks: PersistedChunkIndex::from([(ChunkKey::new(2, 3), PersistedChunk::ACTIVE)]),
            ..WorldSave::default()
        });

        assert!(manager.create_chunk(ChunkKey::new(2, 3)).is_some());
        assert!(manager.create_chunk(ChunkKey::new(5, 5)).is_none());
        assert_eq!(manager.membership(ChunkKey::new(5, 5)), ChunkMembership::Absent);

        manager.create_buffered_chunk(ChunkKey::new(6, 6));
        assert_eq!(manager.membership(ChunkKey::new(6, 6)), ChunkMembership::Absent);
    }

    #[test]
    fn test_empty_persisted_index_allows_creation() {
        let mut manager = test_manager(3, 5);
        manager.restore(WorldSave::default());
        assert!(manager.create_chunk(ChunkKey::new(5, 5)).is_some());
    }

    #[test]
    fn test_buffered_chunk_is_a_cheap_placeholder() {
        let mut manager = test_manager(3, 5);
        let key = ChunkKey::new(4, 4);

        manager.create_buffered_chunk(key);
        assert_eq!(manager.membership(key), ChunkMembership::Placeholder);
        assert_eq!(manager.scene().attached_count(), 0);
        assert_eq!(manager.chunk_pool_stats().total_active(), 0);
        assert!(matches!(
            manager.buffered_chunk(key),
            Some(BufferedChunk::Placeholder { zone, .. }) if zone == "Forest"
        ));
    }

    #[test]
    fn test_create_buffered_chunk_skips_known_keys() {
        let mut manager = test_manager(3, 5);
        let key = ChunkKey::new(0, 0);
        manager.create_chunk(key);
        manager.create_buffered_chunk(key);
        assert_eq!(manager.membership(key), ChunkMembership::Active);
        assert_eq!(manager.buffered_count(), 0);

        let other = ChunkKey::new(1, 0);
        manager.create_buffered_chunk(other);
        manager.convert_placeholder_to_real_chunk(other).unwrap();
        manager.create_buffered_chunk(other);
        assert_eq!(manager.membership(other), ChunkMembership::Hidden);
    }

    #[test]
    fn test_convert_placeholder_keeps_chunk_buffered_and_detached() {
        let mut manager = test_manager(3, 5);
        let key = ChunkKey::new(-2, 1);
        manager.create_buffered_chunk(key);

        manager.convert_placeholder_to_real_chunk(key).unwrap();
        assert_eq!(manager.membership(key), ChunkMembership::Hidden);
        assert_eq!(manager.scene().attached_count(), 0);

        let Some(BufferedChunk::Materialized(chunk)) = manager.buffered_chunk(key) else {
            panic!("Chunk should be materialized");
        };
        assert_eq!(chunk.position(), key.world_center(50.0));
        assert!(!chunk.drawable().visible, "Buffered meshes shouldn't be drawn");
        let id = chunk.drawable().id();

        // Converting again is a no-op
        manager.convert_placeholder_to_real_chunk(key).unwrap();
        let Some(BufferedChunk::Materialized(chunk)) = manager.buffered_chunk(key) else {
            panic!("Chunk should still be materialized");
        };
        assert_eq!(chunk.drawable().id(), id);

        let chunk = manager.create_chunk(key).unwrap();
        assert_eq!(chunk.drawable().id(), id);
        assert!(chunk.drawable().visible);
    }

    #[test]
    fn test_convert_unknown_key_is_an_error() {
        let mut manager = test_manager(3, 5);
        let key = ChunkKey::new(9, 9);
        assert_eq!(
            manager.convert_placeholder_to_real_chunk(key),
            Err(StreamingError::NotBuffered(key))
        );

        manager.create_chunk(key);
        assert_eq!(
            manager.convert_placeholder_to_real_chunk(key),
            Err(StreamingError::NotBuffered(key))
        );
    }

    #[test]
    fn test_create_chunk_promotes_placeholder() {
        let mut manager = test_manager(3, 5);
        let key = ChunkKey::new(3, 3);
        manager.create_buffered_chunk(key);

        let chunk = manager.create_chunk(key).unwrap();
        assert!(chunk.mesh.is_active());
        let id = chunk.drawable().id();
        assert_eq!(manager.membership(key), ChunkMembership::Active);
        assert_eq!(manager.buffered_count(), 0);
        assert!(manager.scene().is_attached(id));
    }

    #[test]
    fn test_missing_zone_falls_back_to_default() {
        let mut manager = test_manager(3, 5)
            .with_zone_resolver(Box::new(FixedZoneResolver::new(None)));
        assert_eq!(manager.create_chunk(ChunkKey::new(0, 0)).unwrap().zone(), "Forest");

        let mut manager = test_manager(3, 5)
            .with_zone_resolver(Box::new(FixedZoneResolver::new(Some(Zone::new("Desert")))));
        assert_eq!(manager.create_chunk(ChunkKey::new(0, 0)).unwrap().zone(), "Desert");
    }

    #[test]
    fn test_generators_are_invoked() {
        let (structures, structure_log) = RecordingStructures::new();
        let (environment, environment_log) = RecordingEnvironment::new();
        let mut manager = test_manager(3, 5)
            .with_structure_generator(Box::new(structures))
            .with_environment_generator(Box::new(environment));

        let buffered = ChunkKey::new(5, 0);
        manager.create_buffered_chunk(buffered);
        manager.create_chunk(ChunkKey::new(0, 0));
        manager.create_chunk(buffered);

        assert_eq!(
            *structure_log.borrow(),
            vec![
                StructureCall::Generate(buffered, true),
                StructureCall::Generate(ChunkKey::new(0, 0), false),
                StructureCall::Generate(buffered, false),
            ]
        );
        assert_eq!(
            *environment_log.borrow(),
            vec![
                EnvironmentCall::Generate(ChunkKey::new(0, 0)),
                EnvironmentCall::Generate(buffered),
            ]
        );
    }

    #[test]
    fn test_save_lists_active_and_buffered_chunks() {
        let mut manager = test_manager(3, 5);
        manager.create_chunk(ChunkKey::new(0, 0));
        manager.create_buffered_chunk(ChunkKey::new(4, 0));

        let save = manager.save();
        assert_eq!(
            save.chunks,
            PersistedChunkIndex::from([
                (ChunkKey::new(0, 0), PersistedChunk::ACTIVE),
                (ChunkKey::new(4, 0), PersistedChunk::BUFFERED),
            ])
        );
    }

    #[test]
    fn test_restore_replays_saved_objects() {
        let (structures, structure_log) = RecordingStructures::new();
        let (environment, environment_log) = RecordingEnvironment::new();
        let mut manager = test_manager(3, 5)
            .with_structure_generator(Box::new(structures))
            .with_environment_generator(Box::new(environment));

        let saved_key = ChunkKey::new(1, 1);
        let buffered_key = ChunkKey::new(6, 1);
        let saved_structure = SavedStructure {
            kind: "Ruins".into(),
            position: Vec3::new(60.0, 0.0, 60.0),
            rotation: 1.0,
        };
        let saved_tree = SavedEnvironmentObject {
            kind: "Tree".into(),
            position: Vec3::new(70.0, 0.0, 70.0),
            scale: 1.2,
        };

        manager.restore(WorldSave {
            chunks: PersistedChunkIndex::from([
                (saved_key, PersistedChunk::ACTIVE),
                (buffered_key, PersistedChunk::BUFFERED),
            ]),
            structures: BTreeMap::from([(saved_key, vec![saved_structure.clone()])]),
            environment: BTreeMap::from([(saved_key, vec![saved_tree.clone()])]),
        });

        assert_eq!(manager.membership(buffered_key), ChunkMembership::Placeholder);
        manager.create_chunk(saved_key);

        assert_eq!(
            *structure_log.borrow(),
            vec![
                StructureCall::Generate(buffered_key, true),
                StructureCall::Load(saved_key, vec![saved_structure.clone()]),
            ]
        );
        assert_eq!(
            *environment_log.borrow(),
            vec![EnvironmentCall::Load(saved_key, vec![saved_tree])]
        );

        let save = manager.save();
        assert_eq!(save.structures[&saved_key], vec![saved_structure]);
        assert_eq!(save.chunks.len(), 2);
    }

    #[test]
    fn test_teardown_releases_everything() {
        let mut manager = test_manager(3, 5);
        manager.create_chunk(ChunkKey::new(0, 0));
        manager.create_chunk(ChunkKey::new(1, 0));
        manager.create_buffered_chunk(ChunkKey::new(2, 0));
        manager.convert_placeholder_to_real_chunk(ChunkKey::new(2, 0)).unwrap();
        manager.create_buffered_chunk(ChunkKey::new(3, 0));

        manager.teardown();
        assert_eq!(manager.active_count(), 0);
        assert_eq!(manager.buffered_count(), 0);
        assert_eq!(manager.scene().attached_count(), 0);

        let stats = manager.chunk_pool_stats();
        assert_eq!(stats.total_active(), 0);
        assert_eq!(stats.total_idle(), 0);

        // Idempotent
        manager.teardown();
    }

    #[test]
    fn test_statistics() {
        let mut manager = test_manager(3, 5);
        manager.create_chunk(ChunkKey::new(0, 0));
        manager.create_buffered_chunk(ChunkKey::new(4, 0));
        manager.create_buffered_chunk(ChunkKey::new(5, 0));
        manager.convert_placeholder_to_real_chunk(ChunkKey::new(5, 0)).unwrap();

        let stats = manager.statistics();
        assert_eq!(stats.active_chunks, 1);
        assert_eq!(stats.hidden_chunks, 1);
        assert_eq!(stats.placeholder_chunks, 1);
        assert_eq!(stats.total_chunks(), 3);
        assert_eq!(stats.attached_drawables, 1);
        assert!(stats.approximate_memory_usage_bytes > 0);
        assert_eq!(stats.chunk_pool.total_active(), 2);
    }

    #[test]
    fn test_active_chunks_are_never_placeholders() {
        let mut manager = test_manager(2, 4);
        for x in -3..=3 {
            manager.create_buffered_chunk(ChunkKey::new(x, 0));
        }
        for x in -3..=3 {
            let chunk = manager.create_chunk(ChunkKey::new(x, 0)).unwrap();
            assert!(!chunk.drawable().is_disposed());
            assert!(chunk.mesh.drawable().visible);
        }
        assert_eq!(manager.buffered_count(), 0);
    }
}
