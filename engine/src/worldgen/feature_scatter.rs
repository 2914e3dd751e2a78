use std::{collections::BTreeMap, hash::BuildHasher};

use ahash::{AHashMap, RandomState};
use glam::Vec3;

use crate::{
    terrain::coord::ChunkKey,
    worldgen::{
        EnvironmentGenerator, SavedEnvironmentObject, SavedStructure, StructureGenerator,
    },
};

const STRUCTURE_KINDS: [&str; 3] = ["Ruins", "Watchtower", "Camp"];
const ENVIRONMENT_KINDS: [&str; 3] = ["Tree", "Rock", "Bush"];

#[derive(Debug, Clone)]
struct ChunkStructures {
    structures: Vec<SavedStructure>,
    // False while only the data-only pass has run
    built: bool,
}

/// Deterministic structure and environment placement derived from a seed and the chunk key.
pub struct FeatureScatter {
    hasher: RandomState,
    chunk_size: f32,
    structures: AHashMap<ChunkKey, ChunkStructures>,
    environment: AHashMap<ChunkKey, Vec<SavedEnvironmentObject>>,
}

impl FeatureScatter {
    pub fn new(seed: u64, chunk_size: f32) -> Self {
        FeatureScatter {
            hasher: RandomState::with_seeds(seed, seed ^ 0x9e37_79b9, 17, 31),
            chunk_size,
            structures: AHashMap::new(),
            environment: AHashMap::new(),
        }
    }

    /// Uniform value in [0, 1) for the given chunk and salt.
    fn roll(&self, key: ChunkKey, salt: u32) -> f32 {
        let hash = self.hasher.hash_one((key.x(), key.z(), salt));
        (hash >> 40) as f32 / (1u64 << 24) as f32
    }

    fn point_in_chunk(&self, key: ChunkKey, salt: u32) -> Vec3 {
        let center = key.world_center(self.chunk_size);
        // Inset a little so rounding never pushes a point across the chunk border
        let half = self.chunk_size * 0.45;
        Vec3::new(
            center.x + (self.roll(key, salt) * 2.0 - 1.0) * half,
            0.0,
            center.z + (self.roll(key, salt + 1) * 2.0 - 1.0) * half,
        )
    }

    fn scatter_structures(&self, key: ChunkKey) -> Vec<SavedStructure> {
        // Most chunks have nothing, a few have one or two structures
        let count = match self.roll(key, 0) {
            r if r < 0.7 => 0,
            r if r < 0.95 => 1,
            _ => 2,
        };

        (0..count)
            .map(|i| {
                let salt = 100 + i * 10;
                let kind_index =
                    (self.roll(key, salt) * STRUCTURE_KINDS.len() as f32) as usize;
                SavedStructure {
                    kind: STRUCTURE_KINDS[kind_index.min(STRUCTURE_KINDS.len() - 1)].to_owned(),
                    position: self.point_in_chunk(key, salt + 1),
                    rotation: self.roll(key, salt + 3) * std::f32::consts::TAU,
                }
            })
            .collect()
    }

    fn scatter_environment(&self, key: ChunkKey) -> Vec<SavedEnvironmentObject> {
        let count = 2 + (self.roll(key, 1) * 7.0) as u32;

        (0..count)
            .map(|i| {
                let salt = 1000 + i * 10;
                let kind_index =
                    (self.roll(key, salt) * ENVIRONMENT_KINDS.len() as f32) as usize;
                SavedEnvironmentObject {
                    kind: ENVIRONMENT_KINDS[kind_index.min(ENVIRONMENT_KINDS.len() - 1)]
                        .to_owned(),
                    position: self.point_in_chunk(key, salt + 1),
                    scale: 0.75 + self.roll(key, salt + 3) * 0.5,
                }
            })
            .collect()
    }

    pub fn structures_for(&self, key: ChunkKey) -> Option<&[SavedStructure]> {
        self.structures
            .get(&key)
            .map(|entry| entry.structures.as_slice())
    }

    pub fn environment_for(&self, key: ChunkKey) -> Option<&[SavedEnvironmentObject]> {
        self.environment.get(&key).map(Vec::as_slice)
    }

    pub fn is_built(&self, key: ChunkKey) -> bool {
        self.structures.get(&key).is_some_and(|entry| entry.built)
    }

    pub fn total_structures(&self) -> usize {
        self.structures
            .values()
            .map(|entry| entry.structures.len())
            .sum()
    }
}

impl StructureGenerator for FeatureScatter {
    fn generate_structures_for_chunk(&mut self, key: ChunkKey, data_only: bool) {
        if let Some(entry) = self.structures.get_mut(&key) {
            entry.built |= !data_only;
            return;
        }

        let structures = self.scatter_structures(key);
        self.structures.insert(
            key,
            ChunkStructures {
                structures,
                built: !data_only,
            },
        );
    }

    fn load_structures_for_chunk(&mut self, key: ChunkKey, saved: &[SavedStructure]) {
        self.structures.insert(
            key,
            ChunkStructures {
                structures: saved.to_vec(),
                built: true,
            },
        );
    }

    fn forget_structures_for_chunk(&mut self, key: ChunkKey) {
        self.structures.remove(&key);
    }

    fn export_structures(&self) -> BTreeMap<ChunkKey, Vec<SavedStructure>> {
        self.structures
            .iter()
            .filter(|(_, entry)| !entry.structures.is_empty())
            .map(|(key, entry)| (*key, entry.structures.clone()))
            .collect()
    }
}

impl EnvironmentGenerator for FeatureScatter {
    fn generate_environment_for_chunk(&mut self, key: ChunkKey) {
        if self.environment.contains_key(&key) {
            return;
        }
        let objects = self.scatter_environment(key);
        self.environment.insert(key, objects);
    }

    fn load_environment_objects_for_chunk(
        &mut self,
        key: ChunkKey,
        saved: &[SavedEnvironmentObject],
    ) {
        self.environment.insert(key, saved.to_vec());
    }

    fn forget_environment_for_chunk(&mut self, key: ChunkKey) {
        self.environment.remove(&key);
    }

    fn export_environment(&self) -> BTreeMap<ChunkKey, Vec<SavedEnvironmentObject>> {
        self.environment
            .iter()
            .map(|(key, objects)| (*key, objects.clone()))
            .collect()
    }
}
