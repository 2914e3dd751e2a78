use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::terrain::coord::ChunkKey;

pub mod feature_scatter;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedStructure {
    pub kind: String,
    pub position: Vec3,
    pub rotation: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedEnvironmentObject {
    pub kind: String,
    pub position: Vec3,
    pub scale: f32,
}

/// Places structures (ruins, camps, ...) on chunks. Implementations must tolerate being asked
/// for the same chunk more than once.
pub trait StructureGenerator {
    /// With `data_only`, only decide what goes where; nothing renderable is built.
    fn generate_structures_for_chunk(&mut self, key: ChunkKey, data_only: bool);
    fn load_structures_for_chunk(&mut self, key: ChunkKey, saved: &[SavedStructure]);

    /// The chunk left the world; drop whatever was kept for it.
    fn forget_structures_for_chunk(&mut self, _key: ChunkKey) {}

    fn export_structures(&self) -> BTreeMap<ChunkKey, Vec<SavedStructure>> {
        BTreeMap::new()
    }
}

/// Places environment objects (trees, rocks, ...) on chunks.
pub trait EnvironmentGenerator {
    fn generate_environment_for_chunk(&mut self, key: ChunkKey);
    fn load_environment_objects_for_chunk(
        &mut self,
        key: ChunkKey,
        saved: &[SavedEnvironmentObject],
    );

    fn forget_environment_for_chunk(&mut self, _key: ChunkKey) {}

    fn export_environment(&self) -> BTreeMap<ChunkKey, Vec<SavedEnvironmentObject>> {
        BTreeMap::new()
    }
}
