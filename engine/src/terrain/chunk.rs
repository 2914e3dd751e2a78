use glam::Vec3;

use crate::{
    memory::entity_pools::PooledEntity,
    scene::Drawable,
    terrain::{chunk_pool::TerrainMesh, coord::ChunkKey},
};

/// A chunk with a real mesh. Lives in the active set (attached) or in the buffer (detached).
#[derive(Debug)]
pub struct TerrainChunk {
    pub key: ChunkKey,
    pub mesh: TerrainMesh,
}

impl TerrainChunk {
    pub fn zone(&self) -> &str {
        self.mesh.zone()
    }

    pub fn drawable(&self) -> &Drawable {
        self.mesh.drawable()
    }

    pub fn position(&self) -> Vec3 {
        self.mesh.position()
    }

    /// Whether a renderer should draw the mesh. Only active chunks are visible.
    pub fn set_visible(&mut self, visible: bool) {
        self.mesh.drawable_mut().visible = visible;
    }
}

/// An entry of the buffer.
#[derive(Debug)]
pub enum BufferedChunk {
    /// Only enough to build the chunk later, no geometry.
    Placeholder { key: ChunkKey, zone: String },
    /// Fully built but hidden.
    Materialized(TerrainChunk),
}

impl BufferedChunk {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, BufferedChunk::Placeholder { .. })
    }
}
