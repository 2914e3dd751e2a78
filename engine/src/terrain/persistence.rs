use std::{collections::BTreeMap, path::Path};

use anyhow::Context;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};

use crate::{
    terrain::coord::ChunkKey,
    worldgen::{SavedEnvironmentObject, SavedStructure},
};

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedChunk {
    pub exists: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub buffered: bool,
}

impl PersistedChunk {
    pub const ACTIVE: PersistedChunk = PersistedChunk {
        exists: true,
        buffered: false,
    };
    pub const BUFFERED: PersistedChunk = PersistedChunk {
        exists: true,
        buffered: true,
    };
}

/// Chunks that existed when a session was saved, keyed by chunk.
pub type PersistedChunkIndex = BTreeMap<ChunkKey, PersistedChunk>;

/// Everything the streaming core contributes to a save file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSave {
    pub chunks: PersistedChunkIndex,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub structures: BTreeMap<ChunkKey, Vec<SavedStructure>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<ChunkKey, Vec<SavedEnvironmentObject>>,
}

impl WorldSave {
    pub fn from_ron_str(data: &str) -> anyhow::Result<Self> {
        ron::from_str(data).context("Failed to parse world save")
    }

    pub fn to_ron_string(&self) -> anyhow::Result<String> {
        ron::ser::to_string_pretty(self, PrettyConfig::default())
            .context("Failed to serialize world save")
    }

    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read world save from {:?}", path))?;
        Self::from_ron_str(&data).with_context(|| format!("Invalid world save in {:?}", path))
    }

    pub fn save_to_path(&self, path: &Path) -> anyhow::Result<()> {
        let data = self.to_ron_string()?;
        std::fs::write(path, data)
            .with_context(|| format!("Failed to write world save to {:?}", path))?;
        log::info!("Saved {} chunks to {:?}", self.chunks.len(), path);
        Ok(())
    }
}

/// Decides whether a chunk may be created, based on the index of a previously saved session.
///
/// The index is a snapshot taken once at load time. Chunks created during play are not added to
/// it; they only end up in the next save.
#[derive(Debug, Default)]
pub struct PersistenceReconciliation {
    index: Option<PersistedChunkIndex>,
}

impl PersistenceReconciliation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, index: PersistedChunkIndex) {
        if self.index.is_some() {
            log::warn!("Replacing an already loaded persisted chunk index");
        }
        log::info!("Loaded persisted chunk index with {} chunks", index.len());
        self.index = Some(index);
    }

    pub fn is_loaded(&self) -> bool {
        self.index.is_some()
    }

    /// Always true for a fresh world (no index, or an empty one). Otherwise only keys the index
    /// marks as existing may be created.
    pub fn should_create(&self, key: ChunkKey) -> bool {
        match &self.index {
            Some(index) if !index.is_empty() => {
                index.get(&key).is_some_and(|chunk| chunk.exists)
            }
            _ => true,
        }
    }

    pub fn buffered_keys(&self) -> impl Iterator<Item = ChunkKey> + '_ {
        self.index
            .iter()
            .flat_map(|index| index.iter())
            .filter(|(_, chunk)| chunk.exists && chunk.buffered)
            .map(|(key, _)| *key)
    }
}
