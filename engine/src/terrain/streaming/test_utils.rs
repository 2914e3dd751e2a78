use std::{cell::RefCell, rc::Rc, sync::Arc};

use crate::{
    config::engine_config::StreamingConfig,
    scene::HeadlessScene,
    terrain::{coord::ChunkKey, streaming::ChunkLifecycleManager, templates::TerrainTemplateCache},
    worldgen::{EnvironmentGenerator, SavedEnvironmentObject, SavedStructure, StructureGenerator},
};

/// Manager over a headless scene with small meshes and no zone resolver.
pub fn test_manager(view_distance: u32, buffer_distance: u32) -> ChunkLifecycleManager {
    let config = StreamingConfig {
        chunk_resolution: 2,
        view_distance,
        buffer_distance,
        ..StreamingConfig::default()
    };

    ChunkLifecycleManager::new(
        config,
        HeadlessScene::new(),
        Arc::new(TerrainTemplateCache::new()),
        0,
    )
}

#[derive(Debug, Clone, PartialEq)]
pub enum StructureCall {
    Generate(ChunkKey, bool),
    Load(ChunkKey, Vec<SavedStructure>),
    Forget(ChunkKey),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnvironmentCall {
    Generate(ChunkKey),
    Load(ChunkKey, Vec<SavedEnvironmentObject>),
    Forget(ChunkKey),
}

/// Records every call; the log stays readable after the generator moves into a manager.
pub struct RecordingStructures {
    calls: Rc<RefCell<Vec<StructureCall>>>,
}

impl RecordingStructures {
    pub fn new() -> (Self, Rc<RefCell<Vec<StructureCall>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        (
            RecordingStructures {
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl StructureGenerator for RecordingStructures {
    fn generate_structures_for_chunk(&mut self, key: ChunkKey, data_only: bool) {
        self.calls
            .borrow_mut()
            .push(StructureCall::Generate(key, data_only));
    }

    fn load_structures_for_chunk(&mut self, key: ChunkKey, saved: &[SavedStructure]) {
        self.calls
            .borrow_mut()
            .push(StructureCall::Load(key, saved.to_vec()));
    }

    fn forget_structures_for_chunk(&mut self, key: ChunkKey) {
        self.calls.borrow_mut().push(StructureCall::Forget(key));
    }
}

pub struct RecordingEnvironment {
    calls: Rc<RefCell<Vec<EnvironmentCall>>>,
}

impl RecordingEnvironment {
    pub fn new() -> (Self, Rc<RefCell<Vec<EnvironmentCall>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        (
            RecordingEnvironment {
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl EnvironmentGenerator for RecordingEnvironment {
    fn generate_environment_for_chunk(&mut self, key: ChunkKey) {
        self.calls.borrow_mut().push(EnvironmentCall::Generate(key));
    }

    fn load_environment_objects_for_chunk(
        &mut self,
        key: ChunkKey,
        saved: &[SavedEnvironmentObject],
    ) {
        self.calls
            .borrow_mut()
            .push(EnvironmentCall::Load(key, saved.to_vec()));
    }

    fn forget_environment_for_chunk(&mut self, key: ChunkKey) {
        self.calls.borrow_mut().push(EnvironmentCall::Forget(key));
    }
}
