use std::sync::Arc;

use glam::Vec3;

use crate::{
    memory::{
        entity_pools::{EntityPools, PoolStats, PooledEntity},
        pool::ObjectPool,
    },
    scene::{Drawable, SceneSink},
    terrain::{
        templates::{TerrainTemplate, TerrainTemplates},
        zones::zone_color,
    },
};

/// The renderable part of a terrain chunk.
#[derive(Debug)]
pub struct TerrainMesh {
    zone: String,
    drawable: Drawable,
    active: bool,
}

impl TerrainMesh {
    fn from_template(zone: &str, template: &TerrainTemplate) -> Self {
        TerrainMesh {
            zone: zone.to_owned(),
            drawable: Drawable::new(template.geometry.clone(), template.material.clone()),
            active: false,
        }
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }

    pub fn position(&self) -> Vec3 {
        self.drawable.position
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl PooledEntity for TerrainMesh {
    fn category(&self) -> &str {
        &self.zone
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
        self.drawable.visible = active;
    }

    fn drawable(&self) -> &Drawable {
        &self.drawable
    }

    fn drawable_mut(&mut self) -> &mut Drawable {
        &mut self.drawable
    }
}

/// Terrain meshes pooled per zone type.
pub struct TerrainChunkPool {
    pools: EntityPools<TerrainMesh>,
    templates: Arc<dyn TerrainTemplates>,
    chunk_size: f32,
    resolution: u32,
}

impl TerrainChunkPool {
    pub fn new(
        templates: Arc<dyn TerrainTemplates>,
        chunk_size: f32,
        resolution: u32,
        prewarm: usize,
    ) -> Self {
        let builder_templates = templates.clone();
        let pools = EntityPools::new(prewarm, move |zone, prewarm| {
            let template = builder_templates.get_or_create(zone, chunk_size, resolution);
            let default_material = template.material.clone();
            let zone = zone.to_owned();

            ObjectPool::new(
                move || TerrainMesh::from_template(&zone, &template),
                move |mesh: &mut TerrainMesh| {
                    mesh.drawable.position = Vec3::ZERO;
                    mesh.drawable.material = default_material.clone();
                    mesh.drawable.cast_shadow = false;
                    mesh.drawable.receive_shadow = false;
                },
                prewarm,
            )
        });

        TerrainChunkPool {
            pools,
            templates,
            chunk_size,
            resolution,
        }
    }

    /// A mesh for `zone`, coloured for the zone and placed at `position`.
    pub fn get(&mut self, zone: &str, position: Vec3) -> TerrainMesh {
        profiling::scope!("TerrainChunkPool::get");
        self.pools.get(zone, |mesh| {
            mesh.drawable.material.color = zone_color(zone);
            mesh.drawable.receive_shadow = true;
            mesh.drawable.position = position;
        })
    }

    pub fn release(&mut self, mesh: TerrainMesh) {
        self.pools.release(mesh);
    }

    /// Makes sure the template for `zone` exists, without building a mesh.
    pub fn warm_template(&self, zone: &str) {
        self.templates
            .get_or_create(zone, self.chunk_size, self.resolution);
    }

    pub fn stats(&self) -> PoolStats {
        self.pools.stats()
    }

    pub fn clear<S: SceneSink + ?Sized>(&mut self, scene: &mut S) {
        self.pools.clear(scene);
    }
}
