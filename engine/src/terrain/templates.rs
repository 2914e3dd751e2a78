use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use dashmap::DashMap;
use glam::Vec3;

use crate::{
    scene::{Geometry, Material},
    terrain::zones::zone_color,
};

/// Shared geometry plus a material prototype for one zone. Geometry is never mutated after
/// creation; the material must be cloned before per-instance changes (which `Clone` does).
#[derive(Debug, Clone)]
pub struct TerrainTemplate {
    pub geometry: Arc<Geometry>,
    pub material: Material,
}

pub trait TerrainTemplates: Send + Sync {
    /// Memoized by `(zone, size, resolution)`.
    fn get_or_create(&self, zone: &str, size: f32, resolution: u32) -> TerrainTemplate;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TemplateKey {
    zone: String,
    size_bits: u32,
    resolution: u32,
}

#[derive(Default)]
pub struct TerrainTemplateCache {
    templates: DashMap<TemplateKey, TerrainTemplate>,
    builds: AtomicUsize,
}

impl TerrainTemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// How many templates were actually built (cache misses).
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }
}

impl TerrainTemplates for TerrainTemplateCache {
    fn get_or_create(&self, zone: &str, size: f32, resolution: u32) -> TerrainTemplate {
        let key = TemplateKey {
            zone: zone.to_owned(),
            size_bits: size.to_bits(),
            resolution,
        };

        self.templates
            .entry(key)
            .or_insert_with(|| {
                profiling::scope!("build_terrain_template");
                self.builds.fetch_add(1, Ordering::Relaxed);
                log::debug!(
                    "Building terrain template for zone {:?} (size {}, resolution {})",
                    zone,
                    size,
                    resolution
                );
                TerrainTemplate {
                    geometry: Arc::new(build_flat_grid(size, resolution)),
                    material: Material {
                        color: zone_color(zone),
                        ..Material::default()
                    },
                }
            })
            .value()
            .clone()
    }
}

/// A flat square grid of `resolution`² quads centred on the origin, in the XZ plane.
pub fn build_flat_grid(size: f32, resolution: u32) -> Geometry {
    let resolution = resolution.max(1);
    let row = resolution + 1;
    let step = size / resolution as f32;
    let half = size / 2.0;

    let mut positions = Vec::with_capacity((row * row) as usize);
    for z in 0..row {
        for x in 0..row {
            positions.push(Vec3::new(x as f32 * step - half, 0.0, z as f32 * step - half));
        }
    }

    let mut indices = Vec::with_capacity((resolution * resolution * 6) as usize);
    for z in 0..resolution {
        for x in 0..resolution {
            let a = z * row + x;
            let b = a + 1;
            let c = a + row;
            let d = c + 1;
            indices.extend_from_slice(&[a, c, b, b, c, d]);
        }
    }

    Geometry {
        normals: vec![Vec3::Y; positions.len()],
        positions,
        indices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_grid_layout() {
        let geometry = build_flat_grid(10.0, 4);
        assert_eq!(geometry.positions.len(), 25);
        assert_eq!(geometry.normals.len(), 25);
        assert_eq!(geometry.indices.len(), 4 * 4 * 6);
        assert!(geometry.positions.iter().all(|p| p.y == 0.0));
        assert_eq!(geometry.positions[0], Vec3::new(-5.0, 0.0, -5.0));
        assert_eq!(geometry.positions[24], Vec3::new(5.0, 0.0, 5.0));
        assert!(geometry.indices.iter().all(|&i| (i as usize) < 25));
    }

    #[test]
    fn test_cache_memoizes_by_zone_size_and_resolution() {
        let cache = TerrainTemplateCache::new();

        let a = cache.get_or_create("Forest", 50.0, 8);
        let b = cache.get_or_create("Forest", 50.0, 8);
        assert!(Arc::ptr_eq(&a.geometry, &b.geometry));
        assert_eq!(cache.builds(), 1);

        cache.get_or_create("Desert", 50.0, 8);
        cache.get_or_create("Forest", 25.0, 8);
        cache.get_or_create("Forest", 50.0, 4);
        assert_eq!(cache.builds(), 4);
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn test_template_material_uses_zone_color() {
        let cache = TerrainTemplateCache::new();
        let template = cache.get_or_create("Desert", 50.0, 2);
        assert_eq!(template.material.color, zone_color("Desert"));
    }
}
