use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use ahash::AHashMap;
use glam::Vec3;

static NEXT_DRAWABLE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a drawable, stable for its whole lifetime (including trips through a pool).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrawableId(u64);

impl DrawableId {
    fn next() -> Self {
        DrawableId(NEXT_DRAWABLE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct Geometry {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn approximate_size(&self) -> usize {
        (self.positions.len() + self.normals.len()) * size_of::<Vec3>()
            + self.indices.len() * size_of::<u32>()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub color: Vec3,
    pub roughness: f32,
}

impl Default for Material {
    fn default() -> Self {
        Material {
            color: Vec3::ONE,
            roughness: 0.8,
        }
    }
}

/// Something the renderer can draw. Geometry is shared with the template it was built from,
/// the material is a per-instance copy.
#[derive(Debug)]
pub struct Drawable {
    id: DrawableId,
    geometry: Option<Arc<Geometry>>,
    pub material: Material,
    pub position: Vec3,
    pub visible: bool,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Drawable {
    pub fn new(geometry: Arc<Geometry>, material: Material) -> Self {
        Drawable {
            id: DrawableId::next(),
            geometry: Some(geometry),
            material,
            position: Vec3::ZERO,
            visible: false,
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    pub fn id(&self) -> DrawableId {
        self.id
    }

    pub fn geometry(&self) -> Option<&Arc<Geometry>> {
        self.geometry.as_ref()
    }

    /// Drops this drawable's handle on its geometry. Further use only makes sense for identity.
    pub fn dispose(&mut self) {
        self.geometry = None;
        self.visible = false;
    }

    pub fn is_disposed(&self) -> bool {
        self.geometry.is_none()
    }

    pub fn approximate_size(&self) -> usize {
        self.geometry
            .as_ref()
            .map_or(0, |geometry| geometry.approximate_size())
    }
}

/// The part of the renderer the streaming core talks to.
/// Both operations are idempotent.
pub trait SceneSink {
    fn attach(&mut self, drawable: &Drawable);
    fn detach(&mut self, drawable: &Drawable);
    fn is_attached(&self, id: DrawableId) -> bool;
    fn attached_count(&self) -> usize;
}

/// Scene graph stand-in that only records what is attached and where.
#[derive(Debug, Default)]
pub struct HeadlessScene {
    attached: AHashMap<DrawableId, Vec3>,
    total_attaches: usize,
    total_detaches: usize,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position_of(&self, id: DrawableId) -> Option<Vec3> {
        self.attached.get(&id).copied()
    }

    pub fn total_attaches(&self) -> usize {
        self.total_attaches
    }

    pub fn total_detaches(&self) -> usize {
        self.total_detaches
    }
}

impl SceneSink for HeadlessScene {
    fn attach(&mut self, drawable: &Drawable) {
        if self.attached.insert(drawable.id(), drawable.position).is_none() {
            self.total_attaches += 1;
        }
    }

    fn detach(&mut self, drawable: &Drawable) {
        if self.attached.remove(&drawable.id()).is_some() {
            self.total_detaches += 1;
        }
    }

    fn is_attached(&self, id: DrawableId) -> bool {
        self.attached.contains_key(&id)
    }

    fn attached_count(&self) -> usize {
        self.attached.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_and_detach_are_idempotent() {
        let mut scene = HeadlessScene::new();
        let drawable = Drawable::new(Arc::new(Geometry::default()), Material::default());

        scene.attach(&drawable);
        scene.attach(&drawable);
        assert_eq!(scene.attached_count(), 1);
        assert_eq!(scene.total_attaches(), 1);

        scene.detach(&drawable);
        scene.detach(&drawable);
        assert_eq!(scene.attached_count(), 0);
        assert_eq!(scene.total_detaches(), 1);
        assert!(!scene.is_attached(drawable.id()));
    }

    #[test]
    fn test_drawable_ids_are_unique() {
        let geometry = Arc::new(Geometry::default());
        let a = Drawable::new(geometry.clone(), Material::default());
        let b = Drawable::new(geometry, Material::default());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_dispose_releases_geometry() {
        let geometry = Arc::new(Geometry {
            positions: vec![Vec3::ZERO; 4],
            normals: vec![Vec3::Y; 4],
            indices: vec![0, 1, 2, 2, 1, 3],
        });
        let mut drawable = Drawable::new(geometry.clone(), Material::default());
        assert_eq!(Arc::strong_count(&geometry), 2);
        assert!(drawable.approximate_size() > 0);

        drawable.dispose();
        assert!(drawable.is_disposed());
        assert_eq!(Arc::strong_count(&geometry), 1);
        assert_eq!(drawable.approximate_size(), 0);
    }
}
