use glam::Vec3;
use noise::{NoiseFn, SuperSimplex};

/// A named terrain style (biome).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    pub name: String,
}

impl Zone {
    pub fn new(name: impl Into<String>) -> Self {
        Zone { name: name.into() }
    }
}

pub trait ZoneResolver {
    /// Zone at a world-space position, or `None` if the position isn't covered by any zone.
    fn zone_at(&self, position: Vec3) -> Option<Zone>;
}

/// Same zone everywhere. With `None`, every lookup misses.
#[derive(Debug, Clone, Default)]
pub struct FixedZoneResolver {
    zone: Option<Zone>,
}

impl FixedZoneResolver {
    pub fn new(zone: Option<Zone>) -> Self {
        FixedZoneResolver { zone }
    }
}

impl ZoneResolver for FixedZoneResolver {
    fn zone_at(&self, _position: Vec3) -> Option<Zone> {
        self.zone.clone()
    }
}

// Zones span several chunks, so sample the noise at a low frequency
const ZONE_NOISE_SCALE: f64 = 0.002;

/// Picks zones from low-frequency noise over the XZ plane.
pub struct NoiseZoneResolver {
    noise: SuperSimplex,
    zones: Vec<String>,
}

impl NoiseZoneResolver {
    pub fn new(seed: u32, zones: Vec<String>) -> Self {
        NoiseZoneResolver {
            noise: SuperSimplex::new(seed),
            zones,
        }
    }
}

impl ZoneResolver for NoiseZoneResolver {
    fn zone_at(&self, position: Vec3) -> Option<Zone> {
        if self.zones.is_empty() {
            return None;
        }

        let sample = self.noise.get([
            position.x as f64 * ZONE_NOISE_SCALE,
            position.z as f64 * ZONE_NOISE_SCALE,
        ]);
        // [-1, 1] -> [0, 1)
        let normalized = ((sample + 1.0) / 2.0).clamp(0.0, 0.999_999);
        let index = (normalized * self.zones.len() as f64) as usize;
        self.zones.get(index).map(|name| Zone::new(name.as_str()))
    }
}

/// Ground tint for a zone. Unknown zones get a neutral grey.
pub fn zone_color(zone: &str) -> Vec3 {
    match zone {
        "Forest" => Vec3::new(0.18, 0.42, 0.16),
        "Desert" => Vec3::new(0.86, 0.74, 0.45),
        "Mountains" => Vec3::new(0.45, 0.43, 0.41),
        "Swamp" => Vec3::new(0.27, 0.33, 0.2),
        "Tundra" => Vec3::new(0.85, 0.9, 0.93),
        "Volcanic" => Vec3::new(0.25, 0.12, 0.1),
        _ => Vec3::splat(0.5),
    }
}
