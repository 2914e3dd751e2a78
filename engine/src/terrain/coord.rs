use std::{
    cmp::Ordering,
    fmt::{self, Display},
    str::FromStr,
};

use glam::{IVec2, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
/// Coordinates identifying a terrain chunk on the XZ grid. Serialized as `"x,z"`.
pub struct ChunkKey(pub IVec2);

impl ChunkKey {
    pub const fn new(x: i32, z: i32) -> Self {
        ChunkKey(IVec2::new(x, z))
    }

    pub fn x(&self) -> i32 {
        self.0.x
    }

    pub fn z(&self) -> i32 {
        self.0.y
    }

    /// Chunk containing the given world-space position.
    pub fn from_world(position: Vec3, chunk_size: f32) -> Self {
        ChunkKey::new(
            (position.x / chunk_size).floor() as i32,
            (position.z / chunk_size).floor() as i32,
        )
    }

    /// World-space centre of the chunk. Terrain is flat, so y is always 0.
    pub fn world_center(&self, chunk_size: f32) -> Vec3 {
        let half = chunk_size / 2.0;
        Vec3::new(
            self.x() as f32 * chunk_size + half,
            0.0,
            self.z() as f32 * chunk_size + half,
        )
    }

    pub fn chebyshev_distance(&self, other: ChunkKey) -> u32 {
        let delta = self.0 - other.0;
        delta.x.unsigned_abs().max(delta.y.unsigned_abs())
    }

    /// Every key within Chebyshev `radius` of this one, row by row.
    pub fn square_neighborhood(&self, radius: u32) -> impl Iterator<Item = ChunkKey> + use<> {
        let center = *self;
        let radius = radius as i32;
        (-radius..=radius).flat_map(move |dz| {
            (-radius..=radius).map(move |dx| ChunkKey::new(center.x() + dx, center.z() + dz))
        })
    }
}

// Row-major (x first, then z), so saves list keys in a stable order
impl Ord for ChunkKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.x(), self.z()).cmp(&(other.x(), other.z()))
    }
}

impl PartialOrd for ChunkKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x(), self.z())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkKeyParseError {
    #[error("chunk key {0:?} is not of the form \"x,z\"")]
    MissingSeparator(String),
    #[error("chunk key {key:?} has a non-integer component {component:?}")]
    InvalidComponent { key: String, component: String },
}

impl FromStr for ChunkKey {
    type Err = ChunkKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, z) = s
            .split_once(',')
            .ok_or_else(|| ChunkKeyParseError::MissingSeparator(s.to_owned()))?;

        let parse = |component: &str| {
            component
                .trim()
                .parse::<i32>()
                .map_err(|_| ChunkKeyParseError::InvalidComponent {
                    key: s.to_owned(),
                    component: component.to_owned(),
                })
        };

        Ok(ChunkKey::new(parse(x)?, parse(z)?))
    }
}

impl From<ChunkKey> for String {
    fn from(key: ChunkKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for ChunkKey {
    type Error = ChunkKeyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let key = ChunkKey::new(-3, 12);
        assert_eq!(key.to_string(), "-3,12");
        assert_eq!("-3,12".parse::<ChunkKey>(), Ok(key));
        assert_eq!(" 4 , 5 ".parse::<ChunkKey>(), Ok(ChunkKey::new(4, 5)));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "12".parse::<ChunkKey>(),
            Err(ChunkKeyParseError::MissingSeparator(_))
        ));
        assert!(matches!(
            "1,a".parse::<ChunkKey>(),
            Err(ChunkKeyParseError::InvalidComponent { .. })
        ));
        assert!("1,2,3".parse::<ChunkKey>().is_err());
    }

    #[test]
    fn test_world_center() {
        let key = ChunkKey::new(2, -1);
        assert_eq!(key.world_center(10.0), Vec3::new(25.0, 0.0, -5.0));
    }

    #[test]
    fn test_from_world_floors_negative_positions() {
        assert_eq!(
            ChunkKey::from_world(Vec3::new(-0.5, 3.0, 49.9), 50.0),
            ChunkKey::new(-1, 0)
        );
        let key = ChunkKey::new(-4, 7);
        assert_eq!(ChunkKey::from_world(key.world_center(50.0), 50.0), key);
    }

    #[test]
    fn test_chebyshev_distance() {
        let a = ChunkKey::new(0, 0);
        assert_eq!(a.chebyshev_distance(ChunkKey::new(3, -2)), 3);
        assert_eq!(a.chebyshev_distance(ChunkKey::new(-1, 5)), 5);
        assert_eq!(a.chebyshev_distance(a), 0);
    }

    #[test]
    fn test_square_neighborhood() {
        let center = ChunkKey::new(10, 10);
        let keys: Vec<_> = center.square_neighborhood(3).collect();
        assert_eq!(keys.len(), 49);
        assert!(keys.iter().all(|k| k.chebyshev_distance(center) <= 3));
        assert_eq!(center.square_neighborhood(0).collect::<Vec<_>>(), vec![center]);
    }

    #[test]
    fn test_serde_uses_string_form() {
        let serialized = ron::to_string(&ChunkKey::new(2, 3)).unwrap();
        assert_eq!(serialized, "\"2,3\"");
        let parsed: ChunkKey = ron::from_str("\"-7,0\"").unwrap();
        assert_eq!(parsed, ChunkKey::new(-7, 0));
    }
}
