// Side length of a terrain chunk in world units
pub const DEFAULT_CHUNK_SIZE: f32 = 50.0;
// Grid segments per chunk side used for the terrain template geometry
pub const DEFAULT_CHUNK_RESOLUTION: u32 = 16;

// Chebyshev radius (in chunks) that must be active around the player
// Actual number of active chunks is (2 * VIEW_DISTANCE + 1)² before the draw distance multiplier
pub const DEFAULT_VIEW_DISTANCE: u32 = 3;
// Chunks closer than this (and closer than view distance + 2) are hidden instead of discarded
pub const DEFAULT_BUFFER_DISTANCE: u32 = 5;
// Extra rings kept beyond the view distance, the buffer threshold is capped by this
pub const BUFFER_MARGIN: u32 = 2;

pub const DEFAULT_ZONE: &str = "Forest";

// Idle instances created up front for every new pool category
pub const DEFAULT_POOL_PREWARM: usize = 3;
