pub mod chunk;
pub mod chunk_pool;
pub mod coord;
pub mod persistence;
pub mod streaming;
pub mod templates;
pub mod zones;
