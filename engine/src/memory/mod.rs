pub mod entity_pools;
pub mod pool;
