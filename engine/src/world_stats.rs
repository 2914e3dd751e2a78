use crate::memory::entity_pools::PoolStats;

/// Point-in-time counts for the chunk lifecycle manager.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StreamingStatistics {
    pub active_chunks: usize,
    pub hidden_chunks: usize,
    pub placeholder_chunks: usize,
    pub visible_chunks: usize,
    pub attached_drawables: usize,
    /// Geometry is shared between chunks of the same zone, so this overestimates.
    pub approximate_memory_usage_bytes: usize,
    pub chunk_pool: PoolStats,
}

impl StreamingStatistics {
    pub fn total_chunks(&self) -> usize {
        self.active_chunks + self.hidden_chunks + self.placeholder_chunks
    }

    pub fn buffered_chunks(&self) -> usize {
        self.hidden_chunks + self.placeholder_chunks
    }
}
