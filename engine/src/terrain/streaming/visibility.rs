use ahash::AHashSet;
use ordered_float::OrderedFloat;

use crate::{
    limits::BUFFER_MARGIN,
    scene::SceneSink,
    terrain::{chunk::BufferedChunk, coord::ChunkKey, streaming::ChunkLifecycleManager},
};

/// Result of an update pass, to be handed to the demotion pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityUpdate {
    pub visible: AHashSet<ChunkKey>,
    pub view_distance: u32,
}

/// `floor(base * multiplier)`, at least 1. Nonsensical multipliers (NaN, negative) give 1.
pub fn view_distance_for(base: u32, multiplier: f32) -> u32 {
    let scaled = (base as f64 * multiplier as f64).floor();
    if scaled >= 1.0 {
        // Chunk coordinates are i32, larger radii can't be iterated
        (scaled as u32).min(i32::MAX as u32)
    } else {
        1
    }
}

impl<S: SceneSink> ChunkLifecycleManager<S> {
    /// Chunks farther than this from the player are discarded rather than hidden.
    pub fn buffer_threshold(&self, view_distance: u32) -> u32 {
        self.config
            .buffer_distance
            .min(view_distance.saturating_add(BUFFER_MARGIN))
    }

    /// Makes every chunk in the view square around `center` active, nearest first.
    #[profiling::function]
    pub fn update_terrain_chunks(&mut self, center: ChunkKey, multiplier: f32) -> VisibilityUpdate {
        let view_distance = view_distance_for(self.config.view_distance, multiplier);
        let chunk_size = self.config.chunk_size;
        let center_position = center.world_center(chunk_size);

        let mut keys: Vec<ChunkKey> = center.square_neighborhood(view_distance).collect();
        keys.sort_by_key(|key| {
            (
                OrderedFloat(key.world_center(chunk_size).distance_squared(center_position)),
                *key,
            )
        });

        let mut visible = AHashSet::with_capacity(keys.len());

        for key in keys {
            visible.insert(key);

            if let Some(chunk) = self.active.get(&key) {
                if !self.scene.is_attached(chunk.drawable().id()) {
                    self.scene.attach(chunk.drawable());
                }
                continue;
            }

            if !self.promote(key) {
                self.create_chunk(key);
            }
        }

        VisibilityUpdate {
            visible,
            view_distance,
        }
    }

    /// Demotes or discards every active chunk outside `visible`, then evicts buffered chunks
    /// that are now too far away.
    #[profiling::function]
    pub fn handle_chunk_visibility_changes(
        &mut self,
        visible: &AHashSet<ChunkKey>,
        center: ChunkKey,
        view_distance: u32,
    ) {
        let threshold = self.buffer_threshold(view_distance);

        let leaving: Vec<ChunkKey> = self
            .active
            .keys()
            .filter(|key| !visible.contains(key))
            .copied()
            .collect();

        let mut hidden = 0;
        let mut discarded = 0;

        for key in leaving {
            let Some(mut chunk) = self.active.remove(&key) else {
                continue;
            };
            self.scene.detach(chunk.drawable());

            if key.chebyshev_distance(center) <= threshold {
                chunk.set_visible(false);
                self.buffered.insert(key, BufferedChunk::Materialized(chunk));
                hidden += 1;
            } else {
                self.chunk_pool.release(chunk.mesh);
                self.forget(key);
                discarded += 1;
            }
        }

        let evicted = self.evict_distant_buffered(center, threshold);

        if hidden + discarded + evicted > 0 {
            log::debug!(
                "Visibility pass around {}: {} hidden, {} discarded, {} evicted from buffer",
                center,
                hidden,
                discarded,
                evicted
            );
        }

        self.visible = visible.clone();
    }

    /// Drops buffered chunks beyond `threshold`. Returns how many were dropped.
    fn evict_distant_buffered(&mut self, center: ChunkKey, threshold: u32) -> usize {
        let distant: Vec<ChunkKey> = self
            .buffered
            .keys()
            .filter(|key| key.chebyshev_distance(center) > threshold)
            .copied()
            .collect();

        for key in &distant {
            if let Some(BufferedChunk::Materialized(chunk)) = self.buffered.remove(key) {
                self.scene.detach(chunk.drawable());
                self.chunk_pool.release(chunk.mesh);
            }
            self.forget(*key);
        }

        distant.len()
    }

    /// Fills the ring between the view square and the buffer threshold with placeholders.
    pub fn prefetch_buffer_ring(&mut self, center: ChunkKey, view_distance: u32) {
        profiling::scope!("prefetch_buffer_ring");
        let threshold = self.buffer_threshold(view_distance);

        for key in center.square_neighborhood(threshold) {
            if key.chebyshev_distance(center) > view_distance {
                self.create_buffered_chunk(key);
            }
        }
    }

    /// One full tick: update, demotion, prefetch.
    pub fn stream(&mut self, center: ChunkKey, multiplier: f32) -> VisibilityUpdate {
        let update = self.update_terrain_chunks(center, multiplier);
        self.handle_chunk_visibility_changes(&update.visible, center, update.view_distance);
        self.prefetch_buffer_ring(center, update.view_distance);
        update
    }
}
