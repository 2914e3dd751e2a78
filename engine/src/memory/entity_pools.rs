use std::collections::BTreeMap;

use ahash::AHashMap;

use crate::{
    memory::pool::ObjectPool,
    scene::{Drawable, SceneSink},
};

/// An instance that can live in [`EntityPools`]. Every instance remembers the category it was
/// built for, so it always goes back to the pool it came from.
pub trait PooledEntity {
    fn category(&self) -> &str;
    fn set_active(&mut self, active: bool);
    fn drawable(&self) -> &Drawable;
    fn drawable_mut(&mut self) -> &mut Drawable;
}

/// Builds the pool for a category the first time it's requested. Receives the category name and
/// the number of instances to pre-warm.
pub type PoolBuilder<E> = Box<dyn FnMut(&str, usize) -> ObjectPool<E>>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CategoryStats {
    pub active: usize,
    pub idle: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PoolStats {
    pub categories: BTreeMap<String, CategoryStats>,
}

impl PoolStats {
    pub fn total_active(&self) -> usize {
        self.categories.values().map(|stats| stats.active).sum()
    }

    pub fn total_idle(&self) -> usize {
        self.categories.values().map(|stats| stats.idle).sum()
    }
}

/// One [`ObjectPool`] per category, created lazily on first use.
pub struct EntityPools<E> {
    pools: AHashMap<String, ObjectPool<E>>,
    active: AHashMap<String, usize>,
    builder: PoolBuilder<E>,
    prewarm: usize,
}

impl<E: PooledEntity> EntityPools<E> {
    pub fn new(prewarm: usize, builder: impl FnMut(&str, usize) -> ObjectPool<E> + 'static) -> Self {
        EntityPools {
            pools: AHashMap::new(),
            active: AHashMap::new(),
            builder: Box::new(builder),
            prewarm,
        }
    }

    fn pool_for(&mut self, category: &str) -> &mut ObjectPool<E> {
        let prewarm = self.prewarm;
        let builder = &mut self.builder;
        self.pools.entry(category.to_owned()).or_insert_with(|| {
            log::debug!("Creating pool for category {:?}", category);
            builder(category, prewarm)
        })
    }

    /// Takes an instance for `category`, applies `configure` on top of the reset defaults and
    /// marks it active.
    pub fn get(&mut self, category: &str, configure: impl FnOnce(&mut E)) -> E {
        let mut instance = self.pool_for(category).get();
        configure(&mut instance);
        instance.set_active(true);
        *self.active.entry(category.to_owned()).or_insert(0) += 1;
        instance
    }

    /// Returns `instance` to the pool of the category it was built for.
    pub fn release(&mut self, mut instance: E) {
        let category = instance.category().to_owned();
        instance.set_active(false);

        match self.active.get_mut(&category) {
            Some(count) if *count > 0 => *count -= 1,
            _ => log::warn!(
                "Released an instance of category {:?} with no active instances",
                category
            ),
        }

        self.pool_for(&category).release(instance);
    }

    pub fn active_count(&self, category: &str) -> usize {
        self.active.get(category).copied().unwrap_or(0)
    }

    pub fn idle_count(&self, category: &str) -> usize {
        self.pools.get(category).map_or(0, |pool| pool.size())
    }

    pub fn stats(&self) -> PoolStats {
        let mut categories = BTreeMap::new();

        for (category, pool) in &self.pools {
            categories.insert(
                category.clone(),
                CategoryStats {
                    active: self.active_count(category),
                    idle: pool.size(),
                },
            );
        }

        for (category, active) in &self.active {
            categories
                .entry(category.clone())
                .or_insert(CategoryStats::default())
                .active = *active;
        }

        PoolStats { categories }
    }

    /// Destroys every idle instance: detaches it from the scene if needed and disposes its
    /// geometry. Active counters are reset. Safe to call repeatedly.
    pub fn clear<S: SceneSink + ?Sized>(&mut self, scene: &mut S) {
        let mut disposed = 0;

        for pool in self.pools.values_mut() {
            for mut instance in pool.clear() {
                let drawable = instance.drawable_mut();
                if scene.is_attached(drawable.id()) {
                    scene.detach(drawable);
                }
                drawable.dispose();
                disposed += 1;
            }
        }

        for count in self.active.values_mut() {
            *count = 0;
        }

        if disposed > 0 {
            log::info!("Disposed {} pooled instances", disposed);
        }
    }
}
