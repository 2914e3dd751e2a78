/// A pool of reusable instances of a single type.
///
/// Instances are built by the factory when the idle list is empty and go through the reset hook
/// every time they are returned. The pool never destroys anything on its own; [`ObjectPool::clear`]
/// hands the idle instances back to the caller for teardown.
pub struct ObjectPool<T> {
    idle: Vec<T>,
    factory: Box<dyn FnMut() -> T>,
    reset: Box<dyn FnMut(&mut T)>,
    total_created: usize,
}

impl<T> ObjectPool<T> {
    pub fn new(
        factory: impl FnMut() -> T + 'static,
        reset: impl FnMut(&mut T) + 'static,
        prewarm: usize,
    ) -> Self {
        let mut pool = ObjectPool {
            idle: Vec::with_capacity(prewarm),
            factory: Box::new(factory),
            reset: Box::new(reset),
            total_created: 0,
        };

        for _ in 0..prewarm {
            let instance = pool.create();
            pool.idle.push(instance);
        }

        pool
    }

    fn create(&mut self) -> T {
        self.total_created += 1;
        (self.factory)()
    }

    pub fn get(&mut self) -> T {
        // Reuse the most recently released instance if there is one
        if let Some(instance) = self.idle.pop() {
            return instance;
        }

        self.create()
    }

    /// Resets `instance` and makes it available again. The pool doesn't track where the
    /// instance came from, releasing foreign instances is up to the caller.
    pub fn release(&mut self, mut instance: T) {
        (self.reset)(&mut instance);
        self.idle.push(instance);
    }

    /// Number of idle instances.
    pub fn size(&self) -> usize {
        self.idle.len()
    }

    pub fn total_created(&self) -> usize {
        self.total_created
    }

    /// Drains every idle instance. Scene removal and resource disposal are the caller's job.
    pub fn clear(&mut self) -> Vec<T> {
        std::mem::take(&mut self.idle)
    }
}
