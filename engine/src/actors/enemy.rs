use std::sync::Arc;

use glam::Vec3;

use crate::{
    memory::{
        entity_pools::{EntityPools, PoolStats, PooledEntity},
        pool::ObjectPool,
    },
    scene::{Drawable, Geometry, Material, SceneSink},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreatureStats {
    pub health: f32,
    pub damage: f32,
    pub speed: f32,
}

// Each level adds this fraction of the baseline health and damage
const PER_LEVEL_SCALING: f32 = 0.1;

impl CreatureStats {
    /// Level 1 stats for a creature type. Unknown types get the wolf's.
    pub fn baseline(creature_type: &str) -> Self {
        let (health, damage, speed) = match creature_type {
            "Goblin" => (60.0, 8.0, 3.5),
            "Skeleton" => (80.0, 12.0, 2.5),
            "Troll" => (250.0, 30.0, 1.5),
            "Spider" => (40.0, 6.0, 5.0),
            _ => (50.0, 10.0, 4.0),
        };

        CreatureStats {
            health,
            damage,
            speed,
        }
    }

    pub fn at_level(creature_type: &str, level: u32) -> Self {
        let baseline = Self::baseline(creature_type);
        let factor = 1.0 + PER_LEVEL_SCALING * level.saturating_sub(1) as f32;

        CreatureStats {
            health: baseline.health * factor,
            damage: baseline.damage * factor,
            speed: baseline.speed,
        }
    }
}

fn creature_color(creature_type: &str) -> Vec3 {
    match creature_type {
        "Goblin" => Vec3::new(0.3, 0.6, 0.2),
        "Skeleton" => Vec3::new(0.9, 0.9, 0.85),
        "Troll" => Vec3::new(0.4, 0.45, 0.35),
        "Spider" => Vec3::new(0.15, 0.1, 0.1),
        _ => Vec3::new(0.5, 0.4, 0.3),
    }
}

/// Where and how strong a pooled enemy should come back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemySpawn {
    pub position: Vec3,
    pub level: u32,
}

#[derive(Debug)]
pub struct Enemy {
    creature_type: String,
    pub level: u32,
    pub stats: CreatureStats,
    pub health: f32,
    drawable: Drawable,
    active: bool,
}

impl Enemy {
    pub fn creature_type(&self) -> &str {
        &self.creature_type
    }

    pub fn position(&self) -> Vec3 {
        self.drawable.position
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.health = (self.health - amount).max(0.0);
    }
}

impl PooledEntity for Enemy {
    fn category(&self) -> &str {
        &self.creature_type
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
        self.drawable.visible = active;
    }

    fn drawable(&self) -> &Drawable {
        &self.drawable
    }

    fn drawable_mut(&mut self) -> &mut Drawable {
        &mut self.drawable
    }
}

/// A unit cube with its base on the ground, shared by every enemy.
fn body_geometry() -> Geometry {
    let mut positions = Vec::with_capacity(8);
    for corner in 0..8u32 {
        positions.push(Vec3::new(
            (corner & 1) as f32 - 0.5,
            ((corner >> 1) & 1) as f32,
            ((corner >> 2) & 1) as f32 - 0.5,
        ));
    }
    let normals = positions.iter().map(|p| p.normalize_or_zero()).collect();

    #[rustfmt::skip]
    let indices = vec![
        0, 1, 3, 0, 3, 2,
        4, 6, 7, 4, 7, 5,
        0, 4, 5, 0, 5, 1,
        2, 3, 7, 2, 7, 6,
        0, 2, 6, 0, 6, 4,
        1, 5, 7, 1, 7, 3,
    ];

    Geometry {
        positions,
        normals,
        indices,
    }
}

/// Enemies pooled per creature type.
pub struct EnemyPool {
    pools: EntityPools<Enemy>,
}

impl EnemyPool {
    pub fn new(prewarm: usize) -> Self {
        let geometry = Arc::new(body_geometry());

        let pools = EntityPools::new(prewarm, move |creature_type, prewarm| {
            let geometry = geometry.clone();
            let creature_type = creature_type.to_owned();
            let material = Material {
                color: creature_color(&creature_type),
                ..Material::default()
            };
            let baseline = CreatureStats::baseline(&creature_type);

            ObjectPool::new(
                move || Enemy {
                    creature_type: creature_type.clone(),
                    level: 1,
                    stats: baseline,
                    health: baseline.health,
                    drawable: Drawable::new(geometry.clone(), material.clone()),
                    active: false,
                },
                move |enemy: &mut Enemy| {
                    enemy.level = 1;
                    enemy.stats = baseline;
                    enemy.health = baseline.health;
                    enemy.drawable.position = Vec3::ZERO;
                    enemy.drawable.cast_shadow = false;
                },
                prewarm,
            )
        });

        EnemyPool { pools }
    }

    /// An enemy of `creature_type` at full health for `spawn.level`, placed at `spawn.position`.
    pub fn get(&mut self, creature_type: &str, spawn: &EnemySpawn) -> Enemy {
        self.pools.get(creature_type, |enemy| {
            enemy.level = spawn.level.max(1);
            enemy.stats = CreatureStats::at_level(creature_type, enemy.level);
            enemy.health = enemy.stats.health;
            enemy.drawable.position = spawn.position;
            enemy.drawable.cast_shadow = true;
        })
    }

    pub fn release(&mut self, enemy: Enemy) {
        self.pools.release(enemy);
    }

    pub fn stats(&self) -> PoolStats {
        self.pools.stats()
    }

    pub fn clear<S: SceneSink + ?Sized>(&mut self, scene: &mut S) {
        self.pools.clear(scene);
    }
}
