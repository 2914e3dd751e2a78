use glam::Vec3;
use splines::{Interpolation, Key, Spline};

use crate::{game_loop::GameLoopTime, terrain::coord::ChunkKey};

// Seconds of path time before the walk starts over
const PATH_LOOP_S: f32 = 89.0;

/// A player that walks a fixed loop over the ground plane. Stands in for real input.
pub struct Player {
    pub position: Vec3,

    path_progress: f32,
    path: Spline<f32, Vec3>,
    speed: f32,
}

impl Player {
    pub fn new() -> Self {
        Self::with_speed(1.0)
    }

    /// `speed` scales how fast path time advances relative to game time.
    pub fn with_speed(speed: f32) -> Self {
        let path = Spline::from_vec(vec![
            (Key::new(0.0, Vec3::new(0.0, 0.0, 0.0), Interpolation::Linear)),
            (Key::new(
                30.0,
                Vec3::new(150.0, 0.0, 600.0),
                Interpolation::CatmullRom,
            )),
            (Key::new(
                50.0,
                Vec3::new(200.0, 0.0, 1200.0),
                Interpolation::CatmullRom,
            )),
            (Key::new(
                90.0,
                Vec3::new(1400.0, 0.0, 300.0),
                Interpolation::CatmullRom,
            )),
            (Key::new(100.0, Vec3::new(900.0, 0.0, -50.0), Interpolation::Linear)),
        ]);

        let position = path.clamped_sample(0.0).unwrap_or(Vec3::ZERO);

        Player {
            position,
            path_progress: 0.0,
            path,
            speed,
        }
    }

    pub fn update(&mut self, time: &GameLoopTime) {
        self.path_progress += time.delta_time_s as f32 * self.speed;

        if self.path_progress >= PATH_LOOP_S {
            self.path_progress = 0.0;
        }

        if let Some(position) = self.path.clamped_sample(self.path_progress) {
            self.position = Vec3::new(position.x, 0.0, position.z);
        }
    }

    pub fn chunk_key(&self, chunk_size: f32) -> ChunkKey {
        ChunkKey::from_world(self.position, chunk_size)
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}
