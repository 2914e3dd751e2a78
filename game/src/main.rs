use std::path::Path;

use engine::{
    config::config_manager::Config,
    game_loop::{GameLoop, GameLoopConfig, GameLoopResult},
    init_engine,
};

use crate::{client_game::ClientGame, config::ClientConfig};

mod client_game;
mod config;
mod fps_counter;

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init_timed();
    log::info!("Starting headless client...");

    let mut context = init_engine()?;
    let client_config_manager = ClientConfig::create_manager()?;
    let client_config = client_config_manager.snapshot();

    context.player = engine::player::Player::with_speed(client_config.player_speed);

    let mut game = ClientGame::new(context, client_config_manager);
    if let Some(save_path) = &client_config.save_path {
        let save_path = Path::new(save_path);
        if save_path.exists() {
            game.restore(save_path)?;
        }
    }

    let mut game_loop = GameLoop::new(
        game,
        GameLoopConfig {
            updates_per_s: client_config.updates_per_s,
            max_frame_time_s: 0.25,
        },
    );

    // Headless, so simulate one fixed step per frame as fast as possible
    let step_s = game_loop.fixed_time_step_s();
    while game_loop.advance(step_s)? == GameLoopResult::Continue {}

    log::info!(
        "Finished {} ticks over {} frames in {:.1} s of game time",
        game_loop.game.ticks(),
        game_loop.number_of_frames(),
        game_loop.running_time_s()
    );

    game_loop.game.shutdown()
}
