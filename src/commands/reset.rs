use anyhow::Result;
use lexis_game_client::Game;

use super::{Arcade, Overrides};

pub async fn run(overrides: &Overrides, game: Game) -> Result<()> {
    let arcade = Arcade::open(overrides)?;
    match arcade.client.reset_session(game).await {
        Ok(()) => {
            println!("✓ {} reset", game);
            Ok(())
        }
        Err(e) => {
            println!("○ Local {} state cleared; server reset failed", game);
            Err(e.into())
        }
    }
}
