use anyhow::Result;
use lexis_game_client::Game;

use super::{Arcade, Overrides};

pub async fn run(overrides: &Overrides, game: Game) -> Result<()> {
    let arcade = Arcade::open(overrides)?;
    let commands = arcade.client.fetch_session(game).await?;

    println!("📜 {} session ({} commands)\n", game, commands.len());
    if commands.is_empty() {
        println!("  (none)");
    }
    for (i, command) in commands.iter().enumerate() {
        println!("  {:>3}. {}", i + 1, command);
    }
    Ok(())
}
