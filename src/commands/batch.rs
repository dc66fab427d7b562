use anyhow::Result;
use lexis_game_client::Game;

use super::{render, Arcade, Overrides};

pub async fn run(overrides: &Overrides, game: Game, commands: &[String]) -> Result<()> {
    let arcade = Arcade::open(overrides)?;
    let batch = arcade.client.send_batch(commands, game).await?;

    for entry in &batch {
        println!("{} => {}", entry.command, render(entry.result.raw()));
    }
    Ok(())
}
