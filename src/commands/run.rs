use anyhow::Result;
use lexis_game_client::Game;

use super::{render, Arcade, Overrides};

pub async fn run(overrides: &Overrides, game: Game, command: &str) -> Result<()> {
    let arcade = Arcade::open(overrides)?;
    let result = arcade.client.send(command, game).await?;
    println!("{}", render(result.raw()));
    Ok(())
}
