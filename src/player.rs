//! Playback dispatcher: hands a resolved stream URL to an external player.

use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use tracing::info;

/// External media player invocation.
pub struct Player {
    command: String,
}

impl Player {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Launch the player with the URL as its single argument and detach.
    ///
    /// Fire-and-forget: the child is never waited on and its exit status is
    /// not reported. The URL is passed as an exec argument, not through a
    /// shell. Only a failed spawn is an error.
    pub fn play(&self, url: &str) -> Result<()> {
        info!(player = %self.command, url = %url, "launching external player");
        println!("Launching {} with stream url: {}", self.command, url);

        Command::new(&self.command)
            .arg(url)
            // keep the menu's stdin away from the child
            .stdin(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to launch player '{}'", self.command))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_failure_is_reported() {
        let player = Player::new("definitely-not-a-real-player-binary");
        let result = player.play("https://example.com/index.m3u8");
        assert!(result.is_err());
    }
}
