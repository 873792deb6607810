//! Host, join or resume a room and play from the terminal.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tablesync_peer::{
    ConnectionState, RelayTransport, ResumableSession, Session, SessionConfig, SessionError,
    SessionHandle,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::input::{self, Input, HELP};
use super::render;
use crate::config::{session_path, PlayerConfig};

/// Open a new room and host it.
pub async fn host(data_dir: &Path, relay: &str, room: &str, password: Option<&str>) -> Result<()> {
    let config = session_config(data_dir, room, password).await?;
    let transport = connect(relay).await?;
    println!("Opening room '{}' via {}...", room, relay);
    play(Session::host(transport, config)).await
}

/// Join an existing room.
pub async fn join(data_dir: &Path, relay: &str, room: &str, password: Option<&str>) -> Result<()> {
    let config = session_config(data_dir, room, password).await?;
    let transport = connect(relay).await?;
    println!("Joining room '{}' via {}...", room, relay);
    play(Session::join(transport, config)).await
}

/// Resume the room this player was last part of.
pub async fn resume(data_dir: &Path, relay: &str) -> Result<()> {
    let player = PlayerConfig::load(data_dir).await?;
    let path = session_path(data_dir);
    let cached = ResumableSession::load(&path)
        .await
        .context("Failed to read the saved session")?
        .context("Nothing to resume. Use 'host' or 'join' instead.")?;

    if cached.player_id != player.player_id {
        anyhow::bail!("The saved session belongs to another player identity");
    }

    let config = SessionConfig::new(
        cached.room_id.as_str(),
        cached.password.clone(),
        cached.display_name.clone(),
    )
    .with_player_id(cached.player_id.clone())
    .with_cache_path(path);
    let transport = connect(relay).await?;
    println!(
        "Resuming room '{}' ({} at epoch {})...",
        cached.room_id,
        if cached.was_host { "host" } else { "client" },
        cached.epoch
    );
    play(Session::resume(transport, config, cached)).await
}

async fn session_config(
    data_dir: &Path,
    room: &str,
    password: Option<&str>,
) -> Result<SessionConfig> {
    let player = PlayerConfig::load(data_dir).await?;
    let password = match password {
        Some(p) => p.to_string(),
        None => prompt_password("Room password: ")?,
    };
    Ok(SessionConfig::new(room, password, player.display_name)
        .with_player_id(player.player_id)
        .with_cache_path(session_path(data_dir)))
}

async fn connect(relay: &str) -> Result<Arc<RelayTransport>> {
    let transport = RelayTransport::connect(relay)
        .await
        .with_context(|| format!("Failed to reach relay at {}", relay))?;
    Ok(Arc::new(transport))
}

/// Read commands from stdin until the player leaves or the session ends.
async fn play(session: SessionHandle) -> Result<()> {
    let mut events = session.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(line) = render::event(&event) {
                        println!("* {}", line);
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::debug!("Event printer skipped {} events", n);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut state = session.watch();
    println!("Type 'help' for commands.");

    let result = loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line.context("Failed to read input")? {
                    Some(line) => line,
                    None => break stop(&session).await,
                };
                let view = session.view();
                match input::parse(&line, &view.player_id, &view.table) {
                    Ok(Input::Nothing) => {}
                    Ok(Input::Show) => print!("{}", render::table(&view)),
                    Ok(Input::Help) => println!("{}", HELP),
                    Ok(Input::Leave) => break leave(&session).await,
                    Ok(Input::Act(action)) => match session.request(action).await {
                        Ok(()) => {}
                        Err(SessionError::NotJoined) => println!("! not connected yet"),
                        Err(e) => println!("! {}", e),
                    },
                    Err(e) => println!("! {}", e),
                }
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let failure = match &state.borrow_and_update().state {
                    ConnectionState::Error { message } => Some(message.clone()),
                    _ => None,
                };
                if let Some(message) = failure {
                    break Err(anyhow::anyhow!("Session ended: {}", message));
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break stop(&session).await;
            }
        }
    };

    printer.abort();
    result
}

/// Leave for good; the saved session is forgotten.
async fn leave(session: &SessionHandle) -> Result<()> {
    finish(session.leave().await).context("Failed to leave the room")
}

/// Stop without leaving; 'tablesync-cli resume' picks the room up again.
async fn stop(session: &SessionHandle) -> Result<()> {
    finish(session.shutdown().await).context("Failed to stop the session")?;
    println!("Session saved. Run 'tablesync-cli resume' to rejoin.");
    Ok(())
}

fn finish(result: Result<(), SessionError>) -> Result<(), SessionError> {
    match result {
        Ok(()) | Err(SessionError::NotJoined) | Err(SessionError::Stopped) => Ok(()),
        Err(e) => Err(e),
    }
}

fn prompt_password(prompt: &str) -> Result<String> {
    let password = rpassword::prompt_password(prompt).context("Failed to read password")?;
    Ok(password.trim().to_string())
}
