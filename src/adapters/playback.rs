//! Local audio playback.
//!
//! Starting playback never blocks the request: the player runs on its own
//! thread and any failure is only logged. The threads are tracked so a
//! short-lived front end can wait for them before the process exits.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Mutex, PoisonError};
use std::thread::JoinHandle;

/// Host platform, as far as playback is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Linux,
    Windows,
    Other,
}

impl Platform {
    #[must_use]
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Other
        }
    }
}

/// Candidate player invocations for `path`, tried in order.
#[must_use]
pub fn player_commands(platform: Platform, path: &Path) -> Vec<(String, Vec<String>)> {
    let file = path.to_string_lossy().to_string();
    match platform {
        Platform::MacOs => vec![("afplay".to_string(), vec![file])],
        Platform::Linux => vec![
            (
                "ffplay".to_string(),
                vec!["-nodisp".into(), "-autoexit".into(), "-loglevel".into(), "quiet".into(), file.clone()],
            ),
            ("mpg123".to_string(), vec!["-q".into(), file.clone()]),
            ("aplay".to_string(), vec![file]),
        ],
        Platform::Windows => vec![(
            "powershell".to_string(),
            vec![
                "-NoProfile".into(),
                "-Command".into(),
                format!(
                    "Add-Type -AssemblyName presentationCore; $p = New-Object System.Windows.Media.MediaPlayer; $p.Open([uri]'{}'); $p.Play(); Start-Sleep -s 1; while ($p.NaturalDuration.HasTimeSpan -and $p.Position -lt $p.NaturalDuration.TimeSpan) {{ Start-Sleep -m 200 }}",
                    file.replace('\'', "''")
                ),
            ],
        )],
        Platform::Other => Vec::new(),
    }
}

fn play_blocking(path: &Path) {
    let candidates = player_commands(Platform::current(), path);
    if candidates.is_empty() {
        tracing::warn!("Audio playback not supported on this platform");
        return;
    }

    for (program, args) in candidates {
        match Command::new(&program)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) if status.success() => return,
            Ok(status) => {
                tracing::debug!(player = %program, %status, "Player exited with failure");
            }
            Err(e) => {
                tracing::debug!(player = %program, error = %e, "Player unavailable");
            }
        }
    }
    tracing::warn!(path = %path.display(), "Error playing audio: no working player found");
}

/// Player threads started by one synthesizer.
#[derive(Debug, Default)]
pub struct Playback {
    enabled: bool,
    players: Mutex<Vec<JoinHandle<()>>>,
}

impl Playback {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            players: Mutex::new(Vec::new()),
        }
    }

    /// Start playing `path` in the background. No-op when disabled.
    pub fn start(&self, path: PathBuf) {
        if !self.enabled {
            return;
        }
        let spawned = std::thread::Builder::new()
            .name("medivox-playback".to_string())
            .spawn(move || play_blocking(&path));
        match spawned {
            Ok(handle) => self
                .players
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(handle),
            Err(e) => tracing::warn!("Could not start playback thread: {e}"),
        }
    }

    /// Block until every started player has finished.
    pub fn wait(&self) {
        let players = std::mem::take(
            &mut *self.players.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for handle in players {
            if handle.join().is_err() {
                tracing::warn!("Playback thread panicked");
            }
        }
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        self.players
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
