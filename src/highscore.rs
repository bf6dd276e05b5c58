//! High-score persistence. The only thing the game ever stores is one stringified integer under
//! the `ecohero_highscore` key: a small file in the user's config directory on desktop, or
//! `localStorage` in the browser. Any storage failure is logged and otherwise ignored.

use std::io;
#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;

use bevy::prelude::*;

use crate::session::GameSession;

pub const HIGH_SCORE_KEY: &str = "ecohero_highscore";

/// Loads the stored high score into the session at startup and writes it back whenever the
/// session reports an improvement.
pub struct HighScorePlugin;

impl Plugin for HighScorePlugin {
    fn build(&self, app: &mut App) {
        let store = HighScoreStore::platform_default();
        let high_score = store.load();
        info!("Loaded high score {}", high_score);

        app.insert_resource(GameSession::with_high_score(high_score))
            .insert_resource(store)
            .add_systems(Last, persist_high_score);
    }
}

#[derive(Debug, Clone)]
enum Backend {
    #[cfg(not(target_arch = "wasm32"))]
    File(PathBuf),
    #[cfg(all(target_arch = "wasm32", feature = "web"))]
    LocalStorage,
    Disabled,
}

#[derive(Resource, Debug, Clone)]
pub struct HighScoreStore {
    backend: Backend,
}

impl HighScoreStore {
    #[cfg(not(target_arch = "wasm32"))]
    pub fn platform_default() -> Self {
        match dirs::config_dir() {
            Some(dir) => Self::at_path(dir.join("ecohero").join(HIGH_SCORE_KEY)),
            None => {
                warn!("No config directory available; high scores will not be saved.");
                Self::disabled()
            }
        }
    }

    #[cfg(all(target_arch = "wasm32", feature = "web"))]
    pub fn platform_default() -> Self {
        Self {
            backend: Backend::LocalStorage,
        }
    }

    #[cfg(all(target_arch = "wasm32", not(feature = "web")))]
    pub fn platform_default() -> Self {
        Self::disabled()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::File(path.into()),
        }
    }

    pub fn disabled() -> Self {
        Self {
            backend: Backend::Disabled,
        }
    }

    /// Reads the stored value. Missing or unreadable entries count as zero.
    pub fn load(&self) -> u32 {
        self.read_raw()
            .map(|raw| parse_stored_score(&raw))
            .unwrap_or(0)
    }

    pub fn save(&self, score: u32) -> io::Result<()> {
        match &self.backend {
            #[cfg(not(target_arch = "wasm32"))]
            Backend::File(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, score.to_string())
            }
            #[cfg(all(target_arch = "wasm32", feature = "web"))]
            Backend::LocalStorage => local_storage()
                .and_then(|storage| storage.set_item(HIGH_SCORE_KEY, &score.to_string()).ok())
                .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "localStorage unavailable")),
            Backend::Disabled => Ok(()),
        }
    }

    fn read_raw(&self) -> Option<String> {
        match &self.backend {
            #[cfg(not(target_arch = "wasm32"))]
            Backend::File(path) => std::fs::read_to_string(path).ok(),
            #[cfg(all(target_arch = "wasm32", feature = "web"))]
            Backend::LocalStorage => local_storage()?.get_item(HIGH_SCORE_KEY).ok()?,
            Backend::Disabled => None,
        }
    }
}

#[cfg(all(target_arch = "wasm32", feature = "web"))]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

/// Leading whitespace is skipped and the leading run of digits is used. Anything else, including
/// a sign, reads as zero.
pub fn parse_stored_score(raw: &str) -> u32 {
    let digits: String = raw
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

fn persist_high_score(mut session: ResMut<GameSession>, store: Res<HighScoreStore>) {
    // Peek through `bypass_change_detection` so the session only looks modified when it was.
    let Some(score) = session.bypass_change_detection().take_unsaved_high_score() else {
        return;
    };

    if let Err(err) = store.save(score) {
        warn!("Unable to save high score {}: {}", score, err);
    }
}
