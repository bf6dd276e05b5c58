//! High-level plugin composition.
//!
//! The `EcoHeroPlugin` glues together all domain-specific plugins (levels, player, boss, audio,
//! screens, etc.) and sets up system ordering. Each subsystem is responsible for its own state;
//! this orchestrator merely registers them with the Bevy application.

use bevy::prelude::*;

use crate::audio::GameAudioPlugin;
use crate::boss::BossPlugin;
use crate::camera::CameraPlugin;
use crate::collectible::CollectiblePlugin;
use crate::effects::EffectsPlugin;
use crate::enemy::EnemyPlugin;
use crate::highscore::HighScorePlugin;
use crate::hud::HudPlugin;
use crate::level::LevelPlugin;
use crate::movement::MovementPlugin;
use crate::player::PlayerPlugin;
use crate::screens::ScreensPlugin;
use crate::state::{log_state_transitions, toggle_pause, GameSet, GameState};
use crate::touch::TouchControlsPlugin;
use crate::transition::TransitionPlugin;
use crate::ui::UiPlugin;

/// Bundles every gameplay-centric plugin into a single unit that can be added to the Bevy `App`.
pub struct EcoHeroPlugin;

impl Plugin for EcoHeroPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GameState>()
            .add_plugins((
                HighScorePlugin,     // Stored high score + the session resource.
                GameAudioPlugin,     // Synthesized cues and music; leaves Boot when done.
                TransitionPlugin,    // Screen fades between states.
                CameraPlugin,        // Fixed arena camera, shake and flash.
                LevelPlugin,         // Layouts, collision map, level lifecycle.
                MovementPlugin,      // Input + kinematic updates.
                PlayerPlugin,        // Damage, falls and respawns.
                EffectsPlugin,       // Floating text, particles, tweens.
                CollectiblePlugin,   // Pickups and scoring.
                EnemyPlugin,         // Trash enemies.
                BossPlugin,          // Doctor Plastic.
                HudPlugin,           // In-game HUD and banners.
                UiPlugin,            // Buttons, menu actions, pause overlay.
                ScreensPlugin,       // Intro, menu, game over, victory.
                TouchControlsPlugin, // On-screen buttons on touch devices.
            ))
            // Gameplay systems only run while `Playing`. `chain()` enforces Input → Movement →
            // Effects so component writes happen in deterministic stages.
            .configure_sets(
                Update,
                (GameSet::Input, GameSet::Movement, GameSet::Effects)
                    .chain()
                    .run_if(in_state(GameState::Playing)),
            )
            .add_systems(Update, (toggle_pause, log_state_transitions));
    }
}
