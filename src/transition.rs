//! Screen fades between states. A fade darkens the screen for half its duration, switches to the
//! target state while fully black, then clears again on the new screen.

use std::time::Duration;

use bevy::prelude::*;

use crate::state::GameState;

/// Total fade length: half out, half in.
pub const FADE_SECS: f32 = 1.0;

pub struct TransitionPlugin;

impl Plugin for TransitionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ScreenFade>()
            .add_systems(Startup, spawn_fade_overlay)
            .add_systems(Update, (drive_screen_fade, update_fade_overlay).chain());
    }
}

#[derive(Resource)]
pub struct ScreenFade {
    timer: Timer,
    target: Option<GameState>,
    switched: bool,
}

impl Default for ScreenFade {
    fn default() -> Self {
        let mut timer = Timer::from_seconds(FADE_SECS, TimerMode::Once);
        timer.pause();
        Self {
            timer,
            target: None,
            switched: true,
        }
    }
}

impl ScreenFade {
    /// Begins a fade towards `target`. Returns `false` if a fade is already running, in which case
    /// the request is dropped.
    pub fn start(&mut self, target: GameState) -> bool {
        if self.is_active() {
            return false;
        }
        self.timer.reset();
        self.timer.unpause();
        self.target = Some(target);
        self.switched = false;
        true
    }

    pub fn is_active(&self) -> bool {
        self.target.is_some()
    }

    pub fn target(&self) -> Option<GameState> {
        self.target
    }

    /// 0.0 is transparent, 1.0 fully black.
    pub fn alpha(&self) -> f32 {
        if !self.is_active() {
            return 0.0;
        }
        let half = self.timer.duration().as_secs_f32() * 0.5;
        let elapsed = self.timer.elapsed_secs();
        if elapsed < half {
            elapsed / half
        } else {
            (2.0 - elapsed / half).max(0.0)
        }
    }

    /// Advances the fade. Returns the target state on the frame the midpoint is crossed.
    pub fn advance(&mut self, delta: Duration) -> Option<GameState> {
        let target = self.target?;
        self.timer.tick(delta);

        let mut switch_to = None;
        let half = self.timer.duration().as_secs_f32() * 0.5;
        if !self.switched && self.timer.elapsed_secs() >= half {
            self.switched = true;
            switch_to = Some(target);
        }

        if self.timer.finished() {
            self.target = None;
            self.timer.pause();
        }
        switch_to
    }
}

#[derive(Component)]
struct FadeOverlay;

/// Full-window black node drawn above everything else.
fn spawn_fade_overlay(mut commands: Commands) {
    commands.spawn((
        FadeOverlay,
        Name::new("FadeOverlay"),
        NodeBundle {
            style: Style {
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                ..default()
            },
            background_color: BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.0)),
            z_index: ZIndex::Global(100),
            ..default()
        },
    ));
}

fn drive_screen_fade(
    time: Res<Time>,
    mut fade: ResMut<ScreenFade>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if !fade.is_active() {
        return;
    }
    if let Some(target) = fade.advance(time.delta()) {
        info!("Fade reached {:?}", target);
        next_state.set(target);
    }
}

fn update_fade_overlay(
    fade: Res<ScreenFade>,
    mut overlay_query: Query<&mut BackgroundColor, With<FadeOverlay>>,
) {
    for mut background in &mut overlay_query {
        background.0 = Color::srgba(0.0, 0.0, 0.0, fade.alpha());
    }
}
