//! Arena camera. The view never scrolls: the camera sits on the middle of the 800×450 arena and
//! only moves while a shake is running. Full-screen flashes are drawn by a UI overlay so they
//! cover HUD and world alike.

use bevy::color::Alpha;
use bevy::prelude::*;
use bevy::render::camera::ScalingMode;
use rand::Rng;

use crate::level::{ARENA_HEIGHT, ARENA_WIDTH};

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraEffects>()
            .add_systems(Startup, (setup_camera, spawn_flash_overlay))
            .add_systems(Update, apply_camera_effects);
    }
}

/// Marker for the single 2D camera.
#[derive(Component)]
pub struct ArenaCamera;

#[derive(Component)]
struct FlashOverlay;

struct Shake {
    timer: Timer,
    intensity: f32,
}

struct Flash {
    timer: Timer,
    color: Color,
}

/// Pending camera shake and screen flash. Gameplay code requests effects here; one system
/// applies them to the camera and overlay.
#[derive(Resource, Default)]
pub struct CameraEffects {
    shake: Option<Shake>,
    flash: Option<Flash>,
}

impl CameraEffects {
    /// `intensity` is a fraction of the arena width, so 0.01 jitters up to 8 px.
    pub fn shake(&mut self, seconds: f32, intensity: f32) {
        self.shake = Some(Shake {
            timer: Timer::from_seconds(seconds, TimerMode::Once),
            intensity,
        });
    }

    pub fn flash(&mut self, seconds: f32, color: impl Into<Color>) {
        self.flash = Some(Flash {
            timer: Timer::from_seconds(seconds, TimerMode::Once),
            color: color.into(),
        });
    }

    pub fn tick(&mut self, delta: std::time::Duration) {
        if let Some(shake) = &mut self.shake {
            if shake.timer.tick(delta).finished() {
                self.shake = None;
            }
        }
        if let Some(flash) = &mut self.flash {
            if flash.timer.tick(delta).finished() {
                self.flash = None;
            }
        }
    }

    /// Maximum camera displacement in world units for the current frame.
    pub fn shake_magnitude(&self) -> f32 {
        self.shake
            .as_ref()
            .map(|shake| shake.intensity * ARENA_WIDTH)
            .unwrap_or(0.0)
    }

    /// Overlay colour, fading out as the flash runs down.
    pub fn flash_color(&self) -> Color {
        match &self.flash {
            Some(flash) => flash.color.with_alpha(1.0 - flash.timer.fraction()),
            None => Color::NONE,
        }
    }
}

pub fn arena_center() -> Vec2 {
    Vec2::new(ARENA_WIDTH * 0.5, ARENA_HEIGHT * 0.5)
}

/// The projection always shows the whole arena, letterboxed when the window's aspect differs.
fn setup_camera(mut commands: Commands) {
    let mut camera = Camera2dBundle {
        transform: Transform::from_translation(arena_center().extend(999.9)),
        ..default()
    };
    camera.projection.scaling_mode = ScalingMode::AutoMin {
        min_width: ARENA_WIDTH,
        min_height: ARENA_HEIGHT,
    };
    commands.spawn((Name::new("ArenaCamera"), ArenaCamera, camera));
}

fn spawn_flash_overlay(mut commands: Commands) {
    commands.spawn((
        Name::new("FlashOverlay"),
        FlashOverlay,
        NodeBundle {
            style: Style {
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                ..default()
            },
            background_color: BackgroundColor(Color::NONE),
            z_index: ZIndex::Global(90),
            ..default()
        },
    ));
}

fn apply_camera_effects(
    time: Res<Time>,
    mut effects: ResMut<CameraEffects>,
    mut camera: Query<&mut Transform, With<ArenaCamera>>,
    mut overlay: Query<&mut BackgroundColor, With<FlashOverlay>>,
) {
    effects.tick(time.delta());

    if let Ok(mut transform) = camera.get_single_mut() {
        let magnitude = effects.shake_magnitude();
        let offset = if magnitude > 0.0 {
            let mut rng = rand::thread_rng();
            Vec2::new(
                rng.gen_range(-1.0..=1.0) * magnitude,
                rng.gen_range(-1.0..=1.0) * magnitude,
            )
        } else {
            Vec2::ZERO
        };
        let center = arena_center() + offset;
        transform.translation.x = center.x;
        transform.translation.y = center.y;
    }

    if let Ok(mut background) = overlay.get_single_mut() {
        background.0 = effects.flash_color();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::palette;

    #[test]
    fn shake_scales_with_arena_width_and_expires() {
        let mut effects = CameraEffects::default();
        assert_eq!(effects.shake_magnitude(), 0.0);

        effects.shake(0.2, 0.01);
        assert!((effects.shake_magnitude() - 8.0).abs() < 1e-4);

        effects.tick(Duration::from_millis(250));
        assert_eq!(effects.shake_magnitude(), 0.0);
    }

    #[test]
    fn flash_fades_out() {
        let mut effects = CameraEffects::default();
        effects.flash(0.5, palette::ALERT_RED);
        assert!((effects.flash_color().alpha() - 1.0).abs() < 1e-4);

        effects.tick(Duration::from_millis(250));
        assert!((effects.flash_color().alpha() - 0.5).abs() < 1e-3);

        effects.tick(Duration::from_millis(300));
        assert_eq!(effects.flash_color(), Color::NONE);
    }
}
