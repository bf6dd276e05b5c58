//! Short-lived visual feedback: floating score text, particle bursts, blinking, tint flashes and
//! the looping bob/glow/spin animations used by pickups, enemies and the boss.
//!
//! Each effect is a small component with its own timer. Entities spawned here carry
//! `LevelEntity`, so a level change sweeps whatever is still on screen.

use std::f32::consts::{PI, TAU};

use bevy::color::Alpha;
use bevy::prelude::*;

use crate::level::LevelEntity;
use crate::movement::Velocity;
use crate::palette;
use crate::state::GameSet;

pub struct EffectsPlugin;

impl Plugin for EffectsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                tick_lifetimes,
                animate_bob,
                animate_sway,
                animate_spin,
                animate_pop_in,
                animate_blink,
                animate_tint_flash,
                apply_opacity,
            )
                .chain()
                .in_set(GameSet::Effects),
        );
    }
}

/// Despawns the entity when the timer runs out. The last `fade_out` seconds fade to transparent;
/// `shrink` scales the entity down across the whole lifetime.
#[derive(Component)]
pub struct Lifetime {
    pub timer: Timer,
    pub fade_out: f32,
    pub shrink: bool,
}

impl Lifetime {
    pub fn new(seconds: f32) -> Self {
        Self {
            timer: Timer::from_seconds(seconds, TimerMode::Once),
            fade_out: 0.0,
            shrink: false,
        }
    }

    pub fn fading(seconds: f32, fade_out: f32) -> Self {
        Self {
            fade_out,
            ..Self::new(seconds)
        }
    }

    pub fn opacity(&self) -> f32 {
        if self.fade_out <= 0.0 {
            return 1.0;
        }
        (self.timer.remaining_secs() / self.fade_out).clamp(0.0, 1.0)
    }
}

/// Vertical yoyo around `base_y`.
#[derive(Component)]
pub struct Bob {
    pub base_y: f32,
    pub amplitude: f32,
    pub half_period: f32,
    pub elapsed: f32,
}

impl Bob {
    pub fn new(base_y: f32, amplitude: f32, half_period: f32) -> Self {
        Self {
            base_y,
            amplitude,
            half_period,
            elapsed: 0.0,
        }
    }
}

/// Rocking rotation, used by star pickups.
#[derive(Component)]
pub struct Sway {
    pub amplitude: f32,
    pub half_period: f32,
    pub elapsed: f32,
}

#[derive(Component)]
pub struct Spin {
    pub radians_per_second: f32,
}

/// Alpha pulses between 1 and `min_alpha`.
#[derive(Component)]
pub struct Glow {
    pub min_alpha: f32,
    pub half_period: f32,
    pub elapsed: f32,
}

impl Glow {
    pub fn new(min_alpha: f32, half_period: f32) -> Self {
        Self {
            min_alpha,
            half_period,
            elapsed: 0.0,
        }
    }

    pub fn opacity(&self) -> f32 {
        1.0 - (1.0 - self.min_alpha) * yoyo(self.elapsed, self.half_period)
    }
}

/// Scale from zero to full size with a slight overshoot.
#[derive(Component)]
pub struct PopIn {
    pub timer: Timer,
}

impl PopIn {
    pub fn new(seconds: f32) -> Self {
        Self {
            timer: Timer::from_seconds(seconds, TimerMode::Once),
        }
    }
}

/// Toggles visibility every `interval` until `duration` expires.
#[derive(Component)]
pub struct Blink {
    pub duration: Timer,
    pub interval: Timer,
}

impl Blink {
    pub fn new(seconds: f32) -> Self {
        Self {
            duration: Timer::from_seconds(seconds, TimerMode::Once),
            interval: Timer::from_seconds(0.1, TimerMode::Repeating),
        }
    }
}

/// Paints the sprite with `tint` until the timer ends, then restores `restore`.
#[derive(Component)]
pub struct TintFlash {
    pub tint: Color,
    pub restore: Color,
    pub timer: Timer,
}

impl TintFlash {
    pub fn new(tint: impl Into<Color>, restore: impl Into<Color>, seconds: f32) -> Self {
        Self {
            tint: tint.into(),
            restore: restore.into(),
            timer: Timer::from_seconds(seconds, TimerMode::Once),
        }
    }
}

/// 0 → 1 → 0 over two half periods, eased like a sine in/out tween.
pub fn yoyo(elapsed: f32, half_period: f32) -> f32 {
    if half_period <= 0.0 {
        return 0.0;
    }
    0.5 - 0.5 * (PI * elapsed / half_period).cos()
}

/// Back-ease-out used for pop-in animations.
pub fn ease_out_back(t: f32) -> f32 {
    let c1 = 1.70158;
    let c3 = c1 + 1.0;
    let u = t - 1.0;
    1.0 + c3 * u * u * u + c1 * u * u
}

pub fn spawn_floating_text(
    commands: &mut Commands,
    position: Vec2,
    text: impl Into<String>,
    color: impl Into<Color>,
    font_size: f32,
) {
    commands.spawn((
        Name::new("FloatingText"),
        LevelEntity,
        Text2dBundle {
            text: Text::from_section(
                text,
                TextStyle {
                    font_size,
                    color: color.into(),
                    ..default()
                },
            )
            .with_justify(JustifyText::Center),
            transform: Transform::from_translation(position.extend(8.0)),
            ..default()
        },
        // Rises 40 px while fading over 0.8 s.
        Velocity(Vec2::new(0.0, 50.0)),
        Lifetime::fading(0.8, 0.8),
    ));
}

pub fn spawn_particle(
    commands: &mut Commands,
    position: Vec2,
    velocity: Vec2,
    color: impl Into<Color>,
    size: f32,
    seconds: f32,
) {
    commands.spawn((
        Name::new("Particle"),
        LevelEntity,
        SpriteBundle {
            sprite: Sprite {
                color: color.into(),
                custom_size: Some(Vec2::splat(size)),
                ..default()
            },
            transform: Transform::from_translation(position.extend(7.0)),
            ..default()
        },
        Velocity(velocity),
        Lifetime {
            shrink: true,
            ..Lifetime::fading(seconds, seconds)
        },
    ));
}

/// Evenly spaced ring of particles flying `distance` px outwards.
pub fn spawn_burst(
    commands: &mut Commands,
    position: Vec2,
    count: usize,
    distance: f32,
    color: impl Into<Color>,
    seconds: f32,
) {
    let color = color.into();
    for i in 0..count {
        let angle = TAU / count as f32 * i as f32;
        let velocity = Vec2::from_angle(angle) * distance / seconds;
        spawn_particle(commands, position, velocity, color, 8.0, seconds);
    }
}

/// Puff under the feet when jumping.
pub fn spawn_dust(commands: &mut Commands, feet: Vec2) {
    for dx in [-1.0, 1.0] {
        spawn_particle(
            commands,
            feet - Vec2::new(0.0, 20.0),
            Vec2::new(dx * 40.0, 10.0),
            palette::SILVER.with_alpha(0.8),
            6.0,
            0.3,
        );
    }
}

fn tick_lifetimes(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut Lifetime, &mut Transform)>,
) {
    for (entity, mut lifetime, mut transform) in &mut query {
        lifetime.timer.tick(time.delta());
        if lifetime.timer.finished() {
            commands.entity(entity).despawn_recursive();
            continue;
        }
        if lifetime.shrink {
            transform.scale = Vec3::splat(1.0 - lifetime.timer.fraction());
        }
    }
}

fn animate_bob(time: Res<Time>, mut query: Query<(&mut Bob, &mut Transform)>) {
    for (mut bob, mut transform) in &mut query {
        bob.elapsed += time.delta_seconds();
        transform.translation.y = bob.base_y + bob.amplitude * yoyo(bob.elapsed, bob.half_period);
    }
}

fn animate_sway(time: Res<Time>, mut query: Query<(&mut Sway, &mut Transform)>) {
    for (mut sway, mut transform) in &mut query {
        sway.elapsed += time.delta_seconds();
        let swing = yoyo(sway.elapsed, sway.half_period) * 2.0 - 1.0;
        transform.rotation = Quat::from_rotation_z(sway.amplitude * swing);
    }
}

fn animate_spin(time: Res<Time>, mut query: Query<(&Spin, &mut Transform)>) {
    for (spin, mut transform) in &mut query {
        transform.rotate_z(spin.radians_per_second * time.delta_seconds());
    }
}

fn animate_pop_in(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut PopIn, &mut Transform)>,
) {
    for (entity, mut pop, mut transform) in &mut query {
        pop.timer.tick(time.delta());
        transform.scale = Vec3::splat(ease_out_back(pop.timer.fraction()));
        if pop.timer.finished() {
            transform.scale = Vec3::ONE;
            commands.entity(entity).remove::<PopIn>();
        }
    }
}

fn animate_blink(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut Blink, &mut Visibility)>,
) {
    for (entity, mut blink, mut visibility) in &mut query {
        blink.duration.tick(time.delta());
        if blink.duration.finished() {
            *visibility = Visibility::Inherited;
            commands.entity(entity).remove::<Blink>();
            continue;
        }

        blink.interval.tick(time.delta());
        if blink.interval.times_finished_this_tick() % 2 == 1 {
            *visibility = match *visibility {
                Visibility::Hidden => Visibility::Inherited,
                _ => Visibility::Hidden,
            };
        }
    }
}

fn animate_tint_flash(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut TintFlash, &mut Sprite)>,
) {
    for (entity, mut flash, mut sprite) in &mut query {
        flash.timer.tick(time.delta());
        if flash.timer.finished() {
            sprite.color = flash.restore;
            commands.entity(entity).remove::<TintFlash>();
        } else {
            sprite.color = flash.tint;
        }
    }
}

/// Writes the combined glow and fade-out opacity to sprites and texts.
fn apply_opacity(
    time: Res<Time>,
    mut query: Query<
        (
            Option<&mut Glow>,
            Option<&Lifetime>,
            Option<&mut Sprite>,
            Option<&mut Text>,
        ),
        Or<(With<Glow>, With<Lifetime>)>,
    >,
) {
    for (glow, lifetime, sprite, text) in &mut query {
        let mut alpha = 1.0;
        if let Some(mut glow) = glow {
            glow.elapsed += time.delta_seconds();
            alpha *= glow.opacity();
        }
        if let Some(lifetime) = lifetime {
            alpha *= lifetime.opacity();
        }

        if let Some(mut sprite) = sprite {
            sprite.color.set_alpha(alpha);
        }
        if let Some(mut text) = text {
            for section in text.sections.iter_mut() {
                section.style.color.set_alpha(alpha);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn yoyo_peaks_at_the_half_period() {
        assert!(yoyo(0.0, 1.0).abs() < 1e-6);
        assert!((yoyo(1.0, 1.0) - 1.0).abs() < 1e-6);
        assert!(yoyo(2.0, 1.0).abs() < 1e-6);
        assert!((yoyo(0.5, 1.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn pop_in_overshoots_then_settles() {
        assert!(ease_out_back(0.0).abs() < 1e-6);
        assert!(ease_out_back(0.7) > 1.0);
        assert!((ease_out_back(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn lifetime_fades_only_in_its_tail() {
        let mut lifetime = Lifetime::fading(8.0, 0.3);
        lifetime.timer.tick(Duration::from_secs_f32(7.0));
        assert_eq!(lifetime.opacity(), 1.0);
        lifetime.timer.tick(Duration::from_secs_f32(0.85));
        assert!((lifetime.opacity() - 0.5).abs() < 0.01);
    }

    #[test]
    fn glow_dims_to_its_floor() {
        let mut glow = Glow::new(0.7, 0.5);
        assert!((glow.opacity() - 1.0).abs() < 1e-6);
        glow.elapsed = 0.5;
        assert!((glow.opacity() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn expired_entities_are_despawned() {
        let mut app = App::new();
        app.init_resource::<Time>()
            .add_systems(Update, tick_lifetimes);

        let short = app
            .world_mut()
            .spawn((Lifetime::new(0.2), Transform::default()))
            .id();
        let long = app
            .world_mut()
            .spawn((Lifetime::new(2.0), Transform::default()))
            .id();

        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_millis(500));
        app.update();

        assert!(app.world().get_entity(short).is_none());
        assert!(app.world().get_entity(long).is_some());
    }

    #[test]
    fn tint_flash_restores_the_base_colour() {
        let mut app = App::new();
        app.init_resource::<Time>()
            .add_systems(Update, animate_tint_flash);

        let entity = app
            .world_mut()
            .spawn((
                Sprite::default(),
                TintFlash::new(palette::ALERT_RED, palette::HERO_BLUE, 0.1),
            ))
            .id();

        app.update();
        assert_eq!(
            app.world().get::<Sprite>(entity).map(|s| s.color),
            Some(Color::from(palette::ALERT_RED))
        );

        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_millis(150));
        app.update();
        assert_eq!(
            app.world().get::<Sprite>(entity).map(|s| s.color),
            Some(Color::from(palette::HERO_BLUE))
        );
        assert!(app.world().get::<TintFlash>(entity).is_none());
    }
}
