//! The hero: spawning, taking damage and falling out of the arena.
//!
//! Damage arrives as `PlayerHit` events from enemies and boss projectiles. Senders skip players
//! that are still `Invincible`, so one hit per recovery window reaches the session.

use bevy::prelude::*;

use crate::audio::SoundCue;
use crate::camera::CameraEffects;
use crate::effects::{Blink, TintFlash};
use crate::level::{ActiveLevel, LevelEntity};
use crate::movement::{Collider, Gravity, MovementState, PlayerController, Velocity};
use crate::palette;
use crate::session::GameSession;
use crate::state::{GameSet, GameState};
use crate::transition::ScreenFade;

pub const PLAYER_SIZE: Vec2 = Vec2::new(32.0, 48.0);
pub const PLAYER_COLLIDER: Vec2 = Vec2::new(20.0, 40.0);
const INVINCIBILITY_SECS: f32 = 1.5;
/// Falling this far below the arena floor counts as a fall.
const FALL_LIMIT: f32 = -50.0;

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<PlayerHit>().add_systems(
            Update,
            (tick_invincibility, handle_player_hits, check_fall)
                .chain()
                .in_set(GameSet::Effects),
        );
    }
}

#[derive(Component)]
pub struct Player {
    pub facing_right: bool,
    pub jumping: bool,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            facing_right: true,
            jumping: false,
        }
    }
}

#[derive(Component)]
pub struct Invincible(pub Timer);

/// Something hurt the player this frame.
#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerHit;

pub fn spawn_player(commands: &mut Commands, position: Vec2) {
    commands
        .spawn((
            Name::new("Player"),
            LevelEntity,
            Player::default(),
            SpriteBundle {
                sprite: Sprite {
                    color: palette::HERO_BLUE.into(),
                    custom_size: Some(PLAYER_SIZE),
                    ..default()
                },
                transform: Transform::from_translation(position.extend(4.0)),
                ..default()
            },
            Velocity::default(),
            MovementState::default(),
            PlayerController::default(),
            Collider::from_size(PLAYER_COLLIDER),
            Gravity,
        ))
        .with_children(|parent| {
            parent.spawn((
                Name::new("PlayerHead"),
                SpriteBundle {
                    sprite: Sprite {
                        color: palette::SKIN.into(),
                        custom_size: Some(Vec2::new(20.0, 14.0)),
                        ..default()
                    },
                    transform: Transform::from_xyz(0.0, 12.0, 0.1),
                    ..default()
                },
            ));
        });
}

fn tick_invincibility(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut Invincible)>,
) {
    for (entity, mut invincible) in &mut query {
        if invincible.0.tick(time.delta()).finished() {
            commands.entity(entity).remove::<Invincible>();
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn handle_player_hits(
    mut commands: Commands,
    mut hits: EventReader<PlayerHit>,
    mut session: ResMut<GameSession>,
    mut camera: ResMut<CameraEffects>,
    mut fade: ResMut<ScreenFade>,
    mut sounds: EventWriter<SoundCue>,
    mut query: Query<(Entity, &Player, &mut Velocity), Without<Invincible>>,
) {
    // Several sources may report the same frame; only one life is taken.
    if hits.read().count() == 0 {
        return;
    }

    let Ok((entity, player, mut velocity)) = query.get_single_mut() else {
        return;
    };

    let facing = if player.facing_right { 1.0 } else { -1.0 };
    velocity.0 = Vec2::new(-facing * 150.0, 200.0);

    commands.entity(entity).insert((
        Invincible(Timer::from_seconds(INVINCIBILITY_SECS, TimerMode::Once)),
        Blink::new(INVINCIBILITY_SECS),
        TintFlash::new(palette::ALERT_RED, palette::HERO_BLUE, 0.1),
    ));
    camera.shake(0.2, 0.01);
    sounds.send(SoundCue::Hit);

    let lives = session.lose_life();
    info!("Player hit, {} lives left", lives);
    if session.is_game_over() {
        sounds.send(SoundCue::Death);
        fade.start(GameState::GameOver);
    }
}

#[allow(clippy::too_many_arguments)]
fn check_fall(
    mut commands: Commands,
    level: Res<ActiveLevel>,
    mut session: ResMut<GameSession>,
    mut camera: ResMut<CameraEffects>,
    mut fade: ResMut<ScreenFade>,
    mut sounds: EventWriter<SoundCue>,
    mut query: Query<(
        Entity,
        &mut Transform,
        &mut Velocity,
        &mut Player,
        &mut Visibility,
    )>,
) {
    let Ok((entity, mut transform, mut velocity, mut player, mut visibility)) =
        query.get_single_mut()
    else {
        return;
    };
    if transform.translation.y > FALL_LIMIT || fade.is_active() {
        return;
    }

    session.lose_life();
    if session.is_game_over() {
        sounds.send(SoundCue::Death);
        fade.start(GameState::GameOver);
        return;
    }

    transform.translation = level.player_spawn.extend(transform.translation.z);
    velocity.0 = Vec2::ZERO;
    player.jumping = false;
    *visibility = Visibility::Inherited;
    commands.entity(entity).remove::<(Invincible, Blink)>();
    camera.flash(0.5, palette::ALERT_RED);
    sounds.send(SoundCue::Hit);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit_app() -> App {
        let mut app = App::new();
        app.add_plugins(bevy::state::app::StatesPlugin)
            .init_state::<GameState>()
            .init_resource::<GameSession>()
            .init_resource::<CameraEffects>()
            .init_resource::<ScreenFade>()
            .add_event::<SoundCue>()
            .add_event::<PlayerHit>()
            .add_systems(Update, handle_player_hits);
        app
    }

    #[test]
    fn a_hit_costs_one_life_and_grants_invincibility() {
        let mut app = hit_app();
        let player = app
            .world_mut()
            .spawn((Player::default(), Velocity::default(), Sprite::default()))
            .id();

        app.world_mut().send_event(PlayerHit);
        app.world_mut().send_event(PlayerHit);
        app.update();

        assert_eq!(app.world().resource::<GameSession>().lives, 2);
        assert!(app.world().get::<Invincible>(player).is_some());
        let knockback = app.world().get::<Velocity>(player).map(|v| v.0);
        assert_eq!(knockback, Some(Vec2::new(-150.0, 200.0)));

        // Still invincible: the next hit is ignored.
        app.world_mut().send_event(PlayerHit);
        app.update();
        assert_eq!(app.world().resource::<GameSession>().lives, 2);
    }

    #[test]
    fn losing_the_last_life_fades_to_game_over() {
        let mut app = hit_app();
        app.world_mut().resource_mut::<GameSession>().lives = 1;
        app.world_mut()
            .spawn((Player::default(), Velocity::default(), Sprite::default()));

        app.world_mut().send_event(PlayerHit);
        app.update();

        assert!(app.world().resource::<GameSession>().is_game_over());
        assert_eq!(
            app.world().resource::<ScreenFade>().target(),
            Some(GameState::GameOver)
        );
    }

    fn fall_app() -> App {
        let mut app = App::new();
        app.init_resource::<ActiveLevel>()
            .init_resource::<GameSession>()
            .init_resource::<CameraEffects>()
            .init_resource::<ScreenFade>()
            .add_event::<SoundCue>()
            .add_systems(Update, check_fall);
        app
    }

    fn spawn_falling_player(app: &mut App) -> Entity {
        app.world_mut()
            .spawn((
                Player {
                    jumping: true,
                    ..default()
                },
                Transform::from_xyz(300.0, -100.0, 10.0),
                Velocity(Vec2::new(50.0, -400.0)),
                Visibility::Hidden,
                Invincible(Timer::from_seconds(INVINCIBILITY_SECS, TimerMode::Once)),
            ))
            .id()
    }

    #[test]
    fn falling_out_costs_a_life_and_respawns() {
        let mut app = fall_app();
        let player = spawn_falling_player(&mut app);

        app.update();

        assert_eq!(app.world().resource::<GameSession>().lives, 2);
        let position = app.world().get::<Transform>(player).map(|t| t.translation);
        assert_eq!(position, Some(Vec3::new(60.0, 60.0, 10.0)));
        assert_eq!(
            app.world().get::<Velocity>(player).map(|v| v.0),
            Some(Vec2::ZERO)
        );
        assert_eq!(
            app.world().get::<Visibility>(player),
            Some(&Visibility::Inherited)
        );
        assert!(app.world().get::<Invincible>(player).is_none());
        assert!(app.world().resource::<ScreenFade>().target().is_none());
    }

    #[test]
    fn falling_out_on_the_last_life_ends_the_game() {
        let mut app = fall_app();
        app.world_mut().resource_mut::<GameSession>().lives = 1;
        let player = spawn_falling_player(&mut app);

        app.update();

        assert!(app.world().resource::<GameSession>().is_game_over());
        assert_eq!(
            app.world().resource::<ScreenFade>().target(),
            Some(GameState::GameOver)
        );
        let position = app.world().get::<Transform>(player).map(|t| t.translation.y);
        assert_eq!(position, Some(-100.0));

        // The fade is running, so the body below the arena is not counted twice.
        app.update();
        assert_eq!(app.world().resource::<GameSession>().lives, 0);
    }
}
