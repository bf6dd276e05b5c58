//! Trash enemies. Each kind maps to one movement pattern: drifting bags, patrolling cups,
//! hopping cigarette butts and stationary toxic barrels.

use bevy::color::Alpha;
use bevy::prelude::*;
use rand::Rng;
use serde::Deserialize;

use crate::collision::overlaps;
use crate::effects::{spawn_particle, Bob};
use crate::level::{EnemySpawn, LevelEntity, ARENA_WIDTH};
use crate::movement::{Collider, Gravity, MovementState, Velocity};
use crate::palette;
use crate::player::{handle_player_hits, Invincible, Player, PlayerHit};
use crate::state::GameSet;

const ENEMY_SIZE: Vec2 = Vec2::new(32.0, 32.0);
const ENEMY_HITBOX: Vec2 = Vec2::new(24.0, 24.0);
const DEFAULT_PATROL_REACH: f32 = 80.0;
/// Drifters leaving on the left re-enter past the right edge.
const WRAP_LEFT: f32 = -50.0;
const WRAP_RIGHT: f32 = ARENA_WIDTH + 50.0;

pub struct EnemyPlugin;

impl Plugin for EnemyPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (steer_walkers, hop_cigarettes).in_set(GameSet::Input),
        )
        .add_systems(
            Update,
            (
                wrap_drifters,
                emit_toxic_fumes,
                damage_on_contact.before(handle_player_hits),
            )
                .in_set(GameSet::Effects),
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum EnemyKind {
    PlasticBag,
    Cup,
    Cigarette,
    Toxic,
}

impl EnemyKind {
    pub fn speed(self) -> f32 {
        match self {
            EnemyKind::PlasticBag => 30.0,
            EnemyKind::Cup => 60.0,
            EnemyKind::Cigarette => 100.0,
            EnemyKind::Toxic => 0.0,
        }
    }

    fn color(self) -> Srgba {
        match self {
            EnemyKind::PlasticBag => palette::CLOUD,
            EnemyKind::Cup => palette::CUP_ORANGE,
            EnemyKind::Cigarette => palette::ORANGE,
            EnemyKind::Toxic => palette::TOXIC_GREEN,
        }
    }
}

#[derive(Component, Debug)]
pub struct Enemy {
    pub kind: EnemyKind,
}

/// Horizontal walker that turns around at walls and, optionally, at patrol bounds.
#[derive(Component, Debug)]
struct Walker {
    speed: f32,
    bounds: Option<(f32, f32)>,
}

#[derive(Component)]
struct Hopper(Timer);

#[derive(Component)]
struct ToxicFumes(Timer);

pub fn spawn_enemy(commands: &mut Commands, spawn: &EnemySpawn, rng: &mut impl Rng) {
    let position = Vec2::new(spawn.x, spawn.y);
    let kind = spawn.kind;
    let mut enemy = commands.spawn((
        Name::new(format!("{:?}", kind)),
        LevelEntity,
        Enemy { kind },
        SpriteBundle {
            sprite: Sprite {
                color: kind.color().into(),
                custom_size: Some(ENEMY_SIZE),
                ..default()
            },
            transform: Transform::from_translation(position.extend(3.0)),
            ..default()
        },
        Collider::from_size(ENEMY_HITBOX),
    ));

    match kind {
        EnemyKind::PlasticBag => {
            enemy.insert((
                Velocity(Vec2::new(-kind.speed(), 0.0)),
                Bob::new(position.y, 30.0, 2.0),
            ));
        }
        EnemyKind::Cup => {
            let bounds = spawn.patrol.unwrap_or((
                position.x - DEFAULT_PATROL_REACH,
                position.x + DEFAULT_PATROL_REACH,
            ));
            enemy.insert((
                Velocity(Vec2::new(kind.speed(), 0.0)),
                MovementState::default(),
                Gravity,
                Walker {
                    speed: kind.speed(),
                    bounds: Some(bounds),
                },
            ));
        }
        EnemyKind::Cigarette => {
            let direction = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            let delay = rng.gen_range(1.5..=3.0);
            enemy.insert((
                Velocity(Vec2::new(direction * kind.speed(), 0.0)),
                MovementState::default(),
                Gravity,
                Walker {
                    speed: kind.speed(),
                    bounds: None,
                },
                Hopper(Timer::from_seconds(delay, TimerMode::Repeating)),
            ));
        }
        EnemyKind::Toxic => {
            enemy.insert(ToxicFumes(Timer::from_seconds(0.5, TimerMode::Repeating)));
        }
    }
}

/// New horizontal velocity for a walker after this frame's contacts.
fn walker_velocity(walker: &Walker, x: f32, vx: f32, state: &MovementState) -> f32 {
    if state.blocked_left {
        return walker.speed;
    }
    if state.blocked_right {
        return -walker.speed;
    }
    match walker.bounds {
        Some((min, _)) if x <= min => walker.speed,
        Some((_, max)) if x >= max => -walker.speed,
        _ if vx == 0.0 => walker.speed,
        _ => vx,
    }
}

fn wrapped_x(x: f32) -> f32 {
    if x < WRAP_LEFT {
        WRAP_RIGHT
    } else {
        x
    }
}

fn steer_walkers(
    mut query: Query<(&Walker, &Transform, &MovementState, &mut Velocity, &mut Sprite)>,
) {
    for (walker, transform, state, mut velocity, mut sprite) in &mut query {
        velocity.x = walker_velocity(walker, transform.translation.x, velocity.x, state);
        sprite.flip_x = velocity.x < 0.0;
    }
}

fn hop_cigarettes(
    time: Res<Time>,
    mut query: Query<(&mut Hopper, &MovementState, &mut Velocity)>,
) {
    for (mut hopper, state, mut velocity) in &mut query {
        if hopper.0.tick(time.delta()).just_finished() && state.on_ground {
            velocity.y = 200.0;
        }
    }
}

fn wrap_drifters(mut query: Query<&mut Transform, (With<Enemy>, With<Bob>)>) {
    for mut transform in &mut query {
        transform.translation.x = wrapped_x(transform.translation.x);
    }
}

fn emit_toxic_fumes(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(&mut ToxicFumes, &Transform)>,
) {
    let mut rng = rand::thread_rng();
    for (mut fumes, transform) in &mut query {
        if !fumes.0.tick(time.delta()).just_finished() {
            continue;
        }
        let origin = transform.translation.truncate()
            + Vec2::new(rng.gen_range(-15.0..=15.0), 10.0);
        spawn_particle(
            &mut commands,
            origin,
            Vec2::new(0.0, 37.5),
            palette::TOXIC_GREEN.with_alpha(0.6),
            8.0,
            0.8,
        );
    }
}

fn damage_on_contact(
    mut hits: EventWriter<PlayerHit>,
    player_query: Query<(&Transform, &Collider), (With<Player>, Without<Invincible>)>,
    enemies: Query<(&Transform, &Collider), With<Enemy>>,
) {
    let Ok((player_transform, player_collider)) = player_query.get_single() else {
        return;
    };
    let player_box = player_collider.bounds(player_transform.translation.truncate());

    let touching = enemies.iter().any(|(transform, collider)| {
        overlaps(player_box, collider.bounds(transform.translation.truncate()))
    });
    if touching {
        hits.send(PlayerHit);
    }
}
