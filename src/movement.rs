use bevy::input::keyboard::KeyCode;
use bevy::prelude::*;

use crate::audio::SoundCue;
use crate::collision::{aabb, CollisionMap};
use crate::effects::spawn_dust;
use crate::level::{LevelEntity, ARENA_WIDTH};
use crate::player::Player;
use crate::state::{GameSet, GameState};
use crate::touch::{track_touch_buttons, OnScreenInput};

pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MovementSettings>().add_systems(
            Update,
            (
                read_player_input
                    .after(track_touch_buttons)
                    .in_set(GameSet::Input),
                (apply_kinematics, drift_free_bodies).in_set(GameSet::Movement),
            )
                .run_if(in_state(GameState::Playing)),
        );
    }
}

#[derive(Resource)]
pub struct MovementSettings {
    pub gravity: f32,
    pub terminal_velocity: f32,
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self {
            gravity: 800.0,
            terminal_velocity: -900.0,
        }
    }
}

#[derive(Component, Default, Deref, DerefMut)]
pub struct Velocity(pub Vec2);

/// Bodies carrying this marker are pulled down by `MovementSettings::gravity`.
#[derive(Component)]
pub struct Gravity;

#[derive(Component)]
pub struct PlayerController {
    pub speed: f32,
    pub jump_strength: f32,
    pub drag: f32,
}

impl Default for PlayerController {
    fn default() -> Self {
        Self {
            speed: 200.0,
            jump_strength: 380.0,
            drag: 800.0,
        }
    }
}

/// Contact flags written by the kinematics pass each frame.
#[derive(Component, Default)]
pub struct MovementState {
    pub on_ground: bool,
    pub blocked_left: bool,
    pub blocked_right: bool,
}

#[derive(Component, Copy, Clone)]
pub struct Collider {
    pub half_extents: Vec2,
}

impl Collider {
    pub fn from_size(size: Vec2) -> Self {
        Self {
            half_extents: size * 0.5,
        }
    }

    pub fn bounds(&self, center: Vec2) -> Rect {
        aabb(center, self.half_extents)
    }
}

fn read_player_input(
    mut commands: Commands,
    time: Res<Time>,
    keyboard: Res<ButtonInput<KeyCode>>,
    touch: Res<OnScreenInput>,
    mut sounds: EventWriter<SoundCue>,
    mut query: Query<(
        &Transform,
        &PlayerController,
        &mut Player,
        &mut Velocity,
        &MovementState,
        &mut Sprite,
    )>,
) {
    let dt = time.delta_seconds();

    for (transform, controller, mut player, mut velocity, state, mut sprite) in &mut query {
        let left = touch.left || keyboard.any_pressed([KeyCode::KeyA, KeyCode::ArrowLeft]);
        let right = touch.right || keyboard.any_pressed([KeyCode::KeyD, KeyCode::ArrowRight]);

        if left {
            velocity.x = -controller.speed;
            player.facing_right = false;
        } else if right {
            velocity.x = controller.speed;
            player.facing_right = true;
        } else {
            // Drag eases the body to a halt instead of stopping dead.
            let slowed = velocity.x.abs() - controller.drag * dt;
            velocity.x = velocity.x.signum() * slowed.max(0.0);
        }
        sprite.flip_x = !player.facing_right;

        if state.on_ground && player.jumping && velocity.y <= 0.0 {
            player.jumping = false;
        }

        let wants_jump = touch.jump
            || keyboard.any_pressed([KeyCode::ArrowUp, KeyCode::KeyW, KeyCode::Space]);
        if wants_jump && state.on_ground && !player.jumping {
            velocity.y = controller.jump_strength;
            player.jumping = true;
            sounds.send(SoundCue::Jump);
            spawn_dust(&mut commands, transform.translation.truncate());
        }
    }
}

fn apply_kinematics(
    time: Res<Time>,
    settings: Res<MovementSettings>,
    collision_map: Res<CollisionMap>,
    mut query: Query<(
        &mut Transform,
        &mut Velocity,
        &mut MovementState,
        &Collider,
        Has<Gravity>,
    )>,
) {
    let dt = time.delta_seconds();

    for (mut transform, mut velocity, mut state, collider, has_gravity) in &mut query {
        if has_gravity {
            // Gravity is applied even while grounded so resting bodies keep pressing into the
            // floor and the vertical sweep re-detects it every frame.
            velocity.y -= settings.gravity * dt;
            if velocity.y < settings.terminal_velocity {
                velocity.y = settings.terminal_velocity;
            }
        }

        let mut position = transform.translation;
        let half = collider.half_extents;

        let horizontal =
            resolve_horizontal(&mut position, &mut velocity.x, half, dt, &collision_map);
        let vertical = resolve_vertical(&mut position, &mut velocity.y, half, dt, &collision_map);

        let mut blocked_left = horizontal.left;
        let mut blocked_right = horizontal.right;

        // The arena walls stop bodies sideways; the floor is open so gaps stay deadly.
        if position.x - half.x < 0.0 {
            position.x = half.x;
            blocked_left = true;
            velocity.x = velocity.x.max(0.0);
        } else if position.x + half.x > ARENA_WIDTH {
            position.x = ARENA_WIDTH - half.x;
            blocked_right = true;
            velocity.x = velocity.x.min(0.0);
        }

        state.on_ground = vertical.down;
        state.blocked_left = blocked_left;
        state.blocked_right = blocked_right;

        transform.translation = position;
    }
}

/// Gravity-free bodies (floating enemies, falling trash) just integrate their velocity.
fn drift_free_bodies(
    time: Res<Time>,
    mut query: Query<(&mut Transform, &Velocity), (Without<MovementState>, With<LevelEntity>)>,
) {
    let dt = time.delta_seconds();
    for (mut transform, velocity) in &mut query {
        transform.translation += velocity.extend(0.0) * dt;
    }
}

#[derive(Debug, Default, PartialEq)]
struct HorizontalCollision {
    left: bool,
    right: bool,
}

#[derive(Debug, Default, PartialEq)]
struct VerticalCollision {
    down: bool,
    up: bool,
}

const SKIN: f32 = 0.001;

fn resolve_horizontal(
    position: &mut Vec3,
    velocity: &mut f32,
    half: Vec2,
    dt: f32,
    map: &CollisionMap,
) -> HorizontalCollision {
    let mut collision = HorizontalCollision::default();
    if velocity.abs() < f32::EPSILON {
        return collision;
    }

    let new_x = position.x + *velocity * dt;
    // Shrink vertically so the floor we stand on is not mistaken for a wall.
    let probe = aabb(
        Vec2::new(new_x, position.y),
        Vec2::new(half.x, half.y - SKIN * 2.0),
    );

    if *velocity > 0.0 {
        if let Some(wall) = map
            .overlapping(probe)
            .map(|solid| solid.min.x)
            .min_by(f32::total_cmp)
        {
            position.x = wall - half.x - SKIN;
            *velocity = 0.0;
            collision.right = true;
            return collision;
        }
    } else if let Some(wall) = map
        .overlapping(probe)
        .map(|solid| solid.max.x)
        .max_by(f32::total_cmp)
    {
        position.x = wall + half.x + SKIN;
        *velocity = 0.0;
        collision.left = true;
        return collision;
    }

    position.x = new_x;
    collision
}

fn resolve_vertical(
    position: &mut Vec3,
    velocity: &mut f32,
    half: Vec2,
    dt: f32,
    map: &CollisionMap,
) -> VerticalCollision {
    let mut collision = VerticalCollision::default();
    if velocity.abs() < f32::EPSILON {
        return collision;
    }

    let new_y = position.y + *velocity * dt;
    let probe = aabb(
        Vec2::new(position.x, new_y),
        Vec2::new(half.x - SKIN * 2.0, half.y),
    );

    if *velocity < 0.0 {
        if let Some(floor) = map
            .overlapping(probe)
            .map(|solid| solid.max.y)
            .max_by(f32::total_cmp)
        {
            position.y = floor + half.y + SKIN;
            *velocity = 0.0;
            collision.down = true;
            return collision;
        }
    } else if let Some(ceiling) = map
        .overlapping(probe)
        .map(|solid| solid.min.y)
        .min_by(f32::total_cmp)
    {
        position.y = ceiling - half.y - SKIN;
        *velocity = 0.0;
        collision.up = true;
        return collision;
    }

    position.y = new_y;
    collision
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor_map() -> CollisionMap {
        let mut map = CollisionMap::default();
        map.add_solid(Rect::new(0.0, 0.0, 320.0, 32.0));
        map.add_solid(Rect::new(200.0, 32.0, 264.0, 96.0));
        map
    }

    #[test]
    fn falling_body_lands_on_the_platform_top() {
        let map = floor_map();
        let half = Vec2::new(10.0, 20.0);
        let mut position = Vec3::new(50.0, 55.0, 0.0);
        let mut velocity = -600.0;

        let hit = resolve_vertical(&mut position, &mut velocity, half, 1.0 / 60.0, &map);
        assert!(hit.down);
        assert_eq!(velocity, 0.0);
        assert!((position.y - (32.0 + half.y)).abs() < 0.01);
    }

    #[test]
    fn free_fall_over_a_gap_is_not_blocked() {
        let map = floor_map();
        let mut position = Vec3::new(400.0, 55.0, 0.0);
        let mut velocity = -600.0;

        let hit = resolve_vertical(&mut position, &mut velocity, Vec2::splat(10.0), 0.1, &map);
        assert_eq!(hit, VerticalCollision::default());
        assert!((position.y - -5.0).abs() < 0.01);
    }

    #[test]
    fn walls_stop_horizontal_motion() {
        let map = floor_map();
        let half = Vec2::new(10.0, 20.0);
        let mut position = Vec3::new(185.0, 52.01, 0.0);
        let mut velocity = 200.0;

        let hit = resolve_horizontal(&mut position, &mut velocity, half, 0.1, &map);
        assert!(hit.right);
        assert_eq!(velocity, 0.0);
        assert!(position.x < 200.0 - half.x + 0.01);
    }

    #[test]
    fn standing_on_a_floor_does_not_count_as_a_wall() {
        let map = floor_map();
        let half = Vec2::new(10.0, 20.0);
        let mut position = Vec3::new(50.0, 32.0 + half.y + SKIN, 0.0);
        let mut velocity = 200.0;

        let hit = resolve_horizontal(&mut position, &mut velocity, half, 0.1, &map);
        assert_eq!(hit, HorizontalCollision::default());
        assert!((position.x - 70.0).abs() < 0.01);
    }

    #[test]
    fn on_screen_buttons_steer_and_jump() {
        let mut app = App::new();
        app.init_resource::<Time>()
            .init_resource::<ButtonInput<KeyCode>>()
            .insert_resource(OnScreenInput {
                left: true,
                ..default()
            })
            .add_event::<SoundCue>()
            .add_systems(Update, read_player_input);

        let player = app
            .world_mut()
            .spawn((
                Transform::from_xyz(100.0, 48.0, 0.0),
                PlayerController::default(),
                Player::default(),
                Velocity::default(),
                MovementState {
                    on_ground: true,
                    ..default()
                },
                Sprite::default(),
            ))
            .id();

        app.update();
        assert_eq!(app.world().get::<Velocity>(player).map(|v| v.0.x), Some(-200.0));
        assert_eq!(app.world().get::<Sprite>(player).map(|s| s.flip_x), Some(true));
        assert!(app.world().resource::<Events<SoundCue>>().is_empty());

        *app.world_mut().resource_mut::<OnScreenInput>() = OnScreenInput {
            jump: true,
            ..default()
        };
        app.update();
        assert_eq!(app.world().get::<Velocity>(player).map(|v| v.0.y), Some(380.0));
        assert!(app.world().get::<Player>(player).is_some_and(|p| p.jumping));
        assert!(!app.world().resource::<Events<SoundCue>>().is_empty());
    }
}
