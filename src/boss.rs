//! Doctor Plastic, the rooftop boss.
//!
//! `BossBrain` holds the encounter rules: health, phase, invincibility and the attack, move and
//! volley cadence. It is driven by `tick` with an injected delta and rng, and reports what
//! happened as `BossActions`. The systems below turn those actions into entities and effects.
//!
//! Projectiles fall straight down. One that touches the player hurts; one that lands on a
//! platform becomes a short-lived collectible, and picking that up is the only way to damage
//! the boss.

use std::f32::consts::TAU;
use std::time::Duration;

use bevy::color::Alpha;
use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::audio::SoundCue;
use crate::camera::CameraEffects;
use crate::collectible::{collect_items, spawn_boss_drop, Collectible, ItemCollected, DROP_KINDS};
use crate::collision::{overlaps, CollisionMap};
use crate::effects::{
    spawn_floating_text, spawn_particle, yoyo, Blink, Bob, Lifetime, Spin, TintFlash,
};
use crate::hud::Banner;
use crate::level::{LevelEntity, ARENA_WIDTH};
use crate::movement::{Collider, Velocity};
use crate::palette;
use crate::player::{handle_player_hits, Invincible, Player, PlayerHit};
use crate::session::GameSession;
use crate::state::{GameSet, GameState};
use crate::transition::ScreenFade;

pub const BOSS_NAME: &str = "DOCTOR PLASTIC";
const BOSS_SIZE: Vec2 = Vec2::new(80.0, 100.0);
const PROJECTILE_RADIUS: f32 = 18.0;
const DEFEAT_BONUS: u32 = 1_000;
const VICTORY_DELAY_SECS: f32 = 3.0;

pub struct BossPlugin;

impl Plugin for BossPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<BossSettings>()
            .add_systems(
                Update,
                (
                    (run_boss_brain, glide_boss, shake_boss_body).in_set(GameSet::Input),
                    (
                        resolve_projectiles.before(handle_player_hits),
                        damage_boss_on_pickup.after(collect_items),
                        sink_defeated_boss,
                        count_down_to_victory,
                    )
                        .chain()
                        .in_set(GameSet::Effects),
                ),
            );
        for state in [
            GameState::Loading,
            GameState::Menu,
            GameState::GameOver,
            GameState::Victory,
        ] {
            app.add_systems(OnEnter(state), clear_victory_countdown);
        }
    }
}

/// Encounter tuning. Per-phase arrays are indexed by `phase - 1`.
#[derive(Resource, Debug, Clone)]
pub struct BossSettings {
    pub max_health: u32,
    pub attack_interval_ms: [u64; 3],
    pub move_base_ms: [u64; 3],
    pub move_jitter_ms: (u64, u64),
    pub engage_delay_secs: f32,
    pub volley_spacing_secs: f32,
    pub invincibility_secs: f32,
    pub projectile_base_speed: f32,
    pub projectile_speed_per_phase: f32,
    pub projectile_lifetime_secs: f32,
}

impl Default for BossSettings {
    fn default() -> Self {
        Self {
            max_health: 10,
            attack_interval_ms: [2_500, 1_800, 1_200],
            move_base_ms: [1_000, 800, 500],
            move_jitter_ms: (500, 1_500),
            engage_delay_secs: 3.5,
            volley_spacing_secs: 0.2,
            invincibility_secs: 0.8,
            projectile_base_speed: 180.0,
            projectile_speed_per_phase: 30.0,
            projectile_lifetime_secs: 5.0,
        }
    }
}

/// Phase for the remaining health: 7 and up is phase 1, 4..=6 phase 2, 3 and below phase 3.
pub fn phase_for_health(health: u32) -> u8 {
    match health {
        0..=3 => 3,
        4..=6 => 2,
        _ => 1,
    }
}

/// What one `BossBrain::tick` asks the world to do.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BossActions {
    pub projectiles: u8,
    pub attack_started: bool,
    pub move_now: bool,
    pub recovered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    Ignored,
    Hit { phase_changed: bool },
    Defeated,
}

#[derive(Component, Debug)]
pub struct BossBrain {
    pub health: u32,
    pub max_health: u32,
    pub phase: u8,
    pub defeated: bool,
    settings: BossSettings,
    engage: Timer,
    engaged: bool,
    attack: Timer,
    move_timer: Timer,
    volley: Timer,
    volley_remaining: u8,
    invincibility: Option<Timer>,
}

impl BossBrain {
    pub fn new(settings: &BossSettings) -> Self {
        Self {
            health: settings.max_health,
            max_health: settings.max_health,
            phase: phase_for_health(settings.max_health),
            defeated: false,
            settings: settings.clone(),
            engage: Timer::new(millis(settings.engage_delay_secs), TimerMode::Once),
            engaged: false,
            attack: Timer::default(),
            move_timer: Timer::default(),
            volley: Timer::new(millis(settings.volley_spacing_secs), TimerMode::Repeating),
            volley_remaining: 0,
            invincibility: None,
        }
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    pub fn is_invincible(&self) -> bool {
        self.invincibility.is_some()
    }

    pub fn health_percent(&self) -> f32 {
        if self.max_health == 0 {
            return 0.0;
        }
        self.health as f32 / self.max_health as f32
    }

    pub fn projectile_speed(&self) -> f32 {
        self.settings.projectile_base_speed
            + self.settings.projectile_speed_per_phase * f32::from(self.phase)
    }

    /// How long a glide to a new position takes in the current phase.
    pub fn move_duration(&self) -> Duration {
        Duration::from_millis(self.settings.move_base_ms[self.phase_index()])
    }

    fn phase_index(&self) -> usize {
        usize::from(self.phase.clamp(1, 3) - 1)
    }

    fn attack_interval(&self) -> Duration {
        Duration::from_millis(self.settings.attack_interval_ms[self.phase_index()])
    }

    fn next_move_delay(&self, rng: &mut impl Rng) -> Duration {
        let (low, high) = self.settings.move_jitter_ms;
        let base = self.settings.move_base_ms[self.phase_index()];
        Duration::from_millis(base + rng.gen_range(low..=high))
    }

    pub fn tick(&mut self, delta: Duration, rng: &mut impl Rng) -> BossActions {
        let mut actions = BossActions::default();
        if self.defeated {
            return actions;
        }

        if let Some(timer) = &mut self.invincibility {
            if timer.tick(delta).finished() {
                self.invincibility = None;
                actions.recovered = true;
            }
        }

        if !self.engaged {
            if self.engage.tick(delta).finished() {
                self.engaged = true;
                self.attack = Timer::new(self.attack_interval(), TimerMode::Once);
                self.move_timer = Timer::new(self.next_move_delay(rng), TimerMode::Once);
            }
            return actions;
        }

        // Remaining shots of a volley follow the first one at a fixed spacing.
        if self.volley_remaining > 0 {
            let due = self.volley.tick(delta).times_finished_this_tick();
            let fired = self.volley_remaining.min(due.min(u32::from(u8::MAX)) as u8);
            self.volley_remaining -= fired;
            actions.projectiles += fired;
        }

        if self.attack.tick(delta).finished() {
            actions.attack_started = true;
            actions.projectiles += 1;
            self.volley_remaining = self.phase.saturating_sub(1);
            self.volley.reset();
            self.attack = Timer::new(self.attack_interval(), TimerMode::Once);
        }

        if self.move_timer.tick(delta).finished() {
            actions.move_now = true;
            self.move_timer = Timer::new(self.next_move_delay(rng), TimerMode::Once);
        }

        actions
    }

    pub fn take_damage(&mut self) -> DamageOutcome {
        if self.defeated || self.is_invincible() {
            return DamageOutcome::Ignored;
        }

        self.health = self.health.saturating_sub(1);
        let phase = phase_for_health(self.health);
        let phase_changed = phase != self.phase;
        self.phase = phase;

        if self.health == 0 {
            self.defeated = true;
            self.volley_remaining = 0;
            return DamageOutcome::Defeated;
        }

        self.invincibility = Some(Timer::new(
            millis(self.settings.invincibility_secs),
            TimerMode::Once,
        ));
        DamageOutcome::Hit { phase_changed }
    }
}

/// Whole milliseconds, so cadence lines up with frame deltas.
fn millis(secs: f32) -> Duration {
    Duration::from_millis((secs * 1000.0).round() as u64)
}

/// Picks the next horizontal position. In the final phase the boss flees to the half of the
/// arena away from the player.
pub fn move_target(phase: u8, player_x: Option<f32>, width: f32, rng: &mut impl Rng) -> f32 {
    let min = 100.0;
    let max = width - 100.0;
    let half = width / 2.0;
    match (phase, player_x) {
        (3, Some(x)) if x < half => rng.gen_range(half..=max),
        (3, Some(_)) => rng.gen_range(min..=half),
        _ => rng.gen_range(min..=max),
    }
}

#[derive(Component)]
pub struct Boss {
    body: Entity,
}

#[derive(Component)]
struct BossBody;

#[derive(Component)]
struct BossGlide {
    from: f32,
    to: f32,
    timer: Timer,
}

#[derive(Component)]
struct BossShake {
    timer: Timer,
    amplitude: f32,
    period: f32,
}

#[derive(Component)]
struct BossSinking {
    timer: Timer,
    start: Vec2,
}

#[derive(Component)]
pub struct TrashProjectile;

#[derive(Resource)]
pub struct VictoryCountdown(Timer);

pub fn spawn_boss(commands: &mut Commands, position: Vec2, settings: &BossSettings) {
    let body = commands
        .spawn((
            Name::new("BossBody"),
            BossBody,
            SpriteBundle {
                sprite: Sprite {
                    color: palette::BOSS_PURPLE.into(),
                    custom_size: Some(BOSS_SIZE),
                    ..default()
                },
                ..default()
            },
        ))
        .with_children(|body| {
            for x in [-15.0, 15.0] {
                body.spawn(SpriteBundle {
                    sprite: Sprite {
                        color: palette::ALERT_RED.into(),
                        custom_size: Some(Vec2::splat(16.0)),
                        ..default()
                    },
                    transform: Transform::from_xyz(x, 15.0, 0.1),
                    ..default()
                });
            }
            body.spawn(SpriteBundle {
                sprite: Sprite {
                    color: Color::BLACK,
                    custom_size: Some(Vec2::new(40.0, 8.0)),
                    ..default()
                },
                transform: Transform::from_xyz(0.0, -20.0, 0.1),
                ..default()
            });
        })
        .id();

    commands
        .spawn((
            Name::new("DoctorPlastic"),
            LevelEntity,
            Boss { body },
            BossBrain::new(settings),
            SpatialBundle::from_transform(Transform::from_translation(position.extend(3.0))),
            Bob::new(position.y, 10.0, 1.5),
        ))
        .add_child(body);
}

fn shake(amplitude: f32, period: f32, seconds: f32) -> BossShake {
    BossShake {
        timer: Timer::from_seconds(seconds, TimerMode::Once),
        amplitude,
        period,
    }
}

fn run_boss_brain(
    mut commands: Commands,
    time: Res<Time>,
    mut bosses: Query<(Entity, &Boss, &Transform, &mut BossBrain)>,
    player_query: Query<&Transform, With<Player>>,
) {
    let mut rng = rand::thread_rng();
    let player_x = player_query
        .get_single()
        .ok()
        .map(|transform| transform.translation.x);

    for (entity, boss, transform, mut brain) in &mut bosses {
        let actions = brain.tick(time.delta(), &mut rng);
        if actions.recovered {
            debug!("Boss is vulnerable again ({} hp)", brain.health);
        }

        for _ in 0..actions.projectiles {
            let x = rng.gen_range(100.0..=ARENA_WIDTH - 100.0);
            let y = transform.translation.y - 60.0;
            spawn_projectile(&mut commands, Vec2::new(x, y), &brain);
        }

        if actions.attack_started {
            commands.entity(boss.body).insert((
                TintFlash::new(palette::ALERT_RED, palette::BOSS_PURPLE, 0.2),
                shake(5.0, 0.1, 0.4),
            ));
        }

        if actions.move_now {
            let to = move_target(brain.phase, player_x, ARENA_WIDTH, &mut rng);
            commands.entity(entity).insert(BossGlide {
                from: transform.translation.x,
                to,
                timer: Timer::new(brain.move_duration(), TimerMode::Once),
            });
        }
    }
}

fn spawn_projectile(commands: &mut Commands, position: Vec2, brain: &BossBrain) {
    commands.spawn((
        Name::new("TrashProjectile"),
        LevelEntity,
        TrashProjectile,
        SpriteBundle {
            sprite: Sprite {
                color: palette::TRASH_PURPLE.into(),
                custom_size: Some(Vec2::splat(PROJECTILE_RADIUS * 2.0)),
                ..default()
            },
            transform: Transform::from_translation(position.extend(5.0)),
            ..default()
        },
        Velocity(Vec2::new(0.0, -brain.projectile_speed())),
        Collider::from_size(Vec2::splat(PROJECTILE_RADIUS * 2.0)),
        Spin {
            radians_per_second: TAU,
        },
        Lifetime::new(brain.settings.projectile_lifetime_secs),
    ));
}

fn glide_boss(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut BossGlide, &mut Transform)>,
) {
    for (entity, mut glide, mut transform) in &mut query {
        glide.timer.tick(time.delta());
        // Half a yoyo is a sine ease-in-out from 0 to 1.
        let t = yoyo(glide.timer.fraction(), 1.0);
        transform.translation.x = glide.from + (glide.to - glide.from) * t;
        if glide.timer.finished() {
            commands.entity(entity).remove::<BossGlide>();
        }
    }
}

fn shake_boss_body(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut BossShake, &mut Transform), With<BossBody>>,
) {
    for (entity, mut shake, mut transform) in &mut query {
        shake.timer.tick(time.delta());
        if shake.timer.finished() {
            transform.translation.x = 0.0;
            commands.entity(entity).remove::<BossShake>();
            continue;
        }
        transform.translation.x =
            shake.amplitude * yoyo(shake.timer.elapsed_secs(), shake.period * 0.5);
    }
}

fn resolve_projectiles(
    mut commands: Commands,
    collision_map: Res<CollisionMap>,
    mut hits: EventWriter<PlayerHit>,
    projectiles: Query<(Entity, &Transform, &Collider), With<TrashProjectile>>,
    player_query: Query<(&Transform, &Collider, Has<Invincible>), With<Player>>,
) {
    let player = player_query
        .get_single()
        .ok()
        .map(|(transform, collider, invincible)| {
            (collider.bounds(transform.translation.truncate()), invincible)
        });
    let mut rng = rand::thread_rng();

    for (entity, transform, collider) in &projectiles {
        let position = transform.translation.truncate();
        if position.x < -50.0 || position.x > ARENA_WIDTH + 50.0 || position.y < -50.0 {
            commands.entity(entity).despawn_recursive();
            continue;
        }

        let bounds = collider.bounds(position);
        if let Some((player_box, false)) = player {
            if overlaps(bounds, player_box) {
                commands.entity(entity).despawn_recursive();
                hits.send(PlayerHit);
                continue;
            }
        }

        if collision_map.is_solid(bounds) {
            commands.entity(entity).despawn_recursive();
            let kind = DROP_KINDS
                .choose(&mut rng)
                .copied()
                .unwrap_or(DROP_KINDS[0]);
            spawn_boss_drop(&mut commands, position + Vec2::new(0.0, 16.0), kind);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn damage_boss_on_pickup(
    mut commands: Commands,
    time: Res<Time>,
    mut collected: EventReader<ItemCollected>,
    mut session: ResMut<GameSession>,
    mut camera: ResMut<CameraEffects>,
    mut sounds: EventWriter<SoundCue>,
    mut banners: EventWriter<Banner>,
    mut bosses: Query<(Entity, &Boss, &Transform, &mut BossBrain)>,
    leftovers: Query<Entity, Or<(With<TrashProjectile>, With<Collectible>)>>,
) {
    let Ok((entity, boss, transform, mut brain)) = bosses.get_single_mut() else {
        collected.clear();
        return;
    };
    let position = transform.translation.truncate();

    for _ in collected.read().filter(|item| item.from_boss) {
        match brain.take_damage() {
            DamageOutcome::Ignored => {}
            DamageOutcome::Hit { phase_changed } => {
                sounds.send(SoundCue::BossHit);
                commands.entity(boss.body).insert((
                    TintFlash::new(Color::WHITE, palette::BOSS_PURPLE, 0.8),
                    Blink::new(0.8),
                    shake(10.0, 0.08, 0.48),
                ));
                camera.shake(0.2, 0.015);
                spawn_floating_text(
                    &mut commands,
                    position + Vec2::new(0.0, 60.0),
                    "-1",
                    palette::ALERT_RED,
                    32.0,
                );

                if phase_changed {
                    info!("Boss entered phase {}", brain.phase);
                    match brain.phase {
                        2 => {
                            banners.send(Banner::warning("Doctor Plastic is furious!"));
                        }
                        3 => {
                            banners.send(Banner::danger("FINAL PHASE! Watch out, Carla!"));
                            camera.flash(0.3, palette::ALERT_RED);
                        }
                        _ => {}
                    }
                }
            }
            DamageOutcome::Defeated => {
                info!("Boss defeated");
                sounds.send(SoundCue::BossDefeat);
                banners.send(Banner::triumph("DOCTOR PLASTIC DEFEATED!"));
                burst_defeat_particles(&mut commands, position);

                commands
                    .entity(entity)
                    .remove::<(Bob, BossGlide)>()
                    .insert(BossSinking {
                        timer: Timer::from_seconds(2.0, TimerMode::Once),
                        start: position,
                    });

                let now_ms = time.elapsed().as_millis() as u64;
                session.add_score(DEFEAT_BONUS, now_ms);
                camera.shake(0.5, 0.02);
                camera.flash(0.5, palette::ECO_GREEN);

                // The arena is cleared of trash once the boss falls.
                for leftover in &leftovers {
                    commands.entity(leftover).despawn_recursive();
                }
                commands.insert_resource(VictoryCountdown(Timer::from_seconds(
                    VICTORY_DELAY_SECS,
                    TimerMode::Once,
                )));
                break;
            }
        }
    }
}

fn burst_defeat_particles(commands: &mut Commands, center: Vec2) {
    let colors = [
        palette::ECO_GREEN,
        palette::DEEP_GREEN,
        palette::TURQUOISE,
        palette::SUN_YELLOW,
    ];
    let mut rng = rand::thread_rng();
    for _ in 0..30 {
        let color = colors.choose(&mut rng).copied().unwrap_or(palette::ECO_GREEN);
        let origin = center + Vec2::new(rng.gen_range(-30.0..=30.0), rng.gen_range(-40.0..=40.0));
        let distance = rng.gen_range(200.0..=400.0);
        let seconds = rng.gen_range(0.8..=1.5);
        let velocity = Vec2::from_angle(rng.gen_range(0.0..TAU)) * distance / seconds;
        let size = rng.gen_range(8.0..=20.0);
        spawn_particle(commands, origin, velocity, color, size, seconds);
    }
}

fn sink_defeated_boss(
    mut commands: Commands,
    time: Res<Time>,
    mut bosses: Query<(Entity, &mut BossSinking, &mut Transform)>,
    mut sprites: Query<&mut Sprite>,
    children: Query<&Children>,
) {
    for (entity, mut sinking, mut transform) in &mut bosses {
        sinking.timer.tick(time.delta());
        if sinking.timer.finished() {
            commands.entity(entity).despawn_recursive();
            continue;
        }

        let t = sinking.timer.fraction();
        let eased = 1.0 - (1.0 - t) * (1.0 - t);
        transform.translation.x = sinking.start.x;
        transform.translation.y = sinking.start.y - 300.0 * eased;
        transform.rotation = Quat::from_rotation_z(-TAU * eased);
        transform.scale = Vec3::splat(1.0 - 0.7 * eased);

        for descendant in children.iter_descendants(entity) {
            if let Ok(mut sprite) = sprites.get_mut(descendant) {
                sprite.color.set_alpha(1.0 - eased);
            }
        }
    }
}

fn count_down_to_victory(
    mut commands: Commands,
    time: Res<Time>,
    countdown: Option<ResMut<VictoryCountdown>>,
    mut fade: ResMut<ScreenFade>,
) {
    let Some(mut countdown) = countdown else {
        return;
    };
    if countdown.0.tick(time.delta()).finished() && fade.start(GameState::Victory) {
        commands.remove_resource::<VictoryCountdown>();
    }
}

fn clear_victory_countdown(mut commands: Commands) {
    commands.remove_resource::<VictoryCountdown>();
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::collectible::{CollectibleKind, CollectiblePlugin};
    use crate::level::ActiveLevel;
    use crate::player::PlayerPlugin;

    const STEP: Duration = Duration::from_millis(100);

    fn engaged_brain(rng: &mut StdRng) -> BossBrain {
        let mut brain = BossBrain::new(&BossSettings::default());
        for _ in 0..35 {
            brain.tick(STEP, rng);
        }
        assert!(brain.is_engaged());
        brain
    }

    #[test]
    fn phase_thresholds() {
        let phases: Vec<u8> = (0..=10).map(phase_for_health).collect();
        assert_eq!(phases, vec![3, 3, 3, 3, 2, 2, 2, 1, 1, 1, 1]);
    }

    #[test]
    fn stays_idle_until_the_intro_is_over() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut brain = BossBrain::new(&BossSettings::default());
        for _ in 0..34 {
            assert_eq!(brain.tick(STEP, &mut rng), BossActions::default());
        }
        assert!(!brain.is_engaged());
        brain.tick(STEP, &mut rng);
        assert!(brain.is_engaged());
    }

    #[test]
    fn first_attack_comes_one_interval_after_engaging() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut brain = engaged_brain(&mut rng);

        let mut shots = 0;
        for _ in 0..24 {
            shots += brain.tick(STEP, &mut rng).projectiles;
        }
        assert_eq!(shots, 0);

        let actions = brain.tick(STEP, &mut rng);
        assert!(actions.attack_started);
        assert_eq!(actions.projectiles, 1);
    }

    #[test]
    fn final_phase_volleys_three_staggered_shots() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut brain = engaged_brain(&mut rng);
        brain.health = 3;
        brain.phase = 3;
        brain.attack = Timer::new(STEP, TimerMode::Once);

        let first = brain.tick(STEP, &mut rng);
        assert_eq!(first.projectiles, 1);
        assert_eq!(brain.tick(STEP, &mut rng).projectiles, 0);
        assert_eq!(brain.tick(STEP, &mut rng).projectiles, 1);
        assert_eq!(brain.tick(STEP, &mut rng).projectiles, 0);
        assert_eq!(brain.tick(STEP, &mut rng).projectiles, 1);
        assert_eq!(brain.tick(STEP, &mut rng).projectiles, 0);
    }

    #[test]
    fn attacks_speed_up_with_the_phase() {
        let settings = BossSettings::default();
        let mut brain = BossBrain::new(&settings);
        assert_eq!(brain.attack_interval(), Duration::from_millis(2_500));
        assert_eq!(brain.projectile_speed(), 210.0);

        brain.phase = 3;
        assert_eq!(brain.attack_interval(), Duration::from_millis(1_200));
        assert_eq!(brain.move_duration(), Duration::from_millis(500));
        assert_eq!(brain.projectile_speed(), 270.0);
    }

    #[test]
    fn move_delay_adds_jitter_to_the_phase_base() {
        let mut rng = StdRng::seed_from_u64(11);
        let brain = BossBrain::new(&BossSettings::default());
        for _ in 0..50 {
            let delay = brain.next_move_delay(&mut rng).as_millis();
            assert!((1_500..=2_500).contains(&delay), "delay {delay}");
        }
    }

    #[test]
    fn damage_respects_invincibility_and_announces_phases() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut brain = BossBrain::new(&BossSettings::default());

        let mut phase_changes = Vec::new();
        for _ in 0..9 {
            match brain.take_damage() {
                DamageOutcome::Hit { phase_changed } => {
                    if phase_changed {
                        phase_changes.push(brain.health);
                    }
                }
                other => panic!("unexpected {other:?}"),
            }
            assert_eq!(brain.take_damage(), DamageOutcome::Ignored);

            let mut recovered = false;
            for _ in 0..8 {
                recovered |= brain.tick(STEP, &mut rng).recovered;
            }
            assert!(recovered);
        }

        assert_eq!(phase_changes, vec![6, 3]);
        assert_eq!(brain.health, 1);
        assert_eq!(brain.take_damage(), DamageOutcome::Defeated);
        assert!(brain.defeated);
        assert_eq!(brain.take_damage(), DamageOutcome::Ignored);
        assert_eq!(brain.tick(STEP, &mut rng), BossActions::default());
        assert_eq!(brain.health_percent(), 0.0);
    }

    #[test]
    fn final_phase_moves_away_from_the_player() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let target = move_target(3, Some(150.0), ARENA_WIDTH, &mut rng);
            assert!((400.0..=700.0).contains(&target));

            let target = move_target(3, Some(650.0), ARENA_WIDTH, &mut rng);
            assert!((100.0..=400.0).contains(&target));

            let target = move_target(1, Some(650.0), ARENA_WIDTH, &mut rng);
            assert!((100.0..=700.0).contains(&target));
        }
    }

    #[test]
    fn landed_projectiles_turn_into_drops() {
        let mut app = App::new();
        let mut map = CollisionMap::default();
        map.add_solid(Rect::new(0.0, 0.0, 320.0, 32.0));
        app.insert_resource(map)
            .add_event::<PlayerHit>()
            .add_systems(Update, resolve_projectiles);

        let falling = app
            .world_mut()
            .spawn((
                TrashProjectile,
                Transform::from_xyz(200.0, 45.0, 0.0),
                Collider::from_size(Vec2::splat(36.0)),
            ))
            .id();
        let airborne = app
            .world_mut()
            .spawn((
                TrashProjectile,
                Transform::from_xyz(200.0, 300.0, 0.0),
                Collider::from_size(Vec2::splat(36.0)),
            ))
            .id();

        app.update();

        assert!(app.world().get_entity(falling).is_none());
        assert!(app.world().get_entity(airborne).is_some());

        let world = app.world_mut();
        let drops: Vec<(bool, f32)> = world
            .query::<(&Collectible, &Transform)>()
            .iter(world)
            .map(|(item, transform)| (item.from_boss, transform.translation.y))
            .collect();
        assert_eq!(drops, vec![(true, 61.0)]);
    }

    #[test]
    fn projectiles_hurt_a_vulnerable_player() {
        let mut app = App::new();
        app.init_resource::<CollisionMap>()
            .add_event::<PlayerHit>()
            .add_systems(Update, resolve_projectiles);

        app.world_mut().spawn((
            Player::default(),
            Transform::from_xyz(200.0, 100.0, 0.0),
            Collider::from_size(Vec2::new(20.0, 40.0)),
        ));
        let projectile = app
            .world_mut()
            .spawn((
                TrashProjectile,
                Transform::from_xyz(205.0, 130.0, 0.0),
                Collider::from_size(Vec2::splat(36.0)),
            ))
            .id();

        app.update();
        assert!(app.world().get_entity(projectile).is_none());
        assert_eq!(app.world().resource::<Events<PlayerHit>>().len(), 1);
    }

    fn pickup_damage_app() -> (App, Entity) {
        let mut app = App::new();
        app.init_resource::<Time>()
            .init_resource::<GameSession>()
            .init_resource::<CameraEffects>()
            .add_event::<SoundCue>()
            .add_event::<Banner>()
            .add_event::<ItemCollected>()
            .add_systems(Update, damage_boss_on_pickup);

        let body = app.world_mut().spawn(Transform::default()).id();
        let boss = app
            .world_mut()
            .spawn((
                Boss { body },
                BossBrain::new(&BossSettings::default()),
                Transform::from_xyz(400.0, 370.0, 0.0),
            ))
            .id();
        (app, boss)
    }

    fn pick_up(app: &mut App, from_boss: bool) {
        app.world_mut().send_event(ItemCollected {
            kind: CollectibleKind::Bottle,
            from_boss,
            position: Vec2::new(400.0, 60.0),
        });
        app.update();
    }

    #[test]
    fn only_boss_drops_hurt_the_boss() {
        let (mut app, boss) = pickup_damage_app();

        pick_up(&mut app, false);
        assert_eq!(app.world().get::<BossBrain>(boss).unwrap().health, 10);

        pick_up(&mut app, true);
        let brain = app.world().get::<BossBrain>(boss).unwrap();
        assert_eq!(brain.health, 9);
        assert!(brain.is_invincible());

        pick_up(&mut app, true);
        assert_eq!(app.world().get::<BossBrain>(boss).unwrap().health, 9);
        assert!(app.world().get_resource::<VictoryCountdown>().is_none());
    }

    #[test]
    fn final_drop_defeats_the_boss_and_clears_the_arena() {
        let (mut app, boss) = pickup_damage_app();
        {
            let mut brain = app.world_mut().get_mut::<BossBrain>(boss).unwrap();
            brain.health = 1;
            brain.invincibility = None;
        }
        let projectile = app
            .world_mut()
            .spawn((TrashProjectile, Transform::default()))
            .id();
        let drop = app
            .world_mut()
            .spawn((
                Collectible {
                    kind: CollectibleKind::Can,
                    from_boss: true,
                },
                Transform::default(),
            ))
            .id();

        pick_up(&mut app, true);

        let brain = app.world().get::<BossBrain>(boss).unwrap();
        assert!(brain.defeated);
        assert_eq!(brain.health, 0);
        assert!(app.world().get::<BossSinking>(boss).is_some());
        assert_eq!(app.world().resource::<GameSession>().score, DEFEAT_BONUS);
        assert!(app.world().get_resource::<VictoryCountdown>().is_some());
        assert!(app.world().get_entity(projectile).is_none());
        assert!(app.world().get_entity(drop).is_none());
    }

    #[test]
    fn victory_fades_in_three_seconds_after_the_defeat() {
        let mut app = App::new();
        app.init_resource::<Time>()
            .init_resource::<ScreenFade>()
            .insert_resource(VictoryCountdown(Timer::from_seconds(
                VICTORY_DELAY_SECS,
                TimerMode::Once,
            )))
            .add_systems(Update, count_down_to_victory);

        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_secs(2));
        app.update();
        assert_eq!(app.world().resource::<ScreenFade>().target(), None);
        assert!(app.world().get_resource::<VictoryCountdown>().is_some());

        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_secs(1));
        app.update();
        assert_eq!(
            app.world().resource::<ScreenFade>().target(),
            Some(GameState::Victory)
        );
        assert!(app.world().get_resource::<VictoryCountdown>().is_none());
    }

    #[test]
    fn a_drop_hurts_the_boss_on_the_frame_it_is_picked_up() {
        let mut app = App::new();
        app.init_resource::<Time>()
            .init_resource::<GameSession>()
            .init_resource::<CameraEffects>()
            .init_resource::<ScreenFade>()
            .init_resource::<CollisionMap>()
            .add_event::<SoundCue>()
            .add_event::<Banner>()
            .add_event::<PlayerHit>()
            .add_plugins((CollectiblePlugin, BossPlugin));

        let body = app.world_mut().spawn(Transform::default()).id();
        let boss = app
            .world_mut()
            .spawn((
                Boss { body },
                BossBrain::new(&BossSettings::default()),
                Transform::from_xyz(400.0, 370.0, 0.0),
            ))
            .id();
        app.world_mut().spawn((
            Player::default(),
            Transform::from_xyz(200.0, 60.0, 0.0),
            Collider::from_size(Vec2::new(20.0, 40.0)),
        ));
        app.world_mut().spawn((
            Collectible {
                kind: CollectibleKind::Paper,
                from_boss: true,
            },
            Transform::from_xyz(205.0, 60.0, 0.0),
        ));

        app.update();
        assert_eq!(app.world().resource::<GameSession>().items_collected, 1);
        assert_eq!(app.world().get::<BossBrain>(boss).unwrap().health, 9);
    }

    #[test]
    fn a_projectile_costs_a_life_on_the_frame_it_lands() {
        let mut app = App::new();
        app.init_resource::<Time>()
            .init_resource::<GameSession>()
            .init_resource::<CameraEffects>()
            .init_resource::<ScreenFade>()
            .init_resource::<CollisionMap>()
            .init_resource::<ActiveLevel>()
            .add_event::<SoundCue>()
            .add_event::<Banner>()
            .add_event::<ItemCollected>()
            .add_plugins((PlayerPlugin, BossPlugin));

        app.world_mut().spawn((
            Player::default(),
            Transform::from_xyz(200.0, 100.0, 0.0),
            Collider::from_size(Vec2::new(20.0, 40.0)),
            Velocity::default(),
            Visibility::default(),
        ));
        app.world_mut().spawn((
            TrashProjectile,
            Transform::from_xyz(205.0, 130.0, 0.0),
            Collider::from_size(Vec2::splat(36.0)),
        ));

        app.update();
        assert_eq!(app.world().resource::<GameSession>().lives, 2);
    }
}
