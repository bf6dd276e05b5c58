//! Level layouts and lifecycle: parses the bundled RON layouts, builds the collision map and
//! spawns every level entity when entering `Loading`, and detects when a level is cleared.
//!
//! Everything a level spawns carries `LevelEntity`, so tearing a level down is a single query.
//! Layout data lives in `assets/levels/` and is compiled into the binary, which keeps loading
//! synchronous on both desktop and the web.

use std::fmt;

use bevy::math::Rect;
use bevy::prelude::*;
use serde::Deserialize;

use crate::audio::SoundCue;
use crate::boss::{spawn_boss, BossSettings};
use crate::collectible::{spawn_collectible, CollectibleKind};
use crate::collision::CollisionMap;
use crate::enemy::{spawn_enemy, EnemyKind};
use crate::hud::Banner;
use crate::palette;
use crate::player::spawn_player;
use crate::session::GameSession;
use crate::state::{GameSet, GameState};
use crate::transition::ScreenFade;

pub const ARENA_WIDTH: f32 = 800.0;
pub const ARENA_HEIGHT: f32 = 450.0;
pub const LAST_LEVEL: u8 = 3;

/// Registers the level lifecycle. `OnEnter(Loading)` runs `Cleanup` before `Spawn`; other plugins
/// add their per-level entities to `Spawn`.
pub struct LevelPlugin;

impl Plugin for LevelPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(LevelConfig::default())
            .init_resource::<ActiveLevel>()
            .init_resource::<CollisionMap>()
            .configure_sets(
                OnEnter(GameState::Loading),
                (LevelSystems::Cleanup, LevelSystems::Spawn).chain(),
            )
            .add_systems(
                OnEnter(GameState::Loading),
                (
                    despawn_level.in_set(LevelSystems::Cleanup),
                    spawn_level.in_set(LevelSystems::Spawn),
                ),
            )
            .add_systems(Update, check_level_cleared.in_set(GameSet::Effects));

        for state in [GameState::Menu, GameState::GameOver, GameState::Victory] {
            app.add_systems(OnEnter(state), despawn_level);
        }
    }
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum LevelSystems {
    Cleanup,
    Spawn,
}

/// Tuning shared by level building and the menu.
#[derive(Resource, Clone)]
pub struct LevelConfig {
    /// Platforms are drawn as a row of tiles of this size.
    pub tile_size: Vec2,
    /// Level a new game starts on.
    pub first_level: u8,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            tile_size: Vec2::new(64.0, 32.0),
            first_level: 1,
        }
    }
}

/// Marker for anything that belongs to the level currently loaded.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct LevelEntity;

/// Metadata of the level that is loaded right now.
#[derive(Resource, Debug, Clone)]
pub struct ActiveLevel {
    pub number: u8,
    pub name: String,
    pub player_spawn: Vec2,
    pub has_boss: bool,
    /// Set once the level is cleared; the next `Loading` advances to the following level.
    pub cleared: bool,
}

impl Default for ActiveLevel {
    fn default() -> Self {
        Self {
            number: 1,
            name: String::new(),
            player_spawn: Vec2::new(60.0, 60.0),
            has_boss: false,
            cleared: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LevelTheme {
    Canteen,
    Garden,
    Rooftop,
}

impl LevelTheme {
    pub fn backdrop(self) -> Srgba {
        match self {
            LevelTheme::Canteen => palette::CANTEEN_BACKDROP,
            LevelTheme::Garden => palette::GARDEN_BACKDROP,
            LevelTheme::Rooftop => palette::ROOFTOP_BACKDROP,
        }
    }

    fn platform(self) -> Srgba {
        match self {
            LevelTheme::Canteen => palette::SLATE,
            LevelTheme::Garden => palette::BRICK,
            LevelTheme::Rooftop => palette::ASBESTOS,
        }
    }

    fn edge(self) -> Srgba {
        match self {
            LevelTheme::Canteen => palette::SILVER,
            LevelTheme::Garden => palette::ECO_GREEN,
            LevelTheme::Rooftop => palette::SUN_YELLOW,
        }
    }
}

/// A solid strip. `x` is the left edge, `y` the centre line.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PlatformSpec {
    pub x: f32,
    pub y: f32,
    pub width: f32,
}

impl PlatformSpec {
    pub fn rect(&self, height: f32) -> Rect {
        Rect::new(
            self.x,
            self.y - height * 0.5,
            self.x + self.width,
            self.y + height * 0.5,
        )
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CollectibleSpawn {
    pub x: f32,
    pub y: f32,
    pub kind: CollectibleKind,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct EnemySpawn {
    pub x: f32,
    pub y: f32,
    pub kind: EnemyKind,
    /// Horizontal walking range for patrolling enemies.
    #[serde(default)]
    pub patrol: Option<(f32, f32)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LevelLayout {
    pub name: String,
    pub theme: LevelTheme,
    pub player_spawn: (f32, f32),
    pub platforms: Vec<PlatformSpec>,
    #[serde(default)]
    pub collectibles: Vec<CollectibleSpawn>,
    #[serde(default)]
    pub enemies: Vec<EnemySpawn>,
    #[serde(default)]
    pub boss: Option<(f32, f32)>,
    /// Overrides the item target when items also come from elsewhere (boss drops).
    #[serde(default)]
    pub total_items: Option<u32>,
}

impl LevelLayout {
    pub fn total_items(&self) -> u32 {
        self.total_items
            .unwrap_or(self.collectibles.len() as u32)
    }
}

#[derive(Debug)]
pub enum LayoutError {
    Unknown(u8),
    Parse(u8, ron::error::SpannedError),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::Unknown(number) => write!(f, "no layout for level {}", number),
            LayoutError::Parse(number, err) => {
                write!(f, "level {} layout is malformed: {}", number, err)
            }
        }
    }
}

impl std::error::Error for LayoutError {}

fn layout_source(number: u8) -> Option<&'static str> {
    match number {
        1 => Some(include_str!("../assets/levels/level1.ron")),
        2 => Some(include_str!("../assets/levels/level2.ron")),
        3 => Some(include_str!("../assets/levels/level3.ron")),
        _ => None,
    }
}

pub fn load_layout(number: u8) -> Result<LevelLayout, LayoutError> {
    let source = layout_source(number).ok_or(LayoutError::Unknown(number))?;
    ron::from_str(source).map_err(|err| LayoutError::Parse(number, err))
}

fn despawn_level(
    mut commands: Commands,
    entities: Query<Entity, With<LevelEntity>>,
    mut collision_map: ResMut<CollisionMap>,
) {
    for entity in &entities {
        // Children (boss body, heads, HUD nodes) go with their parents.
        commands.entity(entity).despawn_recursive();
    }
    collision_map.clear();
}

#[allow(clippy::too_many_arguments)]
fn spawn_level(
    mut commands: Commands,
    config: Res<LevelConfig>,
    boss_settings: Res<BossSettings>,
    mut session: ResMut<GameSession>,
    mut active: ResMut<ActiveLevel>,
    mut collision_map: ResMut<CollisionMap>,
    mut banners: EventWriter<Banner>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if session.is_game_over() {
        next_state.set(GameState::GameOver);
        return;
    }

    let number = if active.cleared {
        session.next_level()
    } else {
        session.current_level
    };

    let layout = match load_layout(number) {
        Ok(layout) => layout,
        Err(err) => {
            error!("Unable to build level: {}", err);
            next_state.set(GameState::Menu);
            return;
        }
    };

    session.begin_level(number, layout.total_items());
    *active = ActiveLevel {
        number,
        name: layout.name.clone(),
        player_spawn: Vec2::from(layout.player_spawn),
        has_boss: layout.boss.is_some(),
        cleared: false,
    };

    commands.spawn((
        Name::new("Backdrop"),
        LevelEntity,
        SpriteBundle {
            sprite: Sprite {
                color: layout.theme.backdrop().into(),
                custom_size: Some(Vec2::new(ARENA_WIDTH, ARENA_HEIGHT)),
                ..default()
            },
            transform: Transform::from_xyz(ARENA_WIDTH * 0.5, ARENA_HEIGHT * 0.5, -10.0),
            ..default()
        },
    ));

    for platform in &layout.platforms {
        let rect = platform.rect(config.tile_size.y);
        collision_map.add_solid(rect);
        spawn_platform(&mut commands, rect, config.tile_size.x, layout.theme);
    }

    for item in &layout.collectibles {
        spawn_collectible(&mut commands, Vec2::new(item.x, item.y), item.kind);
    }

    let mut rng = rand::thread_rng();
    for enemy in &layout.enemies {
        spawn_enemy(&mut commands, enemy, &mut rng);
    }

    if let Some(boss) = layout.boss {
        spawn_boss(&mut commands, Vec2::from(boss), &boss_settings);
    }

    spawn_player(&mut commands, active.player_spawn);

    info!(
        "Loaded level {} '{}': {} platforms, {} items, {} enemies",
        number,
        layout.name,
        layout.platforms.len(),
        layout.total_items(),
        layout.enemies.len()
    );
    banners.send(Banner::title(format!("Level {}: {}", number, layout.name)));
    next_state.set(GameState::Playing);
}

/// Draws a platform as a row of tiles with a lighter top edge. The last tile is cut to fit.
fn spawn_platform(commands: &mut Commands, rect: Rect, tile_width: f32, theme: LevelTheme) {
    let height = rect.height();
    let mut left = rect.min.x;
    let mut index = 0;
    while left < rect.max.x {
        let width = tile_width.min(rect.max.x - left);
        let shade = if index % 2 == 0 { 1.0 } else { 0.9 };
        let base = theme.platform();
        let color = Color::srgb(base.red * shade, base.green * shade, base.blue * shade);

        commands
            .spawn((
                Name::new("Tile"),
                LevelEntity,
                SpriteBundle {
                    sprite: Sprite {
                        color,
                        custom_size: Some(Vec2::new(width, height)),
                        ..default()
                    },
                    transform: Transform::from_xyz(left + width * 0.5, rect.center().y, 1.0),
                    ..default()
                },
            ))
            .with_children(|tile| {
                tile.spawn(SpriteBundle {
                    sprite: Sprite {
                        color: theme.edge().into(),
                        custom_size: Some(Vec2::new(width, 4.0)),
                        ..default()
                    },
                    transform: Transform::from_xyz(0.0, height * 0.5 - 2.0, 0.1),
                    ..default()
                });
            });

        left += width;
        index += 1;
    }
}

/// Item levels end once every placed item is collected. Boss levels end through the victory
/// countdown instead.
fn check_level_cleared(
    mut active: ResMut<ActiveLevel>,
    mut session: ResMut<GameSession>,
    mut fade: ResMut<ScreenFade>,
    mut sounds: EventWriter<SoundCue>,
    mut banners: EventWriter<Banner>,
) {
    if active.cleared || active.has_boss || fade.is_active() {
        return;
    }
    if session.total_items == 0 || session.items_collected < session.total_items {
        return;
    }
    if session.current_level >= LAST_LEVEL {
        return;
    }

    active.cleared = true;
    let lives = session.gain_life();
    info!("Level {} cleared, {} lives", active.number, lives);
    sounds.send(SoundCue::LevelComplete);
    banners.send(Banner::triumph("LEVEL COMPLETE! +1 life"));
    fade.start(GameState::Loading);
}
