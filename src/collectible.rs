//! Recyclable pickups. Placed items belong to the level layout; boss drops are spawned from
//! landed projectiles and expire on their own.

use bevy::prelude::*;
use rand::Rng;
use serde::Deserialize;

use crate::audio::SoundCue;
use crate::collision::{aabb, overlaps};
use crate::effects::{
    spawn_burst, spawn_floating_text, Bob, Glow, Lifetime, PopIn, Sway,
};
use crate::hud::Banner;
use crate::level::LevelEntity;
use crate::movement::Collider;
use crate::palette;
use crate::player::Player;
use crate::session::GameSession;
use crate::state::GameSet;

pub const ITEM_SIZE: Vec2 = Vec2::new(24.0, 24.0);
/// Kinds a boss projectile can turn into.
pub const DROP_KINDS: [CollectibleKind; 3] = [
    CollectibleKind::Bottle,
    CollectibleKind::Can,
    CollectibleKind::Paper,
];
const MOTIVATION_CHANCE: f64 = 0.3;

pub struct CollectiblePlugin;

impl Plugin for CollectiblePlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ItemCollected>()
            .add_systems(Update, collect_items.in_set(GameSet::Effects));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum CollectibleKind {
    Bottle,
    Can,
    Paper,
    Battery,
    Star,
}

impl CollectibleKind {
    pub fn points(self) -> u32 {
        match self {
            CollectibleKind::Bottle | CollectibleKind::Paper => 10,
            CollectibleKind::Can => 15,
            CollectibleKind::Battery => 25,
            CollectibleKind::Star => 50,
        }
    }

    pub fn color(self) -> Srgba {
        match self {
            CollectibleKind::Bottle => palette::HERO_BLUE,
            CollectibleKind::Can => palette::CAN_GREY,
            CollectibleKind::Paper => palette::CLOUD,
            CollectibleKind::Battery => palette::ALERT_RED,
            CollectibleKind::Star => palette::SUN_YELLOW,
        }
    }
}

#[derive(Component, Debug)]
pub struct Collectible {
    pub kind: CollectibleKind,
    pub from_boss: bool,
}

/// Sent for every pickup after scoring has been applied.
#[derive(Event, Debug, Clone, Copy)]
pub struct ItemCollected {
    pub kind: CollectibleKind,
    pub from_boss: bool,
    pub position: Vec2,
}

pub fn spawn_collectible(commands: &mut Commands, position: Vec2, kind: CollectibleKind) -> Entity {
    let mut item = commands.spawn((
        Name::new(format!("{:?}", kind)),
        LevelEntity,
        Collectible {
            kind,
            from_boss: false,
        },
        SpriteBundle {
            sprite: Sprite {
                color: kind.color().into(),
                custom_size: Some(ITEM_SIZE),
                ..default()
            },
            transform: Transform::from_translation(position.extend(2.0)),
            ..default()
        },
        Bob::new(position.y, 8.0, 1.0),
        Glow::new(0.7, 0.5),
    ));
    if kind == CollectibleKind::Star {
        item.insert(Sway {
            amplitude: 15f32.to_radians(),
            half_period: 0.8,
            elapsed: 0.0,
        });
    }
    item.id()
}

/// A projectile that landed: pops in, floats, and fades away after eight seconds.
pub fn spawn_boss_drop(commands: &mut Commands, position: Vec2, kind: CollectibleKind) {
    let entity = spawn_collectible(commands, position, kind);
    commands.entity(entity).insert((
        Collectible {
            kind,
            from_boss: true,
        },
        Transform::from_translation(position.extend(2.0)).with_scale(Vec3::ZERO),
        PopIn::new(0.2),
        Bob::new(position.y, 5.0, 0.8),
        Lifetime::fading(8.3, 0.3),
    ));
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn collect_items(
    mut commands: Commands,
    time: Res<Time>,
    mut session: ResMut<GameSession>,
    mut sounds: EventWriter<SoundCue>,
    mut collected: EventWriter<ItemCollected>,
    mut banners: EventWriter<Banner>,
    player_query: Query<(&Transform, &Collider), With<Player>>,
    items: Query<(Entity, &Transform, &Collectible)>,
) {
    let Ok((player_transform, collider)) = player_query.get_single() else {
        return;
    };
    let player_box = collider.bounds(player_transform.translation.truncate());
    let now_ms = time.elapsed().as_millis() as u64;
    let mut rng = rand::thread_rng();

    for (entity, transform, item) in &items {
        let position = transform.translation.truncate();
        if !overlaps(player_box, aabb(position, ITEM_SIZE * 0.5)) {
            continue;
        }

        commands.entity(entity).despawn_recursive();

        let award = session.add_score(item.kind.points(), now_ms);
        session.collect_item();

        sounds.send(SoundCue::Collect);
        if award.multiplier > 1 {
            sounds.send(SoundCue::Combo(award.multiplier));
            spawn_floating_text(
                &mut commands,
                position,
                format!("+{} x{}", award.points, award.multiplier),
                palette::SUN_YELLOW,
                24.0,
            );
        } else {
            spawn_floating_text(
                &mut commands,
                position,
                format!("+{}", award.points),
                palette::ECO_GREEN,
                20.0,
            );
        }
        spawn_burst(&mut commands, position, 8, 40.0, item.kind.color(), 0.4);

        if item.kind == CollectibleKind::Star || rng.gen_bool(MOTIVATION_CHANCE) {
            banners.send(Banner::motivation(&mut rng));
        }

        collected.send(ItemCollected {
            kind: item.kind,
            from_boss: item.from_boss,
            position,
        });
    }
}
