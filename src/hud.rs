//! In-game heads-up display and transient banners.
//!
//! The HUD is rebuilt with every level (it carries `LevelEntity`) and reads `GameSession` each
//! frame. Banners are requested through the `Banner` event by any gameplay system.

use bevy::color::Alpha;
use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::boss::{Boss, BossBrain, BOSS_NAME};
use crate::effects::Lifetime;
use crate::level::{LevelEntity, LevelSystems};
use crate::palette;
use crate::session::{GameSession, MAX_LIVES};
use crate::state::{GameSet, GameState};
use crate::ui::text_style;

const BOSS_BAR_WIDTH: f32 = 246.0;
const BOSS_INTRO_SECS: f32 = 3.0;
const BOSS_INTRO_FADE_SECS: f32 = 0.5;

const MOTIVATION_MESSAGES: [&str; 7] = [
    "Great job, Carla!",
    "The planet thanks you!",
    "Recycling is life!",
    "A greener campus!",
    "Eco-power!",
    "Fantastic!",
    "Keep it up!",
];

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<Banner>()
            .add_systems(
                OnEnter(GameState::Loading),
                spawn_hud.in_set(LevelSystems::Spawn),
            )
            .add_systems(
                Update,
                (
                    update_hud_labels,
                    update_hearts,
                    update_boss_panel,
                    show_banners,
                    show_boss_intro,
                    fade_boss_intro,
                )
                    .in_set(GameSet::Effects),
            );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerStyle {
    Motivation,
    Warning,
    Danger,
    Triumph,
    Title,
}

/// A centred message across the top of the screen.
#[derive(Event, Debug, Clone)]
pub struct Banner {
    pub text: String,
    pub style: BannerStyle,
}

impl Banner {
    pub fn motivation(rng: &mut impl Rng) -> Self {
        let text = MOTIVATION_MESSAGES
            .choose(rng)
            .copied()
            .unwrap_or(MOTIVATION_MESSAGES[0]);
        Self::new(text, BannerStyle::Motivation)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(text, BannerStyle::Warning)
    }

    pub fn danger(text: impl Into<String>) -> Self {
        Self::new(text, BannerStyle::Danger)
    }

    pub fn triumph(text: impl Into<String>) -> Self {
        Self::new(text, BannerStyle::Triumph)
    }

    pub fn title(text: impl Into<String>) -> Self {
        Self::new(text, BannerStyle::Title)
    }

    fn new(text: impl Into<String>, style: BannerStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

#[derive(Component, Clone, Copy, PartialEq, Eq)]
enum HudLabel {
    Level,
    Score,
    Combo,
    Items,
}

#[derive(Component)]
struct HeartIcon(u32);

#[derive(Component)]
struct BossPanel;

#[derive(Component)]
struct BossBarFill;

#[derive(Component)]
struct BossHpLabel;

#[derive(Component)]
struct MotivationBanner;

#[derive(Component)]
struct BossIntro(Timer);

/// Combo readout, shown from a three-item streak on. Red once the top multiplier is reached.
fn combo_label(combo: u32, multiplier: u32) -> Option<(String, Srgba)> {
    if combo < 3 {
        return None;
    }
    let color = if multiplier >= 3 {
        palette::ALERT_RED
    } else {
        palette::SUN_YELLOW
    };
    Some((format!("COMBO x{}!", multiplier), color))
}

fn boss_bar_color(percent: f32) -> Srgba {
    if percent <= 0.3 {
        palette::ALERT_RED
    } else if percent <= 0.6 {
        palette::ORANGE
    } else {
        palette::ECO_GREEN
    }
}

fn heart_color(index: u32, lives: u32) -> Color {
    if index < lives {
        palette::ALERT_RED.into()
    } else {
        palette::MIDNIGHT.with_alpha(0.3).into()
    }
}

fn centered_text(text: impl Into<String>, style: TextStyle, top: f32) -> TextBundle {
    TextBundle::from_section(text, style)
        .with_text_justify(JustifyText::Center)
        .with_style(Style {
            position_type: PositionType::Absolute,
            top: Val::Px(top),
            width: Val::Percent(100.0),
            ..default()
        })
}

fn spawn_hud(mut commands: Commands) {
    commands
        .spawn((
            Name::new("Hud"),
            LevelEntity,
            NodeBundle {
                style: Style {
                    position_type: PositionType::Absolute,
                    width: Val::Percent(100.0),
                    height: Val::Px(50.0),
                    padding: UiRect::horizontal(Val::Px(16.0)),
                    align_items: AlignItems::Center,
                    justify_content: JustifyContent::SpaceBetween,
                    ..default()
                },
                background_color: BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.3)),
                z_index: ZIndex::Global(10),
                ..default()
            },
        ))
        .with_children(|bar| {
            bar.spawn(NodeBundle {
                style: Style {
                    column_gap: Val::Px(8.0),
                    ..default()
                },
                ..default()
            })
            .with_children(|hearts| {
                for index in 0..MAX_LIVES {
                    hearts.spawn((
                        HeartIcon(index),
                        NodeBundle {
                            style: Style {
                                width: Val::Px(20.0),
                                height: Val::Px(18.0),
                                ..default()
                            },
                            background_color: BackgroundColor(heart_color(index, 0)),
                            ..default()
                        },
                    ));
                }
            });

            bar.spawn(NodeBundle {
                style: Style {
                    flex_direction: FlexDirection::Column,
                    align_items: AlignItems::Center,
                    ..default()
                },
                ..default()
            })
            .with_children(|center| {
                center.spawn((
                    HudLabel::Level,
                    TextBundle::from_section("Level 1", text_style(18.0, Color::WHITE)),
                ));
                center.spawn((
                    HudLabel::Items,
                    TextBundle::from_section("0/0 items", text_style(12.0, palette::CAN_GREY)),
                ));
            });

            bar.spawn((
                HudLabel::Score,
                TextBundle::from_section("0", text_style(20.0, palette::ECO_GREEN)),
            ));
        });

    commands.spawn((
        Name::new("ComboLabel"),
        LevelEntity,
        HudLabel::Combo,
        centered_text("", text_style(16.0, palette::SUN_YELLOW), 54.0),
        Visibility::Hidden,
    ));

    commands
        .spawn((
            Name::new("BossPanel"),
            LevelEntity,
            BossPanel,
            NodeBundle {
                style: Style {
                    position_type: PositionType::Absolute,
                    top: Val::Px(74.0),
                    width: Val::Percent(100.0),
                    flex_direction: FlexDirection::Column,
                    align_items: AlignItems::Center,
                    row_gap: Val::Px(4.0),
                    ..default()
                },
                visibility: Visibility::Hidden,
                z_index: ZIndex::Global(10),
                ..default()
            },
        ))
        .with_children(|panel| {
            panel.spawn(TextBundle::from_section(
                BOSS_NAME,
                text_style(18.0, palette::ALERT_RED),
            ));
            panel
                .spawn(NodeBundle {
                    style: Style {
                        width: Val::Px(BOSS_BAR_WIDTH + 4.0),
                        height: Val::Px(18.0),
                        border: UiRect::all(Val::Px(2.0)),
                        align_items: AlignItems::Center,
                        justify_content: JustifyContent::Center,
                        ..default()
                    },
                    background_color: BackgroundColor(palette::MIDNIGHT.into()),
                    border_color: BorderColor(palette::CLOUD.into()),
                    ..default()
                })
                .with_children(|frame| {
                    frame.spawn((
                        BossBarFill,
                        NodeBundle {
                            style: Style {
                                position_type: PositionType::Absolute,
                                left: Val::Px(0.0),
                                width: Val::Px(BOSS_BAR_WIDTH),
                                height: Val::Percent(100.0),
                                ..default()
                            },
                            background_color: BackgroundColor(palette::ECO_GREEN.into()),
                            ..default()
                        },
                    ));
                    frame.spawn((
                        BossHpLabel,
                        TextBundle::from_section("10/10", text_style(12.0, Color::WHITE)),
                    ));
                });
        });
}

fn update_hud_labels(
    session: Res<GameSession>,
    mut labels: Query<(&HudLabel, &mut Text, &mut Visibility)>,
) {
    let data = session.hud_data();
    for (label, mut text, mut visibility) in &mut labels {
        let Some(section) = text.sections.first_mut() else {
            continue;
        };
        match label {
            HudLabel::Level => section.value = format!("Level {}", data.level),
            HudLabel::Score => section.value = data.score.to_string(),
            HudLabel::Items => section.value = format!("{} items", data.items),
            HudLabel::Combo => match combo_label(data.combo, data.multiplier) {
                Some((value, color)) => {
                    section.value = value;
                    section.style.color = color.into();
                    *visibility = Visibility::Inherited;
                }
                None => *visibility = Visibility::Hidden,
            },
        }
    }
}

fn update_hearts(
    session: Res<GameSession>,
    mut hearts: Query<(&HeartIcon, &mut BackgroundColor)>,
) {
    for (heart, mut background) in &mut hearts {
        background.0 = heart_color(heart.0, session.lives);
    }
}

fn update_boss_panel(
    bosses: Query<&BossBrain>,
    mut panel: Query<&mut Visibility, With<BossPanel>>,
    mut fill: Query<(&mut Style, &mut BackgroundColor), With<BossBarFill>>,
    mut hp_label: Query<&mut Text, With<BossHpLabel>>,
) {
    let Ok(mut visibility) = panel.get_single_mut() else {
        return;
    };
    // Shown once the intro is over and the fight is on.
    let Some(brain) = bosses
        .iter()
        .find(|brain| brain.is_engaged() && !brain.defeated)
    else {
        *visibility = Visibility::Hidden;
        return;
    };
    *visibility = Visibility::Inherited;

    let percent = brain.health_percent();
    if let Ok((mut style, mut background)) = fill.get_single_mut() {
        style.width = Val::Px(BOSS_BAR_WIDTH * percent);
        background.0 = boss_bar_color(percent).into();
    }
    if let Ok(mut text) = hp_label.get_single_mut() {
        if let Some(section) = text.sections.first_mut() {
            section.value = format!("{}/{}", brain.health, brain.max_health);
        }
    }
}

fn show_banners(
    mut commands: Commands,
    mut banners: EventReader<Banner>,
    motivation_showing: Query<(), With<MotivationBanner>>,
) {
    let mut motivation_spawned = !motivation_showing.is_empty();

    for banner in banners.read() {
        let (top, font_size, color, lifetime) = match banner.style {
            BannerStyle::Motivation => {
                // One cheer at a time.
                if motivation_spawned {
                    continue;
                }
                motivation_spawned = true;
                (120.0, 24.0, palette::ECO_GREEN, Some(Lifetime::fading(1.5, 1.5)))
            }
            BannerStyle::Warning => (
                100.0,
                24.0,
                palette::ORANGE,
                Some(Lifetime::fading(2.3, 0.5)),
            ),
            BannerStyle::Danger => (
                100.0,
                24.0,
                palette::ALERT_RED,
                Some(Lifetime::fading(2.3, 0.5)),
            ),
            BannerStyle::Triumph => (180.0, 28.0, palette::ECO_GREEN, None),
            BannerStyle::Title => (
                160.0,
                32.0,
                palette::SUN_YELLOW,
                Some(Lifetime::fading(2.0, 0.5)),
            ),
        };

        let mut entity = commands.spawn((
            Name::new("Banner"),
            LevelEntity,
            centered_text(banner.text.clone(), text_style(font_size, color), top),
            ZIndex::Global(20),
        ));
        if let Some(lifetime) = lifetime {
            entity.insert(lifetime);
        }
        if banner.style == BannerStyle::Motivation {
            entity.insert(MotivationBanner);
        }
    }
}

fn show_boss_intro(mut commands: Commands, bosses: Query<(), Added<Boss>>) {
    if bosses.is_empty() {
        return;
    }

    commands
        .spawn((
            Name::new("BossIntro"),
            LevelEntity,
            BossIntro(Timer::from_seconds(
                BOSS_INTRO_SECS + BOSS_INTRO_FADE_SECS,
                TimerMode::Once,
            )),
            NodeBundle {
                style: Style {
                    position_type: PositionType::Absolute,
                    width: Val::Percent(100.0),
                    height: Val::Percent(100.0),
                    flex_direction: FlexDirection::Column,
                    align_items: AlignItems::Center,
                    justify_content: JustifyContent::Center,
                    row_gap: Val::Px(24.0),
                    ..default()
                },
                background_color: BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.5)),
                z_index: ZIndex::Global(30),
                ..default()
            },
        ))
        .with_children(|overlay| {
            for (line, size, color) in [
                ("ALERT!\nDoctor Plastic has appeared!", 28.0, palette::ALERT_RED),
                (
                    "Catch the trash he throws!\nEvery item you catch hurts him!",
                    16.0,
                    palette::SUN_YELLOW,
                ),
                ("Go Carla! You can do it!", 18.0, palette::ECO_GREEN),
            ] {
                overlay.spawn(
                    TextBundle::from_section(line, text_style(size, color))
                        .with_text_justify(JustifyText::Center),
                );
            }
        });
}

fn fade_boss_intro(
    mut commands: Commands,
    time: Res<Time>,
    mut intros: Query<(Entity, &mut BossIntro, &mut BackgroundColor, &Children)>,
    mut texts: Query<&mut Text>,
) {
    for (entity, mut intro, mut background, children) in &mut intros {
        intro.0.tick(time.delta());
        if intro.0.finished() {
            commands.entity(entity).despawn_recursive();
            continue;
        }

        let fade = ((intro.0.elapsed_secs() - BOSS_INTRO_SECS) / BOSS_INTRO_FADE_SECS).clamp(0.0, 1.0);
        let opacity = 1.0 - fade;
        background.0.set_alpha(0.5 * opacity);
        for &child in children.iter() {
            if let Ok(mut text) = texts.get_mut(child) {
                for section in text.sections.iter_mut() {
                    section.style.color.set_alpha(opacity);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn combo_label_appears_from_three() {
        assert_eq!(combo_label(2, 1), None);
        assert_eq!(
            combo_label(3, 2),
            Some(("COMBO x2!".to_owned(), palette::SUN_YELLOW))
        );
        assert_eq!(
            combo_label(6, 3),
            Some(("COMBO x3!".to_owned(), palette::ALERT_RED))
        );
    }

    #[test]
    fn boss_bar_colour_follows_health() {
        assert_eq!(boss_bar_color(1.0), palette::ECO_GREEN);
        assert_eq!(boss_bar_color(0.7), palette::ECO_GREEN);
        assert_eq!(boss_bar_color(0.6), palette::ORANGE);
        assert_eq!(boss_bar_color(0.4), palette::ORANGE);
        assert_eq!(boss_bar_color(0.3), palette::ALERT_RED);
        assert_eq!(boss_bar_color(0.0), palette::ALERT_RED);
    }

    #[test]
    fn lost_hearts_are_dimmed() {
        assert_eq!(heart_color(1, 3), Color::from(palette::ALERT_RED));
        assert_ne!(heart_color(3, 3), Color::from(palette::ALERT_RED));
    }

    #[test]
    fn motivation_messages_come_from_the_list() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..20 {
            let banner = Banner::motivation(&mut rng);
            assert_eq!(banner.style, BannerStyle::Motivation);
            assert!(MOTIVATION_MESSAGES.contains(&banner.text.as_str()));
        }
    }

    #[test]
    fn only_one_motivation_banner_at_a_time() {
        let mut app = App::new();
        app.add_event::<Banner>()
            .add_systems(Update, show_banners);

        let mut rng = StdRng::seed_from_u64(1);
        app.world_mut().send_event(Banner::motivation(&mut rng));
        app.world_mut().send_event(Banner::motivation(&mut rng));
        app.world_mut().send_event(Banner::warning("Doctor Plastic is furious!"));
        app.update();

        let world = app.world_mut();
        let motivations = world
            .query_filtered::<(), With<MotivationBanner>>()
            .iter(world)
            .count();
        let total = world.query::<&Text>().iter(world).count();
        assert_eq!(motivations, 1);
        assert_eq!(total, 2);

        app.world_mut().send_event(Banner::motivation(&mut rng));
        app.update();
        let world = app.world_mut();
        assert_eq!(
            world
                .query_filtered::<(), With<MotivationBanner>>()
                .iter(world)
                .count(),
            1
        );
    }

    #[test]
    fn hud_labels_are_styled_per_role() {
        let mut app = App::new();
        app.add_systems(Update, spawn_hud);
        app.update();

        let world = app.world_mut();
        let styles: Vec<(HudLabel, f32, Color)> = world
            .query::<(&HudLabel, &Text)>()
            .iter(world)
            .map(|(label, text)| {
                let style = &text.sections[0].style;
                (*label, style.font_size, style.color)
            })
            .collect();
        let style_of = |wanted: HudLabel| {
            styles
                .iter()
                .find(|(label, _, _)| *label == wanted)
                .map(|(_, size, color)| (*size, *color))
        };
        assert_eq!(style_of(HudLabel::Score), Some((20.0, Color::from(palette::ECO_GREEN))));
        assert_eq!(style_of(HudLabel::Items), Some((12.0, Color::from(palette::CAN_GREY))));
        assert_eq!(style_of(HudLabel::Level), Some((18.0, Color::WHITE)));
    }
}
