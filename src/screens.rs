//! Full-screen states around the gameplay: the story intro, the main menu, game over and victory.

use bevy::prelude::*;

use crate::audio::SoundCue;
use crate::palette;
use crate::session::GameSession;
use crate::state::GameState;
use crate::transition::ScreenFade;
use crate::ui::{screen_root, spawn_button, text_style, MenuAction};

const SCORE_COUNT_SECS: f32 = 1.5;

pub struct ScreensPlugin;

impl Plugin for ScreensPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<IntroProgress>()
            .add_systems(OnEnter(GameState::Intro), start_intro)
            .add_systems(OnExit(GameState::Intro), despawn_with::<IntroScreen>)
            .add_systems(OnEnter(GameState::Menu), spawn_menu)
            .add_systems(OnExit(GameState::Menu), despawn_with::<MenuScreen>)
            .add_systems(OnEnter(GameState::GameOver), spawn_game_over)
            .add_systems(OnExit(GameState::GameOver), despawn_with::<GameOverScreen>)
            .add_systems(OnEnter(GameState::Victory), spawn_victory)
            .add_systems(OnExit(GameState::Victory), despawn_with::<VictoryScreen>)
            .add_systems(
                Update,
                (
                    advance_intro.run_if(in_state(GameState::Intro)),
                    menu_shortcuts.run_if(in_state(GameState::Menu)),
                    end_screen_shortcuts
                        .run_if(in_state(GameState::GameOver).or_else(in_state(GameState::Victory))),
                    count_up_scores.run_if(in_state(GameState::Victory)),
                ),
            );
    }
}

#[derive(Component)]
struct IntroScreen;

#[derive(Component)]
struct MenuScreen;

#[derive(Component)]
struct GameOverScreen;

#[derive(Component)]
struct VictoryScreen;

fn despawn_with<T: Component>(mut commands: Commands, query: Query<Entity, With<T>>) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
}

struct Speaker {
    name: &'static str,
    role: Option<&'static str>,
    villain: bool,
}

struct Slide {
    background: Srgba,
    title: Option<&'static str>,
    subtitle: Option<&'static str>,
    speaker: Option<Speaker>,
    lines: &'static [&'static str],
}

const SOTOR: &str = "SOTOR";
const CARLA: &str = "ECO-HERO CARLA";

fn story() -> [Slide; 8] {
    let villain = |role| {
        Some(Speaker {
            name: SOTOR,
            role,
            villain: true,
        })
    };
    let hero = |name, role| {
        Some(Speaker {
            name,
            role,
            villain: false,
        })
    };
    let lair = Srgba::rgb(0.290, 0.0, 0.0);
    let office = Srgba::rgb(0.102, 0.361, 0.102);

    [
        Slide {
            background: palette::MIDNIGHT,
            title: Some("The campus..."),
            subtitle: Some("A seemingly normal, sunny afternoon..."),
            speaker: None,
            lines: &[],
        },
        Slide {
            background: lair,
            title: None,
            subtitle: None,
            speaker: villain(Some("The Villain of the Six Layers of Clothing")),
            lines: &[
                "HAHAHAHA! My moment has finally come!",
                "I will destroy EVERY air conditioner on campus! AHAHAH",
            ],
        },
        Slide {
            background: lair,
            title: None,
            subtitle: None,
            speaker: villain(None),
            lines: &[
                "Turn off the AC! I'm already wheezing!",
                "I need my flaxseed porridge for energy...",
            ],
        },
        Slide {
            background: lair,
            title: None,
            subtitle: None,
            speaker: villain(None),
            lines: &[
                "I hate draughts!",
                "This campus will BURN with heat! MUAHAHA!",
            ],
        },
        Slide {
            background: office,
            title: Some("Meanwhile, in the Sustainability office..."),
            subtitle: None,
            speaker: hero("CARLA FARELO", Some("Sustainability Coordinator")),
            lines: &[
                "WHAT?! Sotor wants to destroy the ACs?!",
                "This cannot happen! It is TIME for ECO-HERO to step in!",
            ],
        },
        Slide {
            background: palette::DEEP_GREEN,
            title: Some("TRANSFORMATION"),
            subtitle: None,
            speaker: hero(CARLA, Some("Sustainability Superheroine")),
            lines: &[
                "Time to put on my suit!",
                "By the power of sustainability... TRANSFOOORM!",
            ],
        },
        Slide {
            background: palette::DEEP_GREEN,
            title: None,
            subtitle: None,
            speaker: hero(CARLA, None),
            lines: &[
                "I'll pull that sweater off and let you catch a cold!",
                "Say goodbye to your humidifier!",
            ],
        },
        Slide {
            background: palette::TURQUOISE,
            title: Some("WITH THE POWER OF THE COLD WIND"),
            subtitle: Some("The sustainability superheroine sets off on her mission!"),
            speaker: hero(CARLA, None),
            lines: &[],
        },
    ]
}

#[derive(Resource, Debug, Default)]
struct IntroProgress {
    slide: usize,
}

impl IntroProgress {
    /// Moves to the next slide. Returns `false` once the story is over.
    fn advance(&mut self, total: usize) -> bool {
        if self.slide + 1 >= total {
            return false;
        }
        self.slide += 1;
        true
    }
}

fn start_intro(mut commands: Commands, mut progress: ResMut<IntroProgress>) {
    progress.slide = 0;
    spawn_slide(&mut commands, 0);
}

fn spawn_slide(commands: &mut Commands, index: usize) {
    let slides = story();
    let Some(slide) = slides.get(index) else {
        return;
    };
    let last = index + 1 == slides.len();

    commands
        .spawn((
            IntroScreen,
            Name::new(format!("IntroSlide{}", index + 1)),
            screen_root(slide.background.into()),
        ))
        .with_children(|root| {
            if let Some(title) = slide.title {
                root.spawn(TextBundle::from_section(title, text_style(28.0, Color::WHITE)));
            }
            if let Some(subtitle) = slide.subtitle {
                root.spawn(TextBundle::from_section(
                    subtitle,
                    text_style(18.0, palette::CLOUD),
                ));
            }

            if let Some(speaker) = &slide.speaker {
                let (name_color, bubble, line_color) = if speaker.villain {
                    (palette::ALERT_RED, palette::NIGHT, Color::WHITE)
                } else {
                    (palette::ECO_GREEN, palette::CLOUD, palette::MIDNIGHT.into())
                };

                root.spawn(TextBundle::from_section(
                    speaker.name,
                    text_style(20.0, name_color),
                ));
                if let Some(role) = speaker.role {
                    root.spawn(TextBundle::from_section(role, text_style(12.0, palette::SILVER)));
                }
                for line in slide.lines {
                    root.spawn(NodeBundle {
                        style: Style {
                            max_width: Val::Px(560.0),
                            padding: UiRect::axes(Val::Px(14.0), Val::Px(8.0)),
                            ..default()
                        },
                        background_color: BackgroundColor(bubble.into()),
                        border_radius: BorderRadius::all(Val::Px(10.0)),
                        ..default()
                    })
                    .with_children(|bubble| {
                        bubble.spawn(TextBundle::from_section(*line, text_style(14.0, line_color)));
                    });
                }
            }

            let hint = if last {
                "Press SPACE to start the mission!"
            } else {
                "Click or press SPACE to continue..."
            };
            root.spawn(TextBundle::from_section(
                format!("{}   {}/{}", hint, index + 1, slides.len()),
                text_style(14.0, palette::ASBESTOS),
            ));
        });
}

#[allow(clippy::too_many_arguments)]
fn advance_intro(
    mut commands: Commands,
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    mut progress: ResMut<IntroProgress>,
    mut fade: ResMut<ScreenFade>,
    mut sounds: EventWriter<SoundCue>,
    slides: Query<Entity, With<IntroScreen>>,
) {
    if fade.is_active() {
        return;
    }
    let skip = keyboard.just_pressed(KeyCode::Escape);
    let next = keyboard.any_just_pressed([KeyCode::Space, KeyCode::Enter])
        || mouse.just_pressed(MouseButton::Left);
    if !skip && !next {
        return;
    }

    sounds.send(SoundCue::Click);
    if skip || !progress.advance(story().len()) {
        fade.start(GameState::Menu);
        return;
    }

    for entity in &slides {
        commands.entity(entity).despawn_recursive();
    }
    spawn_slide(&mut commands, progress.slide);
}

fn spawn_menu(mut commands: Commands, session: Res<GameSession>) {
    commands
        .spawn((
            MenuScreen,
            Name::new("MainMenu"),
            screen_root(palette::NIGHT.into()),
        ))
        .with_children(|root| {
            root.spawn(TextBundle::from_section(
                "EcoHero",
                text_style(56.0, palette::ECO_GREEN),
            ));
            root.spawn(TextBundle::from_section(
                "Starring Carla Farelo",
                text_style(22.0, palette::SUN_YELLOW),
            ));
            root.spawn(TextBundle::from_section(
                "Save the campus from pollution and make it greener!",
                text_style(18.0, palette::CLOUD),
            ));
            root.spawn(TextBundle::from_section(
                format!("High score: {}", session.high_score),
                text_style(18.0, palette::SUN_YELLOW),
            ));
            spawn_button(root, "PLAY", MenuAction::NewGame);
            root.spawn(TextBundle::from_section(
                "A/D or LEFT/RIGHT to move    W, UP or SPACE to jump    P to pause",
                text_style(16.0, palette::SILVER),
            ));
        });
}

fn menu_shortcuts(keyboard: Res<ButtonInput<KeyCode>>, mut actions: EventWriter<MenuAction>) {
    if keyboard.any_just_pressed([KeyCode::Space, KeyCode::Enter]) {
        actions.send(MenuAction::NewGame);
    }
}

fn spawn_game_over(mut commands: Commands, session: Res<GameSession>) {
    commands
        .spawn((
            GameOverScreen,
            Name::new("GameOver"),
            screen_root(palette::NIGHT.into()),
        ))
        .with_children(|root| {
            root.spawn(TextBundle::from_section(
                "Oh no! The trash won...",
                text_style(36.0, palette::ALERT_RED),
            ));
            root.spawn(TextBundle::from_section(
                "Don't give up, Carla!",
                text_style(22.0, palette::CLOUD),
            ));
            root.spawn(TextBundle::from_section(
                "The planet needs you!",
                text_style(18.0, palette::ECO_GREEN),
            ));
            root.spawn(TextBundle::from_section(
                format!("Score: {}", session.score),
                text_style(24.0, palette::SUN_YELLOW),
            ));
            spawn_button(root, "Try again (R)", MenuAction::NewGame);
            spawn_button(root, "Main menu (M)", MenuAction::OpenMenu);
        });
}

fn end_screen_shortcuts(keyboard: Res<ButtonInput<KeyCode>>, mut actions: EventWriter<MenuAction>) {
    if keyboard.just_pressed(KeyCode::KeyR) {
        actions.send(MenuAction::NewGame);
    } else if keyboard.just_pressed(KeyCode::KeyM) {
        actions.send(MenuAction::OpenMenu);
    }
}

/// Counts a score label up from zero.
#[derive(Component, Debug)]
struct ScoreCounter {
    target: u32,
    timer: Timer,
}

impl ScoreCounter {
    fn new(target: u32) -> Self {
        Self {
            target,
            timer: Timer::from_seconds(SCORE_COUNT_SECS, TimerMode::Once),
        }
    }

    fn shown(&self) -> u32 {
        (self.target as f32 * self.timer.fraction()).round() as u32
    }
}

/// Lines under the stats, earned by a big score and by a perfect run.
fn special_messages(score: u32, stars: u8) -> Vec<(&'static str, Srgba)> {
    let mut messages = Vec::new();
    if score > 1000 {
        messages.push(("Carla, you are a true EcoHero!", palette::CLOUD));
    }
    if stars == 3 {
        messages.push(("RECYCLING MASTER", palette::SUN_YELLOW));
    }
    messages
}

fn spawn_victory(
    mut commands: Commands,
    session: Res<GameSession>,
    mut sounds: EventWriter<SoundCue>,
) {
    let data = session.end_screen_data();
    sounds.send(SoundCue::Victory);

    commands
        .spawn((
            VictoryScreen,
            Name::new("Victory"),
            screen_root(palette::DEEP_GREEN.into()),
        ))
        .with_children(|root| {
            root.spawn(TextBundle::from_section(
                "CONGRATULATIONS CARLA!",
                text_style(40.0, palette::SUN_YELLOW),
            ));
            root.spawn(TextBundle::from_section(
                "You saved the campus!",
                text_style(20.0, Color::WHITE),
            ));
            root.spawn(TextBundle::from_section(
                "Doctor Plastic has been defeated!",
                text_style(14.0, palette::CLOUD),
            ));
            root.spawn(TextBundle::from_section(
                "Final score",
                text_style(14.0, palette::SILVER),
            ));
            root.spawn((
                ScoreCounter::new(data.score),
                TextBundle::from_section("0", text_style(36.0, palette::SUN_YELLOW)),
            ));
            root.spawn(TextBundle::from_section(
                format!(
                    "High score: {}    Items: {}/{} ({}%)    Best combo: {}",
                    data.high_score,
                    data.items_collected,
                    data.total_items,
                    data.percentage,
                    data.max_combo
                ),
                text_style(14.0, palette::CLOUD),
            ));

            root.spawn(NodeBundle {
                style: Style {
                    column_gap: Val::Px(12.0),
                    ..default()
                },
                ..default()
            })
            .with_children(|row| {
                for star in 0..3 {
                    let color = if star < data.stars {
                        palette::SUN_YELLOW
                    } else {
                        palette::ASBESTOS
                    };
                    row.spawn(NodeBundle {
                        style: Style {
                            width: Val::Px(28.0),
                            height: Val::Px(28.0),
                            ..default()
                        },
                        background_color: BackgroundColor(color.into()),
                        border_radius: BorderRadius::all(Val::Px(6.0)),
                        ..default()
                    });
                }
            });

            for (message, color) in special_messages(data.score, data.stars) {
                root.spawn(TextBundle::from_section(message, text_style(18.0, color)));
            }

            spawn_button(root, "Play again (R)", MenuAction::NewGame);
            spawn_button(root, "Menu (M)", MenuAction::OpenMenu);
        });
}

fn count_up_scores(time: Res<Time>, mut counters: Query<(&mut ScoreCounter, &mut Text)>) {
    for (mut counter, mut text) in &mut counters {
        if counter.timer.finished() {
            continue;
        }
        counter.timer.tick(time.delta());
        if let Some(section) = text.sections.first_mut() {
            section.value = counter.shown().to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn the_story_has_eight_slides() {
        let slides = story();
        assert_eq!(slides.len(), 8);
        assert!(slides[0].speaker.is_none());
        assert!(slides[1].speaker.as_ref().is_some_and(|s| s.villain));
        assert!(slides[7].speaker.as_ref().is_some_and(|s| !s.villain));
    }

    #[test]
    fn intro_stops_after_the_last_slide() {
        let mut progress = IntroProgress::default();
        let advanced = (0..10).filter(|_| progress.advance(8)).count();
        assert_eq!(advanced, 7);
        assert_eq!(progress.slide, 7);
    }

    #[test]
    fn special_messages_need_a_big_score_or_three_stars() {
        assert!(special_messages(1000, 2).is_empty());
        assert_eq!(special_messages(1001, 2).len(), 1);
        assert_eq!(special_messages(500, 3).len(), 1);
        assert_eq!(special_messages(1500, 3).len(), 2);
    }

    #[test]
    fn score_counter_reaches_the_target() {
        let mut counter = ScoreCounter::new(1200);
        assert_eq!(counter.shown(), 0);
        counter.timer.tick(Duration::from_secs_f32(SCORE_COUNT_SECS * 0.5));
        assert_eq!(counter.shown(), 600);
        counter.timer.tick(Duration::from_secs(5));
        assert_eq!(counter.shown(), 1200);
    }

    #[test]
    fn leaving_the_intro_early_fades_to_the_menu() {
        let mut app = App::new();
        app.init_resource::<ButtonInput<KeyCode>>()
            .init_resource::<ButtonInput<MouseButton>>()
            .init_resource::<IntroProgress>()
            .init_resource::<ScreenFade>()
            .add_event::<SoundCue>()
            .add_systems(Update, advance_intro);

        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::Space);
        app.update();
        assert_eq!(app.world().resource::<IntroProgress>().slide, 1);
        let world = app.world_mut();
        assert_eq!(
            world
                .query_filtered::<(), With<IntroScreen>>()
                .iter(world)
                .count(),
            1
        );

        {
            let mut keyboard = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
            keyboard.clear();
            keyboard.press(KeyCode::Escape);
        }
        app.update();
        assert_eq!(
            app.world().resource::<ScreenFade>().target(),
            Some(GameState::Menu)
        );
    }
}
