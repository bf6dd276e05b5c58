//! Menu plumbing shared by every screen, plus the pause overlay.
//!
//! Buttons carry a `MenuAction`; clicking one (or pressing its keyboard shortcut) sends that
//! action as an event, and `apply_menu_actions` is the only place that turns actions into state
//! changes. UI entities are part of Bevy's ECS; once despawned, all associated style/text
//! components are dropped automatically.

use bevy::color::Alpha;
use bevy::prelude::*;

use crate::audio::SoundCue;
use crate::level::{ActiveLevel, LevelConfig};
use crate::palette;
use crate::session::GameSession;
use crate::state::GameState;
use crate::transition::ScreenFade;

/// Registers menu buttons, action dispatch and the pause overlay.
pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<MenuAction>()
            .add_systems(OnEnter(GameState::Paused), spawn_pause_menu)
            .add_systems(OnExit(GameState::Paused), despawn_pause_menu)
            .add_systems(
                Update,
                (
                    pause_shortcuts.run_if(in_state(GameState::Paused)),
                    press_buttons,
                    highlight_buttons,
                    apply_menu_actions,
                )
                    .chain(),
            );
    }
}

/// What a button or shortcut asks for.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Resume,
    RestartLevel,
    OpenMenu,
    /// Fresh session from the first level. Also used for retry and play-again.
    NewGame,
}

#[derive(Component)]
struct PauseMenu;

const BUTTON_IDLE: Srgba = palette::SLATE;
const BUTTON_ACTIVE: Srgba = palette::ECO_GREEN;

pub fn text_style(font_size: f32, color: impl Into<Color>) -> TextStyle {
    TextStyle {
        font_size,
        color: color.into(),
        ..default()
    }
}

/// Full-window node that centres its children in a column.
pub fn screen_root(background: Color) -> NodeBundle {
    NodeBundle {
        style: Style {
            position_type: PositionType::Absolute,
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            flex_direction: FlexDirection::Column,
            align_items: AlignItems::Center,
            justify_content: JustifyContent::Center,
            row_gap: Val::Px(10.0),
            ..default()
        },
        background_color: BackgroundColor(background),
        ..default()
    }
}

pub fn spawn_button(parent: &mut ChildBuilder, label: &str, action: MenuAction) {
    parent
        .spawn((
            action,
            ButtonBundle {
                style: Style {
                    width: Val::Px(220.0),
                    height: Val::Px(40.0),
                    border: UiRect::all(Val::Px(2.0)),
                    align_items: AlignItems::Center,
                    justify_content: JustifyContent::Center,
                    ..default()
                },
                background_color: BackgroundColor(BUTTON_IDLE.into()),
                border_color: BorderColor(palette::ECO_GREEN.into()),
                ..default()
            },
        ))
        .with_children(|button| {
            button.spawn(TextBundle::from_section(
                label,
                text_style(18.0, palette::CLOUD),
            ));
        });
}

fn spawn_pause_menu(mut commands: Commands) {
    commands
        .spawn((
            PauseMenu,
            Name::new("PauseMenu"),
            screen_root(Color::srgba(0.0, 0.0, 0.0, 0.7)),
            ZIndex::Global(50),
        ))
        .with_children(|overlay| {
            overlay
                .spawn(NodeBundle {
                    style: Style {
                        width: Val::Px(300.0),
                        padding: UiRect::all(Val::Px(24.0)),
                        border: UiRect::all(Val::Px(3.0)),
                        flex_direction: FlexDirection::Column,
                        align_items: AlignItems::Center,
                        row_gap: Val::Px(10.0),
                        ..default()
                    },
                    background_color: BackgroundColor(palette::NIGHT.with_alpha(0.95).into()),
                    border_color: BorderColor(palette::ECO_GREEN.into()),
                    ..default()
                })
                .with_children(|panel| {
                    panel.spawn(TextBundle::from_section(
                        "PAUSED",
                        text_style(42.0, palette::ECO_GREEN),
                    ));
                    spawn_button(panel, "Resume", MenuAction::Resume);
                    spawn_button(panel, "Restart (R)", MenuAction::RestartLevel);
                    spawn_button(panel, "Menu (M)", MenuAction::OpenMenu);
                });

            overlay.spawn(TextBundle::from_section(
                "Press P or ESC to resume",
                text_style(14.0, palette::ASBESTOS),
            ));
        });
}

fn despawn_pause_menu(mut commands: Commands, query: Query<Entity, With<PauseMenu>>) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
}

fn pause_shortcuts(keyboard: Res<ButtonInput<KeyCode>>, mut actions: EventWriter<MenuAction>) {
    if keyboard.just_pressed(KeyCode::KeyR) {
        actions.send(MenuAction::RestartLevel);
    } else if keyboard.just_pressed(KeyCode::KeyM) {
        actions.send(MenuAction::OpenMenu);
    }
}

fn press_buttons(
    buttons: Query<(&Interaction, &MenuAction), Changed<Interaction>>,
    mut actions: EventWriter<MenuAction>,
    mut sounds: EventWriter<SoundCue>,
) {
    for (interaction, action) in &buttons {
        if *interaction == Interaction::Pressed {
            sounds.send(SoundCue::Click);
            actions.send(*action);
        }
    }
}

fn highlight_buttons(
    mut buttons: Query<(&Interaction, &mut BackgroundColor), (Changed<Interaction>, With<MenuAction>)>,
) {
    for (interaction, mut background) in &mut buttons {
        background.0 = match interaction {
            Interaction::Pressed | Interaction::Hovered => BUTTON_ACTIVE.into(),
            Interaction::None => BUTTON_IDLE.into(),
        };
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_menu_actions(
    mut actions: EventReader<MenuAction>,
    state: Res<State<GameState>>,
    config: Res<LevelConfig>,
    mut next_state: ResMut<NextState<GameState>>,
    mut fade: ResMut<ScreenFade>,
    mut session: ResMut<GameSession>,
    mut active: ResMut<ActiveLevel>,
    mut sounds: EventWriter<SoundCue>,
) {
    // At most one action per frame; a second key press on the same frame is dropped.
    let Some(action) = actions.read().next().copied() else {
        return;
    };
    actions.clear();

    match action {
        MenuAction::Resume => {
            if *state.get() == GameState::Paused {
                next_state.set(GameState::Playing);
            }
        }
        MenuAction::RestartLevel => {
            if *state.get() == GameState::Paused {
                active.cleared = false;
                session.reset_combo();
                next_state.set(GameState::Loading);
            }
        }
        MenuAction::OpenMenu => {
            fade.start(GameState::Menu);
        }
        MenuAction::NewGame => {
            if fade.start(GameState::Loading) {
                session.reset();
                session.current_level = config.first_level;
                active.cleared = false;
                sounds.send(SoundCue::GameStart);
                info!("New game from level {}", config.first_level);
            }
        }
    }
}
