//! On-screen left, right and jump buttons for touch screens.
//!
//! The buttons write `OnScreenInput`, which `read_player_input` ORs with the keyboard. They stay
//! hidden until the device reports touch support or the first finger lands.

use bevy::color::Alpha;
use bevy::prelude::*;

use crate::level::{LevelEntity, LevelSystems};
use crate::palette;
use crate::state::{GameSet, GameState};
use crate::ui::text_style;

const BUTTON_SIZE: f32 = 60.0;
const BUTTON_GAP: f32 = 15.0;
const EDGE_PADDING: f32 = 20.0;
const IDLE_ALPHA: f32 = 0.5;
const PRESSED_ALPHA: f32 = 0.8;

pub struct TouchControlsPlugin;

impl Plugin for TouchControlsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<OnScreenInput>()
            .insert_resource(TouchControls {
                enabled: touch_device(),
            })
            .add_systems(
                OnEnter(GameState::Loading),
                spawn_touch_controls.in_set(LevelSystems::Spawn),
            )
            .add_systems(
                Update,
                (reveal_touch_controls, track_touch_buttons)
                    .chain()
                    .in_set(GameSet::Input),
            );
    }
}

/// Which on-screen buttons are held this frame.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OnScreenInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

#[derive(Resource, Debug)]
pub struct TouchControls {
    pub enabled: bool,
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchButton {
    Left,
    Right,
    Jump,
}

impl TouchButton {
    fn label(self) -> &'static str {
        match self {
            TouchButton::Left => "<",
            TouchButton::Right => ">",
            TouchButton::Jump => "^",
        }
    }

    fn placement(self) -> Style {
        let mut style = Style {
            position_type: PositionType::Absolute,
            bottom: Val::Px(EDGE_PADDING),
            width: Val::Px(BUTTON_SIZE),
            height: Val::Px(BUTTON_SIZE),
            align_items: AlignItems::Center,
            justify_content: JustifyContent::Center,
            ..default()
        };
        match self {
            TouchButton::Left => style.left = Val::Px(EDGE_PADDING),
            TouchButton::Right => style.left = Val::Px(EDGE_PADDING + BUTTON_SIZE + BUTTON_GAP),
            TouchButton::Jump => style.right = Val::Px(EDGE_PADDING),
        }
        style
    }
}

#[derive(Component)]
struct TouchOverlay;

#[cfg(all(target_arch = "wasm32", feature = "web"))]
fn touch_device() -> bool {
    web_sys::window()
        .map(|window| window.navigator().max_touch_points() > 0)
        .unwrap_or(false)
}

#[cfg(not(all(target_arch = "wasm32", feature = "web")))]
fn touch_device() -> bool {
    false
}

/// True when any of `positions` lands inside `rect`.
pub fn touched(rect: Rect, positions: &[Vec2]) -> bool {
    positions.iter().any(|position| rect.contains(*position))
}

fn spawn_touch_controls(mut commands: Commands, controls: Res<TouchControls>) {
    commands
        .spawn((
            Name::new("TouchControls"),
            LevelEntity,
            TouchOverlay,
            NodeBundle {
                style: Style {
                    position_type: PositionType::Absolute,
                    width: Val::Percent(100.0),
                    height: Val::Percent(100.0),
                    ..default()
                },
                visibility: if controls.enabled {
                    Visibility::Inherited
                } else {
                    Visibility::Hidden
                },
                z_index: ZIndex::Global(15),
                ..default()
            },
        ))
        .with_children(|overlay| {
            for button in [TouchButton::Left, TouchButton::Right, TouchButton::Jump] {
                overlay
                    .spawn((
                        button,
                        ButtonBundle {
                            style: button.placement(),
                            background_color: BackgroundColor(
                                palette::ECO_GREEN.with_alpha(IDLE_ALPHA).into(),
                            ),
                            border_radius: BorderRadius::all(Val::Px(BUTTON_SIZE * 0.5)),
                            ..default()
                        },
                    ))
                    .with_children(|face| {
                        face.spawn(TextBundle::from_section(
                            button.label(),
                            text_style(32.0, Color::WHITE),
                        ));
                    });
            }
        });
}

fn reveal_touch_controls(
    touches: Res<Touches>,
    mut controls: ResMut<TouchControls>,
    mut overlays: Query<&mut Visibility, With<TouchOverlay>>,
) {
    if !controls.enabled && touches.any_just_pressed() {
        info!("Touch input detected, showing touch controls");
        controls.enabled = true;
    }
    let shown = if controls.enabled {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    for mut visibility in &mut overlays {
        visibility.set_if_neq(shown);
    }
}

/// Mouse clicks arrive through `Interaction`. Fingers are matched against the button rectangles so
/// that moving and jumping can be held at the same time.
pub fn track_touch_buttons(
    touches: Res<Touches>,
    controls: Res<TouchControls>,
    mut input: ResMut<OnScreenInput>,
    mut buttons: Query<(
        &TouchButton,
        &Interaction,
        &Node,
        &GlobalTransform,
        &mut BackgroundColor,
    )>,
) {
    let mut held = OnScreenInput::default();
    if controls.enabled {
        let fingers: Vec<Vec2> = touches.iter().map(|touch| touch.position()).collect();
        for (button, interaction, node, transform, mut background) in &mut buttons {
            let pressed = *interaction == Interaction::Pressed
                || touched(node.logical_rect(transform), &fingers);
            match button {
                TouchButton::Left => held.left |= pressed,
                TouchButton::Right => held.right |= pressed,
                TouchButton::Jump => held.jump |= pressed,
            }
            background
                .0
                .set_alpha(if pressed { PRESSED_ALPHA } else { IDLE_ALPHA });
        }
    }
    input.set_if_neq(held);
}
