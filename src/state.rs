//! Global game state definitions. States are stored by Bevy as a plain enum resource; switching
//! states updates the value and triggers on-enter/on-exit schedules. No heap allocations occur
//! when toggling states.

use bevy::input::keyboard::KeyCode;
use bevy::prelude::*;

/// High-level state machine for the whole game. Most variants are a screen; `Loading` is the
/// short hop that (re)builds the current level.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum GameState {
    #[default]
    Boot,
    Intro,
    Menu,
    Loading,
    Playing,
    Paused,
    GameOver,
    Victory,
}

/// Named system sets to structure the Update schedule.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GameSet {
    Input,
    Movement,
    Effects,
}

/// Toggles between Playing and Paused when `ESC` or `P` is pressed. The `State` resource is a
/// read-only snapshot; `NextState` writes the pending transition which Bevy applies at the end
/// of the frame.
pub fn toggle_pause(
    keyboard: Res<ButtonInput<KeyCode>>,
    state: Res<State<GameState>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if !keyboard.any_just_pressed([KeyCode::Escape, KeyCode::KeyP]) {
        return;
    }

    match state.get() {
        GameState::Playing => next_state.set(GameState::Paused),
        GameState::Paused => next_state.set(GameState::Playing),
        _ => {}
    }
}

/// Logs every state change so a run can be followed from the console.
pub fn log_state_transitions(mut transitions: EventReader<StateTransitionEvent<GameState>>) {
    for transition in transitions.read() {
        info!("Game state: {:?} -> {:?}", transition.exited, transition.entered);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_pauses_and_resumes() {
        let mut app = App::new();
        app.add_plugins(bevy::state::app::StatesPlugin)
            .init_resource::<ButtonInput<KeyCode>>()
            .insert_state(GameState::Playing)
            .add_systems(Update, toggle_pause);

        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::Escape);
        app.update();
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .clear();
        app.update();
        assert_eq!(
            *app.world().resource::<State<GameState>>().get(),
            GameState::Paused
        );
    }
}
