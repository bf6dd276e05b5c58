//! Application entry point: window configuration and the Bevy runtime. Gameplay lives in the
//! `EcoHeroPlugin` defined in `app.rs`.

mod app;
mod audio;
mod boss;
mod camera;
mod collectible;
mod collision;
mod effects;
mod enemy;
mod highscore;
mod hud;
mod level;
mod movement;
mod palette;
mod player;
mod screens;
mod session;
mod state;
mod synth;
mod touch;
mod transition;
mod ui;

#[cfg(all(target_arch = "wasm32", feature = "web"))]
mod wasm;

use app::EcoHeroPlugin;
use bevy::prelude::*;
use bevy::render::texture::ImagePlugin;
use bevy::window::{Window, WindowResizeConstraints, WindowResolution};

use crate::level::{ARENA_HEIGHT, ARENA_WIDTH};

fn main() {
    #[cfg(all(target_arch = "wasm32", feature = "web"))]
    wasm::set_panic_hook();

    // The logical resolution matches the arena (800×450) so one world unit is one pixel. Resizing
    // is allowed; the constraints keep the window from collapsing below half size.
    #[allow(unused_mut)]
    let mut primary_window = Window {
        title: "EcoHero - Save the Campus".to_string(),
        resolution: WindowResolution::new(ARENA_WIDTH, ARENA_HEIGHT),
        resizable: true,
        resize_constraints: WindowResizeConstraints {
            min_width: ARENA_WIDTH * 0.5,
            min_height: ARENA_HEIGHT * 0.5,
            max_width: f32::INFINITY,
            max_height: f32::INFINITY,
        },
        ..default()
    };
    #[cfg(all(target_arch = "wasm32", feature = "web"))]
    wasm::bind_to_canvas(&mut primary_window);

    // Nearest-neighbour sampling keeps the flat-coloured placeholder art crisp. All textures and
    // sounds are generated at runtime, so no asset folder settings are needed here.
    let default_plugins = DefaultPlugins
        .set(WindowPlugin {
            primary_window: Some(primary_window),
            ..default()
        })
        .set(ImagePlugin::default_nearest());

    App::new()
        .insert_resource(ClearColor(palette::NIGHT.into()))
        .add_plugins(default_plugins)
        .add_plugins(EcoHeroPlugin)
        .run();
}
