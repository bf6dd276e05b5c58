//! Browser-only setup. Panics are routed to the developer console and the window is bound to the
//! page's canvas instead of opening a new one.

use bevy::window::Window;

/// Without a hook, a panic in WASM only shows up as an opaque `unreachable` trap.
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Renders into `#bevy-canvas`, scaled to fill its parent element.
pub fn bind_to_canvas(window: &mut Window) {
    window.canvas = Some("#bevy-canvas".to_owned());
    window.fit_canvas_to_parent = true;
    // Arrow keys and space would otherwise scroll the page.
    window.prevent_default_event_handling = true;
}
