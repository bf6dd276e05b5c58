//! Shared colour palette. Every sprite in the game is a flat-coloured placeholder, so these
//! constants double as the game's "art".

use bevy::color::Srgba;

pub const NIGHT: Srgba = Srgba::rgb(0.102, 0.102, 0.180);
pub const MIDNIGHT: Srgba = Srgba::rgb(0.173, 0.243, 0.314);
pub const SLATE: Srgba = Srgba::rgb(0.204, 0.286, 0.369);

pub const ECO_GREEN: Srgba = Srgba::rgb(0.180, 0.800, 0.443);
pub const DEEP_GREEN: Srgba = Srgba::rgb(0.153, 0.682, 0.376);
pub const TURQUOISE: Srgba = Srgba::rgb(0.102, 0.737, 0.612);
pub const SUN_YELLOW: Srgba = Srgba::rgb(0.945, 0.769, 0.059);
pub const ORANGE: Srgba = Srgba::rgb(0.953, 0.612, 0.071);
pub const ALERT_RED: Srgba = Srgba::rgb(0.906, 0.298, 0.235);
pub const CLOUD: Srgba = Srgba::rgb(0.925, 0.941, 0.945);
pub const SILVER: Srgba = Srgba::rgb(0.584, 0.647, 0.651);
pub const ASBESTOS: Srgba = Srgba::rgb(0.498, 0.549, 0.553);

pub const HERO_BLUE: Srgba = Srgba::rgb(0.204, 0.596, 0.859);
pub const SKIN: Srgba = Srgba::rgb(0.961, 0.796, 0.655);

pub const BOSS_PURPLE: Srgba = Srgba::rgb(0.557, 0.267, 0.678);
pub const TRASH_PURPLE: Srgba = Srgba::rgb(0.608, 0.349, 0.714);

pub const CAN_GREY: Srgba = Srgba::rgb(0.741, 0.765, 0.780);
pub const CUP_ORANGE: Srgba = Srgba::rgb(0.902, 0.494, 0.133);
pub const TOXIC_GREEN: Srgba = Srgba::rgb(0.298, 0.686, 0.314);
pub const BRICK: Srgba = Srgba::rgb(0.753, 0.224, 0.169);

pub const CANTEEN_BACKDROP: Srgba = MIDNIGHT;
pub const GARDEN_BACKDROP: Srgba = Srgba::rgb(0.102, 0.278, 0.165);
pub const ROOFTOP_BACKDROP: Srgba = Srgba::rgb(0.357, 0.173, 0.435);
