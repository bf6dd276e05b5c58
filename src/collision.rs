use bevy::math::Rect;
use bevy::prelude::*;

/// Solid platform rectangles for the level that is currently loaded, in world units.
///
/// The level plugin rebuilds this every time a level is spawned; every other system only reads
/// it (kinematics, projectile landing, enemy footing).
#[derive(Resource, Default)]
pub struct CollisionMap {
    pub solids: Vec<Rect>,
}

impl CollisionMap {
    pub fn clear(&mut self) {
        self.solids.clear();
    }

    pub fn add_solid(&mut self, rect: Rect) {
        self.solids.push(rect);
    }

    pub fn overlapping(&self, aabb: Rect) -> impl Iterator<Item = &Rect> + '_ {
        self.solids.iter().filter(move |solid| overlaps(**solid, aabb))
    }

    pub fn is_solid(&self, aabb: Rect) -> bool {
        self.overlapping(aabb).next().is_some()
    }
}

/// Axis-aligned box from a centre and half extents.
pub fn aabb(center: Vec2, half_extents: Vec2) -> Rect {
    Rect::from_center_half_size(center, half_extents)
}

/// Strict overlap test: boxes that merely share an edge do not collide.
pub fn overlaps(a: Rect, b: Rect) -> bool {
    a.min.x < b.max.x && a.max.x > b.min.x && a.min.y < b.max.y && a.max.y > b.min.y
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform() -> Rect {
        Rect::new(0.0, 0.0, 64.0, 32.0)
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        let above = aabb(Vec2::new(32.0, 52.0), Vec2::new(10.0, 20.0));
        assert!(!overlaps(platform(), above));

        let sunk = aabb(Vec2::new(32.0, 51.0), Vec2::new(10.0, 20.0));
        assert!(overlaps(platform(), sunk));
    }

    #[test]
    fn map_reports_overlapping_solids() {
        let mut map = CollisionMap::default();
        map.add_solid(platform());
        map.add_solid(Rect::new(100.0, 0.0, 164.0, 32.0));

        let probe = aabb(Vec2::new(120.0, 30.0), Vec2::splat(5.0));
        assert_eq!(map.overlapping(probe).count(), 1);
        assert!(map.is_solid(probe));

        map.clear();
        assert!(!map.is_solid(probe));
    }
}
