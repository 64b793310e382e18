/*!
Core collision types and math aliases shared by the character controller.

The character is not a rigid body. It is an axis-aligned box tested against the
world-space bounds of every obstacle, so this module only needs bounds math.
*/

use nalgebra as na;
use rapier3d::parry::bounding_volume::Aabb;
use rapier3d::parry::shape::Cuboid;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// World-space bounds of an oriented cuboid.
///
/// The rotation is folded into the extents (quaternion-projected half-extents),
/// so a rotated box yields a conservative axis-aligned approximation.
pub fn oriented_box_bounds(center: Vec3, rotation: Quat, half_extents: Vec3) -> Aabb {
    let iso = Iso::from_parts(na::Translation3::from(center), rotation);
    Cuboid::new(half_extents).aabb(&iso)
}

/// Bounds of the player standing with feet at `feet`.
pub fn player_bounds(feet: Vec3, half_width: f32, height: f32) -> Aabb {
    Aabb::new(
        na::Point3::new(feet.x - half_width, feet.y, feet.z - half_width),
        na::Point3::new(feet.x + half_width, feet.y + height, feet.z + half_width),
    )
}

/// Strict overlap: boxes that merely touch (a player standing exactly on a top
/// face) do not collide.
#[inline]
pub fn overlaps_strict(a: &Aabb, b: &Aabb) -> bool {
    (0..3).all(|i| a.mins[i] < b.maxs[i] && a.maxs[i] > b.mins[i])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn rotated_box_bounds_grow() {
        let half = Vec3::new(1.0, 0.5, 1.0);
        let flat = oriented_box_bounds(Vec3::zeros(), Quat::identity(), half);
        let turned = oriented_box_bounds(
            Vec3::zeros(),
            Quat::from_axis_angle(&Vec3::y_axis(), FRAC_PI_4),
            half,
        );
        assert!((flat.maxs.x - 1.0).abs() < 1e-5);
        assert!((turned.maxs.x - 2.0_f32.sqrt()).abs() < 1e-4);
        assert!((turned.maxs.y - 0.5).abs() < 1e-5);
    }

    #[test]
    fn touching_is_not_overlapping() {
        let ground = oriented_box_bounds(
            Vec3::new(0.0, 0.5, 0.0),
            Quat::identity(),
            Vec3::new(1.0, 0.5, 1.0),
        );
        let standing = player_bounds(Vec3::new(0.0, 1.0, 0.0), 0.3, 2.0);
        assert!(!overlaps_strict(&standing, &ground));

        let sunk = player_bounds(Vec3::new(0.0, 0.99, 0.0), 0.3, 2.0);
        assert!(overlaps_strict(&sunk, &ground));
    }
}
