//! nalgebra (simulation core) to glam (Bevy) conversions.

use bevy::prelude::*;
use nalgebra::{UnitQuaternion, Vector3};

type CoreVec3 = Vector3<f32>;
type CoreQuat = UnitQuaternion<f32>;

pub fn to_vec3(v: &CoreVec3) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub fn to_quat(q: &CoreQuat) -> Quat {
    let c = q.quaternion().coords;
    Quat::from_xyzw(c.x, c.y, c.z, c.w)
}

pub fn transform(position: &CoreVec3, rotation: &CoreQuat) -> Transform {
    Transform::from_translation(to_vec3(position)).with_rotation(to_quat(rotation))
}

/// `0xRRGGBB` to an sRGB color.
pub fn color(rgb: u32) -> Color {
    Color::srgb_u8((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn rotation_survives_conversion() {
        let core = CoreQuat::from_axis_angle(&CoreVec3::y_axis(), FRAC_PI_2);
        let forward = to_quat(&core) * Vec3::NEG_Z;
        assert!((forward - Vec3::NEG_X).length() < 1e-5);
    }

    #[test]
    fn packed_color_channels() {
        let c = color(0xff8000).to_srgba();
        assert!((c.red - 1.0).abs() < 1e-3);
        assert!((c.green - 128.0 / 255.0).abs() < 1e-3);
        assert!(c.blue.abs() < 1e-3);
    }
}
