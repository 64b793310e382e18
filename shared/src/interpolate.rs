use crate::collision::{Quat, Vec3};
use std::f32::consts::{PI, TAU};

/// Frame-rate independent smoothing factor for an exponential approach at `rate` (1/s).
///
/// For small `rate * dt` this is ≈ `rate * dt`.
#[inline]
pub fn smoothing(rate: f32, dt: f32) -> f32 {
    1.0 - (-rate * dt.max(0.0)).exp()
}

/// Move `current` toward `target` by the exponential factor for `rate`.
#[inline]
pub fn approach(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    current + (target - current) * smoothing(rate, dt)
}

/// Signed angular difference `to - from`, wrapped into (-π, π].
pub fn shortest_angle(from: f32, to: f32) -> f32 {
    let mut diff = (to - from) % TAU;
    if diff > PI {
        diff -= TAU;
    } else if diff <= -PI {
        diff += TAU;
    }
    diff
}

/// Blend a position/orientation pair toward a target with factor `t`.
pub fn blend_pose(position: &mut Vec3, rotation: &mut Quat, target: (&Vec3, &Quat), t: f32) {
    let t = t.clamp(0.0, 1.0);
    *position = position.lerp(target.0, t);
    *rotation = rotation
        .try_slerp(target.1, t, 1.0e-6)
        .unwrap_or(*target.1);
}
