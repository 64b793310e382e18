//! Camera placement for every mode the character can be in.

use super::{CharacterController, Mode};
use crate::collision::{Quat, Vec3};
use crate::constants::{
    FREECAM_SPEED, THIRD_PERSON_DISTANCE, THIRD_PERSON_MIN_DISTANCE,
    THIRD_PERSON_OCCLUSION_MARGIN, VEHICLE_CAMERA_DISTANCE, VEHICLE_CAMERA_HEIGHT,
    VEHICLE_CAMERA_OCCLUSION_MARGIN, VEHICLE_CAMERA_PITCH_MAX, VEHICLE_CAMERA_PITCH_MIN,
    VEHICLE_CAMERA_POS_BLEND, VEHICLE_CAMERA_ROT_BLEND, VEHICLE_CAMERA_START_PITCH,
    VEHICLE_SEAT_OFFSET,
};
use crate::input::{Action, InputFrame};
use crate::world::GameWorld;
use std::f32::consts::FRAC_PI_2;

/// Yaw then pitch, the order a first-person view composes them.
pub fn look_rotation(yaw: f32, pitch: f32) -> Quat {
    Quat::from_axis_angle(&Vec3::y_axis(), yaw) * Quat::from_axis_angle(&Vec3::x_axis(), pitch)
}

/// Orientation that points the camera's -Z along `direction`.
fn look_along(direction: Vec3, up: Vec3, fallback: Quat) -> Quat {
    if direction.norm_squared() < 1.0e-8 || direction.cross(&up).norm_squared() < 1.0e-8 {
        return fallback;
    }
    Quat::face_towards(&-direction, &up)
}

/// Derived each frame; never networked.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraRig {
    pub position: Vec3,
    pub rotation: Quat,
    pub up: Vec3,
    /// Look angles, kept so freecam can continue from wherever the camera was.
    pub yaw: f32,
    pub pitch: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            up: Vec3::y(),
            yaw: 0.0,
            pitch: 0.0,
        }
    }
}

impl CameraRig {
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::z()
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::x()
    }

    fn set_look(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch;
        self.rotation = look_rotation(yaw, pitch);
    }

    /// Detached flight along the camera's own axes. `sensitivity` is radians per pixel.
    pub fn fly(&mut self, dt: f32, input: &InputFrame, sensitivity: f32) {
        let [dx, dy] = input.mouse_delta;
        let yaw = self.yaw - dx * sensitivity;
        let pitch = (self.pitch - dy * sensitivity).clamp(-FRAC_PI_2, FRAC_PI_2);
        self.set_look(yaw, pitch);

        let mut step = FREECAM_SPEED * dt;
        if input.is_action(Action::Sprint) {
            step *= 2.0;
        }
        let forward = self.forward();
        let right = self.right();
        let axes = [
            (Action::Forward, forward),
            (Action::Backward, -forward),
            (Action::Right, right),
            (Action::Left, -right),
            (Action::Jump, Vec3::y()),
            (Action::Crouch, -Vec3::y()),
        ];
        for (action, axis) in axes {
            if input.is_action(action) {
                self.position += axis * step;
            }
        }
    }
}

/// Smoothed chassis pose and orbit angles used while driving.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CarCamera {
    pub position: Vec3,
    pub rotation: Quat,
    pub yaw: f32,
    pub pitch: f32,
}

impl Default for CarCamera {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            yaw: 0.0,
            pitch: VEHICLE_CAMERA_START_PITCH,
        }
    }
}

impl CarCamera {
    /// Snap to the chassis and face the car from behind.
    pub fn reset(&mut self, position: Vec3, rotation: Quat) {
        *self = Self {
            position,
            rotation,
            ..Self::default()
        };
    }

    fn follow(&mut self, position: Vec3, rotation: Quat) {
        self.position = self.position.lerp(&position, VEHICLE_CAMERA_POS_BLEND);
        self.rotation = self
            .rotation
            .try_slerp(&rotation, VEHICLE_CAMERA_ROT_BLEND, 1.0e-6)
            .unwrap_or(rotation);
    }
}

impl CharacterController {
    /// On-foot camera: eye height, plus the orbit pull-back in third person.
    pub(super) fn place_camera(&mut self, world: &GameWorld) {
        if self.modes.has(Mode::Freecam) {
            return;
        }
        self.camera.set_look(self.yaw, self.pitch);
        self.camera.position = self.position + Vec3::new(0.0, self.height, 0.0);

        if !self.modes.has(Mode::ThirdPerson) {
            return;
        }
        let back = self.camera.rotation * Vec3::z();
        let mut distance = THIRD_PERSON_DISTANCE;
        if !self.modes.has(Mode::Noclip) {
            if let Some(hit) = world.cast_camera(self.camera.position, back, THIRD_PERSON_DISTANCE) {
                distance = (hit.distance - THIRD_PERSON_OCCLUSION_MARGIN)
                    .max(THIRD_PERSON_MIN_DISTANCE);
            }
        }
        self.camera.position += back * distance;
    }

    /// Chase or seat camera while driving `vehicle`.
    pub(super) fn place_car_camera(&mut self, vehicle: usize, input: &InputFrame, world: &GameWorld) {
        let Some((chassis_pos, chassis_rot)) = world
            .vehicle(vehicle)
            .and_then(|v| v.pose(&world.physics))
        else {
            return;
        };
        self.car_camera.follow(chassis_pos, chassis_rot);
        let [dx, dy] = input.mouse_delta;
        let target = self.car_camera.position;

        if self.modes.has(Mode::ThirdPerson) {
            if input.pointer_locked {
                self.car_camera.yaw -= dx * self.tuning.sensitivity;
                self.car_camera.pitch = (self.car_camera.pitch - dy * self.tuning.sensitivity)
                    .clamp(VEHICLE_CAMERA_PITCH_MIN, VEHICLE_CAMERA_PITCH_MAX);
            }
            let (yaw, pitch) = (self.car_camera.yaw, self.car_camera.pitch);
            let offset = Vec3::new(
                VEHICLE_CAMERA_DISTANCE * yaw.sin() * pitch.cos(),
                VEHICLE_CAMERA_DISTANCE * pitch.sin() + VEHICLE_CAMERA_HEIGHT,
                VEHICLE_CAMERA_DISTANCE * yaw.cos() * pitch.cos(),
            );
            let ideal = target + offset;
            let distance = offset.norm();
            let direction = offset / distance;

            let mut placed = ideal;
            if let Some(hit) = world.cast_camera(target, direction, distance) {
                let pulled = (hit.distance - VEHICLE_CAMERA_OCCLUSION_MARGIN)
                    .max(THIRD_PERSON_MIN_DISTANCE);
                placed = target + direction * pulled;
            }
            self.camera.position = self.camera.position.lerp(&placed, VEHICLE_CAMERA_POS_BLEND);
            self.camera.rotation = look_along(
                target - self.camera.position,
                Vec3::y(),
                self.camera.rotation,
            );
        } else {
            if input.pointer_locked {
                self.yaw -= dx * self.tuning.sensitivity;
                self.pitch = (self.pitch - dy * self.tuning.sensitivity).clamp(-FRAC_PI_2, FRAC_PI_2);
            }
            let [sx, sy, sz] = VEHICLE_SEAT_OFFSET;
            let chassis = self.car_camera.rotation;
            self.camera.position = target + chassis * Vec3::new(sx, sy, sz);

            let look = chassis * (look_rotation(self.yaw, self.pitch) * -Vec3::z());
            let chassis_up = chassis * Vec3::y();
            self.camera.up = self
                .camera
                .up
                .lerp(&chassis_up, VEHICLE_CAMERA_ROT_BLEND)
                .try_normalize(1.0e-6)
                .unwrap_or(chassis_up);
            self.camera.rotation = look_along(look, self.camera.up, self.camera.rotation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn look_rotation_faces_minus_z_at_rest() {
        let rig = CameraRig::default();
        assert!((rig.forward() - -Vec3::z()).norm() < 1e-6);
        let turned = look_rotation(FRAC_PI_2, 0.0) * -Vec3::z();
        assert!((turned - -Vec3::x()).norm() < 1e-5);
    }

    #[test]
    fn look_along_points_forward() {
        let dir = Vec3::new(1.0, -0.5, 0.2).normalize();
        let rot = look_along(dir, Vec3::y(), Quat::identity());
        assert!(((rot * -Vec3::z()) - dir).norm() < 1e-5);
        let fallback = look_rotation(0.3, 0.0);
        assert_eq!(look_along(Vec3::y(), Vec3::y(), fallback), fallback);
    }

    #[test]
    fn freecam_flies_along_view_and_doubles_with_sprint() {
        let mut rig = CameraRig::default();
        let mut input = InputFrame {
            pointer_locked: true,
            ..Default::default()
        };
        input.press(Action::Forward);
        rig.fly(0.5, &input, 0.002);
        assert!((rig.position - Vec3::new(0.0, 0.0, -10.0)).norm() < 1e-4);

        input.press(Action::Sprint);
        rig.fly(0.5, &input, 0.002);
        assert!((rig.position.z + 30.0).abs() < 1e-3);
    }

    #[test]
    fn freecam_look_scales_with_sensitivity() {
        let mut input = InputFrame {
            pointer_locked: true,
            ..Default::default()
        };
        input.add_mouse_motion(100.0, 0.0);
        let mut slow = CameraRig::default();
        let mut fast = CameraRig::default();
        slow.fly(0.0, &input, 0.001);
        fast.fly(0.0, &input, 0.004);
        assert!((slow.yaw + 0.1).abs() < 1e-6);
        assert!((fast.yaw + 0.4).abs() < 1e-6);
    }
}
