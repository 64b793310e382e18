//! Raycast-suspension car.
//!
//! The chassis is an ordinary dynamic body; four rapier raycast wheels carry it.
//! The car's forward is local -Z, its axle local +X. Front wheels (0, 1) steer,
//! rear wheels (2, 3) drive.

use crate::collision::{Quat, Vec3};
use crate::constants::{
    BRAKE_FORCE, CHASSIS_ANGULAR_DAMPING, CHASSIS_COLLIDER_OFFSET, CHASSIS_HALF_EXTENTS,
    CHASSIS_LINEAR_DAMPING, CHASSIS_MASS, IDLE_BRAKE_FORCE, MAX_ENGINE_FORCE, MAX_STEER,
    STEER_RATE, VEHICLE_EXIT_OFFSET, WHEEL_DAMPING, WHEEL_FRICTION_SLIP, WHEEL_HALF_BASE,
    WHEEL_HALF_TRACK, WHEEL_MAX_SUSPENSION_FORCE, WHEEL_MAX_TRAVEL, WHEEL_RADIUS,
    WHEEL_REST_LENGTH, WHEEL_STIFFNESS,
};
use crate::input::{Action, InputFrame};
use crate::physics::{BodyDef, BodyKind, PhysicsWorld};
use rapier3d::control::{DynamicRayCastVehicleController, WheelTuning};
use rapier3d::na::Point3;
use rapier3d::prelude::{ColliderHandle, RigidBodyHandle};

const FRONT_WHEELS: [usize; 2] = [0, 1];
const REAR_WHEELS: [usize; 2] = [2, 3];

/// Driver intent for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VehicleControl {
    /// -1 (reverse) ..= 1 (forward).
    pub throttle: f32,
    /// -1 (right) ..= 1 (left).
    pub steer: f32,
    pub brake: bool,
}

impl VehicleControl {
    pub fn from_input(input: &InputFrame) -> Self {
        let axis = |pos: Action, neg: Action| {
            (input.is_action(pos) as i8 - input.is_action(neg) as i8) as f32
        };
        Self {
            throttle: axis(Action::Forward, Action::Backward),
            steer: axis(Action::Left, Action::Right),
            brake: input.is_action(Action::Jump),
        }
    }
}

pub struct Vehicle {
    controller: DynamicRayCastVehicleController,
    collider: ColliderHandle,
    steer_current: f32,
    steer_target: f32,
    engine_force: f32,
    brake: f32,
}

impl std::fmt::Debug for Vehicle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vehicle")
            .field("chassis", &self.controller.chassis)
            .field("steer_current", &self.steer_current)
            .field("engine_force", &self.engine_force)
            .field("brake", &self.brake)
            .finish_non_exhaustive()
    }
}

impl Vehicle {
    pub fn spawn(physics: &mut PhysicsWorld, position: Vec3) -> Self {
        let [hx, hy, hz] = CHASSIS_HALF_EXTENTS;
        let def = BodyDef::cuboid(position, Vec3::new(hx, hy, hz), BodyKind::Dynamic)
            .with_mass(CHASSIS_MASS)
            .with_collider_offset(Vec3::new(0.0, CHASSIS_COLLIDER_OFFSET, 0.0))
            .with_damping(CHASSIS_LINEAR_DAMPING, CHASSIS_ANGULAR_DAMPING);
        let (chassis, collider) = physics.insert(&def);

        let tuning = WheelTuning {
            suspension_stiffness: WHEEL_STIFFNESS,
            suspension_compression: WHEEL_DAMPING,
            suspension_damping: WHEEL_DAMPING,
            max_suspension_travel: WHEEL_MAX_TRAVEL,
            friction_slip: WHEEL_FRICTION_SLIP,
            max_suspension_force: WHEEL_MAX_SUSPENSION_FORCE,
            ..WheelTuning::default()
        };

        let mut controller = DynamicRayCastVehicleController::new(chassis);
        controller.index_up_axis = 1;
        controller.index_forward_axis = 2;
        let connections = [
            (WHEEL_HALF_TRACK, -WHEEL_HALF_BASE),
            (-WHEEL_HALF_TRACK, -WHEEL_HALF_BASE),
            (WHEEL_HALF_TRACK, WHEEL_HALF_BASE),
            (-WHEEL_HALF_TRACK, WHEEL_HALF_BASE),
        ];
        for (x, z) in connections {
            controller.add_wheel(
                Point3::new(x, 0.0, z),
                -Vec3::y(),
                Vec3::x(),
                WHEEL_REST_LENGTH,
                WHEEL_RADIUS,
                &tuning,
            );
        }

        Self {
            controller,
            collider,
            steer_current: 0.0,
            steer_target: 0.0,
            engine_force: 0.0,
            brake: IDLE_BRAKE_FORCE,
        }
    }

    pub fn chassis(&self) -> RigidBodyHandle {
        self.controller.chassis
    }

    pub fn collider(&self) -> ColliderHandle {
        self.collider
    }

    /// Set driver intent. `None` means nobody is driving: coast to a stop.
    pub fn control(&mut self, control: Option<VehicleControl>) {
        match control {
            Some(c) => {
                self.steer_target = c.steer.clamp(-1.0, 1.0) * MAX_STEER;
                self.engine_force = c.throttle.clamp(-1.0, 1.0) * MAX_ENGINE_FORCE;
                self.brake = if c.brake { BRAKE_FORCE } else { 0.0 };
            }
            None => {
                self.steer_target = 0.0;
                self.engine_force = 0.0;
                self.brake = IDLE_BRAKE_FORCE;
            }
        }
    }

    /// Per-frame steering smoothing.
    pub fn update(&mut self, dt: f32) {
        let t = (STEER_RATE * dt).clamp(0.0, 1.0);
        self.steer_current += (self.steer_target - self.steer_current) * t;
    }

    pub fn steering(&self) -> f32 {
        self.steer_current
    }

    pub fn engine_force(&self) -> f32 {
        self.engine_force
    }

    pub fn brake(&self) -> f32 {
        self.brake
    }

    /// Push wheel state into the controller and solve suspension for one substep.
    pub fn apply(&mut self, physics: &mut PhysicsWorld, dt: f32) {
        if !physics.contains(self.chassis()) {
            return;
        }
        let wheels = self.controller.wheels_mut();
        for (i, wheel) in wheels.iter_mut().enumerate() {
            wheel.steering = if FRONT_WHEELS.contains(&i) {
                self.steer_current
            } else {
                0.0
            };
            wheel.engine_force = if REAR_WHEELS.contains(&i) {
                self.engine_force
            } else {
                0.0
            };
            wheel.brake = self.brake;
        }
        physics.update_vehicle(&mut self.controller, dt);
    }

    pub fn pose(&self, physics: &PhysicsWorld) -> Option<(Vec3, Quat)> {
        physics.pose(self.chassis())
    }

    /// World-space wheel poses for rendering: center, steering and spin.
    pub fn wheel_poses(&self, physics: &PhysicsWorld) -> Vec<(Vec3, Quat)> {
        let Some((_, chassis_rot)) = self.pose(physics) else {
            return Vec::new();
        };
        self.controller
            .wheels()
            .iter()
            .map(|w| {
                let steer = Quat::from_axis_angle(&Vec3::y_axis(), w.steering);
                let spin = Quat::from_axis_angle(&Vec3::x_axis(), w.rotation);
                (w.center().coords, chassis_rot * steer * spin)
            })
            .collect()
    }

    /// Where a passenger is put down when leaving the car.
    pub fn exit_position(&self, physics: &PhysicsWorld) -> Option<Vec3> {
        let (translation, _) = self.pose(physics)?;
        let [x, y, z] = VEHICLE_EXIT_OFFSET;
        Some(translation + Vec3::new(x, y, z))
    }
}
