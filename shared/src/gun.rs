//! The physics gun: raycast grab, hold, rotate and freeze.
//!
//! State machine:
//! - `Idle`: Fire not held.
//! - `Aiming`: Fire held, nothing grabbed; ray cast every tick.
//! - `Holding`: Fire held with a body grabbed at a fixed hold distance.
//!
//! Network side effects go through an [`ObjectAuthority`] so the gun never has
//! to know how ownership is replicated.

use crate::collision::{Quat, Vec3};
use crate::constants::{
    DEFAULT_ANGULAR_DAMPING, GUN_ANGULAR_DECAY, GUN_ROTATE_SPEED, GUN_SCROLL_SCALE,
    GUN_TRACKING_GAIN, MAX_GRAB_DISTANCE, MAX_VISUAL_DISTANCE, MIN_HOLD_DISTANCE,
    MIN_HOLD_DISTANCE_THIRD_PERSON, SYNCED_OBJECT_MASS,
};
use crate::input::{Action, InputFrame};
use crate::physics::{BodyKind, PhysicsWorld};
use crate::world::{Capability, EntityRef, GameWorld};
use rapier3d::prelude::RigidBodyHandle;

/// Ownership operations on synced objects.
pub trait ObjectAuthority {
    /// Ask to become the object's owner. No-op while it is frozen.
    fn claim(&mut self, world: &mut GameWorld, key: &str);

    /// Pin the object and clear its owner. Returns false if refused.
    fn freeze(&mut self, world: &mut GameWorld, key: &str) -> bool;

    /// Release the pin and take ownership.
    fn unfreeze(&mut self, world: &mut GameWorld, key: &str);

    /// Whether this client may apply forces to the object right now.
    fn may_drive(&self, world: &GameWorld, key: &str) -> bool;
}

/// Where the shot comes from this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GunView {
    /// Camera position; rays and the hold point are measured from here.
    pub eye: Vec3,
    pub rotation: Quat,
    /// Muzzle, the visual start of the ray.
    pub muzzle: Vec3,
    pub third_person: bool,
}

impl GunView {
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::z()
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::x()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Held {
    pub body: RigidBodyHandle,
    /// Network key when the body is a synced object.
    pub key: Option<String>,
    pub distance: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum GunState {
    #[default]
    Idle,
    Aiming,
    Holding(Held),
}

/// What other clients get to see of the gun.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GunTelemetry {
    pub holding: bool,
    pub firing: bool,
    pub distance: f32,
}

#[derive(Debug)]
pub struct PhysicsGun {
    active: bool,
    state: GunState,
    max_grab_distance: f32,
    ray: Option<(Vec3, Vec3)>,
    telemetry: GunTelemetry,
}

impl Default for PhysicsGun {
    fn default() -> Self {
        Self {
            active: true,
            state: GunState::Idle,
            max_grab_distance: MAX_GRAB_DISTANCE,
            ray: None,
            telemetry: GunTelemetry::default(),
        }
    }
}

impl PhysicsGun {
    pub fn state(&self) -> &GunState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn held(&self) -> Option<&Held> {
        match &self.state {
            GunState::Holding(held) => Some(held),
            _ => None,
        }
    }

    /// Ray visual from muzzle to end point, while firing.
    pub fn ray(&self) -> Option<(Vec3, Vec3)> {
        self.ray
    }

    pub fn telemetry(&self) -> GunTelemetry {
        self.telemetry
    }

    pub fn set_max_grab_distance(&mut self, distance: f32) {
        self.max_grab_distance = distance.max(MIN_HOLD_DISTANCE);
    }

    /// Holstering drops whatever is held.
    pub fn set_active(&mut self, active: bool, physics: &mut PhysicsWorld) {
        self.active = active;
        if !active {
            self.release(physics);
        }
    }

    /// Drop the held body. Dynamic bodies get their default angular damping back.
    pub fn release(&mut self, physics: &mut PhysicsWorld) {
        if let GunState::Holding(held) = &self.state {
            if physics.kind(held.body) == Some(BodyKind::Dynamic) {
                physics.set_angular_damping(held.body, DEFAULT_ANGULAR_DAMPING);
            }
            log::debug!("gun released {:?}", held.body);
        }
        self.state = GunState::Idle;
        self.ray = None;
    }

    /// True while mouse motion rotates the held body instead of the view.
    pub fn is_rotating(&self, input: &InputFrame, physics: &PhysicsWorld) -> bool {
        input.is_action(Action::Rotate)
            && self
                .held()
                .is_some_and(|h| physics.kind(h.body) == Some(BodyKind::Dynamic))
    }

    pub fn update(
        &mut self,
        dt: f32,
        input: &InputFrame,
        view: &GunView,
        world: &mut GameWorld,
        authority: &mut dyn ObjectAuthority,
    ) {
        let fire = input.is_action(Action::Fire);
        self.telemetry = GunTelemetry {
            holding: self.active,
            firing: self.held().is_some() || fire,
            distance: self.held().map_or(MAX_VISUAL_DISTANCE, |h| h.distance),
        };

        if !input.pointer_locked || !self.active {
            return;
        }
        if !fire {
            self.release(&mut world.physics);
            return;
        }

        match self.state.clone() {
            GunState::Idle | GunState::Aiming => self.aim(view, world, authority),
            GunState::Holding(held) => self.hold(dt, input, view, held, world, authority),
        }
    }

    fn aim(&mut self, view: &GunView, world: &mut GameWorld, authority: &mut dyn ObjectAuthority) {
        self.state = GunState::Aiming;
        let forward = view.forward();
        let mut end = view.eye + forward * MAX_VISUAL_DISTANCE;

        if let Some(hit) = world.cast_obstacles(view.eye, forward, MAX_VISUAL_DISTANCE) {
            end = hit.point.coords;
            let grabbable = hit
                .body
                .filter(|b| world.capabilities(*b).has(Capability::Simulatable));
            if let Some(body) = grabbable.filter(|_| hit.distance <= self.max_grab_distance) {
                let key = match world.entity_for_body(body) {
                    Some(EntityRef::Synced(key)) => Some(key.clone()),
                    _ => None,
                };
                if let Some(key) = &key {
                    authority.claim(world, key);
                }
                log::debug!("gun grabbed {body:?} at {:.2}", hit.distance);
                self.state = GunState::Holding(Held {
                    body,
                    key,
                    distance: hit.distance,
                });
            }
        }
        self.ray = Some((view.muzzle, end));
    }

    fn hold(
        &mut self,
        dt: f32,
        input: &InputFrame,
        view: &GunView,
        mut held: Held,
        world: &mut GameWorld,
        authority: &mut dyn ObjectAuthority,
    ) {
        if !world.physics.contains(held.body) {
            self.release(&mut world.physics);
            return;
        }

        if input.is_action_pressed(Action::AltFire) {
            match world.physics.kind(held.body) {
                Some(BodyKind::Dynamic) => {
                    let frozen = match &held.key {
                        Some(key) => authority.freeze(world, key),
                        None => {
                            world.physics.set_kind(held.body, BodyKind::Static, 0.0);
                            true
                        }
                    };
                    if frozen {
                        self.release(&mut world.physics);
                        return;
                    }
                }
                Some(BodyKind::Static) => match &held.key {
                    Some(key) => authority.unfreeze(world, key),
                    None => {
                        world
                            .physics
                            .set_kind(held.body, BodyKind::Dynamic, SYNCED_OBJECT_MASS)
                    }
                },
                None => {}
            }
        }

        let dynamic = world.physics.kind(held.body) == Some(BodyKind::Dynamic);
        if dynamic && input.scroll != 0.0 {
            let min = if view.third_person {
                MIN_HOLD_DISTANCE_THIRD_PERSON
            } else {
                MIN_HOLD_DISTANCE
            };
            held.distance = (held.distance - input.scroll * GUN_SCROLL_SCALE)
                .clamp(min, self.max_grab_distance.max(min));
        }

        let Some((current, rotation)) = world.physics.pose(held.body) else {
            return;
        };
        self.ray = Some((view.muzzle, current));

        let may_drive = held
            .key
            .as_deref()
            .is_none_or(|key| authority.may_drive(world, key));
        if dynamic && may_drive && dt > 0.0 {
            let target = view.eye + view.forward() * held.distance;
            if input.is_action(Action::Rotate) {
                let [dx, dy] = input.mouse_delta;
                let yaw = Quat::from_axis_angle(&Vec3::y_axis(), dx * GUN_ROTATE_SPEED);
                let pitch = match rapier3d::na::Unit::try_new(view.right(), 1.0e-6) {
                    Some(axis) => Quat::from_axis_angle(&axis, dy * GUN_ROTATE_SPEED),
                    None => Quat::identity(),
                };
                world
                    .physics
                    .set_pose(held.body, current, pitch * yaw * rotation);
                let linvel = (target - current) * GUN_TRACKING_GAIN;
                world.physics.set_velocity(held.body, linvel, Vec3::zeros());
            } else {
                let step = current.lerp(&target, (GUN_TRACKING_GAIN * dt).min(1.0));
                let linvel = (step - current) / dt;
                let angvel = world
                    .physics
                    .velocity(held.body)
                    .map_or(Vec3::zeros(), |(_, ang)| ang * GUN_ANGULAR_DECAY);
                world.physics.set_velocity(held.body, linvel, angvel);
            }
        }

        self.state = GunState::Holding(held);
    }
}
