//! Rigid-body simulation.
//!
//! `PhysicsWorld` exclusively owns every body and collider. Gameplay code holds
//! handles and goes through the methods here, which keep the body-type invariant:
//! a static body reports mass 0 and never carries velocity.

mod shapes;

pub use shapes::{BodyDef, BodyKind, ColliderShapeDef, collider_from_def, rigid_body_from_def};

use crate::constants::{MAX_PHYSICS_SUBSTEPS, PHYSICS_TIMESTEP, WORLD_GRAVITY};
use rapier3d::control::DynamicRayCastVehicleController;
use rapier3d::na::{Point3, UnitQuaternion, Vector3};
use rapier3d::prelude::*;
use std::fmt;

/// Slack so that accumulated float error does not drop a substep.
const STEP_EPSILON: f32 = 1.0e-6;

/// Result of a ray cast into the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub collider: ColliderHandle,
    /// Body the collider is attached to, if any.
    pub body: Option<RigidBodyHandle>,
    pub distance: f32,
    pub point: Point3<f32>,
}

pub struct PhysicsWorld {
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pub broad_phase: BroadPhaseBvh,
    pub narrow_phase: NarrowPhase,
    islands: IslandManager,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    pipeline: PhysicsPipeline,
    params: IntegrationParameters,
    gravity: Vector<f32>,
    accumulator: f32,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("body_count", &self.bodies.len())
            .field("collider_count", &self.colliders.len())
            .field("gravity", &self.gravity)
            .finish_non_exhaustive()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        let params = IntegrationParameters {
            dt: PHYSICS_TIMESTEP,
            ..Default::default()
        };

        Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            islands: IslandManager::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            pipeline: PhysicsPipeline::new(),
            params,
            gravity: Vector::new(0.0, -WORLD_GRAVITY, 0.0),
            accumulator: 0.0,
        }
    }

    pub fn insert(&mut self, def: &BodyDef) -> (RigidBodyHandle, ColliderHandle) {
        let body = self.bodies.insert(rigid_body_from_def(def));
        let collider =
            self.colliders
                .insert_with_parent(collider_from_def(def), body, &mut self.bodies);
        (body, collider)
    }

    /// Removes a body and its attached colliders. Unknown handles are ignored.
    pub fn remove(&mut self, handle: RigidBodyHandle) {
        self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    pub fn contains(&self, handle: RigidBodyHandle) -> bool {
        self.bodies.contains(handle)
    }

    pub fn body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    pub fn body_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    pub fn body_of(&self, collider: ColliderHandle) -> Option<RigidBodyHandle> {
        self.colliders.get(collider).and_then(|c| c.parent())
    }

    pub fn pose(&self, handle: RigidBodyHandle) -> Option<(Vector3<f32>, UnitQuaternion<f32>)> {
        self.bodies
            .get(handle)
            .map(|b| (*b.translation(), *b.rotation()))
    }

    pub fn kind(&self, handle: RigidBodyHandle) -> Option<BodyKind> {
        self.bodies.get(handle).map(|b| {
            if b.is_dynamic() {
                BodyKind::Dynamic
            } else {
                BodyKind::Static
            }
        })
    }

    /// Mass as seen by gameplay: 0 for anything that is not dynamic.
    pub fn mass(&self, handle: RigidBodyHandle) -> f32 {
        match self.bodies.get(handle) {
            Some(b) if b.is_dynamic() => b.mass(),
            _ => 0.0,
        }
    }

    /// Switch a body between simulated and pinned.
    ///
    /// Static bodies lose all velocity. Dynamic bodies get `mass` spread over their
    /// colliders and are woken up.
    pub fn set_kind(&mut self, handle: RigidBodyHandle, kind: BodyKind, mass: f32) {
        let Some(body) = self.bodies.get_mut(handle) else {
            return;
        };
        match kind {
            BodyKind::Static => {
                body.set_linvel(Vector::zeros(), false);
                body.set_angvel(Vector::zeros(), false);
                body.set_body_type(RigidBodyType::Fixed, false);
            }
            BodyKind::Dynamic => {
                body.set_body_type(RigidBodyType::Dynamic, true);
                let attached = body.colliders().to_vec();
                let share = mass / attached.len().max(1) as f32;
                for ch in &attached {
                    if let Some(collider) = self.colliders.get_mut(*ch) {
                        collider.set_mass(share);
                    }
                }
                if let Some(body) = self.bodies.get_mut(handle) {
                    body.recompute_mass_properties_from_colliders(&self.colliders);
                    body.wake_up(true);
                }
            }
        }
    }

    /// Teleport a body. Velocities are left untouched.
    pub fn set_pose(
        &mut self,
        handle: RigidBodyHandle,
        translation: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
    ) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.set_translation(translation, false);
            body.set_rotation(rotation, false);
        }
    }

    /// Set both velocities. Ignored for static bodies, which must stay at rest.
    pub fn set_velocity(
        &mut self,
        handle: RigidBodyHandle,
        linvel: Vector3<f32>,
        angvel: Vector3<f32>,
    ) {
        if let Some(body) = self.bodies.get_mut(handle) {
            if body.is_dynamic() {
                body.set_linvel(linvel, true);
                body.set_angvel(angvel, true);
            }
        }
    }

    pub fn velocity(&self, handle: RigidBodyHandle) -> Option<(Vector3<f32>, Vector3<f32>)> {
        self.bodies.get(handle).map(|b| (*b.linvel(), *b.angvel()))
    }

    pub fn set_angular_damping(&mut self, handle: RigidBodyHandle, damping: f32) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.set_angular_damping(damping);
        }
    }

    /// Cast a ray and return the closest hit among colliders accepted by `accept`.
    ///
    /// An empty world or an empty accept set simply yields `None`.
    pub fn cast_ray(
        &self,
        origin: Point3<f32>,
        direction: Vector3<f32>,
        max_distance: f32,
        accept: impl Fn(ColliderHandle) -> bool,
    ) -> Option<RayHit> {
        let dir = direction.try_normalize(1.0e-6)?;
        let predicate = |handle: ColliderHandle, _: &Collider| accept(handle);
        let filter = QueryFilter::default().predicate(&predicate);
        let queries = self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        );
        let ray = Ray::new(origin, dir);
        let (collider, distance) = queries.cast_ray(&ray, max_distance, true)?;
        Some(RayHit {
            collider,
            body: self.body_of(collider),
            distance,
            point: ray.point_at(distance),
        })
    }

    /// Advance by `dt` using fixed substeps. `before_substep` runs ahead of each
    /// substep so controllers (vehicles) can apply their forces.
    ///
    /// Returns the number of substeps taken.
    pub fn step(&mut self, dt: f32, mut before_substep: impl FnMut(&mut Self, f32)) -> u32 {
        let max_backlog = PHYSICS_TIMESTEP * MAX_PHYSICS_SUBSTEPS as f32;
        self.accumulator = (self.accumulator + dt.max(0.0)).min(max_backlog);

        let mut steps = 0;
        while self.accumulator + STEP_EPSILON >= PHYSICS_TIMESTEP && steps < MAX_PHYSICS_SUBSTEPS {
            before_substep(self, PHYSICS_TIMESTEP);
            self.step_once();
            self.accumulator = (self.accumulator - PHYSICS_TIMESTEP).max(0.0);
            steps += 1;
        }
        steps
    }

    /// Advance by exactly one fixed substep.
    pub fn step_once(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }

    /// Run a raycast vehicle's suspension and friction solve for one substep.
    pub fn update_vehicle(&mut self, vehicle: &mut DynamicRayCastVehicleController, dt: f32) {
        let filter = QueryFilter::default().exclude_rigid_body(vehicle.chassis);
        let queries = self.broad_phase.as_query_pipeline_mut(
            self.narrow_phase.query_dispatcher(),
            &mut self.bodies,
            &mut self.colliders,
            filter,
        );
        vehicle.update_vehicle(dt, queries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SYNCED_OBJECT_MASS;

    fn world_with_box() -> (PhysicsWorld, RigidBodyHandle, ColliderHandle) {
        let mut world = PhysicsWorld::new();
        world.insert(&BodyDef {
            shape: ColliderShapeDef::Plane,
            ..BodyDef::cuboid(Vector::zeros(), Vector::zeros(), BodyKind::Static)
        });
        let (body, collider) = world.insert(
            &BodyDef::cuboid(
                Vector::new(0.0, 1.0, -5.0),
                Vector::new(0.5, 0.5, 0.5),
                BodyKind::Dynamic,
            )
            .with_mass(SYNCED_OBJECT_MASS),
        );
        world.step_once();
        (world, body, collider)
    }

    #[test]
    fn freezing_zeroes_mass_and_velocity() {
        let (mut world, body, _) = world_with_box();
        world.set_velocity(body, Vector::new(1.0, 2.0, 3.0), Vector::new(0.0, 1.0, 0.0));

        world.set_kind(body, BodyKind::Static, SYNCED_OBJECT_MASS);
        assert_eq!(world.kind(body), Some(BodyKind::Static));
        assert_eq!(world.mass(body), 0.0);
        let (lin, ang) = world.velocity(body).unwrap();
        assert_eq!(lin, Vector::zeros());
        assert_eq!(ang, Vector::zeros());

        // velocities written to a static body are dropped
        world.set_velocity(body, Vector::new(5.0, 0.0, 0.0), Vector::zeros());
        assert_eq!(world.velocity(body).unwrap().0, Vector::zeros());
    }

    #[test]
    fn unfreezing_restores_mass_and_wakes() {
        let (mut world, body, _) = world_with_box();
        world.set_kind(body, BodyKind::Static, SYNCED_OBJECT_MASS);
        world.set_kind(body, BodyKind::Dynamic, SYNCED_OBJECT_MASS);
        assert_eq!(world.kind(body), Some(BodyKind::Dynamic));
        assert!((world.mass(body) - SYNCED_OBJECT_MASS).abs() < 1e-3);
        assert!(!world.body(body).unwrap().is_sleeping());
    }

    #[test]
    fn ray_hits_box_and_respects_filter() {
        let (world, body, collider) = world_with_box();
        let origin = Point3::new(0.0, 1.0, 0.0);
        let forward = Vector::new(0.0, 0.0, -1.0);

        let hit = world.cast_ray(origin, forward, 30.0, |h| h == collider).unwrap();
        assert_eq!(hit.body, Some(body));
        assert!((hit.distance - 4.5).abs() < 0.1);

        assert!(world.cast_ray(origin, forward, 30.0, |_| false).is_none());
        assert!(world.cast_ray(origin, forward, 2.0, |h| h == collider).is_none());
    }

    #[test]
    fn ray_into_empty_world_is_a_no_op() {
        let world = PhysicsWorld::new();
        let hit = world.cast_ray(Point3::origin(), Vector::new(0.0, -1.0, 0.0), 100.0, |_| true);
        assert!(hit.is_none());
    }

    #[test]
    fn step_caps_substeps_per_frame() {
        let mut world = PhysicsWorld::new();
        let mut calls = 0;
        assert_eq!(world.step(1.0, |_, _| calls += 1), MAX_PHYSICS_SUBSTEPS);
        assert_eq!(calls, MAX_PHYSICS_SUBSTEPS);
        assert_eq!(world.step(PHYSICS_TIMESTEP * 0.5, |_, _| {}), 0);
    }

    #[test]
    fn dynamic_box_falls_onto_ground() {
        let (mut world, body, _) = world_with_box();
        for _ in 0..240 {
            world.step_once();
        }
        let (pos, _) = world.pose(body).unwrap();
        assert!(pos.y > 0.3 && pos.y < 0.7, "box resting at {}", pos.y);
    }
}
