use rapier3d::{na::UnitQuaternion, prelude::*};

use crate::constants::{BODY_FRICTION, BODY_RESTITUTION};

/// Whether a body is simulated or pinned in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyKind {
    Dynamic,
    Static,
}

/// Canonical definition of a world body and its single collider.
#[derive(Clone, Debug)]
pub struct BodyDef {
    /// World-space translation.
    pub translation: Vector<f32>,
    /// World-space rotation (unit quaternion).
    pub rotation: UnitQuaternion<f32>,
    pub shape: ColliderShapeDef,
    pub kind: BodyKind,
    /// Collider mass; ignored for static bodies.
    pub mass: f32,
    /// Collider offset relative to the body origin.
    pub collider_offset: Vector<f32>,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl BodyDef {
    pub fn cuboid(translation: Vector<f32>, half_extents: Vector<f32>, kind: BodyKind) -> Self {
        Self {
            translation,
            rotation: UnitQuaternion::identity(),
            shape: ColliderShapeDef::Cuboid { half_extents },
            kind,
            mass: 1.0,
            collider_offset: Vector::zeros(),
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }

    pub fn with_rotation(mut self, rotation: UnitQuaternion<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_collider_offset(mut self, offset: Vector<f32>) -> Self {
        self.collider_offset = offset;
        self
    }

    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }
}

/// Supported collider shapes.
#[derive(Clone, Debug)]
pub enum ColliderShapeDef {
    /// Infinite plane through the body origin, normal = rotation * +Y.
    Plane,

    /// Oriented cuboid with given half-extents (meters).
    Cuboid { half_extents: Vector<f32> },
}

pub fn rigid_body_from_def(def: &BodyDef) -> RigidBody {
    let iso = Isometry::from_parts(def.translation.into(), def.rotation);
    let builder = match def.kind {
        BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
        BodyKind::Static => RigidBodyBuilder::fixed(),
    };
    builder
        .pose(iso)
        .linear_damping(def.linear_damping)
        .angular_damping(def.angular_damping)
        .build()
}

/// Build a Rapier collider from a `BodyDef`.
///
/// The collider is attached to the body, so only `collider_offset` is applied here.
pub fn collider_from_def(def: &BodyDef) -> Collider {
    let builder = match &def.shape {
        ColliderShapeDef::Plane => ColliderBuilder::halfspace(Vector::y_axis()),
        ColliderShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
                .mass(def.mass)
        }
    };
    builder
        .translation(def.collider_offset)
        .friction(BODY_FRICTION)
        .restitution(BODY_RESTITUTION)
        .build()
}
