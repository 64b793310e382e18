use super::records::{ObjectRecord, ObjectTransform};
use crate::collision::{Quat, Vec3};
use crate::constants::{SNAPSHOT_LERP_RATE, SYNCED_OBJECT_MASS};
use crate::interpolate::{blend_pose, smoothing};
use crate::physics::{BodyDef, BodyKind, PhysicsWorld};
use rapier3d::prelude::{ColliderHandle, RigidBodyHandle};

/// A box whose transform is mirrored through the shared store.
///
/// Exactly one authority moves it per tick: the physics step when this client
/// owns it and it is not frozen, otherwise the latest remote snapshot.
#[derive(Clone, Debug)]
pub struct SyncedObject {
    key: String,
    body: RigidBodyHandle,
    collider: ColliderHandle,
    half_extents: Vec3,
    texture: u8,
    owner: Option<String>,
    frozen: bool,
    target_position: Vec3,
    target_rotation: Quat,
    has_snapshot: bool,
    position: Vec3,
    rotation: Quat,
}

impl SyncedObject {
    /// Create the body for a freshly sighted record.
    pub fn spawn(physics: &mut PhysicsWorld, key: impl Into<String>, record: &ObjectRecord) -> Self {
        let half_extents = record.size().map(|s| (s * 0.5).max(0.05));
        let kind = if record.frozen {
            BodyKind::Static
        } else {
            BodyKind::Dynamic
        };
        let def = BodyDef::cuboid(record.position(), half_extents, kind)
            .with_rotation(record.rotation())
            .with_mass(SYNCED_OBJECT_MASS);
        let (body, collider) = physics.insert(&def);

        let mut object = Self {
            key: key.into(),
            body,
            collider,
            half_extents,
            texture: record.tex,
            owner: None,
            frozen: record.frozen,
            target_position: record.position(),
            target_rotation: record.rotation(),
            has_snapshot: false,
            position: record.position(),
            rotation: record.rotation(),
        };
        object.apply_record(physics, record);
        object
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn body(&self) -> RigidBodyHandle {
        self.body
    }

    pub fn collider(&self) -> ColliderHandle {
        self.collider
    }

    pub fn half_extents(&self) -> Vec3 {
        self.half_extents
    }

    pub fn texture(&self) -> u8 {
        self.texture
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Rendered position.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Rendered orientation.
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn is_owned_by(&self, player: &str) -> bool {
        self.owner.as_deref() == Some(player)
    }

    /// Claimed by somebody other than `player`.
    pub fn is_claimed_by_other(&self, player: &str) -> bool {
        self.owner.as_deref().is_some_and(|o| o != player)
    }

    /// Whether the local physics step is the authority for this object.
    pub fn is_simulated_by(&self, player: &str) -> bool {
        self.is_owned_by(player) && !self.frozen
    }

    /// Take in a snapshot from the store.
    pub fn apply_record(&mut self, physics: &mut PhysicsWorld, record: &ObjectRecord) {
        self.owner = record.owner.clone();
        self.target_position = record.position();
        self.target_rotation = record.rotation();
        self.set_frozen(physics, record.frozen);
        self.has_snapshot = true;
    }

    /// Local ownership change ahead of the store echo.
    pub fn set_owner(&mut self, owner: Option<String>) {
        self.owner = owner;
    }

    /// Switch between pinned and simulated. No-op if already in that state.
    pub fn set_frozen(&mut self, physics: &mut PhysicsWorld, frozen: bool) {
        if self.frozen == frozen && physics.kind(self.body) == Some(Self::kind_for(frozen)) {
            return;
        }
        self.frozen = frozen;
        physics.set_kind(self.body, Self::kind_for(frozen), SYNCED_OBJECT_MASS);
        log::debug!("{} {}", self.key, if frozen { "frozen" } else { "unfrozen" });
    }

    fn kind_for(frozen: bool) -> BodyKind {
        if frozen {
            BodyKind::Static
        } else {
            BodyKind::Dynamic
        }
    }

    /// Interpolate toward the last snapshot and drag the body along with zero
    /// velocity. Does nothing before the first snapshot arrives.
    pub fn follow_snapshot(&mut self, physics: &mut PhysicsWorld, dt: f32) {
        if !self.has_snapshot {
            return;
        }
        let t = smoothing(SNAPSHOT_LERP_RATE, dt);
        blend_pose(
            &mut self.position,
            &mut self.rotation,
            (&self.target_position, &self.target_rotation),
            t,
        );
        physics.set_pose(self.body, self.position, self.rotation);
        physics.set_velocity(self.body, Vec3::zeros(), Vec3::zeros());
    }

    /// Copy the simulated pose into the rendered pose.
    pub fn sync_from_body(&mut self, physics: &PhysicsWorld) {
        if let Some((position, rotation)) = physics.pose(self.body) {
            self.position = position;
            self.rotation = rotation;
        }
    }

    /// Live transform for publishing.
    pub fn transform(&self, physics: &PhysicsWorld) -> Option<ObjectTransform> {
        physics
            .pose(self.body)
            .map(|(position, rotation)| ObjectTransform::new(position, rotation))
    }
}
