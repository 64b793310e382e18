//! The world context: the physics world plus every registry gameplay queries.
//!
//! Bodies are tagged at creation with a back-reference to the entity that owns
//! them and with the capabilities that entity implements, so lookups never
//! have to probe objects or walk render structure.

use crate::bitmask_flags::BitmaskFlags;
use crate::collision::{Obstacle, ObstacleHit, ObstacleSet, Vec3, player_bounds};
use crate::constants::{CHASSIS_COLLIDER_OFFSET, CHASSIS_HALF_EXTENTS};
use crate::define_bitmask_flags;
use crate::net::records::ObjectRecord;
use crate::net::synced::SyncedObject;
use crate::physics::{BodyDef, BodyKind, ColliderShapeDef, PhysicsWorld, RayHit};
use crate::vehicle::Vehicle;
use rapier3d::na::Point3;
use rapier3d::prelude::{ColliderHandle, RigidBodyHandle};
use std::collections::{HashMap, HashSet};

define_bitmask_flags!(Capability, u8, {
    Renderable,
    Simulatable,
    NetworkSynced,
});

pub type Capabilities = BitmaskFlags<u8>;

/// Owner of a body, recorded when the body is created.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Ground,
    Synced(String),
    Vehicle(usize),
}

impl EntityRef {
    pub fn capabilities(&self) -> Capabilities {
        match self {
            EntityRef::Ground => Capabilities::from_flags(&[Capability::Renderable]),
            EntityRef::Synced(_) => Capabilities::from_flags(&[
                Capability::Renderable,
                Capability::Simulatable,
                Capability::NetworkSynced,
            ]),
            EntityRef::Vehicle(_) => {
                Capabilities::from_flags(&[Capability::Renderable, Capability::Simulatable])
            }
        }
    }
}

#[derive(Debug)]
pub struct GameWorld {
    pub physics: PhysicsWorld,
    obstacles: ObstacleSet,
    camera_colliders: HashSet<ColliderHandle>,
    entities: HashMap<RigidBodyHandle, EntityRef>,
    synced: HashMap<String, SyncedObject>,
    vehicles: Vec<Vehicle>,
    ground: RigidBodyHandle,
}

impl Default for GameWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl GameWorld {
    /// An empty world with the ground plane at y = 0.
    pub fn new() -> Self {
        let mut physics = PhysicsWorld::new();
        let (ground, ground_collider) = physics.insert(&BodyDef {
            shape: ColliderShapeDef::Plane,
            ..BodyDef::cuboid(Vec3::zeros(), Vec3::zeros(), BodyKind::Static)
        });

        let mut camera_colliders = HashSet::new();
        camera_colliders.insert(ground_collider);
        let mut entities = HashMap::new();
        entities.insert(ground, EntityRef::Ground);

        Self {
            physics,
            obstacles: ObstacleSet::default(),
            camera_colliders,
            entities,
            synced: HashMap::new(),
            vehicles: Vec::new(),
            ground,
        }
    }

    pub fn ground(&self) -> RigidBodyHandle {
        self.ground
    }

    // --- Synced objects ---

    /// Create the body for a newly sighted object. Returns false if the key is
    /// already known.
    pub fn spawn_synced(&mut self, key: &str, record: &ObjectRecord) -> bool {
        if self.synced.contains_key(key) {
            return false;
        }
        let object = SyncedObject::spawn(&mut self.physics, key, record);
        self.obstacles.insert(Obstacle {
            body: object.body(),
            collider: object.collider(),
            half_extents: object.half_extents(),
            offset: Vec3::zeros(),
        });
        self.camera_colliders.insert(object.collider());
        self.entities
            .insert(object.body(), EntityRef::Synced(key.to_string()));
        self.synced.insert(key.to_string(), object);
        true
    }

    pub fn despawn_synced(&mut self, key: &str) {
        let Some(object) = self.synced.remove(key) else {
            return;
        };
        self.obstacles.remove_body(object.body());
        self.camera_colliders.remove(&object.collider());
        self.entities.remove(&object.body());
        self.physics.remove(object.body());
    }

    pub fn synced(&self, key: &str) -> Option<&SyncedObject> {
        self.synced.get(key)
    }

    /// A synced object together with the physics world it lives in.
    pub fn synced_mut(&mut self, key: &str) -> Option<(&mut SyncedObject, &mut PhysicsWorld)> {
        self.synced
            .get_mut(key)
            .map(|object| (object, &mut self.physics))
    }

    pub fn synced_objects(&self) -> impl Iterator<Item = &SyncedObject> {
        self.synced.values()
    }

    /// Every synced object, each paired with the physics world.
    pub fn for_each_synced(&mut self, mut f: impl FnMut(&mut SyncedObject, &mut PhysicsWorld)) {
        for object in self.synced.values_mut() {
            f(object, &mut self.physics);
        }
    }

    pub fn synced_count(&self) -> usize {
        self.synced.len()
    }

    // --- Vehicles ---

    pub fn spawn_vehicle(&mut self, position: Vec3) -> usize {
        let vehicle = Vehicle::spawn(&mut self.physics, position);
        let id = self.vehicles.len();
        let [hx, hy, hz] = CHASSIS_HALF_EXTENTS;
        self.obstacles.insert(Obstacle {
            body: vehicle.chassis(),
            collider: vehicle.collider(),
            half_extents: Vec3::new(hx, hy, hz),
            offset: Vec3::new(0.0, CHASSIS_COLLIDER_OFFSET, 0.0),
        });
        self.entities.insert(vehicle.chassis(), EntityRef::Vehicle(id));
        self.vehicles.push(vehicle);
        log::info!("vehicle {id} spawned at {position:?}");
        id
    }

    pub fn vehicle(&self, id: usize) -> Option<&Vehicle> {
        self.vehicles.get(id)
    }

    pub fn vehicle_mut(&mut self, id: usize) -> Option<&mut Vehicle> {
        self.vehicles.get_mut(id)
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// Steering smoothing for every car.
    pub fn update_vehicles(&mut self, dt: f32) {
        for vehicle in &mut self.vehicles {
            vehicle.update(dt);
        }
    }

    // --- Lookups ---

    pub fn entity_for_body(&self, body: RigidBodyHandle) -> Option<&EntityRef> {
        self.entities.get(&body)
    }

    pub fn entity_for_collider(&self, collider: ColliderHandle) -> Option<&EntityRef> {
        self.physics
            .body_of(collider)
            .and_then(|body| self.entity_for_body(body))
    }

    pub fn capabilities(&self, body: RigidBodyHandle) -> Capabilities {
        self.entity_for_body(body)
            .map(EntityRef::capabilities)
            .unwrap_or_default()
    }

    pub fn obstacles(&self) -> &ObstacleSet {
        &self.obstacles
    }

    // --- Queries ---

    /// Closest obstacle along a ray.
    pub fn cast_obstacles(&self, origin: Vec3, direction: Vec3, max: f32) -> Option<RayHit> {
        self.physics
            .cast_ray(Point3::from(origin), direction, max, |c| {
                self.obstacles.contains_collider(c)
            })
    }

    /// Closest camera blocker along a ray.
    pub fn cast_camera(&self, origin: Vec3, direction: Vec3, max: f32) -> Option<RayHit> {
        self.physics
            .cast_ray(Point3::from(origin), direction, max, |c| {
                self.camera_colliders.contains(&c)
            })
    }

    /// Character box overlap with feet at `feet`. `ignore` is the car being driven.
    pub fn collision(
        &self,
        feet: Vec3,
        half_width: f32,
        height: f32,
        ignore: Option<RigidBodyHandle>,
    ) -> Option<ObstacleHit> {
        let bounds = player_bounds(feet, half_width, height);
        self.obstacles.overlap(&self.physics, &bounds, ignore)
    }

    /// Step physics, letting every car push its wheel state before each substep.
    pub fn step(&mut self, dt: f32) -> u32 {
        let vehicles = &mut self.vehicles;
        self.physics.step(dt, |physics, substep| {
            for vehicle in vehicles.iter_mut() {
                vehicle.apply(physics, substep);
            }
        })
    }
}
