use super::types::{Vec3, oriented_box_bounds, overlaps_strict};
use crate::physics::PhysicsWorld;
use rapier3d::parry::bounding_volume::Aabb;
use rapier3d::prelude::{ColliderHandle, RigidBodyHandle};

/// Something the character can bump into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obstacle {
    pub body: RigidBodyHandle,
    pub collider: ColliderHandle,
    pub half_extents: Vec3,
    /// Box center relative to the body origin, in body space.
    pub offset: Vec3,
}

/// Vertical extent of everything the character overlaps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObstacleHit {
    /// Highest top face among the overlapped obstacles.
    pub top: f32,
    /// Lowest bottom face among the overlapped obstacles.
    pub bottom: f32,
}

#[derive(Clone, Debug, Default)]
pub struct ObstacleSet {
    items: Vec<Obstacle>,
}

impl ObstacleSet {
    pub fn insert(&mut self, obstacle: Obstacle) {
        self.items.push(obstacle);
    }

    pub fn remove_body(&mut self, body: RigidBodyHandle) {
        self.items.retain(|o| o.body != body);
    }

    pub fn contains_collider(&self, collider: ColliderHandle) -> bool {
        self.items.iter().any(|o| o.collider == collider)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.items.iter()
    }

    /// Current world-space bounds of an obstacle, following its body.
    pub fn bounds(physics: &PhysicsWorld, obstacle: &Obstacle) -> Option<Aabb> {
        let (translation, rotation) = physics.pose(obstacle.body)?;
        let center = translation + rotation * obstacle.offset;
        Some(oriented_box_bounds(center, rotation, obstacle.half_extents))
    }

    /// Overlap query for the character box. `ignore` skips one body (the vehicle
    /// being driven).
    pub fn overlap(
        &self,
        physics: &PhysicsWorld,
        player: &Aabb,
        ignore: Option<RigidBodyHandle>,
    ) -> Option<ObstacleHit> {
        let mut hit: Option<ObstacleHit> = None;
        for obstacle in self.items.iter().filter(|o| Some(o.body) != ignore) {
            let Some(bounds) = Self::bounds(physics, obstacle) else {
                continue;
            };
            if !overlaps_strict(player, &bounds) {
                continue;
            }
            hit = Some(match hit {
                None => ObstacleHit {
                    top: bounds.maxs.y,
                    bottom: bounds.mins.y,
                },
                Some(h) => ObstacleHit {
                    top: h.top.max(bounds.maxs.y),
                    bottom: h.bottom.min(bounds.mins.y),
                },
            });
        }
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::player_bounds;
    use crate::physics::{BodyDef, BodyKind};

    fn one_box(center: Vec3) -> (PhysicsWorld, ObstacleSet, RigidBodyHandle) {
        let mut physics = PhysicsWorld::new();
        let half = Vec3::new(1.0, 1.0, 1.0);
        let (body, collider) = physics.insert(&BodyDef::cuboid(center, half, BodyKind::Static));
        let mut set = ObstacleSet::default();
        set.insert(Obstacle {
            body,
            collider,
            half_extents: half,
            offset: Vec3::zeros(),
        });
        (physics, set, body)
    }

    #[test]
    fn overlap_reports_faces() {
        let (physics, set, _) = one_box(Vec3::new(0.0, 1.0, 0.0));
        let player = player_bounds(Vec3::new(0.5, 1.5, 0.0), 0.3, 2.0);
        let hit = set.overlap(&physics, &player, None).unwrap();
        assert!((hit.top - 2.0).abs() < 1e-5);
        assert!(hit.bottom.abs() < 1e-5);
    }

    #[test]
    fn stacked_obstacles_merge_into_one_extent() {
        let (mut physics, mut set, _) = one_box(Vec3::new(0.0, 1.0, 0.0));
        let half = Vec3::new(1.0, 1.0, 1.0);
        let (body, collider) =
            physics.insert(&BodyDef::cuboid(Vec3::new(0.0, 3.0, 0.0), half, BodyKind::Static));
        set.insert(Obstacle {
            body,
            collider,
            half_extents: half,
            offset: Vec3::zeros(),
        });

        let player = player_bounds(Vec3::new(0.5, 1.0, 0.0), 0.3, 2.0);
        let hit = set.overlap(&physics, &player, None).unwrap();
        assert!((hit.top - 4.0).abs() < 1e-5);
        assert!(hit.bottom.abs() < 1e-5);
    }

    #[test]
    fn ignored_body_never_collides() {
        let (physics, set, body) = one_box(Vec3::new(0.0, 1.0, 0.0));
        let player = player_bounds(Vec3::new(0.0, 0.5, 0.0), 0.3, 2.0);
        assert!(set.overlap(&physics, &player, Some(body)).is_none());
    }

    #[test]
    fn empty_set_is_a_no_op() {
        let physics = PhysicsWorld::new();
        let player = player_bounds(Vec3::zeros(), 0.3, 2.0);
        assert!(ObstacleSet::default().overlap(&physics, &player, None).is_none());
    }

    #[test]
    fn removed_body_stops_colliding() {
        let (physics, mut set, body) = one_box(Vec3::new(0.0, 1.0, 0.0));
        set.remove_body(body);
        let player = player_bounds(Vec3::new(0.0, 0.5, 0.0), 0.3, 2.0);
        assert!(set.overlap(&physics, &player, None).is_none());
        assert!(set.is_empty());
    }
}
