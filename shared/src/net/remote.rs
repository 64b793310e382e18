use super::records::PlayerRecord;
use crate::anim::LimbPose;
use crate::collision::{Quat, Vec3};
use crate::constants::{DEFAULT_RAY_DISTANCE, GUN_HAND_OFFSET, GUN_TIP_LENGTH, SNAPSHOT_LERP_RATE};
use crate::interpolate::shortest_angle;
use std::time::Duration;

/// Interpolated proxy for another client's player.
#[derive(Clone, Debug)]
pub struct RemotePlayer {
    id: String,
    name: String,
    color: u32,
    position: Vec3,
    yaw: f32,
    target_position: Vec3,
    target_yaw: f32,
    crouch: f32,
    speed: f32,
    ping: u32,
    jumping: bool,
    visible: bool,
    talking: bool,
    holding_gun: bool,
    firing: bool,
    ray_distance: f32,
    limbs: LimbPose,
    last_update: Duration,
}

/// Heading vector for a yaw angle.
pub fn yaw_forward(yaw: f32) -> Vec3 {
    Vec3::new(-yaw.sin(), 0.0, -yaw.cos())
}

impl RemotePlayer {
    pub fn new(id: impl Into<String>, record: &PlayerRecord, now: Duration) -> Self {
        let mut player = Self {
            id: id.into(),
            name: String::new(),
            color: record.color,
            position: record.position(),
            yaw: record.ry,
            target_position: record.position(),
            target_yaw: record.ry,
            crouch: 0.0,
            speed: 0.0,
            ping: 0,
            jumping: false,
            visible: true,
            talking: false,
            holding_gun: false,
            firing: false,
            ray_distance: DEFAULT_RAY_DISTANCE,
            limbs: LimbPose::default(),
            last_update: now,
        };
        player.update_data(record, now);
        player
    }

    /// Take in a snapshot. `now` is the local receipt time used for staleness.
    pub fn update_data(&mut self, record: &PlayerRecord, now: Duration) {
        self.target_position = record.position();
        self.target_yaw = record.ry;
        self.crouch = record.crouch.clamp(0.0, 1.0);
        self.speed = record.speed;
        self.ping = record.ping;
        self.jumping = record.jump;
        self.visible = !record.is_dead;
        self.name = if record.name.is_empty() {
            "Unknown".to_string()
        } else {
            record.name.clone()
        };
        self.color = record.color;
        self.talking = record.is_talking;
        self.holding_gun = record.holding_gun;
        self.firing = record.firing;
        self.ray_distance = if record.ray_dist > 0.0 {
            record.ray_dist
        } else {
            DEFAULT_RAY_DISTANCE
        };
        self.last_update = now;
    }

    /// Advance interpolation and limb animation.
    pub fn update(&mut self, dt: f32) {
        let t = (SNAPSHOT_LERP_RATE * dt).clamp(0.0, 1.0);
        self.position = self.position.lerp(&self.target_position, t);
        self.yaw += shortest_angle(self.yaw, self.target_yaw) * t;
        self.limbs.update(self.crouch, dt, self.speed, self.jumping);
    }

    /// Silent for longer than `timeout` as of `now`.
    pub fn is_stale(&self, now: Duration, timeout: Duration) -> bool {
        now.saturating_sub(self.last_update) > timeout
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> u32 {
        self.color
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_axis_angle(&Vec3::y_axis(), self.yaw)
    }

    pub fn crouch(&self) -> f32 {
        self.crouch
    }

    pub fn ping(&self) -> u32 {
        self.ping
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_talking(&self) -> bool {
        self.talking
    }

    pub fn is_holding_gun(&self) -> bool {
        self.holding_gun
    }

    pub fn limbs(&self) -> &LimbPose {
        &self.limbs
    }

    /// Muzzle and end point of the gun ray while the remote is firing.
    pub fn ray(&self) -> Option<(Vec3, Vec3)> {
        if !self.firing {
            return None;
        }
        let [x, y, z] = GUN_HAND_OFFSET;
        let hand = self.position + self.rotation() * Vec3::new(x, y, z);
        let forward = yaw_forward(self.target_yaw);
        let tip = hand + forward * GUN_TIP_LENGTH;
        Some((tip, tip + forward * self.ray_distance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn record() -> PlayerRecord {
        PlayerRecord {
            name: "bo".into(),
            x: 4.0,
            y: 0.0,
            z: -2.0,
            ..Default::default()
        }
    }

    #[test]
    fn converges_on_latest_snapshot() {
        let mut remote = RemotePlayer::new("user_b", &record(), Duration::ZERO);
        remote.update_data(
            &PlayerRecord {
                x: 10.0,
                ry: 1.0,
                ..record()
            },
            Duration::ZERO,
        );
        for _ in 0..120 {
            remote.update(1.0 / 60.0);
        }
        assert!((remote.position().x - 10.0).abs() < 1e-3);
        assert!((remote.yaw() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn yaw_wraps_the_short_way() {
        let start = PlayerRecord {
            ry: PI - 0.1,
            ..record()
        };
        let mut remote = RemotePlayer::new("user_b", &start, Duration::ZERO);
        remote.update_data(
            &PlayerRecord {
                ry: -PI + 0.1,
                ..record()
            },
            Duration::ZERO,
        );
        remote.update(1.0 / 60.0);
        assert!(remote.yaw() > PI - 0.1);
    }

    #[test]
    fn dead_players_are_hidden_and_names_default() {
        let remote = RemotePlayer::new(
            "user_b",
            &PlayerRecord {
                name: String::new(),
                is_dead: true,
                ..record()
            },
            Duration::ZERO,
        );
        assert!(!remote.is_visible());
        assert_eq!(remote.name(), "Unknown");
    }

    #[test]
    fn firing_ray_points_along_yaw() {
        let remote = RemotePlayer::new(
            "user_b",
            &PlayerRecord {
                firing: true,
                ray_dist: 0.0,
                ..record()
            },
            Duration::ZERO,
        );
        let (tip, end) = remote.ray().unwrap();
        let dir = end - tip;
        assert!((dir.norm() - DEFAULT_RAY_DISTANCE).abs() < 1e-4);
        assert!(dir.z < 0.0 && dir.x.abs() < 1e-4);

        let idle = RemotePlayer::new("user_c", &record(), Duration::ZERO);
        assert!(idle.ray().is_none());
    }

    #[test]
    fn staleness_uses_local_receipt_time() {
        let remote = RemotePlayer::new("user_b", &record(), Duration::from_secs(100));
        assert!(!remote.is_stale(Duration::from_secs(105), Duration::from_secs(10)));
        assert!(remote.is_stale(Duration::from_secs(111), Duration::from_secs(10)));
    }
}
