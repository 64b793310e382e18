//! Wire shapes of the shared store's collections.
//!
//! Field names are the store's; they are shared with every other client.

use crate::collision::{Quat, Vec3};
use rapier3d::na::Quaternion;
use serde::{Deserialize, Serialize};

/// `players/{id}`: one client's own state, replaced wholesale every tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerRecord {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub ry: f32,
    pub crouch: f32,
    pub speed: f32,
    #[serde(rename = "isDead")]
    pub is_dead: bool,
    pub color: u32,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub ping: u32,
    /// Airborne.
    pub jump: bool,
    #[serde(rename = "holdingGun")]
    pub holding_gun: bool,
    pub firing: bool,
    #[serde(rename = "rayDist")]
    pub ray_dist: f32,
    #[serde(rename = "isTalking")]
    pub is_talking: bool,
}

impl PlayerRecord {
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

/// `objects/{id}`: a synced box.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectRecord {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub sx: f32,
    pub sy: f32,
    pub sz: f32,
    pub tex: u8,
    pub qx: f32,
    pub qy: f32,
    pub qz: f32,
    pub qw: f32,
    pub owner: Option<String>,
    pub frozen: bool,
}

impl Default for ObjectRecord {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            sx: 1.0,
            sy: 1.0,
            sz: 1.0,
            tex: 0,
            qx: 0.0,
            qy: 0.0,
            qz: 0.0,
            qw: 1.0,
            owner: None,
            frozen: false,
        }
    }
}

impl ObjectRecord {
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Orientation, normalized. A degenerate quaternion reads as identity.
    pub fn rotation(&self) -> Quat {
        let q = Quaternion::new(self.qw, self.qx, self.qy, self.qz);
        if q.norm_squared() < 1.0e-8 {
            Quat::identity()
        } else {
            Quat::from_quaternion(q)
        }
    }

    /// Full box size (not half extents).
    pub fn size(&self) -> Vec3 {
        Vec3::new(self.sx, self.sy, self.sz)
    }
}

/// Partial `objects/{id}` write carrying only the live transform.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectTransform {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub qx: f32,
    pub qy: f32,
    pub qz: f32,
    pub qw: f32,
}

impl ObjectTransform {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        let q = rotation.quaternion();
        Self {
            x: position.x,
            y: position.y,
            z: position.z,
            qx: q.i,
            qy: q.j,
            qz: q.k,
            qw: q.w,
        }
    }
}

/// Partial `objects/{id}` write changing ownership and/or the frozen flag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OwnershipUpdate {
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frozen: Option<bool>,
}

/// `chat/{id}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatRecord {
    pub name: String,
    pub text: String,
    pub color: u32,
    pub timestamp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn player_record_uses_store_field_names() {
        let record = PlayerRecord {
            name: "ann".into(),
            is_dead: true,
            holding_gun: true,
            ray_dist: 12.5,
            ..Default::default()
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["isDead"], json!(true));
        assert_eq!(value["holdingGun"], json!(true));
        assert_eq!(value["rayDist"], json!(12.5));
        assert!(value.get("is_dead").is_none());
    }

    #[test]
    fn sparse_object_record_fills_defaults() {
        let record: ObjectRecord =
            serde_json::from_value(json!({ "x": 1.0, "owner": null, "sy": 4.0 })).unwrap();
        assert_eq!(record.x, 1.0);
        assert_eq!(record.sy, 4.0);
        assert_eq!(record.sx, 1.0);
        assert_eq!(record.owner, None);
        assert!(!record.frozen);
        assert_eq!(record.rotation(), Quat::identity());
    }

    #[test]
    fn zero_quaternion_reads_as_identity() {
        let record = ObjectRecord {
            qw: 0.0,
            ..Default::default()
        };
        assert_eq!(record.rotation(), Quat::identity());
    }

    #[test]
    fn ownership_update_clears_owner_explicitly() {
        let freeze = OwnershipUpdate {
            owner: None,
            frozen: Some(true),
        };
        let value = serde_json::to_value(&freeze).unwrap();
        assert_eq!(value, json!({ "owner": null, "frozen": true }));

        let claim = OwnershipUpdate {
            owner: Some("user_a".into()),
            frozen: None,
        };
        assert_eq!(serde_json::to_value(&claim).unwrap(), json!({ "owner": "user_a" }));
    }
}
