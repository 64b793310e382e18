//! Procedural limb animation shared by the local body and remote proxies.
//!
//! Joint angles are pitch rotations (radians, about the body's local X axis).

use crate::constants::{LIMB_SMOOTHING, WALK_CYCLE_RATE, WALK_SWING};
use std::f32::consts::PI;

const JUMP_POSE: JointTargets = JointTargets {
    left_hip: -0.5,
    right_hip: 0.5,
    left_knee: -1.5,
    right_knee: -0.2,
    left_arm: -2.0,
    right_arm: -2.0,
};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct JointTargets {
    left_hip: f32,
    right_hip: f32,
    left_knee: f32,
    right_knee: f32,
    left_arm: f32,
    right_arm: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LimbPose {
    pub left_hip: f32,
    pub right_hip: f32,
    pub left_knee: f32,
    pub right_knee: f32,
    pub left_arm: f32,
    pub right_arm: f32,
    /// Torso drop below standing height.
    pub torso_drop: f32,
    /// Torso shift backwards to keep balance while crouched.
    pub hip_shift: f32,
    pub spine: f32,
    pub head: f32,
    phase: f32,
}

impl LimbPose {
    /// Walk cycle phase, advanced only while walking on the ground.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Advance the pose by `dt` from the reported crouch factor, horizontal speed
    /// and airborne flag.
    pub fn update(&mut self, crouch: f32, dt: f32, speed: f32, jumping: bool) {
        let crouch = crouch.clamp(0.0, 1.0);

        let hip_bend = PI * 0.4 * crouch;
        let knee_bend = -PI * 0.7 * crouch;
        let arm_hang = -PI * 0.1 * crouch;

        self.torso_drop = -0.35 * crouch;
        self.hip_shift = 0.25 * crouch;
        self.spine = -PI * 0.25 * crouch;
        self.head = PI * 0.25 * crouch;

        let mut target = JointTargets {
            left_hip: hip_bend,
            right_hip: hip_bend,
            left_knee: knee_bend,
            right_knee: knee_bend,
            left_arm: arm_hang,
            right_arm: arm_hang,
        };

        if jumping {
            target = JUMP_POSE;
        } else if speed > 0.1 {
            self.phase += dt * speed * WALK_CYCLE_RATE;
            let swing = self.phase.sin() * WALK_SWING * (1.0 - crouch * 0.5);
            target.left_hip += swing;
            target.right_hip -= swing;
            target.left_knee += (-swing * 1.5).min(0.0);
            target.right_knee += (swing * 1.5).min(0.0);
            target.left_arm -= swing;
            target.right_arm += swing;
        }

        let s = (LIMB_SMOOTHING * dt).min(1.0);
        let approach = |current: &mut f32, goal: f32| *current += (goal - *current) * s;
        approach(&mut self.left_hip, target.left_hip);
        approach(&mut self.right_hip, target.right_hip);
        approach(&mut self.left_knee, target.left_knee);
        approach(&mut self.right_knee, target.right_knee);
        approach(&mut self.left_arm, target.left_arm);
        approach(&mut self.right_arm, target.right_arm);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(pose: &mut LimbPose, crouch: f32, speed: f32, jumping: bool) {
        for _ in 0..120 {
            pose.update(crouch, 1.0 / 60.0, speed, jumping);
        }
    }

    #[test]
    fn standing_still_rests_at_zero() {
        let mut pose = LimbPose::default();
        settle(&mut pose, 0.0, 0.0, false);
        assert!(pose.left_hip.abs() < 1e-4);
        assert!(pose.right_arm.abs() < 1e-4);
        assert_eq!(pose.phase(), 0.0);
    }

    #[test]
    fn crouch_bends_hips_and_knees() {
        let mut pose = LimbPose::default();
        settle(&mut pose, 1.0, 0.0, false);
        assert!((pose.left_hip - PI * 0.4).abs() < 1e-3);
        assert!((pose.right_knee + PI * 0.7).abs() < 1e-3);
        assert!((pose.torso_drop + 0.35).abs() < 1e-6);
    }

    #[test]
    fn jumping_holds_the_jump_pose_and_freezes_the_cycle() {
        let mut pose = LimbPose::default();
        settle(&mut pose, 0.0, 8.0, true);
        assert_eq!(pose.phase(), 0.0);
        assert!((pose.left_knee + 1.5).abs() < 1e-3);
        assert!((pose.left_arm + 2.0).abs() < 1e-3);
    }

    #[test]
    fn walking_swings_legs_in_opposition() {
        let mut pose = LimbPose::default();
        pose.update(0.0, 0.25, 8.0, false);
        assert!(pose.phase() > 0.0);
        assert!(pose.left_hip > 0.0);
        assert!((pose.left_hip + pose.right_hip).abs() < 1e-5);
    }
}
