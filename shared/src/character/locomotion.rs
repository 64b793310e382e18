//! On-foot movement: look, speed selection, per-axis collision and the
//! vertical step.

use super::vitals::fall_damage;
use super::{CharacterController, Mode};
use crate::collision::{ObstacleHit, Quat, Vec3};
use crate::constants::{
    CEILING_SKIN, CROUCH_FACTOR_RATE, CROUCH_HEIGHT_RATE, FLY_SPEED_MULTIPLIER,
    PLAYER_HEIGHT_CROUCHING, PLAYER_HEIGHT_STANDING, PLAYER_WIDTH,
};
use crate::input::{Action, InputFrame};
use crate::interpolate::approach;
use crate::world::GameWorld;
use std::f32::consts::FRAC_PI_2;

const DIRECTIONS: [Action; 4] = [Action::Forward, Action::Backward, Action::Right, Action::Left];

impl CharacterController {
    pub(super) fn walk(&mut self, dt: f32, input: &InputFrame, world: &GameWorld, look_locked: bool) {
        let locked = input.pointer_locked;
        let flying = self.modes.has(Mode::Flying) || self.modes.has(Mode::Noclip);
        let noclip = self.modes.has(Mode::Noclip);

        let mut speed = 0.0;
        let mut step = Vec3::zeros();
        if locked {
            if !look_locked {
                let [dx, dy] = input.mouse_delta;
                self.yaw -= dx * self.tuning.sensitivity;
                self.pitch =
                    (self.pitch - dy * self.tuning.sensitivity).clamp(-FRAC_PI_2, FRAC_PI_2);
            }
            speed = self.select_speed(dt, input, flying);
            step = self.move_direction(input, noclip) * speed * dt;
        }

        let before = self.position;
        self.position.x += step.x;
        if self.collision(world).is_some() {
            self.position.x = before.x;
        }
        self.position.z += step.z;
        if self.collision(world).is_some() {
            self.position.z = before.z;
        }

        let crouch_held = locked && input.is_action(Action::Crouch);
        if flying {
            self.velocity.y = 0.0;
            if noclip {
                self.position.y += step.y;
            }
            if locked && input.is_action(Action::Jump) {
                self.position.y += speed * dt;
            }
            if crouch_held {
                self.position.y -= speed * dt;
            }
        } else {
            self.velocity.y -= self.tuning.gravity * dt;
            let wants_jump = locked && input.is_action(Action::Jump) && !crouch_held;
            if wants_jump
                && self.on_ground
                && self
                    .vitals
                    .try_jump(self.modes.has(Mode::InfiniteStamina))
            {
                self.velocity.y = self.tuning.jump_force;
                self.on_ground = false;
            }
            self.position.y += self.velocity.y * dt;
        }

        let target_height = if crouch_held {
            PLAYER_HEIGHT_CROUCHING
        } else {
            PLAYER_HEIGHT_STANDING
        };
        self.height = approach(self.height, target_height, CROUCH_HEIGHT_RATE, dt);
        let target_crouch = if crouch_held { 1.0 } else { 0.0 };
        self.crouch_factor = approach(self.crouch_factor, target_crouch, CROUCH_FACTOR_RATE, dt);

        self.resolve_vertical(world);

        self.speed = if dt > 0.0 {
            (step.x * step.x + step.z * step.z).sqrt() / dt
        } else {
            0.0
        };
        self.limbs
            .update(self.crouch_factor, dt, self.speed, !self.on_ground);
    }

    /// Sprint beats crouch beats walk. Sprinting drains energy while moving,
    /// anything else regenerates it.
    fn select_speed(&mut self, dt: f32, input: &InputFrame, flying: bool) -> f32 {
        let infinite = self.modes.has(Mode::InfiniteStamina);
        let moving = DIRECTIONS.iter().any(|a| input.is_action(*a));

        let mut speed = if input.is_action(Action::Sprint) && self.vitals.can_sprint(infinite) {
            if moving && !infinite {
                self.vitals.drain_sprint(dt);
            }
            self.tuning.sprint_speed
        } else {
            self.vitals.regenerate(dt);
            self.tuning.walk_speed
        };
        if input.is_action(Action::Crouch) && self.on_ground {
            speed = self.tuning.crouch_speed;
        }
        if flying {
            speed *= FLY_SPEED_MULTIPLIER;
        }
        speed
    }

    /// Unit direction from the held movement keys. Noclip uses the full view
    /// basis, everything else only yaw.
    fn move_direction(&self, input: &InputFrame, noclip: bool) -> Vec3 {
        let basis = if noclip {
            super::camera::look_rotation(self.yaw, self.pitch)
        } else {
            Quat::from_axis_angle(&Vec3::y_axis(), self.yaw)
        };
        let forward = basis * -Vec3::z();
        let right = basis * Vec3::x();

        let mut direction = Vec3::zeros();
        if input.is_action(Action::Forward) {
            direction += forward;
        }
        if input.is_action(Action::Backward) {
            direction -= forward;
        }
        if input.is_action(Action::Right) {
            direction += right;
        }
        if input.is_action(Action::Left) {
            direction -= right;
        }
        direction.try_normalize(1.0e-6).unwrap_or_else(Vec3::zeros)
    }

    /// Landing, ceiling bumps and the world floor.
    fn resolve_vertical(&mut self, world: &GameWorld) {
        let noclip = self.modes.has(Mode::Noclip);
        match self.collision(world) {
            Some(hit) => {
                if self.velocity.y < 0.0 {
                    self.land(hit.top);
                } else if self.velocity.y > 0.0 {
                    self.position.y = hit.bottom - self.height - CEILING_SKIN;
                    self.velocity.y = 0.0;
                }
            }
            None => self.on_ground = false,
        }
        if self.position.y < 0.0 && !noclip {
            self.land(0.0);
        }
    }

    fn land(&mut self, y: f32) {
        let immune = self.modes.has(Mode::Noclip)
            || self.modes.has(Mode::Flying)
            || self.modes.has(Mode::God)
            || self.driving.is_some();
        if !immune {
            if let Some(damage) = fall_damage(self.velocity.y) {
                log::debug!("fall damage {damage:.1} at vy {:.1}", self.velocity.y);
                self.vitals.damage(damage);
            }
        }
        self.position.y = y;
        self.velocity.y = 0.0;
        self.on_ground = true;
    }

    /// Character box against the obstacle set. Noclip never collides.
    fn collision(&self, world: &GameWorld) -> Option<ObstacleHit> {
        if self.modes.has(Mode::Noclip) {
            return None;
        }
        let ignore = self
            .driving
            .and_then(|id| world.vehicle(id))
            .map(|v| v.chassis());
        world.collision(self.position, PLAYER_WIDTH / 2.0, self.height, ignore)
    }
}
