//! The local player: look, walk, fly, drive and die.
//!
//! The character is not a rigid body. Movement is integrated by hand and the
//! body box is resolved against the world's obstacle set one axis at a time.
//! Modes are orthogonal flags; the camera decides which of them wins.

mod camera;
mod locomotion;
mod vitals;

pub use camera::{CameraRig, CarCamera, look_rotation};
pub use vitals::{Vitals, fall_damage};

use crate::anim::LimbPose;
use crate::bitmask_flags::BitmaskFlags;
use crate::collision::{Quat, Vec3};
use crate::constants::{
    CROUCH_SPEED, GUN_HAND_OFFSET, GUN_TIP_LENGTH, INTERACT_DISTANCE, JUMP_FORCE,
    LOOK_SENSITIVITY, MAX_ENERGY, MAX_HEALTH, PLAYER_GRAVITY, PLAYER_HEIGHT_STANDING,
    PLAYER_SPAWN, SPRINT_SPEED, VIEW_MUZZLE_OFFSET, WALK_SPEED,
};
use crate::define_bitmask_flags;
use crate::gun::GunView;
use crate::input::{Action, InputFrame};
use crate::settings::Settings;
use crate::vehicle::VehicleControl;
use crate::world::{EntityRef, GameWorld};

define_bitmask_flags!(Mode, u8, {
    Flying,
    Noclip,
    Freecam,
    FreecamMove,
    ThirdPerson,
    God,
    InfiniteStamina,
});

pub type Modes = BitmaskFlags<u8>;

/// Movement numbers the settings menu can change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tuning {
    pub walk_speed: f32,
    pub sprint_speed: f32,
    pub crouch_speed: f32,
    pub jump_force: f32,
    pub gravity: f32,
    /// Radians per pixel.
    pub sensitivity: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            walk_speed: WALK_SPEED,
            sprint_speed: SPRINT_SPEED,
            crouch_speed: CROUCH_SPEED,
            jump_force: JUMP_FORCE,
            gravity: PLAYER_GRAVITY,
            sensitivity: LOOK_SENSITIVITY,
        }
    }
}

/// Transitions that the rest of the frame reacts to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CharacterEvents {
    pub entered: Option<usize>,
    pub exited: Option<usize>,
    pub died: bool,
}

#[derive(Clone, Debug)]
pub struct CharacterController {
    position: Vec3,
    velocity: Vec3,
    yaw: f32,
    pitch: f32,
    height: f32,
    crouch_factor: f32,
    on_ground: bool,
    speed: f32,
    vitals: Vitals,
    modes: Modes,
    tuning: Tuning,
    limbs: LimbPose,
    driving: Option<usize>,
    camera: CameraRig,
    car_camera: CarCamera,
}

impl Default for CharacterController {
    fn default() -> Self {
        Self::new()
    }
}

impl CharacterController {
    pub fn new() -> Self {
        let [x, y, z] = PLAYER_SPAWN;
        let position = Vec3::new(x, y, z);
        Self {
            position,
            velocity: Vec3::zeros(),
            yaw: 0.0,
            pitch: 0.0,
            height: PLAYER_HEIGHT_STANDING,
            crouch_factor: 0.0,
            on_ground: false,
            speed: 0.0,
            vitals: Vitals::default(),
            modes: Modes::default(),
            tuning: Tuning::default(),
            limbs: LimbPose::default(),
            driving: None,
            camera: CameraRig {
                position: position + Vec3::new(0.0, PLAYER_HEIGHT_STANDING, 0.0),
                ..CameraRig::default()
            },
            car_camera: CarCamera::default(),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Current collision height.
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Visual crouch blend in [0, 1].
    pub fn crouch_factor(&self) -> f32 {
        self.crouch_factor
    }

    pub fn is_on_ground(&self) -> bool {
        self.on_ground
    }

    /// Horizontal speed achieved last frame.
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn health(&self) -> f32 {
        self.vitals.health
    }

    pub fn energy(&self) -> f32 {
        self.vitals.energy
    }

    pub fn is_dead(&self) -> bool {
        self.vitals.dead
    }

    pub fn modes(&self) -> Modes {
        self.modes
    }

    pub fn has_mode(&self, mode: Mode) -> bool {
        self.modes.has(mode)
    }

    pub fn set_mode(&mut self, mode: Mode, on: bool) {
        self.modes.set(mode, on);
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn limbs(&self) -> &LimbPose {
        &self.limbs
    }

    pub fn driving(&self) -> Option<usize> {
        self.driving
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    /// Third person, or freecam looking at our own body.
    pub fn shows_body(&self) -> bool {
        self.driving.is_none()
            && (self.modes.has(Mode::ThirdPerson) || self.modes.has(Mode::Freecam))
    }

    /// Move without any collision or velocity carried over.
    pub fn teleport(&mut self, position: Vec3) {
        self.position = position;
        self.velocity = Vec3::zeros();
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        let s = settings.clamped();
        self.tuning.walk_speed = s.walk_speed;
        self.tuning.sprint_speed = s.sprint_speed;
        self.tuning.jump_force = s.jump_force;
        self.tuning.gravity = s.gravity;
        self.tuning.sensitivity = s.look_sensitivity();

        let cheats = s.cheats;
        self.modes.set(Mode::Flying, cheats.fly);
        self.modes.set(Mode::Noclip, cheats.noclip);
        self.modes.set(Mode::Freecam, cheats.freecam);
        self.modes.set(Mode::FreecamMove, cheats.freecam_move);
        self.modes.set(Mode::God, cheats.god);
        self.modes.set(Mode::InfiniteStamina, cheats.infinite_stamina);
    }

    /// Where the physics gun shoots from this frame.
    pub fn gun_view(&self) -> GunView {
        let third_person = self.modes.has(Mode::ThirdPerson) || self.modes.has(Mode::Freecam);
        let muzzle = if third_person {
            let body = Quat::from_axis_angle(&Vec3::y_axis(), self.yaw);
            let [x, y, z] = GUN_HAND_OFFSET;
            let hand = self.position + body * Vec3::new(x, y, z);
            hand + body * -Vec3::z() * GUN_TIP_LENGTH
        } else {
            let [x, y, z] = VIEW_MUZZLE_OFFSET;
            self.camera.position + self.camera.rotation * Vec3::new(x, y, z)
        };
        GunView {
            eye: self.camera.position,
            rotation: self.camera.rotation,
            muzzle,
            third_person,
        }
    }

    /// One frame of character logic. `look_locked` freezes the view while the
    /// gun is rotating a held body.
    pub fn update(
        &mut self,
        dt: f32,
        input: &InputFrame,
        world: &mut GameWorld,
        look_locked: bool,
    ) -> CharacterEvents {
        let mut events = CharacterEvents::default();
        if self.vitals.is_depleted() && !self.vitals.dead {
            self.die();
            events.died = true;
        }
        if self.vitals.dead {
            return events;
        }

        if let Some(vehicle) = self.driving {
            if let Some(car) = world.vehicle_mut(vehicle) {
                car.control(Some(VehicleControl::from_input(input)));
            }
            if input.is_action_pressed(Action::Interact) {
                self.exit_vehicle(world);
                events.exited = Some(vehicle);
                return events;
            }
            if input.is_action_pressed(Action::ToggleView) {
                self.modes.toggle(Mode::ThirdPerson);
            }
            self.place_car_camera(vehicle, input, world);
            return events;
        }

        if input.is_action_pressed(Action::ToggleView) {
            self.modes.toggle(Mode::ThirdPerson);
        }
        if input.is_action_pressed(Action::Interact) {
            if let Some(vehicle) = self.vehicle_in_reach(world) {
                self.enter_vehicle(vehicle, world);
                events.entered = Some(vehicle);
                return events;
            }
        }
        if self.modes.has(Mode::Freecam)
            && input.pointer_locked
            && !self.modes.has(Mode::FreecamMove)
        {
            self.camera.fly(dt, input, self.tuning.sensitivity);
            return events;
        }

        self.walk(dt, input, world, look_locked);
        self.place_camera(world);
        events
    }

    fn vehicle_in_reach(&self, world: &GameWorld) -> Option<usize> {
        let hit = world.cast_obstacles(self.camera.position, self.camera.forward(), INTERACT_DISTANCE)?;
        if hit.distance >= INTERACT_DISTANCE {
            return None;
        }
        match hit.body.and_then(|b| world.entity_for_body(b)) {
            Some(EntityRef::Vehicle(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn enter_vehicle(&mut self, vehicle: usize, world: &GameWorld) {
        let Some((position, rotation)) = world
            .vehicle(vehicle)
            .and_then(|v| v.pose(&world.physics))
        else {
            return;
        };
        self.driving = Some(vehicle);
        self.car_camera.reset(position, rotation);
        self.yaw = 0.0;
        self.pitch = 0.0;
        log::info!("entered vehicle {vehicle}");
    }

    /// Step out next to the car and hand it back to idle control.
    pub fn exit_vehicle(&mut self, world: &mut GameWorld) {
        let Some(vehicle) = self.driving.take() else {
            return;
        };
        if let Some(exit) = world
            .vehicle(vehicle)
            .and_then(|v| v.exit_position(&world.physics))
        {
            self.position = exit;
        }
        if let Some(car) = world.vehicle_mut(vehicle) {
            car.control(None);
        }
        self.velocity = Vec3::zeros();
        self.camera.position = self.position;
        self.camera.up = Vec3::y();
        log::info!("exited vehicle {vehicle}");
    }

    /// Hurt the player. Death is noticed on the next update.
    pub fn apply_damage(&mut self, amount: f32) {
        if !self.modes.has(Mode::God) {
            self.vitals.damage(amount);
        }
    }

    fn die(&mut self) {
        self.vitals.dead = true;
        log::info!("player died");
    }

    /// Back to full health at the spawn point, out of any car.
    pub fn respawn(&mut self, world: &mut GameWorld) {
        if self.driving.is_some() {
            self.exit_vehicle(world);
        }
        self.vitals = Vitals {
            health: MAX_HEALTH,
            energy: MAX_ENERGY,
            dead: false,
        };
        let [x, y, z] = PLAYER_SPAWN;
        self.teleport(Vec3::new(x, y, z));
        log::info!("player respawned");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::records::ObjectRecord;

    const DT: f32 = 1.0 / 60.0;

    fn locked() -> InputFrame {
        InputFrame {
            pointer_locked: true,
            ..Default::default()
        }
    }

    fn holding(actions: &[Action]) -> InputFrame {
        let mut input = locked();
        for a in actions {
            input.press(*a);
        }
        input
    }

    fn on_floor() -> CharacterController {
        let mut c = CharacterController::new();
        c.teleport(Vec3::zeros());
        c.on_ground = true;
        c
    }

    fn frozen_box(world: &mut GameWorld, key: &str, center: Vec3) {
        world.spawn_synced(
            key,
            &ObjectRecord {
                x: center.x,
                y: center.y,
                z: center.z,
                frozen: true,
                ..Default::default()
            },
        );
    }

    #[test]
    fn blocked_axis_is_fully_reverted() {
        let mut world = GameWorld::new();
        frozen_box(&mut world, "wall", Vec3::new(1.0, 1.0, 0.0));
        let mut c = on_floor();
        c.position.x = 0.15;

        c.update(DT, &holding(&[Action::Right, Action::Forward]), &mut world, false);
        assert_eq!(c.position.x, 0.15);
        assert!(c.position.z < 0.0);
    }

    #[test]
    fn hard_landing_hurts_once() {
        let mut world = GameWorld::new();
        let mut c = on_floor();
        c.position.y = 0.3;
        c.on_ground = false;
        c.velocity.y = -29.5;

        c.update(DT, &locked(), &mut world, false);
        assert!((c.health() - 70.0).abs() < 1e-3);
        assert!(c.is_on_ground());
        for _ in 0..30 {
            c.update(DT, &locked(), &mut world, false);
        }
        assert!((c.health() - 70.0).abs() < 1e-3);
    }

    #[test]
    fn god_mode_ignores_fall_damage() {
        let mut world = GameWorld::new();
        let mut c = on_floor();
        c.set_mode(Mode::God, true);
        c.position.y = 0.3;
        c.velocity.y = -60.0;
        c.update(DT, &locked(), &mut world, false);
        assert_eq!(c.health(), MAX_HEALTH);
    }

    #[test]
    fn one_second_of_sprint_costs_twenty_energy() {
        let mut world = GameWorld::new();
        let mut c = on_floor();
        let input = holding(&[Action::Sprint, Action::Forward]);
        for _ in 0..60 {
            c.update(DT, &input, &mut world, false);
        }
        assert!((c.energy() - 80.0).abs() < 1e-2);
        assert!((c.speed() - SPRINT_SPEED).abs() < 1e-3);
    }

    #[test]
    fn standing_sprint_does_not_drain() {
        let mut world = GameWorld::new();
        let mut c = on_floor();
        c.vitals.energy = 50.0;
        c.update(DT, &holding(&[Action::Sprint]), &mut world, false);
        assert_eq!(c.energy(), 50.0);
    }

    #[test]
    fn jump_needs_ground_and_energy() {
        let mut world = GameWorld::new();
        let mut c = on_floor();
        c.update(DT, &holding(&[Action::Jump]), &mut world, false);
        assert!(c.position.y > 0.0);
        assert!(!c.is_on_ground());
        assert!((c.energy() - 85.0).abs() < 0.5);

        let mut tired = on_floor();
        tired.vitals.energy = 10.0;
        tired.update(DT, &holding(&[Action::Jump]), &mut world, false);
        assert_eq!(tired.position.y, 0.0);
    }

    #[test]
    fn flying_ignores_gravity_and_climbs_on_jump() {
        let mut world = GameWorld::new();
        let mut c = on_floor();
        c.set_mode(Mode::Flying, true);
        c.position.y = 10.0;
        c.update(DT, &locked(), &mut world, false);
        assert_eq!(c.position.y, 10.0);

        c.update(DT, &holding(&[Action::Jump]), &mut world, false);
        let expected = 10.0 + WALK_SPEED * 1.5 * DT;
        assert!((c.position.y - expected).abs() < 1e-4);
    }

    #[test]
    fn freecam_look_follows_sensitivity_setting() {
        let mut world = GameWorld::new();
        let mut c = on_floor();
        let mut settings = Settings {
            sensitivity: 40.0,
            ..Default::default()
        };
        settings.cheats.freecam = true;
        c.apply_settings(&settings);

        let before = c.camera().yaw;
        let mut input = locked();
        input.add_mouse_motion(100.0, 0.0);
        c.update(DT, &input, &mut world, false);
        assert!((c.camera().yaw - (before - 0.4)).abs() < 1e-5);
    }

    #[test]
    fn noclip_passes_through_obstacles() {
        let mut world = GameWorld::new();
        frozen_box(&mut world, "wall", Vec3::new(1.0, 1.0, 0.0));
        let mut c = on_floor();
        c.set_mode(Mode::Noclip, true);
        c.position = Vec3::new(0.15, 0.5, 0.0);
        c.update(DT, &holding(&[Action::Right]), &mut world, false);
        assert!(c.position.x > 0.15);
    }

    #[test]
    fn crouch_height_eases_down() {
        let mut world = GameWorld::new();
        let mut c = on_floor();
        c.update(DT, &holding(&[Action::Crouch]), &mut world, false);
        assert!(c.height() < PLAYER_HEIGHT_STANDING && c.height() > 1.5);
        for _ in 0..120 {
            c.update(DT, &holding(&[Action::Crouch]), &mut world, false);
        }
        assert!((c.height() - 1.0).abs() < 1e-3);
        assert!((c.crouch_factor() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn look_is_frozen_while_rotating_a_held_body() {
        let mut world = GameWorld::new();
        let mut c = on_floor();
        let mut input = locked();
        input.add_mouse_motion(100.0, 50.0);
        c.update(DT, &input, &mut world, true);
        assert_eq!((c.yaw(), c.pitch()), (0.0, 0.0));
        c.update(DT, &input, &mut world, false);
        assert!(c.yaw() < 0.0 && c.pitch() < 0.0);
    }

    #[test]
    fn third_person_camera_pulls_in_before_walls() {
        let mut world = GameWorld::new();
        frozen_box(&mut world, "wall", Vec3::new(0.0, 2.0, 2.0));
        world.physics.step_once();
        let mut c = on_floor();
        c.set_mode(Mode::ThirdPerson, true);
        c.update(DT, &locked(), &mut world, false);
        assert!((c.camera().position.z - 1.3).abs() < 1e-3);

        let mut open = GameWorld::new();
        open.physics.step_once();
        let mut c = on_floor();
        c.set_mode(Mode::ThirdPerson, true);
        c.update(DT, &locked(), &mut open, false);
        assert!((c.camera().position.z - 3.5).abs() < 1e-3);
    }

    #[test]
    fn freecam_leaves_the_body_behind() {
        let mut world = GameWorld::new();
        let mut c = on_floor();
        c.update(DT, &locked(), &mut world, false);
        c.set_mode(Mode::Freecam, true);
        let input = holding(&[Action::Forward]);
        for _ in 0..60 {
            c.update(DT, &input, &mut world, false);
        }
        assert_eq!(c.position(), Vec3::zeros());
        assert!((c.camera().position.z + 20.0).abs() < 1e-2);
        assert!(c.shows_body());
    }

    #[test]
    fn interact_enters_a_car_in_reach_and_exit_steps_aside() {
        let mut world = GameWorld::new();
        let car = world.spawn_vehicle(Vec3::new(0.0, 1.0, -3.0));
        world.physics.step_once();
        let mut c = on_floor();
        c.pitch = -0.3;
        c.update(DT, &InputFrame::default(), &mut world, false);

        let events = c.update(DT, &holding(&[Action::Interact]), &mut world, false);
        assert_eq!(events.entered, Some(car));
        assert_eq!(c.driving(), Some(car));

        let chassis = world.vehicle(car).unwrap().chassis();
        world
            .physics
            .set_pose(chassis, Vec3::zeros(), Quat::identity());
        c.velocity = Vec3::new(3.0, -2.0, 1.0);
        let events = c.update(DT, &holding(&[Action::Interact]), &mut world, false);
        assert_eq!(events.exited, Some(car));
        assert_eq!(c.driving(), None);
        assert!((c.position() - Vec3::new(2.5, 1.0, 0.0)).norm() < 1e-4);
        assert_eq!(c.velocity(), Vec3::zeros());
        assert_eq!(c.camera().up, Vec3::y());
        assert_eq!(world.vehicle(car).unwrap().engine_force(), 0.0);
    }

    #[test]
    fn death_stops_input_until_respawn() {
        let mut world = GameWorld::new();
        let mut c = on_floor();
        c.vitals.damage(MAX_HEALTH);
        let events = c.update(DT, &holding(&[Action::Forward]), &mut world, false);
        assert!(events.died);
        assert!(c.is_dead());
        assert_eq!(c.position(), Vec3::zeros());

        let events = c.update(DT, &holding(&[Action::Forward]), &mut world, false);
        assert!(!events.died);

        c.respawn(&mut world);
        assert!(!c.is_dead());
        assert_eq!(c.health(), MAX_HEALTH);
        let [x, y, z] = PLAYER_SPAWN;
        assert_eq!(c.position(), Vec3::new(x, y, z));
    }

    #[test]
    fn settings_map_to_tuning_and_modes() {
        let mut settings = Settings::default();
        settings.walk_speed = 500.0;
        settings.cheats.noclip = true;
        settings.cheats.god = true;
        let mut c = CharacterController::new();
        c.set_mode(Mode::ThirdPerson, true);
        c.apply_settings(&settings);
        assert_eq!(c.tuning().walk_speed, 50.0);
        assert!(c.has_mode(Mode::Noclip) && c.has_mode(Mode::God));
        assert!(c.has_mode(Mode::ThirdPerson));
        assert!(!c.has_mode(Mode::Flying));
    }
}
