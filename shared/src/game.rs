//! One client's whole simulation, advanced one frame at a time.
//!
//! `Game` owns the world and every gameplay component and runs them in a fixed
//! order each frame: hotbar, character, physics gun, vehicles, physics step,
//! network, remote interpolation.

use crate::character::{CharacterController, Mode};
use crate::collision::Vec3;
use crate::constants::{MAX_FRAME_DELTA, VEHICLE_SPAWN};
use crate::gun::PhysicsGun;
use crate::input::{Action, HOTBAR_SLOTS, InputFrame, PointerLock};
use crate::net::{
    ChatMessage, LocalPlayerState, NetworkManager, PlayerListEntry, SharedStore, VoiceManager,
};
use crate::settings::Settings;
use crate::world::GameWorld;
use std::sync::Arc;
use std::time::Duration;

/// Slot that holds the physics gun.
pub const GUN_SLOT: u8 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Menu {
    Inventory,
    Admin,
}

/// Everything the HUD shows for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct HudSnapshot {
    pub health: f32,
    pub energy: f32,
    pub position: Vec3,
    pub speed: f32,
    pub ping: u32,
    pub slot: u8,
    pub dead: bool,
    pub driving: bool,
    pub online: bool,
    pub talking: bool,
    pub show_players: bool,
    pub players: Vec<PlayerListEntry>,
    pub chat: Vec<ChatMessage>,
    pub chat_open: bool,
    pub menu: Option<Menu>,
}

#[derive(Debug)]
pub struct Game {
    world: GameWorld,
    character: CharacterController,
    gun: PhysicsGun,
    network: NetworkManager,
    settings: Settings,
    pointer: PointerLock,
    slot: u8,
    chat_open: bool,
    menu: Option<Menu>,
    show_players: bool,
}

impl Game {
    /// A world with the car parked, connected to `store` if one is given.
    pub fn new(settings: Settings, store: Option<Arc<dyn SharedStore>>, voice: VoiceManager) -> Self {
        let mut world = GameWorld::new();
        let [x, y, z] = VEHICLE_SPAWN;
        world.spawn_vehicle(Vec3::new(x, y, z));

        let mut network = NetworkManager::new(voice);
        network.init(store);

        let mut game = Self {
            world,
            character: CharacterController::new(),
            gun: PhysicsGun::default(),
            network,
            settings: Settings::default(),
            pointer: PointerLock::default(),
            slot: GUN_SLOT,
            chat_open: false,
            menu: None,
            show_players: false,
        };
        game.apply_settings(settings);
        game
    }

    pub fn world(&self) -> &GameWorld {
        &self.world
    }

    pub fn character(&self) -> &CharacterController {
        &self.character
    }

    pub fn gun(&self) -> &PhysicsGun {
        &self.gun
    }

    pub fn network(&self) -> &NetworkManager {
        &self.network
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn pointer(&self) -> &PointerLock {
        &self.pointer
    }

    pub fn pointer_mut(&mut self) -> &mut PointerLock {
        &mut self.pointer
    }

    pub fn slot(&self) -> u8 {
        self.slot
    }

    pub fn is_chat_open(&self) -> bool {
        self.chat_open
    }

    pub fn menu(&self) -> Option<Menu> {
        self.menu
    }

    pub fn apply_settings(&mut self, settings: Settings) {
        let settings = settings.clamped();
        self.character.apply_settings(&settings);
        self.gun.set_max_grab_distance(settings.grab_distance);
        self.settings = settings;
    }

    /// Flip a single cheat from the admin menu.
    pub fn toggle_cheat(&mut self, mode: Mode) -> bool {
        let mut settings = self.settings.clone();
        let cheats = &mut settings.cheats;
        let flag = match mode {
            Mode::Flying => &mut cheats.fly,
            Mode::Noclip => &mut cheats.noclip,
            Mode::Freecam => &mut cheats.freecam,
            Mode::FreecamMove => &mut cheats.freecam_move,
            Mode::God => &mut cheats.god,
            Mode::InfiniteStamina => &mut cheats.infinite_stamina,
            Mode::ThirdPerson => {
                let on = !self.character.has_mode(Mode::ThirdPerson);
                self.character.set_mode(Mode::ThirdPerson, on);
                return on;
            }
        };
        *flag = !*flag;
        let on = *flag;
        self.apply_settings(settings);
        on
    }

    /// Join under `name` and grab the pointer.
    pub fn spawn(&mut self, name: &str, now: Duration) {
        self.network.spawn(name, now);
        self.pointer.request(true);
    }

    pub fn disconnect(&mut self) {
        self.gun.release(&mut self.world.physics);
        self.network.disconnect();
        self.pointer.request(false);
    }

    pub fn respawn(&mut self) {
        self.character.respawn(&mut self.world);
        self.gun
            .set_active(self.slot == GUN_SLOT, &mut self.world.physics);
        self.pointer.request(true);
    }

    pub fn select_slot(&mut self, slot: u8) {
        self.slot = slot;
        let active = slot == GUN_SLOT && self.character.driving().is_none();
        self.gun.set_active(active, &mut self.world.physics);
    }

    pub fn open_chat(&mut self) {
        self.chat_open = true;
        self.pointer.request(false);
    }

    pub fn close_chat(&mut self) {
        self.chat_open = false;
        self.pointer.request(true);
    }

    /// Send `text` (ignored if blank) and return to play.
    pub fn submit_chat(&mut self, text: &str) {
        self.network.send_chat(text);
        self.close_chat();
    }

    fn toggle_menu(&mut self, menu: Menu) {
        if self.menu == Some(menu) {
            self.menu = None;
            self.pointer.request(true);
        } else {
            self.menu = Some(menu);
            self.pointer.request(false);
        }
    }

    /// Advance everything by one frame. `now` is wall-clock time since the
    /// Unix epoch and only drives network timers.
    pub fn frame(&mut self, dt: f32, now: Duration, input: &InputFrame) {
        let dt = dt.clamp(0.0, MAX_FRAME_DELTA);
        let spawned = self.network.is_spawned();
        let blocked = self.chat_open || self.character.is_dead() || !spawned;
        let input = if blocked { input.suppressed() } else { *input };

        if spawned {
            self.ui_actions(&input);
            self.update_hotbar(&input);
            self.update_character(dt, &input);

            let view = self.character.gun_view();
            self.gun
                .update(dt, &input, &view, &mut self.world, &mut self.network);
        }

        self.world.update_vehicles(dt);
        self.world.step(dt);

        let telemetry = self.gun.telemetry();
        let local = LocalPlayerState {
            position: self.character.position(),
            yaw: self.character.yaw(),
            crouch: self.character.crouch_factor(),
            speed: self.character.speed(),
            dead: self.character.is_dead(),
            airborne: !self.character.is_on_ground(),
            gun: telemetry,
        };
        self.network
            .update(dt, now, &local, &input, &mut self.world);
    }

    fn ui_actions(&mut self, input: &InputFrame) {
        if input.is_action_pressed(Action::Inventory) {
            self.toggle_menu(Menu::Inventory);
        }
        if input.is_action_pressed(Action::AdminMenu) {
            self.toggle_menu(Menu::Admin);
        }
        if input.is_action_pressed(Action::Chat) {
            self.open_chat();
        }
        self.show_players = input.is_action(Action::PlayerList);
    }

    fn update_hotbar(&mut self, input: &InputFrame) {
        let pressed = HOTBAR_SLOTS
            .iter()
            .filter(|a| input.is_action_pressed(**a))
            .filter_map(Action::slot)
            .last();
        if let Some(slot) = pressed {
            self.select_slot(slot);
        }
    }

    fn update_character(&mut self, dt: f32, input: &InputFrame) {
        let look_locked = self.gun.is_rotating(input, &self.world.physics);
        let events = self
            .character
            .update(dt, input, &mut self.world, look_locked);
        if events.entered.is_some() {
            self.gun.set_active(false, &mut self.world.physics);
        }
        if events.exited.is_some() && self.slot == GUN_SLOT {
            self.gun.set_active(true, &mut self.world.physics);
        }
        if events.died {
            self.gun.release(&mut self.world.physics);
            self.pointer.request(false);
        }
    }

    pub fn hud(&self) -> HudSnapshot {
        HudSnapshot {
            health: self.character.health(),
            energy: self.character.energy(),
            position: self.character.position(),
            speed: self.character.speed(),
            ping: self.network.ping(),
            slot: self.slot,
            dead: self.character.is_dead(),
            driving: self.character.driving().is_some(),
            online: self.network.is_online(),
            talking: self.network.voice().is_speaking(),
            show_players: self.show_players,
            players: self.network.player_list(),
            chat: self.network.chat().cloned().collect(),
            chat_open: self.chat_open,
            menu: self.menu,
        }
    }
}
