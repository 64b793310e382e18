//! Engine-agnostic simulation and synchronization core of the sandbox client.
//!
//! Everything that decides gameplay lives here: the physics world, the
//! character, the physics gun, the car and network replication. A host (the
//! Bevy client, or a test) feeds one [`InputFrame`] per frame into [`Game`] and
//! renders whatever state comes out.

pub mod anim;
pub mod bitmask_flags;
pub mod character;
pub mod collision;
pub mod constants;
pub mod error;
pub mod game;
pub mod gun;
pub mod input;
pub mod interpolate;
pub mod net;
pub mod physics;
pub mod settings;
pub mod vehicle;
pub mod world;

pub use character::{CameraRig, CharacterController, Mode};
pub use error::{SettingsError, StoreError, VoiceError};
pub use game::{Game, HudSnapshot, Menu};
pub use gun::{GunState, GunView, ObjectAuthority, PhysicsGun};
pub use input::{Action, Bindings, InputFrame, PointerLock};
pub use settings::{Cheats, Settings};
pub use world::{Capability, EntityRef, GameWorld};
