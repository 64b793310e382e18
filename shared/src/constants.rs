use std::time::Duration;

/// Upper bound on a single frame delta (seconds).
pub const MAX_FRAME_DELTA: f32 = 0.1;

/// Fixed physics substep (seconds).
pub const PHYSICS_TIMESTEP: f32 = 1.0 / 60.0;

/// Maximum physics substeps taken in one frame.
pub const MAX_PHYSICS_SUBSTEPS: u32 = 3;

/// World gravity applied to rigid bodies (m/s², downward).
pub const WORLD_GRAVITY: f32 = 30.0;

pub const BODY_FRICTION: f32 = 0.4;
pub const BODY_RESTITUTION: f32 = 0.1;

// ---------------------------------------------------------------------------
// Character
// ---------------------------------------------------------------------------

pub const PLAYER_WIDTH: f32 = 0.6;
pub const PLAYER_HEIGHT_STANDING: f32 = 2.0;
pub const PLAYER_HEIGHT_CROUCHING: f32 = 1.0;

/// Where a fresh or respawned player appears.
pub const PLAYER_SPAWN: [f32; 3] = [0.0, 5.0, 0.0];

pub const WALK_SPEED: f32 = 10.0;
pub const SPRINT_SPEED: f32 = 18.0;
pub const CROUCH_SPEED: f32 = 4.0;
pub const JUMP_FORCE: f32 = 12.0;
pub const PLAYER_GRAVITY: f32 = 30.0;

/// Mouse look sensitivity in radians per pixel.
pub const LOOK_SENSITIVITY: f32 = 0.002;

/// Speed multiplier while flying or in noclip.
pub const FLY_SPEED_MULTIPLIER: f32 = 1.5;

/// Gap left between the player's head and a ceiling after an upward hit.
pub const CEILING_SKIN: f32 = 0.01;

/// Rate (1/s) at which the collision height approaches its crouch target.
pub const CROUCH_HEIGHT_RATE: f32 = 15.0;

/// Rate (1/s) at which the visual crouch factor approaches its target.
pub const CROUCH_FACTOR_RATE: f32 = 10.0;

pub const MAX_HEALTH: f32 = 100.0;
pub const MAX_ENERGY: f32 = 100.0;
pub const SPRINT_DRAIN_PER_SEC: f32 = 20.0;
pub const ENERGY_REGEN_PER_SEC: f32 = 10.0;
pub const JUMP_ENERGY_COST: f32 = 15.0;

/// Landing faster than this (m/s, downward) hurts.
pub const FALL_DAMAGE_THRESHOLD: f32 = 24.0;

/// Speed subtracted before scaling fall damage.
pub const FALL_DAMAGE_OFFSET: f32 = 20.0;
pub const FALL_DAMAGE_SCALE: f32 = 3.0;

/// Interact ray reach for entering vehicles.
pub const INTERACT_DISTANCE: f32 = 4.0;

/// Offset from the chassis where the player is placed on exit.
pub const VEHICLE_EXIT_OFFSET: [f32; 3] = [2.5, 1.0, 0.0];

// ---------------------------------------------------------------------------
// Camera
// ---------------------------------------------------------------------------

pub const THIRD_PERSON_DISTANCE: f32 = 3.5;
pub const THIRD_PERSON_MIN_DISTANCE: f32 = 0.5;
pub const THIRD_PERSON_OCCLUSION_MARGIN: f32 = 0.2;

pub const FREECAM_SPEED: f32 = 20.0;

pub const VEHICLE_CAMERA_DISTANCE: f32 = 8.0;
pub const VEHICLE_CAMERA_HEIGHT: f32 = 2.5;
pub const VEHICLE_CAMERA_OCCLUSION_MARGIN: f32 = 0.5;
pub const VEHICLE_CAMERA_PITCH_MIN: f32 = -0.5;
pub const VEHICLE_CAMERA_PITCH_MAX: f32 = 1.0;
pub const VEHICLE_CAMERA_START_PITCH: f32 = 0.2;
pub const VEHICLE_SEAT_OFFSET: [f32; 3] = [0.0, 1.2, 0.5];

/// Per-frame blend used when following the chassis position.
pub const VEHICLE_CAMERA_POS_BLEND: f32 = 0.2;

/// Per-frame blend used when following the chassis orientation.
pub const VEHICLE_CAMERA_ROT_BLEND: f32 = 0.1;

// ---------------------------------------------------------------------------
// Physics gun
// ---------------------------------------------------------------------------

pub const MAX_GRAB_DISTANCE: f32 = 30.0;
pub const MAX_VISUAL_DISTANCE: f32 = 5000.0;

/// Minimum hold distance in first person.
pub const MIN_HOLD_DISTANCE: f32 = 2.0;

/// Minimum hold distance in third person.
pub const MIN_HOLD_DISTANCE_THIRD_PERSON: f32 = 4.0;

pub const GUN_SCROLL_SCALE: f32 = 0.02;
pub const GUN_ROTATE_SPEED: f32 = 0.002;

/// Proportional gain used to pull a held body toward its target point.
pub const GUN_TRACKING_GAIN: f32 = 10.0;

/// Per-tick factor applied to a held body's angular velocity.
pub const GUN_ANGULAR_DECAY: f32 = 0.1;

/// Angular damping restored when a dynamic body is released.
pub const DEFAULT_ANGULAR_DAMPING: f32 = 0.01;

/// Gun hand relative to the body origin, in body space (yaw 0 faces -Z).
pub const GUN_HAND_OFFSET: [f32; 3] = [0.35, 0.85, -0.15];

/// Distance from the hand to the muzzle.
pub const GUN_TIP_LENGTH: f32 = 0.5;

/// First-person muzzle relative to the camera.
pub const VIEW_MUZZLE_OFFSET: [f32; 3] = [0.3, -0.25, -0.6];

/// Mass of a synced box while dynamic.
pub const SYNCED_OBJECT_MASS: f32 = 50.0;

// ---------------------------------------------------------------------------
// Vehicle
// ---------------------------------------------------------------------------

pub const VEHICLE_SPAWN: [f32; 3] = [10.0, 5.0, 10.0];

pub const CHASSIS_MASS: f32 = 800.0;
pub const CHASSIS_HALF_EXTENTS: [f32; 3] = [1.0, 0.5, 2.0];
pub const CHASSIS_COLLIDER_OFFSET: f32 = 0.3;
pub const CHASSIS_ANGULAR_DAMPING: f32 = 0.95;
pub const CHASSIS_LINEAR_DAMPING: f32 = 0.1;

pub const WHEEL_RADIUS: f32 = 0.5;
pub const WHEEL_REST_LENGTH: f32 = 0.4;
pub const WHEEL_STIFFNESS: f32 = 45.0;
pub const WHEEL_DAMPING: f32 = 4.0;
pub const WHEEL_FRICTION_SLIP: f32 = 3.0;
pub const WHEEL_MAX_SUSPENSION_FORCE: f32 = 100_000.0;
pub const WHEEL_MAX_TRAVEL: f32 = 0.3;
pub const WHEEL_HALF_TRACK: f32 = 1.0;
pub const WHEEL_HALF_BASE: f32 = 1.2;

pub const MAX_STEER: f32 = 0.5;

/// Rate (1/s) at which the wheel angle approaches its target.
pub const STEER_RATE: f32 = 6.0;
pub const MAX_ENGINE_FORCE: f32 = 6000.0;
pub const BRAKE_FORCE: f32 = 100.0;
pub const IDLE_BRAKE_FORCE: f32 = 10.0;

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// How often the local player and owned objects are published.
pub const NETWORK_TICK: Duration = Duration::from_millis(50);

/// How often remote players are checked for staleness.
pub const GHOST_SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// A remote player silent for longer than this is removed.
pub const GHOST_TIMEOUT: Duration = Duration::from_secs(10);

/// A player record older than this at first sighting is deleted instead of spawned.
pub const STALE_RECORD_AGE: Duration = Duration::from_secs(30);

pub const PING_INTERVAL: Duration = Duration::from_secs(4);

/// Exponential rate used when interpolating toward remote snapshots.
pub const SNAPSHOT_LERP_RATE: f32 = 10.0;

pub const MAX_CHAT_MESSAGES: usize = 20;

pub const WORLD_BOX_COUNT: usize = 50;
pub const WORLD_BOX_SPREAD: f32 = 50.0;
pub const WORLD_BOX_DROP_HEIGHT: f32 = 5.0;
pub const WORLD_BOX_TEXTURES: u8 = 3;

/// Default reach of a remote player's gun ray when none was reported.
pub const DEFAULT_RAY_DISTANCE: f32 = 10.0;

// ---------------------------------------------------------------------------
// Voice
// ---------------------------------------------------------------------------

/// Mean input level (0..255 spectrum scale) above which a talker counts as speaking.
pub const SPEAKING_THRESHOLD: f32 = 10.0;

// ---------------------------------------------------------------------------
// Animation
// ---------------------------------------------------------------------------

/// Rate (1/s) at which limb joints approach their pose targets.
pub const LIMB_SMOOTHING: f32 = 15.0;

/// Walk cycle phase advance per unit of speed.
pub const WALK_CYCLE_RATE: f32 = 0.8;

/// Peak joint swing of the walk cycle (radians).
pub const WALK_SWING: f32 = 1.4;
