//! Named actions with held/pressed semantics, the rebindable action table and
//! pointer-lock tracking.
//!
//! The host samples its devices into an [`InputFrame`] once per frame. Physical
//! codes are DOM-style names ("KeyW", "Mouse0") so the table is device-agnostic.

use crate::bitmask_flags::BitmaskFlags;
use crate::define_bitmask_flags;
use std::collections::HashMap;

define_bitmask_flags!(Action, u32, {
    Forward,
    Backward,
    Left,
    Right,
    Jump,
    Crouch,
    Sprint,
    Rotate,
    Inventory,
    Interact,
    Fire,
    AltFire,
    ToggleView,
    AdminMenu,
    Chat,
    PlayerList,
    Voice,
    Slot1,
    Slot2,
    Slot3,
    Slot4,
    Slot5,
    Slot6,
    Slot7,
    Slot8,
    Slot9,
});

pub type ActionSet = BitmaskFlags<u32>;

pub const HOTBAR_SLOTS: [Action; 9] = [
    Action::Slot1,
    Action::Slot2,
    Action::Slot3,
    Action::Slot4,
    Action::Slot5,
    Action::Slot6,
    Action::Slot7,
    Action::Slot8,
    Action::Slot9,
];

impl Action {
    pub fn default_code(&self) -> &'static str {
        match self {
            Action::Forward => "KeyW",
            Action::Backward => "KeyS",
            Action::Left => "KeyA",
            Action::Right => "KeyD",
            Action::Jump => "Space",
            Action::Crouch => "ShiftLeft",
            Action::Sprint => "ControlLeft",
            Action::Rotate => "KeyR",
            Action::Inventory => "KeyE",
            Action::Interact => "KeyF",
            Action::Fire => "Mouse0",
            Action::AltFire => "Mouse2",
            Action::ToggleView => "KeyV",
            Action::AdminMenu => "Backquote",
            Action::Chat => "Enter",
            Action::PlayerList => "Tab",
            Action::Voice => "KeyT",
            Action::Slot1 => "Digit1",
            Action::Slot2 => "Digit2",
            Action::Slot3 => "Digit3",
            Action::Slot4 => "Digit4",
            Action::Slot5 => "Digit5",
            Action::Slot6 => "Digit6",
            Action::Slot7 => "Digit7",
            Action::Slot8 => "Digit8",
            Action::Slot9 => "Digit9",
        }
    }

    /// Hotbar slot number (1-based) for the slot actions.
    pub fn slot(&self) -> Option<u8> {
        HOTBAR_SLOTS
            .iter()
            .position(|a| a == self)
            .map(|i| i as u8 + 1)
    }
}

/// Everything gameplay reads from the input devices for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputFrame {
    held: ActionSet,
    pressed: ActionSet,
    /// Mouse motion in pixels accumulated since the last reset.
    pub mouse_delta: [f32; 2],
    /// Scroll accumulated since the last reset (positive = away from the user).
    pub scroll: f32,
    pub pointer_locked: bool,
}

impl InputFrame {
    /// Record a transition to held. Only a released-to-held transition counts as a press.
    pub fn press(&mut self, action: Action) {
        if !self.held.has(action) {
            self.pressed.add(action);
        }
        self.held.add(action);
    }

    pub fn release(&mut self, action: Action) {
        self.held.remove(action);
    }

    /// True while the bound key/button is held.
    pub fn is_action(&self, action: Action) -> bool {
        self.held.has(action)
    }

    /// True only on the frame the action went from released to held.
    pub fn is_action_pressed(&self, action: Action) -> bool {
        self.pressed.has(action)
    }

    pub fn add_mouse_motion(&mut self, dx: f32, dy: f32) {
        self.mouse_delta[0] += dx;
        self.mouse_delta[1] += dy;
    }

    pub fn add_scroll(&mut self, delta: f32) {
        self.scroll += delta;
    }

    /// End-of-frame reset: edges and deltas are consumed, held state persists.
    pub fn reset(&mut self) {
        self.pressed.clear();
        self.mouse_delta = [0.0, 0.0];
        self.scroll = 0.0;
    }

    /// A frame with no gameplay input, keeping only the pointer-lock state.
    pub fn suppressed(&self) -> Self {
        Self {
            pointer_locked: self.pointer_locked,
            ..Self::default()
        }
    }
}

/// Result of capturing a key for a pending rebind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rebound {
    pub action: Action,
    pub code: String,
    /// Action that previously owned `code`, now unbound.
    pub displaced: Option<Action>,
}

/// The action binding table: one physical code per action.
#[derive(Clone, Debug)]
pub struct Bindings {
    codes: HashMap<Action, String>,
    pending: Option<Action>,
}

impl Default for Bindings {
    fn default() -> Self {
        Self {
            codes: Action::ALL
                .iter()
                .map(|a| (*a, a.default_code().to_string()))
                .collect(),
            pending: None,
        }
    }
}

impl Bindings {
    pub fn code(&self, action: Action) -> Option<&str> {
        self.codes.get(&action).map(String::as_str)
    }

    pub fn action_for(&self, code: &str) -> Option<Action> {
        Action::ALL
            .iter()
            .copied()
            .find(|a| self.code(*a) == Some(code))
    }

    /// Bind `code` to `action`. A code can only drive one action, so a previous
    /// owner of `code` is left unbound and returned.
    pub fn bind(&mut self, action: Action, code: &str) -> Option<Action> {
        let displaced = self.action_for(code).filter(|a| *a != action);
        if let Some(other) = displaced {
            self.codes.remove(&other);
        }
        self.codes.insert(action, code.to_string());
        displaced
    }

    /// Arm a capture: the next key event is assigned to `action`.
    pub fn bind_next_key(&mut self, action: Action) {
        self.pending = Some(action);
    }

    pub fn cancel_capture(&mut self) {
        self.pending = None;
    }

    pub fn is_capturing(&self) -> bool {
        self.pending.is_some()
    }

    /// Offer a raw key event. When a capture is armed the code is bound and the
    /// caller must not process the event any further.
    pub fn capture(&mut self, code: &str) -> Option<Rebound> {
        let action = self.pending.take()?;
        let displaced = self.bind(action, code);
        log::info!("bound {} to {code}", action.name());
        Some(Rebound {
            action,
            code: code.to_string(),
            displaced,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (Action, &str)> + '_ {
        Action::ALL
            .iter()
            .filter_map(|a| self.code(*a).map(|c| (*a, c)))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockChange {
    Locked,
    Unlocked,
}

/// Pointer-lock state as last confirmed by the host.
///
/// Requests are asynchronous on most hosts; the confirmed state arrives later via
/// [`PointerLock::confirm`] and is surfaced as an edge notification.
#[derive(Clone, Debug, Default)]
pub struct PointerLock {
    locked: bool,
    requested: Option<bool>,
    changes: Vec<LockChange>,
}

impl PointerLock {
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn request(&mut self, locked: bool) {
        self.requested = Some(locked);
    }

    /// Take the outstanding request, if any, for the host to act on.
    pub fn take_request(&mut self) -> Option<bool> {
        self.requested.take()
    }

    pub fn confirm(&mut self, locked: bool) {
        if self.locked != locked {
            self.locked = locked;
            self.changes.push(if locked {
                LockChange::Locked
            } else {
                LockChange::Unlocked
            });
        }
    }

    pub fn drain_changes(&mut self) -> Vec<LockChange> {
        std::mem::take(&mut self.changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_is_edge_triggered_and_consumed_by_reset() {
        let mut frame = InputFrame::default();
        frame.press(Action::Jump);
        assert!(frame.is_action(Action::Jump));
        assert!(frame.is_action_pressed(Action::Jump));

        frame.reset();
        frame.press(Action::Jump); // key repeat while held
        assert!(frame.is_action(Action::Jump));
        assert!(!frame.is_action_pressed(Action::Jump));

        frame.release(Action::Jump);
        frame.reset();
        frame.press(Action::Jump);
        assert!(frame.is_action_pressed(Action::Jump));
    }

    #[test]
    fn deltas_accumulate_until_reset() {
        let mut frame = InputFrame::default();
        frame.add_mouse_motion(3.0, -1.0);
        frame.add_mouse_motion(2.0, -1.0);
        frame.add_scroll(120.0);
        assert_eq!(frame.mouse_delta, [5.0, -2.0]);
        assert_eq!(frame.scroll, 120.0);
        frame.reset();
        assert_eq!(frame.mouse_delta, [0.0, 0.0]);
        assert_eq!(frame.scroll, 0.0);
    }

    #[test]
    fn every_action_has_a_default_binding() {
        let bindings = Bindings::default();
        for action in Action::ALL {
            assert!(bindings.code(*action).is_some(), "{action:?} unbound");
        }
        assert_eq!(bindings.action_for("Mouse2"), Some(Action::AltFire));
        assert_eq!(Action::Slot3.slot(), Some(3));
        assert_eq!(Action::Fire.slot(), None);
    }

    #[test]
    fn capture_rebinds_once_and_displaces_previous_owner() {
        let mut bindings = Bindings::default();
        assert!(bindings.capture("KeyQ").is_none());

        bindings.bind_next_key(Action::Interact);
        let rebound = bindings.capture("KeyE").unwrap();
        assert_eq!(rebound.action, Action::Interact);
        assert_eq!(rebound.displaced, Some(Action::Inventory));
        assert_eq!(bindings.code(Action::Interact), Some("KeyE"));
        assert_eq!(bindings.code(Action::Inventory), None);

        // capture is one-shot
        assert!(!bindings.is_capturing());
        assert!(bindings.capture("KeyZ").is_none());
    }

    #[test]
    fn lock_changes_are_edges() {
        let mut lock = PointerLock::default();
        lock.request(true);
        assert!(!lock.is_locked());
        assert_eq!(lock.take_request(), Some(true));
        lock.confirm(true);
        lock.confirm(true);
        assert_eq!(lock.drain_changes(), vec![LockChange::Locked]);
        lock.confirm(false);
        assert_eq!(lock.drain_changes(), vec![LockChange::Unlocked]);
        assert!(lock.drain_changes().is_empty());
    }
}
