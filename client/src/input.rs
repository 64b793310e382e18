use crate::session::{FrameSet, Session};
use bevy::{
    input::{
        ButtonState,
        keyboard::KeyboardInput,
        mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll, MouseButtonInput, MouseScrollUnit},
    },
    prelude::*,
};
use leafwing_input_manager::prelude::*;
use shared::input::Rebound;
use shared::{Action, Bindings, InputFrame, Menu};

/// Scroll pixels reported per wheel notch by line-based devices.
const PIXELS_PER_LINE: f32 = 100.0;

#[derive(Reflect, Actionlike, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputAction {
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
}

const ACTIONS: [(InputAction, Action); 26] = [
    (InputAction::Forward, Action::Forward),
    (InputAction::Backward, Action::Backward),
    (InputAction::Left, Action::Left),
    (InputAction::Right, Action::Right),
    (InputAction::Jump, Action::Jump),
    (InputAction::Crouch, Action::Crouch),
    (InputAction::Sprint, Action::Sprint),
    (InputAction::Rotate, Action::Rotate),
    (InputAction::Inventory, Action::Inventory),
    (InputAction::Interact, Action::Interact),
    (InputAction::Fire, Action::Fire),
    (InputAction::AltFire, Action::AltFire),
    (InputAction::ToggleView, Action::ToggleView),
    (InputAction::AdminMenu, Action::AdminMenu),
    (InputAction::Chat, Action::Chat),
    (InputAction::PlayerList, Action::PlayerList),
    (InputAction::Voice, Action::Voice),
    (InputAction::Slot1, Action::Slot1),
    (InputAction::Slot2, Action::Slot2),
    (InputAction::Slot3, Action::Slot3),
    (InputAction::Slot4, Action::Slot4),
    (InputAction::Slot5, Action::Slot5),
    (InputAction::Slot6, Action::Slot6),
    (InputAction::Slot7, Action::Slot7),
    (InputAction::Slot8, Action::Slot8),
    (InputAction::Slot9, Action::Slot9),
];

impl InputAction {
    fn from_action(action: Action) -> Option<Self> {
        ACTIONS.iter().find(|(_, a)| *a == action).map(|(i, _)| *i)
    }
}

/// Physical device input behind a DOM-style code name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhysicalInput {
    Key(KeyCode),
    Mouse(MouseButton),
}

const MOUSE: &[(&str, MouseButton)] = &[
    ("Mouse0", MouseButton::Left),
    ("Mouse1", MouseButton::Middle),
    ("Mouse2", MouseButton::Right),
];

// Escape releases the pointer and the function keys drive the admin menu.
const KEYS: &[(&str, KeyCode)] = &[
    ("KeyA", KeyCode::KeyA),
    ("KeyB", KeyCode::KeyB),
    ("KeyC", KeyCode::KeyC),
    ("KeyD", KeyCode::KeyD),
    ("KeyE", KeyCode::KeyE),
    ("KeyF", KeyCode::KeyF),
    ("KeyG", KeyCode::KeyG),
    ("KeyH", KeyCode::KeyH),
    ("KeyI", KeyCode::KeyI),
    ("KeyJ", KeyCode::KeyJ),
    ("KeyK", KeyCode::KeyK),
    ("KeyL", KeyCode::KeyL),
    ("KeyM", KeyCode::KeyM),
    ("KeyN", KeyCode::KeyN),
    ("KeyO", KeyCode::KeyO),
    ("KeyP", KeyCode::KeyP),
    ("KeyQ", KeyCode::KeyQ),
    ("KeyR", KeyCode::KeyR),
    ("KeyS", KeyCode::KeyS),
    ("KeyT", KeyCode::KeyT),
    ("KeyU", KeyCode::KeyU),
    ("KeyV", KeyCode::KeyV),
    ("KeyW", KeyCode::KeyW),
    ("KeyX", KeyCode::KeyX),
    ("KeyY", KeyCode::KeyY),
    ("KeyZ", KeyCode::KeyZ),
    ("Digit0", KeyCode::Digit0),
    ("Digit1", KeyCode::Digit1),
    ("Digit2", KeyCode::Digit2),
    ("Digit3", KeyCode::Digit3),
    ("Digit4", KeyCode::Digit4),
    ("Digit5", KeyCode::Digit5),
    ("Digit6", KeyCode::Digit6),
    ("Digit7", KeyCode::Digit7),
    ("Digit8", KeyCode::Digit8),
    ("Digit9", KeyCode::Digit9),
    ("Space", KeyCode::Space),
    ("Enter", KeyCode::Enter),
    ("Tab", KeyCode::Tab),
    ("Backspace", KeyCode::Backspace),
    ("CapsLock", KeyCode::CapsLock),
    ("ShiftLeft", KeyCode::ShiftLeft),
    ("ShiftRight", KeyCode::ShiftRight),
    ("ControlLeft", KeyCode::ControlLeft),
    ("ControlRight", KeyCode::ControlRight),
    ("AltLeft", KeyCode::AltLeft),
    ("AltRight", KeyCode::AltRight),
    ("Backquote", KeyCode::Backquote),
    ("Minus", KeyCode::Minus),
    ("Equal", KeyCode::Equal),
    ("BracketLeft", KeyCode::BracketLeft),
    ("BracketRight", KeyCode::BracketRight),
    ("Backslash", KeyCode::Backslash),
    ("Semicolon", KeyCode::Semicolon),
    ("Quote", KeyCode::Quote),
    ("Comma", KeyCode::Comma),
    ("Period", KeyCode::Period),
    ("Slash", KeyCode::Slash),
    ("ArrowUp", KeyCode::ArrowUp),
    ("ArrowDown", KeyCode::ArrowDown),
    ("ArrowLeft", KeyCode::ArrowLeft),
    ("ArrowRight", KeyCode::ArrowRight),
    ("Insert", KeyCode::Insert),
    ("Delete", KeyCode::Delete),
    ("Home", KeyCode::Home),
    ("End", KeyCode::End),
];

pub fn physical(code: &str) -> Option<PhysicalInput> {
    KEYS.iter()
        .find(|(name, _)| *name == code)
        .map(|(_, key)| PhysicalInput::Key(*key))
        .or_else(|| {
            MOUSE
                .iter()
                .find(|(name, _)| *name == code)
                .map(|(_, button)| PhysicalInput::Mouse(*button))
        })
}

pub fn key_name(key: KeyCode) -> Option<&'static str> {
    KEYS.iter().find(|(_, k)| *k == key).map(|(name, _)| *name)
}

pub fn mouse_name(button: MouseButton) -> Option<&'static str> {
    MOUSE.iter().find(|(_, b)| *b == button).map(|(name, _)| *name)
}

/// The action table the input map is built from.
#[derive(Resource, Default, Deref, DerefMut)]
pub struct KeyBindings(pub Bindings);

/// Device state accumulated for the frame being simulated.
#[derive(Resource, Default, Deref, DerefMut)]
pub struct FrameInput(pub InputFrame);

/// Action highlighted in the admin menu's rebind row.
#[derive(Resource, Default)]
pub struct RebindCursor(pub usize);

impl RebindCursor {
    pub fn action(&self) -> Action {
        Action::ALL[self.0 % Action::ALL.len()]
    }
}

pub(super) fn plugin(app: &mut App) {
    app.add_plugins(InputManagerPlugin::<InputAction>::default());

    app.register_type::<InputAction>();

    let bindings = KeyBindings::default();
    app.insert_resource(input_map(&bindings));
    app.insert_resource(bindings);
    app.insert_resource(ActionState::<InputAction>::default());
    app.init_resource::<FrameInput>();
    app.init_resource::<RebindCursor>();

    app.add_systems(
        Update,
        (
            rebind_controls,
            capture_rebind,
            rebuild_input_map.run_if(resource_changed::<KeyBindings>),
            sample_input,
        )
            .chain()
            .in_set(FrameSet::Input),
    );
}

fn input_map(bindings: &Bindings) -> InputMap<InputAction> {
    let mut map = InputMap::<InputAction>::default();
    for (action, code) in bindings.iter() {
        let Some(input_action) = InputAction::from_action(action) else {
            continue;
        };
        match physical(code) {
            Some(PhysicalInput::Key(key)) => {
                map.insert(input_action, key);
            }
            Some(PhysicalInput::Mouse(button)) => {
                map.insert(input_action, button);
            }
            None => warn!("No physical input named {code}; {} is unbound.", action.name()),
        }
    }
    map
}

fn rebuild_input_map(bindings: Res<KeyBindings>, mut map: ResMut<InputMap<InputAction>>) {
    *map = input_map(&bindings);
}

/// PageUp/PageDown pick an action in the admin menu, F8 arms the capture.
fn rebind_controls(
    keys: Res<ButtonInput<KeyCode>>,
    session: Res<Session>,
    mut cursor: ResMut<RebindCursor>,
    mut bindings: ResMut<KeyBindings>,
) {
    if session.menu() != Some(Menu::Admin) {
        if bindings.is_capturing() {
            bindings.cancel_capture();
        }
        return;
    }
    let count = Action::ALL.len();
    if keys.just_pressed(KeyCode::PageDown) {
        cursor.0 = (cursor.0 + 1) % count;
    }
    if keys.just_pressed(KeyCode::PageUp) {
        cursor.0 = (cursor.0 + count - 1) % count;
    }
    if keys.just_pressed(KeyCode::F8) {
        bindings.bind_next_key(cursor.action());
    }
}

fn capture_rebind(
    mut bindings: ResMut<KeyBindings>,
    mut keyboard: MessageReader<KeyboardInput>,
    mut mouse: MessageReader<MouseButtonInput>,
) {
    if !bindings.is_capturing() {
        keyboard.clear();
        mouse.clear();
        return;
    }

    let keys = keyboard
        .read()
        .filter(|k| k.state == ButtonState::Pressed)
        .map(|k| k.key_code);
    for key in keys {
        if key == KeyCode::Escape {
            bindings.cancel_capture();
            return;
        }
        // The arming key itself is still in flight.
        if key == KeyCode::F8 {
            continue;
        }
        if let Some(code) = key_name(key) {
            report(bindings.capture(code));
            return;
        }
    }

    let buttons = mouse
        .read()
        .filter(|m| m.state == ButtonState::Pressed)
        .filter_map(|m| mouse_name(m.button));
    if let Some(code) = buttons.last() {
        report(bindings.capture(code));
    }
}

fn report(rebound: Option<Rebound>) {
    if let Some(Rebound {
        displaced: Some(other),
        code,
        ..
    }) = rebound
    {
        warn!("{code} was bound to {}; it is now unbound.", other.name());
    }
}

fn sample_input(
    actions: Res<ActionState<InputAction>>,
    motion: Res<AccumulatedMouseMotion>,
    scroll: Res<AccumulatedMouseScroll>,
    session: Res<Session>,
    mut frame: ResMut<FrameInput>,
) {
    for (input_action, action) in ACTIONS {
        if actions.pressed(&input_action) {
            frame.press(action);
        } else {
            frame.release(action);
        }
    }
    frame.add_mouse_motion(motion.delta.x, motion.delta.y);
    let notches = match scroll.unit {
        MouseScrollUnit::Line => scroll.delta.y * PIXELS_PER_LINE,
        MouseScrollUnit::Pixel => scroll.delta.y,
    };
    frame.add_scroll(notches);
    frame.pointer_locked = session.pointer().is_locked();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_default_binding_has_a_physical_input() {
        for action in Action::ALL {
            assert!(
                physical(action.default_code()).is_some(),
                "{} has no physical input",
                action.name()
            );
        }
    }

    #[test]
    fn every_action_has_an_input_action() {
        for action in Action::ALL {
            assert!(InputAction::from_action(*action).is_some());
        }
    }

    #[test]
    fn names_map_back_to_devices() {
        assert_eq!(physical("Mouse2"), Some(PhysicalInput::Mouse(MouseButton::Right)));
        assert_eq!(key_name(KeyCode::Backquote), Some("Backquote"));
        assert_eq!(physical("Escape"), None);
    }
}
