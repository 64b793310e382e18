use crate::config::LaunchConfig;
use crate::input::FrameInput;
use bevy::{
    input::{
        ButtonState,
        keyboard::{Key, KeyboardInput},
    },
    prelude::*,
};
use shared::net::{MemoryStore, SharedStore};
use shared::{Game, Menu, Mode, net::VoiceManager};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Longest chat line the input box accepts.
const MAX_CHAT_LEN: usize = 200;

/// Admin menu hotkeys and the mode each one toggles.
const CHEAT_KEYS: [(KeyCode, Mode); 7] = [
    (KeyCode::F1, Mode::Flying),
    (KeyCode::F2, Mode::Noclip),
    (KeyCode::F3, Mode::Freecam),
    (KeyCode::F4, Mode::FreecamMove),
    (KeyCode::F5, Mode::God),
    (KeyCode::F6, Mode::InfiniteStamina),
    (KeyCode::F7, Mode::ThirdPerson),
];

/// The whole simulation for this client.
#[derive(Resource, Deref, DerefMut)]
pub struct Session(pub Game);

/// Text typed into the open chat box.
#[derive(Resource, Default, Deref, DerefMut)]
pub struct ChatDraft(pub String);

#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameSet {
    /// Device sampling and UI text entry.
    Input,
    /// One `Game::frame`, then the join and respawn prompts.
    Simulate,
}

pub(super) fn plugin(app: &mut App) {
    let config = LaunchConfig::from_cli_env();
    info!("Launching as {}.", config.name);

    // The client plays against an in-process loopback store.
    let store: Arc<dyn SharedStore> = Arc::new(MemoryStore::new());
    let game = Game::new(config.settings.clone(), Some(store), VoiceManager::default());

    app.insert_resource(Session(game));
    app.insert_resource(config);
    app.init_resource::<ChatDraft>();

    app.configure_sets(Update, (FrameSet::Input, FrameSet::Simulate).chain());
    app.add_systems(Update, (type_chat, toggle_cheats).in_set(FrameSet::Input));
    app.add_systems(
        Update,
        (run_frame, join_or_respawn).chain().in_set(FrameSet::Simulate),
    );
    app.add_systems(Last, leave_on_exit);
}

/// Wall-clock time since the Unix epoch, the clock every peer stamps records with.
pub fn wall_clock() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

fn run_frame(time: Res<Time>, mut input: ResMut<FrameInput>, mut session: ResMut<Session>) {
    session.frame(time.delta_secs(), wall_clock(), &input);
    input.reset();
}

/// Enter joins from the title prompt. A click respawns after death.
fn join_or_respawn(
    keys: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    config: Res<LaunchConfig>,
    mut session: ResMut<Session>,
) {
    if !session.network().is_spawned() {
        if keys.just_pressed(KeyCode::Enter) {
            session.spawn(&config.name, wall_clock());
            info!("Joined as {}.", session.network().name());
        }
        return;
    }
    if session.character().is_dead() && mouse.just_pressed(MouseButton::Left) {
        session.respawn();
    }
}

fn type_chat(
    mut keyboard: MessageReader<KeyboardInput>,
    mut draft: ResMut<ChatDraft>,
    mut session: ResMut<Session>,
) {
    if !session.is_chat_open() {
        keyboard.clear();
        return;
    }

    for event in keyboard.read() {
        if event.state != ButtonState::Pressed {
            continue;
        }
        match &event.logical_key {
            Key::Enter => {
                let text = std::mem::take(&mut draft.0);
                session.submit_chat(&text);
                return;
            }
            Key::Escape => {
                draft.clear();
                session.close_chat();
                return;
            }
            Key::Backspace => {
                draft.pop();
            }
            _ => {
                let Some(text) = &event.text else {
                    continue;
                };
                for c in text.chars().filter(|c| !c.is_control()) {
                    if draft.chars().count() < MAX_CHAT_LEN {
                        draft.push(c);
                    }
                }
            }
        }
    }
}

fn toggle_cheats(keys: Res<ButtonInput<KeyCode>>, mut session: ResMut<Session>) {
    if session.menu() != Some(Menu::Admin) {
        return;
    }
    for (key, mode) in CHEAT_KEYS {
        if keys.just_pressed(key) {
            let on = session.toggle_cheat(mode);
            info!("{} {}", mode.name(), if on { "on" } else { "off" });
        }
    }
}

fn leave_on_exit(mut exits: MessageReader<AppExit>, mut session: ResMut<Session>) {
    if exits.read().next().is_some() && session.network().is_spawned() {
        session.disconnect();
    }
}
