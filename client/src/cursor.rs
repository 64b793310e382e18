//! Pointer lock: applies the simulation's lock requests to the OS cursor and
//! reports the confirmed state back.

use crate::session::{FrameSet, Session};
use bevy::{
    prelude::*,
    window::{CursorGrabMode, CursorOptions, PrimaryWindow, WindowFocused},
};
use shared::input::LockChange;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        (release_on_escape, click_to_lock, release_on_blur, apply_lock)
            .chain()
            .in_set(FrameSet::Input),
    );
    // Requests raised during the frame are applied before the next one.
    app.add_systems(PostUpdate, (apply_lock, log_lock_changes).chain());
}

#[cfg(not(target_os = "windows"))]
const GRAB: CursorGrabMode = CursorGrabMode::Locked;
// Windows has no true lock; confine and hide instead.
#[cfg(target_os = "windows")]
const GRAB: CursorGrabMode = CursorGrabMode::Confined;

fn apply_lock(
    mut session: ResMut<Session>,
    mut cursor: Single<&mut CursorOptions, With<PrimaryWindow>>,
) {
    let Some(locked) = session.pointer_mut().take_request() else {
        return;
    };
    if locked {
        cursor.grab_mode = GRAB;
        cursor.visible = false;
    } else {
        cursor.grab_mode = CursorGrabMode::None;
        cursor.visible = true;
    }
    session.pointer_mut().confirm(locked);
}

fn release_on_escape(keys: Res<ButtonInput<KeyCode>>, mut session: ResMut<Session>) {
    if keys.just_pressed(KeyCode::Escape) && session.pointer().is_locked() {
        session.pointer_mut().request(false);
    }
}

/// Clicking back into the game resumes play when nothing else wants the pointer.
fn click_to_lock(mouse: Res<ButtonInput<MouseButton>>, mut session: ResMut<Session>) {
    let wants_pointer = session.network().is_spawned()
        && !session.pointer().is_locked()
        && !session.is_chat_open()
        && session.menu().is_none()
        && !session.character().is_dead();
    if wants_pointer && mouse.just_pressed(MouseButton::Left) {
        session.pointer_mut().request(true);
    }
}

fn release_on_blur(mut messages: MessageReader<WindowFocused>, mut session: ResMut<Session>) {
    for message in messages.read() {
        if !message.focused && session.pointer().is_locked() {
            session.pointer_mut().request(false);
        }
    }
}

fn log_lock_changes(mut session: ResMut<Session>) {
    for change in session.pointer_mut().drain_changes() {
        match change {
            LockChange::Locked => debug!("Pointer locked."),
            LockChange::Unlocked => debug!("Pointer released."),
        }
    }
}
