//! Performance overlay for native dev builds, toggled with F12.

use bevy::diagnostic::{
    EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin, SystemInformationDiagnosticsPlugin,
};
use bevy::prelude::*;
use bevy::render::diagnostic::RenderDiagnosticsPlugin;
use iyes_perf_ui::prelude::*;

const TOGGLE_KEY: KeyCode = KeyCode::F12;

pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        FrameTimeDiagnosticsPlugin::default(),
        EntityCountDiagnosticsPlugin::default(),
        SystemInformationDiagnosticsPlugin::default(),
        RenderDiagnosticsPlugin,
        PerfUiPlugin,
    ));

    app.add_systems(Update, toggle_perf_ui);
}

fn toggle_perf_ui(
    mut commands: Commands,
    keys: Res<ButtonInput<KeyCode>>,
    overlays: Query<Entity, With<PerfUiRoot>>,
) {
    if !keys.just_pressed(TOGGLE_KEY) {
        return;
    }
    if overlays.is_empty() {
        commands.spawn(PerfUiAllEntries::default());
    } else {
        for overlay in &overlays {
            commands.entity(overlay).despawn();
        }
    }
}
