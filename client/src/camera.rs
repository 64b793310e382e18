use crate::convert::{to_quat, to_vec3};
use crate::session::Session;
use bevy::prelude::*;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, add_camera);
    app.add_systems(PostUpdate, (follow_rig, apply_view_settings));
}

/// Fog starts at this fraction of the render distance.
const FOG_START: f32 = 0.5;
const SKY: Color = Color::srgb(0.53, 0.81, 0.92);

fn add_camera(mut commands: Commands, session: Res<Session>) {
    let settings = session.settings().clamped();
    commands.insert_resource(ClearColor(SKY));
    commands.spawn((
        Camera3d::default(),
        bevy::core_pipeline::tonemapping::Tonemapping::AcesFitted,
        Projection::Perspective(PerspectiveProjection {
            fov: settings.fov.to_radians(),
            far: settings.render_distance,
            ..default()
        }),
        Transform::default(),
        DistanceFog {
            color: SKY,
            falloff: FogFalloff::Linear {
                start: settings.render_distance * FOG_START,
                end: settings.render_distance,
            },
            ..default()
        },
    ));
}

fn follow_rig(session: Res<Session>, mut camera: Single<&mut Transform, With<Camera3d>>) {
    let rig = session.character().camera();
    camera.translation = to_vec3(&rig.position);
    camera.rotation = to_quat(&rig.rotation);
}

/// FOV and render distance follow the settings sliders.
fn apply_view_settings(
    session: Res<Session>,
    camera: Single<(&mut Projection, &mut DistanceFog), With<Camera3d>>,
) {
    let settings = session.settings().clamped();
    let fov = settings.fov.to_radians();
    let far = settings.render_distance;
    let (mut projection, mut fog) = camera.into_inner();

    let stale = match &*projection {
        Projection::Perspective(p) => p.fov != fov || p.far != far,
        _ => true,
    };
    if stale {
        *projection = Projection::Perspective(PerspectiveProjection {
            fov,
            far,
            ..default()
        });
        fog.falloff = FogFalloff::Linear {
            start: far * FOG_START,
            end: far,
        };
    }
}
