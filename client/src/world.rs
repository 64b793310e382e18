//! Meshes mirroring the simulated world: floor, boxes, the car and gun beams.

use crate::convert::{to_vec3, transform};
use crate::session::Session;
use bevy::{platform::collections::HashMap, prelude::*};
use shared::constants::{CHASSIS_HALF_EXTENTS, CHASSIS_COLLIDER_OFFSET, WHEEL_RADIUS};

const FLOOR_SIZE: f32 = 400.0;
const WHEEL_WIDTH: f32 = 0.4;
const BEAM_COLOR: Color = Color::srgb(0.3, 0.8, 1.0);

/// Box materials indexed by the record's texture number.
#[derive(Resource)]
struct Palette(Vec<Handle<StandardMaterial>>);

impl Palette {
    fn material(&self, texture: u8) -> Handle<StandardMaterial> {
        self.0[texture as usize % self.0.len()].clone()
    }
}

/// Store key to the entity rendering that synced object.
#[derive(Resource, Default)]
struct ObjectEntities(HashMap<String, Entity>);

#[derive(Component)]
struct SyncedBox;

#[derive(Component)]
struct Chassis(usize);

#[derive(Component)]
struct Wheel {
    vehicle: usize,
    index: usize,
}

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<ObjectEntities>();
    app.add_systems(Startup, setup);
    app.add_systems(
        PostUpdate,
        (mirror_objects, spawn_vehicles, mirror_vehicles, draw_beams).chain(),
    );
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    debug!("World setup");

    commands.spawn((
        Name::new("Ground"),
        Transform::default(),
        Mesh3d(meshes.add(Plane3d::default().mesh().size(FLOOR_SIZE, FLOOR_SIZE).build())),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::linear_rgb(0.2, 0.3, 0.25),
            perceptual_roughness: 1.0,
            metallic: 0.0,
            ..default()
        })),
    ));

    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            illuminance: light_consts::lux::OVERCAST_DAY,
            ..default()
        },
        Transform::from_xyz(20.0, 40.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.insert_resource(AmbientLight {
        brightness: 400.0,
        ..default()
    });

    let palette = [
        Color::srgb_u8(160, 110, 60),
        Color::srgb_u8(124, 144, 255),
        Color::srgb_u8(140, 140, 150),
    ]
    .into_iter()
    .map(|base_color| {
        materials.add(StandardMaterial {
            base_color,
            perceptual_roughness: 0.8,
            ..default()
        })
    })
    .collect();
    commands.insert_resource(Palette(palette));
}

fn mirror_objects(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    palette: Res<Palette>,
    session: Res<Session>,
    mut entities: ResMut<ObjectEntities>,
    mut boxes: Query<&mut Transform, With<SyncedBox>>,
) {
    let world = session.world();
    entities.0.retain(|key, entity| {
        let alive = world.synced(key).is_some();
        if !alive {
            commands.entity(*entity).despawn();
        }
        alive
    });

    for object in world.synced_objects() {
        let target = transform(&object.position(), &object.rotation());
        if let Some(entity) = entities.0.get(object.key()) {
            if let Ok(mut tf) = boxes.get_mut(*entity) {
                *tf = target;
            }
            continue;
        }
        let size = to_vec3(&object.half_extents()) * 2.0;
        let entity = commands
            .spawn((
                Name::new(format!("Box {}", object.key())),
                SyncedBox,
                Mesh3d(meshes.add(Cuboid::from_size(size))),
                MeshMaterial3d(palette.material(object.texture())),
                target,
            ))
            .id();
        entities.0.insert(object.key().to_string(), entity);
    }
}

/// One chassis and four wheels per car; cars are never removed.
fn spawn_vehicles(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    session: Res<Session>,
    existing: Query<&Chassis>,
) {
    let count = session.world().vehicles().len();
    let spawned = existing.iter().count();
    if spawned >= count {
        return;
    }

    let [hx, hy, hz] = CHASSIS_HALF_EXTENTS;
    let body_mesh = meshes.add(Cuboid::new(hx * 2.0, hy * 2.0, hz * 2.0));
    let body_mat = materials.add(Color::srgb(0.8, 0.15, 0.1));
    let wheel_mesh = meshes.add(
        Cylinder::new(WHEEL_RADIUS, WHEEL_WIDTH)
            .mesh()
            .build()
            .rotated_by(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2)),
    );
    let wheel_mat = materials.add(Color::srgb(0.1, 0.1, 0.1));

    for vehicle in spawned..count {
        commands
            .spawn((
                Name::new(format!("Car {vehicle}")),
                Chassis(vehicle),
                Transform::default(),
                Visibility::default(),
            ))
            .with_children(|parent| {
                parent.spawn((
                    Mesh3d(body_mesh.clone()),
                    MeshMaterial3d(body_mat.clone()),
                    Transform::from_xyz(0.0, CHASSIS_COLLIDER_OFFSET, 0.0),
                ));
            });
        for index in 0..4 {
            commands.spawn((
                Name::new(format!("Car {vehicle} wheel {index}")),
                Wheel { vehicle, index },
                Mesh3d(wheel_mesh.clone()),
                MeshMaterial3d(wheel_mat.clone()),
                Transform::default(),
            ));
        }
    }
}

fn mirror_vehicles(
    session: Res<Session>,
    mut chassis: Query<(&Chassis, &mut Transform), Without<Wheel>>,
    mut wheels: Query<(&Wheel, &mut Transform), Without<Chassis>>,
) {
    let world = session.world();
    for (Chassis(id), mut tf) in &mut chassis {
        if let Some((position, rotation)) = world.vehicle(*id).and_then(|v| v.pose(&world.physics))
        {
            *tf = transform(&position, &rotation);
        }
    }

    let poses: Vec<Vec<_>> = world
        .vehicles()
        .iter()
        .map(|v| v.wheel_poses(&world.physics))
        .collect();
    for (wheel, mut tf) in &mut wheels {
        if let Some((center, rotation)) = poses.get(wheel.vehicle).and_then(|p| p.get(wheel.index)) {
            *tf = transform(center, rotation);
        }
    }
}

/// Gun beams: ours while firing, and every remote that is firing.
fn draw_beams(mut gizmos: Gizmos, session: Res<Session>) {
    if let Some((start, end)) = session.gun().ray() {
        gizmos.line(to_vec3(&start), to_vec3(&end), BEAM_COLOR);
    }

    for remote in session.network().remotes() {
        if let Some((start, end)) = remote.ray() {
            gizmos.line(to_vec3(&start), to_vec3(&end), BEAM_COLOR);
        }
    }
}
