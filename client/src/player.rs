//! Articulated avatars: one per remote player, plus our own body when the
//! camera is outside it.

use crate::convert::{color, to_vec3};
use crate::session::Session;
use bevy::{platform::collections::HashMap, prelude::*};
use shared::anim::LimbPose;

const HIP_HEIGHT: f32 = 1.0;
const HIP_SPREAD: f32 = 0.13;
const THIGH: f32 = 0.5;
const SHIN: f32 = 0.5;
const TORSO: Vec3 = Vec3::new(0.5, 0.65, 0.25);
const SHOULDER: Vec3 = Vec3::new(0.32, 0.6, 0.0);
const ARM: f32 = 0.65;
const HEAD_RADIUS: f32 = 0.2;
const LIMB_WIDTH: f32 = 0.14;

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<RemoteAvatars>();
    app.add_systems(Startup, (load_parts, spawn_local_avatar).chain());
    app.add_systems(
        PostUpdate,
        (track_remotes, place_avatars, pose_joints, show_props).chain(),
    );
}

/// Whose state an avatar mirrors.
#[derive(Component, Clone, Debug, PartialEq, Eq)]
enum Avatar {
    Local,
    Remote(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum JointKind {
    Hips,
    Spine,
    Head,
    LeftArm,
    RightArm,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
}

#[derive(Component)]
struct Joint {
    avatar: Entity,
    kind: JointKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PropKind {
    Gun,
    Speaker,
}

/// Extra meshes toggled by player state.
#[derive(Component)]
struct Prop {
    avatar: Entity,
    kind: PropKind,
}

#[derive(Resource, Default)]
struct RemoteAvatars(HashMap<String, Entity>);

#[derive(Resource)]
struct AvatarParts {
    torso: Handle<Mesh>,
    head: Handle<Mesh>,
    thigh: Handle<Mesh>,
    shin: Handle<Mesh>,
    arm: Handle<Mesh>,
    gun: Handle<Mesh>,
    speaker: Handle<Mesh>,
    gun_material: Handle<StandardMaterial>,
    speaker_material: Handle<StandardMaterial>,
}

fn load_parts(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.insert_resource(AvatarParts {
        torso: meshes.add(Cuboid::from_size(TORSO)),
        head: meshes.add(Sphere::new(HEAD_RADIUS)),
        thigh: meshes.add(Cuboid::new(LIMB_WIDTH, THIGH, LIMB_WIDTH)),
        shin: meshes.add(Cuboid::new(LIMB_WIDTH, SHIN, LIMB_WIDTH)),
        arm: meshes.add(Cuboid::new(LIMB_WIDTH, ARM, LIMB_WIDTH)),
        gun: meshes.add(Cuboid::new(0.1, 0.12, 0.5)),
        speaker: meshes.add(Sphere::new(0.08)),
        gun_material: materials.add(Color::srgb(0.2, 0.2, 0.25)),
        speaker_material: materials.add(StandardMaterial {
            base_color: Color::srgb(0.2, 1.0, 0.3),
            unlit: true,
            ..default()
        }),
    });
}

fn spawn_local_avatar(
    mut commands: Commands,
    parts: Res<AvatarParts>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    session: Res<Session>,
) {
    let material = materials.add(color(session.network().color()));
    spawn_avatar(&mut commands, &parts, material, Avatar::Local);
}

fn spawn_avatar(
    commands: &mut Commands,
    parts: &AvatarParts,
    material: Handle<StandardMaterial>,
    owner: Avatar,
) -> Entity {
    let name = match &owner {
        Avatar::Local => "Local avatar".to_string(),
        Avatar::Remote(id) => format!("Avatar {id}"),
    };
    let avatar = commands
        .spawn((
            Name::new(name),
            owner,
            Transform::default(),
            Visibility::Hidden,
        ))
        .id();

    let joint = |commands: &mut Commands, parent: Entity, kind: JointKind, at: Vec3| {
        commands
            .spawn((
                Joint { avatar, kind },
                Transform::from_translation(at),
                Visibility::Inherited,
                ChildOf(parent),
            ))
            .id()
    };
    let limb = |commands: &mut Commands, parent: Entity, mesh: &Handle<Mesh>, at: Vec3| {
        commands.spawn((
            Mesh3d(mesh.clone()),
            MeshMaterial3d(material.clone()),
            Transform::from_translation(at),
            ChildOf(parent),
        ));
    };

    let hips = joint(commands, avatar, JointKind::Hips, Vec3::Y * HIP_HEIGHT);
    let spine = joint(commands, hips, JointKind::Spine, Vec3::ZERO);
    limb(commands, spine, &parts.torso, Vec3::Y * TORSO.y / 2.0);

    let head = joint(commands, spine, JointKind::Head, Vec3::Y * TORSO.y);
    limb(commands, head, &parts.head, Vec3::Y * HEAD_RADIUS * 1.2);

    let shoulder = |side: f32| Vec3::new(SHOULDER.x * side, SHOULDER.y, SHOULDER.z);
    let left_arm = joint(commands, spine, JointKind::LeftArm, shoulder(-1.0));
    limb(commands, left_arm, &parts.arm, Vec3::NEG_Y * ARM / 2.0);
    let right_arm = joint(commands, spine, JointKind::RightArm, shoulder(1.0));
    limb(commands, right_arm, &parts.arm, Vec3::NEG_Y * ARM / 2.0);

    for (hip_kind, knee_kind, side) in [
        (JointKind::LeftHip, JointKind::LeftKnee, -1.0),
        (JointKind::RightHip, JointKind::RightKnee, 1.0),
    ] {
        let hip = joint(commands, hips, hip_kind, Vec3::X * HIP_SPREAD * side);
        limb(commands, hip, &parts.thigh, Vec3::NEG_Y * THIGH / 2.0);
        let knee = joint(commands, hip, knee_kind, Vec3::NEG_Y * THIGH);
        limb(commands, knee, &parts.shin, Vec3::NEG_Y * SHIN / 2.0);
    }

    commands.spawn((
        Prop {
            avatar,
            kind: PropKind::Gun,
        },
        Mesh3d(parts.gun.clone()),
        MeshMaterial3d(parts.gun_material.clone()),
        Transform::from_xyz(0.0, -ARM, -0.2),
        Visibility::Hidden,
        ChildOf(right_arm),
    ));
    commands.spawn((
        Prop {
            avatar,
            kind: PropKind::Speaker,
        },
        Mesh3d(parts.speaker.clone()),
        MeshMaterial3d(parts.speaker_material.clone()),
        Transform::from_xyz(0.0, HEAD_RADIUS * 3.0, 0.0),
        Visibility::Hidden,
        ChildOf(head),
    ));

    avatar
}

fn track_remotes(
    mut commands: Commands,
    parts: Res<AvatarParts>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    session: Res<Session>,
    mut avatars: ResMut<RemoteAvatars>,
) {
    let network = session.network();
    avatars.0.retain(|id, entity| {
        let alive = network.remote(id).is_some();
        if !alive {
            debug!("Removing avatar for {id}");
            commands.entity(*entity).despawn();
        }
        alive
    });

    for remote in network.remotes() {
        if avatars.0.contains_key(remote.id()) {
            continue;
        }
        let material = materials.add(color(remote.color()));
        let entity = spawn_avatar(
            &mut commands,
            &parts,
            material,
            Avatar::Remote(remote.id().to_string()),
        );
        avatars.0.insert(remote.id().to_string(), entity);
    }
}

fn place_avatars(
    session: Res<Session>,
    mut avatars: Query<(&Avatar, &mut Transform, &mut Visibility)>,
) {
    let network = session.network();
    let character = session.character();
    for (avatar, mut tf, mut visibility) in &mut avatars {
        let (position, yaw, visible) = match avatar {
            Avatar::Local => (
                character.position(),
                character.yaw(),
                character.shows_body() && network.is_spawned(),
            ),
            Avatar::Remote(id) => match network.remote(id) {
                Some(remote) => (remote.position(), remote.yaw(), remote.is_visible()),
                None => continue,
            },
        };
        tf.translation = to_vec3(&position);
        tf.rotation = Quat::from_rotation_y(yaw);
        visibility.set_if_neq(if visible {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        });
    }
}

fn pose_joints(
    session: Res<Session>,
    avatars: Query<(Entity, &Avatar)>,
    mut joints: Query<(&Joint, &mut Transform)>,
) {
    let network = session.network();
    let poses: HashMap<Entity, LimbPose> = avatars
        .iter()
        .filter_map(|(entity, avatar)| {
            let pose = match avatar {
                Avatar::Local => *session.character().limbs(),
                Avatar::Remote(id) => *network.remote(id)?.limbs(),
            };
            Some((entity, pose))
        })
        .collect();

    for (joint, mut tf) in &mut joints {
        let Some(pose) = poses.get(&joint.avatar) else {
            continue;
        };
        let pitch = |angle: f32| Quat::from_rotation_x(angle);
        match joint.kind {
            JointKind::Hips => {
                tf.translation = Vec3::new(0.0, HIP_HEIGHT + pose.torso_drop, pose.hip_shift);
            }
            JointKind::Spine => tf.rotation = pitch(pose.spine),
            JointKind::Head => tf.rotation = pitch(pose.head),
            JointKind::LeftArm => tf.rotation = pitch(pose.left_arm),
            JointKind::RightArm => tf.rotation = pitch(pose.right_arm),
            JointKind::LeftHip => tf.rotation = pitch(pose.left_hip),
            JointKind::RightHip => tf.rotation = pitch(pose.right_hip),
            JointKind::LeftKnee => tf.rotation = pitch(pose.left_knee),
            JointKind::RightKnee => tf.rotation = pitch(pose.right_knee),
        }
    }
}

fn show_props(
    session: Res<Session>,
    avatars: Query<&Avatar>,
    mut props: Query<(&Prop, &mut Visibility)>,
) {
    let network = session.network();
    for (prop, mut visibility) in &mut props {
        let Ok(avatar) = avatars.get(prop.avatar) else {
            continue;
        };
        let shown = match (avatar, prop.kind) {
            (Avatar::Local, PropKind::Gun) => session.gun().is_active(),
            (Avatar::Local, PropKind::Speaker) => network.voice().is_speaking(),
            (Avatar::Remote(id), kind) => network.remote(id).is_some_and(|r| match kind {
                PropKind::Gun => r.is_holding_gun(),
                PropKind::Speaker => r.is_talking(),
            }),
        };
        visibility.set_if_neq(if shown {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        });
    }
}
