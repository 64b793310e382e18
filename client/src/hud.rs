use crate::config::LaunchConfig;
use crate::input::{KeyBindings, RebindCursor};
use crate::session::{ChatDraft, Session};
use bevy::prelude::*;
use shared::{HudSnapshot, Menu, Mode};

const FONT_SIZE: f32 = 16.0;
const HOTBAR_SIZE: u8 = 9;

/// Admin toggles in the order the F-keys are assigned.
const ADMIN_MODES: [(&str, Mode); 7] = [
    ("F1", Mode::Flying),
    ("F2", Mode::Noclip),
    ("F3", Mode::Freecam),
    ("F4", Mode::FreecamMove),
    ("F5", Mode::God),
    ("F6", Mode::InfiniteStamina),
    ("F7", Mode::ThirdPerson),
];

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
enum HudText {
    Stats,
    Prompt,
    Players,
    Chat,
    Hotbar,
    Crosshair,
}

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, spawn_hud);
    app.add_systems(PostUpdate, refresh_hud);
}

fn spawn_hud(mut commands: Commands) {
    let at = |top: Option<f32>, bottom: Option<f32>, left: f32| Node {
        position_type: PositionType::Absolute,
        top: top.map_or(Val::Auto, Val::Px),
        bottom: bottom.map_or(Val::Auto, Val::Px),
        left: Val::Percent(left),
        ..default()
    };
    let panels = [
        (HudText::Stats, at(Some(8.0), None, 1.0)),
        (HudText::Players, at(Some(8.0), None, 40.0)),
        (HudText::Prompt, at(Some(160.0), None, 35.0)),
        (HudText::Crosshair, at(None, None, 50.0)),
        (HudText::Chat, at(None, Some(48.0), 1.0)),
        (HudText::Hotbar, at(None, Some(8.0), 35.0)),
    ];
    for (kind, mut node) in panels {
        if kind == HudText::Crosshair {
            node.top = Val::Percent(50.0);
        }
        commands.spawn((
            Name::new(format!("{kind:?}")),
            kind,
            Text::new(""),
            TextFont {
                font_size: FONT_SIZE,
                ..default()
            },
            TextColor(Color::WHITE),
            node,
        ));
    }
}

fn refresh_hud(
    session: Res<Session>,
    draft: Res<ChatDraft>,
    config: Res<LaunchConfig>,
    bindings: Res<KeyBindings>,
    cursor: Res<RebindCursor>,
    mut texts: Query<(&HudText, &mut Text)>,
) {
    let hud = session.hud();
    let spawned = session.network().is_spawned();
    let locked = session.pointer().is_locked();

    for (kind, mut text) in &mut texts {
        let content = match kind {
            HudText::Stats if spawned => stats_lines(&hud),
            HudText::Players if hud.show_players => player_lines(&hud),
            HudText::Chat => chat_lines(&hud, draft.as_str()),
            HudText::Hotbar if spawned => hotbar_line(hud.slot),
            HudText::Crosshair if spawned && locked => "+".to_string(),
            HudText::Prompt => {
                if !spawned {
                    format!("Press Enter to join as {}", config.name)
                } else if hud.dead {
                    "You died. Click to respawn.".to_string()
                } else {
                    match hud.menu {
                        Some(Menu::Admin) => admin_lines(&session, &bindings, &cursor),
                        Some(Menu::Inventory) => "Inventory\n(E to close)".to_string(),
                        None if !locked && !hud.chat_open => "Click to play".to_string(),
                        None => String::new(),
                    }
                }
            }
            _ => String::new(),
        };
        if text.0 != content {
            text.0 = content;
        }
    }
}

fn stats_lines(hud: &HudSnapshot) -> String {
    let p = hud.position;
    let link = if hud.online {
        format!("{} ms", hud.ping)
    } else {
        "offline".to_string()
    };
    let mut lines = format!(
        "Health {:.0}\nEnergy {:.0}\nPos {:.1} {:.1} {:.1}\nSpeed {:.1} m/s\nPing {link}",
        hud.health, hud.energy, p.x, p.y, p.z, hud.speed
    );
    if hud.driving {
        lines.push_str("\nDriving (F to exit)");
    }
    if hud.talking {
        lines.push_str("\nTalking");
    }
    lines
}

fn player_lines(hud: &HudSnapshot) -> String {
    let mut lines = format!("Players ({})", hud.players.len());
    for entry in &hud.players {
        let ping = if entry.local {
            "you".to_string()
        } else {
            format!("{} ms", entry.ping)
        };
        lines.push_str(&format!("\n{}  {ping}", entry.name));
    }
    lines
}

fn chat_lines(hud: &HudSnapshot, draft: &str) -> String {
    let mut lines: Vec<String> = hud
        .chat
        .iter()
        .map(|m| format!("{}: {}", m.name, m.text))
        .collect();
    if hud.chat_open {
        lines.push(format!("> {draft}_"));
    }
    lines.join("\n")
}

fn hotbar_line(selected: u8) -> String {
    (1..=HOTBAR_SIZE)
        .map(|slot| {
            if slot == selected {
                format!("[{slot}]")
            } else {
                format!(" {slot} ")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn admin_lines(session: &Session, bindings: &KeyBindings, cursor: &RebindCursor) -> String {
    let mut lines = "Admin (` to close)".to_string();
    for (key, mode) in ADMIN_MODES {
        let state = if session.character().has_mode(mode) {
            "on"
        } else {
            "off"
        };
        lines.push_str(&format!("\n{key}  {}: {state}", mode.name()));
    }
    let action = cursor.action();
    let code = if bindings.is_capturing() {
        "press a key...".to_string()
    } else {
        bindings.code(action).unwrap_or("unbound").to_string()
    };
    lines.push_str(&format!(
        "\nPgUp/PgDn  F8 rebind  {}: {code}",
        action.name()
    ));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::collision::Vec3;
    use shared::net::{ChatMessage, PlayerListEntry};

    fn snapshot() -> HudSnapshot {
        HudSnapshot {
            health: 87.4,
            energy: 100.0,
            position: Vec3::new(1.0, 2.25, -3.0),
            speed: 10.0,
            ping: 42,
            slot: 1,
            dead: false,
            driving: false,
            online: true,
            talking: false,
            show_players: true,
            players: vec![
                PlayerListEntry {
                    name: "Ada".into(),
                    ping: 0,
                    local: true,
                },
                PlayerListEntry {
                    name: "Bo".into(),
                    ping: 31,
                    local: false,
                },
            ],
            chat: vec![ChatMessage {
                name: "Bo".into(),
                text: "hi".into(),
                color: 0xffffff,
                timestamp: 0,
            }],
            chat_open: false,
            menu: None,
        }
    }

    #[test]
    fn stats_show_rounded_values_and_link_state() {
        let mut hud = snapshot();
        let text = stats_lines(&hud);
        assert!(text.contains("Health 87"));
        assert!(text.contains("Pos 1.0 2.2 -3.0") || text.contains("Pos 1.0 2.3 -3.0"));
        assert!(text.contains("Ping 42 ms"));

        hud.online = false;
        hud.driving = true;
        let text = stats_lines(&hud);
        assert!(text.contains("Ping offline"));
        assert!(text.contains("Driving"));
    }

    #[test]
    fn player_list_marks_the_local_player() {
        let text = player_lines(&snapshot());
        assert_eq!(text, "Players (2)\nAda  you\nBo  31 ms");
    }

    #[test]
    fn open_chat_shows_the_draft() {
        let mut hud = snapshot();
        assert_eq!(chat_lines(&hud, "ignored"), "Bo: hi");
        hud.chat_open = true;
        assert_eq!(chat_lines(&hud, "yo"), "Bo: hi\n> yo_");
    }

    #[test]
    fn hotbar_brackets_the_selected_slot() {
        let line = hotbar_line(3);
        assert!(line.starts_with(" 1   2  [3]"));
        assert_eq!(line.matches('[').count(), 1);
    }
}
