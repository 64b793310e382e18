use super::outbox::Outbox;
use super::records::{ChatRecord, ObjectRecord, OwnershipUpdate, PlayerRecord};
use super::remote::RemotePlayer;
use super::store::{Collection, EventKind, SharedStore, StoreEvent, StorePath, SubscriptionId};
use super::voice::VoiceManager;
use crate::collision::Vec3;
use crate::constants::{
    GHOST_SWEEP_INTERVAL, GHOST_TIMEOUT, MAX_CHAT_MESSAGES, NETWORK_TICK, PING_INTERVAL,
    PLAYER_SPAWN, STALE_RECORD_AGE, WORLD_BOX_COUNT, WORLD_BOX_DROP_HEIGHT, WORLD_BOX_SPREAD,
    WORLD_BOX_TEXTURES,
};
use crate::error::StoreError;
use crate::gun::{GunTelemetry, ObjectAuthority};
use crate::input::{Action, InputFrame};
use crate::world::GameWorld;
use rand::Rng;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LENGTH: usize = 9;

/// A fresh process-lifetime player identity: `user_` plus nine base-36 characters.
pub fn generate_player_id() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ID_LENGTH)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("user_{suffix}")
}

/// Random 24-bit RGB color.
pub fn random_color() -> u32 {
    rand::rng().random_range(0..=0xFF_FFFF)
}

/// A random box for the initial world.
pub fn random_box() -> ObjectRecord {
    let mut rng = rand::rng();
    let half_spread = WORLD_BOX_SPREAD;
    let sy = rng.random_range(1.0..6.0);
    ObjectRecord {
        x: rng.random_range(-half_spread..half_spread),
        y: sy / 2.0 + WORLD_BOX_DROP_HEIGHT,
        z: rng.random_range(-half_spread..half_spread),
        sx: rng.random_range(1.0..3.0),
        sy,
        sz: rng.random_range(1.0..3.0),
        tex: rng.random_range(0..WORLD_BOX_TEXTURES),
        ..Default::default()
    }
}

/// Fires once every `period`.
#[derive(Clone, Copy, Debug)]
struct Interval {
    period: Duration,
    last: Option<Duration>,
    immediate: bool,
}

impl Interval {
    fn new(period: Duration, immediate: bool) -> Self {
        Self {
            period,
            last: None,
            immediate,
        }
    }

    fn ready(&mut self, now: Duration) -> bool {
        match self.last {
            None => {
                self.last = Some(now);
                self.immediate
            }
            Some(last) if now.saturating_sub(last) >= self.period => {
                self.last = Some(now);
                true
            }
            Some(_) => false,
        }
    }
}

/// The local player's state as published every tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LocalPlayerState {
    pub position: Vec3,
    pub yaw: f32,
    pub crouch: f32,
    pub speed: f32,
    pub dead: bool,
    pub airborne: bool,
    pub gun: GunTelemetry,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub name: String,
    pub text: String,
    pub color: u32,
    pub timestamp: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlayerListEntry {
    pub name: String,
    pub ping: u32,
    pub local: bool,
}

#[derive(Clone, Copy, Debug)]
struct Subscriptions {
    players: SubscriptionId,
    objects: SubscriptionId,
    chat: SubscriptionId,
    ping: SubscriptionId,
}

fn millis(now: Duration) -> u64 {
    now.as_millis().min(u64::MAX as u128) as u64
}

/// Replicates the local player and owned objects, and mirrors everybody else.
pub struct NetworkManager {
    id: String,
    name: String,
    color: u32,
    store: Option<Arc<dyn SharedStore>>,
    subscriptions: Option<Subscriptions>,
    outbox: Outbox,
    spawned: bool,
    remotes: HashMap<String, RemotePlayer>,
    chat: VecDeque<ChatMessage>,
    voice: VoiceManager,
    ping_ms: u32,
    ping_sent: Option<u64>,
    now: Duration,
    tick: Interval,
    sweep: Interval,
    probe: Interval,
}

impl std::fmt::Debug for NetworkManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkManager")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("online", &self.is_online())
            .field("spawned", &self.spawned)
            .field("remotes", &self.remotes.len())
            .finish_non_exhaustive()
    }
}

impl Default for NetworkManager {
    fn default() -> Self {
        Self::new(VoiceManager::default())
    }
}

impl NetworkManager {
    pub fn new(voice: VoiceManager) -> Self {
        Self::with_id(generate_player_id(), voice)
    }

    pub fn with_id(id: impl Into<String>, voice: VoiceManager) -> Self {
        Self {
            id: id.into(),
            name: "Player".to_string(),
            color: random_color(),
            store: None,
            subscriptions: None,
            outbox: Outbox::default(),
            spawned: false,
            remotes: HashMap::new(),
            chat: VecDeque::new(),
            voice,
            ping_ms: 0,
            ping_sent: None,
            now: Duration::ZERO,
            tick: Interval::new(NETWORK_TICK, true),
            sweep: Interval::new(GHOST_SWEEP_INTERVAL, false),
            probe: Interval::new(PING_INTERVAL, false),
        }
    }

    /// Connect to the shared store. On failure networking stays off and the local
    /// simulation carries on alone.
    pub fn init(&mut self, store: Option<Arc<dyn SharedStore>>) {
        let Some(store) = store else {
            log::warn!("no shared store configured; playing offline");
            return;
        };
        match Self::connect(store.as_ref()) {
            Ok(subscriptions) => {
                self.subscriptions = Some(subscriptions);
                self.store = Some(store);
                log::info!("connected to shared store as {}", self.id);
                self.generate_world_if_empty();
            }
            Err(e) => log::warn!("shared store init failed, playing offline: {e}"),
        }
    }

    fn connect(store: &dyn SharedStore) -> Result<Subscriptions, StoreError> {
        Ok(Subscriptions {
            players: store.subscribe(Collection::Players)?,
            objects: store.subscribe(Collection::Objects)?,
            chat: store.subscribe(Collection::Chat)?,
            ping: store.subscribe(Collection::Ping)?,
        })
    }

    /// Populate the world once. Two clients joining at the same moment can both
    /// see an empty collection and both generate.
    fn generate_world_if_empty(&mut self) {
        let Some(store) = &self.store else {
            return;
        };
        match store.any(Collection::Objects) {
            Ok(false) => self.generate_world(),
            Ok(true) => {}
            Err(e) => log::debug!("object probe failed: {e}"),
        }
    }

    pub fn generate_world(&mut self) {
        log::info!("generating world: {WORLD_BOX_COUNT} boxes");
        for _ in 0..WORLD_BOX_COUNT {
            self.outbox.push(Collection::Objects, &random_box());
        }
        self.flush();
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> u32 {
        self.color
    }

    pub fn is_online(&self) -> bool {
        self.store.is_some()
    }

    pub fn is_spawned(&self) -> bool {
        self.spawned
    }

    pub fn ping(&self) -> u32 {
        self.ping_ms
    }

    pub fn voice(&self) -> &VoiceManager {
        &self.voice
    }

    pub fn remotes(&self) -> impl Iterator<Item = &RemotePlayer> {
        self.remotes.values()
    }

    pub fn remote(&self, id: &str) -> Option<&RemotePlayer> {
        self.remotes.get(id)
    }

    pub fn chat(&self) -> impl Iterator<Item = &ChatMessage> {
        self.chat.iter()
    }

    /// Join as `name` (blank means "Player"), publishing the initial record.
    pub fn spawn(&mut self, name: &str, now: Duration) {
        let name = name.trim();
        self.name = if name.is_empty() {
            "Player".to_string()
        } else {
            name.to_string()
        };
        self.now = now;
        self.voice.init(&self.id);

        let [x, y, z] = PLAYER_SPAWN;
        let record = PlayerRecord {
            name: self.name.clone(),
            x,
            y,
            z,
            color: self.color,
            timestamp: millis(now),
            ..Default::default()
        };
        self.outbox.set(self.player_path(), &record);
        self.flush();
        self.spawned = true;
        log::info!("spawned as {} ({})", self.name, self.id);
    }

    /// Leave: remove our record (best effort) and forget everybody else.
    pub fn disconnect(&mut self) {
        if !self.spawned {
            return;
        }
        self.outbox.remove(self.player_path());
        self.flush();
        for id in self.remotes.keys() {
            self.voice.disconnect(id);
        }
        self.remotes.clear();
        self.voice.toggle_mic(false);
        self.spawned = false;
        log::info!("disconnected {}", self.id);
    }

    pub fn send_chat(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() || !self.spawned {
            return;
        }
        let record = ChatRecord {
            name: self.name.clone(),
            text: text.to_string(),
            color: self.color,
            timestamp: millis(self.now),
        };
        self.outbox.push(Collection::Chat, &record);
    }

    /// Local player first, then everybody else by name.
    pub fn player_list(&self) -> Vec<PlayerListEntry> {
        let mut others: Vec<PlayerListEntry> = self
            .remotes
            .values()
            .map(|r| PlayerListEntry {
                name: r.name().to_string(),
                ping: r.ping(),
                local: false,
            })
            .collect();
        others.sort_by(|a, b| a.name.cmp(&b.name));

        let mut list = vec![PlayerListEntry {
            name: self.name.clone(),
            ping: self.ping_ms,
            local: true,
        }];
        list.extend(others);
        list
    }

    fn player_path(&self) -> StorePath {
        StorePath::new(Collection::Players, self.id.clone())
    }

    fn flush(&mut self) {
        match &self.store {
            Some(store) => {
                self.outbox.flush(store.as_ref());
            }
            None => self.outbox.clear(),
        }
    }

    /// Per-frame work: send queued writes, apply inbound events, publish on the
    /// tick, sweep ghosts, probe ping and advance every interpolated entity.
    ///
    /// `now` is wall-clock time since the Unix epoch.
    pub fn update(
        &mut self,
        dt: f32,
        now: Duration,
        local: &LocalPlayerState,
        input: &InputFrame,
        world: &mut GameWorld,
    ) {
        self.now = now;
        self.flush();
        self.drain_events(world);

        if self.spawned {
            self.voice.toggle_mic(input.is_action(Action::Voice));

            if self.tick.ready(now) {
                self.publish(local, world);
            }
            if self.sweep.ready(now) {
                self.sweep_ghosts();
            }
            if self.probe.ready(now) {
                self.send_ping_probe();
            }
        }

        let me = self.id.clone();
        world.for_each_synced(|object, physics| {
            if object.is_simulated_by(&me) {
                object.sync_from_body(physics);
            } else {
                object.follow_snapshot(physics, dt);
            }
        });

        if self.spawned {
            for remote in self.remotes.values_mut() {
                remote.update(dt);
            }
        }

        self.flush();
    }

    fn publish(&mut self, local: &LocalPlayerState, world: &GameWorld) {
        let record = PlayerRecord {
            name: self.name.clone(),
            x: local.position.x,
            y: local.position.y,
            z: local.position.z,
            ry: local.yaw,
            crouch: local.crouch,
            speed: local.speed,
            is_dead: local.dead,
            color: self.color,
            timestamp: millis(self.now),
            ping: self.ping_ms,
            jump: local.airborne,
            holding_gun: local.gun.holding,
            firing: local.gun.firing,
            ray_dist: local.gun.distance,
            is_talking: self.voice.is_speaking(),
        };
        self.outbox.set(self.player_path(), &record);

        for object in world.synced_objects() {
            if !object.is_simulated_by(&self.id) {
                continue;
            }
            if let Some(transform) = object.transform(&world.physics) {
                self.outbox.update(
                    StorePath::new(Collection::Objects, object.key().to_string()),
                    &transform,
                );
            }
        }
    }

    fn sweep_ghosts(&mut self) {
        let now = self.now;
        let stale: Vec<String> = self
            .remotes
            .values()
            .filter(|r| r.is_stale(now, GHOST_TIMEOUT))
            .map(|r| r.id().to_string())
            .collect();
        for id in stale {
            log::debug!("removing ghost {id}");
            self.remove_remote(&id);
            self.outbox
                .remove(StorePath::new(Collection::Players, id));
        }
    }

    fn send_ping_probe(&mut self) {
        if !self.is_online() {
            return;
        }
        let sent = millis(self.now);
        self.ping_sent = Some(sent);
        self.outbox
            .set(StorePath::new(Collection::Ping, self.id.clone()), &sent);
    }

    fn remove_remote(&mut self, id: &str) {
        if self.remotes.remove(id).is_some() {
            self.voice.disconnect(id);
        }
    }

    fn drain_events(&mut self, world: &mut GameWorld) {
        let (Some(store), Some(subs)) = (&self.store, self.subscriptions) else {
            return;
        };
        let mut events = Vec::new();
        for sub in [subs.objects, subs.players, subs.chat, subs.ping] {
            match store.drain(sub) {
                Ok(batch) => events.extend(batch),
                Err(e) => log::debug!("drain failed: {e}"),
            }
        }
        for event in events {
            match event.collection {
                Collection::Players => self.on_player_event(&event),
                Collection::Objects => self.on_object_event(&event, world),
                Collection::Chat => self.on_chat_event(&event),
                Collection::Ping => self.on_ping_event(&event),
            }
        }
    }

    fn on_player_event(&mut self, event: &StoreEvent) {
        if event.key == self.id {
            return;
        }
        if event.kind == EventKind::Removed {
            self.remove_remote(&event.key);
            return;
        }
        let record: PlayerRecord = match event.decode() {
            Ok(record) => record,
            Err(e) => {
                log::debug!("{e}");
                return;
            }
        };
        match event.kind {
            EventKind::Added => self.add_remote(&event.key, &record),
            EventKind::Changed => {
                if let Some(remote) = self.remotes.get_mut(&event.key) {
                    remote.update_data(&record, self.now);
                }
            }
            EventKind::Removed => {}
        }
    }

    fn add_remote(&mut self, id: &str, record: &PlayerRecord) {
        let age = millis(self.now).saturating_sub(record.timestamp);
        if record.timestamp != 0 && age > millis(STALE_RECORD_AGE) {
            log::debug!("deleting stale player record {id} ({age} ms old)");
            self.outbox
                .remove(StorePath::new(Collection::Players, id.to_string()));
            return;
        }
        log::info!("player joined: {} ({id})", record.name);
        self.remotes
            .insert(id.to_string(), RemotePlayer::new(id, record, self.now));
        self.voice.connect_to(id);
    }

    fn on_object_event(&mut self, event: &StoreEvent, world: &mut GameWorld) {
        if event.kind == EventKind::Removed {
            world.despawn_synced(&event.key);
            return;
        }
        let record: ObjectRecord = match event.decode() {
            Ok(record) => record,
            Err(e) => {
                log::debug!("{e}");
                return;
            }
        };
        if !world.spawn_synced(&event.key, &record) {
            if let Some((object, physics)) = world.synced_mut(&event.key) {
                object.apply_record(physics, &record);
            }
        }
    }

    fn on_chat_event(&mut self, event: &StoreEvent) {
        if event.kind != EventKind::Added {
            return;
        }
        let Ok(record) = event.decode::<ChatRecord>() else {
            return;
        };
        if record.text.is_empty() {
            return;
        }
        self.chat.push_back(ChatMessage {
            name: record.name,
            text: record.text,
            color: record.color,
            timestamp: record.timestamp,
        });
        while self.chat.len() > MAX_CHAT_MESSAGES {
            self.chat.pop_front();
        }
    }

    fn on_ping_event(&mut self, event: &StoreEvent) {
        if event.key != self.id || event.kind == EventKind::Removed {
            return;
        }
        let Some(sent) = self.ping_sent else {
            return;
        };
        if event.value.as_u64() == Some(sent) {
            self.ping_ms = millis(self.now).saturating_sub(sent).min(u32::MAX as u64) as u32;
            self.ping_sent = None;
        }
    }
}

impl ObjectAuthority for NetworkManager {
    fn claim(&mut self, world: &mut GameWorld, key: &str) {
        let Some((object, _)) = world.synced_mut(key) else {
            return;
        };
        if object.is_frozen() {
            return;
        }
        object.set_owner(Some(self.id.clone()));
        self.outbox.update(
            StorePath::new(Collection::Objects, key.to_string()),
            &OwnershipUpdate {
                owner: Some(self.id.clone()),
                frozen: None,
            },
        );
        log::debug!("claimed {key}");
    }

    fn freeze(&mut self, world: &mut GameWorld, key: &str) -> bool {
        let Some((object, physics)) = world.synced_mut(key) else {
            return false;
        };
        if object.is_claimed_by_other(&self.id) {
            log::debug!("freeze of {key} refused: owned by {:?}", object.owner());
            return false;
        }
        object.set_frozen(physics, true);
        object.set_owner(None);
        self.outbox.update(
            StorePath::new(Collection::Objects, key.to_string()),
            &OwnershipUpdate {
                owner: None,
                frozen: Some(true),
            },
        );
        true
    }

    fn unfreeze(&mut self, world: &mut GameWorld, key: &str) {
        let Some((object, physics)) = world.synced_mut(key) else {
            return;
        };
        object.set_frozen(physics, false);
        object.set_owner(Some(self.id.clone()));
        self.outbox.update(
            StorePath::new(Collection::Objects, key.to_string()),
            &OwnershipUpdate {
                owner: Some(self.id.clone()),
                frozen: Some(false),
            },
        );
    }

    fn may_drive(&self, world: &GameWorld, key: &str) -> bool {
        world
            .synced(key)
            .is_some_and(|object| object.is_simulated_by(&self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::store::MemoryStore;
    use crate::physics::BodyKind;

    const T0: Duration = Duration::from_secs(1_700_000_000);

    struct Client {
        net: NetworkManager,
        world: GameWorld,
    }

    impl Client {
        fn join(id: &str, store: &MemoryStore, now: Duration) -> Self {
            let mut net = NetworkManager::with_id(id, VoiceManager::default());
            net.init(Some(Arc::new(store.clone())));
            net.spawn(id, now);
            let mut client = Self {
                net,
                world: GameWorld::new(),
            };
            client.frame(now);
            client
        }

        fn frame(&mut self, now: Duration) {
            self.net.update(
                1.0 / 60.0,
                now,
                &LocalPlayerState::default(),
                &InputFrame::default(),
                &mut self.world,
            );
        }

        fn some_object(&self) -> String {
            let mut keys: Vec<String> = self
                .world
                .synced_objects()
                .map(|o| o.key().to_string())
                .collect();
            keys.sort();
            keys[0].clone()
        }
    }

    fn store_object(store: &MemoryStore, key: &str) -> ObjectRecord {
        let value = store
            .get(&StorePath::new(Collection::Objects, key))
            .unwrap();
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn first_client_generates_world_once() {
        let store = MemoryStore::new();
        let a = Client::join("user_a", &store, T0);
        assert_eq!(store.len(Collection::Objects), WORLD_BOX_COUNT);
        assert_eq!(a.world.synced_count(), WORLD_BOX_COUNT);

        let b = Client::join("user_b", &store, T0);
        assert_eq!(store.len(Collection::Objects), WORLD_BOX_COUNT);
        assert_eq!(b.world.synced_count(), WORLD_BOX_COUNT);
    }

    #[test]
    fn generated_boxes_fall_within_bounds() {
        for _ in 0..200 {
            let b = random_box();
            assert!(b.x.abs() <= WORLD_BOX_SPREAD && b.z.abs() <= WORLD_BOX_SPREAD);
            assert!((1.0..6.0).contains(&b.sy));
            assert!((b.y - (b.sy / 2.0 + WORLD_BOX_DROP_HEIGHT)).abs() < 1e-5);
            assert!(b.tex < WORLD_BOX_TEXTURES);
            assert!(b.owner.is_none() && !b.frozen);
        }
    }

    #[test]
    fn identities_have_the_expected_shape() {
        let id = generate_player_id();
        assert!(id.starts_with("user_"));
        assert_eq!(id.len(), 5 + ID_LENGTH);
        assert!(random_color() <= 0xFF_FFFF);
    }

    #[test]
    fn players_see_each_other() {
        let store = MemoryStore::new();
        let mut a = Client::join("user_a", &store, T0);
        let mut b = Client::join("user_b", &store, T0);
        a.frame(T0 + Duration::from_millis(16));
        b.frame(T0 + Duration::from_millis(16));
        assert!(a.net.remote("user_b").is_some());
        assert!(b.net.remote("user_a").is_some());
        assert!(a.net.remote("user_a").is_none());

        let list = a.net.player_list();
        assert_eq!(list.len(), 2);
        assert!(list[0].local);
        assert_eq!(list[1].name, "user_b");
    }

    #[test]
    fn claim_then_rival_freeze_is_refused() {
        let store = MemoryStore::new();
        let mut a = Client::join("user_a", &store, T0);
        let mut b = Client::join("user_b", &store, T0);
        let key = a.some_object();

        a.net.claim(&mut a.world, &key);
        assert!(a.net.may_drive(&a.world, &key));
        a.frame(T0 + Duration::from_millis(20));
        assert_eq!(store_object(&store, &key).owner.as_deref(), Some("user_a"));

        b.frame(T0 + Duration::from_millis(20));
        assert_eq!(b.world.synced(&key).unwrap().owner(), Some("user_a"));
        assert!(!b.net.freeze(&mut b.world, &key));
        let body = b.world.synced(&key).unwrap().body();
        assert_eq!(b.world.physics.kind(body), Some(BodyKind::Dynamic));
        assert!(!b.net.may_drive(&b.world, &key));
    }

    #[test]
    fn freeze_propagates_and_unfreeze_takes_ownership() {
        let store = MemoryStore::new();
        let mut a = Client::join("user_a", &store, T0);
        let mut b = Client::join("user_b", &store, T0);
        let key = a.some_object();

        assert!(a.net.freeze(&mut a.world, &key));
        a.frame(T0 + Duration::from_millis(20));
        let record = store_object(&store, &key);
        assert!(record.frozen);
        assert!(record.owner.is_none());

        b.frame(T0 + Duration::from_millis(20));
        let body = b.world.synced(&key).unwrap().body();
        assert_eq!(b.world.physics.kind(body), Some(BodyKind::Static));
        assert_eq!(b.world.physics.mass(body), 0.0);

        // claims are ignored while frozen
        b.net.claim(&mut b.world, &key);
        assert_eq!(b.world.synced(&key).unwrap().owner(), None);

        b.net.unfreeze(&mut b.world, &key);
        b.frame(T0 + Duration::from_millis(40));
        let record = store_object(&store, &key);
        assert!(!record.frozen);
        assert_eq!(record.owner.as_deref(), Some("user_b"));

        a.frame(T0 + Duration::from_millis(40));
        let body = a.world.synced(&key).unwrap().body();
        assert_eq!(a.world.physics.kind(body), Some(BodyKind::Dynamic));
    }

    #[test]
    fn owner_publishes_transform_and_others_follow() {
        let store = MemoryStore::new();
        let mut a = Client::join("user_a", &store, T0);
        let mut b = Client::join("user_b", &store, T0);
        let key = a.some_object();

        a.net.claim(&mut a.world, &key);
        let body = a.world.synced(&key).unwrap().body();
        a.world.physics.set_pose(
            body,
            Vec3::new(3.0, 7.0, -4.0),
            crate::collision::Quat::identity(),
        );
        a.frame(T0 + Duration::from_millis(100));
        let record = store_object(&store, &key);
        assert!((record.x - 3.0).abs() < 1e-4);

        for i in 0..180 {
            b.frame(T0 + Duration::from_millis(100 + i * 16));
        }
        let follower = b.world.synced(&key).unwrap();
        assert!((follower.position() - Vec3::new(3.0, 7.0, -4.0)).norm() < 1e-2);
        let (linvel, _) = b.world.physics.velocity(follower.body()).unwrap();
        assert_eq!(linvel, Vec3::zeros());
    }

    #[test]
    fn silent_players_are_swept() {
        let store = MemoryStore::new();
        let mut a = Client::join("user_a", &store, T0);
        let _b = Client::join("user_b", &store, T0);
        a.frame(T0 + Duration::from_millis(16));
        assert!(a.net.remote("user_b").is_some());

        // b stops updating; a keeps ticking
        for s in 1..=16 {
            a.frame(T0 + Duration::from_secs(s));
        }
        assert!(a.net.remote("user_b").is_none());
        assert!(store.get(&StorePath::new(Collection::Players, "user_b")).is_none());
    }

    #[test]
    fn stale_records_are_deleted_on_sight() {
        let store = MemoryStore::new();
        store
            .set(
                &StorePath::new(Collection::Players, "user_old"),
                serde_json::to_value(PlayerRecord {
                    name: "old".into(),
                    timestamp: millis(T0 - Duration::from_secs(60)),
                    ..Default::default()
                })
                .unwrap(),
            )
            .unwrap();
        let mut a = Client::join("user_a", &store, T0);
        a.frame(T0 + Duration::from_millis(16));
        assert!(a.net.remote("user_old").is_none());
        assert!(store.get(&StorePath::new(Collection::Players, "user_old")).is_none());
    }

    #[test]
    fn disconnect_removes_our_record() {
        let store = MemoryStore::new();
        let mut a = Client::join("user_a", &store, T0);
        let mut b = Client::join("user_b", &store, T0);
        a.net.disconnect();
        assert!(store.get(&StorePath::new(Collection::Players, "user_a")).is_none());
        b.frame(T0 + Duration::from_millis(16));
        assert!(b.net.remote("user_a").is_none());
    }

    #[test]
    fn chat_feed_keeps_the_latest_messages() {
        let store = MemoryStore::new();
        let mut a = Client::join("user_a", &store, T0);
        a.net.send_chat("   ");
        for i in 0..25 {
            a.net.send_chat(&format!("msg {i}"));
        }
        a.frame(T0 + Duration::from_millis(16));
        let feed: Vec<&ChatMessage> = a.net.chat().collect();
        assert_eq!(feed.len(), MAX_CHAT_MESSAGES);
        assert_eq!(feed[0].text, "msg 5");
        assert_eq!(feed.last().unwrap().text, "msg 24");
        assert_eq!(feed[0].name, "user_a");
    }

    #[test]
    fn ping_is_measured_by_round_trip() {
        let store = MemoryStore::new();
        let mut a = Client::join("user_a", &store, T0);
        a.frame(T0 + PING_INTERVAL);
        a.frame(T0 + PING_INTERVAL + Duration::from_millis(30));
        assert_eq!(a.net.ping(), 30);
    }

    #[test]
    fn offline_manager_still_applies_local_effects() {
        let mut net = NetworkManager::with_id("user_solo", VoiceManager::default());
        net.init(None);
        assert!(!net.is_online());

        let mut world = GameWorld::new();
        world.spawn_synced("box", &ObjectRecord::default());
        net.claim(&mut world, "box");
        assert!(net.may_drive(&world, "box"));
        assert!(net.freeze(&mut world, "box"));
        assert!(world.synced("box").unwrap().is_frozen());
    }

    #[test]
    fn failing_store_falls_back_to_offline() {
        struct Down;
        impl SharedStore for Down {
            fn set(&self, _: &StorePath, _: serde_json::Value) -> Result<(), StoreError> {
                Err(StoreError::Unavailable("down".into()))
            }
            fn update(
                &self,
                _: &StorePath,
                _: serde_json::Map<String, serde_json::Value>,
            ) -> Result<(), StoreError> {
                Err(StoreError::Unavailable("down".into()))
            }
            fn remove(&self, _: &StorePath) -> Result<(), StoreError> {
                Err(StoreError::Unavailable("down".into()))
            }
            fn push(&self, _: Collection, _: serde_json::Value) -> Result<String, StoreError> {
                Err(StoreError::Unavailable("down".into()))
            }
            fn any(&self, _: Collection) -> Result<bool, StoreError> {
                Err(StoreError::Unavailable("down".into()))
            }
            fn subscribe(&self, _: Collection) -> Result<SubscriptionId, StoreError> {
                Err(StoreError::Unavailable("down".into()))
            }
            fn drain(&self, _: SubscriptionId) -> Result<Vec<StoreEvent>, StoreError> {
                Err(StoreError::Unavailable("down".into()))
            }
        }

        let mut net = NetworkManager::with_id("user_a", VoiceManager::default());
        net.init(Some(Arc::new(Down)));
        assert!(!net.is_online());
        net.spawn("ann", T0);
        let mut world = GameWorld::new();
        net.update(
            1.0 / 60.0,
            T0,
            &LocalPlayerState::default(),
            &InputFrame::default(),
            &mut world,
        );
        assert!(net.is_spawned());
    }
}
