//! Push-to-talk voice, keyed by player identity.
//!
//! Audio capture, transport and playback belong to a [`PeerAudio`] collaborator.
//! This module only decides who to call, when the microphone is live and
//! whether the local player counts as speaking.

use crate::constants::SPEAKING_THRESHOLD;
use crate::error::VoiceError;
use std::collections::HashSet;

pub trait PeerAudio: Send + Sync {
    /// Register with the peer broker under `id`.
    fn open(&mut self, id: &str) -> Result<(), VoiceError>;

    /// Ask for microphone access.
    fn request_microphone(&mut self) -> Result<(), VoiceError>;

    /// Start an audio call to `peer`. Sends our stream if we have one.
    fn call(&mut self, peer: &str) -> Result<(), VoiceError>;

    /// Gate the outbound track.
    fn set_mic_enabled(&mut self, enabled: bool);

    /// Mean spectrum magnitude of the local input on a 0..255 scale.
    fn input_level(&self) -> f32;
}

/// Collaborator for hosts without audio: opens fine, never has a microphone.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullAudio;

impl PeerAudio for NullAudio {
    fn open(&mut self, _id: &str) -> Result<(), VoiceError> {
        Ok(())
    }

    fn request_microphone(&mut self) -> Result<(), VoiceError> {
        Err(VoiceError::MicrophoneUnavailable("no audio device".into()))
    }

    fn call(&mut self, _peer: &str) -> Result<(), VoiceError> {
        Ok(())
    }

    fn set_mic_enabled(&mut self, _enabled: bool) {}

    fn input_level(&self) -> f32 {
        0.0
    }
}

pub struct VoiceManager {
    audio: Box<dyn PeerAudio>,
    ready: bool,
    has_microphone: bool,
    mic_enabled: bool,
    connections: HashSet<String>,
}

impl std::fmt::Debug for VoiceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceManager")
            .field("ready", &self.ready)
            .field("has_microphone", &self.has_microphone)
            .field("mic_enabled", &self.mic_enabled)
            .field("connections", &self.connections.len())
            .finish()
    }
}

impl Default for VoiceManager {
    fn default() -> Self {
        Self::new(Box::new(NullAudio))
    }
}

impl VoiceManager {
    pub fn new(audio: Box<dyn PeerAudio>) -> Self {
        Self {
            audio,
            ready: false,
            has_microphone: false,
            mic_enabled: false,
            connections: HashSet::new(),
        }
    }

    /// Acquire the microphone and join the peer broker. Without a microphone
    /// we still join, listen-only.
    pub fn init(&mut self, id: &str) {
        match self.audio.request_microphone() {
            Ok(()) => {
                self.has_microphone = true;
                self.mic_enabled = false;
                self.audio.set_mic_enabled(false);
            }
            Err(e) => log::warn!("voice is listen-only: {e}"),
        }
        match self.audio.open(id) {
            Ok(()) => {
                self.ready = true;
                log::info!("voice ready as {id}");
            }
            Err(e) => log::warn!("voice disabled: {e}"),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn has_microphone(&self) -> bool {
        self.has_microphone
    }

    /// Call `peer` once. Skipped until ready and for peers already connected.
    pub fn connect_to(&mut self, peer: &str) {
        if !self.ready || self.connections.contains(peer) {
            return;
        }
        match self.audio.call(peer) {
            Ok(()) => {
                self.connections.insert(peer.to_string());
            }
            Err(e) => log::debug!("voice call failed: {e}"),
        }
    }

    pub fn disconnect(&mut self, peer: &str) {
        self.connections.remove(peer);
    }

    pub fn is_connected(&self, peer: &str) -> bool {
        self.connections.contains(peer)
    }

    /// Push-to-talk gate. Only outbound audio is affected.
    pub fn toggle_mic(&mut self, active: bool) {
        if !self.has_microphone {
            return;
        }
        if self.mic_enabled != active {
            self.mic_enabled = active;
            self.audio.set_mic_enabled(active);
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.has_microphone && self.mic_enabled && self.audio.input_level() > SPEAKING_THRESHOLD
    }
}
