use thiserror::Error;

/// Failures talking to the shared state store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("shared store unavailable: {0}")]
    Unavailable(String),
    #[error("failed to encode record for {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to decode record at {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown subscription {0}")]
    UnknownSubscription(u64),
}

/// Failures from the peer audio collaborator.
#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("microphone unavailable: {0}")]
    MicrophoneUnavailable(String),
    #[error("peer channel not ready")]
    NotReady,
    #[error("call to {peer} failed: {reason}")]
    CallFailed { peer: String, reason: String },
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}
