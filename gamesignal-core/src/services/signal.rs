// File: src/services/signal.rs
//
// Gaming-intent detection and the broadcast line devices listen for.

/// Phrases that mean "someone wants to play". Shared by human and device
/// messages; matched case-insensitively as substrings.
pub const PLAY_PHRASES: &[&str] = &[
    "want to game",
    "wants to game",
    "gaming time",
    "let's play",
    "🎮",
];

/// Phrases devices send when their switch is turned off.
pub const RESET_PHRASES: &[&str] = &["gaming off", "reset gaming", "stop gaming"];

const SIGNAL_PREFIX: &str = "SIGNAL:";
const SIGNAL_SUFFIX: &str = ":GAME_ON";

fn contains_any(text: &str, phrases: &[&str]) -> bool {
    let lower = text.to_lowercase();
    phrases.iter().any(|p| lower.contains(p))
}

pub fn is_play_intent(text: &str) -> bool {
    contains_any(text, PLAY_PHRASES)
}

pub fn is_reset_intent(text: &str) -> bool {
    contains_any(text, RESET_PHRASES)
}

/// Who a signal came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalOrigin {
    /// A chat user, by display name.
    Human(String),
    /// A registered device, by device name (or `Unknown`).
    Device(String),
}

impl SignalOrigin {
    pub fn label(&self) -> &str {
        match self {
            SignalOrigin::Human(name) | SignalOrigin::Device(name) => name,
        }
    }
}

/// The two lines posted for every signal, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Broadcast {
    pub announcement: String,
    pub payload: String,
}

impl Broadcast {
    pub fn lines(&self) -> [&str; 2] {
        [&self.announcement, &self.payload]
    }
}

/// Build the announcement and the machine-readable `SIGNAL:<label>:GAME_ON`
/// line. Device announcements carry an `(ESP32)` tag after the bold name; the
/// payload never does, so listeners can match on the bare device name.
pub fn build_signal(origin: &SignalOrigin) -> Broadcast {
    let label = origin.label();
    let announcement = match origin {
        SignalOrigin::Human(_) => format!("🎮 **{label}** wants to play!"),
        SignalOrigin::Device(_) => format!("🎮 **{label}** (ESP32) wants to play!"),
    };
    Broadcast {
        announcement,
        payload: format!("{SIGNAL_PREFIX}{label}{SIGNAL_SUFFIX}"),
    }
}

/// A parsed broadcast line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastSignal {
    pub origin_label: String,
}

/// Listener side of [`build_signal`]: `SIGNAL:<label>:GAME_ON` -> label.
pub fn parse_broadcast(line: &str) -> Option<BroadcastSignal> {
    let label = line
        .trim_end()
        .strip_prefix(SIGNAL_PREFIX)?
        .strip_suffix(SIGNAL_SUFFIX)?;
    if label.is_empty() || label.contains(':') {
        return None;
    }
    Some(BroadcastSignal {
        origin_label: label.to_string(),
    })
}
