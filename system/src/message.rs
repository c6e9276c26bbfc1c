use crate::types::{Millis, DEFAULT_COLOR};
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Peer -> server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    Draw {
        x0: Number,
        y0: Number,
        x1: Number,
        y1: Number,
        #[serde(default)]
        color: Option<String>,
    },
    RequestTurn,
    Clear,
}

impl ClientMessage {
    /// Returns `None` for anything that isn't a well-formed message: invalid
    /// JSON, a missing or unknown `type`, or fields of the wrong shape.
    pub fn parse(text: &str) -> Option<Self> {
        match serde_json::from_str(text) {
            Ok(message) => Some(message),
            Err(err) => {
                log::debug!("Discarding malformed message: {}", err);
                None
            }
        }
    }
}

/// One segment of a stroke, as relayed to viewers.
///
/// Coordinates are kept as the sender wrote them, so `0` is relayed as `0`
/// and not `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub x0: Number,
    pub y0: Number,
    pub x1: Number,
    pub y1: Number,
    pub color: String,
}

impl Stroke {
    pub fn new<N: Into<Number>>(x0: N, y0: N, x1: N, y1: N, color: Option<String>) -> Self {
        let color = color
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_COLOR.to_owned());
        Self {
            x0: x0.into(),
            y0: y0.into(),
            x1: x1.into(),
            y1: y1.into(),
            color,
        }
    }
}

/// Server -> peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    Init {
        can_draw: bool,
        time_left: Millis,
        drawer: Option<String>,
    },
    Draw(Stroke),
    #[serde(rename_all = "camelCase")]
    NewTurn { drawer: String, time_left: Millis },
    YourTurn { duration: Millis },
    #[serde(rename_all = "camelCase")]
    TurnInfo { can_draw: bool, time_left: Millis },
    Clear,
    TurnEnded { message: String },
}

impl ServerMessage {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
