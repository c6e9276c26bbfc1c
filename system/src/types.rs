pub type ConnectionId = u32;

/// Milliseconds, as they appear on the wire.
pub type Millis = u64;

/// Shown to viewers in place of the drawer's identity.
pub const DRAWER_PLACEHOLDER: &str = "someone";

pub const DEFAULT_COLOR: &str = "#000";

pub const TURN_ENDED_NOTICE: &str = "Current drawer left, next person can draw!";
