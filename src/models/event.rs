use serde::{Deserialize, Serialize};

/// An event near the requested coordinates
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Event {
    pub link: String,
    pub name: String,
    /// `YYYY-MM-DD` in the event's local time
    pub event_date: String,
    pub summary: String,
}
