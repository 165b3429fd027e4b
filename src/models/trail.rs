use serde::{Deserialize, Serialize};

/// A hiking trail near the requested coordinates
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Trail {
    pub name: String,
    pub location: String,
    /// Length in miles
    pub length: f64,
    pub stars: f64,
    pub star_votes: u32,
    pub summary: String,
    pub trail_url: String,
    /// Condition status as reported by the provider
    pub conditions: String,
    pub condition_date: String,
    pub condition_time: String,
}
