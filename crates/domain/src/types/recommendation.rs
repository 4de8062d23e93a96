//! Next-set recommendation payload

use serde::{Deserialize, Serialize};

/// Target values proposed for the next set after a rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRecommendation {
    pub weight: f64,
    pub reps: u32,
    pub rest_time: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SetRecommendation {
    pub fn new(weight: f64, reps: u32, rest_time: u32) -> Self {
        Self { weight, reps, rest_time, message: None }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
