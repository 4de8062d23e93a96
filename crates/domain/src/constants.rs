//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Session persistence
pub const DEFAULT_SNAPSHOT_KEY: &str = "workout-session";
pub const SNAPSHOT_VERSION: u32 = 2;

// Session timing
pub const DEFAULT_SAVED_RESET_DELAY_MS: u64 = 1500;
pub const DEFAULT_REST_SECONDS: u32 = 90;
pub const DEFAULT_SET_REPS: u32 = 8;

// Rating bounds (Rate of Perceived Exertion)
pub const RPE_MIN: u8 = 1;
pub const RPE_MAX: u8 = 10;

// Recommendation tuning
pub const WEIGHT_INCREMENT_KG: f64 = 2.5;
pub const HEAVY_REST_BONUS_SECONDS: u32 = 30;
pub const MAX_EFFORT_REST_BONUS_SECONDS: u32 = 60;
pub const MAX_EFFORT_WEIGHT_FACTOR: f64 = 0.95;

// Experience points
pub const XP_PER_COMPLETED_SET: u64 = 10;
pub const XP_VOLUME_DIVISOR_KG: f64 = 100.0;
