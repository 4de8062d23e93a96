//! Macro for implementing Display and FromStr for status enums
//!
//! Session status, post-set flow state, error kinds and save steps all travel
//! as lowercase strings (snapshots, logs, backend rows). This macro keeps the
//! string mapping in one place per enum.
//!
//! # Example
//!
//! ```rust
//! use liftlog_domain::impl_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum RestPhase {
//!     Counting,
//!     Done,
//! }
//!
//! impl_status_conversions!(RestPhase {
//!     Counting => "counting",
//!     Done => "done",
//! });
//!
//! assert_eq!(RestPhase::Done.to_string(), "done");
//! assert_eq!("COUNTING".parse::<RestPhase>(), Ok(RestPhase::Counting));
//! ```

/// Implements Display and FromStr traits for status enums
///
/// - Display writes the mapped string
/// - FromStr parses case-insensitively and names the enum in its error
#[macro_export]
macro_rules! impl_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TimerPhase {
        Idle,
        Counting,
        WrappingUp,
    }

    impl_status_conversions!(TimerPhase {
        Idle => "idle",
        Counting => "counting",
        WrappingUp => "wrapping-up",
    });

    #[test]
    fn test_display_uses_mapped_string() {
        assert_eq!(TimerPhase::Idle.to_string(), "idle");
        assert_eq!(TimerPhase::WrappingUp.to_string(), "wrapping-up");
    }

    #[test]
    fn test_fromstr_is_case_insensitive() {
        assert_eq!(TimerPhase::from_str("COUNTING").unwrap(), TimerPhase::Counting);
        assert_eq!(TimerPhase::from_str("Wrapping-Up").unwrap(), TimerPhase::WrappingUp);
    }

    #[test]
    fn test_fromstr_invalid_names_enum() {
        let err = TimerPhase::from_str("paused").unwrap_err();
        assert!(err.contains("Invalid TimerPhase: paused"));
        assert!(TimerPhase::from_str("").is_err());
    }
}
