//! Macro for implementing Display, FromStr and `as_str` for closed string
//! enums stored in the database (trigger types, schedule sources).
//!
//! # Example
//!
//! ```rust
//! use pbxpresence_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Channel {
//!     Email,
//!     Phone,
//! }
//!
//! impl_domain_status_conversions!(Channel {
//!     Email => "email",
//!     Phone => "phone",
//! });
//!
//! assert_eq!(Channel::Phone.as_str(), "phone");
//! assert_eq!("EMAIL".parse::<Channel>().unwrap(), Channel::Email);
//! ```

/// Implements `as_str`, Display and FromStr for fieldless enums.
///
/// Parsing is case-insensitive; output is always the canonical lowercase
/// string.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Canonical storage representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
