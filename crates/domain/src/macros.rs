//! Macro for backend enum values
//!
//! The backend encodes every choice field (job status, claim status, error
//! type) as a lowercase snake_case string. This macro gives such an enum a
//! single source for its wire names: `as_str`, `Display`, `FromStr` and an
//! `ALL` listing used by the CLI for help text.
//!
//! # Example
//!
//! ```rust
//! use rcm_domain::impl_wire_enum;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Encounter {
//!     Inpatient,
//!     Outpatient,
//! }
//!
//! impl_wire_enum!(Encounter {
//!     Inpatient => "inpatient",
//!     Outpatient => "outpatient",
//! });
//!
//! assert_eq!(Encounter::Inpatient.as_str(), "inpatient");
//! assert_eq!("OUTPATIENT".parse::<Encounter>().unwrap(), Encounter::Outpatient);
//! ```

/// Implements `as_str`, `ALL`, `Display` and `FromStr` for a wire enum
///
/// Parsing is case-insensitive and accepts `-` in place of `_`.
#[macro_export]
macro_rules! impl_wire_enum {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$enum_name] = &[$(Self::$variant),+];

            /// Name used on the wire
            pub const fn as_str(&self) -> &'static str {
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

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                let normalized = s.trim().to_lowercase().replace('-', "_");
                match normalized.as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!(
                        "invalid {}: {:?} (expected one of: {})",
                        stringify!($enum_name),
                        s,
                        [$($str),+].join(", ")
                    )),
                }
            }
        }
    };
}
