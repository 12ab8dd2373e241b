//! Display/FromStr for the small wire enums (sites, roles, operation kinds)
//!
//! ```rust
//! use stellar_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Channel {
//!     Popup,
//!     ContentScript,
//! }
//!
//! impl_domain_status_conversions!(Channel {
//!     Popup => "popup",
//!     ContentScript => "content_script",
//! });
//!
//! assert_eq!(Channel::Popup.to_string(), "popup");
//! assert_eq!("CONTENT_SCRIPT".parse::<Channel>(), Ok(Channel::ContentScript));
//! ```

/// Implements Display and case-insensitive FromStr for a fieldless enum.
///
/// `$str` literals must be lowercase; parsing lowercases its input first.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
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
    enum Delivery {
        Immediate,
        Deferred,
    }

    impl_domain_status_conversions!(Delivery {
        Immediate => "immediate",
        Deferred => "deferred",
    });

    #[test]
    fn displays_mapped_string() {
        assert_eq!(Delivery::Immediate.to_string(), "immediate");
        assert_eq!(format!("{}", Delivery::Deferred), "deferred");
    }

    #[test]
    fn parses_ignoring_case() {
        assert_eq!(Delivery::from_str("Deferred").unwrap(), Delivery::Deferred);
        assert_eq!(Delivery::from_str("IMMEDIATE").unwrap(), Delivery::Immediate);
    }

    #[test]
    fn unknown_value_names_the_enum() {
        let err = Delivery::from_str("later").unwrap_err();
        assert_eq!(err, "Invalid Delivery: later");
        assert!(Delivery::from_str("").is_err());
    }
}
