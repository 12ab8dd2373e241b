//! Server reachability as last observed by the health monitor

use serde::{Deserialize, Serialize};

/// Last known reachability of the memory server
///
/// Persisted as an optional `connected` flag where `None` means no probe has
/// completed yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityState {
    #[default]
    Unknown,
    Down,
    Up,
}

impl ConnectivityState {
    pub fn from_flag(connected: Option<bool>) -> Self {
        match connected {
            None => Self::Unknown,
            Some(false) => Self::Down,
            Some(true) => Self::Up,
        }
    }

    pub fn from_probe(connected: bool) -> Self {
        Self::from_flag(Some(connected))
    }

    pub fn as_flag(self) -> Option<bool> {
        match self {
            Self::Unknown => None,
            Self::Down => Some(false),
            Self::Up => Some(true),
        }
    }

    /// `Unknown` counts as not connected
    pub fn is_connected(self) -> bool {
        self == Self::Up
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_mapping() {
        assert_eq!(ConnectivityState::from_flag(None), ConnectivityState::Unknown);
        assert_eq!(ConnectivityState::from_flag(Some(false)), ConnectivityState::Down);
        assert_eq!(ConnectivityState::from_probe(true).as_flag(), Some(true));
        assert_eq!(ConnectivityState::default().as_flag(), None);
    }

    #[test]
    fn only_up_is_connected() {
        assert!(ConnectivityState::Up.is_connected());
        assert!(!ConnectivityState::Down.is_connected());
        assert!(!ConnectivityState::Unknown.is_connected());
    }
}
