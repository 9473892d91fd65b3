//! Conversation scopes
//!
//! Scopes are kept as a tagged enum inside the engine and only flattened to the
//! single integer namespace at the storage boundary:
//!
//! | Scope             | storage id |
//! |-------------------|------------|
//! | `Global`          | `0`        |
//! | `Group(id)`       | `id`       |
//! | `Individual(id)`  | `-id`      |

use std::fmt;
use std::str::FromStr;

use scopegate_common::{GLOBAL_SCOPE_ID, ScopegateError};
use serde::{Deserialize, Serialize};

use crate::context::Event;

/// The boundary a service's enablement is tracked for.
///
/// Ids are expected to be positive. [`Scope::group`] and [`Scope::individual`]
/// check this, building a variant directly does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum Scope {
    /// Override row applying to every scope of a service
    Global,
    /// A chat group, by group id
    Group(i64),
    /// A private conversation, by user id
    Individual(i64),
}

impl Scope {
    /// Group scope; ids must be positive
    pub fn group(group_id: i64) -> Result<Self, ScopegateError> {
        if group_id <= 0 {
            return Err(ScopegateError::InvalidScope(format!(
                "group id must be positive, got {}",
                group_id
            )));
        }
        Ok(Scope::Group(group_id))
    }

    /// Individual scope; ids must be positive
    pub fn individual(user_id: i64) -> Result<Self, ScopegateError> {
        if user_id <= 0 {
            return Err(ScopegateError::InvalidScope(format!(
                "user id must be positive, got {}",
                user_id
            )));
        }
        Ok(Scope::Individual(user_id))
    }

    /// The scope an inbound event acts in: its group when it has one, otherwise
    /// the sending user. Events carrying neither have no scope.
    pub fn for_event(event: &Event) -> Option<Self> {
        if event.group_id > 0 {
            Some(Scope::Group(event.group_id))
        } else if event.group_id == 0 && event.user_id > 0 {
            Some(Scope::Individual(event.user_id))
        } else {
            None
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Scope::Global)
    }

    /// Row key of the scope: `0` for global, the group id, or the negated
    /// user id. Negation wraps, so `Individual(i64::MIN)` maps to itself and
    /// still round-trips through [`Scope::from_storage_id`].
    pub fn storage_id(&self) -> i64 {
        match self {
            Scope::Global => GLOBAL_SCOPE_ID,
            Scope::Group(id) => *id,
            Scope::Individual(id) => id.wrapping_neg(),
        }
    }

    pub fn from_storage_id(id: i64) -> Self {
        match id {
            GLOBAL_SCOPE_ID => Scope::Global,
            id if id > 0 => Scope::Group(id),
            id => Scope::Individual(id.wrapping_neg()),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => write!(f, "global"),
            Scope::Group(id) => write!(f, "group:{}", id),
            Scope::Individual(id) => write!(f, "user:{}", id),
        }
    }
}

impl FromStr for Scope {
    type Err = ScopegateError;

    /// Parses `global`, `group:<id>` or `user:<id>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("global") || s.eq_ignore_ascii_case("all") {
            return Ok(Scope::Global);
        }
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| ScopegateError::InvalidScope(format!("unrecognized scope '{}'", s)))?;
        let id: i64 = id
            .trim()
            .parse()
            .map_err(|_| ScopegateError::InvalidScope(format!("invalid id in '{}'", s)))?;
        match kind.trim().to_ascii_lowercase().as_str() {
            "group" => Scope::group(id),
            "user" | "individual" => Scope::individual(id),
            _ => Err(ScopegateError::InvalidScope(format!(
                "unknown scope kind '{}'",
                kind
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_id_mapping() {
        assert_eq!(Scope::Global.storage_id(), 0);
        assert_eq!(Scope::Group(555).storage_id(), 555);
        assert_eq!(Scope::Individual(42).storage_id(), -42);

        assert_eq!(Scope::from_storage_id(0), Scope::Global);
        assert_eq!(Scope::from_storage_id(555), Scope::Group(555));
        assert_eq!(Scope::from_storage_id(-42), Scope::Individual(42));
    }

    #[test]
    fn test_storage_id_extremes_round_trip() {
        for scope in [
            Scope::Individual(i64::MIN),
            Scope::Individual(i64::MAX),
            Scope::Group(i64::MAX),
        ] {
            assert_eq!(Scope::from_storage_id(scope.storage_id()), scope);
        }
        assert_eq!(Scope::Individual(i64::MIN).storage_id(), i64::MIN);
        assert_eq!(Scope::from_storage_id(-i64::MAX), Scope::Individual(i64::MAX));
    }

    #[test]
    fn test_group_and_individual_do_not_collide() {
        assert_ne!(
            Scope::Group(42).storage_id(),
            Scope::Individual(42).storage_id()
        );
    }

    #[test]
    fn test_for_event() {
        let event = Event::group(555, 42);
        assert_eq!(Scope::for_event(&event), Some(Scope::Group(555)));

        let event = Event::private(42);
        assert_eq!(Scope::for_event(&event), Some(Scope::Individual(42)));

        let event = Event::private(0);
        assert_eq!(Scope::for_event(&event), None);
    }

    #[test]
    fn test_constructors_reject_non_positive_ids() {
        assert!(Scope::group(0).is_err());
        assert!(Scope::group(-3).is_err());
        assert!(Scope::individual(0).is_err());
        assert_eq!(Scope::individual(9).unwrap(), Scope::Individual(9));
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("global".parse::<Scope>().unwrap(), Scope::Global);
        assert_eq!("ALL".parse::<Scope>().unwrap(), Scope::Global);
        assert_eq!("group:555".parse::<Scope>().unwrap(), Scope::Group(555));
        assert_eq!("user:42".parse::<Scope>().unwrap(), Scope::Individual(42));

        assert!("group:-1".parse::<Scope>().is_err());
        assert!("room:1".parse::<Scope>().is_err());
        assert!("555".parse::<Scope>().is_err());

        assert_eq!(Scope::Group(555).to_string(), "group:555");
        assert_eq!(Scope::Individual(42).to_string(), "user:42");
        assert_eq!(Scope::Global.to_string(), "global");
    }
}
