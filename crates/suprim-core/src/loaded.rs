//! Population result wrapper for singular relations.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The outcome of populating a singular relation field.
///
/// Replaces sentinel "default model" instances and identity side-tables with
/// an explicit sum type:
///
/// - `Found` — a related row matched the parent's correlation key.
/// - `Fallback` — no row matched, but the relation declares a default; the
///   value is a default-built instance with any declared attribute
///   assignments applied.
/// - `Absent` — no row matched and no default is declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loaded<T> {
    Found(T),
    Fallback(T),
    Absent,
}

impl<T> Loaded<T> {
    /// The contained value, whether found or fallback.
    pub fn get(&self) -> Option<&T> {
        match self {
            Loaded::Found(v) | Loaded::Fallback(v) => Some(v),
            Loaded::Absent => None,
        }
    }

    /// The contained value only when an actual row matched.
    pub fn found(&self) -> Option<&T> {
        match self {
            Loaded::Found(v) => Some(v),
            _ => None,
        }
    }

    pub const fn is_found(&self) -> bool {
        matches!(self, Loaded::Found(_))
    }

    pub const fn is_fallback(&self) -> bool {
        matches!(self, Loaded::Fallback(_))
    }

    pub const fn is_absent(&self) -> bool {
        matches!(self, Loaded::Absent)
    }

    /// Consume the wrapper, yielding the value whether found or fallback.
    pub fn into_inner(self) -> Option<T> {
        match self {
            Loaded::Found(v) | Loaded::Fallback(v) => Some(v),
            Loaded::Absent => None,
        }
    }
}

impl<T> Default for Loaded<T> {
    fn default() -> Self {
        Loaded::Absent
    }
}

impl<T: Serialize> Serialize for Loaded<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Loaded::Found(v) | Loaded::Fallback(v) => v.serialize(serializer),
            Loaded::Absent => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Loaded<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let opt = Option::<T>::deserialize(deserializer)?;
        Ok(match opt {
            Some(v) => Loaded::Found(v),
            None => Loaded::Absent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_distinguish_found_from_fallback() {
        let found = Loaded::Found(1);
        let fallback = Loaded::Fallback(2);
        let absent: Loaded<i32> = Loaded::Absent;

        assert_eq!(found.get(), Some(&1));
        assert_eq!(found.found(), Some(&1));
        assert_eq!(fallback.get(), Some(&2));
        assert_eq!(fallback.found(), None);
        assert_eq!(absent.get(), None);
        assert!(absent.is_absent());
    }

    #[test]
    fn default_is_absent() {
        assert_eq!(Loaded::<i32>::default(), Loaded::Absent);
    }

    #[test]
    fn serializes_as_inner_or_null() {
        assert_eq!(serde_json::to_string(&Loaded::Found(5)).unwrap(), "5");
        assert_eq!(serde_json::to_string(&Loaded::Fallback(5)).unwrap(), "5");
        assert_eq!(
            serde_json::to_string(&Loaded::<i32>::Absent).unwrap(),
            "null"
        );
    }

    #[test]
    fn deserializes_null_as_absent() {
        let loaded: Loaded<i32> = serde_json::from_str("null").unwrap();
        assert!(loaded.is_absent());
        let loaded: Loaded<i32> = serde_json::from_str("3").unwrap();
        assert_eq!(loaded, Loaded::Found(3));
    }
}
