//! Newtype IDs for backend entity references.
//!
//! The banking backend issues identifiers the client never interprets, so
//! they are carried as opaque strings.

use serde::Deserialize;

/// Macro to define an opaque string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Display`
/// - `new()`, `as_str()`, `into_inner()`
/// - `From<String>` / `From<&str>` and `Into<String>` implementations
///
/// # Example
///
/// ```rust
/// # use securebank_core::define_id;
/// define_id!(AccountId);
///
/// let account = AccountId::new("ACC-0001");
/// assert_eq!(account.as_str(), "ACC-0001");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the ID as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(UserId);

/// Backend payloads sometimes carry IDs as JSON numbers; accept both forms.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl UserId {
    /// Deserialize a `UserId` from either a JSON string or a JSON number.
    ///
    /// Use with `#[serde(deserialize_with = "UserId::deserialize_lenient")]`.
    ///
    /// # Errors
    ///
    /// Returns the deserializer's error if the value is neither form.
    pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Number(n) => Self(n.to_string()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Payload {
        #[serde(deserialize_with = "UserId::deserialize_lenient")]
        id: UserId,
    }

    #[test]
    fn test_user_id_is_transparent() {
        let id = UserId::new("u1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"u1\"");
        assert_eq!(id.to_string(), "u1");
    }

    #[test]
    fn test_lenient_accepts_string_and_number() {
        let text: Payload = serde_json::from_str(r#"{"id":"9b2f-44"}"#).unwrap();
        assert_eq!(text.id.as_str(), "9b2f-44");

        let number: Payload = serde_json::from_str(r#"{"id":42}"#).unwrap();
        assert_eq!(number.id.as_str(), "42");
    }
}
