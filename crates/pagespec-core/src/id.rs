//! Identifier newtypes for specs, nodes, and grid items.
//!
//! Identifiers are short prefixed tokens (`n_…`, `gi_…`, `spec_…`) drawn from
//! UUID v4 randomness. They are plain strings on the wire so a spec survives a
//! JSON round trip unchanged.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of hex characters in a generated token.
const TOKEN_LEN: usize = 10;

fn random_token() -> String {
    let simple = Uuid::new_v4().simple().to_string();
    simple[..TOKEN_LEN].to_owned()
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Prefix used for freshly generated identifiers.
            pub const PREFIX: &'static str = $prefix;

            /// Wrap an existing raw identifier.
            #[must_use]
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Generate a new random identifier.
            #[must_use]
            pub fn fresh() -> Self {
                Self(format!("{}{}", Self::PREFIX, random_token()))
            }

            /// Borrow the raw string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::new(raw)
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

string_id!(
    /// Identifier of a node inside a spec's node map.
    NodeId,
    "n_"
);

string_id!(
    /// Identifier of a grid item, unique within its grid.
    GridItemId,
    "gi_"
);

string_id!(
    /// Identifier of a stored spec.
    SpecId,
    "spec_"
);
