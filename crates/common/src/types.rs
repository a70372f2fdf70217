use serde::{Deserialize, Serialize};

/// Declares a string-backed identifier newtype.
///
/// Every identifier in the system is an opaque string assigned either by an
/// [`IdGenerator`](crate::IdGenerator) or by an administrator (SKUs, warehouse
/// codes). Wrapping them keeps a `WarehouseId` from being passed where a
/// `ProductId` is expected.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if the identifier is empty.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Product identifier (SKU).
    ProductId
);

string_id!(
    /// Warehouse identifier. Ordering of warehouse ids drives the allocation order.
    WarehouseId
);

string_id!(
    /// Identifier of an authenticated user.
    UserId
);

string_id!(
    /// Order identifier.
    OrderId
);
