//! Record identifiers.
//!
//! Customers, checkouts, orders and saved addresses are numbered by the
//! storefront. Each gets its own wrapper so a checkout id cannot be passed
//! where an order id is expected.

/// Declare a numeric record identifier.
///
/// The generated type wraps an `i64`, serializes as the bare number, prints
/// as the number and parses from it (so it can be a CLI argument).
///
/// ```rust
/// # use dulocart_core::define_id;
/// define_id!(
///     /// Warehouse shelf.
///     ShelfId
/// );
///
/// let shelf: ShelfId = "12".parse().unwrap();
/// assert_eq!(shelf, ShelfId::new(12));
/// assert_eq!(i64::from(shelf), 12);
/// ```
#[macro_export]
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn as_i64(self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Storefront customer.
    CustomerId
);
define_id!(
    /// Checkout in progress; becomes an order on submit.
    CheckoutId
);
define_id!(
    /// Confirmed order.
    OrderId
);
define_id!(
    /// Address saved on a customer account.
    AddressId
);
