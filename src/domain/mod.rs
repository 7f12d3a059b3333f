//! Domain layer containing business logic and domain types.
//!
//! - `foundation` - shared primitives (ids, money, errors, events)
//! - `checkout` - the order aggregate, its builder and payment value types

pub mod checkout;
pub mod foundation;
