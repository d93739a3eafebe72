//! Common types used across the application.

pub mod id;
pub mod money;
pub mod pagination;

pub use id::*;
pub use money::{Currency, GCOIN_SCALE, Money};
pub use pagination::{PageMeta, PageRequest};
