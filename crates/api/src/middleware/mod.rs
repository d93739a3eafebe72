//! Request extractors and middleware.

pub mod actor;

pub use actor::{ActorId, USER_ID_HEADER};
