//! Session persistence on top of the shared session cache.

mod store;

pub use store::{RefreshToken, SessionStore, Snapshot};
