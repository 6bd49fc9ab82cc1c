//! SeaORM entities.

pub mod application;
pub mod contract;
pub mod job;
