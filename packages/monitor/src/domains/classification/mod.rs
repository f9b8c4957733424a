//! Classification domain - decides whether a look-alike domain is suspicious

pub mod classifier;
pub mod models;

pub use classifier::classify;
pub use models::{RegistrationRecord, SuspicionReason, Verdict, VerdictAttributes};
