//! SeaORM entities.

pub mod login_attempt;
