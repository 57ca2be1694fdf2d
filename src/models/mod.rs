//! Domain model module declarations.

pub mod approval;
pub mod record;
pub mod supply;
