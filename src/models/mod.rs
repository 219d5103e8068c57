//! Domain model module declarations.

pub mod alert;
pub mod inbox;
