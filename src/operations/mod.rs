//! Non-interactive mesh operations built on the same commit path as
//! interactive polygon creation.

pub mod creation;
pub mod modification;
pub mod query;
