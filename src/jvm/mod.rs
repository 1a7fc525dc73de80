//! Module containing the structures of a JVM class file.

pub mod annotation;
pub mod class;
pub mod constant_pool;
pub(crate) mod parsing;
