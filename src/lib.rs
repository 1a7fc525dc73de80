#![warn(
    clippy::pedantic,
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    rust_2018_idioms
)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::broken_intra_doc_links)]

//! `classdecl` reconstructs the declarations of a type from its compiled JVM class file.
//!
//! The result is a [`DeclarationNode`](decl::DeclarationNode) with the shape a source parser
//! produces for the same type: effective modifiers, generic signatures, compile-time constants
//! and annotations, without method bodies.
//!
//! ```no_run
//! let bytes = std::fs::read("Foo.class").unwrap();
//! let node = classdecl::convert(&bytes).unwrap();
//! for method in node.methods() {
//!     println!("{} {}", method.modifiers, method.name);
//! }
//! ```
//! ## Features
#![doc = document_features::document_features!()]

pub mod decl;
pub mod errors;
pub mod jvm;
pub(crate) mod macros;
pub mod types;

/// Test utilities
#[cfg(test)]
pub mod tests;

use decl::DeclarationNode;
use errors::Error;
use jvm::class::BinaryClass;

/// Converts the bytes of a class file into the declaration tree of the type it defines.
///
/// Each call is independent: nothing is cached or shared between calls.
/// # Errors
/// - [`Error::Format`] if the bytes are not a well-formed class file.
/// - [`Error::MalformedConstantPool`] if an index does not resolve to the expected entry.
/// - [`Error::UnsupportedConstruct`] if the class file declares a module, a record, a local or
///   anonymous class, or another construct that has no declaration tree.
pub fn convert(bytes: &[u8]) -> Result<DeclarationNode, Error> {
    let class = BinaryClass::parse(bytes)?;
    decl::assembler::assemble(class)
}

/// Converts independent class files in parallel, returning the results in input order.
#[cfg(feature = "parallel")]
#[cfg_attr(docsrs, doc(cfg(feature = "parallel")))]
#[must_use]
pub fn convert_all(inputs: &[&[u8]]) -> Vec<Result<DeclarationNode, Error>> {
    use rayon::prelude::*;

    inputs.par_iter().map(|bytes| convert(bytes)).collect()
}
