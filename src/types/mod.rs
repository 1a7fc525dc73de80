//! Types at the JVM level and at the source level.
pub mod field_type;
pub mod method_descriptor;
pub mod signature;

/// Converts a binary name (`java/util/Map$Entry`) to a qualified name (`java.util.Map$Entry`).
#[must_use]
pub fn qualified_name(binary_name: &str) -> String {
    binary_name.replace('/', ".")
}
