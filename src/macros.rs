/// Links to a section of the JVM specification (chapter 4, SE 21).
macro_rules! see_jvm_spec {
    ($sec:literal $(, $sub_sec:literal )* ) => {
        concat!(
            "See the [JVM Specification §", $sec $(, ".", $sub_sec )*, "]",
            "(https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-4.html#jvms-", $sec $(, ".", $sub_sec )*, ")",
            " for more information."
        )
    };
}

pub(crate) use see_jvm_spec;

/// Returns early with a [`FormatError::Malformed`](crate::errors::FormatError::Malformed).
macro_rules! malform {
    ($msg:expr) => {
        return Err($crate::errors::FormatError::Malformed($msg).into())
    };
}

pub(crate) use malform;

/// Sorts a resolved attribute table into local bindings.
///
/// - `let x: Kind` binds `Option<_>` with the payload of the only `Kind` attribute,
///   optionally unwrapped with `as unwrap_or_default`.
/// - `if let x: Kind` binds `true` when a marker attribute is present.
///
/// A duplicated attribute, or a known attribute in a location where it is not allowed,
/// is a format error. Unrecognized attributes are skipped.
macro_rules! extract_attributes {
    (
        for $attributes:ident in $location:literal {
            $( let $var:ident : $attr:ident $( as $unwrap:ident )? , )*
            $( if let $flag:ident : $flag_attr:ident , )*
        }
    ) => {
        $( let mut $var = None; )*
        $( let mut $flag = false; )*
        for attribute in $attributes {
            match attribute {
                $(
                    $crate::jvm::parsing::attribute::Attribute::$attr(it) => {
                        if $var.replace(it).is_some() {
                            return Err($crate::errors::FormatError::DuplicateAttribute {
                                attribute: stringify!($attr),
                                location: $location,
                            }
                            .into());
                        }
                    }
                )*
                $(
                    $crate::jvm::parsing::attribute::Attribute::$flag_attr => {
                        $flag = true;
                    }
                )*
                $crate::jvm::parsing::attribute::Attribute::Unrecognized(name) => {
                    tracing::trace!(attribute = %name, location = $location, "skipping attribute");
                }
                #[allow(unreachable_patterns)]
                unexpected => {
                    return Err($crate::errors::FormatError::UnexpectedAttribute {
                        attribute: unexpected.name(),
                        location: $location,
                    }
                    .into());
                }
            }
        }
        $( $( let $var = $var.$unwrap(); )? )*
    };
}

pub(crate) use extract_attributes;
