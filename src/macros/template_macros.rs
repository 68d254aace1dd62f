//! Field declaration macros for module templates
//!
//! These macros simplify writing the `(name, type)` lists that templates are built from.

/// Macro for declaring template fields
///
/// # Example
/// ```rust
/// use rpatch::{fields, FieldType, PortKind, Template};
///
/// let base = Template::build(fields![
///     in_wave => FieldType::reference(PortKind::Double),
///     level => FieldType::Number,
/// ]).unwrap();
/// assert_eq!(base.len(), 2);
/// ```
#[macro_export]
macro_rules! fields {
    ($($name:ident => $field_type:expr),* $(,)?) => {
        vec![
            $(
                (stringify!($name), $field_type)
            ),*
        ]
    };
}

/// Macro for declaring output ports of a single kind
///
/// # Example
/// ```rust
/// use rpatch::{outputs, FieldType, PortKind};
///
/// let outs = outputs![PortKind::Double; out_0, out_1];
/// assert_eq!(outs[1], ("out_1", FieldType::Port(PortKind::Double)));
/// ```
#[macro_export]
macro_rules! outputs {
    ($kind:expr; $($name:ident),* $(,)?) => {
        vec![
            $(
                (stringify!($name), $crate::FieldType::Port($kind))
            ),*
        ]
    };
}
