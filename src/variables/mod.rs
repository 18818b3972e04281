//! Variables module
//!
//! This module resolves `{{name}}` placeholders from a variable map and
//! `{{$function args}}` dynamic placeholders such as `{{$guid}}` or
//! `{{$datetime rfc1123 -1 d}}`. Response references are resolved separately
//! by [`crate::capture`].

pub mod resolver;
pub mod system;

pub use resolver::{has_response_references, has_unresolved_variables, variable_names, VariableResolver};
pub use system::{
    apply_offset, parse_datetime_arguments, resolve_dynamic_function, DateTimeArguments,
    DateTimeFormat, OffsetUnit,
};
