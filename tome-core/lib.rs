use smartstring::{
  LazyCompact,
  SmartString,
};

pub mod annotation;
pub mod attributes;
pub mod item;

/// Inline string type used for element type names, annotation names and
/// attribute keys. These are short and repeated constantly, so they get the
/// same small-string treatment the rest of the workspace uses.
pub type TypeName = SmartString<LazyCompact>;
