pub mod document;
pub mod factory;
pub mod history;
pub mod node;
pub mod range;
pub mod transaction;

pub use tome_core::TypeName;
