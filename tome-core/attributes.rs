//! Element and annotation attribute values.
//!
//! Attributes are a closed variant type rather than an open dynamic bag so
//! that attribute-change operations can be compared and inverted exhaustively.
//! The map is insertion-ordered: converters round-tripping a document should
//! see attributes come back in the order they were produced.

use indexmap::IndexMap;
use serde::{
  Deserialize,
  Serialize,
};

use crate::TypeName;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
  Bool(bool),
  Int(i64),
  Float(f64),
  Str(String),
  Map(IndexMap<TypeName, AttributeValue>),
}

impl From<bool> for AttributeValue {
  fn from(value: bool) -> Self {
    Self::Bool(value)
  }
}

impl From<i64> for AttributeValue {
  fn from(value: i64) -> Self {
    Self::Int(value)
  }
}

impl From<f64> for AttributeValue {
  fn from(value: f64) -> Self {
    Self::Float(value)
  }
}

impl From<&str> for AttributeValue {
  fn from(value: &str) -> Self {
    Self::Str(value.to_owned())
  }
}

impl From<String> for AttributeValue {
  fn from(value: String) -> Self {
    Self::Str(value)
  }
}

/// Ordered attribute map keyed by attribute name.
pub type Attributes = IndexMap<TypeName, AttributeValue>;

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn value_equality_is_structural() {
    let mut a = Attributes::new();
    a.insert("level".into(), AttributeValue::from(2));
    let mut b = Attributes::new();
    b.insert("level".into(), AttributeValue::from(2));

    assert_eq!(a, b);

    b.insert("style".into(), AttributeValue::from("bullet"));
    assert_ne!(a, b);
  }

  #[test]
  fn nested_maps_compare_by_value() {
    let mut inner = Attributes::new();
    inner.insert("width".into(), AttributeValue::from(120));

    let a = AttributeValue::Map(inner.clone());
    let b = AttributeValue::Map(inner);
    assert_eq!(a, b);
  }

  #[test]
  fn serializes_untagged() {
    let mut attrs = Attributes::new();
    attrs.insert("level".into(), AttributeValue::from(3));
    attrs.insert("wide".into(), AttributeValue::from(true));

    let json = serde_json::to_string(&attrs).unwrap();
    assert_eq!(json, r#"{"level":3,"wide":true}"#);

    let back: Attributes = serde_json::from_str(&json).unwrap();
    assert_eq!(back, attrs);
  }
}
