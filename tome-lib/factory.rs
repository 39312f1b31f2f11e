//! Node type registry.
//!
//! Every structural rule the model enforces comes from a [`NodeFactory`]: a
//! side table mapping a type name to a [`NodeDescriptor`] of capabilities.
//! Nodes themselves are plain data; behavior is looked up here rather than
//! dispatched through the nodes, so documents with different vocabularies
//! can coexist in one process.
//!
//! Registration is last-write-wins. Querying a name that was never
//! registered is always an error, never a silent default.
//!
//! A [`Document`](crate::document::Document) carries its factory explicitly;
//! [`NodeFactory::with_default_types`] builds the stock vocabulary for
//! callers that don't need a custom one. Tests construct private registries
//! to avoid cross-test pollution.

use std::collections::HashMap;

use thiserror::Error;
use tome_core::TypeName;

pub type Result<T> = std::result::Result<T, FactoryError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FactoryError {
  #[error("node type {name:?} is not registered")]
  UnregisteredType { name: TypeName },
}

/// Structural capabilities of one node type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeDescriptor {
  /// The node holds inline content directly (a content branch such as a
  /// paragraph).
  pub can_contain_content: bool,
  /// The node itself behaves as inline content (text runs, images).
  pub is_content:          bool,
  /// The node has open/close markers, as opposed to being a bare content
  /// run.
  pub is_wrapped:          bool,
  /// Allowed child type names. `None` means unrestricted.
  pub child_node_types:    Option<Vec<TypeName>>,
  /// Allowed parent type names. `None` means unrestricted.
  pub parent_node_types:   Option<Vec<TypeName>>,
  /// Whether a structural split boundary may split this node.
  pub can_be_split:        bool,
}

#[derive(Debug, Clone, Default)]
pub struct NodeFactory {
  types: HashMap<TypeName, NodeDescriptor>,
}

impl NodeFactory {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registry pre-populated with the stock structural vocabulary.
  pub fn with_default_types() -> Self {
    let mut factory = Self::new();

    factory.register("document", NodeDescriptor {
      can_contain_content: false,
      is_content: false,
      is_wrapped: true,
      child_node_types: None,
      parent_node_types: Some(vec![]),
      can_be_split: false,
    });
    factory.register("paragraph", NodeDescriptor {
      can_contain_content: true,
      is_content: false,
      is_wrapped: true,
      child_node_types: Some(vec![]),
      parent_node_types: None,
      can_be_split: true,
    });
    factory.register("heading", NodeDescriptor {
      can_contain_content: true,
      is_content: false,
      is_wrapped: true,
      child_node_types: Some(vec![]),
      parent_node_types: None,
      can_be_split: true,
    });
    factory.register("preformatted", NodeDescriptor {
      can_contain_content: true,
      is_content: false,
      is_wrapped: true,
      child_node_types: Some(vec![]),
      parent_node_types: None,
      can_be_split: false,
    });
    factory.register("list", NodeDescriptor {
      can_contain_content: false,
      is_content: false,
      is_wrapped: true,
      child_node_types: Some(vec!["listItem".into()]),
      parent_node_types: None,
      can_be_split: false,
    });
    factory.register("listItem", NodeDescriptor {
      can_contain_content: true,
      is_content: false,
      is_wrapped: true,
      child_node_types: Some(vec![]),
      parent_node_types: Some(vec!["list".into()]),
      can_be_split: true,
    });
    factory.register("text", NodeDescriptor {
      can_contain_content: false,
      is_content: true,
      is_wrapped: false,
      child_node_types: Some(vec![]),
      parent_node_types: None,
      can_be_split: true,
    });
    factory.register("image", NodeDescriptor {
      can_contain_content: false,
      is_content: true,
      is_wrapped: true,
      child_node_types: Some(vec![]),
      parent_node_types: None,
      can_be_split: false,
    });

    factory
  }

  /// Adds or overwrites a type. Last write wins.
  pub fn register(&mut self, name: impl Into<TypeName>, descriptor: NodeDescriptor) {
    self.types.insert(name.into(), descriptor);
  }

  pub fn is_registered(&self, name: &str) -> bool {
    self.types.contains_key(name)
  }

  pub fn descriptor(&self, name: &str) -> Result<&NodeDescriptor> {
    self
      .types
      .get(name)
      .ok_or_else(|| FactoryError::UnregisteredType { name: name.into() })
  }

  /// Allowed child types for `name`. `None` means unrestricted.
  pub fn get_child_node_types(&self, name: &str) -> Result<Option<&[TypeName]>> {
    Ok(self.descriptor(name)?.child_node_types.as_deref())
  }

  /// Allowed parent types for `name`. `None` means unrestricted.
  pub fn get_parent_node_types(&self, name: &str) -> Result<Option<&[TypeName]>> {
    Ok(self.descriptor(name)?.parent_node_types.as_deref())
  }

  /// Whether nodes of this type can have child nodes. Content branches hold
  /// inline content, not children, so they answer false.
  pub fn can_node_have_children(&self, name: &str) -> Result<bool> {
    let descriptor = self.descriptor(name)?;
    Ok(descriptor.is_wrapped && !descriptor.can_contain_content && !descriptor.is_content)
  }

  /// Whether nodes of this type can have children that can themselves have
  /// children.
  pub fn can_node_have_grandchildren(&self, name: &str) -> Result<bool> {
    if !self.can_node_have_children(name)? {
      return Ok(false);
    }
    match &self.descriptor(name)?.child_node_types {
      // Unrestricted children: some allowed child can have children.
      None => Ok(true),
      Some(children) => {
        for child in children {
          if self.can_node_have_children(child)? {
            return Ok(true);
          }
        }
        Ok(false)
      },
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;

  fn leaf() -> NodeDescriptor {
    NodeDescriptor {
      is_content: true,
      can_be_split: true,
      child_node_types: Some(vec![]),
      ..Default::default()
    }
  }

  #[test]
  fn queries_return_registered_values() {
    let mut factory = NodeFactory::new();
    factory.register("leaf", leaf());

    assert!(factory.is_registered("leaf"));
    assert_eq!(factory.get_child_node_types("leaf").unwrap(), Some(&[][..]));
    assert_eq!(factory.get_parent_node_types("leaf").unwrap(), None);
    assert!(!factory.can_node_have_children("leaf").unwrap());
    assert!(!factory.can_node_have_grandchildren("leaf").unwrap());
  }

  #[test]
  fn unregistered_type_is_an_error() {
    let factory = NodeFactory::new();

    let err = factory.get_child_node_types("mystery").unwrap_err();
    assert_eq!(err, FactoryError::UnregisteredType {
      name: "mystery".into(),
    });
    assert!(factory.get_parent_node_types("mystery").is_err());
    assert!(factory.can_node_have_children("mystery").is_err());
    assert!(factory.can_node_have_grandchildren("mystery").is_err());
  }

  #[test]
  fn registration_is_last_write_wins() {
    let mut factory = NodeFactory::new();
    factory.register("thing", leaf());
    factory.register("thing", NodeDescriptor {
      is_wrapped: true,
      ..Default::default()
    });

    let descriptor = factory.descriptor("thing").unwrap();
    assert!(descriptor.is_wrapped);
    assert!(!descriptor.is_content);
  }

  #[test]
  fn grandchildren_follow_child_capabilities() {
    let factory = NodeFactory::with_default_types();

    // document -> list -> listItem: grandchildren.
    assert!(factory.can_node_have_grandchildren("document").unwrap());
    // list's only child type is listItem, which holds content, not children.
    assert!(factory.can_node_have_children("list").unwrap());
    assert!(!factory.can_node_have_grandchildren("list").unwrap());
    // Content branches have no children at all.
    assert!(!factory.can_node_have_children("paragraph").unwrap());
  }
}
