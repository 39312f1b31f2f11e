//! Items of the linear document data.
//!
//! A document is a flat sequence of [`Item`]s. Structure is expressed with
//! balanced open/close element markers; everything between a matching pair is
//! that element's content. Content items are atomic: one character plus the
//! annotations it carries. Interpreting the sequence by marker nesting yields
//! an ordered tree, and the sequence is the single source of truth for that
//! tree.
//!
//! ```
//! use tome_core::item::{self, Item};
//!
//! // <paragraph>ab</paragraph>
//! let mut data = vec![Item::open("paragraph")];
//! data.extend(item::content_run("ab"));
//! data.push(Item::close("paragraph"));
//!
//! assert_eq!(data.len(), 4);
//! assert!(data[0].is_open());
//! assert!(data[1].is_content());
//! ```

use serde::{
  Deserialize,
  Serialize,
};

use crate::{
  TypeName,
  annotation::{
    Annotation,
    AnnotationSet,
  },
  attributes::Attributes,
};

/// An element as carried by its opening marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
  pub name:       TypeName,
  #[serde(default, skip_serializing_if = "Attributes::is_empty")]
  pub attributes: Attributes,
}

impl Element {
  pub fn new(name: impl Into<TypeName>) -> Self {
    Self {
      name:       name.into(),
      attributes: Attributes::new(),
    }
  }

  pub fn with_attributes(name: impl Into<TypeName>, attributes: Attributes) -> Self {
    Self {
      name: name.into(),
      attributes,
    }
  }
}

/// One atomic unit of inline content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
  pub value:       char,
  #[serde(default, skip_serializing_if = "AnnotationSet::is_empty")]
  pub annotations: AnnotationSet,
}

impl ContentItem {
  pub fn new(value: char) -> Self {
    Self {
      value,
      annotations: AnnotationSet::new(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Item {
  /// Opening element marker.
  Open(Element),

  /// Closing element marker for the named type.
  Close(TypeName),

  /// Inline content.
  Content(ContentItem),
}

impl Item {
  pub fn open(name: impl Into<TypeName>) -> Self {
    Self::Open(Element::new(name))
  }

  pub fn open_with(name: impl Into<TypeName>, attributes: Attributes) -> Self {
    Self::Open(Element::with_attributes(name, attributes))
  }

  pub fn close(name: impl Into<TypeName>) -> Self {
    Self::Close(name.into())
  }

  pub fn content(value: char) -> Self {
    Self::Content(ContentItem::new(value))
  }

  pub fn annotated(value: char, annotations: AnnotationSet) -> Self {
    Self::Content(ContentItem {
      value,
      annotations,
    })
  }

  #[inline]
  #[must_use]
  pub fn is_open(&self) -> bool {
    matches!(self, Self::Open(_))
  }

  #[inline]
  #[must_use]
  pub fn is_close(&self) -> bool {
    matches!(self, Self::Close(_))
  }

  /// True for both opening and closing markers.
  #[inline]
  #[must_use]
  pub fn is_element(&self) -> bool {
    matches!(self, Self::Open(_) | Self::Close(_))
  }

  #[inline]
  #[must_use]
  pub fn is_content(&self) -> bool {
    matches!(self, Self::Content(_))
  }

  /// The element type name, for markers.
  pub fn type_name(&self) -> Option<&TypeName> {
    match self {
      Self::Open(element) => Some(&element.name),
      Self::Close(name) => Some(name),
      Self::Content(_) => None,
    }
  }

  pub fn as_element(&self) -> Option<&Element> {
    match self {
      Self::Open(element) => Some(element),
      _ => None,
    }
  }

  pub fn as_content(&self) -> Option<&ContentItem> {
    match self {
      Self::Content(content) => Some(content),
      _ => None,
    }
  }

  pub fn annotations(&self) -> Option<&AnnotationSet> {
    self.as_content().map(|c| &c.annotations)
  }
}

/// Expands a string into plain (unannotated) content items.
pub fn content_run(text: &str) -> Vec<Item> {
  text.chars().map(Item::content).collect()
}

/// Expands a string into content items all carrying `annotation`.
pub fn annotated_run(text: &str, annotation: &Annotation) -> Vec<Item> {
  text
    .chars()
    .map(|c| {
      let mut annotations = AnnotationSet::new();
      annotations.insert(annotation.clone());
      Item::annotated(c, annotations)
    })
    .collect()
}
