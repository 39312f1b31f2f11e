//! Content annotations.
//!
//! An [`Annotation`] marks a property of inline content (bold, italic, a
//! link target) without affecting document structure. Annotations compare by
//! value: two separately constructed `bold` annotations are the same
//! annotation. [`AnnotationSet`] keeps the annotations carried by a single
//! content item; the common case is zero or one entry, so it is backed by a
//! one-element smallvec.

use serde::{
  Deserialize,
  Serialize,
};
use smallvec::SmallVec;

use crate::{
  TypeName,
  attributes::Attributes,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
  pub name:       TypeName,
  #[serde(default, skip_serializing_if = "Attributes::is_empty")]
  pub attributes: Attributes,
}

impl Annotation {
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

/// Set of annotations applied to one content item, with value-equality
/// membership.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationSet(SmallVec<[Annotation; 1]>);

impl AnnotationSet {
  pub fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.0.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn contains(&self, annotation: &Annotation) -> bool {
    self.0.iter().any(|a| a == annotation)
  }

  /// Adds `annotation` unless an equal one is already present.
  pub fn insert(&mut self, annotation: Annotation) {
    if !self.contains(&annotation) {
      self.0.push(annotation);
    }
  }

  /// Removes the annotation equal to `annotation`, if present.
  pub fn remove(&mut self, annotation: &Annotation) {
    self.0.retain(|a| a != annotation);
  }

  pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
    self.0.iter()
  }
}

impl FromIterator<Annotation> for AnnotationSet {
  fn from_iter<I: IntoIterator<Item = Annotation>>(iter: I) -> Self {
    let mut set = Self::new();
    for annotation in iter {
      set.insert(annotation);
    }
    set
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::attributes::AttributeValue;

  #[test]
  fn membership_is_by_value() {
    let mut set = AnnotationSet::new();
    set.insert(Annotation::new("bold"));

    // A separately constructed equal annotation is the same annotation.
    assert!(set.contains(&Annotation::new("bold")));
    assert!(!set.contains(&Annotation::new("italic")));
  }

  #[test]
  fn insert_deduplicates() {
    let mut set = AnnotationSet::new();
    set.insert(Annotation::new("bold"));
    set.insert(Annotation::new("bold"));
    assert_eq!(set.len(), 1);
  }

  #[test]
  fn attributes_distinguish_annotations() {
    let mut attrs = Attributes::new();
    attrs.insert("href".into(), AttributeValue::from("https://example.com"));
    let link = Annotation::with_attributes("link", attrs);

    let mut set = AnnotationSet::new();
    set.insert(link.clone());

    assert!(set.contains(&link));
    assert!(!set.contains(&Annotation::new("link")));

    set.remove(&link);
    assert!(set.is_empty());
  }
}
