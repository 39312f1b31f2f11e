//! Transactions: ordered operation lists describing edits to a document.
//!
//! A [`Transaction`] walks the document it was built against from start to
//! end. Retains skip over untouched items, replaces swap one run of items for
//! another, and the remaining operations mutate items in place without
//! consuming extra length. The sum of retained and removed lengths always
//! equals the length of the source document, which pins every operation to an
//! absolute offset and makes inversion a purely local rewrite.
//!
//! Transactions are built by the `new_from_*` constructors against a
//! [`Document`] snapshot and applied with [`Document::commit`]. Applying a
//! transaction built against different data fails rather than corrupting the
//! document.

use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;
use tome_core::{
  TypeName,
  annotation::Annotation,
  attributes::{
    AttributeValue,
    Attributes,
  },
  item::Item,
};

use crate::{
  document::{
    Document,
    DocumentError,
    SelectMode,
  },
  factory::FactoryError,
  node::{
    NodeId,
    can_be_merged_with,
  },
  range::Range,
};

pub type Result<T> = std::result::Result<T, TransactionError>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransactionError {
  #[error("retain target {to} is behind the cursor at {cursor}")]
  RetainBackwards { cursor: usize, to: usize },
  #[error("offset {offset} does not hold an element")]
  NotAnElement { offset: usize },
  #[error("offset {offset} holds a closing marker, not an element")]
  ClosingElement { offset: usize },
  #[error("offset {offset} is out of bounds for length {len}")]
  OffsetOutOfBounds { offset: usize, len: usize },
  #[error(transparent)]
  Factory(#[from] FactoryError),
  #[error(transparent)]
  Document(#[from] DocumentError),
}

/// Whether an annotate span applies or withdraws its annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnotationMethod {
  Set,
  Clear,
}

impl AnnotationMethod {
  #[inline]
  pub fn invert(self) -> Self {
    match self {
      Self::Set => Self::Clear,
      Self::Clear => Self::Set,
    }
  }
}

/// Marks one end of an annotate span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnotationBias {
  Start,
  Stop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
  /// Copy `n` items through unchanged, advancing the cursor.
  Retain(usize),
  /// Consume `remove`, emit `insert`. Either side may be empty.
  Replace { remove: Vec<Item>, insert: Vec<Item> },
  /// Rewrite one attribute of the opening marker at the cursor. Consumes no
  /// length; `from` records the prior value so inversion is local.
  AttributeChange {
    key:  TypeName,
    from: Option<AttributeValue>,
    to:   Option<AttributeValue>,
  },
  /// Toggle an annotation span over the content items retained after this
  /// point, until the matching `Stop`.
  Annotate {
    method:     AnnotationMethod,
    bias:       AnnotationBias,
    annotation: Annotation,
  },
}

impl Operation {
  /// Length of source document this operation consumes.
  #[inline]
  pub fn covered(&self) -> usize {
    match self {
      Self::Retain(n) => *n,
      Self::Replace { remove, .. } => remove.len(),
      Self::AttributeChange { .. } | Self::Annotate { .. } => 0,
    }
  }
}

/// Direction an offset leans when it lands inside an edit while mapping
/// through a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
  Before,
  After,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Transaction {
  operations:        Vec<Operation>,
  /// Net change in document length once applied.
  length_difference: isize,
}

impl Transaction {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn operations(&self) -> &[Operation] {
    &self.operations
  }

  #[inline]
  pub fn length_difference(&self) -> isize {
    self.length_difference
  }

  /// Length of the document this transaction was built against.
  pub fn covered_length(&self) -> usize {
    self.operations.iter().map(Operation::covered).sum()
  }

  /// True when applying would change nothing.
  pub fn is_no_op(&self) -> bool {
    self
      .operations
      .iter()
      .all(|op| matches!(op, Operation::Retain(_)))
  }

  /// Appends a retain, coalescing with a trailing retain.
  pub fn push_retain(&mut self, n: usize) {
    if n == 0 {
      return;
    }
    if let Some(Operation::Retain(last)) = self.operations.last_mut() {
      *last += n;
      return;
    }
    self.operations.push(Operation::Retain(n));
  }

  /// Retains forward to absolute offset `to` in the source document.
  pub fn retain_to(&mut self, to: usize) -> Result<()> {
    let cursor = self.covered_length();
    if to < cursor {
      return Err(TransactionError::RetainBackwards { cursor, to });
    }
    self.push_retain(to - cursor);
    Ok(())
  }

  /// Appends a replace, coalescing with a trailing replace.
  pub fn push_replace(&mut self, remove: Vec<Item>, insert: Vec<Item>) {
    if remove.is_empty() && insert.is_empty() {
      return;
    }
    self.length_difference += insert.len() as isize - remove.len() as isize;
    if let Some(Operation::Replace {
      remove: tail_remove,
      insert: tail_insert,
    }) = self.operations.last_mut()
    {
      tail_remove.extend(remove);
      tail_insert.extend(insert);
      return;
    }
    self.operations.push(Operation::Replace { remove, insert });
  }

  pub fn push_replace_element_attribute(
    &mut self,
    key: TypeName,
    from: Option<AttributeValue>,
    to: Option<AttributeValue>,
  ) {
    self
      .operations
      .push(Operation::AttributeChange { key, from, to });
  }

  pub fn push_start_annotating(&mut self, method: AnnotationMethod, annotation: Annotation) {
    self.operations.push(Operation::Annotate {
      method,
      bias: AnnotationBias::Start,
      annotation,
    });
  }

  pub fn push_stop_annotating(&mut self, method: AnnotationMethod, annotation: Annotation) {
    self.operations.push(Operation::Annotate {
      method,
      bias: AnnotationBias::Stop,
      annotation,
    });
  }

  /// The transaction undoing this one, valid against the document this one
  /// produces. Inversion is local: replaces swap sides, attribute changes
  /// swap values, annotate spans flip method.
  pub fn invert(&self) -> Transaction {
    let operations = self
      .operations
      .iter()
      .map(|op| match op {
        Operation::Retain(n) => Operation::Retain(*n),
        Operation::Replace { remove, insert } => Operation::Replace {
          remove: insert.clone(),
          insert: remove.clone(),
        },
        Operation::AttributeChange { key, from, to } => Operation::AttributeChange {
          key:  key.clone(),
          from: to.clone(),
          to:   from.clone(),
        },
        Operation::Annotate {
          method,
          bias,
          annotation,
        } => Operation::Annotate {
          method:     method.invert(),
          bias:       *bias,
          annotation: annotation.clone(),
        },
      })
      .collect();

    Transaction {
      operations,
      length_difference: -self.length_difference,
    }
  }

  /// Maps an offset in the source document to the corresponding offset in
  /// the produced document. `bias` decides which side an offset inside a
  /// replaced run, or exactly at an insertion point, lands on.
  pub fn map_offset(&self, offset: usize, bias: Bias) -> Result<usize> {
    let len = self.covered_length();
    if offset > len {
      return Err(TransactionError::OffsetOutOfBounds { offset, len });
    }

    let mut old_pos = 0usize;
    let mut new_pos = 0usize;
    for op in &self.operations {
      match op {
        Operation::Retain(n) => {
          if offset < old_pos + n {
            return Ok(new_pos + (offset - old_pos));
          }
          old_pos += n;
          new_pos += n;
        },
        Operation::Replace { remove, insert } => {
          if offset == old_pos && bias == Bias::Before {
            return Ok(new_pos);
          }
          if offset < old_pos + remove.len() {
            return Ok(match bias {
              Bias::Before => new_pos,
              Bias::After => new_pos + insert.len(),
            });
          }
          old_pos += remove.len();
          new_pos += insert.len();
        },
        Operation::AttributeChange { .. } | Operation::Annotate { .. } => {},
      }
    }
    Ok(new_pos)
  }

  /// Inserts `data` at `offset`, adjusting it first so the result stays
  /// well-formed at that position.
  pub fn new_from_insertion(doc: &Document, offset: usize, data: Vec<Item>) -> Result<Self> {
    let len = doc.len();
    let data = doc.fixup_insertion(data, offset)?;

    let mut tx = Transaction::new();
    tx.push_retain(offset);
    tx.push_replace(Vec::new(), data);
    tx.push_retain(len - offset);
    Ok(tx)
  }

  /// Removes the items selected by `range`.
  ///
  /// Content-only selections remove just content and leave structure alone.
  /// Fully covered nodes are removed whole, markers included. A selection
  /// starting inside one content branch and ending inside a compatible
  /// sibling removes everything between, merging the two branches.
  pub fn new_from_removal(doc: &Document, range: Range) -> Result<Self> {
    let range = range.normalize();
    let len = doc.len();
    if range.end() > len {
      return Err(
        DocumentError::RangeOutOfBounds {
          from: range.start(),
          to:   range.end(),
          len,
        }
        .into(),
      );
    }

    let mut tx = Transaction::new();
    if range.is_empty() {
      tx.push_retain(len);
      return Ok(tx);
    }

    let selected = doc.select_nodes(range, SelectMode::Covered)?;

    if let (Some(first), Some(last)) = (selected.first(), selected.last()) {
      let first_branch = content_branch_of(doc, first.node)?;
      let last_branch = content_branch_of(doc, last.node)?;
      if let (Some(a), Some(b)) = (first_branch, last_branch) {
        // Both endpoints strictly inside branch content and the branches
        // compatible: delete straight across and let them merge.
        if range.start() > doc.node(a).outer.start()
          && range.end() < doc.node(b).outer.end()
          && can_be_merged_with(doc.arena(), doc.factory(), a, b)?
        {
          tx.push_retain(range.start());
          tx.push_replace(doc.data()[range.start()..range.end()].to_vec(), Vec::new());
          tx.push_retain(len - range.end());
          return Ok(tx);
        }
      }
    }

    // Structural removal: whole nodes go markers and all, partial coverage
    // drops only the covered content.
    let mut spans: Vec<Range> = Vec::new();
    for entry in &selected {
      let span = match entry.range {
        None => entry.node_outer_range,
        Some(sub) => sub,
      };
      if span.is_empty() {
        continue;
      }
      match spans.last_mut() {
        Some(prev) if prev.end() >= span.start() => prev.to = prev.to.max(span.end()),
        _ => spans.push(span),
      }
    }

    for span in &spans {
      tx.retain_to(span.start())?;
      tx.push_replace(doc.data()[span.start()..span.end()].to_vec(), Vec::new());
    }
    tx.retain_to(len)?;
    Ok(tx)
  }

  /// Sets or removes one attribute on the element whose opening marker sits
  /// at `offset`.
  pub fn new_from_attribute_change(
    doc: &Document,
    offset: usize,
    key: TypeName,
    value: Option<AttributeValue>,
  ) -> Result<Self> {
    let len = doc.len();
    let item = doc
      .data()
      .get(offset)
      .ok_or(TransactionError::OffsetOutOfBounds { offset, len })?;

    let element = match item {
      Item::Open(element) => element,
      Item::Close(_) => return Err(TransactionError::ClosingElement { offset }),
      Item::Content(_) => return Err(TransactionError::NotAnElement { offset }),
    };
    let from = element.attributes.get(key.as_str()).cloned();

    let mut tx = Transaction::new();
    tx.push_retain(offset);
    tx.push_replace_element_attribute(key, from, value);
    tx.push_retain(len - offset);
    Ok(tx)
  }

  /// Sets or clears `annotation` over the content items in `range`.
  ///
  /// Only items the operation would actually change are spanned: content
  /// already carrying the annotation is skipped when setting, content
  /// without it when clearing, and markers always.
  pub fn new_from_annotation(
    doc: &Document,
    range: Range,
    method: AnnotationMethod,
    annotation: Annotation,
  ) -> Result<Self> {
    let range = range.normalize();
    let len = doc.len();
    if range.end() > len {
      return Err(
        DocumentError::RangeOutOfBounds {
          from: range.start(),
          to:   range.end(),
          len,
        }
        .into(),
      );
    }

    let mut tx = Transaction::new();
    tx.push_retain(range.start());

    let mut annotating = false;
    let mut run = 0usize;
    for offset in range.start()..range.end() {
      let eligible = match &doc.data()[offset] {
        Item::Content(content) => match method {
          AnnotationMethod::Set => !content.annotations.contains(&annotation),
          AnnotationMethod::Clear => content.annotations.contains(&annotation),
        },
        Item::Open(_) | Item::Close(_) => false,
      };
      if eligible != annotating {
        tx.push_retain(run);
        run = 0;
        if eligible {
          tx.push_start_annotating(method, annotation.clone());
        } else {
          tx.push_stop_annotating(method, annotation.clone());
        }
        annotating = eligible;
      }
      run += 1;
    }
    tx.push_retain(run);
    if annotating {
      tx.push_stop_annotating(method, annotation.clone());
    }
    tx.push_retain(len - range.end());
    Ok(tx)
  }

  /// Converts the content branches touched by `range` to `new_type` with
  /// `attributes`, rewriting only their markers. Branches already matching
  /// the target element exactly are left alone.
  pub fn new_from_content_branch_conversion(
    doc: &Document,
    range: Range,
    new_type: TypeName,
    attributes: Attributes,
  ) -> Result<Self> {
    let selected = doc.select_nodes(range, SelectMode::Leaves)?;

    let mut branches: Vec<NodeId> = Vec::new();
    for entry in &selected {
      if let Some(branch) = content_branch_of(doc, entry.node)? {
        if !branches.contains(&branch) {
          branches.push(branch);
        }
      }
    }

    let new_open = Item::open_with(new_type.clone(), attributes);
    let new_close = Item::close(new_type);

    let mut tx = Transaction::new();
    for branch in branches {
      let node = doc.node(branch);
      let open = doc.data()[node.outer.start()].clone();
      if open == new_open {
        continue;
      }
      let close = doc.data()[node.inner.end()].clone();

      tx.retain_to(node.outer.start())?;
      tx.push_replace(vec![open], vec![new_open.clone()]);
      tx.retain_to(node.inner.end())?;
      tx.push_replace(vec![close], vec![new_close.clone()]);
    }
    tx.retain_to(doc.len())?;
    Ok(tx)
  }
}

/// Closest ancestor of `node`, itself included, that is a wrapped branch
/// holding content directly.
fn content_branch_of(doc: &Document, node: NodeId) -> Result<Option<NodeId>> {
  let mut current = Some(node);
  while let Some(id) = current {
    let node = doc.node(id);
    let descriptor = doc.factory().descriptor(&node.type_name)?;
    if descriptor.can_contain_content && descriptor.is_wrapped {
      return Ok(Some(id));
    }
    current = node.parent;
  }
  Ok(None)
}
