//! Document state: the linear data and the node tree derived from it.
//!
//! A [`Document`] owns the linear item sequence and an arena node tree built
//! from it. The data is the single source of truth: the tree is derived on
//! construction and rebuilt after every committed transaction, never patched
//! in place. Reads (`select_nodes`, `fixup_insertion`,
//! `offset_contains_annotation`) never mutate; all mutation goes through
//! [`Document::commit`] with a [`Transaction`].
//!
//! # Example
//!
//! ```
//! use tome_core::item::{self, Item};
//! use tome_lib::{
//!   document::Document,
//!   transaction::Transaction,
//! };
//!
//! let mut data = vec![Item::open("paragraph")];
//! data.extend(item::content_run("a"));
//! data.push(Item::close("paragraph"));
//!
//! let mut doc = Document::with_defaults(data).unwrap();
//! let tx = Transaction::new_from_insertion(&doc, 2, item::content_run("b")).unwrap();
//! doc.commit(&tx).unwrap();
//! assert_eq!(doc.len(), 4);
//! ```

use thiserror::Error;
use tome_core::{
  TypeName,
  annotation::Annotation,
  item::Item,
};

use crate::{
  factory::{
    FactoryError,
    NodeFactory,
  },
  history::{
    History,
    HistoryError,
  },
  range::Range,
  node::{
    Node,
    NodeArena,
    NodeId,
  },
  transaction::{
    AnnotationBias,
    AnnotationMethod,
    Operation,
    Transaction,
  },
};

pub type Result<T> = std::result::Result<T, DocumentError>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DocumentError {
  #[error("range {from}..{to} is out of bounds for document length {len}")]
  RangeOutOfBounds {
    from: usize,
    to:   usize,
    len:  usize,
  },
  #[error("no selectable nodes in range {from}..{to}")]
  EmptySelection { from: usize, to: usize },
  #[error("unbalanced markers at offset {offset}: found {found:?}, expected {expected:?}")]
  UnbalancedMarkers {
    offset:   usize,
    found:    Option<TypeName>,
    expected: Option<TypeName>,
  },
  #[error("transaction length mismatch: built against length {expected}, document has {actual}")]
  LengthMismatch { expected: usize, actual: usize },
  #[error("stale transaction: replace payload does not match document at offset {offset}")]
  StaleData { offset: usize },
  #[error("attribute change target at offset {offset} is not an opening marker")]
  InvalidAttributeTarget { offset: usize },
  #[error(transparent)]
  Factory(#[from] FactoryError),
  #[error(transparent)]
  History(#[from] HistoryError),
}

/// Which nodes `select_nodes` reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
  /// Only leaf nodes touched by the range.
  Leaves,
  /// The minimal covering set: the largest fully-covered ancestors, with
  /// partially-covered nodes broken down to their touched children.
  Covered,
}

/// One node touched by a `select_nodes` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedNode {
  pub node:             NodeId,
  /// The node's content range in the current data.
  pub node_range:       Range,
  /// The node's outer range (markers included).
  pub node_outer_range: Range,
  /// Sub-span actually covered, when coverage is partial. `None` means the
  /// whole node is selected.
  pub range:            Option<Range>,
}

impl SelectedNode {
  #[inline]
  pub fn is_fully_covered(&self) -> bool {
    self.range.is_none()
  }
}

#[derive(Debug)]
pub struct Document {
  data:    Vec<Item>,
  arena:   NodeArena,
  root:    NodeId,
  factory: NodeFactory,
  history: History,
}

impl Document {
  pub fn new(data: Vec<Item>, factory: NodeFactory) -> Result<Self> {
    let (arena, root) = build_tree(&data, &factory)?;
    Ok(Self {
      data,
      arena,
      root,
      factory,
      history: History::default(),
    })
  }

  /// Document using the stock node vocabulary.
  pub fn with_defaults(data: Vec<Item>) -> Result<Self> {
    Self::new(data, NodeFactory::with_default_types())
  }

  /// The linear data. Mutation goes through [`Document::commit`].
  pub fn data(&self) -> &[Item] {
    &self.data
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.data.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  pub fn factory(&self) -> &NodeFactory {
    &self.factory
  }

  pub fn arena(&self) -> &NodeArena {
    &self.arena
  }

  pub fn root(&self) -> NodeId {
    self.root
  }

  pub fn node(&self, id: NodeId) -> &Node {
    &self.arena[id]
  }

  pub fn history(&self) -> &History {
    &self.history
  }

  /// True if the content item at `offset` carries an annotation equal to
  /// `annotation` (by value, not identity).
  pub fn offset_contains_annotation(&self, offset: usize, annotation: &Annotation) -> bool {
    self
      .data
      .get(offset)
      .and_then(Item::annotations)
      .is_some_and(|set| set.contains(annotation))
  }

  /// Maps a linear range onto the tree nodes it touches.
  ///
  /// Boundaries are exclusive at node edges: a query boundary sitting
  /// exactly on a node boundary excludes that node on that side. Fully
  /// covered entries carry no sub-`range`; partially covered entries report
  /// the covered sub-span, clipped to the node's content.
  ///
  /// An empty result is only returned for a genuinely empty range touching
  /// no content; a non-empty range selecting nothing is an error.
  pub fn select_nodes(&self, range: Range, mode: SelectMode) -> Result<Vec<SelectedNode>> {
    let range = range.normalize();
    if range.end() > self.data.len() {
      return Err(DocumentError::RangeOutOfBounds {
        from: range.start(),
        to:   range.end(),
        len:  self.data.len(),
      });
    }

    let mut out = Vec::new();
    self.select_into(self.root, range, mode, &mut out);

    if out.is_empty() && !range.is_empty() {
      return Err(DocumentError::EmptySelection {
        from: range.start(),
        to:   range.end(),
      });
    }
    Ok(out)
  }

  fn select_into(&self, parent: NodeId, range: Range, mode: SelectMode, out: &mut Vec<SelectedNode>) {
    for &child in &self.arena[parent].children {
      let node = &self.arena[child];
      let outer = node.outer;

      // Exclusive at node edges: a boundary exactly on the node boundary
      // leaves the node untouched on that side.
      if range.end() <= outer.start() || range.start() >= outer.end() {
        continue;
      }

      let fully = range.start() <= outer.start() && range.end() >= outer.end();
      let entry = |sub: Option<Range>| SelectedNode {
        node:             child,
        node_range:       node.inner,
        node_outer_range: node.outer,
        range:            sub,
      };

      match mode {
        SelectMode::Covered => {
          if fully {
            out.push(entry(None));
          } else if node.is_leaf() {
            let sub = range.intersect(&node.inner).unwrap_or(Range::point(node.inner.start()));
            out.push(entry(Some(sub)));
          } else {
            self.select_into(child, range, mode, out);
          }
        },
        SelectMode::Leaves => {
          if node.is_leaf() {
            let sub = if fully {
              None
            } else {
              Some(range.intersect(&node.inner).unwrap_or(Range::point(node.inner.start())))
            };
            out.push(entry(sub));
          } else {
            self.select_into(child, range, mode, out);
          }
        },
      }
    }
  }

  /// Adjusts `data` so it can be legally inserted at `offset`: bare content
  /// runs headed for a structural position get wrapped in a paragraph.
  /// Element items are passed through untouched.
  pub fn fixup_insertion(&self, data: Vec<Item>, offset: usize) -> Result<Vec<Item>> {
    if offset > self.data.len() {
      return Err(DocumentError::RangeOutOfBounds {
        from: offset,
        to:   offset,
        len:  self.data.len(),
      });
    }

    let target = self.branch_at(offset);
    let descriptor = self.factory.descriptor(&self.arena[target].type_name)?;
    if descriptor.can_contain_content {
      return Ok(data);
    }

    // Wrap maximal top-level content runs; nested content is already inside
    // an element the candidate data brought along.
    let mut out = Vec::with_capacity(data.len() + 2);
    let mut depth = 0usize;
    let mut wrapping = false;
    for item in data {
      match &item {
        Item::Content(_) if depth == 0 => {
          if !wrapping {
            out.push(Item::open("paragraph"));
            wrapping = true;
          }
          out.push(item);
        },
        Item::Open(_) => {
          if wrapping {
            out.push(Item::close("paragraph"));
            wrapping = false;
          }
          depth += 1;
          out.push(item);
        },
        Item::Close(_) => {
          depth = depth.saturating_sub(1);
          out.push(item);
        },
        Item::Content(_) => out.push(item),
      }
    }
    if wrapping {
      out.push(Item::close("paragraph"));
    }
    Ok(out)
  }

  /// Deepest branch node whose content span holds `offset`.
  fn branch_at(&self, offset: usize) -> NodeId {
    let mut current = self.root;
    'descend: loop {
      for &child in &self.arena[current].children {
        let node = &self.arena[child];
        if !node.is_wrapped() {
          continue;
        }
        if node.outer.start() < offset && offset < node.outer.end() {
          let content = self
            .factory
            .descriptor(&node.type_name)
            .map(|d| d.is_content)
            .unwrap_or(false);
          if content {
            // Atomic inline elements have no insertable interior.
            return current;
          }
          current = child;
          continue 'descend;
        }
      }
      return current;
    }
  }

  /// Applies a transaction to the document it was built against.
  ///
  /// The data is replaced and the tree rebuilt; on any error the document is
  /// left untouched. A replace payload that no longer matches the data means
  /// the transaction was built against stale state.
  pub fn commit(&mut self, transaction: &Transaction) -> Result<()> {
    let new_data = self.apply_operations(transaction)?;
    let (arena, root) = build_tree(&new_data, &self.factory)?;

    tracing::debug!(
      ops = transaction.operations().len(),
      len_before = self.data.len(),
      len_after = new_data.len(),
      "commit transaction"
    );

    self.data = new_data;
    self.arena = arena;
    self.root = root;
    self.history.commit_revision(transaction);
    Ok(())
  }

  /// Reverts the most recent committed revision. Returns false at the root.
  pub fn undo(&mut self) -> Result<bool> {
    let Some(jump) = self.history.undo() else {
      return Ok(false);
    };
    self.apply_without_history(&jump.transaction)?;
    self.history.apply_jump(&jump)?;
    Ok(true)
  }

  /// Re-applies the revision undone last. Returns false if there is none.
  pub fn redo(&mut self) -> Result<bool> {
    let Some(jump) = self.history.redo() else {
      return Ok(false);
    };
    self.apply_without_history(&jump.transaction)?;
    self.history.apply_jump(&jump)?;
    Ok(true)
  }

  fn apply_without_history(&mut self, transaction: &Transaction) -> Result<()> {
    let new_data = self.apply_operations(transaction)?;
    let (arena, root) = build_tree(&new_data, &self.factory)?;
    self.data = new_data;
    self.arena = arena;
    self.root = root;
    Ok(())
  }

  fn apply_operations(&self, transaction: &Transaction) -> Result<Vec<Item>> {
    let expected = transaction.covered_length();
    if expected != self.data.len() {
      return Err(DocumentError::LengthMismatch {
        expected,
        actual: self.data.len(),
      });
    }

    let capacity = self
      .data
      .len()
      .saturating_add_signed(transaction.length_difference());
    let mut out: Vec<Item> = Vec::with_capacity(capacity);
    let mut cursor = 0usize;
    // Annotations currently being applied/cleared over retained content.
    let mut active_set: Vec<&Annotation> = Vec::new();
    let mut active_clear: Vec<&Annotation> = Vec::new();
    // Attribute changes recorded against old-data offsets, applied when the
    // marker is copied across.
    let mut attr_changes: Vec<(usize, &Operation)> = Vec::new();

    for op in transaction.operations() {
      match op {
        Operation::Retain(n) => {
          for offset in cursor..cursor + n {
            out.push(self.transform_item(offset, &active_set, &active_clear, &attr_changes));
          }
          cursor += n;
        },
        Operation::Replace { remove, insert } => {
          let end = cursor + remove.len();
          if self.data[cursor..end] != remove[..] {
            return Err(DocumentError::StaleData { offset: cursor });
          }
          for item in insert {
            out.push(annotate_item(item.clone(), &active_set, &active_clear));
          }
          cursor = end;
        },
        Operation::AttributeChange { .. } => {
          if !matches!(self.data.get(cursor), Some(Item::Open(_))) {
            return Err(DocumentError::InvalidAttributeTarget { offset: cursor });
          }
          attr_changes.push((cursor, op));
        },
        Operation::Annotate {
          method,
          bias,
          annotation,
        } => {
          let active = match method {
            AnnotationMethod::Set => &mut active_set,
            AnnotationMethod::Clear => &mut active_clear,
          };
          match bias {
            AnnotationBias::Start => active.push(annotation),
            AnnotationBias::Stop => {
              if let Some(i) = active.iter().rposition(|a| *a == annotation) {
                active.remove(i);
              }
            },
          }
        },
      }
    }

    debug_assert_eq!(cursor, self.data.len());
    Ok(out)
  }

  fn transform_item(
    &self,
    offset: usize,
    active_set: &[&Annotation],
    active_clear: &[&Annotation],
    attr_changes: &[(usize, &Operation)],
  ) -> Item {
    match self.data[offset].clone() {
      Item::Open(mut element) => {
        for (_, op) in attr_changes.iter().filter(|(at, _)| *at == offset) {
          if let Operation::AttributeChange { key, to, .. } = op {
            match to {
              Some(value) => {
                element.attributes.insert(key.clone(), value.clone());
              },
              None => {
                element.attributes.shift_remove(key.as_str());
              },
            }
          }
        }
        Item::Open(element)
      },
      item @ Item::Content(_) => annotate_item(item, active_set, active_clear),
      item => item,
    }
  }
}

fn annotate_item(mut item: Item, active_set: &[&Annotation], active_clear: &[&Annotation]) -> Item {
  if let Item::Content(content) = &mut item {
    for annotation in active_set {
      content.annotations.insert((*annotation).clone());
    }
    for annotation in active_clear {
      content.annotations.remove(annotation);
    }
  }
  item
}

/// Builds the node tree for `data`. The data must be stack-balanced and use
/// only registered types (content runs become `text` nodes).
fn build_tree(data: &[Item], factory: &NodeFactory) -> Result<(NodeArena, NodeId)> {
  let mut arena = NodeArena::default();
  let root = arena.insert(Node {
    type_name: "document".into(),
    outer:     Range::new(0, data.len()),
    inner:     Range::new(0, data.len()),
    parent:    None,
    children:  Vec::new(),
  });

  let mut stack: Vec<NodeId> = vec![root];
  let mut run_start: Option<usize> = None;

  let flush_run = |arena: &mut NodeArena,
                   stack: &[NodeId],
                   run_start: &mut Option<usize>,
                   end: usize|
   -> Result<()> {
    let Some(start) = run_start.take() else {
      return Ok(());
    };
    if !factory.is_registered("text") {
      return Err(
        FactoryError::UnregisteredType {
          name: "text".into(),
        }
        .into(),
      );
    }
    let parent = *stack.last().expect("tree stack holds at least the root");
    let id = arena.insert(Node {
      type_name: "text".into(),
      outer:     Range::new(start, end),
      inner:     Range::new(start, end),
      parent:    Some(parent),
      children:  Vec::new(),
    });
    arena[parent].children.push(id);
    Ok(())
  };

  for (offset, item) in data.iter().enumerate() {
    match item {
      Item::Open(element) => {
        flush_run(&mut arena, &stack, &mut run_start, offset)?;
        if !factory.is_registered(&element.name) {
          return Err(
            FactoryError::UnregisteredType {
              name: element.name.clone(),
            }
            .into(),
          );
        }
        let parent = *stack.last().expect("tree stack holds at least the root");
        let id = arena.insert(Node {
          type_name: element.name.clone(),
          outer:     Range::new(offset, offset + 1),
          inner:     Range::new(offset + 1, offset + 1),
          parent:    Some(parent),
          children:  Vec::new(),
        });
        arena[parent].children.push(id);
        stack.push(id);
      },
      Item::Close(name) => {
        flush_run(&mut arena, &stack, &mut run_start, offset)?;
        if stack.len() == 1 {
          return Err(DocumentError::UnbalancedMarkers {
            offset,
            found: Some(name.clone()),
            expected: None,
          });
        }
        let id = stack.pop().expect("stack length checked above");
        if arena[id].type_name != *name {
          return Err(DocumentError::UnbalancedMarkers {
            offset,
            found: Some(name.clone()),
            expected: Some(arena[id].type_name.clone()),
          });
        }
        arena[id].inner.to = offset;
        arena[id].outer.to = offset + 1;
      },
      Item::Content(_) => {
        if run_start.is_none() {
          run_start = Some(offset);
        }
      },
    }
  }

  flush_run(&mut arena, &stack, &mut run_start, data.len())?;
  if stack.len() > 1 {
    let unclosed = stack.pop().expect("stack length checked above");
    return Err(DocumentError::UnbalancedMarkers {
      offset:   data.len(),
      found:    None,
      expected: Some(arena[unclosed].type_name.clone()),
    });
  }

  Ok((arena, root))
}

#[cfg(test)]
mod test {
  use tome_core::{
    attributes::{
      AttributeValue,
      Attributes,
    },
    item,
  };

  use super::*;
  use crate::transaction::Transaction;

  /// <paragraph>abc</paragraph><paragraph>def</paragraph>
  fn two_paragraphs() -> Document {
    let mut data = vec![Item::open("paragraph")];
    data.extend(item::content_run("abc"));
    data.push(Item::close("paragraph"));
    data.push(Item::open("paragraph"));
    data.extend(item::content_run("def"));
    data.push(Item::close("paragraph"));
    Document::with_defaults(data).unwrap()
  }

  /// <list><listItem>ab</listItem><listItem>cd</listItem></list>
  fn two_list_items() -> Document {
    let mut data = vec![Item::open("list"), Item::open("listItem")];
    data.extend(item::content_run("ab"));
    data.push(Item::close("listItem"));
    data.push(Item::open("listItem"));
    data.extend(item::content_run("cd"));
    data.push(Item::close("listItem"));
    data.push(Item::close("list"));
    Document::with_defaults(data).unwrap()
  }

  #[test]
  fn builds_tree_from_linear_data() {
    let doc = two_paragraphs();
    let root = doc.node(doc.root());
    assert_eq!(root.children.len(), 2);

    let first = doc.node(root.children[0]);
    assert_eq!(first.type_name, "paragraph");
    assert_eq!(first.outer, Range::new(0, 5));
    assert_eq!(first.inner, Range::new(1, 4));
    assert_eq!(first.children.len(), 1);

    let text = doc.node(first.children[0]);
    assert_eq!(text.type_name, "text");
    assert_eq!(text.outer, Range::new(1, 4));
    assert!(!text.is_wrapped());
    assert_eq!(text.parent, Some(root.children[0]));
  }

  #[test]
  fn rejects_unbalanced_markers() {
    let data = vec![Item::open("paragraph"), Item::content('a')];
    let err = Document::with_defaults(data).unwrap_err();
    assert!(matches!(err, DocumentError::UnbalancedMarkers { .. }));

    let data = vec![Item::open("paragraph"), Item::close("heading")];
    let err = Document::with_defaults(data).unwrap_err();
    assert!(matches!(err, DocumentError::UnbalancedMarkers { .. }));

    let data = vec![Item::close("paragraph")];
    let err = Document::with_defaults(data).unwrap_err();
    assert!(matches!(err, DocumentError::UnbalancedMarkers { offset: 0, .. }));
  }

  #[test]
  fn rejects_unregistered_types() {
    let data = vec![Item::open("mystery"), Item::close("mystery")];
    let err = Document::with_defaults(data).unwrap_err();
    assert!(matches!(
      err,
      DocumentError::Factory(FactoryError::UnregisteredType { .. })
    ));
  }

  #[test]
  fn select_leaves_reports_partial_coverage() {
    let doc = two_paragraphs();
    // "bc" in the first paragraph through "d" in the second.
    let selected = doc
      .select_nodes(Range::new(2, 7), SelectMode::Leaves)
      .unwrap();

    assert_eq!(selected.len(), 2);
    assert_eq!(selected[0].range, Some(Range::new(2, 4)));
    assert_eq!(selected[0].node_range, Range::new(1, 4));
    assert_eq!(selected[1].range, Some(Range::new(6, 7)));
  }

  #[test]
  fn select_covered_prefers_whole_ancestors() {
    let doc = two_paragraphs();
    // First paragraph fully, second partially.
    let selected = doc
      .select_nodes(Range::new(0, 7), SelectMode::Covered)
      .unwrap();

    assert_eq!(selected.len(), 2);
    assert!(selected[0].is_fully_covered());
    assert_eq!(selected[0].node_outer_range, Range::new(0, 5));
    assert_eq!(selected[1].range, Some(Range::new(6, 7)));
  }

  #[test]
  fn select_covered_descends_into_partial_branches() {
    let doc = two_list_items();
    // Whole first item, "c" of the second.
    let selected = doc
      .select_nodes(Range::new(1, 7), SelectMode::Covered)
      .unwrap();

    assert_eq!(selected.len(), 2);
    assert!(selected[0].is_fully_covered());
    assert_eq!(selected[0].node_outer_range, Range::new(1, 5));
    assert_eq!(selected[1].range, Some(Range::new(6, 7)));
  }

  #[test]
  fn boundaries_are_exclusive_at_node_edges() {
    let doc = two_paragraphs();
    // Ends exactly where the second paragraph starts: only the first is
    // touched.
    let selected = doc
      .select_nodes(Range::new(0, 5), SelectMode::Covered)
      .unwrap();
    assert_eq!(selected.len(), 1);
    assert!(selected[0].is_fully_covered());
  }

  #[test]
  fn empty_range_inside_content_selects_the_leaf() {
    let doc = two_paragraphs();
    let selected = doc
      .select_nodes(Range::point(2), SelectMode::Leaves)
      .unwrap();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].range, Some(Range::new(2, 2)));
  }

  #[test]
  fn backwards_ranges_are_normalized() {
    let doc = two_paragraphs();
    let forward = doc.select_nodes(Range::new(2, 7), SelectMode::Leaves).unwrap();
    let backwards = doc.select_nodes(Range::new(7, 2), SelectMode::Leaves).unwrap();
    assert_eq!(forward, backwards);
  }

  #[test]
  fn out_of_bounds_range_is_an_error() {
    let doc = two_paragraphs();
    let err = doc
      .select_nodes(Range::new(0, 99), SelectMode::Leaves)
      .unwrap_err();
    assert!(matches!(err, DocumentError::RangeOutOfBounds { len: 10, .. }));
  }

  #[test]
  fn fixup_wraps_bare_content_at_structural_offsets() {
    let doc = two_paragraphs();
    // Offset 5 sits between the paragraphs, directly in the document.
    let fixed = doc.fixup_insertion(item::content_run("hi"), 5).unwrap();

    assert_eq!(fixed.len(), 4);
    assert_eq!(fixed[0], Item::open("paragraph"));
    assert_eq!(fixed[3], Item::close("paragraph"));
  }

  #[test]
  fn fixup_keeps_content_bound_for_content_branches() {
    let doc = two_paragraphs();
    let candidate = item::content_run("hi");
    let fixed = doc.fixup_insertion(candidate.clone(), 2).unwrap();
    assert_eq!(fixed, candidate);
  }

  #[test]
  fn fixup_leaves_elements_alone() {
    let doc = two_paragraphs();
    let mut candidate = vec![Item::open("paragraph")];
    candidate.extend(item::content_run("x"));
    candidate.push(Item::close("paragraph"));

    let fixed = doc.fixup_insertion(candidate.clone(), 5).unwrap();
    assert_eq!(fixed, candidate);
  }

  #[test]
  fn offset_annotation_queries_are_by_value() {
    let bold = Annotation::new("bold");
    let mut data = vec![Item::open("paragraph")];
    data.extend(item::annotated_run("a", &bold));
    data.extend(item::content_run("b"));
    data.push(Item::close("paragraph"));
    let doc = Document::with_defaults(data).unwrap();

    assert!(doc.offset_contains_annotation(1, &Annotation::new("bold")));
    assert!(!doc.offset_contains_annotation(2, &bold));
    // Markers carry no annotations.
    assert!(!doc.offset_contains_annotation(0, &bold));
  }

  #[test]
  fn commit_applies_and_rebuilds_the_tree() {
    let mut doc = two_paragraphs();
    let tx = Transaction::new_from_insertion(&doc, 2, item::content_run("xy")).unwrap();
    doc.commit(&tx).unwrap();

    assert_eq!(doc.len(), 12);
    assert_eq!(doc.data()[2], Item::content('x'));
    let first = doc.node(doc.node(doc.root()).children[0]);
    assert_eq!(first.inner, Range::new(1, 6));
  }

  #[test]
  fn commit_rejects_stale_transactions() {
    let mut doc = two_paragraphs();
    let tx = Transaction::new_from_removal(&doc, Range::new(1, 3)).unwrap();

    // Mutate the document out from under the transaction.
    let other = Transaction::new_from_removal(&doc, Range::new(1, 2)).unwrap();
    doc.commit(&other).unwrap();

    let err = doc.commit(&tx).unwrap_err();
    assert!(matches!(err, DocumentError::LengthMismatch { .. }));
  }

  #[test]
  fn commit_rejects_mismatched_replace_payloads() {
    let mut doc = two_paragraphs();
    let mut tx = Transaction::new();
    tx.push_retain(1);
    tx.push_replace(item::content_run("zzz"), Vec::new());
    tx.push_retain(6);

    let err = doc.commit(&tx).unwrap_err();
    assert!(matches!(err, DocumentError::StaleData { offset: 1 }));
    // The document is untouched.
    assert_eq!(doc.len(), 10);
  }

  #[test]
  fn commit_then_inverted_commit_round_trips() {
    let mut doc = two_paragraphs();
    let original = doc.data().to_vec();

    let tx = Transaction::new_from_removal(&doc, Range::new(2, 7)).unwrap();
    doc.commit(&tx).unwrap();
    assert_ne!(doc.data(), &original[..]);

    doc.commit(&tx.invert()).unwrap();
    assert_eq!(doc.data(), &original[..]);
  }

  #[test]
  fn commit_applies_attribute_changes() {
    let mut doc = two_paragraphs();
    let tx = Transaction::new_from_attribute_change(
      &doc,
      0,
      "align".into(),
      Some(AttributeValue::from("center")),
    )
    .unwrap();
    doc.commit(&tx).unwrap();

    let element = doc.data()[0].as_element().unwrap();
    assert_eq!(
      element.attributes.get("align"),
      Some(&AttributeValue::from("center"))
    );

    // Inverting removes the attribute again.
    doc.commit(&tx.invert()).unwrap();
    let element = doc.data()[0].as_element().unwrap();
    assert!(element.attributes.is_empty());
  }

  #[test]
  fn commit_applies_annotation_spans() {
    let mut doc = two_paragraphs();
    let bold = Annotation::new("bold");
    let tx = Transaction::new_from_annotation(
      &doc,
      Range::new(1, 4),
      AnnotationMethod::Set,
      bold.clone(),
    )
    .unwrap();
    doc.commit(&tx).unwrap();

    assert!(doc.offset_contains_annotation(1, &bold));
    assert!(doc.offset_contains_annotation(3, &bold));
    assert!(!doc.offset_contains_annotation(6, &bold));

    doc.commit(&tx.invert()).unwrap();
    assert!(!doc.offset_contains_annotation(1, &bold));
  }

  #[test]
  fn undo_redo_round_trips() {
    let mut doc = two_paragraphs();
    let original = doc.data().to_vec();

    let tx = Transaction::new_from_insertion(&doc, 2, item::content_run("!")).unwrap();
    doc.commit(&tx).unwrap();
    let edited = doc.data().to_vec();

    assert!(doc.undo().unwrap());
    assert_eq!(doc.data(), &original[..]);

    assert!(doc.redo().unwrap());
    assert_eq!(doc.data(), &edited[..]);

    // Nothing left to redo.
    assert!(!doc.redo().unwrap());
  }

  #[test]
  fn undo_at_root_is_a_no_op() {
    let mut doc = two_paragraphs();
    assert!(!doc.undo().unwrap());
  }

  #[test]
  fn conversion_survives_commit() {
    let mut doc = two_paragraphs();
    let mut attrs = Attributes::new();
    attrs.insert("level".into(), AttributeValue::from(2));

    let tx = Transaction::new_from_content_branch_conversion(
      &doc,
      Range::new(1, 9),
      "heading".into(),
      attrs.clone(),
    )
    .unwrap();
    doc.commit(&tx).unwrap();

    assert_eq!(doc.data()[0], Item::open_with("heading", attrs.clone()));
    assert_eq!(doc.data()[4], Item::close("heading"));
    assert_eq!(doc.data()[5], Item::open_with("heading", attrs));

    let root = doc.node(doc.root());
    assert_eq!(doc.node(root.children[0]).type_name, "heading");
  }
}
