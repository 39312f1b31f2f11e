//! Arena node tree over the linear data.
//!
//! Nodes overlay the linear item sequence: each node records where its
//! markers and content sit in the current data. The tree never owns
//! structure: it is derived from the data and rebuilt whenever the data
//! changes, so parent links are arena keys rather than owning references and
//! can never dangle.
//!
//! A node is either a branch (a balanced open/close marker pair plus
//! children) or a leaf (a bare content run, or a wrapped childless element
//! such as an image). For unwrapped nodes `outer == inner`; for wrapped
//! nodes `inner` excludes the node's own markers.

use slotmap::SlotMap;
use tome_core::TypeName;

use crate::{
  factory::{
    NodeFactory,
    Result,
  },
  range::Range,
};

slotmap::new_key_type! {
  pub struct NodeId;
}

pub type NodeArena = SlotMap<NodeId, Node>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
  pub type_name: TypeName,
  /// Markers plus content in the current linear data.
  pub outer:     Range,
  /// Content only, excluding this node's own markers.
  pub inner:     Range,
  pub parent:    Option<NodeId>,
  pub children:  Vec<NodeId>,
}

impl Node {
  #[inline]
  #[must_use]
  pub fn is_wrapped(&self) -> bool {
    self.outer != self.inner
  }

  #[inline]
  #[must_use]
  pub fn is_leaf(&self) -> bool {
    self.children.is_empty()
  }

  /// Length of the content span.
  #[inline]
  pub fn len(&self) -> usize {
    self.inner.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.inner.is_empty()
  }
}

/// Type names from `id` up to the root, starting with `id`'s own type.
pub fn ancestor_type_path(arena: &NodeArena, id: NodeId) -> Vec<&TypeName> {
  let mut path = Vec::new();
  let mut current = Some(id);
  while let Some(node_id) = current {
    let node = &arena[node_id];
    path.push(&node.type_name);
    current = node.parent;
  }
  path
}

/// Merge-eligibility predicate for removal.
///
/// Two nodes can be merged when removing a span from inside one through
/// inside the other would leave a single well-formed node: their ancestor
/// type paths must be identical (same depth, same type at every level,
/// including their own), and the node type must hold inline content. Plain
/// type equality is not enough: two `listItem`s at different nesting depths
/// must not merge.
pub fn can_be_merged_with(
  arena: &NodeArena,
  factory: &NodeFactory,
  a: NodeId,
  b: NodeId,
) -> Result<bool> {
  if a == b {
    return Ok(false);
  }
  let node = &arena[a];
  if !factory.descriptor(&node.type_name)?.can_contain_content {
    return Ok(false);
  }
  Ok(ancestor_type_path(arena, a) == ancestor_type_path(arena, b))
}
