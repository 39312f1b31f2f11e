//! Revision history as a tree of committed transactions.
//!
//! Every commit appends a revision pointing at its parent; undoing and then
//! committing something new starts a fresh branch rather than discarding the
//! old one. Redo follows `last_child`, the most recently taken branch.
//!
//! The history never applies anything itself. [`History::undo`] and
//! [`History::redo`] hand back a [`HistoryJump`] describing the transaction
//! to apply and the revision to land on; the caller applies it and then
//! confirms with [`History::apply_jump`]. A failed application leaves the
//! history where it was.

use thiserror::Error;

use crate::transaction::Transaction;

pub type Result<T> = std::result::Result<T, HistoryError>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HistoryError {
  #[error("revision {revision} is out of bounds, history holds {len}")]
  RevisionOutOfBounds { revision: usize, len: usize },
}

#[derive(Debug)]
struct Revision {
  parent:      usize,
  last_child:  Option<usize>,
  transaction: Transaction,
  inversion:   Transaction,
}

/// A pending move to another revision.
#[derive(Debug, Clone)]
pub struct HistoryJump {
  /// Transaction taking the document to `target`.
  pub transaction: Transaction,
  pub target:      usize,
}

#[derive(Debug)]
pub struct History {
  revisions: Vec<Revision>,
  current:   usize,
}

impl Default for History {
  fn default() -> Self {
    Self {
      revisions: vec![Revision {
        parent:      0,
        last_child:  None,
        transaction: Transaction::new(),
        inversion:   Transaction::new(),
      }],
      current:   0,
    }
  }
}

impl History {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of revisions, the root included.
  pub fn len(&self) -> usize {
    self.revisions.len()
  }

  pub fn is_empty(&self) -> bool {
    false
  }

  pub fn current_revision(&self) -> usize {
    self.current
  }

  pub fn at_root(&self) -> bool {
    self.current == 0
  }

  /// Records a committed transaction as a child of the current revision and
  /// moves onto it.
  pub fn commit_revision(&mut self, transaction: &Transaction) {
    let revision = self.revisions.len();
    self.revisions.push(Revision {
      parent:      self.current,
      last_child:  None,
      transaction: transaction.clone(),
      inversion:   transaction.invert(),
    });
    self.revisions[self.current].last_child = Some(revision);
    self.current = revision;
    tracing::trace!(revision, "commit revision");
  }

  /// The jump undoing the current revision, if there is one.
  pub fn undo(&self) -> Option<HistoryJump> {
    if self.at_root() {
      return None;
    }
    let revision = &self.revisions[self.current];
    Some(HistoryJump {
      transaction: revision.inversion.clone(),
      target:      revision.parent,
    })
  }

  /// The jump re-applying the revision last undone from here, if any.
  pub fn redo(&self) -> Option<HistoryJump> {
    let child = self.revisions[self.current].last_child?;
    Some(HistoryJump {
      transaction: self.revisions[child].transaction.clone(),
      target:      child,
    })
  }

  /// Confirms a jump after its transaction has been applied.
  pub fn apply_jump(&mut self, jump: &HistoryJump) -> Result<()> {
    if jump.target >= self.revisions.len() {
      return Err(HistoryError::RevisionOutOfBounds {
        revision: jump.target,
        len:      self.revisions.len(),
      });
    }
    self.current = jump.target;
    Ok(())
  }
}
