//! Change notification sources for the streaming detector.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use crate::node::Node;
use crate::selector::Selector;

/// Summary of one batch of DOM mutations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationBatch {
    /// Nodes added to the tree
    pub added: usize,
    /// Nodes removed from the tree
    pub removed: usize,
}

impl MutationBatch {
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

/// A document the detector can watch.
pub trait ChangeSource: Send + Sync + 'static {
    /// Number of elements currently matching `selector`
    fn count_matching(&self, selector: &Selector) -> usize;

    /// Subscribe to mutation batches. Dropping the receiver unsubscribes.
    fn observe(&self) -> mpsc::UnboundedReceiver<MutationBatch>;
}

/// In-memory document that reports its own mutations to observers.
#[derive(Debug)]
pub struct LiveDocument {
    root: Mutex<Node>,
    observers: Mutex<Vec<mpsc::UnboundedSender<MutationBatch>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl LiveDocument {
    pub fn new(root: Node) -> Self {
        Self {
            root: Mutex::new(root),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Mutate the tree. Observers receive the nodes inserted and removed by
    /// `f` as one batch.
    ///
    /// Changes are found by comparing the tree before and after `f`. A node
    /// whose type, name, value or attributes changed counts as replaced, so
    /// swapping one button for another reports both the removal and the
    /// insertion.
    pub fn mutate<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Node) -> R,
    {
        let (result, batch) = {
            let mut root = lock(&self.root);
            let before = root.clone();
            let result = f(&mut root);
            let mut batch = MutationBatch::default();
            diff_subtree(&before, &root, &mut batch);
            (result, batch)
        };

        if !batch.is_empty() {
            self.notify(batch);
        }
        result
    }

    /// Deliver a batch to every live observer
    pub fn notify(&self, batch: MutationBatch) {
        lock(&self.observers).retain(|tx| tx.send(batch).is_ok());
    }

    /// Copy of the current tree
    pub fn snapshot(&self) -> Node {
        lock(&self.root).clone()
    }

    /// Number of subscribed observers that are still listening
    pub fn observer_count(&self) -> usize {
        lock(&self.observers)
            .iter()
            .filter(|tx| !tx.is_closed())
            .count()
    }
}

/// Same node apart from its children
fn same_shallow(a: &Node, b: &Node) -> bool {
    a.node_type == b.node_type
        && a.node_name == b.node_name
        && a.node_value == b.node_value
        && a.attributes == b.attributes
}

/// Accumulate the nodes inserted and removed between `before` and `after`.
///
/// Children are aligned on their common prefix and suffix; the unmatched
/// middle of each list is treated as removed and inserted.
fn diff_subtree(before: &Node, after: &Node, batch: &mut MutationBatch) {
    if !same_shallow(before, after) {
        batch.removed += before.subtree_size();
        batch.added += after.subtree_size();
        return;
    }

    let old: Vec<&Node> = before.children().collect();
    let new: Vec<&Node> = after.children().collect();
    let prefix = old
        .iter()
        .zip(&new)
        .take_while(|(a, b)| same_shallow(a, b))
        .count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| same_shallow(a, b))
        .count();

    let (old_mid, old_tail) = old[prefix..].split_at(old.len() - prefix - suffix);
    let (new_mid, new_tail) = new[prefix..].split_at(new.len() - prefix - suffix);

    for (a, b) in old[..prefix].iter().zip(&new[..prefix]) {
        diff_subtree(a, b, batch);
    }
    for (a, b) in old_tail.iter().zip(new_tail) {
        diff_subtree(a, b, batch);
    }
    batch.removed += old_mid.iter().map(|n| n.subtree_size()).sum::<usize>();
    batch.added += new_mid.iter().map(|n| n.subtree_size()).sum::<usize>();
}

impl ChangeSource for LiveDocument {
    fn count_matching(&self, selector: &Selector) -> usize {
        lock(&self.root).select(selector).len()
    }

    fn observe(&self) -> mpsc::UnboundedReceiver<MutationBatch> {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.observers).push(tx);
        rx
    }
}
