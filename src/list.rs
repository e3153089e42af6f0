//! Index-linked list arena.
//!
//! A fixed number of nodes and list heads share one link table, so moving a
//! node between lists never allocates. Each link records the list that owns it,
//! which turns "insert an already-linked node" and "remove a node from a list it
//! is not on" into checked errors instead of pointer corruption.

use std::num::NonZeroUsize;

const NIL: u32 = u32::MAX;

/// Identifies one list head inside an [`IndexList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListId(pub usize);

/// Errors from list surgery. All of them leave the arena untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ListError {
    /// Node or list index outside the arena.
    #[error("index out of range")]
    OutOfRange,
    /// The node already belongs to a list; remove it first.
    #[error("node {0} is already linked")]
    AlreadyLinked(usize),
    /// The node (or anchor) is not on the expected list.
    #[error("node {0} is not on the expected list")]
    NotOnList(usize),
}

#[derive(Debug, Clone, Copy)]
struct Link {
    prev: u32,
    next: u32,
    owner: Option<ListId>,
}

impl Link {
    const UNLINKED: Link = Link {
        prev: NIL,
        next: NIL,
        owner: None,
    };
}

/// Doubly linked lists of node indices with embedded, ownership-tagged links.
#[derive(Debug, Clone)]
pub struct IndexList {
    links: Vec<Link>,
    lens: Vec<usize>,
    nodes: usize,
}

impl IndexList {
    /// Create `nodes` unlinked nodes and `lists` empty lists.
    pub fn new(nodes: usize, lists: usize) -> Self {
        let mut links = vec![Link::UNLINKED; nodes + lists];
        for l in 0..lists {
            let raw = (nodes + l) as u32;
            links[nodes + l] = Link {
                prev: raw,
                next: raw,
                owner: Some(ListId(l)),
            };
        }
        Self {
            links,
            lens: vec![0; lists],
            nodes,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes
    }

    pub fn list_count(&self) -> usize {
        self.lens.len()
    }

    /// The list currently holding `node`, if any.
    pub fn owner(&self, node: usize) -> Option<ListId> {
        if node < self.nodes {
            self.links[node].owner
        } else {
            None
        }
    }

    pub fn is_linked(&self, node: usize) -> bool {
        self.owner(node).is_some()
    }

    pub fn len(&self, list: ListId) -> usize {
        self.lens.get(list.0).copied().unwrap_or(0)
    }

    pub fn is_empty(&self, list: ListId) -> bool {
        self.len(list) == 0
    }

    pub fn first(&self, list: ListId) -> Option<usize> {
        let head = self.head(list).ok()?;
        self.as_node(self.links[head].next)
    }

    pub fn last(&self, list: ListId) -> Option<usize> {
        let head = self.head(list).ok()?;
        self.as_node(self.links[head].prev)
    }

    /// The node following `node` on its list.
    pub fn next(&self, node: usize) -> Option<usize> {
        if !self.is_linked(node) {
            return None;
        }
        self.as_node(self.links[node].next)
    }

    /// The node preceding `node` on its list.
    pub fn prev(&self, node: usize) -> Option<usize> {
        if !self.is_linked(node) {
            return None;
        }
        self.as_node(self.links[node].prev)
    }

    pub fn push_back(&mut self, list: ListId, node: usize) -> Result<(), ListError> {
        let head = self.head(list)?;
        self.check_unlinked(node)?;
        let prev = self.links[head].prev as usize;
        self.splice(prev, head, node, list);
        Ok(())
    }

    pub fn push_front(&mut self, list: ListId, node: usize) -> Result<(), ListError> {
        let head = self.head(list)?;
        self.check_unlinked(node)?;
        let next = self.links[head].next as usize;
        self.splice(head, next, node, list);
        Ok(())
    }

    /// Link `node` immediately before `anchor`, on the anchor's list.
    pub fn insert_before(&mut self, anchor: usize, node: usize) -> Result<(), ListError> {
        let list = self.owner(anchor).ok_or(ListError::NotOnList(anchor))?;
        self.check_unlinked(node)?;
        let prev = self.links[anchor].prev as usize;
        self.splice(prev, anchor, node, list);
        Ok(())
    }

    /// Link `node` immediately after `anchor`, on the anchor's list.
    pub fn insert_after(&mut self, anchor: usize, node: usize) -> Result<(), ListError> {
        let list = self.owner(anchor).ok_or(ListError::NotOnList(anchor))?;
        self.check_unlinked(node)?;
        let next = self.links[anchor].next as usize;
        self.splice(anchor, next, node, list);
        Ok(())
    }

    /// Unlink `node` from `list`, restoring it to the unlinked state.
    pub fn remove(&mut self, list: ListId, node: usize) -> Result<(), ListError> {
        self.head(list)?;
        if node >= self.nodes {
            return Err(ListError::OutOfRange);
        }
        if self.links[node].owner != Some(list) {
            return Err(ListError::NotOnList(node));
        }
        let Link { prev, next, .. } = self.links[node];
        self.links[prev as usize].next = next;
        self.links[next as usize].prev = prev;
        self.links[node] = Link::UNLINKED;
        self.lens[list.0] -= 1;
        Ok(())
    }

    /// 1-based position of `node` on `list`, found by walking from the head.
    pub fn position(&self, list: ListId, node: usize) -> Option<NonZeroUsize> {
        if !self.is_linked(node) {
            return None;
        }
        self.iter(list)
            .position(|n| n == node)
            .and_then(|p| NonZeroUsize::new(p + 1))
    }

    /// Walk `list` from head to tail.
    pub fn iter(&self, list: ListId) -> Iter<'_> {
        Iter {
            arena: self,
            cursor: self.first(list),
        }
    }

    fn head(&self, list: ListId) -> Result<usize, ListError> {
        if list.0 < self.lens.len() {
            Ok(self.nodes + list.0)
        } else {
            Err(ListError::OutOfRange)
        }
    }

    fn check_unlinked(&self, node: usize) -> Result<(), ListError> {
        if node >= self.nodes {
            return Err(ListError::OutOfRange);
        }
        if self.links[node].owner.is_some() {
            return Err(ListError::AlreadyLinked(node));
        }
        Ok(())
    }

    fn as_node(&self, raw: u32) -> Option<usize> {
        let raw = raw as usize;
        (raw < self.nodes).then_some(raw)
    }

    fn splice(&mut self, prev: usize, next: usize, node: usize, list: ListId) {
        self.links[node] = Link {
            prev: prev as u32,
            next: next as u32,
            owner: Some(list),
        };
        self.links[prev].next = node as u32;
        self.links[next].prev = node as u32;
        self.lens[list.0] += 1;
    }
}

/// Head-to-tail iterator over one list.
#[derive(Debug)]
pub struct Iter<'a> {
    arena: &'a IndexList,
    cursor: Option<usize>,
}

impl Iterator for Iter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let node = self.cursor?;
        self.cursor = self.arena.next(node);
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const A: ListId = ListId(0);
    const B: ListId = ListId(1);

    fn collect(l: &IndexList, id: ListId) -> Vec<usize> {
        l.iter(id).collect()
    }

    #[test]
    fn new_lists_are_empty_and_nodes_unlinked() {
        let l = IndexList::new(4, 2);
        assert!(l.is_empty(A));
        assert!(l.is_empty(B));
        assert_eq!(l.first(A), None);
        assert!((0..4).all(|n| !l.is_linked(n)));
    }

    #[test]
    fn insert_before_after_and_ends() {
        let mut l = IndexList::new(5, 1);
        l.push_back(A, 1).unwrap();
        l.push_front(A, 0).unwrap();
        l.push_back(A, 4).unwrap();
        l.insert_before(4, 3).unwrap();
        l.insert_after(1, 2).unwrap();
        assert_eq!(collect(&l, A), vec![0, 1, 2, 3, 4]);
        assert_eq!(l.last(A), Some(4));
        assert_eq!(l.prev(2), Some(1));
        assert_eq!(l.next(4), None);
        assert_eq!(l.len(A), 5);
    }

    #[test]
    fn remove_restores_unlinked_state() {
        let mut l = IndexList::new(3, 1);
        for n in 0..3 {
            l.push_back(A, n).unwrap();
        }
        l.remove(A, 1).unwrap();
        assert!(!l.is_linked(1));
        assert_eq!(l.next(1), None);
        assert_eq!(collect(&l, A), vec![0, 2]);
        // Relinking after removal is fine.
        l.push_front(A, 1).unwrap();
        assert_eq!(collect(&l, A), vec![1, 0, 2]);
    }

    #[test]
    fn double_link_and_foreign_remove_are_rejected() {
        let mut l = IndexList::new(2, 2);
        l.push_back(A, 0).unwrap();
        assert_eq!(l.push_back(B, 0), Err(ListError::AlreadyLinked(0)));
        assert_eq!(l.remove(B, 0), Err(ListError::NotOnList(0)));
        assert_eq!(l.remove(A, 1), Err(ListError::NotOnList(1)));
        assert_eq!(l.insert_after(1, 0), Err(ListError::NotOnList(1)));
        assert_eq!(l.push_back(ListId(7), 1), Err(ListError::OutOfRange));
        assert_eq!(l.push_back(A, 9), Err(ListError::OutOfRange));
        // Nothing moved.
        assert_eq!(collect(&l, A), vec![0]);
        assert!(l.is_empty(B));
    }

    #[test]
    fn position_is_one_based() {
        let mut l = IndexList::new(3, 2);
        l.push_back(A, 2).unwrap();
        l.push_back(A, 0).unwrap();
        assert_eq!(l.position(A, 0).map(NonZeroUsize::get), Some(2));
        assert_eq!(l.position(A, 2).map(NonZeroUsize::get), Some(1));
        assert_eq!(l.position(A, 1), None);
        assert_eq!(l.position(B, 0), None);
    }

    proptest! {
        #[test]
        fn every_node_sits_on_at_most_one_list(
            ops in proptest::collection::vec((0..3usize, 0..6usize, 0..3usize), 0..64)
        ) {
            let mut l = IndexList::new(6, 3);
            for (op, node, list) in ops {
                let list = ListId(list);
                let _ = match op {
                    0 => l.push_back(list, node),
                    1 => l.push_front(list, node),
                    _ => l.remove(list, node),
                };
            }
            let mut seen = [0usize; 6];
            for id in 0..3 {
                let nodes = collect(&l, ListId(id));
                prop_assert_eq!(nodes.len(), l.len(ListId(id)));
                for n in nodes {
                    prop_assert_eq!(l.owner(n), Some(ListId(id)));
                    seen[n] += 1;
                }
            }
            for n in 0..6 {
                prop_assert_eq!(seen[n], usize::from(l.is_linked(n)));
            }
        }
    }
}
