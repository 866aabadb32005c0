//! Arena-backed move tree.
//!
//! Nodes live in a slot vector and refer to their children by [`NodeId`].
//! Paths are resolved by walking child lists from the root, so a path stays
//! valid across edits that do not remove the node it addresses.

use tracing::debug;

use crate::annotation::Clocks;
use crate::move_id::MoveId;
use crate::node::{MoveNode, Node, NodeKind, RootNode};
use crate::path::Path;

/// Arena index of a node. Only meaningful for the tree that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub struct MoveTree {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
    root: NodeId,
}

impl MoveTree {
    pub fn new(root: RootNode) -> Self {
        let node = Node {
            kind: NodeKind::Root(root),
            path: Path::root(),
            children: Vec::new(),
        };
        Self {
            slots: vec![Some(node)],
            free: Vec::new(),
            root: NodeId(0),
        }
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn root(&self) -> &Node {
        self.get(self.root).expect("root slot is never freed")
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Number of live nodes, root included.
    pub fn node_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// True once any move hangs below the root.
    pub fn has_moves(&self) -> bool {
        !self.root().children.is_empty()
    }

    pub fn child_with_id(&self, parent: NodeId, id: MoveId) -> Option<NodeId> {
        self.get(parent)?
            .children
            .iter()
            .copied()
            .find(|&c| self.get(c).and_then(Node::id) == Some(id))
    }

    /// Resolve `path` relative to `from`: take the head identifier, descend
    /// into the matching child, recurse on the tail.
    pub fn resolve_from(&self, from: NodeId, path: &Path) -> Option<NodeId> {
        match path.head() {
            None => self.get(from).map(|_| from),
            Some(head) => self.resolve_from(self.child_with_id(from, head)?, &path.tail()),
        }
    }

    pub fn resolve(&self, path: &Path) -> Option<NodeId> {
        self.resolve_from(self.root, path)
    }

    pub fn node_at(&self, path: &Path) -> Option<&Node> {
        self.get(self.resolve(path)?)
    }

    pub fn node_at_mut(&mut self, path: &Path) -> Option<&mut Node> {
        let id = self.resolve(path)?;
        self.get_mut(id)
    }

    /// First-child chain from the root, root excluded.
    pub fn mainline(&self) -> Vec<NodeId> {
        self.line_from(self.root)
    }

    /// First-child chain below `from`, `from` excluded.
    pub fn line_from(&self, from: NodeId) -> Vec<NodeId> {
        let mut line = Vec::new();
        let mut current = from;
        while let Some(&next) = self.get(current).and_then(|n| n.children.first()) {
            line.push(next);
            current = next;
        }
        line
    }

    /// Reachable from the root through first children only.
    pub fn is_mainline(&self, path: &Path) -> bool {
        let mut current = self.root;
        for id in path.ids() {
            match self.get(current).and_then(|n| n.children.first()) {
                Some(&first) if self.get(first).and_then(Node::id) == Some(id) => current = first,
                _ => return false,
            }
        }
        true
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                NodeId(idx)
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    /// Release a subtree's slots and return the payload of its top node.
    fn release(&mut self, id: NodeId) -> Option<MoveNode> {
        let node = self.slots.get_mut(id.0)?.take()?;
        self.free.push(id.0);
        let mut pending = node.children.clone();
        while let Some(child) = pending.pop() {
            if let Some(n) = self.slots.get_mut(child.0).and_then(Option::take) {
                self.free.push(child.0);
                pending.extend(n.children);
            }
        }
        match node.kind {
            NodeKind::Move(m) => Some(m),
            NodeKind::Root(_) => None,
        }
    }

    /// Append `node` under `parent`. If the parent already has a child with
    /// the same identifier the tree is left untouched and that child's path
    /// is returned. A node whose ply does not follow its parent's is refused.
    pub fn insert(&mut self, parent: &Path, mut node: MoveNode) -> Option<Path> {
        let parent_id = self.resolve(parent)?;
        let parent_node = self.get(parent_id)?;
        if parent_node.ply().checked_add(1) != Some(node.ply) {
            debug!(parent = %parent, ply = node.ply, "Move does not follow its parent");
            return None;
        }
        let inherited: Clocks = parent_node.annotations().clocks;

        let path = parent.append(node.id);
        if self.child_with_id(parent_id, node.id).is_some() {
            debug!(path = %path, "Move already present, insert is a no-op");
            return Some(path);
        }

        node.annotations.clocks = inherited;
        if node.annotations.clock.is_some() {
            let mover = node.mover();
            node.annotations.clocks.set(mover, node.annotations.clock);
        }

        let id = self.alloc(Node {
            kind: NodeKind::Move(node),
            path: path.clone(),
            children: Vec::new(),
        });
        self.get_mut(parent_id)?.children.push(id);
        Some(path)
    }

    /// Recompute inherited clocks below the node at `path` and its siblings
    /// after one of their own clock readings changed.
    pub fn refresh_clocks(&mut self, path: &Path) -> bool {
        let start = if path.is_root() {
            Some(self.root)
        } else {
            self.resolve(&path.init())
        };
        let Some(start) = start else {
            return false;
        };

        let mut pending = vec![start];
        while let Some(id) = pending.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            let clocks = node.annotations().clocks;
            let children = node.children.clone();
            for child in children {
                if let Some(c) = self.get_mut(child) {
                    let mut inherited = clocks;
                    if let Some(m) = c.as_move() {
                        if m.annotations.clock.is_some() {
                            inherited.set(m.mover(), m.annotations.clock);
                        }
                    }
                    c.annotations_mut().clocks = inherited;
                }
                pending.push(child);
            }
        }
        true
    }

    /// Fold [`MoveTree::insert`] over `nodes`, each one becoming the parent
    /// of the next. Inserts that succeeded before a failure are kept.
    pub fn insert_sequence<I>(&mut self, parent: &Path, nodes: I) -> Option<Path>
    where
        I: IntoIterator<Item = MoveNode>,
    {
        let mut current = parent.clone();
        for node in nodes {
            current = self.insert(&current, node)?;
        }
        Some(current)
    }

    /// Remove the node at `path` with its whole subtree.
    pub fn delete_subtree(&mut self, path: &Path) -> Option<MoveNode> {
        let id = path.last()?;
        let parent_id = self.resolve(&path.init())?;
        let child = self.child_with_id(parent_id, id)?;
        self.get_mut(parent_id)?.children.retain(|&c| c != child);
        self.release(child)
    }

    /// Drop every continuation of the node at `path`, keeping the node.
    pub fn truncate_after(&mut self, path: &Path) -> bool {
        let Some(id) = self.resolve(path) else {
            return false;
        };
        let children = match self.get_mut(id) {
            Some(node) => std::mem::take(&mut node.children),
            None => return false,
        };
        for child in children {
            self.release(child);
        }
        true
    }

    /// Remove the node at `path` and all of its later siblings.
    pub fn delete_from(&mut self, path: &Path) -> Option<Vec<MoveNode>> {
        let id = path.last()?;
        let parent_id = self.resolve(&path.init())?;
        let child = self.child_with_id(parent_id, id)?;
        let parent = self.get_mut(parent_id)?;
        let index = parent.children.iter().position(|&c| c == child)?;
        let removed = parent.children.split_off(index);
        Some(removed.into_iter().filter_map(|c| self.release(c)).collect())
    }

    /// Move the node at `path` to the front of its parent's children.
    /// Returns false if it does not resolve or is already first.
    pub fn promote(&mut self, path: &Path) -> bool {
        let (Some(id), Some(parent_id)) = (path.last(), self.resolve(&path.init())) else {
            return false;
        };
        let Some(child) = self.child_with_id(parent_id, id) else {
            return false;
        };
        let Some(parent) = self.get_mut(parent_id) else {
            return false;
        };
        match parent.children.iter().position(|&c| c == child) {
            Some(0) | None => false,
            Some(index) => {
                let moved = parent.children.remove(index);
                parent.children.insert(0, moved);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Annotations, Centis};
    use crate::rules::{Rules, StandardRules};
    use proptest::prelude::*;
    use shakmaty::san::San;
    use shakmaty::{Chess, Position};

    fn empty_tree() -> MoveTree {
        let (state, ply) = StandardRules.root_state(&Chess::default());
        MoveTree::new(RootNode { ply, state, annotations: Annotations::default() })
    }

    /// Replay the moves along `path` to recover its position and ply.
    fn position_at(tree: &MoveTree, path: &Path) -> (Chess, u32) {
        let mut pos = Chess::default();
        let mut ply = 0;
        let mut parent = tree.root_id();
        for id in path.ids() {
            let child = tree.child_with_id(parent, id).unwrap();
            let san = &tree.get(child).unwrap().as_move().unwrap().played.san;
            ply += 1;
            pos = StandardRules.apply(&pos, san, ply).unwrap().1;
            parent = child;
        }
        (pos, ply)
    }

    fn line(tree: &MoveTree, path: &Path, sans: &[&str]) -> Vec<MoveNode> {
        let (mut pos, mut ply) = position_at(tree, path);
        let mut out = Vec::new();
        for san in sans {
            ply += 1;
            let (node, next) = StandardRules.apply(&pos, san, ply).unwrap();
            out.push(node);
            pos = next;
        }
        out
    }

    fn grow(tree: &mut MoveTree, from: &Path, sans: &[&str]) -> Path {
        let nodes = line(tree, from, sans);
        tree.insert_sequence(from, nodes).unwrap()
    }

    #[test]
    fn test_empty_path_resolves_to_root() {
        let tree = empty_tree();
        assert_eq!(tree.resolve(&Path::root()), Some(tree.root_id()));
        assert!(!tree.has_moves());
        assert_eq!(tree.node_count(), 1);
        assert!(tree.mainline().is_empty());
    }

    #[test]
    fn test_insert_and_resolve() {
        let mut tree = empty_tree();
        let end = grow(&mut tree, &Path::root(), &["e4", "e5", "Nf3"]);
        assert_eq!(end.depth(), 3);
        let node = tree.node_at(&end).unwrap();
        assert_eq!(node.as_move().unwrap().played.san, "Nf3");
        assert_eq!(node.path(), &end);
        assert_eq!(tree.mainline().len(), 3);
        assert_eq!(tree.node_count(), 4);
    }

    #[test]
    fn test_idempotent_insert() {
        let mut tree = empty_tree();
        let first = line(&tree, &Path::root(), &["e4"]).remove(0);
        let a = tree.insert(&Path::root(), first.clone()).unwrap();
        let b = tree.insert(&Path::root(), first).unwrap();
        assert_eq!(a, b);
        assert_eq!(tree.root().children().len(), 1);
    }

    #[test]
    fn test_insert_under_missing_parent_fails() {
        let mut tree = empty_tree();
        let node = line(&tree, &Path::root(), &["e4"]).remove(0);
        let stale = Path::parse("mC0K").unwrap();
        assert_eq!(tree.insert(&stale, node), None);
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_insert_sequence_keeps_moves_before_failure() {
        let mut tree = empty_tree();
        let mut nodes = line(&tree, &Path::root(), &["e4", "e5", "Nf3"]);
        nodes[2].ply = 9;
        assert_eq!(tree.insert_sequence(&Path::root(), nodes), None);
        assert_eq!(tree.mainline().len(), 2);
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn test_variation_order_and_mainline_flag() {
        let mut tree = empty_tree();
        let e4 = grow(&mut tree, &Path::root(), &["e4"]);
        let e5 = grow(&mut tree, &e4, &["e5"]);
        let c5 = grow(&mut tree, &e4, &["c5"]);
        let e6 = grow(&mut tree, &e4, &["e6"]);
        let kids: Vec<_> = tree
            .node_at(&e4)
            .unwrap()
            .children()
            .iter()
            .map(|&c| tree.get(c).unwrap().path().clone())
            .collect();
        assert_eq!(kids, vec![e5.clone(), c5.clone(), e6]);
        assert!(tree.is_mainline(&e5));
        assert!(!tree.is_mainline(&c5));
    }

    #[test]
    fn test_clock_inherits_from_parent() {
        let mut tree = empty_tree();
        let mut nodes = line(&tree, &Path::root(), &["e4", "e5", "Nf3"]);
        nodes[0].annotations.clock = Some(Centis(1000));
        nodes[1].annotations.clock = Some(Centis(900));
        let end = tree.insert_sequence(&Path::root(), nodes).unwrap();

        let nf3 = tree.node_at(&end).unwrap().annotations().clocks;
        assert_eq!(nf3.white, Some(Centis(1000)));
        assert_eq!(nf3.black, Some(Centis(900)));
    }

    #[test]
    fn test_refresh_clocks_after_edit() {
        let mut tree = empty_tree();
        let end = grow(&mut tree, &Path::root(), &["e4", "e5", "Nf3"]);
        let e4 = end.init().init();
        tree.node_at_mut(&e4).unwrap().annotations_mut().clock = Some(Centis(4200));
        assert!(tree.refresh_clocks(&e4));

        let nf3 = tree.node_at(&end).unwrap().annotations().clocks;
        assert_eq!(nf3.white, Some(Centis(4200)));
        assert_eq!(nf3.black, None);
        assert!(!tree.refresh_clocks(&Path::parse("zzzz").unwrap()));
    }

    #[test]
    fn test_insert_refuses_ply_past_u32_max() {
        let (state, _) = StandardRules.root_state(&Chess::default());
        let mut tree = MoveTree::new(RootNode {
            ply: u32::MAX,
            state,
            annotations: Annotations::default(),
        });
        let mut node = line(&empty_tree(), &Path::root(), &["e4"]).remove(0);
        node.ply = 0;
        assert_eq!(tree.insert(&Path::root(), node), None);
        assert!(!tree.has_moves());
    }

    #[test]
    fn test_delete_subtree_releases_slots() {
        let mut tree = empty_tree();
        let e4 = grow(&mut tree, &Path::root(), &["e4"]);
        let nc6 = grow(&mut tree, &e4, &["e5", "Nf3", "Nc6"]);
        let c5 = grow(&mut tree, &e4, &["c5"]);

        let e5 = nc6.init().init();
        let removed = tree.delete_subtree(&e5).unwrap();
        assert_eq!(removed.played.san, "e5");
        assert_eq!(tree.node_count(), 3);
        assert!(tree.node_at(&e5).is_none());
        assert!(tree.is_mainline(&c5));

        // Freed slots are reused.
        grow(&mut tree, &c5, &["Nf3"]);
        assert_eq!(tree.slots.len(), 6);
    }

    #[test]
    fn test_delete_root_is_not_found() {
        let mut tree = empty_tree();
        assert!(tree.delete_subtree(&Path::root()).is_none());
        assert!(tree.delete_from(&Path::root()).is_none());
    }

    #[test]
    fn test_truncate_after_keeps_node() {
        let mut tree = empty_tree();
        let e4 = grow(&mut tree, &Path::root(), &["e4"]);
        grow(&mut tree, &e4, &["e5", "Nf3"]);
        grow(&mut tree, &e4, &["c5"]);
        assert!(tree.truncate_after(&e4));
        assert!(tree.node_at(&e4).unwrap().children().is_empty());
        assert_eq!(tree.node_count(), 2);
        assert!(!tree.truncate_after(&Path::parse("zzzz").unwrap()));
    }

    #[test]
    fn test_promote_reorders_children() {
        let mut tree = empty_tree();
        let e4 = grow(&mut tree, &Path::root(), &["e4"]);
        let e5 = grow(&mut tree, &e4, &["e5"]);
        let c5 = grow(&mut tree, &e4, &["c5"]);
        assert!(!tree.promote(&e5));
        assert!(tree.promote(&c5));
        assert!(tree.is_mainline(&c5));
        assert!(!tree.is_mainline(&e5));
        assert!(!tree.promote(&c5));
        assert!(!tree.promote(&Path::root()));
    }

    proptest! {
        #[test]
        fn test_mainline_matches_first_child_walk(
            choices in proptest::collection::vec((0usize..64, 0usize..4), 0..40),
        ) {
            let mut tree = empty_tree();
            let mut paths = vec![Path::root()];
            for (pick, back) in choices {
                let parent = paths[paths.len() - 1 - back.min(paths.len() - 1)].clone();
                let (pos, _) = position_at(&tree, &parent);
                let legal = pos.legal_moves();
                if legal.is_empty() {
                    continue;
                }
                let mv = legal[pick % legal.len()].clone();
                let san = San::from_move(&pos, mv).to_string();
                paths.push(grow(&mut tree, &parent, &[san.as_str()]));
            }

            let mut walked = 0;
            let mut current = Path::root();
            while let Some(&first) = tree.node_at(&current).unwrap().children().first() {
                current = current.append(tree.get(first).unwrap().id().unwrap());
                walked += 1;
            }
            prop_assert_eq!(tree.mainline().len(), walked);
            prop_assert!(tree.is_mainline(&current));
        }
    }
}
