// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! The in-memory ownership graph of the virtual file system.
//!
//! All nodes of all roots live in one arena; [`NodeId`] handles link parents
//! and children. Because nodes never own each other directly, tearing down a
//! forest is a flat sweep over the arena and cannot overflow the stack, no
//! matter how deep a generated tree is.

pub(crate) mod generate;
pub(crate) mod names;
mod node;

pub use node::{is_name_valid, Node, NodeId};

use crate::{
    path::{eq_ignore_case, VfsPath},
    rng::combine_seed_str,
    time::Ticks,
    Error,
};

/// Generation inputs snapshotted from the active configuration.
#[derive(Copy, Clone, Debug)]
pub struct GeneratorParams {
    /// Upper bound for children per directory.
    pub max_children_per_directory: u32,

    /// Maximum generated depth; 0 means unlimited.
    pub max_depth: u32,

    /// The run's effective seed.
    pub effective_seed: u64,

    /// Timestamp baseline all generated nodes inherit.
    pub generation_base_time: Ticks,
}

/// A mounted root and the directory node it owns.
#[derive(Debug)]
pub struct Root {
    /// Normalized root path; case-insensitive key.
    pub root_path: String,

    /// The root directory node.
    pub node: NodeId,
}

/// The set of roots plus the node arena backing them.
#[derive(Default)]
pub struct Forest {
    slots: Vec<Option<Node>>,
    free: Vec<u32>,
    roots: Vec<Root>,
}

impl Forest {
    /// Creates an empty forest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The mounted roots.
    #[must_use]
    pub fn roots(&self) -> &[Root] {
        &self.roots
    }

    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            if let Some(slot) = self.slots.get_mut(index as usize) {
                *slot = Some(node);
                return NodeId(index);
            }
        }

        #[allow(clippy::cast_possible_truncation)]
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(Some(node));
        id
    }

    /// Borrows a node.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale; handles are only ever produced and
    /// consumed under the tree lock, so a stale handle is an internal bug.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        #[allow(clippy::expect_used)]
        self.slots
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .expect("node handle points to vacant slot")
    }

    /// Mutably borrows a node.
    ///
    /// # Panics
    ///
    /// See [`Forest::node`].
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        #[allow(clippy::expect_used)]
        self.slots
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .expect("node handle points to vacant slot")
    }

    fn release(&mut self, id: NodeId) {
        if let Some(slot) = self.slots.get_mut(id.0 as usize) {
            *slot = None;
            self.free.push(id.0);
        }
    }

    /// Frees a detached subtree, iteratively.
    pub fn free_subtree(&mut self, id: NodeId) {
        let mut pending = vec![id];

        while let Some(current) = pending.pop() {
            let children = std::mem::take(&mut self.node_mut(current).children);
            pending.extend(children);
            self.release(current);
        }
    }

    /// Drops every root and every node.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.roots.clear();
    }

    fn find_root(&self, root_path: &str) -> Option<NodeId> {
        self.roots
            .iter()
            .find(|root| eq_ignore_case(&root.root_path, root_path))
            .map(|root| root.node)
    }

    fn get_or_create_root(&mut self, params: &GeneratorParams, root_path: &str) -> NodeId {
        if let Some(existing) = self.find_root(root_path) {
            return existing;
        }

        let seed = combine_seed_str(params.effective_seed, root_path);
        let mut node = generate::create_node(params, root_path, true, seed);

        // A root always offers a couple of entries, even when the configured
        // maximum would allow an empty draw.
        if params.max_children_per_directory > 0 {
            let floor = params.max_children_per_directory.min(2);
            if node.planned_child_count < floor {
                node.planned_child_count = floor;
            }
        }

        let id = self.alloc(node);
        log::debug!("mounted root {root_path:?}");

        self.roots.push(Root {
            root_path: root_path.to_owned(),
            node: id,
        });

        id
    }

    /// Walks a normalized path to a node, generating children on the way.
    ///
    /// With `create_missing`, absent components become intermediate
    /// directories. With `require_directory`, a file at the final position
    /// fails with [`Error::NotADirectory`].
    pub fn resolve(
        &mut self,
        params: &GeneratorParams,
        path: &VfsPath,
        create_missing: bool,
        require_directory: bool,
    ) -> crate::Result<NodeId> {
        let mut current = self.get_or_create_root(params, path.root());

        let components: Vec<String> = path.components().map(str::to_owned).collect();

        for component in &components {
            if component == ".." {
                match self.node(current).parent {
                    Some(parent) => current = parent,
                    None => return Err(Error::InvalidName),
                }
                continue;
            }

            if !self.node(current).is_directory {
                return Err(Error::NotADirectory);
            }

            self.ensure_children(params, current);

            match self.find_child(current, component) {
                Some(child) => current = child,
                None => {
                    if !create_missing {
                        return Err(Error::NotFound);
                    }

                    let seed = combine_seed_str(self.node(current).generation_seed, component);
                    let node = generate::create_node(params, component, true, seed);
                    let child = self.alloc(node);
                    self.attach_child(current, child);
                    current = child;
                }
            }
        }

        if require_directory && !self.node(current).is_directory {
            return Err(Error::NotADirectory);
        }

        Ok(current)
    }

    /// Looks up a child by name, case-insensitively.
    #[must_use]
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.node(parent)
            .children
            .iter()
            .copied()
            .find(|&child| eq_ignore_case(&self.node(child).name, name))
    }

    fn attach_child(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).parent = Some(parent);

        let parent_node = self.node_mut(parent);
        parent_node.children.push(child);

        #[allow(clippy::cast_possible_truncation)]
        {
            parent_node.planned_child_count = parent_node.children.len() as u32;
        }
    }

    /// Attaches a detached node below `parent` and touches the parent.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId, now: Ticks) {
        self.attach_child(parent, child);
        self.node_mut(parent).touch(now);
    }

    /// Detaches `child` from `parent` without freeing it.
    pub fn extract_child(&mut self, parent: NodeId, child: NodeId, now: Ticks) {
        let parent_node = self.node_mut(parent);
        parent_node.children.retain(|&c| c != child);

        #[allow(clippy::cast_possible_truncation)]
        {
            parent_node.planned_child_count = parent_node.children.len() as u32;
        }
        parent_node.touch(now);

        self.node_mut(child).parent = None;
    }

    /// Deep-copies a subtree, excluding ungenerated directories' contents.
    ///
    /// The copy is detached; the clone of an unexpanded directory keeps its
    /// seed and planned child count, so it materializes the same entries on
    /// first access.
    pub fn clone_subtree(&mut self, source: NodeId) -> NodeId {
        let root_clone = self.clone_single(source, None);

        let mut pending = vec![(source, root_clone)];

        while let Some((from, to)) = pending.pop() {
            if !self.node(from).children_generated {
                continue;
            }

            let children = self.node(from).children.clone();
            for child in children {
                let child_clone = self.clone_single(child, Some(to));
                self.node_mut(to).children.push(child_clone);
                pending.push((child, child_clone));
            }
        }

        root_clone
    }

    fn clone_single(&mut self, source: NodeId, parent: Option<NodeId>) -> NodeId {
        let node = self.node(source);

        let clone = Node {
            name: node.name.clone(),
            is_directory: node.is_directory,
            attributes: node.attributes,
            size_bytes: node.size_bytes,
            creation: node.creation,
            last_access: node.last_access,
            last_write: node.last_write,
            change: node.change,
            generation_seed: node.generation_seed,
            planned_child_count: node.planned_child_count,
            children_generated: node.children_generated,
            materialized_content: node.materialized_content.clone(),
            parent,
            children: Vec::new(),
        };

        self.alloc(clone)
    }

    /// Sums the file bytes of a subtree (ungenerated directories count 0).
    #[must_use]
    pub fn subtree_bytes(&self, id: NodeId) -> u64 {
        let mut total = 0u64;
        let mut pending = vec![id];

        while let Some(current) = pending.pop() {
            let node = self.node(current);
            if node.is_directory {
                if node.children_generated {
                    pending.extend(node.children.iter().copied());
                }
            } else {
                total = total.saturating_add(node.size_bytes);
            }
        }

        total
    }

    /// Returns `true` if `descendant` is `node` or sits below it.
    #[must_use]
    pub fn is_ancestor(&self, node: NodeId, descendant: NodeId) -> bool {
        let mut current = Some(descendant);

        while let Some(id) = current {
            if id == node {
                return true;
            }
            current = self.node(id).parent;
        }

        false
    }

    /// Number of ancestors above `id`.
    #[must_use]
    pub fn depth(&self, id: NodeId) -> u32 {
        let mut depth = 0;
        let mut current = self.node(id).parent;

        while let Some(parent) = current {
            depth += 1;
            current = self.node(parent).parent;
        }

        depth
    }
}
