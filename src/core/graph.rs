//! core::graph
//!
//! Parent-link topology over realm ids.
//!
//! # Architecture
//!
//! The parent graph is a forest where:
//! - Nodes are realm ids
//! - Edges point from child to parent
//! - Roots are realms without a parent
//!
//! It is used to validate world configurations (which may name parents in
//! any order and may contain mistakes) and to answer topology queries on a
//! live [`RealmGraph`](crate::world::RealmGraph).
//!
//! # Invariants
//!
//! - A valid graph is acyclic
//! - Every node has at most one parent

use super::types::RealmId;
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

/// Child → parent links between realms.
#[derive(Debug, Default, Clone)]
pub struct ParentGraph {
    /// Every known realm, rooted or not
    nodes: BTreeSet<RealmId>,
    /// Parent pointer for each realm that has one
    parents: BTreeMap<RealmId, RealmId>,
    /// Cached children sets (derived from parents)
    children: BTreeMap<RealmId, BTreeSet<RealmId>>,
}

impl ParentGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a realm without a parent.
    pub fn add_root(&mut self, realm: RealmId) {
        self.nodes.insert(realm);
    }

    /// Add a parent relationship.
    ///
    /// Both ends become nodes. This also updates the children cache.
    pub fn add_edge(&mut self, child: RealmId, parent: RealmId) {
        self.nodes.insert(child.clone());
        self.nodes.insert(parent.clone());
        self.children
            .entry(parent.clone())
            .or_default()
            .insert(child.clone());
        self.parents.insert(child, parent);
    }

    /// Is `realm` a node of this graph?
    pub fn contains(&self, realm: &RealmId) -> bool {
        self.nodes.contains(realm)
    }

    /// Get the parent of a realm.
    pub fn parent(&self, realm: &RealmId) -> Option<&RealmId> {
        self.parents.get(realm)
    }

    /// Get the children of a realm, sorted by id.
    pub fn children(&self, realm: &RealmId) -> Vec<RealmId> {
        self.children
            .get(realm)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// All realms, sorted by id.
    pub fn realms(&self) -> impl Iterator<Item = &RealmId> {
        self.nodes.iter()
    }

    /// Check if the graph contains cycles.
    ///
    /// Returns `Some(realm)` if a cycle is reachable from that realm.
    pub fn find_cycle(&self) -> Option<RealmId> {
        let mut visited = HashSet::new();
        let mut path = HashSet::new();

        for realm in self.parents.keys() {
            if self.has_cycle_from(realm, &mut visited, &mut path) {
                return Some(realm.clone());
            }
        }
        None
    }

    fn has_cycle_from(
        &self,
        realm: &RealmId,
        visited: &mut HashSet<RealmId>,
        path: &mut HashSet<RealmId>,
    ) -> bool {
        if path.contains(realm) {
            return true;
        }
        if visited.contains(realm) {
            return false;
        }

        visited.insert(realm.clone());
        path.insert(realm.clone());

        if let Some(parent) = self.parents.get(realm) {
            if self.has_cycle_from(parent, visited, path) {
                return true;
            }
        }

        path.remove(realm);
        false
    }

    /// Get all descendants of a realm (children, grandchildren, etc.).
    ///
    /// # Example
    ///
    /// ```
    /// use realmwork::core::graph::ParentGraph;
    /// use realmwork::core::types::RealmId;
    ///
    /// let mut graph = ParentGraph::new();
    /// let core = RealmId::new("core").unwrap();
    /// let plugin = RealmId::new("plugin").unwrap();
    /// let nested = RealmId::new("plugin.nested").unwrap();
    ///
    /// graph.add_edge(plugin.clone(), core.clone());
    /// graph.add_edge(nested.clone(), plugin.clone());
    ///
    /// let descendants = graph.descendants(&core);
    /// assert!(descendants.contains(&plugin));
    /// assert!(descendants.contains(&nested));
    /// ```
    pub fn descendants(&self, realm: &RealmId) -> BTreeSet<RealmId> {
        let mut result = BTreeSet::new();
        let mut queue: VecDeque<RealmId> = self.children(realm).into();

        while let Some(current) = queue.pop_front() {
            if result.insert(current.clone()) {
                queue.extend(self.children(&current));
            }
        }

        result
    }

    /// Get all ancestors of a realm, from immediate parent to root.
    ///
    /// Stops early if a cycle is encountered.
    ///
    /// # Example
    ///
    /// ```
    /// use realmwork::core::graph::ParentGraph;
    /// use realmwork::core::types::RealmId;
    ///
    /// let mut graph = ParentGraph::new();
    /// let core = RealmId::new("core").unwrap();
    /// let plugin = RealmId::new("plugin").unwrap();
    /// let nested = RealmId::new("plugin.nested").unwrap();
    ///
    /// graph.add_edge(plugin.clone(), core.clone());
    /// graph.add_edge(nested.clone(), plugin.clone());
    ///
    /// assert_eq!(graph.ancestors(&nested), vec![plugin, core]);
    /// ```
    pub fn ancestors(&self, realm: &RealmId) -> Vec<RealmId> {
        let mut result = Vec::new();
        let mut seen = HashSet::from([realm.clone()]);
        let mut current = self.parent(realm);

        while let Some(parent) = current {
            if !seen.insert(parent.clone()) {
                break;
            }
            result.push(parent.clone());
            current = self.parent(parent);
        }

        result
    }

    /// Order realms so every parent precedes its children.
    ///
    /// Realms are sorted by depth, then by id for determinism. Only
    /// meaningful on an acyclic graph.
    pub fn topological_order(&self) -> Vec<RealmId> {
        let mut by_depth: Vec<(usize, RealmId)> = self
            .realms()
            .map(|r| (self.ancestors(r).len(), r.clone()))
            .collect();

        by_depth.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        by_depth.into_iter().map(|(_, realm)| realm).collect()
    }
}
