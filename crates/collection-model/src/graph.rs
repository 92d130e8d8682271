//! Collection node graph
//!
//! An ordered sequence of distinct exploration references. Positions are
//! dense and zero-based; a node's identity is the exploration it points at.

use crate::error::ModelError;
use crate::types::{CollectionNode, ExplorationId};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Ordered, duplicate-free node sequence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionGraph {
    nodes: IndexSet<ExplorationId>,
}

impl CollectionGraph {
    /// Create empty graph
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the exploration is referenced
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &ExplorationId) -> bool {
        self.nodes.contains(id)
    }

    /// Position of an exploration
    #[inline]
    #[must_use]
    pub fn position_of(&self, id: &ExplorationId) -> Option<usize> {
        self.nodes.get_index_of(id)
    }

    /// Exploration at a position
    #[inline]
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&ExplorationId> {
        self.nodes.get_index(position)
    }

    /// Exploration ids in order
    pub fn ids(&self) -> impl Iterator<Item = &ExplorationId> {
        self.nodes.iter()
    }

    /// Positioned nodes in order
    #[must_use]
    pub fn nodes(&self) -> Vec<CollectionNode> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(position, id)| CollectionNode {
                exploration_id: id.clone(),
                position,
            })
            .collect()
    }

    /// Append a node
    ///
    /// # Errors
    /// `ModelError::DuplicateNode` if the exploration is already present.
    pub fn add_node(&mut self, id: ExplorationId) -> Result<usize, ModelError> {
        if self.nodes.contains(&id) {
            return Err(ModelError::DuplicateNode(id.0));
        }
        self.nodes.insert(id);
        Ok(self.nodes.len() - 1)
    }

    /// Swap the node at `position` with its left neighbour
    ///
    /// Returns `false` (graph unchanged) at position 0.
    ///
    /// # Errors
    /// `ModelError::OutOfRange` if `position` is not a node.
    pub fn shift_left(&mut self, position: usize) -> Result<bool, ModelError> {
        self.check_position(position)?;
        if position == 0 {
            return Ok(false);
        }
        self.nodes.swap_indices(position - 1, position);
        Ok(true)
    }

    /// Swap the node at `position` with its right neighbour
    ///
    /// Returns `false` (graph unchanged) at the last position.
    ///
    /// # Errors
    /// `ModelError::OutOfRange` if `position` is not a node.
    pub fn shift_right(&mut self, position: usize) -> Result<bool, ModelError> {
        self.check_position(position)?;
        if position + 1 == self.nodes.len() {
            return Ok(false);
        }
        self.nodes.swap_indices(position, position + 1);
        Ok(true)
    }

    /// Remove the node at `position`; later nodes move down by one
    ///
    /// # Errors
    /// `ModelError::OutOfRange` if `position` is not a node.
    pub fn delete_node(&mut self, position: usize) -> Result<ExplorationId, ModelError> {
        self.check_position(position)?;
        self.nodes
            .shift_remove_index(position)
            .ok_or(ModelError::OutOfRange {
                position,
                len: self.nodes.len(),
            })
    }

    fn check_position(&self, position: usize) -> Result<(), ModelError> {
        if position >= self.nodes.len() {
            return Err(ModelError::OutOfRange {
                position,
                len: self.nodes.len(),
            });
        }
        Ok(())
    }
}

impl FromIterator<ExplorationId> for CollectionGraph {
    fn from_iter<I: IntoIterator<Item = ExplorationId>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(graph: &CollectionGraph) -> Vec<&str> {
        graph.ids().map(ExplorationId::as_str).collect()
    }

    fn graph_of(raw: &[&str]) -> CollectionGraph {
        raw.iter().map(|r| ExplorationId::new(*r)).collect()
    }

    #[test]
    fn add_appends_in_call_order() {
        let mut graph = CollectionGraph::new();
        assert_eq!(graph.add_node(ExplorationId::new("a")).unwrap(), 0);
        assert_eq!(graph.add_node(ExplorationId::new("b")).unwrap(), 1);
        assert_eq!(ids(&graph), vec!["a", "b"]);
        assert_eq!(graph.nodes()[1].position, 1);
    }

    #[test]
    fn duplicate_add_is_rejected() {
        let mut graph = graph_of(&["a"]);
        let err = graph.add_node(ExplorationId::new("a")).unwrap_err();
        assert_eq!(err, ModelError::DuplicateNode("a".to_string()));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn shifts_swap_with_neighbour() {
        let mut graph = graph_of(&["a", "b", "c"]);
        assert!(graph.shift_left(1).unwrap());
        assert_eq!(ids(&graph), vec!["b", "a", "c"]);
        assert!(graph.shift_right(1).unwrap());
        assert_eq!(ids(&graph), vec!["b", "c", "a"]);
    }

    #[test]
    fn shifts_at_boundaries_are_noops() {
        let mut graph = graph_of(&["a", "b"]);
        assert!(!graph.shift_left(0).unwrap());
        assert!(!graph.shift_right(1).unwrap());
        assert_eq!(ids(&graph), vec!["a", "b"]);
    }

    #[test]
    fn shift_past_end_is_out_of_range() {
        let mut graph = graph_of(&["a"]);
        assert!(matches!(
            graph.shift_right(3),
            Err(ModelError::OutOfRange { position: 3, len: 1 })
        ));
        assert!(matches!(
            CollectionGraph::new().shift_left(0),
            Err(ModelError::OutOfRange { .. })
        ));
    }

    #[test]
    fn delete_compacts_positions() {
        let mut graph = graph_of(&["a", "b", "c"]);
        assert_eq!(graph.delete_node(1).unwrap(), ExplorationId::new("b"));
        assert_eq!(ids(&graph), vec!["a", "c"]);
        assert_eq!(graph.position_of(&ExplorationId::new("c")), Some(1));

        let before = graph.clone();
        assert!(graph.delete_node(2).is_err());
        assert_eq!(graph, before);
    }
}
