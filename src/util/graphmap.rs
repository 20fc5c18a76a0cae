use std::{collections::HashMap, hash::Hash};

use super::graph::{EdgeStatus, Graph, NodeIndex};

/// A directed graph where every node is addressable by a unique key `K` and
/// stores a value `V`. Edges carry a cost `E`.
pub struct GraphMap<K: Eq + Hash + Clone, V, E> {
    graph: Graph<K, E>,
    map: HashMap<K, Node<V>>,
}

pub struct Node<V>(V, NodeIndex);

impl<V> Node<V> {
    pub fn index(&self) -> NodeIndex {
        self.1
    }

    pub fn as_ref(&self) -> &V {
        &self.0
    }
}

impl<K: Eq + Hash + Clone, V, E> GraphMap<K, V, E> {
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            map: HashMap::new(),
        }
    }

    /// Adds a node to the graph, storing `value` behind `key`.
    ///
    /// If the key already exists, its node index is returned and the stored
    /// value is left unchanged.
    pub fn add_node(&mut self, key: K, value: V) -> NodeIndex {
        if let Some(node) = self.map.get(&key) {
            return node.index();
        }
        let iden = self.graph.add_node(key.clone());
        self.map.insert(key, Node(value, iden));
        iden
    }

    /// Creates an edge between `source` and `target`.
    ///
    /// Returns the status of the insertion; edges to unknown endpoints,
    /// duplicate edges, and self-loops leave the graph untouched.
    pub fn add_edge_by_key(&mut self, source: &K, target: &K, cost: E) -> EdgeStatus {
        let source = match self.map.get(source) {
            Some(i) => i.index(),
            None => return EdgeStatus::MissingSource,
        };
        let target = match self.map.get(target) {
            Some(i) => i.index(),
            None => return EdgeStatus::MissingTarget,
        };
        self.graph.add_edge(source, target, cost)
    }

    pub fn get_node_by_key(&self, key: &K) -> Option<&Node<V>> {
        self.map.get(key)
    }

    pub fn get_node_by_index(&self, index: NodeIndex) -> Option<&Node<V>> {
        self.map.get(self.graph.get_node(index)?)
    }

    pub fn get_key_by_index(&self, index: NodeIndex) -> Option<&K> {
        Some(self.graph.get_node(index)?)
    }

    pub fn get_graph(&self) -> &Graph<K, E> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn add_and_connect() {
        let mut g: GraphMap<String, u8, ()> = GraphMap::new();
        let a = g.add_node(String::from("a"), 10);
        let b = g.add_node(String::from("b"), 20);
        assert_eq!(g.node_count(), 2);
        // re-adding an existing key returns the original node
        assert_eq!(g.add_node(String::from("a"), 99), a);
        assert_eq!(g.get_node_by_key(&String::from("a")).unwrap().as_ref(), &10);

        assert_eq!(
            g.add_edge_by_key(&String::from("a"), &String::from("b"), ()),
            EdgeStatus::Success
        );
        assert_eq!(
            g.add_edge_by_key(&String::from("a"), &String::from("c"), ()),
            EdgeStatus::MissingTarget
        );
        assert_eq!(g.get_graph().has_edge(a, b), true);
        assert_eq!(g.get_key_by_index(b).unwrap(), &String::from("b"));
    }
}
