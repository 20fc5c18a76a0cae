/// Basic directed graph data structure
/// - source: http://smallcultfollowing.com/babysteps/blog/2015/04/06/modeling-graphs-in-rust-using-vector-indices/

pub type NodeIndex = usize;
type EdgeIndex = usize;

#[derive(Debug, PartialEq)]
struct NodeData<N> {
    data: N,
    first_outgoing_edge: Option<EdgeIndex>,
    first_incoming_edge: Option<EdgeIndex>,
}

#[derive(Debug, PartialEq)]
struct EdgeData<E> {
    cost: E,
    source: NodeIndex,
    target: NodeIndex,
    next_outgoing_edge: Option<EdgeIndex>,
    next_incoming_edge: Option<EdgeIndex>,
}

/// Status of an attempted edge insertion.
#[derive(Debug, PartialEq)]
pub enum EdgeStatus {
    Success,
    SelfLoop,
    AlreadyExists,
    MissingSource,
    MissingTarget,
}

#[derive(Debug, PartialEq)]
pub struct Graph<N, E> {
    vertices: Vec<NodeData<N>>,
    edges: Vec<EdgeData<E>>,
}

impl<N, E> Graph<N, E> {
    /// Creates an empty `Graph` struct.
    pub fn new() -> Self {
        Self {
            edges: Vec::new(),
            vertices: Vec::new(),
        }
    }

    /// Adds a new node to the graph storing `data`.
    ///
    /// Returns the `NodeIndex` to remember the node.
    pub fn add_node(&mut self, data: N) -> NodeIndex {
        let index = self.vertices.len();
        self.vertices.push(NodeData {
            data: data,
            first_outgoing_edge: None,
            first_incoming_edge: None,
        });
        index
    }

    /// Accesses the data stored at the `node` index.
    pub fn get_node(&self, node: NodeIndex) -> Option<&N> {
        Some(&self.vertices.get(node)?.data)
    }

    /// Checks if a given `source` node is connected to the given `target` node.
    pub fn has_edge(&self, source: NodeIndex, target: NodeIndex) -> bool {
        let mut successors = self.successors(source);
        successors.find(|f| f == &target).is_some()
    }

    /// Returns the number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Adds a new edge with `cost` to the graph from `source` to `target`.
    ///
    /// Does not allow duplicate edges or self-loops; attempts to create either
    /// are reported through the returned [EdgeStatus] and leave the graph
    /// untouched.
    pub fn add_edge(&mut self, source: NodeIndex, target: NodeIndex, cost: E) -> EdgeStatus {
        if source >= self.vertices.len() {
            return EdgeStatus::MissingSource;
        }
        if target >= self.vertices.len() {
            return EdgeStatus::MissingTarget;
        }
        if source == target {
            return EdgeStatus::SelfLoop;
        }
        if self.has_edge(source, target) == true {
            return EdgeStatus::AlreadyExists;
        }

        let edge_index = self.edges.len();
        // enter source -> target data
        {
            let node_data = &mut self.vertices[source];
            self.edges.push(EdgeData {
                cost: cost,
                source: source,
                target: target,
                next_outgoing_edge: node_data.first_outgoing_edge,
                next_incoming_edge: None,
            });
            node_data.first_outgoing_edge = Some(edge_index);
        }
        // enter target <- source data
        let rev_node_data = &mut self.vertices[target];
        let incoming_edge = rev_node_data.first_incoming_edge;
        rev_node_data.first_incoming_edge = Some(edge_index);
        // update the edge data
        self.edges.last_mut().unwrap().next_incoming_edge = incoming_edge;
        EdgeStatus::Success
    }

    /// Returns the number of successors to the `source` node.
    pub fn out_degree(&self, source: NodeIndex) -> usize {
        self.successors(source).count()
    }

    /// Returns the number of predecessors to the `target` node.
    pub fn in_degree(&self, target: NodeIndex) -> usize {
        self.predecessors(target).count()
    }

    /// Creates an iterator over the incoming nodes to the `target` node.
    pub fn predecessors(&self, target: NodeIndex) -> Predecessors<N, E> {
        let first_incoming_edge = self.vertices[target].first_incoming_edge;
        Predecessors {
            graph: self,
            current_edge_index: first_incoming_edge,
        }
    }

    /// Creates an iterator over the outgoing nodes from the `source` node.
    pub fn successors(&self, source: NodeIndex) -> Successors<N, E> {
        let first_outgoing_edge = self.vertices[source].first_outgoing_edge;
        Successors {
            graph: self,
            current_edge_index: first_outgoing_edge,
        }
    }

    /// Locates one dependency cycle in the graph, if any exists.
    ///
    /// Returns the node indices forming the cycle in edge order. The first
    /// node is not repeated at the end of the list.
    pub fn find_cycle(&self) -> Option<Vec<NodeIndex>> {
        #[derive(Clone, PartialEq)]
        enum Mark {
            White,
            Gray,
            Black,
        }
        let mut marks = vec![Mark::White; self.node_count()];
        // track the current dfs path to reconstruct the cycle
        let mut path: Vec<NodeIndex> = Vec::new();

        fn visit<N, E>(
            graph: &Graph<N, E>,
            node: NodeIndex,
            marks: &mut Vec<Mark>,
            path: &mut Vec<NodeIndex>,
        ) -> Option<Vec<NodeIndex>> {
            marks[node] = Mark::Gray;
            path.push(node);
            for next in graph.successors(node) {
                match marks[next] {
                    Mark::Gray => {
                        // slice the active path at the repeated node
                        let start = path.iter().position(|p| p == &next).unwrap();
                        return Some(path[start..].to_vec());
                    }
                    Mark::White => {
                        if let Some(cycle) = visit(graph, next, marks, path) {
                            return Some(cycle);
                        }
                    }
                    Mark::Black => (),
                }
            }
            path.pop();
            marks[node] = Mark::Black;
            None
        }

        for i in 0..self.node_count() {
            if marks[i] == Mark::White {
                if let Some(cycle) = visit(self, i, &mut marks, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }
}

pub struct Predecessors<'graph, N, E> {
    graph: &'graph Graph<N, E>,
    current_edge_index: Option<EdgeIndex>,
}

impl<'graph, N, E> Iterator for Predecessors<'graph, N, E> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<Self::Item> {
        match self.current_edge_index {
            None => None,
            Some(edge_num) => {
                let edge = &self.graph.edges[edge_num];
                self.current_edge_index = edge.next_incoming_edge;
                Some(edge.source)
            }
        }
    }
}

pub struct Successors<'graph, N, E> {
    graph: &'graph Graph<N, E>,
    current_edge_index: Option<EdgeIndex>,
}

impl<'graph, N, E> Iterator for Successors<'graph, N, E> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<Self::Item> {
        match self.current_edge_index {
            None => None,
            Some(edge_num) => {
                let edge = &self.graph.edges[edge_num];
                self.current_edge_index = edge.next_outgoing_edge;
                Some(edge.target)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Creates basic graph illustrated in this blog post:
    /// - source: http://smallcultfollowing.com/babysteps/blog/2015/04/06/modeling-graphs-in-rust-using-vector-indices/
    fn basic_graph() -> Graph<(), ()> {
        let mut g = Graph::new();
        let n0 = g.add_node(());
        let n1 = g.add_node(());
        let n2 = g.add_node(());
        let n3 = g.add_node(());
        g.add_edge(n0, n1, ());
        g.add_edge(n1, n2, ());
        g.add_edge(n0, n3, ());
        g.add_edge(n3, n2, ());
        g
    }

    #[test]
    fn add_node() {
        let mut g: Graph<(), ()> = Graph::new();
        assert_eq!(g.node_count(), 0);
        g.add_node(());
        assert_eq!(g.node_count(), 1);
    }

    #[test]
    fn add_edge() {
        let mut g: Graph<(), ()> = Graph::new();
        assert_eq!(g.edge_count(), 0);
        let n0 = g.add_node(());
        let n1 = g.add_node(());
        assert_eq!(g.edge_count(), 0);
        assert_eq!(g.add_edge(n0, n1, ()), EdgeStatus::Success);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.add_edge(n1, n0, ()), EdgeStatus::Success);
        assert_eq!(g.edge_count(), 2);
        // do not allow duplicate edges
        assert_eq!(g.add_edge(n1, n0, ()), EdgeStatus::AlreadyExists);
        assert_eq!(g.edge_count(), 2);
        // do not allow self-loops
        assert_eq!(g.add_edge(n0, n0, ()), EdgeStatus::SelfLoop);
        // do not allow edges to unknown nodes
        assert_eq!(g.add_edge(n0, 3, ()), EdgeStatus::MissingTarget);
        assert_eq!(g.add_edge(4, n1, ()), EdgeStatus::MissingSource);
    }

    #[test]
    fn find_cycle() {
        let mut g = basic_graph();
        assert_eq!(g.find_cycle(), None);
        // n0 -> n3 -> n2 -> n0 (dfs walks the most recent edge first)
        g.add_edge(2, 0, ());
        let cycle = g.find_cycle().unwrap();
        assert_eq!(cycle, vec![0, 3, 2]);

        // a two-node cycle on an island
        let mut g: Graph<(), ()> = Graph::new();
        let n0 = g.add_node(());
        let n1 = g.add_node(());
        let n2 = g.add_node(());
        g.add_edge(n0, n1, ());
        g.add_edge(n2, n1, ());
        g.add_edge(n1, n2, ());
        assert_eq!(g.find_cycle().unwrap(), vec![n1, n2]);
    }

    #[test]
    fn degrees() {
        let g = basic_graph();
        assert_eq!(g.out_degree(0), 2);
        assert_eq!(g.out_degree(2), 0);
        assert_eq!(g.in_degree(0), 0);
        assert_eq!(g.in_degree(2), 2);
    }

    #[test]
    fn successors_and_predecessors() {
        let g = basic_graph();
        assert_eq!(g.successors(0).collect::<Vec<NodeIndex>>(), vec![3, 1]);
        assert_eq!(g.predecessors(2).collect::<Vec<usize>>(), vec![3, 1]);
        assert_eq!(g.predecessors(0).collect::<Vec<usize>>(), Vec::<usize>::new());
    }
}
