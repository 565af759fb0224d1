//! The exchange digraph and its per-edge witness sets.
//!
//! Nodes are item indices plus a permanent sink (the pool) and a transient
//! source inserted while probing one agent. An item-to-item edge exists
//! exactly while its witness set — the agents willing to make that exchange
//! at no loss of value — is non-empty; an item-to-sink edge exists while the
//! item has pool capacity left. The graph and the witness matrix are owned by
//! the allocator and never escape it.

use std::collections::{BTreeSet, HashMap, VecDeque};

use petgraph::graphmap::DiGraphMap;

use crate::agent::Agent;
use crate::item::Item;
use crate::ItemIndex;

/// Exchange-graph node. The derived order (source, items ascending, sink)
/// doubles as the deterministic BFS expansion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum Node {
    Source,
    Item(ItemIndex),
    Sink,
}

pub(crate) struct ExchangeGraph {
    graph: DiGraphMap<Node, ()>,
    /// `witnesses[i][j]`: agents willing to trade their copy of `i` for `j`.
    witnesses: Vec<Vec<BTreeSet<usize>>>,
}

impl ExchangeGraph {
    /// One node per item plus the sink; an edge to the sink wherever capacity
    /// remains; no witnesses yet.
    pub(crate) fn new(items: &[Item]) -> Self {
        let n = items.len();
        let mut graph = DiGraphMap::new();
        graph.add_node(Node::Sink);
        for item in items {
            graph.add_node(Node::Item(item.index()));
            if item.capacity() > 0 {
                graph.add_edge(Node::Item(item.index()), Node::Sink, ());
            }
        }
        Self {
            graph,
            witnesses: vec![vec![BTreeSet::new(); n]; n],
        }
    }

    /// Inserts the source and one edge toward every desired item whose
    /// marginal contribution to the probed agent's bundle is positive.
    pub(crate) fn add_source_edges<A: Agent>(
        &mut self,
        agent: &A,
        bundle: &[ItemIndex],
        items: &[Item],
    ) {
        self.graph.add_node(Node::Source);
        for index in agent.desired_items(items) {
            if !bundle.contains(&index) && agent.marginal_contribution(bundle, index) > 0 {
                self.graph.add_edge(Node::Source, Node::Item(index), ());
            }
        }
    }

    /// Removes the transient source along with its edges.
    pub(crate) fn remove_source(&mut self) {
        self.graph.remove_node(Node::Source);
    }

    /// Shortest source-to-sink path by BFS over unit edges.
    ///
    /// Neighbors are expanded in sorted node order, so the returned path is
    /// fully determined by the graph contents.
    pub(crate) fn shortest_path(&self) -> Option<Vec<Node>> {
        let mut queue = VecDeque::from([Node::Source]);
        let mut predecessor: HashMap<Node, Node> = HashMap::new();
        predecessor.insert(Node::Source, Node::Source);
        while let Some(node) = queue.pop_front() {
            let mut neighbors: Vec<Node> = self.graph.neighbors(node).collect();
            neighbors.sort_unstable();
            for next in neighbors {
                if predecessor.contains_key(&next) {
                    continue;
                }
                predecessor.insert(next, node);
                if next == Node::Sink {
                    let mut path = vec![Node::Sink];
                    let mut cursor = node;
                    while cursor != Node::Source {
                        path.push(cursor);
                        cursor = predecessor[&cursor];
                    }
                    path.push(Node::Source);
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(next);
            }
        }
        None
    }

    /// Lowest-index witness for the edge `(from, to)`, if any.
    pub(crate) fn witness(&self, from: ItemIndex, to: ItemIndex) -> Option<usize> {
        self.witnesses[from][to].iter().next().copied()
    }

    /// Records whether `agent` is willing to exchange `from` for `to`,
    /// keeping the edge in sync with witness-set emptiness.
    pub(crate) fn update_witness(
        &mut self,
        from: ItemIndex,
        to: ItemIndex,
        agent: usize,
        willing: bool,
    ) {
        let set = &mut self.witnesses[from][to];
        if willing {
            set.insert(agent);
            if !self.graph.contains_edge(Node::Item(from), Node::Item(to)) {
                self.graph.add_edge(Node::Item(from), Node::Item(to), ());
            }
        } else {
            set.remove(&agent);
            if set.is_empty() {
                self.graph.remove_edge(Node::Item(from), Node::Item(to));
            }
        }
    }

    /// Drops `agent` from every witness set leaving `from`; an agent that
    /// just swapped away its copy of `from` can no longer witness any of
    /// those exchanges.
    pub(crate) fn invalidate_witness_from(&mut self, from: ItemIndex, agent: usize) {
        for to in 0..self.witnesses[from].len() {
            let set = &mut self.witnesses[from][to];
            if set.remove(&agent) && set.is_empty() {
                self.graph.remove_edge(Node::Item(from), Node::Item(to));
            }
        }
    }

    /// Severs the pool edge of an exhausted item.
    pub(crate) fn remove_sink_edge(&mut self, item: ItemIndex) {
        self.graph.remove_edge(Node::Item(item), Node::Sink);
    }
}
