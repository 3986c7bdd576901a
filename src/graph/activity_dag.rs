use crate::activity::ActivityTable;
use crate::error::{ScheduleError, ScheduleResult};
use petgraph::algo::{has_path_connecting, tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Dependency graph over table rows. Node weights are row indices into the
/// table, edges run predecessor -> successor.
pub struct ActivityDag {
    pub graph: DiGraph<usize, ()>,
    pub name_to_index: HashMap<String, NodeIndex>,
}

impl ActivityDag {
    pub fn build(table: &ActivityTable) -> Self {
        let mut graph: DiGraph<usize, ()> = DiGraph::new();
        let mut name_to_index: HashMap<String, NodeIndex> = HashMap::new();

        // Add nodes first
        for (row, activity) in table.iter().enumerate() {
            let node_ix = graph.add_node(row);
            name_to_index.insert(activity.name.trim().to_string(), node_ix);
        }

        // Add edges: pred -> activity; unknown names carry no constraint
        for (row, activity) in table.iter().enumerate() {
            let v = NodeIndex::new(row);
            for pred in activity.named_predecessors() {
                if let Some(&u) = name_to_index.get(pred) {
                    graph.update_edge(u, v, ());
                }
            }
        }

        Self {
            graph,
            name_to_index,
        }
    }

    /// Row indices in an order where every predecessor precedes its successors.
    pub fn resolution_order(&self, table: &ActivityTable) -> ScheduleResult<Vec<usize>> {
        match toposort(&self.graph, None) {
            Ok(order) => Ok(order.into_iter().map(|ix| self.graph[ix]).collect()),
            Err(_) => Err(ScheduleError::CycleDetected(self.cycle_members(table))),
        }
    }

    /// True when `activity` waits on `on`, directly or through other activities.
    pub fn depends_on(&self, activity: &str, on: &str) -> bool {
        match (self.name_to_index.get(activity), self.name_to_index.get(on)) {
            (Some(&to), Some(&from)) if to != from => {
                has_path_connecting(&self.graph, from, to, None)
            }
            _ => false,
        }
    }

    fn cycle_members(&self, table: &ActivityTable) -> Vec<String> {
        let activities = table.activities();
        tarjan_scc(&self.graph)
            .into_iter()
            .find(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&ix| self.graph.contains_edge(ix, ix))
            })
            .map(|mut component| {
                component.sort_by_key(|ix| self.graph[*ix]);
                component
                    .into_iter()
                    .map(|ix| activities[self.graph[ix]].name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}
