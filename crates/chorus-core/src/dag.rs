//! Stage DAG building and topological sorting
//!
//! Loads are sequenced by data dependency: every dimension a fact references
//! must be written before the fact. The graph is small and fixed for the
//! star schema, but cycles are still rejected so a misconfigured graph fails
//! loudly instead of loading facts early.

use crate::error::{CoreError, CoreResult};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A load stage, one per target table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Songs,
    Artists,
    Time,
    Dates,
    Users,
    Songplays,
}

impl Stage {
    /// All stages in declaration order
    pub const ALL: [Stage; 6] = [
        Stage::Songs,
        Stage::Artists,
        Stage::Time,
        Stage::Dates,
        Stage::Users,
        Stage::Songplays,
    ];

    /// Stage name, which is also the unqualified table name
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Songs => "songs",
            Stage::Artists => "artists",
            Stage::Time => "time",
            Stage::Dates => "dates",
            Stage::Users => "users",
            Stage::Songplays => "songplays",
        }
    }

    /// Whether this stage loads a dimension table
    pub fn is_dimension(&self) -> bool {
        !matches!(self, Stage::Songplays)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed acyclic graph of stage dependencies
#[derive(Debug)]
pub struct StageDag {
    graph: DiGraph<Stage, ()>,
    node_map: HashMap<Stage, NodeIndex>,
}

impl StageDag {
    /// Create a new empty DAG
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// The star-schema pipeline: the fact stage depends on every dimension
    pub fn star_schema() -> Self {
        let mut dag = Self::new();
        for stage in Stage::ALL {
            dag.add_stage(stage);
        }
        for dimension in Stage::ALL.into_iter().filter(Stage::is_dimension) {
            dag.add_dependency(Stage::Songplays, dimension);
        }
        dag
    }

    /// Add a stage to the DAG
    pub fn add_stage(&mut self, stage: Stage) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&stage) {
            idx
        } else {
            let idx = self.graph.add_node(stage);
            self.node_map.insert(stage, idx);
            idx
        }
    }

    /// Add a dependency edge (`stage` depends on `on`)
    pub fn add_dependency(&mut self, stage: Stage, on: Stage) {
        let from_idx = self.add_stage(stage);
        let to_idx = self.add_stage(on);
        // Edge goes from dependency to dependent so toposort yields dependencies first
        self.graph.update_edge(to_idx, from_idx, ());
    }

    /// Build the DAG from a map of stage -> upstream stages
    pub fn build(dependencies: &HashMap<Stage, Vec<Stage>>) -> CoreResult<Self> {
        let mut dag = Self::new();

        let mut stages: Vec<Stage> = dependencies.keys().copied().collect();
        stages.sort();
        for stage in &stages {
            dag.add_stage(*stage);
        }

        for stage in &stages {
            for dep in &dependencies[stage] {
                dag.add_dependency(*stage, *dep);
            }
        }

        dag.validate()?;

        Ok(dag)
    }

    /// Validate the DAG has no cycles
    pub fn validate(&self) -> CoreResult<()> {
        self.topological_order().map(|_| ())
    }

    /// Find a cycle path starting from a node for error reporting
    fn find_cycle_path(&self, start: NodeIndex) -> String {
        let mut path: Vec<String> = vec![self.graph[start].to_string()];
        let mut current = start;
        let mut visited = HashSet::new();
        visited.insert(current);

        while let Some(edge) = self.graph.edges(current).next() {
            let target = edge.target();
            path.push(self.graph[target].to_string());

            if target == start || visited.contains(&target) {
                break;
            }

            visited.insert(target);
            current = target;
        }

        path.join(" -> ")
    }

    /// Get stages in topological order (dependencies first)
    pub fn topological_order(&self) -> CoreResult<Vec<Stage>> {
        match toposort(&self.graph, None) {
            Ok(indices) => Ok(indices.into_iter().map(|idx| self.graph[idx]).collect()),
            Err(cycle) => Err(CoreError::CircularDependency {
                cycle: self.find_cycle_path(cycle.node_id()),
            }),
        }
    }

    /// Get direct dependencies of a stage
    pub fn dependencies(&self, stage: Stage) -> Vec<Stage> {
        self.neighbors(stage, petgraph::Direction::Incoming)
    }

    /// Get direct dependents of a stage
    pub fn dependents(&self, stage: Stage) -> Vec<Stage> {
        self.neighbors(stage, petgraph::Direction::Outgoing)
    }

    fn neighbors(&self, stage: Stage, direction: petgraph::Direction) -> Vec<Stage> {
        let Some(&idx) = self.node_map.get(&stage) else {
            return Vec::new();
        };
        let mut out: Vec<Stage> = self
            .graph
            .edges_directed(idx, direction)
            .map(|e| match direction {
                petgraph::Direction::Incoming => self.graph[e.source()],
                petgraph::Direction::Outgoing => self.graph[e.target()],
            })
            .collect();
        out.sort();
        out
    }

    /// Check if a stage exists in the DAG
    pub fn contains(&self, stage: Stage) -> bool {
        self.node_map.contains_key(&stage)
    }
}

impl Default for StageDag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "dag_test.rs"]
mod tests;
