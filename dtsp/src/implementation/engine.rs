// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! This module provides the branch-and-bound engine. That is, the component
//! which enumerates the tours of a network in depth first order and prunes
//! the branches that cannot beat the best tour found so far.
//!
//! The search is purely iterative: its whole state is made of the current
//! path (along with the cost of each of its prefixes) and, for each depth,
//! the set of children of the vertex at that depth that have already been
//! explored (or cut). This is what makes it possible to suspend the search
//! after any number of steps, to export part of the remaining search space
//! as a partial problem and to resume the search from such a partial problem.

use std::sync::Arc;

use derive_builder::Builder;
use fxhash::FxHashSet;

use crate::{Cost, Error, Network, PartialProblem, Progress, Result, Solution, TourCallback, VertexId};

/// The switches governing how an engine explores its search space. None of
/// them affects the optimality of the result.
#[derive(Debug, Clone, Copy, Builder)]
pub struct EngineConfig {
    /// When true (default), a branch is cut as soon as the cost of its
    /// prefix plus the next edge is no better than the best known tour.
    #[builder(default="true")]
    pub cutting: bool,
    /// When true (default), the children of a vertex are explored by
    /// increasing edge weight instead of index order.
    #[builder(default="true")]
    pub min_heuristic: bool,
}
impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig { cutting: true, min_heuristic: true }
    }
}

/// The lifecycle of the search owned by an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Nothing has been explored yet, the search starts at the start vertex
    Fresh,
    /// There are unexplored branches left
    Running,
    /// The whole search space has been explored
    Exhausted,
}

/// A few counters telling how much work an engine has done
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    /// The number of steps (moving down to a child or backtracking)
    pub expansions: usize,
    /// The number of complete tours that have been reached
    pub tours: usize,
    /// The number of branches that have been cut
    pub cuts: usize,
}

/// The branch-and-bound engine.
///
/// # Example
/// ```
/// # use dtsp::*;
/// # use std::sync::Arc;
/// let network = Network::from_matrix(&[
///     -1,  3,  9,
///      3, -1,  4,
///      9,  4, -1,
/// ]).unwrap();
/// let mut engine = Engine::new(Arc::new(network), VertexId(0)).unwrap();
/// let progress   = engine.solve(None);
///
/// assert!(progress.done);
/// assert_eq!(Some(7), engine.best_cost());
/// assert_eq!(Some(vec![1, 2, 3]), engine.best_solution().map(|s| s.path));
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    network: Arc<Network>,
    start: VertexId,
    cutting: bool,
    min_heuristic: bool,
    status: Status,
    /// The vertices on the current path, the node being explored is last
    path: Vec<VertexId>,
    /// `costs[i]` is the cost of the path prefix ending at `path[i]`
    costs: Vec<Cost>,
    /// `pruned[d]` holds the children of `path[d]` which must not be
    /// explored (anymore)
    pruned: Vec<FxHashSet<VertexId>>,
    best_tour: Option<Vec<VertexId>>,
    best_cost: Option<Cost>,
    stats: Statistics,
    /// Scratch buffer holding the candidates of one level
    buffer: Vec<(VertexId, Cost)>,
}

impl Engine {
    /// Creates an engine exploring the tours of the network that begin with
    /// the given start vertex. It fails with `InvalidPath` when the start
    /// vertex does not belong to the network.
    pub fn new(network: Arc<Network>, start: VertexId) -> Result<Self> {
        Self::with_config(network, start, EngineConfig::default())
    }
    /// Same as new, but lets you customize the way the search is carried out
    pub fn with_config(network: Arc<Network>, start: VertexId, config: EngineConfig) -> Result<Self> {
        let n = network.nb_vertices();
        if start.id() >= n {
            return Err(Error::InvalidPath(format!(
                "the start vertex {start} is not part of a network of {n} vertices")));
        }
        Ok(Engine {
            network,
            start,
            cutting: config.cutting,
            min_heuristic: config.min_heuristic,
            status: Status::Fresh,
            path: Vec::with_capacity(n),
            costs: Vec::with_capacity(n),
            pruned: vec![FxHashSet::default(); n],
            best_tour: None,
            best_cost: None,
            stats: Statistics::default(),
            buffer: Vec::with_capacity(n),
        })
    }

    /// The network whose tours are being explored
    pub fn network(&self) -> &Arc<Network> {
        &self.network
    }
    pub fn status(&self) -> Status {
        self.status
    }
    pub fn statistics(&self) -> Statistics {
        self.stats
    }
    /// The number of vertices on the current path
    pub fn depth(&self) -> usize {
        self.path.len()
    }
    /// The best tour found so far (optimal for the owned search space once
    /// the engine is exhausted)
    pub fn best_path(&self) -> Option<&[VertexId]> {
        self.best_tour.as_deref()
    }
    /// The cost of the best tour found so far. `None` stands for infinity.
    pub fn best_cost(&self) -> Option<Cost> {
        self.best_cost
    }
    /// The best tour found so far along with its cost, using vertex names
    pub fn best_solution(&self) -> Option<Solution> {
        match (&self.best_tour, self.best_cost) {
            (Some(tour), Some(cost)) => Some(Solution {
                path: tour.iter().map(|v| v.name()).collect(),
                cost,
            }),
            _ => None,
        }
    }
    /// Flips the cutting switch and returns its new value
    pub fn toggle_cutting(&mut self) -> bool {
        self.cutting = !self.cutting;
        self.cutting
    }
    /// Flips the min-heuristic switch and returns its new value
    pub fn toggle_min_heuristic(&mut self) -> bool {
        self.min_heuristic = !self.min_heuristic;
        self.min_heuristic
    }

    /// Installs a tour known from elsewhere as the incumbent when it is
    /// strictly better than the current one. It returns true iff the tour
    /// has been installed.
    pub fn set_primal(&mut self, tour: &[usize], cost: Cost) -> Result<bool> {
        if self.best_cost.map_or(false, |best| best <= cost) {
            return Ok(false);
        }
        self.best_tour = Some(self.network.resolve(tour)?);
        self.best_cost = Some(cost);
        Ok(true)
    }

    /// Advances the search by at most `step_budget` steps (or until the end
    /// when no budget is given).
    pub fn solve(&mut self, step_budget: Option<usize>) -> Progress {
        self.solve_with(step_budget, &mut |_: &[VertexId], _: Cost| {})
    }

    /// Same as solve, but the callback is told about every complete tour
    /// reached by the search.
    pub fn solve_with(&mut self, step_budget: Option<usize>, callback: &mut dyn TourCallback) -> Progress {
        if self.status == Status::Fresh {
            self.initialize();
        }

        let mut steps = 0;
        while self.status == Status::Running {
            if step_budget.map_or(false, |budget| steps >= budget) {
                return Progress { done: false };
            }
            steps += 1;
            self.stats.expansions += 1;

            let level = self.path.len() - 1;
            match self.next_child(level) {
                Some((child, weight)) => self.descend(child, weight),
                None => {
                    if self.path.len() == self.network.nb_vertices() {
                        self.record_tour(callback);
                    }
                    self.backtrack();
                }
            }
        }
        Progress { done: true }
    }

    /// Resets the search state so that only the subtree rooted at the given
    /// prefix (expressed with vertex names) gets explored. The best known
    /// tour is kept.
    pub fn set_partial_problem(&mut self, prefix: &[usize]) -> Result<()> {
        let n = self.network.nb_vertices();
        if prefix.is_empty() {
            return Err(Error::InvalidPath("a partial problem cannot be empty".to_string()));
        }
        if prefix.len() > n {
            return Err(Error::InvalidPath(format!(
                "a partial problem of {} vertices exceeds a network of {n} vertices", prefix.len())));
        }
        let vertices = self.network.resolve(prefix)?;

        let mut seen = FxHashSet::default();
        for v in vertices.iter().copied() {
            if !seen.insert(v) {
                return Err(Error::InvalidPath(format!("vertex {v} is visited twice")));
            }
        }
        let mut costs = Vec::with_capacity(n);
        costs.push(0);
        for pair in vertices.windows(2) {
            let weight = self.network.weight(pair[0], pair[1])
                .ok_or_else(|| Error::InvalidPath(format!("there is no edge from {} to {}", pair[0], pair[1])))?;
            costs.push(costs[costs.len() - 1] + weight);
        }

        for set in self.pruned.iter_mut() {
            set.clear();
        }
        for (level, next) in vertices.iter().skip(1).enumerate() {
            self.pruned[level].extend(self.network.vertices().filter(|v| v != next));
        }
        self.path   = vertices;
        self.costs  = costs;
        self.status = Status::Running;
        Ok(())
    }

    /// Removes one unexplored branch starting at the given depth from this
    /// engine and returns it as a partial problem. The donated prefix holds
    /// `depth + 1` vertices: it is a child of the vertex at `depth - 1` on
    /// the current path. The branch being donated is the one this engine
    /// would have explored last.
    pub fn get_partial_problem(&mut self, depth: usize) -> Option<PartialProblem> {
        if self.status == Status::Fresh {
            self.initialize();
        }
        if self.status == Status::Exhausted || depth == 0 || self.path.len() < depth {
            return None;
        }
        let level = depth - 1;
        let mut buffer = std::mem::take(&mut self.buffer);
        self.candidates(level, &mut buffer);
        let donated = if self.min_heuristic {
            buffer.iter().max_by_key(|(_, w)| *w).map(|(v, _)| *v)
        } else {
            buffer.last().map(|(v, _)| *v)
        };
        self.buffer = buffer;

        let donated = donated?;
        self.pruned[level].insert(donated);
        let mut prefix = self.path[..=level].iter().map(|v| v.name()).collect::<Vec<_>>();
        prefix.push(donated.name());
        Some(prefix)
    }

    fn initialize(&mut self) {
        for set in self.pruned.iter_mut() {
            set.clear();
        }
        self.path.clear();
        self.costs.clear();
        self.path.push(self.start);
        self.costs.push(0);
        self.status = Status::Running;
    }

    /// Picks the child of `path[level]` to explore next
    fn next_child(&mut self, level: usize) -> Option<(VertexId, Cost)> {
        let mut buffer = std::mem::take(&mut self.buffer);
        self.candidates(level, &mut buffer);
        let next = if self.min_heuristic {
            buffer.iter().min_by_key(|(_, w)| *w).copied()
        } else {
            buffer.first().copied()
        };
        self.buffer = buffer;
        next
    }

    /// Fills the buffer with the children of `path[level]` that remain to be
    /// explored, in index order. The ancestors of the child, the child which
    /// is currently on the path and the pruned children never qualify. When
    /// cutting is enabled, the children that cannot improve the best tour are
    /// pruned on the fly.
    fn candidates(&mut self, level: usize, buffer: &mut Vec<(VertexId, Cost)>) {
        buffer.clear();
        let parent  = self.path[level];
        let current = self.path.get(level + 1).copied();
        let prefix  = self.costs[level];

        for edge in self.network.edges(parent) {
            let Some(weight) = edge.weight else { continue };
            let child = edge.dst;
            if Some(child) == current
                || self.path[..=level].contains(&child)
                || self.pruned[level].contains(&child) {
                continue;
            }
            if self.cutting && self.best_cost.map_or(false, |best| prefix + weight >= best) {
                self.pruned[level].insert(child);
                self.stats.cuts += 1;
                continue;
            }
            buffer.push((child, weight));
        }
    }

    fn descend(&mut self, child: VertexId, weight: Cost) {
        let cost = self.costs[self.costs.len() - 1] + weight;
        self.path.push(child);
        self.costs.push(cost);
        // a fresh visit of that depth: none of the children is explored yet
        let depth = self.path.len() - 1;
        self.pruned[depth].clear();
    }

    fn record_tour(&mut self, callback: &mut dyn TourCallback) {
        let cost = self.costs[self.costs.len() - 1];
        self.stats.tours += 1;
        callback.apply(&self.path, cost);
        if self.best_cost.map_or(true, |best| cost < best) {
            self.best_cost = Some(cost);
            self.best_tour = Some(self.path.clone());
        }
    }

    fn backtrack(&mut self) {
        let popped = self.path.pop();
        self.costs.pop();
        match (popped, self.path.len()) {
            (Some(v), len) if len > 0 => { self.pruned[len - 1].insert(v); },
            _ => self.status = Status::Exhausted,
        }
    }
}


// ############################################################################
// #### TESTS #################################################################
// ############################################################################
