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

//! This module provides the worker runtime: the component wrapping one
//! engine behind the wire protocol.
//!
//! A worker explores its partial problem by slices of a fixed number of
//! steps. Between two slices it drains the control messages sent by the
//! coordinator (split requests, better solutions, new problems). This is what
//! lets it donate work and tighten its bound while it is busy.

use std::sync::Arc;

use derive_builder::Builder;
use tracing::{debug, warn};

use crate::{Cost, CoordinatorLink, Engine, EngineConfig, Error, Network, PartialProblem, Result, Solution, ToCoordinator, ToWorker};

/// The knobs of a worker
#[derive(Debug, Clone, Builder)]
pub struct WorkerConfig {
    /// The number of steps the engine performs between two looks at the
    /// control messages (default 10_000)
    #[builder(default="10_000")]
    pub step_budget: usize,
    /// The split depth advertised to the coordinator. By default, it is
    /// derived from the size of the network.
    #[builder(default, setter(strip_option))]
    pub split_depth: Option<usize>,
    /// The way the engine searches
    #[builder(default)]
    pub engine: EngineConfig,
}
impl Default for WorkerConfig {
    fn default() -> Self {
        WorkerConfig { step_budget: 10_000, split_depth: None, engine: EngineConfig::default() }
    }
}

/// The split depth a worker recommends for a network of `n` vertices: deep
/// enough for the donated subtrees to be worth shipping, shallow enough for
/// them to hold a decent share of the work.
pub fn default_split_depth(n: usize) -> usize {
    (n / 4).clamp(1, n.max(2) - 1)
}

/// A worker bound to its link with the coordinator
pub struct Worker<C> {
    link: C,
    config: WorkerConfig,
    engine: Option<Engine>,
    /// True iff the engine holds a partial problem that is not exhausted
    has_problem: bool,
    started: bool,
    /// The best cost the coordinator knows about (as far as we know)
    known: Option<Cost>,
}

impl <C: CoordinatorLink> Worker<C> {
    pub fn new(link: C) -> Self {
        Self::with_config(link, WorkerConfig::default())
    }
    pub fn with_config(link: C, config: WorkerConfig) -> Self {
        Worker { link, config, engine: None, has_problem: false, started: false, known: None }
    }

    /// The engine of this worker (once provisioned)
    pub fn engine(&self) -> Option<&Engine> {
        self.engine.as_ref()
    }
    /// True iff the worker is exploring a partial problem
    pub fn is_solving(&self) -> bool {
        self.started && self.has_problem && self.engine.is_some()
    }

    /// Serves the coordinator until it closes the link
    pub fn run(mut self) -> Result<()> {
        loop {
            let outcome = if self.is_solving() {
                self.drain().and_then(|_| self.solve_slice())
            } else {
                self.link.recv().and_then(|message| self.on_message(message))
            };
            match outcome {
                Ok(())                 => {},
                Err(Error::Disconnected) => {
                    debug!("coordinator is gone, worker stops");
                    return Ok(());
                },
                Err(Error::Codec(e))   => warn!("dropping an undecodable frame: {e}"),
                Err(e)                 => return Err(e),
            }
        }
    }

    /// Handles every message that is already waiting
    pub fn drain(&mut self) -> Result<()> {
        while let Some(message) = self.link.try_recv()? {
            self.on_message(message)?;
        }
        Ok(())
    }

    /// Explores one slice of the current partial problem, reports what needs
    /// to be reported and asks for more work once the problem is exhausted.
    pub fn solve_slice(&mut self) -> Result<()> {
        if !self.is_solving() {
            return Ok(());
        }
        let budget = self.config.step_budget.max(1);
        let Some(engine) = self.engine.as_mut() else { return Ok(()) };
        let progress = engine.solve(Some(budget));
        self.report_improvement()?;
        if progress.done {
            debug!("partial problem exhausted, requesting more work");
            self.has_problem = false;
            self.link.send(&ToCoordinator::Problem)?;
        }
        Ok(())
    }

    /// Handles one message of the coordinator
    pub fn on_message(&mut self, message: ToWorker) -> Result<()> {
        match message {
            ToWorker::Init { graph, start }  => self.on_init(&graph, start),
            ToWorker::Problem { problem }    => self.on_problem(problem),
            ToWorker::Solution(solution)     => self.on_solution(solution),
            ToWorker::Split { depth }        => self.on_split(depth),
            ToWorker::Start                  => {
                self.started = true;
                self.link.send(&ToCoordinator::Start(true))
            },
        }
    }

    fn on_init(&mut self, graph: &[isize], start: usize) -> Result<()> {
        self.engine      = None;
        self.has_problem = false;
        self.known       = None;

        let engine = Network::from_matrix(graph).and_then(|network| {
            let start = network.vertex(start).ok_or_else(|| Error::InvalidPath(format!(
                "there is no start vertex {start} in a network of {} vertices", network.nb_vertices())))?;
            Engine::with_config(Arc::new(network), start, self.config.engine)
        });
        match engine {
            Ok(engine) => {
                let n     = engine.network().nb_vertices();
                let depth = self.config.split_depth.unwrap_or_else(|| default_split_depth(n));
                debug!(vertices = n, split_depth = depth, "worker provisioned");
                self.engine = Some(engine);
                self.link.send(&ToCoordinator::Init { done: true, optimal_depth: depth })
            },
            Err(e) => {
                warn!("cannot build the network: {e}");
                self.link.send(&ToCoordinator::Init { done: false, optimal_depth: 0 })
            }
        }
    }

    fn on_problem(&mut self, problem: PartialProblem) -> Result<()> {
        let Some(engine) = self.engine.as_mut() else {
            warn!(?problem, "received a problem before the network");
            return Ok(());
        };
        match engine.set_partial_problem(&problem) {
            Ok(()) => {
                debug!(?problem, "exploring partial problem");
                self.has_problem = true;
                Ok(())
            },
            Err(e) => {
                warn!(?problem, "rejecting partial problem: {e}");
                self.has_problem = false;
                self.link.send(&ToCoordinator::Problem)
            }
        }
    }

    fn on_solution(&mut self, solution: Solution) -> Result<()> {
        let Some(engine) = self.engine.as_mut() else { return Ok(()) };
        if !solution.improves_cost(self.known) {
            return Ok(());
        }
        match engine.set_primal(&solution.path, solution.cost) {
            Ok(_)  => self.known = Some(solution.cost),
            Err(e) => warn!(%solution, "ignoring broadcast solution: {e}"),
        }
        Ok(())
    }

    /// Donates a branch at the requested depth, or at a deeper one when
    /// nothing is left at that depth.
    fn on_split(&mut self, depth: usize) -> Result<()> {
        let mut donated = None;
        if self.has_problem {
            if let Some(engine) = self.engine.as_mut() {
                donated = (depth.max(1)..=engine.depth())
                    .find_map(|d| engine.get_partial_problem(d));
            }
        }
        debug!(depth, ?donated, "answering split request");
        self.link.send(&ToCoordinator::Split { problem: donated })
    }

    fn report_improvement(&mut self) -> Result<()> {
        let Some(solution) = self.engine.as_ref().and_then(|e| e.best_solution()) else { return Ok(()) };
        if solution.improves_cost(self.known) {
            self.known = Some(solution.cost);
            self.link.send(&ToCoordinator::Solution(solution))?;
        }
        Ok(())
    }
}


// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_worker {
    use std::{cell::RefCell, collections::VecDeque};

    use crate::*;

    /// A scripted coordinator: it hands out the queued messages and records
    /// what the worker answers
    #[derive(Default)]
    struct Script {
        inbound: RefCell<VecDeque<ToWorker>>,
        outbound: RefCell<Vec<ToCoordinator>>,
    }
    impl CoordinatorLink for &Script {
        fn send(&self, message: &ToCoordinator) -> Result<()> {
            self.outbound.borrow_mut().push(message.clone());
            Ok(())
        }
        fn recv(&self) -> Result<ToWorker> {
            self.inbound.borrow_mut().pop_front().ok_or(Error::Disconnected)
        }
        fn try_recv(&self) -> Result<Option<ToWorker>> {
            Ok(self.inbound.borrow_mut().pop_front())
        }
    }
    impl Script {
        fn push(&self, message: ToWorker) {
            self.inbound.borrow_mut().push_back(message);
        }
        fn take(&self) -> Vec<ToCoordinator> {
            self.outbound.borrow_mut().drain(..).collect()
        }
    }

    fn five() -> Vec<isize> {
        vec![
             -1, 906, 814,  30, 198,
            906,  -1, 633, 225, 103,
            814, 633,  -1, 462, 553,
             30, 225, 462,  -1, 814,
            198, 103, 553, 814,  -1,
        ]
    }
    fn init() -> ToWorker {
        ToWorker::Init { graph: five(), start: 1 }
    }
    fn config(step_budget: usize, cutting: bool) -> WorkerConfig {
        let engine = EngineConfigBuilder::default().cutting(cutting).build().unwrap();
        WorkerConfigBuilder::default()
            .step_budget(step_budget)
            .engine(engine)
            .build()
            .unwrap()
    }

    #[test]
    fn default_split_depth_grows_with_the_network() {
        assert_eq!(1, default_split_depth(1));
        assert_eq!(1, default_split_depth(2));
        assert_eq!(1, default_split_depth(5));
        assert_eq!(3, default_split_depth(14));
        assert_eq!(4, default_split_depth(16));
    }
    #[test]
    fn init_is_acknowledged_with_the_split_depth() {
        let script = Script::default();
        let mut w  = Worker::new(&script);
        w.on_message(init()).unwrap();
        assert_eq!(vec![ToCoordinator::Init { done: true, optimal_depth: 1 }], script.take());
        assert!(w.engine().is_some());
    }
    #[test]
    fn the_configured_split_depth_wins() {
        let script = Script::default();
        let config = WorkerConfigBuilder::default().split_depth(3).build().unwrap();
        let mut w  = Worker::with_config(&script, config);
        w.on_message(init()).unwrap();
        assert_eq!(vec![ToCoordinator::Init { done: true, optimal_depth: 3 }], script.take());
    }
    #[test]
    fn a_malformed_graph_is_refused() {
        let script = Script::default();
        let mut w  = Worker::new(&script);
        w.on_message(ToWorker::Init { graph: vec![-1, 1, 1], start: 1 }).unwrap();
        assert_eq!(vec![ToCoordinator::Init { done: false, optimal_depth: 0 }], script.take());
        assert!(w.engine().is_none());
    }
    #[test]
    fn an_unknown_start_vertex_is_refused() {
        let script = Script::default();
        let mut w  = Worker::new(&script);
        w.on_message(ToWorker::Init { graph: five(), start: 6 }).unwrap();
        assert_eq!(vec![ToCoordinator::Init { done: false, optimal_depth: 0 }], script.take());
    }
    #[test]
    fn start_is_acknowledged() {
        let script = Script::default();
        let mut w  = Worker::new(&script);
        w.on_message(init()).unwrap();
        w.on_message(ToWorker::Start).unwrap();
        assert_eq!(ToCoordinator::Start(true), script.take()[1]);
    }
    #[test]
    fn an_invalid_problem_is_rejected_and_more_work_requested() {
        let script = Script::default();
        let mut w  = Worker::new(&script);
        w.on_message(init()).unwrap();
        w.on_message(ToWorker::Start).unwrap();
        script.take();
        w.on_message(ToWorker::Problem { problem: vec![1, 1] }).unwrap();
        assert_eq!(vec![ToCoordinator::Problem], script.take());
        assert!(!w.is_solving());
    }
    #[test]
    fn solving_reports_the_solution_then_requests_work() {
        let script = Script::default();
        let mut w  = Worker::new(&script);
        w.on_message(init()).unwrap();
        w.on_message(ToWorker::Start).unwrap();
        w.on_message(ToWorker::Problem { problem: vec![1] }).unwrap();
        script.take();
        assert!(w.is_solving());
        w.solve_slice().unwrap();
        assert_eq!(vec![
            ToCoordinator::Solution(Solution { path: vec![1, 4, 2, 5, 3], cost: 911 }),
            ToCoordinator::Problem,
        ], script.take());
        assert!(!w.is_solving());
    }
    #[test]
    fn slices_are_bounded_by_the_step_budget() {
        let script = Script::default();
        let mut w  = Worker::with_config(&script, config(10, false));
        w.on_message(init()).unwrap();
        w.on_message(ToWorker::Start).unwrap();
        w.on_message(ToWorker::Problem { problem: vec![1] }).unwrap();
        script.take();
        w.solve_slice().unwrap();
        assert!(w.is_solving());
        assert_eq!(10, w.engine().map(|e| e.statistics().expansions).unwrap());
        // the first tour found is reported right away
        assert_eq!(vec![ToCoordinator::Solution(Solution { path: vec![1, 4, 2, 5, 3], cost: 911 })], script.take());
    }
    #[test]
    fn nothing_is_solved_before_the_start() {
        let script = Script::default();
        let mut w  = Worker::new(&script);
        w.on_message(init()).unwrap();
        w.on_message(ToWorker::Problem { problem: vec![1] }).unwrap();
        assert!(!w.is_solving());
        w.solve_slice().unwrap();
        assert_eq!(Some(0), w.engine().map(|e| e.statistics().expansions));
    }
    #[test]
    fn split_requests_donate_a_branch() {
        let script = Script::default();
        let mut w  = Worker::with_config(&script, config(1, false));
        w.on_message(init()).unwrap();
        w.on_message(ToWorker::Start).unwrap();
        w.on_message(ToWorker::Problem { problem: vec![1] }).unwrap();
        w.solve_slice().unwrap();
        script.take();
        w.on_message(ToWorker::Split { depth: 1 }).unwrap();
        assert_eq!(vec![ToCoordinator::Split { problem: Some(vec![1, 2]) }], script.take());
    }
    #[test]
    fn split_requests_fall_back_to_deeper_levels() {
        let script = Script::default();
        let mut w  = Worker::with_config(&script, config(1, false));
        w.on_message(init()).unwrap();
        w.on_message(ToWorker::Start).unwrap();
        // only the subtree of [1, 4] remains at depth 1
        w.on_message(ToWorker::Problem { problem: vec![1, 4] }).unwrap();
        w.solve_slice().unwrap();
        script.take();
        w.on_message(ToWorker::Split { depth: 1 }).unwrap();
        match script.take().pop() {
            Some(ToCoordinator::Split { problem: Some(p) }) => {
                assert_eq!(3, p.len());
                assert_eq!([1, 4], p[..2]);
            },
            other => panic!("unexpected {other:?}"),
        }
    }
    #[test]
    fn an_idle_worker_has_nothing_to_donate() {
        let script = Script::default();
        let mut w  = Worker::new(&script);
        w.on_message(init()).unwrap();
        script.take();
        w.on_message(ToWorker::Split { depth: 1 }).unwrap();
        assert_eq!(vec![ToCoordinator::Split { problem: None }], script.take());
    }
    #[test]
    fn broadcast_solutions_tighten_the_bound_and_are_not_echoed() {
        let script = Script::default();
        let mut w  = Worker::new(&script);
        w.on_message(init()).unwrap();
        w.on_message(ToWorker::Start).unwrap();
        w.on_message(ToWorker::solution(vec![1, 4, 2, 5, 3], 911)).unwrap();
        w.on_message(ToWorker::Problem { problem: vec![1, 5] }).unwrap();
        script.take();
        w.solve_slice().unwrap();
        // nothing in [1, 5] beats 911: no solution is reported
        assert_eq!(vec![ToCoordinator::Problem], script.take());
        assert_eq!(Some(911), w.engine().and_then(|e| e.best_cost()));
    }
    #[test]
    fn worse_broadcasts_are_ignored() {
        let script = Script::default();
        let mut w  = Worker::new(&script);
        w.on_message(init()).unwrap();
        w.on_message(ToWorker::solution(vec![1, 4, 2, 5, 3], 911)).unwrap();
        w.on_message(ToWorker::solution(vec![1, 2, 3, 4, 5], 2815)).unwrap();
        assert_eq!(Some(911), w.engine().and_then(|e| e.best_cost()));
    }
    #[test]
    fn run_serves_until_the_link_closes() {
        let script = Script::default();
        script.push(init());
        script.push(ToWorker::Start);
        script.push(ToWorker::Problem { problem: vec![1] });
        Worker::new(&script).run().unwrap();
        assert_eq!(vec![
            ToCoordinator::Init { done: true, optimal_depth: 1 },
            ToCoordinator::Start(true),
            ToCoordinator::Solution(Solution { path: vec![1, 4, 2, 5, 3], cost: 911 }),
            ToCoordinator::Problem,
        ], script.take());
    }
}
