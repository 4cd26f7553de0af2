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

//! This module provides the coordinator of a distributed resolution. The
//! coordinator never explores the search space itself: it provisions the
//! workers, keeps the queue of partial problems that remain to be explored,
//! hands them to the idle workers and asks the busy ones to split their work
//! whenever someone starves. It is also the keeper of the global solution.
//!
//! The coordinator is a plain state machine. Each of its `on_xxx` methods
//! handles one event and never blocks, which makes it easy to drive from any
//! event loop (`run` is the one that comes with this crate).

use std::{collections::{BTreeMap, VecDeque}, sync::Arc, time::{Duration, Instant}};

use derive_builder::Builder;
use tracing::{debug, info, warn};

use crate::{Completion, Cutoff, Error, Event, Inbox, Network, NoCutoff, PartialProblem, Reason, Result, Solution, ToCoordinator, ToWorker, VertexId, WorkerId, WorkerLink};

/// The knobs of a coordinator
#[derive(Debug, Clone, Builder)]
pub struct CoordinatorConfig {
    /// How often the starvation watchdog runs (default 500ms)
    #[builder(default="Duration::from_millis(500)")]
    pub watchdog_period: Duration,
    /// The number of ready workers needed to start the resolution (default 1)
    #[builder(default="1")]
    pub quorum: usize,
}
impl Default for CoordinatorConfig {
    fn default() -> Self {
        CoordinatorConfig { watchdog_period: Duration::from_millis(500), quorum: 1 }
    }
}

/// What the coordinator knows about one of its workers
struct WorkerRecord<L> {
    link: L,
    /// The split granularity advertised by the worker. `None` until the
    /// worker acknowledged its provisioning.
    split_depth: Option<usize>,
    /// The partial problem the worker is busy with (`None` when idle)
    problem: Option<PartialProblem>,
}
impl <L> WorkerRecord<L> {
    fn is_ready(&self) -> bool {
        self.split_depth.is_some()
    }
    fn is_idle(&self) -> bool {
        self.is_ready() && self.problem.is_none()
    }
    fn is_busy(&self) -> bool {
        self.problem.is_some()
    }
}

/// The coordinator of a distributed resolution
pub struct Coordinator<'a, L> {
    network: Arc<Network>,
    start: VertexId,
    config: CoordinatorConfig,
    cutoff: &'a (dyn Cutoff + Send + Sync),

    /// Ordered by id so that the "first" idle worker is well defined
    workers: BTreeMap<WorkerId, WorkerRecord<L>>,
    queue: VecDeque<PartialProblem>,
    best: Option<Solution>,
    started: bool,
    complete: bool,
    abort: Option<Reason>,
    /// The workers whose link failed while handling the current event
    lost: Vec<WorkerId>,
}

impl <'a, L: WorkerLink> Coordinator<'a, L> {
    /// Creates a coordinator for the tours of `network` starting at `start`
    pub fn new(network: Arc<Network>, start: VertexId) -> Result<Self> {
        Self::with_config(network, start, CoordinatorConfig::default())
    }
    pub fn with_config(network: Arc<Network>, start: VertexId, config: CoordinatorConfig) -> Result<Self> {
        if network.vertex(start.name()).is_none() {
            return Err(Error::InvalidPath(format!(
                "the start vertex {start} is not part of a network of {} vertices", network.nb_vertices())));
        }
        Ok(Coordinator {
            network,
            start,
            config,
            cutoff: &NoCutoff,
            workers: BTreeMap::new(),
            queue: VecDeque::new(),
            best: None,
            started: false,
            complete: false,
            abort: None,
            lost: vec![],
        })
    }
    /// Grants the resolution a stop criterion
    pub fn with_cutoff(mut self, cutoff: &'a (dyn Cutoff + Send + Sync)) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn is_started(&self) -> bool {
        self.started
    }
    /// True once the resolution is over (either proved or stopped)
    pub fn is_complete(&self) -> bool {
        self.complete || self.abort.is_some()
    }
    pub fn best_solution(&self) -> Option<&Solution> {
        self.best.as_ref()
    }
    /// The number of partial problems waiting for a worker
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }
    /// The number of workers that acknowledged their provisioning
    pub fn nb_ready(&self) -> usize {
        self.workers.values().filter(|w| w.is_ready()).count()
    }
    /// The number of workers currently exploring a partial problem
    pub fn nb_busy(&self) -> usize {
        self.workers.values().filter(|w| w.is_busy()).count()
    }
    /// The partial problem the given worker is busy with
    pub fn assignment(&self, worker: WorkerId) -> Option<&PartialProblem> {
        self.workers.get(&worker).and_then(|w| w.problem.as_ref())
    }
    pub fn completion(&self) -> Completion {
        Completion {
            is_exact: self.complete && self.abort.is_none(),
            best: self.best.clone(),
        }
    }

    /// Drives the coordinator with the events of the given inbox until the
    /// resolution is over. The watchdog runs at least once per period.
    pub fn run<I: Inbox<Link = L>>(&mut self, inbox: &I) -> Result<Completion> {
        let period = self.config.watchdog_period;
        let mut next_tick = Instant::now() + period;
        while !self.is_complete() {
            let timeout = next_tick.saturating_duration_since(Instant::now());
            match inbox.recv_timeout(timeout) {
                Ok(Some(event))       => self.on_event(event),
                Ok(None)              => {},
                Err(Error::Codec(e))  => warn!("dropping an undecodable frame: {e}"),
                Err(e)                => return Err(e),
            }
            if Instant::now() >= next_tick {
                self.on_tick();
                next_tick = Instant::now() + period;
            }
        }
        info!(best = ?self.best, exact = self.abort.is_none(), "resolution is over");
        Ok(self.completion())
    }

    /// Handles one transport event
    pub fn on_event(&mut self, event: Event<L>) {
        match event {
            Event::Connected { worker, link }     => self.register_worker(worker, link),
            Event::Message { worker, message }    => self.on_message(worker, message),
            Event::Disconnected { worker }        => self.on_disconnect(worker),
        }
    }

    /// Handles a message received from the given worker
    pub fn on_message(&mut self, worker: WorkerId, message: ToCoordinator) {
        match message {
            ToCoordinator::Init { done, optimal_depth } => self.on_worker_ready(worker, done, optimal_depth),
            ToCoordinator::Problem                      => self.on_worker_requests_work(worker),
            ToCoordinator::Solution(solution)           => self.on_worker_reports_solution(worker, solution),
            ToCoordinator::Split { problem }            => self.on_worker_reports_split(worker, problem),
            ToCoordinator::Start(ack)                   => debug!(worker = worker.0, ack, "start acknowledged"),
        }
    }

    /// Records a new worker and provisions it with the network
    pub fn register_worker(&mut self, worker: WorkerId, link: L) {
        debug!(worker = worker.0, "worker connected");
        let init = ToWorker::Init { graph: self.network.to_matrix(), start: self.start.name() };
        self.workers.insert(worker, WorkerRecord { link, split_depth: None, problem: None });
        self.send(worker, &init);
        self.settle();
    }

    fn on_worker_ready(&mut self, worker: WorkerId, done: bool, optimal_depth: usize) {
        let started = self.started;
        let Some(record) = self.workers.get_mut(&worker) else { return };
        if !done {
            warn!(worker = worker.0, "worker failed to build the network, it will not be used");
            return;
        }
        record.split_depth = Some(optimal_depth.max(1));
        debug!(worker = worker.0, split_depth = optimal_depth, "worker ready");

        if started {
            self.send(worker, &ToWorker::Start);
            if let Some(best) = self.best.clone() {
                self.send(worker, &ToWorker::Solution(best));
            }
            self.dispatch();
        } else if self.nb_ready() >= self.config.quorum.max(1) {
            self.start();
        }
        self.settle();
    }

    /// Starts the resolution: the queue is seeded with the whole problem and
    /// every ready worker is told to start.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        info!(workers = self.nb_ready(), "starting the resolution");
        self.started = true;
        self.queue.push_back(vec![self.start.name()]);
        let ready = self.workers.iter()
            .filter(|(_, w)| w.is_ready())
            .map(|(id, _)| *id)
            .collect::<Vec<_>>();
        for worker in ready {
            self.send(worker, &ToWorker::Start);
        }
        self.dispatch();
        self.settle();
    }

    /// Hands the queued partial problems to the idle workers for as long as
    /// there are both.
    pub fn dispatch(&mut self) {
        if !self.started {
            return;
        }
        while !self.queue.is_empty() {
            let Some(worker) = self.first_idle() else { break };
            if let Some(problem) = self.queue.pop_front() {
                self.assign(worker, problem);
            }
        }
    }

    /// The worker has nothing left to explore
    pub fn on_worker_requests_work(&mut self, worker: WorkerId) {
        let Some(record) = self.workers.get_mut(&worker) else { return };
        record.problem = None;
        if !self.started || !record.is_ready() {
            return;
        }
        let depth = record.split_depth.unwrap_or(1);

        if let Some(problem) = self.queue.pop_front() {
            self.assign(worker, problem);
        } else if self.nb_busy() > 0 {
            self.request_splits(depth);
        }
        self.settle();
    }

    /// The worker answered a split request
    pub fn on_worker_reports_split(&mut self, worker: WorkerId, problem: Option<PartialProblem>) {
        match problem {
            Some(problem) => {
                debug!(worker = worker.0, ?problem, "worker donated a partial problem");
                self.queue.push_back(problem);
                self.dispatch();
            },
            None => debug!(worker = worker.0, "worker had nothing to donate"),
        }
        self.settle();
    }

    /// The worker found a tour which improves its own best. It only becomes
    /// the global solution when it is a genuine tour that beats the current
    /// one, in which case it is broadcast to every other worker.
    pub fn on_worker_reports_solution(&mut self, worker: WorkerId, solution: Solution) {
        if !self.is_genuine(&solution) {
            warn!(worker = worker.0, %solution, "ignoring a reported solution which is not a valid tour");
            return;
        }
        if !solution.improves(self.best.as_ref()) {
            return;
        }
        info!(worker = worker.0, %solution, "new best solution");
        let message = ToWorker::Solution(solution.clone());
        self.best = Some(solution);

        let others = self.workers.iter()
            .filter(|(id, w)| **id != worker && w.is_ready())
            .map(|(id, _)| *id)
            .collect::<Vec<_>>();
        for other in others {
            self.send(other, &message);
        }
        self.settle();
    }

    /// Forgets about the worker. Whatever it was working on goes back to the
    /// queue.
    pub fn on_disconnect(&mut self, worker: WorkerId) {
        self.forget(worker);
        self.dispatch();
        self.settle();
    }

    /// The starvation watchdog. Each idle worker gets the head of the queue
    /// if there is one, otherwise all the busy workers are asked to split at
    /// the depth of the idle one. This is also where the cutoff is checked.
    pub fn on_tick(&mut self) {
        if self.is_complete() {
            return;
        }
        if self.cutoff.must_stop() {
            info!("cutoff occurred, the resolution stops");
            self.abort = Some(Reason::CutoffOccurred);
            return;
        }
        if !self.started {
            return;
        }
        let idle = self.workers.iter()
            .filter(|(_, w)| w.is_idle())
            .map(|(id, w)| (*id, w.split_depth.unwrap_or(1)))
            .collect::<Vec<_>>();
        for (worker, depth) in idle {
            if let Some(problem) = self.queue.pop_front() {
                self.assign(worker, problem);
            } else {
                self.request_splits(depth);
            }
        }
        self.settle();
    }

    fn first_idle(&self) -> Option<WorkerId> {
        self.workers.iter()
            .find(|(_, w)| w.is_idle())
            .map(|(id, _)| *id)
    }

    fn assign(&mut self, worker: WorkerId, problem: PartialProblem) {
        debug!(worker = worker.0, ?problem, "assigning partial problem");
        let message = ToWorker::Problem { problem: problem.clone() };
        if let Some(record) = self.workers.get_mut(&worker) {
            record.problem = Some(problem);
        }
        self.send(worker, &message);
    }

    fn request_splits(&mut self, depth: usize) {
        let busy = self.workers.iter()
            .filter(|(_, w)| w.is_busy())
            .map(|(id, _)| *id)
            .collect::<Vec<_>>();
        for worker in busy {
            debug!(worker = worker.0, depth, "requesting a split");
            self.send(worker, &ToWorker::Split { depth });
        }
    }

    /// Sends a message to the worker. A failure is handled as a
    /// disconnection once the current event is processed.
    fn send(&mut self, worker: WorkerId, message: &ToWorker) {
        if let Some(record) = self.workers.get(&worker) {
            if let Err(e) = record.link.send(message) {
                warn!(worker = worker.0, "cannot reach worker: {e}");
                self.lost.push(worker);
            }
        }
    }

    fn forget(&mut self, worker: WorkerId) {
        if let Some(record) = self.workers.remove(&worker) {
            debug!(worker = worker.0, "worker disconnected");
            if let Some(problem) = record.problem {
                warn!(worker = worker.0, ?problem, "requeuing the problem of a lost worker");
                self.queue.push_front(problem);
            }
        }
    }

    /// Processes the workers lost along the way and checks for completion
    fn settle(&mut self) {
        while let Some(worker) = self.lost.pop() {
            self.forget(worker);
            self.dispatch();
        }
        if self.started && self.queue.is_empty() && self.nb_busy() == 0 && !self.complete {
            info!("the search space is exhausted");
            self.complete = true;
        }
    }

    /// True iff the solution visits every vertex exactly once and its cost
    /// matches the network
    fn is_genuine(&self, solution: &Solution) -> bool {
        if solution.path.len() != self.network.nb_vertices() {
            return false;
        }
        let Ok(tour) = self.network.resolve(&solution.path) else { return false };
        let mut seen = vec![false; self.network.nb_vertices()];
        for v in tour.iter() {
            if std::mem::replace(&mut seen[v.id()], true) {
                return false;
            }
        }
        self.network.path_cost(&tour) == Some(solution.cost)
    }
}


// ############################################################################
// #### TESTS #################################################################
// ############################################################################
