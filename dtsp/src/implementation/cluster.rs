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

//! This module provides a cluster running entirely inside the current
//! process: each worker gets a thread of its own while the coordinator runs
//! on the calling thread. They only talk through the local transport, the
//! very same way they would over the network.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{Completion, Coordinator, CoordinatorConfig, Cutoff, LocalHub, Network, NoCutoff, Result, VertexId, Worker, WorkerConfig};

/// A coordinator and its workers, ready to solve one network.
///
/// # Example
/// ```
/// # use dtsp::*;
/// # use std::sync::Arc;
/// let network = Network::from_matrix(&[
///      -1, 906, 814,  30, 198,
///     906,  -1, 633, 225, 103,
///     814, 633,  -1, 462, 553,
///      30, 225, 462,  -1, 814,
///     198, 103, 553, 814,  -1,
/// ]).unwrap();
/// let outcome = LocalCluster::new(Arc::new(network), VertexId(0))
///     .with_nb_workers(4)
///     .solve()
///     .unwrap();
///
/// assert!(outcome.is_exact);
/// assert_eq!(Some(911), outcome.best_value());
/// ```
pub struct LocalCluster<'a> {
    network: Arc<Network>,
    start: VertexId,
    /// By default, there is one worker per hardware thread
    nb_workers: usize,
    worker: WorkerConfig,
    coordinator: CoordinatorConfig,
    cutoff: &'a (dyn Cutoff + Send + Sync),
}

impl <'a> LocalCluster<'a> {
    pub fn new(network: Arc<Network>, start: VertexId) -> Self {
        LocalCluster {
            network,
            start,
            nb_workers: num_cpus::get(),
            worker: WorkerConfig::default(),
            coordinator: CoordinatorConfig::default(),
            cutoff: &NoCutoff,
        }
    }
    /// Sets the number of workers
    pub fn with_nb_workers(mut self, nb_workers: usize) -> Self {
        self.nb_workers = nb_workers.max(1);
        self
    }
    pub fn with_worker_config(mut self, config: WorkerConfig) -> Self {
        self.worker = config;
        self
    }
    pub fn with_coordinator_config(mut self, config: CoordinatorConfig) -> Self {
        self.coordinator = config;
        self
    }
    pub fn with_cutoff(mut self, cutoff: &'a (dyn Cutoff + Send + Sync)) -> Self {
        self.cutoff = cutoff;
        self
    }

    /// Runs the whole resolution and returns its outcome once it is over
    pub fn solve(&self) -> Result<Completion> {
        let mut coordinator = Coordinator::with_config(
                Arc::clone(&self.network), self.start, self.coordinator.clone())?
            .with_cutoff(self.cutoff);

        info!(workers = self.nb_workers, vertices = self.network.nb_vertices(), "starting local cluster");
        std::thread::scope(|s| {
            let mut hub = LocalHub::new();
            for i in 0..self.nb_workers {
                let link   = hub.connect()?;
                let config = self.worker.clone();
                std::thread::Builder::new()
                    .name(format!("worker-{i}"))
                    .spawn_scoped(s, move || {
                        if let Err(e) = Worker::with_config(link, config).run() {
                            warn!(worker = i, "worker failed: {e}");
                        }
                    })?;
            }
            hub.close();

            let outcome = coordinator.run(&hub);
            // hanging up on the workers is what makes them stop
            drop(coordinator);
            drop(hub);
            outcome
        })
    }
}
