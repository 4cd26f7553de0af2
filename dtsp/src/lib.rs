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


//! # DTSP
//! DTSP is an exact solver for the travelling salesman problem which spreads
//! its branch-and-bound search over many cooperating workers. The workers
//! never share memory: they talk to a coordinator by exchanging messages, so
//! they might as well live on different machines.
//!
//! Throughout this crate, a tour is an *open* path: it starts at a given
//! vertex, visits every other vertex exactly once and its cost is the sum of
//! the weights of the edges it follows (there is no edge back to the start).
//!
//! ## Building blocks
//! * The `Network` is the weighted directed graph of the instance. It is
//!   built from a flattened weight matrix (where -1 means there is no edge)
//!   or from a `TspInstance` read from a TSPLIB file.
//! * The `Engine` is the branch-and-bound search itself. It enumerates the
//!   tours in depth first order, cuts the branches that cannot beat the best
//!   tour found so far and can be paused after any number of steps. It is
//!   also able to give away part of its remaining work as a partial problem
//!   (`get_partial_problem`), and to resume from such a partial problem
//!   (`set_partial_problem`).
//! * The `Coordinator` keeps the queue of partial problems and the global
//!   best solution. It hands work to idle workers and asks busy ones to split
//!   whenever someone starves.
//! * The `Worker` wraps one engine behind the wire protocol.
//! * The `LocalCluster` puts everything together inside one process.
//!
//! ## Quick Example
//! The following solves a tiny instance sequentially, then on a local cluster.
//!
//! ```
//! # use dtsp::*;
//! # use std::sync::Arc;
//! // 1. Describe the network
//! let network = Arc::new(Network::from_matrix(&[
//!      -1, 906, 814,  30, 198,
//!     906,  -1, 633, 225, 103,
//!     814, 633,  -1, 462, 553,
//!      30, 225, 462,  -1, 814,
//!     198, 103, 553, 814,  -1,
//! ]).unwrap());
//!
//! // 2. Solve it with a single engine
//! let mut engine = Engine::new(Arc::clone(&network), VertexId(0)).unwrap();
//! engine.solve(None);
//! assert_eq!(Some(911), engine.best_cost());
//!
//! // 3. Or spread the work over 4 workers
//! let outcome = LocalCluster::new(network, VertexId(0))
//!     .with_nb_workers(4)
//!     .solve()
//!     .unwrap();
//! // The `is_exact` flag will only be false if you explicitly decide to stop
//! // searching with an arbitrary cutoff.
//! assert!(outcome.is_exact);
//! assert_eq!(Some(vec![1, 4, 2, 5, 3]), outcome.best.map(|s| s.path));
//! ```
//!
//! ## Plugging your own transport
//! The coordinator and the workers only know about the traits of the
//! `transport` abstraction (`WorkerLink`, `CoordinatorLink` and `Inbox`).
//! The messages themselves (`ToWorker` and `ToCoordinator`) are plain serde
//! types which `encode` and `decode` turn into JSON text frames. Anything
//! able to carry text frames in order (a websocket for instance) can be used
//! to run the workers on remote machines.

mod common;
mod error;
mod abstraction;
mod implementation;

pub use common::*;
pub use error::*;
pub use abstraction::*;
pub use implementation::*;
