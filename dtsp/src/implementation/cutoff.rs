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

//! This module provides the implementation of the cutoff criteria that can
//! be used to stop a distributed resolution before it proves optimality.

use std::{sync::{Arc, atomic::{AtomicBool, Ordering}}, time::Duration};

use crate::Cutoff;

/// _This is the default cutoff._ It imposes that the search proves
/// optimality before it stops.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoCutoff;
impl Cutoff for NoCutoff {
    fn must_stop(&self) -> bool {false}
}
/// This cutoff allows one to specify a maximum time budget to solve the
/// problem. Once the time budget is elapsed, the coordinator stops and the
/// best solution that has been found (so far) is returned.
///
/// # Example
/// ```
/// # use dtsp::*;
/// # use std::sync::Arc;
/// use std::time::Duration;
///
/// let network = Arc::new(Network::from_matrix(&[-1, 3, 3, -1]).unwrap());
/// let budget  = TimeBudget::new(Duration::from_secs(10));
/// let outcome = LocalCluster::new(network, VertexId(0))
///         .with_nb_workers(2)
///         .with_cutoff(&budget)
///         .solve() // will run for maximum 10 seconds
///         .unwrap();
/// assert_eq!(Some(3), outcome.best_value());
/// ```
#[derive(Debug, Clone)]
pub struct TimeBudget {
    stop  : Arc<AtomicBool>
}
impl TimeBudget {
    pub fn new(budget: Duration) -> Self {
        let stop   = Arc::new(AtomicBool::new(false));
        let t_flag = Arc::clone(&stop);

        // timer
        std::thread::spawn(move || {
            std::thread::sleep(budget);
            t_flag.store(true, Ordering::Relaxed);
        });

        TimeBudget { stop }
    }
}
impl Cutoff for TimeBudget {
    fn must_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod test_cutoff {
    use std::time::Duration;

    use crate::*;

    #[test]
    fn no_cutoff_never_stops() {
        assert!(!NoCutoff.must_stop());
    }
    #[test]
    fn time_budget_stops_once_elapsed() {
        let budget = TimeBudget::new(Duration::from_millis(20));
        assert!(!budget.must_stop());
        std::thread::sleep(Duration::from_millis(200));
        assert!(budget.must_stop());
    }
}
