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

//! This module is meant to tests the correctness of our tsp example

use std::{path::PathBuf, sync::Arc};

use dtsp::*;

use crate::{io_utils::read_network, solve_sequential};

fn locate(id: &str) -> PathBuf {
    PathBuf::new()
        .join(env!("CARGO_MANIFEST_DIR"))
        .join("../resources/tsp/")
        .join(id)
}

fn network(id: &str) -> Arc<Network> {
    Arc::new(read_network(locate(id)).unwrap())
}

pub fn solve_id(id: &str) -> Completion {
    let network = network(id);
    let start   = network.vertex(1).unwrap();
    let (completion, _) = solve_sequential(network, start, EngineConfig::default(), 10_000, &NoCutoff).unwrap();
    completion
}

pub fn solve_id_on_cluster(id: &str, nb_workers: usize) -> Completion {
    let network = network(id);
    let start   = network.vertex(1).unwrap();
    let worker  = WorkerConfigBuilder::default().step_budget(100).build().unwrap();
    LocalCluster::new(network, start)
        .with_nb_workers(nb_workers)
        .with_worker_config(worker)
        .solve()
        .unwrap()
}

#[test]
fn small5() {
    let completion = solve_id("small5.txt");
    assert!(completion.is_exact);
    assert_eq!(Some(Solution { path: vec![1, 4, 2, 5, 3], cost: 911 }), completion.best);
}
#[test]
fn small5_on_cluster() {
    let completion = solve_id_on_cluster("small5.txt", 3);
    assert!(completion.is_exact);
    assert_eq!(Some(911), completion.best_value());
}
#[test]
fn burma10() {
    assert_eq!(Some(2637), solve_id("burma10.tsp").best_value());
}
#[test]
fn burma10_on_cluster() {
    let completion = solve_id_on_cluster("burma10.tsp", 4);
    assert!(completion.is_exact);
    assert_eq!(Some(2637), completion.best_value());
}
#[test]
fn the_best_tour_of_burma10_visits_every_city_once() {
    let network = network("burma10.tsp");
    let best    = solve_id("burma10.tsp").best.unwrap();
    let tour    = network.resolve(&best.path).unwrap();
    let mut names = best.path.clone();
    names.sort_unstable();
    assert_eq!((1..=10).collect::<Vec<_>>(), names);
    assert_eq!(Some(best.cost), network.path_cost(&tour));
}
#[test]
fn a_time_budget_eventually_stops_the_search() {
    let network = network("burma14.tsp");
    let start   = network.vertex(1).unwrap();
    let config  = EngineConfigBuilder::default().cutting(false).build().unwrap();
    let budget  = TimeBudget::new(std::time::Duration::from_millis(50));
    let (completion, stats) = solve_sequential(network, start, config, 1_000, &budget).unwrap();
    assert!(!completion.is_exact);
    assert!(completion.best.is_some());
    assert!(stats.expansions > 0);
}
#[ignore] #[test]
fn burma14() {
    assert_eq!(Some(2880), solve_id_on_cluster("burma14.tsp", num_cpus::get()).best_value());
}
#[ignore] #[test]
fn ulysses16() {
    assert_eq!(Some(5201), solve_id_on_cluster("ulysses16.tsp", num_cpus::get()).best_value());
}
