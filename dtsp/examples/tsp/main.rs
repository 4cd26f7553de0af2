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

//! This example uses dtsp to solve travelling salesman instances, either with
//! one single engine or on a cluster of workers running in this process.
//! TSPLIB instances can be downloaded from http://comopt.ifi.uni-heidelberg.de/software/TSPLIB95/

use std::{sync::Arc, time::{Duration, Instant}};

use clap::Parser;
use dtsp::*;
use tracing_subscriber::EnvFilter;

use crate::io_utils::read_network;

mod io_utils;

#[cfg(test)]
mod tests;

/// This structure uses `clap-derive` annotations and define the arguments that can
/// be passed on to the executable solver.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The path to the instance file (TSPLIB coordinates or a flattened weight matrix)
    fname: String,
    /// The name of the vertex every tour starts from
    #[clap(short, long, default_value = "1")]
    start: usize,
    /// The number of workers (defaults to the number of hardware threads)
    #[clap(short, long)]
    workers: Option<usize>,
    /// Solve the instance with one single engine instead of a cluster
    #[clap(long)]
    sequential: bool,
    /// The maximum amount of time (in seconds) you would like this solver to run
    #[clap(short, long)]
    duration: Option<u64>,
    /// The number of steps a worker performs between two looks at its messages
    #[clap(long, default_value = "10000")]
    step_budget: usize,
    /// The depth at which the workers split their work
    #[clap(long)]
    split_depth: Option<usize>,
    /// The number of ready workers needed to start the resolution
    #[clap(long, default_value = "1")]
    quorum: usize,
    /// Do not cut the branches that cannot improve the best tour
    #[clap(long)]
    no_cutting: bool,
    /// Explore the children in index order instead of lightest edge first
    #[clap(long)]
    no_min_heuristic: bool,
}

/// An utility function to return a cutoff heuristic that can either be a time budget policy
/// (if timeout is fixed) or no cutoff policy.
fn cutoff(timeout: Option<u64>) -> Box<dyn Cutoff + Send + Sync> {
    if let Some(t) = timeout {
        Box::new(TimeBudget::new(Duration::from_secs(t)))
    } else {
        Box::new(NoCutoff)
    }
}

/// Solves the problem with one engine, one slice at a time so that the
/// cutoff gets a chance to interrupt it.
fn solve_sequential(network: Arc<Network>, start: VertexId, config: EngineConfig, step_budget: usize, cutoff: &dyn Cutoff) -> anyhow::Result<(Completion, Statistics)> {
    let mut engine = Engine::with_config(network, start, config)?;
    let mut done   = false;
    while !done && !cutoff.must_stop() {
        done = engine.solve(Some(step_budget)).done;
    }
    let completion = Completion { is_exact: done, best: engine.best_solution() };
    Ok((completion, engine.statistics()))
}

/// Prints the outcome of a resolution
fn print_solution(duration: Duration, completion: &Completion) {
    println!("Duration:   {:.3} seconds", duration.as_secs_f32());
    println!("Objective:  {}",            completion.best_value().unwrap_or(-1));
    println!("Aborted:    {}",            !completion.is_exact);
    match &completion.best {
        Some(best) => println!("Solution:   {best}"),
        None       => println!("Solution:   none"),
    }
}

/// This is your executable's entry point. It is the place where all the pieces are put together
/// to create a fast an effective solver for the travelling salesman problem.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args    = Args::parse();
    let network = Arc::new(read_network(&args.fname)?);
    let start   = network.vertex(args.start)
        .ok_or_else(|| anyhow::anyhow!("there is no vertex {} in this instance", args.start))?;
    let engine  = EngineConfigBuilder::default()
        .cutting(!args.no_cutting)
        .min_heuristic(!args.no_min_heuristic)
        .build()?;
    let cutoff  = cutoff(args.duration);

    let begin = Instant::now();
    if args.sequential {
        let (completion, stats) = solve_sequential(network, start, engine, args.step_budget, cutoff.as_ref())?;
        print_solution(begin.elapsed(), &completion);
        println!("Expansions: {}", stats.expansions);
        println!("Tours:      {}", stats.tours);
        println!("Cuts:       {}", stats.cuts);
    } else {
        let mut worker = WorkerConfigBuilder::default();
        worker.step_budget(args.step_budget).engine(engine);
        if let Some(depth) = args.split_depth {
            worker.split_depth(depth);
        }
        let coordinator = CoordinatorConfigBuilder::default()
            .quorum(args.quorum)
            .build()?;

        let mut cluster = LocalCluster::new(network, start)
            .with_worker_config(worker.build()?)
            .with_coordinator_config(coordinator)
            .with_cutoff(cutoff.as_ref());
        if let Some(workers) = args.workers {
            cluster = cluster.with_nb_workers(workers);
        }
        let completion = cluster.solve()?;
        print_solution(begin.elapsed(), &completion);
    }
    Ok(())
}
