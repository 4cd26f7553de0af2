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

//! This module defines the most basic data types that are used throughout all
//! the code of our library (engine, coordinator and workers alike).
//! These are also the types your client code is likely to work with.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The weight of an edge, or the cost of a (partial) path.
pub type Cost = isize;

/// The value used on the wire (and in flattened matrices) to denote the
/// absence of a traversable edge. Self loops always carry this value.
pub const NO_EDGE: isize = -1;

// ----------------------------------------------------------------------------
// --- VERTEX -----------------------------------------------------------------
// ----------------------------------------------------------------------------
/// This type denotes a vertex of the network. Each vertex is identified by
/// its 0-based ordinal ranging from 0 until `network.nb_vertices()`.
///
/// # Note:
/// Humans never draw a vertex 0 on paper. This is why every user facing
/// representation of a vertex (wire messages, partial problems, printed
/// tours) uses its *name*, which is the 1-based ordinal.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct VertexId(pub usize);
impl VertexId {
    #[inline]
    /// This function returns the id (0-based index) of the vertex.
    ///
    /// # Examples:
    /// ```
    /// # use dtsp::VertexId;
    /// assert_eq!(0, VertexId(0).id());
    /// assert_eq!(3, VertexId(3).id());
    /// ```
    pub fn id(self) -> usize {
        self.0
    }
    #[inline]
    /// This function returns the name (1-based ordinal) of the vertex.
    ///
    /// # Examples:
    /// ```
    /// # use dtsp::VertexId;
    /// assert_eq!(1, VertexId(0).name());
    /// assert_eq!(4, VertexId(3).name());
    /// ```
    pub fn name(self) -> usize {
        self.0 + 1
    }
    #[inline]
    /// Returns the vertex having the given name, if the name is not zero.
    pub fn from_name(name: usize) -> Option<Self> {
        name.checked_sub(1).map(VertexId)
    }
}
impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ----------------------------------------------------------------------------
// --- EDGE -------------------------------------------------------------------
// ----------------------------------------------------------------------------
/// A directed edge of the network. The edge does not own its endpoints, it
/// merely names them so that its cost can be looked up.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Edge {
    pub src   : VertexId,
    pub dst   : VertexId,
    /// The weight of the edge or `None` when the edge cannot be traversed
    pub weight: Option<Cost>,
}
impl Edge {
    /// Returns true iff the edge may be used by a tour
    pub fn is_traversable(&self) -> bool {
        self.weight.is_some()
    }
}

// ----------------------------------------------------------------------------
// --- PARTIAL PROBLEM --------------------------------------------------------
// ----------------------------------------------------------------------------
/// A partial problem is the root of a subtree of the search space which has
/// not been explored yet. It is identified by the prefix of vertex *names*
/// leading to that subtree root.
///
/// Partial problems are what gets handed from one worker to another whenever
/// the search space is split.
pub type PartialProblem = Vec<usize>;

// ----------------------------------------------------------------------------
// --- SOLUTION ---------------------------------------------------------------
// ----------------------------------------------------------------------------
/// A complete tour (expressed with vertex names) along with its cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub path: Vec<usize>,
    pub cost: Cost,
}
impl Solution {
    /// Returns true iff self is strictly better than the other (optional)
    /// solution. Equal costs never replace the incumbent: the first tour
    /// found is kept.
    pub fn improves(&self, other: Option<&Solution>) -> bool {
        match other {
            None        => true,
            Some(other) => self.cost < other.cost,
        }
    }
    /// Same as `improves`, but against a bare cost (`None` is infinity)
    pub fn improves_cost(&self, cost: Option<Cost>) -> bool {
        cost.map_or(true, |c| self.cost < c)
    }
}
impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.path.iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        write!(f, "[{}] ({})", names, self.cost)
    }
}

// ----------------------------------------------------------------------------
// --- Results ----------------------------------------------------------------
// ----------------------------------------------------------------------------
/// The outcome of one bounded call to `Engine::solve`
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Progress {
    /// True iff the whole search space owned by the engine has been explored
    pub done: bool,
}

/// A reason explaining why a distributed resolution stopped early
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Reason {
    /// It stopped because the configured cutoff criterion was met
    CutoffOccurred
}

/// The outcome of a distributed resolution
#[derive(Debug, Clone)]
pub struct Completion {
    /// is the given solution exact (proved optimal for the given problem)?
    /// or is it an approximation ?
    pub is_exact: bool,
    /// if present, the best tour that was found
    pub best: Option<Solution>,
}
impl Completion {
    /// The cost of the best solution, if one was found
    pub fn best_value(&self) -> Option<Cost> {
        self.best.as_ref().map(|s| s.cost)
    }
}


// ############################################################################
// #### TESTS #################################################################
// ############################################################################
