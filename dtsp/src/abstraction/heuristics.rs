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

//! This module defines the traits used to plug external criteria into the
//! resolution: observing the complete tours reached by an engine and deciding
//! when a distributed resolution must stop before proving optimality.

use crate::{Cost, VertexId};

/// This trait encapsulates a criterion (external to the solver) which imposes
/// to stop searching for a better solution. Typically, this is done to grant
/// a given time budget to the search.
pub trait Cutoff {
    /// Returns true iff the criterion is met and the search must stop.
    fn must_stop(&self) -> bool;
}

/// This trait is the callback an engine invokes whenever its search reaches
/// a complete tour (be it an improvement or not).
pub trait TourCallback {
    /// executes the callback using the given tour and its cost
    fn apply(&mut self, tour: &[VertexId], cost: Cost);
}
/// The simplest and most natural callback implementation is to simply use
/// a closure.
impl <X: FnMut(&[VertexId], Cost)> TourCallback for X {
    fn apply(&mut self, tour: &[VertexId], cost: Cost) {
        self(tour, cost)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Cost, TourCallback, VertexId};

    #[test]
    fn closures_are_tour_callbacks() {
        let mut seen = vec![];
        let mut cb   = |tour: &[VertexId], cost: Cost| seen.push((tour.len(), cost));
        cb.apply(&[VertexId(0), VertexId(1)], 42);
        assert_eq!(vec![(2, 42)], seen);
    }
}
