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

//! This module provides the network model: the vertices of the problem and
//! the weighted edges between them.
//!
//! The network is an arena of vertices indexed by their ordinal. Edges are not
//! stored as objects pointing at their endpoints; instead, all weights live in
//! one dense `n x n` table indexed by (source, destination). This gives O(1)
//! edge lookups and no ownership puzzle between vertices and edges.

use crate::{Cost, Edge, Error, Result, TspInstance, VertexId, NO_EDGE};

/// The network (complete directed graph) of a TSP instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    /// The number of vertices
    n: usize,
    /// Row major weight table. `weights[src * n + dst]` is `None` when there
    /// is no traversable edge from src to dst
    weights: Vec<Option<Cost>>,
}

impl Network {
    /// Builds a network from a flattened (row major) `n x n` weight matrix in
    /// which the value `NO_EDGE` (-1) denotes the absence of an edge.
    ///
    /// The number of vertices is detected from the matrix: its length must be
    /// a perfect square and its diagonal must only contain the sentinel value
    /// (self loops are never traversable). Other entries may carry the
    /// sentinel too, that is how severed connections are expressed.
    ///
    /// # Example
    /// ```
    /// # use dtsp::*;
    /// let network = Network::from_matrix(&[
    ///     -1,  3,  4,
    ///      3, -1,  5,
    ///      4,  5, -1,
    /// ]).unwrap();
    /// assert_eq!(3, network.nb_vertices());
    /// assert_eq!(Some(5), network.weight(VertexId(1), VertexId(2)));
    /// ```
    pub fn from_matrix(matrix: &[isize]) -> Result<Self> {
        if matrix.is_empty() {
            return Err(Error::MalformedGraph("the weight matrix is empty".to_string()));
        }
        let n = detect_size(matrix.len()).ok_or_else(|| Error::MalformedGraph(
            format!("a matrix of {} weights cannot be square", matrix.len())))?;

        let mut weights = Vec::with_capacity(matrix.len());
        for (idx, &w) in matrix.iter().enumerate() {
            let (src, dst) = (idx / n, idx % n);
            if src == dst && w != NO_EDGE {
                return Err(Error::MalformedGraph(format!(
                    "the diagonal must only hold {NO_EDGE} but vertex {} has a self loop of weight {w}", src + 1)));
            }
            let weight = match w {
                NO_EDGE    => None,
                w if w < 0 => return Err(Error::MalformedGraph(format!(
                    "negative weight {w} from {} to {}", src + 1, dst + 1))),
                w          => Some(w),
            };
            weights.push(weight);
        }
        Ok(Network { n, weights })
    }

    /// Builds the network of a parsed TSP instance.
    pub fn from_instance(instance: &TspInstance) -> Result<Self> {
        Self::from_matrix(&instance.weight_matrix())
    }

    /// Returns the number of vertices in the network
    pub fn nb_vertices(&self) -> usize {
        self.n
    }
    /// Iterates over all the vertices of the network
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> {
        (0..self.n).map(VertexId)
    }
    /// Returns the vertex having the given (1-based) name if it exists
    pub fn vertex(&self, name: usize) -> Option<VertexId> {
        VertexId::from_name(name).filter(|v| v.id() < self.n)
    }
    /// Returns the weight of the edge from `src` to `dst`, or `None` when
    /// that edge cannot be traversed.
    #[inline]
    pub fn weight(&self, src: VertexId, dst: VertexId) -> Option<Cost> {
        self.weights[src.id() * self.n + dst.id()]
    }
    /// Returns the edge from `src` to `dst`
    pub fn edge(&self, src: VertexId, dst: VertexId) -> Edge {
        Edge { src, dst, weight: self.weight(src, dst) }
    }
    /// Iterates over the outgoing edges of `src` (including its self loop
    /// which is never traversable).
    pub fn edges(&self, src: VertexId) -> impl Iterator<Item = Edge> + '_ {
        self.vertices().map(move |dst| self.edge(src, dst))
    }
    /// Returns the cost of following the given path, or `None` if the path
    /// uses an edge that cannot be traversed.
    pub fn path_cost(&self, path: &[VertexId]) -> Option<Cost> {
        path.windows(2)
            .map(|w| self.weight(w[0], w[1]))
            .sum()
    }
    /// Translates a sequence of vertex names into the vertices they denote.
    /// It fails with `InvalidPath` when a name is unknown.
    pub fn resolve(&self, names: &[usize]) -> Result<Vec<VertexId>> {
        names.iter()
            .map(|&name| self.vertex(name).ok_or_else(|| Error::InvalidPath(
                format!("there is no vertex named {name} in a network of {} vertices", self.n))))
            .collect()
    }
    /// Returns the flattened weight matrix of this network, the way it is
    /// sent over the wire (-1 denotes the absence of an edge).
    pub fn to_matrix(&self) -> Vec<isize> {
        self.weights.iter()
            .map(|w| w.unwrap_or(NO_EDGE))
            .collect()
    }
}

/// Returns the side of a square matrix having `len` cells if there is one.
fn detect_size(len: usize) -> Option<usize> {
    let guess = (len as f64).sqrt().round() as usize;
    (guess.saturating_sub(1)..=guess + 1).find(|n| n * n == len)
}


// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_network {
    use crate::*;

    pub(crate) fn five() -> Vec<isize> {
        vec![
             -1, 906, 814,  30, 198,
            906,  -1, 633, 225, 103,
            814, 633,  -1, 462, 553,
             30, 225, 462,  -1, 814,
            198, 103, 553, 814,  -1,
        ]
    }

    #[test]
    fn the_size_is_detected_from_the_matrix() {
        let net = Network::from_matrix(&five()).unwrap();
        assert_eq!(5, net.nb_vertices());
        assert_eq!(5, net.vertices().count());
    }
    #[test]
    fn weights_are_looked_up_by_source_and_destination() {
        let net = Network::from_matrix(&five()).unwrap();
        assert_eq!(Some(30),  net.weight(VertexId(0), VertexId(3)));
        assert_eq!(Some(553), net.weight(VertexId(4), VertexId(2)));
        assert_eq!(None,      net.weight(VertexId(2), VertexId(2)));
    }
    #[test]
    fn directed_weights_are_allowed() {
        let net = Network::from_matrix(&[-1, 1, 2, -1]).unwrap();
        assert_eq!(Some(1), net.weight(VertexId(0), VertexId(1)));
        assert_eq!(Some(2), net.weight(VertexId(1), VertexId(0)));
    }
    #[test]
    fn every_vertex_has_one_edge_per_vertex() {
        let net = Network::from_matrix(&five()).unwrap();
        for v in net.vertices() {
            let edges = net.edges(v).collect::<Vec<_>>();
            assert_eq!(5, edges.len());
            assert_eq!(4, edges.iter().filter(|e| e.is_traversable()).count());
            assert!(edges.iter().all(|e| e.src == v));
            assert!(!net.edge(v, v).is_traversable());
        }
    }
    #[test]
    fn severed_edges_are_not_traversable() {
        let net = Network::from_matrix(&[
            -1, -1,  4,
             3, -1,  5,
             4,  5, -1,
        ]).unwrap();
        assert_eq!(None, net.weight(VertexId(0), VertexId(1)));
        assert_eq!(Some(3), net.weight(VertexId(1), VertexId(0)));
    }
    #[test]
    fn a_matrix_which_is_not_square_is_malformed() {
        let err = Network::from_matrix(&[-1, 1, 2, -1, 4]).unwrap_err();
        assert!(matches!(err, Error::MalformedGraph(_)));
    }
    #[test]
    fn an_empty_matrix_is_malformed() {
        let err = Network::from_matrix(&[]).unwrap_err();
        assert!(matches!(err, Error::MalformedGraph(_)));
    }
    #[test]
    fn a_diagonal_without_sentinel_is_malformed() {
        let err = Network::from_matrix(&[0, 1, 2, -1]).unwrap_err();
        assert!(matches!(err, Error::MalformedGraph(_)));
    }
    #[test]
    fn negative_weights_are_malformed() {
        let err = Network::from_matrix(&[-1, -7, 2, -1]).unwrap_err();
        assert!(matches!(err, Error::MalformedGraph(_)));
    }
    #[test]
    fn vertices_are_found_by_name() {
        let net = Network::from_matrix(&five()).unwrap();
        assert_eq!(Some(VertexId(0)), net.vertex(1));
        assert_eq!(Some(VertexId(4)), net.vertex(5));
        assert_eq!(None, net.vertex(0));
        assert_eq!(None, net.vertex(6));
    }
    #[test]
    fn resolve_rejects_unknown_names() {
        let net = Network::from_matrix(&five()).unwrap();
        assert_eq!(vec![VertexId(0), VertexId(3)], net.resolve(&[1, 4]).unwrap());
        assert!(matches!(net.resolve(&[1, 9]), Err(Error::InvalidPath(_))));
    }
    #[test]
    fn path_cost_sums_consecutive_weights() {
        let net  = Network::from_matrix(&five()).unwrap();
        let tour = net.resolve(&[1, 4, 2, 5, 3]).unwrap();
        assert_eq!(Some(911), net.path_cost(&tour));
        assert_eq!(Some(0), net.path_cost(&tour[..1]));
    }
    #[test]
    fn path_cost_of_a_path_using_a_severed_edge_is_none() {
        let net = Network::from_matrix(&[-1, -1, 3, -1]).unwrap();
        assert_eq!(None, net.path_cost(&[VertexId(0), VertexId(1)]));
    }
    #[test]
    fn to_matrix_gives_back_the_wire_form() {
        let net = Network::from_matrix(&five()).unwrap();
        assert_eq!(five(), net.to_matrix());
    }
}
