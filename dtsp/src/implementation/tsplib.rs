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

//! This module contains everything that is necessary to parse a TSP instance
//! written in the TSPLIB format (restricted to node coordinates) and to turn
//! it into the weight matrix of a network.

use std::{collections::BTreeMap, fs, path::Path, str::FromStr};

use crate::{Error, Result, NO_EDGE};

/// The way the distance between two nodes is computed from their coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceKind {
    /// TSPLIB geographical distance: coordinates are `DDD.MM` latitudes and
    /// longitudes, the result is expressed in km on an idealized sphere.
    Geo,
    /// Euclidean distance rounded to the nearest integer
    Euc2d,
    /// Great-circle distance (in km, rounded) computed with the haversine
    /// formula on decimal degrees. It is used when the instance does not say
    /// how its distances are computed.
    Haversine,
}

/// A parsed instance: its header fields and the coordinates of its nodes
#[derive(Debug, Clone)]
pub struct TspInstance {
    /// All the `KEY: VALUE` fields found before the coordinates
    pub metadata: BTreeMap<String, String>,
    pub kind    : DistanceKind,
    /// The (x, y) coordinates of the nodes in the order of the file
    pub coords  : Vec<(f64, f64)>,
}

const COORDS: &str = "NODE_COORD_SECTION";
const EOF   : &str = "EOF";

impl TspInstance {
    /// Reads and parses the instance stored in the given file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        fs::read_to_string(path)?.parse()
    }
    /// The name of the instance (if it has one)
    pub fn name(&self) -> Option<&str> {
        self.metadata.get("NAME").map(|s| s.as_str())
    }
    /// The number of nodes
    pub fn dimension(&self) -> usize {
        self.coords.len()
    }
    /// Computes the distance from node `i` to node `j`
    pub fn distance(&self, i: usize, j: usize) -> isize {
        let (a, b) = (self.coords[i], self.coords[j]);
        match self.kind {
            DistanceKind::Geo       => geo(a, b),
            DistanceKind::Euc2d     => euc_2d(a, b),
            DistanceKind::Haversine => haversine(a, b),
        }
    }
    /// Returns the flattened weight matrix of the complete graph spanned by
    /// the nodes. The diagonal holds the no-edge sentinel.
    pub fn weight_matrix(&self) -> Vec<isize> {
        let n = self.dimension();
        let mut matrix = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                matrix.push(if i == j { NO_EDGE } else { self.distance(i, j) });
            }
        }
        matrix
    }
}

impl FromStr for TspInstance {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let mut lines    = text.lines().map(str::trim).filter(|l| !l.is_empty());
        let mut metadata = BTreeMap::new();
        let mut in_coords = false;
        for line in lines.by_ref() {
            if line == COORDS {
                in_coords = true;
                break;
            }
            if let Some((key, value)) = line.split_once(':') {
                metadata.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        if !in_coords {
            return Err(Error::MalformedGraph(format!("the instance has no {COORDS} line")));
        }

        let mut coords = vec![];
        let mut at_eof = false;
        for line in lines {
            if line == EOF {
                at_eof = true;
                break;
            }
            let mut tokens = line.split_whitespace().skip(1);
            let x = coordinate(tokens.next(), line)?;
            let y = coordinate(tokens.next(), line)?;
            coords.push((x, y));
        }
        if !at_eof {
            return Err(Error::MalformedGraph(format!("the {COORDS} is not closed by an {EOF} line")));
        }

        let kind = match metadata.get("EDGE_WEIGHT_TYPE").map(|s| s.as_str()) {
            None           => DistanceKind::Haversine,
            Some("GEO")    => DistanceKind::Geo,
            Some("EUC_2D") => DistanceKind::Euc2d,
            Some(other)    => return Err(Error::MalformedGraph(format!("unsupported edge weight type {other}"))),
        };
        if let Some(dim) = metadata.get("DIMENSION") {
            let dim = dim.parse::<usize>()
                .map_err(|_| Error::MalformedGraph(format!("invalid dimension {dim}")))?;
            if dim != coords.len() {
                return Err(Error::MalformedGraph(format!(
                    "the instance announces {dim} nodes but lists {}", coords.len())));
            }
        }
        Ok(TspInstance { metadata, kind, coords })
    }
}

fn coordinate(token: Option<&str>, line: &str) -> Result<f64> {
    token.and_then(|t| t.parse::<f64>().ok())
        .ok_or_else(|| Error::MalformedGraph(format!("cannot read the coordinates of '{line}'")))
}

/// Converts a TSPLIB `DDD.MM` coordinate into radians
#[allow(clippy::approx_constant)]
fn geo_radians(x: f64) -> f64 {
    const PI: f64 = 3.141592;
    let deg = x.trunc();
    let min = x - deg;
    PI * (deg + 5.0 * min / 3.0) / 180.0
}
fn geo((lat1, lon1): (f64, f64), (lat2, lon2): (f64, f64)) -> isize {
    const RRR: f64 = 6378.388;
    let (lat1, lon1) = (geo_radians(lat1), geo_radians(lon1));
    let (lat2, lon2) = (geo_radians(lat2), geo_radians(lon2));
    let q1 = (lon1 - lon2).cos();
    let q2 = (lat1 - lat2).cos();
    let q3 = (lat1 + lat2).cos();
    (RRR * (0.5 * ((1.0 + q1) * q2 - (1.0 - q1) * q3)).acos() + 1.0) as isize
}
fn euc_2d((x1, y1): (f64, f64), (x2, y2): (f64, f64)) -> isize {
    (x1 - x2).hypot(y1 - y2).round() as isize
}
fn haversine((lat1, lon1): (f64, f64), (lat2, lon2): (f64, f64)) -> isize {
    const EARTH_RADIUS: f64 = 6371.0;
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
          + (d_lon / 2.0).sin().powi(2) * lat1.to_radians().cos() * lat2.to_radians().cos();
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    (EARTH_RADIUS * c).round() as isize
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
