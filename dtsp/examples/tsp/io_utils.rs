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

//! This module contains everything that is necessary to read an instance
//! from file and turn it into a network. Two formats are understood: TSPLIB
//! files listing the coordinates of the nodes, and plain text files holding
//! a flattened weight matrix (whitespace separated, -1 meaning no edge).

use std::{fs, num::ParseIntError, path::Path};

use dtsp::{Network, TspInstance};

/// This enumeration simply groups the kind of errors that might occur when
/// reading an instance from file. There can be io errors (file unavailable ?),
/// parse int errors (a matrix holding something else than integers) or the
/// errors raised when building the network itself.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// There was an io related error
    #[error("io error {0}")]
    Io(#[from] std::io::Error),
    /// The parser expected to read something that was an integer but got some garbage
    #[error("parse int {0}")]
    ParseInt(#[from] ParseIntError),
    /// The instance does not describe a valid network
    #[error(transparent)]
    Network(#[from] dtsp::Error),
}

/// This function is used to read a network from file. It returns either the
/// network if everything went on well or an error describing the problem.
pub fn read_network<P: AsRef<Path>>(fname: P) -> Result<Network, Error> {
    let text = fs::read_to_string(fname)?;
    if text.contains("NODE_COORD_SECTION") {
        let instance = text.parse::<TspInstance>()?;
        Ok(Network::from_instance(&instance)?)
    } else {
        let matrix = text.split_whitespace()
            .map(|w| w.parse::<isize>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Network::from_matrix(&matrix)?)
    }
}
