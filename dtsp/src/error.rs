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

//! This module defines the errors that may occur when building a network,
//! seeding a solver or exchanging messages between the coordinator and its
//! workers.

/// This enumeration groups the kind of errors that might occur in this crate.
/// None of them is retried internally: bad input always fails fast and it is
/// up to the caller to decide what to do with it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The weight matrix (or the instance file it was derived from) does not
    /// describe a valid network.
    #[error("malformed graph: {0}")]
    MalformedGraph(String),
    /// A partial problem (or start vertex) does not denote a valid path in
    /// the network.
    #[error("invalid path: {0}")]
    InvalidPath(String),
    /// A frame could not be encoded or decoded.
    #[error("codec error {0}")]
    Codec(#[from] serde_json::Error),
    /// The other end of a link went away.
    #[error("the link is disconnected")]
    Disconnected,
    /// There was an io related error
    #[error("io error {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand for the results of this crate
pub type Result<T> = std::result::Result<T, Error>;
