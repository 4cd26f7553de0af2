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

//! This module defines the message passing abstraction the coordinator and
//! its workers talk through. The core never cares about what carries the
//! messages (websocket, in-process channel, ...): all it needs is a way to
//! send a named message with its payload and to receive the ones sent by the
//! other side, in order.

use std::time::Duration;

use crate::{Result, ToCoordinator, ToWorker};

/// Identifies one worker connection from the coordinator's point of view
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct WorkerId(pub usize);

/// This is the coordinator side of a connection to one given worker.
/// It is only used to *send* messages: everything the worker says comes
/// back through the coordinator `Inbox`.
pub trait WorkerLink {
    /// Sends a message to the worker. It fails with `Error::Disconnected`
    /// when the worker went away.
    fn send(&self, message: &ToWorker) -> Result<()>;
}

/// This is the worker side of its connection to the coordinator.
pub trait CoordinatorLink {
    /// Sends a message to the coordinator.
    fn send(&self, message: &ToCoordinator) -> Result<()>;
    /// Waits until a message arrives. It fails with `Error::Disconnected`
    /// once the coordinator went away.
    fn recv(&self) -> Result<ToWorker>;
    /// Returns the next pending message without ever blocking. `None` means
    /// there is nothing to read at the moment.
    fn try_recv(&self) -> Result<Option<ToWorker>>;
}

/// The things that may happen on the coordinator side of the transport
pub enum Event<L> {
    /// A new worker connected; the link lets the coordinator talk to it
    Connected { worker: WorkerId, link: L },
    /// A worker sent a message
    Message { worker: WorkerId, message: ToCoordinator },
    /// A worker went away
    Disconnected { worker: WorkerId },
}

/// The single queue of events the coordinator event loop consumes. Events
/// coming from one given worker are delivered in the order they were sent;
/// there is no ordering guarantee across workers.
pub trait Inbox {
    type Link: WorkerLink;

    /// Waits at most `timeout` for the next event. `None` means the timeout
    /// elapsed without anything happening.
    fn recv_timeout(&self, timeout: Duration) -> Result<Option<Event<Self::Link>>>;
}
