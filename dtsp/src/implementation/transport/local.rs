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

//! This module provides an in-process transport built on channels. It lets
//! a coordinator and its workers run on different threads of one process
//! while still exchanging the very same text frames a socket would carry.

use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::{decode, encode, CoordinatorLink, Error, Event, Inbox, Result, ToCoordinator, ToWorker, WorkerId, WorkerLink};

/// What travels from the workers to the coordinator
enum Frame {
    Connected(WorkerId, LocalWorkerLink),
    Text(WorkerId, String),
    Closed(WorkerId),
}

/// The coordinator end of the local transport. Workers join the hub by
/// calling `connect` and the coordinator reads their events through the
/// `Inbox` implementation.
pub struct LocalHub {
    /// `None` once the hub stopped accepting new workers
    events_tx: Option<Sender<Frame>>,
    events_rx: Receiver<Frame>,
    next_id: usize,
}

/// The coordinator side of the connection to one worker
#[derive(Clone)]
pub struct LocalWorkerLink {
    outbound: Sender<String>,
}

/// The worker side of its connection to the hub. Dropping it closes the
/// connection.
pub struct LocalCoordinatorLink {
    worker: WorkerId,
    inbound: Receiver<String>,
    outbound: Sender<Frame>,
}

impl Default for LocalHub {
    fn default() -> Self {
        Self::new()
    }
}
impl LocalHub {
    pub fn new() -> Self {
        let (events_tx, events_rx) = unbounded();
        LocalHub { events_tx: Some(events_tx), events_rx, next_id: 0 }
    }
    /// Opens a new connection and returns its worker end. It fails with
    /// `Error::Disconnected` once the hub has been closed.
    pub fn connect(&mut self) -> Result<LocalCoordinatorLink> {
        let events = self.events_tx.as_ref().ok_or(Error::Disconnected)?;
        let worker = WorkerId(self.next_id);
        self.next_id += 1;

        let (outbound, inbound) = unbounded();
        events.send(Frame::Connected(worker, LocalWorkerLink { outbound }))
            .map_err(|_| Error::Disconnected)?;
        Ok(LocalCoordinatorLink { worker, inbound, outbound: events.clone() })
    }
    /// Stops accepting new workers. From then on, the inbox reports
    /// `Error::Disconnected` as soon as every connected worker went away.
    pub fn close(&mut self) {
        self.events_tx = None;
    }
}

impl Inbox for LocalHub {
    type Link = LocalWorkerLink;

    fn recv_timeout(&self, timeout: Duration) -> Result<Option<Event<LocalWorkerLink>>> {
        match self.events_rx.recv_timeout(timeout) {
            Ok(Frame::Connected(worker, link)) => Ok(Some(Event::Connected { worker, link })),
            Ok(Frame::Text(worker, text))      => Ok(Some(Event::Message { worker, message: decode(&text)? })),
            Ok(Frame::Closed(worker))          => Ok(Some(Event::Disconnected { worker })),
            Err(RecvTimeoutError::Timeout)     => Ok(None),
            Err(RecvTimeoutError::Disconnected)=> Err(Error::Disconnected),
        }
    }
}

impl WorkerLink for LocalWorkerLink {
    fn send(&self, message: &ToWorker) -> Result<()> {
        self.outbound.send(encode(message)?).map_err(|_| Error::Disconnected)
    }
}

impl LocalCoordinatorLink {
    /// The identifier the coordinator knows this connection by
    pub fn worker(&self) -> WorkerId {
        self.worker
    }
}
impl CoordinatorLink for LocalCoordinatorLink {
    fn send(&self, message: &ToCoordinator) -> Result<()> {
        self.outbound.send(Frame::Text(self.worker, encode(message)?))
            .map_err(|_| Error::Disconnected)
    }
    fn recv(&self) -> Result<ToWorker> {
        let text = self.inbound.recv().map_err(|_| Error::Disconnected)?;
        decode(&text)
    }
    fn try_recv(&self) -> Result<Option<ToWorker>> {
        match self.inbound.try_recv() {
            Ok(text)                         => Ok(Some(decode(&text)?)),
            Err(TryRecvError::Empty)         => Ok(None),
            Err(TryRecvError::Disconnected)  => Err(Error::Disconnected),
        }
    }
}
impl Drop for LocalCoordinatorLink {
    fn drop(&mut self) {
        // the hub may be gone already, there is no one left to tell then
        let _ = self.outbound.send(Frame::Closed(self.worker));
    }
}
