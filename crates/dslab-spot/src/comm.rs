//! Message passing between workers.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;
use threadpool::ThreadPool;

use crate::error::{GameError, GameResult};
use crate::log_trace;
use crate::message::Message;

/// Point-to-point communication of a worker with the other workers of its group.
///
/// Workers are identified by ranks `0..size`. Both operations block: `send` returns once the message was taken by
/// the receiver and `recv` waits for the next message from the given peer. Messages between a pair of workers are
/// delivered in the order they were sent.
pub trait Communicator {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    /// Name of the worker used in logs.
    fn name(&self) -> &str;

    /// Seconds elapsed since the group was started.
    fn time(&self) -> f64;

    fn send(&self, dest: usize, msg: Message) -> GameResult<()>;

    fn recv(&self, src: usize) -> GameResult<Message>;

    /// Sends a message with JSON serialized payload.
    fn send_json<S: Serialize>(&self, dest: usize, tip: &str, data: &S) -> GameResult<()> {
        self.send(dest, Message::json(tip, data)?)
    }

    /// Receives a message of the given type and deserializes its payload.
    fn recv_json<S: DeserializeOwned>(&self, src: usize, tip: &str) -> GameResult<S> {
        let msg = self.recv(src)?;
        if msg.tip != tip {
            return Err(GameError::Protocol {
                rank: self.rank(),
                reason: format!("expected {} from {}, got {:?}", tip, src, msg),
            });
        }
        msg.decode()
    }
}

/// Communicator backed by zero-capacity channels, one per ordered pair of workers.
///
/// A send over a zero-capacity channel completes only when the receiver takes the message, which gives the same
/// rendezvous semantics as synchronous sends between processes. When a worker exits its channel ends are dropped,
/// so peers waiting on it get [`GameError::Disconnected`] instead of blocking forever.
pub struct ChannelCommunicator {
    rank: usize,
    size: usize,
    name: String,
    start: Instant,
    senders: Vec<Option<SyncSender<Message>>>,
    receivers: Vec<Option<Receiver<Message>>>,
}

/// Creates connected communicators for a group of `size` workers, indexed by rank.
pub fn channel_network(size: usize) -> Vec<ChannelCommunicator> {
    let start = Instant::now();
    let mut senders: Vec<Vec<Option<SyncSender<Message>>>> =
        (0..size).map(|_| (0..size).map(|_| None).collect()).collect();
    let mut receivers: Vec<Vec<Option<Receiver<Message>>>> =
        (0..size).map(|_| (0..size).map(|_| None).collect()).collect();
    for src in 0..size {
        for dest in 0..size {
            if src != dest {
                let (tx, rx) = sync_channel(0);
                senders[src][dest] = Some(tx);
                receivers[dest][src] = Some(rx);
            }
        }
    }
    senders
        .into_iter()
        .zip(receivers)
        .enumerate()
        .map(|(rank, (senders, receivers))| ChannelCommunicator {
            rank,
            size,
            name: format!("worker-{}", rank),
            start,
            senders,
            receivers,
        })
        .collect()
}

impl ChannelCommunicator {
    fn peer_error(&self, peer: usize) -> GameError {
        GameError::Protocol {
            rank: self.rank,
            reason: format!("no channel to worker {}", peer),
        }
    }
}

impl Communicator for ChannelCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn time(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    fn send(&self, dest: usize, msg: Message) -> GameResult<()> {
        let tx = self
            .senders
            .get(dest)
            .and_then(|tx| tx.as_ref())
            .ok_or_else(|| self.peer_error(dest))?;
        log_trace!(self, "--> {} {:?}", dest, msg);
        tx.send(msg).map_err(|_| GameError::Disconnected {
            rank: self.rank,
            peer: dest,
        })
    }

    fn recv(&self, src: usize) -> GameResult<Message> {
        let rx = self
            .receivers
            .get(src)
            .and_then(|rx| rx.as_ref())
            .ok_or_else(|| self.peer_error(src))?;
        let msg = rx.recv().map_err(|_| GameError::Disconnected {
            rank: self.rank,
            peer: src,
        })?;
        log_trace!(self, "<-- {} {:?}", src, msg);
        Ok(msg)
    }
}

/// Runs `size` workers concurrently, each with its own communicator, and returns their results indexed by rank.
///
/// A worker which panicked is reported as [`GameError::WorkerPanicked`].
pub fn run_workers<F, R>(size: usize, worker: F) -> Vec<GameResult<R>>
where
    F: Fn(ChannelCommunicator) -> GameResult<R> + Send + Sync + 'static,
    R: Send + 'static,
{
    let worker = Arc::new(worker);
    let results = Arc::new(Mutex::new(Vec::new()));
    let pool = ThreadPool::new(size.max(1));

    for comm in channel_network(size) {
        let worker = worker.clone();
        let results = results.clone();
        pool.execute(move || {
            let rank = comm.rank();
            // the communicator is dropped while unwinding, so peers see a disconnect
            if let Ok(result) = catch_unwind(AssertUnwindSafe(|| worker(comm))) {
                results
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push((rank, result));
            }
        });
    }
    pool.join();

    let mut by_rank: Vec<Option<GameResult<R>>> = (0..size).map(|_| None).collect();
    for (rank, result) in results.lock().unwrap_or_else(PoisonError::into_inner).drain(..) {
        by_rank[rank] = Some(result);
    }
    by_rank
        .into_iter()
        .enumerate()
        .map(|(rank, result)| result.unwrap_or(Err(GameError::WorkerPanicked { rank })))
        .collect()
}
