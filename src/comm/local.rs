//! In-process collective substrate
//!
//! Connects `P` endpoints in a star around one root rank. Every non-root rank
//! gets exactly one link to the root: an unbounded crossbeam channel in each
//! direction, `2 * (P - 1)` channels in total. Each link is a FIFO, so
//! messages from one peer are always received in the order they were sent,
//! and a root waiting on rank `r` is never confused by traffic from another
//! rank.
//!
//! Collectives are rooted at the star's centre: non-root ranks only ever talk
//! to the root, and the root closes every gather with a `Release` (or an
//! `Abort` carrying the error that ended the run) so all ranks leave the
//! phase together. A collective called with any other root is rejected.
//!
//! # Failure Model
//!
//! An endpoint that is dropped (its participant returned an error or
//! panicked) disconnects its channels. Peers blocked on it observe
//! `SearchError::PeerLost`. The root forwards the first error it sees to every
//! other rank, so a failed run reports the same cause everywhere.
//!
//! # Fault Injection
//!
//! - [`LocalComm::fail_at`]: report a `CollectiveFailure` on entering a phase
//! - [`LocalComm::drop_payload_tail`]: transfer fewer elements than declared
//!   during `gather_varying`

use crate::aggregator::layout::ResultLayout;
use crate::comm::Collective;
use crate::error::SearchError;
use crate::participant::RunPhase;
use crossbeam::channel::{unbounded, Receiver, Sender};

/// Message body exchanged between endpoints
#[derive(Debug, Clone)]
enum Body {
    /// Broadcast value or gathered record
    Value(u64),
    /// One rank's slice for `gather_varying`
    Values(Vec<u64>),
    /// Root has completed the phase
    Release,
    /// Root has failed the run
    Abort(SearchError),
}

/// Phase-tagged message
#[derive(Debug, Clone)]
struct Envelope {
    tag: RunPhase,
    body: Body,
}

/// Both directions of one endpoint's channel pair with `peer`
#[derive(Debug)]
struct Link {
    peer: usize,
    tx: Sender<Envelope>,
    rx: Receiver<Envelope>,
}

/// One participant's endpoint in the local star
#[derive(Debug)]
pub struct LocalComm {
    rank: usize,
    size: usize,
    root: usize,

    /// Sorted by peer rank. The root holds `P - 1` links, every other rank one.
    links: Vec<Link>,

    /// Phase at which this endpoint reports an injected failure
    fail_at: Option<RunPhase>,

    /// Elements withheld from this endpoint's `gather_varying` payload
    dropped_tail: usize,
}

/// Build `size` endpoints wired to `root`, indexed by rank
///
/// A `root` outside `[0, size)` yields endpoints with no links; every
/// collective on them fails.
pub fn star(size: usize, root: usize) -> Vec<LocalComm> {
    let mut endpoints: Vec<LocalComm> = (0..size)
        .map(|rank| LocalComm {
            rank,
            size,
            root,
            links: Vec::new(),
            fail_at: None,
            dropped_tail: 0,
        })
        .collect();

    if root >= size {
        return endpoints;
    }

    endpoints[root].links.reserve_exact(size - 1);
    for rank in (0..size).filter(|&r| r != root) {
        let (to_root, from_leaf) = unbounded();
        let (to_leaf, from_root) = unbounded();
        endpoints[rank].links.push(Link {
            peer: root,
            tx: to_root,
            rx: from_root,
        });
        endpoints[root].links.push(Link {
            peer: rank,
            tx: to_leaf,
            rx: from_leaf,
        });
    }

    endpoints
}

impl LocalComm {
    /// Make this endpoint fail when a collective tagged `phase` is entered
    pub fn fail_at(mut self, phase: RunPhase) -> Self {
        self.fail_at = Some(phase);
        self
    }

    /// Make this endpoint send `n` fewer elements than it holds in
    /// `gather_varying`, while its declared count stays unchanged
    pub fn drop_payload_tail(mut self, n: usize) -> Self {
        self.dropped_tail = n;
        self
    }

    /// Rank every collective on this endpoint must be rooted at
    pub fn root(&self) -> usize {
        self.root
    }

    fn check_fault(&self, tag: RunPhase) -> Result<(), SearchError> {
        if self.fail_at == Some(tag) {
            return Err(SearchError::CollectiveFailure {
                phase: tag,
                rank: self.rank,
                reason: "injected fault".to_string(),
            });
        }
        Ok(())
    }

    fn check_root(&self, tag: RunPhase, root: usize) -> Result<(), SearchError> {
        let reason = if root >= self.size {
            format!("root {} is outside the group of {}", root, self.size)
        } else if root != self.root {
            format!("root {} requested but endpoints are wired to rank {}", root, self.root)
        } else {
            return Ok(());
        };
        Err(SearchError::CollectiveFailure {
            phase: tag,
            rank: self.rank,
            reason,
        })
    }

    fn link(&self, peer: usize, tag: RunPhase) -> Result<&Link, SearchError> {
        self.links
            .binary_search_by_key(&peer, |l| l.peer)
            .map(|i| &self.links[i])
            .map_err(|_| SearchError::CollectiveFailure {
                phase: tag,
                rank: self.rank,
                reason: format!("no link to rank {}", peer),
            })
    }

    fn send(&self, to: usize, tag: RunPhase, body: Body) -> Result<(), SearchError> {
        self.link(to, tag)?
            .tx
            .send(Envelope { tag, body })
            .map_err(|_| SearchError::PeerLost {
                phase: tag,
                rank: self.rank,
                peer: to,
            })
    }

    fn recv(&self, from: usize, tag: RunPhase) -> Result<Body, SearchError> {
        let envelope = self.link(from, tag)?.rx.recv().map_err(|_| SearchError::PeerLost {
            phase: tag,
            rank: self.rank,
            peer: from,
        })?;

        match envelope.body {
            Body::Abort(err) => Err(err),
            _ if envelope.tag != tag => Err(SearchError::CollectiveFailure {
                phase: tag,
                rank: self.rank,
                reason: format!("received {} message from rank {}", envelope.tag, from),
            }),
            body => Ok(body),
        }
    }

    /// Ranks this endpoint has a link to, ascending
    fn peers(&self) -> impl Iterator<Item = usize> + '_ {
        self.links.iter().map(|l| l.peer)
    }

    /// Root only: let every rank leave the phase
    fn release_all(&self, tag: RunPhase) -> Result<(), SearchError> {
        for peer in self.peers() {
            self.send(peer, tag, Body::Release)?;
        }
        Ok(())
    }

    /// Root only: forward the failure to every reachable rank
    fn abort_all(&self, tag: RunPhase, err: &SearchError) {
        for peer in self.peers() {
            // Peers that are already gone cannot be told
            let _ = self.send(peer, tag, Body::Abort(err.clone()));
        }
    }

    /// Non-root only: block until the root closes the phase
    fn await_release(&self, root: usize, tag: RunPhase) -> Result<(), SearchError> {
        match self.recv(root, tag)? {
            Body::Release => Ok(()),
            other => Err(self.unexpected(tag, root, &other)),
        }
    }

    fn unexpected(&self, tag: RunPhase, from: usize, body: &Body) -> SearchError {
        let kind = match body {
            Body::Value(_) => "value",
            Body::Values(_) => "payload",
            Body::Release => "release",
            Body::Abort(_) => "abort",
        };
        SearchError::CollectiveFailure {
            phase: tag,
            rank: self.rank,
            reason: format!("unexpected {} message from rank {}", kind, from),
        }
    }

    /// Root only: receive one record per peer
    fn collect_values(&self, tag: RunPhase, table: &mut [u64]) -> Result<(), SearchError> {
        for peer in self.peers() {
            match self.recv(peer, tag)? {
                Body::Value(v) => table[peer] = v,
                other => return Err(self.unexpected(tag, peer, &other)),
            }
        }
        Ok(())
    }

    /// Root only: receive every peer's slice and place it at its reserved slot
    fn collect_slices(
        &self,
        tag: RunPhase,
        own: &[u64],
        layout: &ResultLayout,
        buffer: &mut [u64],
    ) -> Result<(), SearchError> {
        self.place(tag, self.rank, own, layout, buffer)?;
        for peer in self.peers() {
            match self.recv(peer, tag)? {
                Body::Values(slice) => self.place(tag, peer, &slice, layout, buffer)?,
                other => return Err(self.unexpected(tag, peer, &other)),
            }
        }
        Ok(())
    }

    fn place(
        &self,
        tag: RunPhase,
        from: usize,
        slice: &[u64],
        layout: &ResultLayout,
        buffer: &mut [u64],
    ) -> Result<(), SearchError> {
        let declared = layout.count(from);
        if slice.len() as u64 != declared {
            return Err(SearchError::ProtocolViolation {
                phase: tag,
                rank: from,
                declared,
                actual: slice.len() as u64,
            });
        }
        let slot = layout.slot(from).ok_or_else(|| SearchError::CollectiveFailure {
            phase: tag,
            rank: self.rank,
            reason: format!("layout has no slot for rank {}", from),
        })?;
        buffer[slot].copy_from_slice(slice);
        Ok(())
    }

    fn outgoing<'a>(&self, local: &'a [u64]) -> &'a [u64] {
        &local[..local.len().saturating_sub(self.dropped_tail)]
    }
}

impl Collective for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn broadcast(&mut self, tag: RunPhase, value: u64, root: usize) -> Result<u64, SearchError> {
        self.check_root(tag, root)?;
        self.check_fault(tag)?;

        if self.rank == root {
            for peer in self.peers() {
                self.send(peer, tag, Body::Value(value))?;
            }
            return Ok(value);
        }

        match self.recv(root, tag)? {
            Body::Value(v) => Ok(v),
            other => Err(self.unexpected(tag, root, &other)),
        }
    }

    fn gather(&mut self, tag: RunPhase, value: u64, root: usize) -> Result<Option<Vec<u64>>, SearchError> {
        self.check_root(tag, root)?;
        self.check_fault(tag)?;

        if self.rank != root {
            self.send(root, tag, Body::Value(value))?;
            self.await_release(root, tag)?;
            return Ok(None);
        }

        let mut table = vec![0u64; self.size];
        table[root] = value;

        if let Err(err) = self.collect_values(tag, &mut table) {
            self.abort_all(tag, &err);
            return Err(err);
        }

        self.release_all(tag)?;
        Ok(Some(table))
    }

    fn gather_varying(
        &mut self,
        tag: RunPhase,
        local: &[u64],
        layout: Option<&ResultLayout>,
        root: usize,
    ) -> Result<Option<Vec<u64>>, SearchError> {
        self.check_root(tag, root)?;
        self.check_fault(tag)?;

        let outgoing = self.outgoing(local);

        if self.rank != root {
            self.send(root, tag, Body::Values(outgoing.to_vec()))?;
            self.await_release(root, tag)?;
            return Ok(None);
        }

        let layout = match layout {
            Some(layout) if layout.ranks() == self.size => layout,
            Some(layout) => {
                let err = SearchError::CollectiveFailure {
                    phase: tag,
                    rank: self.rank,
                    reason: format!("layout covers {} ranks, group has {}", layout.ranks(), self.size),
                };
                self.abort_all(tag, &err);
                return Err(err);
            }
            None => {
                let err = SearchError::CollectiveFailure {
                    phase: tag,
                    rank: self.rank,
                    reason: "root called gather_varying without a layout".to_string(),
                };
                self.abort_all(tag, &err);
                return Err(err);
            }
        };

        let mut buffer = vec![0u64; layout.total()];
        if let Err(err) = self.collect_slices(tag, outgoing, layout, &mut buffer) {
            self.abort_all(tag, &err);
            return Err(err);
        }

        self.release_all(tag)?;
        Ok(Some(buffer))
    }
}
