//! Shared, inclusive MOESI L2 directory.
//!
//! `original_source/src/cache/moesi/l1l2v2.h` implements a *private*
//! per-core L1+L2 pair serialized per-line rather than an explicit
//! sharer-bitmap directory, so it cannot be ported literally for a directory
//! shared across cores. This module instead implements the conventional
//! directory scheme implied by the same message vocabulary
//! (`protocol::CcMsgType`): a sharer set plus an owner slot per line, with
//! invalidations fanned out to sharers and acknowledged before a `Getm`
//! completes.

use super::protocol::{CACHE_LINE_BYTES, CcMsg, CcMsgType, LineState};
use std::collections::{HashMap, HashSet};

/// Where an outgoing L2 message should go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendTarget {
    L1(usize),
    Memory,
}

struct DirEntry {
    state: LineState,
    sharers: HashSet<usize>,
    owner: Option<usize>,
    data: [u8; CACHE_LINE_BYTES],
}

impl DirEntry {
    fn new() -> Self {
        Self {
            state: LineState::Invalid,
            sharers: HashSet::new(),
            owner: None,
            data: [0u8; CACHE_LINE_BYTES],
        }
    }
}

/// A `Getm` transaction waiting on sharer invalidation acks before replying.
struct PendingInvalidate {
    requestor: usize,
    acks_remaining: u32,
}

pub struct L2Cache {
    dir: HashMap<u64, DirEntry>,
    /// Requestor and whether the fetch was for write (`Getm`, not `Gets`) —
    /// the memory node's response doesn't carry that back, so the directory
    /// has to remember it to grant the right line state on completion.
    pending_mem: HashMap<u64, (usize, bool)>,
    pending_invalidate: HashMap<u64, PendingInvalidate>,
    sends: std::collections::VecDeque<(SendTarget, CcMsg)>,
}

impl L2Cache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: HashMap::new(),
            pending_mem: HashMap::new(),
            pending_invalidate: HashMap::new(),
            sends: std::collections::VecDeque::new(),
        }
    }

    fn entry(&mut self, line: u64) -> &mut DirEntry {
        self.dir.entry(line).or_insert_with(DirEntry::new)
    }

    fn start_invalidation(&mut self, line: u64, requestor: usize, exclude_owner: bool) {
        let sharers: Vec<usize> = {
            let e = self.entry(line);
            e.sharers
                .iter()
                .copied()
                .filter(|&p| p != requestor)
                .collect()
        };
        let owner = self.entry(line).owner.filter(|&o| o != requestor);
        let mut targets = sharers;
        if !exclude_owner {
            if let Some(o) = owner {
                if !targets.contains(&o) {
                    targets.push(o);
                }
            }
        }
        for &p in &targets {
            self.sends
                .push_back((SendTarget::L1(p), CcMsg::new(CcMsgType::Invalid, line, requestor as u32)));
        }
        self.pending_invalidate.insert(
            line,
            PendingInvalidate {
                requestor,
                acks_remaining: targets.len() as u32,
            },
        );
    }

    /// Processes a message arriving on the L2's bus port from either an L1
    /// (`Gets`/`Getm`/`Puts`/`Putm`/`Pute`/`Puto`/`InvalidAck`) or the memory
    /// node (`GetRespMem`).
    pub fn handle_incoming(&mut self, src_port: usize, msg: CcMsg) {
        match msg.msg_type {
            CcMsgType::Gets => self.handle_gets(src_port, msg.line),
            CcMsgType::Getm => self.handle_getm(src_port, msg.line),
            CcMsgType::InvalidAck => self.handle_invalid_ack(msg.line),
            CcMsgType::Puts | CcMsgType::Pute => {
                let e = self.entry(msg.line);
                e.sharers.remove(&src_port);
                if e.owner == Some(src_port) {
                    e.owner = None;
                }
                if e.sharers.is_empty() && e.owner.is_none() {
                    e.state = LineState::Invalid;
                }
                self.sends
                    .push_back((SendTarget::L1(src_port), CcMsg::new(CcMsgType::PutAck, msg.line, 0)));
            }
            CcMsgType::Putm | CcMsgType::Puto => {
                let e = self.entry(msg.line);
                if let Some(data) = msg.data {
                    e.data = data;
                }
                e.sharers.remove(&src_port);
                if e.owner == Some(src_port) {
                    e.owner = None;
                    e.state = if e.sharers.is_empty() {
                        LineState::Invalid
                    } else {
                        LineState::Shared
                    };
                }
                self.sends
                    .push_back((SendTarget::L1(src_port), CcMsg::new(CcMsgType::PutAck, msg.line, 0)));
            }
            CcMsgType::GetRespMem => {
                if let Some((requestor, is_write)) = self.pending_mem.remove(&msg.line) {
                    if let Some(data) = msg.data {
                        self.entry(msg.line).data = data;
                    }
                    if is_write {
                        self.complete_getm(msg.line, requestor);
                    } else {
                        self.complete_gets(msg.line, requestor);
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_gets(&mut self, requestor: usize, line: u64) {
        let needs_fetch = {
            let e = self.entry(line);
            e.state == LineState::Invalid
        };
        if needs_fetch {
            self.pending_mem.insert(line, (requestor, false));
            self.sends
                .push_back((SendTarget::Memory, CcMsg::new(CcMsgType::Gets, line, requestor as u32)));
            return;
        }
        let owner = self.entry(line).owner;
        if let Some(owner_port) = owner {
            self.sends.push_back((
                SendTarget::L1(owner_port),
                CcMsg::new(CcMsgType::GetsForward, line, requestor as u32),
            ));
            let e = self.entry(line);
            e.sharers.insert(requestor);
            e.state = LineState::Owned;
            return;
        }
        self.complete_gets(line, requestor);
    }

    fn complete_gets(&mut self, line: u64, requestor: usize) {
        let data = self.entry(line).data;
        let e = self.entry(line);
        e.sharers.insert(requestor);
        if e.state == LineState::Invalid {
            e.state = LineState::Shared;
        }
        let sharer_count = e.sharers.len() as u32;
        self.sends.push_back((
            SendTarget::L1(requestor),
            CcMsg::new(CcMsgType::GetsResp, line, sharer_count).with_data(data),
        ));
    }

    fn handle_getm(&mut self, requestor: usize, line: u64) {
        let needs_fetch = {
            let e = self.entry(line);
            e.state == LineState::Invalid
        };
        if needs_fetch {
            self.pending_mem.insert(line, (requestor, true));
            self.sends
                .push_back((SendTarget::Memory, CcMsg::new(CcMsgType::Getm, line, requestor as u32)));
            return;
        }
        self.start_invalidation(line, requestor, false);
        if self.pending_invalidate[&line].acks_remaining == 0 {
            self.pending_invalidate.remove(&line);
            self.complete_getm(line, requestor);
        }
    }

    fn handle_invalid_ack(&mut self, line: u64) {
        let done = if let Some(p) = self.pending_invalidate.get_mut(&line) {
            p.acks_remaining = p.acks_remaining.saturating_sub(1);
            p.acks_remaining == 0
        } else {
            false
        };
        if done {
            if let Some(p) = self.pending_invalidate.remove(&line) {
                self.complete_getm(line, p.requestor);
            }
        }
    }

    fn complete_getm(&mut self, line: u64, requestor: usize) {
        let data = self.entry(line).data;
        let e = self.entry(line);
        e.sharers.clear();
        e.sharers.insert(requestor);
        e.owner = Some(requestor);
        e.state = LineState::Modified;
        self.sends.push_back((
            SendTarget::L1(requestor),
            CcMsg::new(CcMsgType::GetmResp, line, 0).with_data(data),
        ));
    }

    /// Drains the next message the L2 wants to send (to an L1 port or to
    /// the memory node).
    pub fn take_send(&mut self) -> Option<(SendTarget, CcMsg)> {
        self.sends.pop_front()
    }
}

impl Default for L2Cache {
    fn default() -> Self {
        Self::new()
    }
}
