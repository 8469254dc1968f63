//! MOESI L1 data cache with MSHR-driven miss handling.
//!
//! Grounded on `cache/moesi/l1cachev2.h`: `load`/`store`/`load_reserved`/
//! `store_conditional`/`amo` each either hit in the current [`LineState`] and
//! return immediately, or allocate an MSHR entry and return
//! [`MemOpError::Miss`]; the caller (the LSU) polls [`L1Cache::take_arrival`]
//! each tick to learn which lines completed and should be replayed.
//! `push_send_buf`/`push_send_buf_with_line` become [`L1Cache::take_send`],
//! drained into the [`super::bus::Bus`] by the cache's owner each tick.

use super::mshr::{MshrFile, PendingRequestor};
use super::protocol::{CACHE_LINE_BYTES, CcMsg, CcMsgType, LineState};
use crate::common::error::MemOpError;
use std::collections::VecDeque;

fn line_of(addr: u64) -> u64 {
    addr / CACHE_LINE_BYTES as u64
}

fn offset_in_line(addr: u64) -> usize {
    (addr % CACHE_LINE_BYTES as u64) as usize
}

struct CacheLine {
    line: u64,
    state: LineState,
    data: [u8; CACHE_LINE_BYTES],
}

/// Destination for a pending coherence send: the shared L2 port, or, in a
/// cache-to-cache transfer, a specific peer L1's port.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendDst {
    L2,
    Peer(usize),
}

pub struct L1Cache {
    port: usize,
    capacity: usize,
    lines: Vec<CacheLine>,
    mshr: MshrFile,
    /// Address of the line currently held under an active LR reservation.
    reservation: Option<u64>,
    arrivals: VecDeque<u64>,
    sends: VecDeque<(SendDst, CcMsg)>,
}

impl L1Cache {
    #[must_use]
    pub fn new(port: usize, capacity: usize, mshr_entries: usize) -> Self {
        Self {
            port,
            capacity,
            lines: Vec::with_capacity(capacity),
            mshr: MshrFile::new(mshr_entries),
            reservation: None,
            arrivals: VecDeque::new(),
            sends: VecDeque::new(),
        }
    }

    fn find(&self, line: u64) -> Option<usize> {
        self.lines.iter().position(|l| l.line == line)
    }

    fn evict_if_needed(&mut self) {
        if self.lines.len() < self.capacity {
            return;
        }
        // Simple LRU-by-insertion-order victim; writeback if dirty.
        let victim = self.lines.remove(0);
        match victim.state {
            LineState::Modified => {
                self.sends.push_back((
                    SendDst::L2,
                    CcMsg::new(CcMsgType::Putm, victim.line, self.port as u32)
                        .with_data(victim.data),
                ));
            }
            LineState::Owned => {
                self.sends.push_back((
                    SendDst::L2,
                    CcMsg::new(CcMsgType::Puto, victim.line, self.port as u32)
                        .with_data(victim.data),
                ));
            }
            LineState::Exclusive => {
                self.sends
                    .push_back((SendDst::L2, CcMsg::new(CcMsgType::Pute, victim.line, self.port as u32)));
            }
            LineState::Shared => {
                self.sends
                    .push_back((SendDst::L2, CcMsg::new(CcMsgType::Puts, victim.line, self.port as u32)));
            }
            LineState::Invalid => {}
        }
    }

    fn begin_miss(&mut self, addr: u64, want_write: bool) -> MemOpError {
        let line = line_of(addr);
        if let Some(entry) = self.mshr.lookup_mut(line) {
            entry.waiters.push(PendingRequestor {
                port: self.port,
                is_write: want_write,
            });
            return MemOpError::Miss;
        }
        if self.mshr.is_full() {
            return MemOpError::Busy;
        }
        let state = if want_write {
            super::protocol::MshrState::ItoM
        } else {
            super::protocol::MshrState::ItoS
        };
        self.mshr
            .allocate(line, state, self.port)
            .expect("checked not full above");
        let msg_type = if want_write {
            CcMsgType::Getm
        } else {
            CcMsgType::Gets
        };
        self.sends
            .push_back((SendDst::L2, CcMsg::new(msg_type, line, self.port as u32)));
        MemOpError::Miss
    }

    /// Reads `width` bytes at `addr`. Hits in any valid state; misses allocate
    /// an MSHR and return [`MemOpError::Miss`]. An access that straddles two
    /// lines (the LSU's job to split before it ever reaches here) is reported
    /// as [`MemOpError::Unaligned`] instead of reading past the line.
    pub fn load(&mut self, addr: u64, width: usize) -> Result<u64, MemOpError> {
        let line = line_of(addr);
        let off = offset_in_line(addr);
        if off + width > CACHE_LINE_BYTES {
            return Err(MemOpError::Unaligned);
        }
        if let Some(idx) = self.find(line) {
            if self.lines[idx].state != LineState::Invalid {
                return Ok(read_width(&self.lines[idx].data, off, width));
            }
        }
        Err(self.begin_miss(addr, false))
    }

    /// Writes `width` bytes of `value` at `addr`. Requires `Modified` or
    /// `Exclusive`; any other state (including a clean hit) upgrades via a
    /// `Getm` miss first, matching the original's write-allocate policy.
    pub fn store(&mut self, addr: u64, value: u64, width: usize) -> Result<(), MemOpError> {
        let line = line_of(addr);
        let off = offset_in_line(addr);
        if off + width > CACHE_LINE_BYTES {
            return Err(MemOpError::Unaligned);
        }
        if let Some(idx) = self.find(line) {
            let state = self.lines[idx].state;
            if matches!(state, LineState::Modified | LineState::Exclusive) {
                write_width(&mut self.lines[idx].data, off, width, value);
                self.lines[idx].state = LineState::Modified;
                if self.reservation == Some(line) {
                    self.reservation = None;
                }
                return Ok(());
            }
        }
        Err(self.begin_miss(addr, true))
    }

    /// `lr.*`: behaves like `load`, additionally arming a reservation on the
    /// line. Any intervening coherence invalidation of this line (see
    /// [`Self::handle_incoming`]) clears the reservation.
    pub fn load_reserved(&mut self, addr: u64, width: usize) -> Result<u64, MemOpError> {
        let val = self.load(addr, width)?;
        self.reservation = Some(line_of(addr));
        Ok(val)
    }

    /// `sc.*`: succeeds only while the reservation on this line is still
    /// armed; a lost reservation returns [`MemOpError::Unconditional`], which
    /// the LSU turns into writing `1` to the destination register rather than
    /// performing the store.
    pub fn store_conditional(&mut self, addr: u64, value: u64, width: usize) -> Result<(), MemOpError> {
        if self.reservation != Some(line_of(addr)) {
            return Err(MemOpError::Unconditional);
        }
        self.store(addr, value, width)
    }

    /// Processes an incoming coherence message delivered to this port.
    /// Returns `true` if the message resolved an outstanding miss (the
    /// caller should also check [`Self::take_arrival`]).
    pub fn handle_incoming(&mut self, msg: CcMsg) -> bool {
        match msg.msg_type {
            CcMsgType::Invalid => {
                if let Some(idx) = self.find(msg.line) {
                    if self.lines[idx].state == LineState::Modified
                        || self.lines[idx].state == LineState::Owned
                    {
                        self.sends.push_back((
                            SendDst::L2,
                            CcMsg::new(CcMsgType::Putm, msg.line, self.port as u32)
                                .with_data(self.lines[idx].data),
                        ));
                    }
                    self.lines[idx].state = LineState::Invalid;
                }
                if self.reservation == Some(msg.line) {
                    self.reservation = None;
                }
                self.sends.push_back((
                    SendDst::L2,
                    CcMsg::new(CcMsgType::InvalidAck, msg.line, self.port as u32),
                ));
                false
            }
            CcMsgType::GetsForward => {
                if let Some(idx) = self.find(msg.line) {
                    self.sends.push_back((
                        SendDst::Peer(msg.arg as usize),
                        CcMsg::new(CcMsgType::GetsResp, msg.line, self.port as u32)
                            .with_data(self.lines[idx].data),
                    ));
                    if self.lines[idx].state == LineState::Modified {
                        self.lines[idx].state = LineState::Owned;
                    }
                }
                false
            }
            CcMsgType::GetmForward => {
                if let Some(idx) = self.find(msg.line) {
                    self.sends.push_back((
                        SendDst::Peer(msg.arg as usize),
                        CcMsg::new(CcMsgType::GetmResp, msg.line, self.port as u32)
                            .with_data(self.lines[idx].data),
                    ));
                    self.lines[idx].state = LineState::Invalid;
                }
                false
            }
            CcMsgType::GetsResp | CcMsgType::GetmResp | CcMsgType::GetRespMem => {
                let Some(released) = self.mshr.release(msg.line) else {
                    return false;
                };
                self.evict_if_needed();
                let state = if msg.msg_type == CcMsgType::GetmResp {
                    LineState::Modified
                } else {
                    LineState::Shared
                };
                self.lines.push(CacheLine {
                    line: msg.line,
                    state,
                    data: msg.data.unwrap_or([0u8; CACHE_LINE_BYTES]),
                });
                self.arrivals.push_back(msg.line);
                for waiter in released.waiters {
                    self.sends.push_back((
                        SendDst::L2,
                        CcMsg::new(
                            if waiter.is_write {
                                CcMsgType::Getm
                            } else {
                                CcMsgType::Gets
                            },
                            msg.line,
                            waiter.port as u32,
                        ),
                    ));
                }
                true
            }
            _ => false,
        }
    }

    /// Drains a line that finished arriving so the LSU can replay the
    /// original access.
    pub fn take_arrival(&mut self) -> Option<u64> {
        self.arrivals.pop_front()
    }

    /// Drains the next message this cache wants to send out over the bus.
    pub fn take_send(&mut self) -> Option<(SendDst, CcMsg)> {
        self.sends.pop_front()
    }
}

fn read_width(data: &[u8; CACHE_LINE_BYTES], off: usize, width: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes[..width].copy_from_slice(&data[off..off + width]);
    u64::from_le_bytes(bytes)
}

fn write_width(data: &mut [u8; CACHE_LINE_BYTES], off: usize, width: usize, value: u64) {
    let bytes = value.to_le_bytes();
    data[off..off + width].copy_from_slice(&bytes[..width]);
}
