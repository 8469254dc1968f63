//! Backing memory node: services line-grain reads behind the L2 directory.
//!
//! Grounded on `mem/memnode.h`/`memnode.cpp`: a small FIFO of in-flight line
//! accesses (`MemoryAccessBuf`, capacity `memory_access_buf_size`, default 4)
//! is drained a configurable number of bytes per tick (`dwidth`), and once a
//! line's bytes have all been "transferred" the node emits a
//! [`protocol::CcMsgType::GetRespMem`] back to the requesting port.

use super::protocol::{CACHE_LINE_BYTES, CcMsg, CcMsgType};
use std::collections::VecDeque;

const DEFAULT_BUF_SIZE: usize = 4;
const DEFAULT_DWIDTH: usize = 8;

struct AccessBuf {
    requester_port: usize,
    line: u64,
    bytes_remaining: usize,
}

/// Line-grain memory controller feeding `GetRespMem` responses to the bus.
pub struct MemoryNode {
    buf: VecDeque<AccessBuf>,
    buf_cap: usize,
    dwidth: usize,
    completed: VecDeque<(usize, CcMsg)>,
}

impl MemoryNode {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_BUF_SIZE, DEFAULT_DWIDTH)
    }

    #[must_use]
    pub fn with_config(buf_cap: usize, dwidth: usize) -> Self {
        Self {
            buf: VecDeque::new(),
            buf_cap,
            dwidth,
            completed: VecDeque::new(),
        }
    }

    /// Whether the access FIFO has room for another in-flight line request.
    #[must_use]
    pub fn can_accept(&self) -> bool {
        self.buf.len() < self.buf_cap
    }

    /// Queues a line fetch on behalf of `requester_port`. Panics if the FIFO
    /// is full; callers must check [`Self::can_accept`] first.
    pub fn request(&mut self, requester_port: usize, line: u64) {
        assert!(self.can_accept(), "memory access buffer overflow");
        self.buf.push_back(AccessBuf {
            requester_port,
            line,
            bytes_remaining: CACHE_LINE_BYTES,
        });
    }

    /// Drains `dwidth` bytes from the head-of-line access; when a line
    /// finishes, queues a `GetRespMem` for delivery.
    pub fn apply_next_tick(&mut self) {
        if let Some(head) = self.buf.front_mut() {
            head.bytes_remaining = head.bytes_remaining.saturating_sub(self.dwidth);
            if head.bytes_remaining == 0 {
                let head = self.buf.pop_front().unwrap();
                let msg = CcMsg::new(CcMsgType::GetRespMem, head.line, 0)
                    .with_data([0u8; CACHE_LINE_BYTES]);
                self.completed.push_back((head.requester_port, msg));
            }
        }
    }

    /// Pops the next completed line response and its destination port, if any.
    pub fn take_response(&mut self) -> Option<(usize, CcMsg)> {
        self.completed.pop_front()
    }
}

impl Default for MemoryNode {
    fn default() -> Self {
        Self::new()
    }
}
