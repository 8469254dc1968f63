//! MOESI coherence vocabulary: line states, MSHR transition states, and the
//! wire message shape carried over the bus's three channels.
//!
//! Grounded on `cache/moesi/protocal.h`'s `CC_*`/`MSHR_*`/`MSG_*` constants and
//! `CacheCohenrenceMsg`; the five line states, the nine MSHR transition states,
//! and the sixteen message types below are a direct, renamed port of that
//! vocabulary to Rust enums instead of raw `uint32_t` constants.

/// Fixed coherence line size in bytes. The MOESI fabric always moves whole
/// lines of this size, independent of the configurable `CacheConfig::line_bytes`
/// used by the plain timing-only cache model.
pub const CACHE_LINE_BYTES: usize = 64;

/// MOESI cache line state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineState {
    /// Not present / no valid data.
    #[default]
    Invalid,
    /// Shared, clean, possibly also held by other caches.
    Shared,
    /// Exclusive, clean, held only by this cache.
    Exclusive,
    /// Modified, dirty, held only by this cache.
    Modified,
    /// Owned, dirty, but also shared read-only with other caches.
    Owned,
}

/// In-flight MSHR transition state: the two endpoints of a coherence transaction
/// the line is moving between.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MshrState {
    /// No outstanding transaction.
    #[default]
    Invalid,
    ItoI,
    ItoS,
    ItoM,
    StoM,
    MtoI,
    StoI,
    EtoI,
    OtoM,
    OtoI,
}

/// Coherence message type, carried on one of three bus channels
/// ([`Channel::Ack`], [`Channel::Resp`], [`Channel::Req`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CcMsgType {
    /// L2 -> L1: invalidate a line; `arg` names the port the ack should go to.
    Invalid,
    /// L1 -> L1 or L1 -> L2: acknowledge an `Invalid`.
    InvalidAck,
    /// L1 -> L2: request a line read-only.
    Gets,
    /// L2 -> L1: forward a `Gets` to the current owner.
    GetsForward,
    /// L1 -> L2: request a line read-write.
    Getm,
    /// L2 -> L1: forward a `Getm` to the current owner.
    GetmForward,
    /// L2 -> L1: acknowledge a `Getm`; `arg` is the ack count to wait for.
    GetmAck,
    /// L2 -> L1 or L1 -> L1: line data for a `Gets`; `arg` is the sharer count.
    GetsResp,
    /// L2 -> L1 or L1 -> L1: line data for a `Getm`; no further ack needed.
    GetmResp,
    /// Memory node -> L1/L2: line data fetched from backing memory.
    GetRespMem,
    /// L1 -> L2: acknowledges receipt of data from memory or another L1.
    GetAck,
    /// L1 -> L2: write back a shared (clean) line.
    Puts,
    /// L1 -> L2: write back a dirty (modified) line; carries data.
    Putm,
    /// L1 -> L2: write back a clean (exclusive) line.
    Pute,
    /// L1 -> L2: write back a dirty (owned) line; carries data.
    Puto,
    /// L2 -> L1: acknowledge a put.
    PutAck,
}

/// Which of the bus's three channels a message travels on. Channels are
/// independent queues so that, e.g., an `InvalidAck` can never be blocked
/// behind a data response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Ack,
    Resp,
    Req,
}

impl CcMsgType {
    /// The channel this message type always travels on.
    #[must_use]
    pub fn channel(self) -> Channel {
        match self {
            CcMsgType::InvalidAck | CcMsgType::GetmAck | CcMsgType::GetAck | CcMsgType::PutAck => {
                Channel::Ack
            }
            CcMsgType::GetsResp | CcMsgType::GetmResp | CcMsgType::GetRespMem => Channel::Resp,
            CcMsgType::Invalid
            | CcMsgType::Gets
            | CcMsgType::GetsForward
            | CcMsgType::Getm
            | CcMsgType::GetmForward
            | CcMsgType::Puts
            | CcMsgType::Putm
            | CcMsgType::Pute
            | CcMsgType::Puto => Channel::Req,
        }
    }

    /// Whether this message type carries a full cache line of data.
    #[must_use]
    pub fn carries_data(self) -> bool {
        matches!(
            self,
            CcMsgType::GetsResp
                | CcMsgType::GetmResp
                | CcMsgType::GetRespMem
                | CcMsgType::Putm
                | CcMsgType::Puto
        )
    }
}

/// A coherence message: header plus an optional cache line of data.
#[derive(Clone, Debug)]
pub struct CcMsg {
    pub msg_type: CcMsgType,
    /// Message-specific argument: a port id, sharer/ack count, or transaction id.
    pub arg: u32,
    /// Cache line index (address divided by line size).
    pub line: u64,
    pub data: Option<[u8; CACHE_LINE_BYTES]>,
}

impl CcMsg {
    #[must_use]
    pub fn new(msg_type: CcMsgType, line: u64, arg: u32) -> Self {
        Self {
            msg_type,
            arg,
            line,
            data: None,
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: [u8; CACHE_LINE_BYTES]) -> Self {
        self.data = Some(data);
        self
    }
}
