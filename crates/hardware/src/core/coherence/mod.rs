//! MOESI directory-based cache coherence fabric.
//!
//! Replaces the teacher's timing-only `core::units::cache::CacheSim` with a
//! real multi-core coherence model: a packetized [`bus::Bus`] connecting each
//! core's [`l1::L1Cache`] to a shared [`l2::L2Cache`] directory, backed by
//! [`memnode::MemoryNode`]. Grounded on `original_source/src/bus/simplebus.*`,
//! `original_source/src/mem/memnode.*`, and `original_source/src/cache/moesi/*`.
//!
//! The original's L2 (`l1l2v2.h`) is a private per-core L1+L2 pair with
//! per-line serialization rather than an explicit sharer-bitmap directory;
//! [`l2`] instead implements a conventional shared directory (sharer set +
//! owner) using the same message vocabulary, since the spec calls for a
//! directory L2 shared across cores.

pub mod bus;
pub mod l1;
pub mod l2;
pub mod memnode;
pub mod mshr;
pub mod protocol;
