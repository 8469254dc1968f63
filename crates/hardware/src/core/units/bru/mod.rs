//! Branch prediction unit (BPU): a fixed three-stage composite predictor.
//!
//! Stage 1 (`ubtb`) gives a same-cycle fetch redirect; stage 2 (`ftb` + `tage` +
//! `ittage` + `ras`) supplies the authoritative fetch-package prediction; stage 3
//! (`Bpu::cross_check`) reconciles the two. See [`bpu::Bpu`] for the composite driver.

/// Stage-2 fetch-target buffer (package shape: length, jump class/target, branches).
pub mod ftb;
/// Global/branch history register and its folded-XOR indexing operation.
pub mod ghr;
/// Indirect-branch (`jalr`) target predictor.
pub mod ittage;
/// Composite three-stage predictor driver.
pub mod bpu;
/// Split speculative/committed Return Address Stack.
pub mod ras;
/// TAGE conditional-branch predictor with Statistical Corrector.
pub mod tage;
/// Stage-1 micro-BTB.
pub mod ubtb;

pub use bpu::{Bpu, FetchPackagePrediction};
