//! # molcv Core Library
//!
//! A high-performance library for computing the circular variance (CV) of residues
//! in a molecular structure: a geometric descriptor of how uniformly the neighbors
//! around each atom are distributed in direction, used to detect surface pockets,
//! buried sites, and solvent exposure in macromolecules.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a clear
//! separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains the immutable columnar atom store
//!   (`AtomTable`) and the small geometric utilities everything else builds on.
//!
//! - **[`engine`]: The Logic Core.** The computational machinery: the uniform-cell
//!   spatial index used for radius-bounded neighbor queries, the circular variance
//!   kernel, the per-residue reducer, and the configuration and error types.
//!
//! - **[`workflows`]: The Public API.** The highest-level, user-facing layer. It
//!   ties the `engine` and `core` together into the multi-cutoff CV computation
//!   consumed by the CLI, the Python bindings, and the C FFI surface.

pub mod core;
pub mod engine;
pub mod workflows;
