//! Data models for the engine's input domain.
//!
//! The only model the CV computation needs is the [`table::AtomTable`]: atom
//! positions in caller order plus the contiguous residue partition over them.
//! There is deliberately no mutable molecular-system abstraction here; the
//! engine is a pure function over an immutable snapshot.

pub mod table;
