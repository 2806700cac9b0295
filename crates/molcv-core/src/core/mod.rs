//! # Core Module
//!
//! This module provides the fundamental building blocks for the circular variance
//! computation: the immutable atom store shared by every stage of the engine, and
//! the small geometric utilities the spatial index is built on.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - The columnar atom table with its
//!   residue partition.
//! - **Geometry Utilities** ([`utils`]) - Bounding boxes and distance helpers on
//!   the fixed-width position vectors.

pub mod models;
pub mod utils;
