//! Foundation types for Casket.
//!
//! This crate provides the core addressing and configuration types used
//! throughout the Casket system. Every other Casket crate depends on
//! `casket-types`.
//!
//! # Key Types
//!
//! - [`Address`] — Fixed-width, hex-encoded content address of a block
//! - [`DigestKind`] — The configurable digest function that derives addresses
//! - [`Geometry`] — Per-instance block layout configuration (block size,
//!   header size, digest, salt)
//! - [`Lifecycle`] — The Open → Closed state shared by stores, writers, and
//!   readers

pub mod address;
pub mod digest;
pub mod error;
pub mod geometry;
pub mod lifecycle;

pub use address::Address;
pub use digest::DigestKind;
pub use error::TypeError;
pub use geometry::{Geometry, GeometryError};
pub use lifecycle::Lifecycle;
