//! Stream layer for Casket.
//!
//! [`StreamWriter`] chunks a byte stream into DATA blocks at payload
//! capacity, then folds the resulting address list bottom-up: each round
//! groups pending addresses into INDIRECT blocks of at most
//! `indirect_capacity` children, in order, until a single root address
//! remains. A stream that fits in one data block gets no indirect wrapper —
//! its data block address is the root.
//!
//! [`StreamReader`] reverses the construction with an explicit FIFO queue
//! seeded with the root. Because the fold packs children consecutively and in
//! original order, dequeue order is exactly original stream order, for trees
//! of any depth or width, without recursion.

pub mod error;
pub mod reader;
pub mod writer;

pub use error::{StreamError, StreamResult};
pub use reader::StreamReader;
pub use writer::{StreamWriter, WriteReceipt};
