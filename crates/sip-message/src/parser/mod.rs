//! # Parsing
//!
//! Two layers, both working on bytes:
//!
//! - [`framing`] splits a message into start line, header lines and body and
//!   reports them to a [`MessageListener`] as views over the input.
//! - [`values`] and [`whitespace`] hold the nom parsers that give structure to
//!   individual header values when a caller asks for it.

pub mod framing;
pub mod listener;
pub mod values;
pub mod whitespace;

pub use framing::{parse_message, scan};
pub use listener::{ElementId, MessageAssembler, MessageListener};
pub use whitespace::ParseResult;
