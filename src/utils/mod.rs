pub mod content;
pub mod spool;
pub mod writer;

pub use content::{resolve_content, ContentError};
pub use writer::{MessageWriter, StdoutWriter};

#[cfg(test)]
pub use writer::MockWriter;
