//! Low-level DTS file plumbing.
//!
//! A DTS file is laid out as:
//!
//! ```text
//! u32  version | exporter << 16
//! u32  total words in the packed region
//! u32  word offset of the 16-bit lane
//! u32  word offset of the 8-bit lane
//! ...  packed region (32-bit lane, 16-bit lane, 8-bit lane)
//! u32  sequence count, then the sequence records
//! ...  material list
//! ```
//!
//! The packed region holds everything except sequences and materials. Its
//! three lanes are read in parallel by [`PackedReader`] and produced by
//! [`PackedWriter`]; the framed parts around it go through [`IStream`] and
//! [`OStream`].

pub mod arena;
pub mod format;
pub mod reader;
pub mod stream;
pub mod writer;

pub use arena::{Arena, Array, ArrayView};
pub use format::{
    PackedRegion, RegionLayout, Version, CURRENT_VERSION, MIN_VERSION,
    MOST_RECENT_EXPORTER_VERSION,
};
pub use reader::{
    Checkpoint, CheckpointPolicy, CopyingVisitor, InputSpan, Lane, PackedReader, SizingVisitor,
    Traversal, Visitor,
};
pub(crate) use reader::elements;
pub use stream::{IStream, OStream};
pub use writer::PackedWriter;
