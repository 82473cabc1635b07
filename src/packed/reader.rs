//! Two-pass reader over the packed region.
//!
//! The model and mesh codecs walk the packed region through a [`PackedReader`]
//! twice. The first walk drives a [`SizingVisitor`], which only measures how
//! many arena bytes the copy-capable operations would produce; the second walk
//! drives a [`CopyingVisitor`] over an arena of exactly that size. Both walks
//! run the same field-order functions, so the layout is described once.
//!
//! Input lanes are independent: the 32-bit, 16-bit and 8-bit values of the
//! region are read from three cursors that never realign against each other.
//! Only the output is realigned, at explicit [`PackedReader::align32`] calls.

use bytemuck::Pod;
use tracing::trace;

use super::arena::{Arena, ArrayView};
use super::format::PackedRegion;
use crate::util::{Error, Result};

/// One of the three typed input lanes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lane {
    Word,
    Half,
    Byte,
}

impl Lane {
    /// Element width in bytes.
    #[inline]
    pub const fn width(self) -> usize {
        match self {
            Self::Word => 4,
            Self::Half => 2,
            Self::Byte => 1,
        }
    }

    /// Human readable name used in errors.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Word => "32-bit",
            Self::Half => "16-bit",
            Self::Byte => "8-bit",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Word => 0,
            Self::Half => 1,
            Self::Byte => 2,
        }
    }
}

/// How copy-capable operations treat the output during one walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Traversal {
    /// Measure output growth without writing.
    Size,
    /// Advance the input only; the substructure contributes nothing.
    SizeAndSkip,
    /// Write into the preallocated arena.
    Copy,
}

impl Traversal {
    /// True when the substructure is walked for its input only.
    #[inline]
    pub fn skipping(self) -> bool {
        self == Self::SizeAndSkip
    }
}

/// A span of input recorded by [`PackedReader::peek_pointer`].
///
/// `start` and `len` count lane elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputSpan {
    pub lane: Lane,
    pub start: usize,
    pub len: usize,
}

/// Output and input positions recorded at a guard checkpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Checkpoint {
    /// Arena bytes produced so far.
    pub output: usize,
    /// Elements consumed per lane (word, half, byte).
    pub input: [usize; 3],
}

/// Which checkpoints the copying pass compares against the sizing pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CheckpointPolicy {
    /// Compare output and input positions at every guard.
    #[default]
    EveryGuard,
    /// Only compare the total arena size once the walk is complete.
    FinalOnly,
}

/// Output side of a walk.
pub trait Visitor {
    /// True for the pass that writes into the arena.
    const COPIES: bool;

    /// Arena bytes produced so far.
    fn position(&self) -> usize;

    /// Append bytes, returning the offset they were placed at.
    fn append(&mut self, bytes: &[u8]) -> Result<usize>;

    /// Reserve `len` zeroed bytes, returning their offset.
    fn reserve(&mut self, len: usize) -> Result<usize>;

    /// Called once per guard, after the guard value has been verified.
    fn checkpoint(&mut self, index: usize, at: Checkpoint) -> Result<()>;
}

/// First pass: accumulates the arena size and records checkpoints.
#[derive(Debug, Default)]
pub struct SizingVisitor {
    len: usize,
    checkpoints: Vec<Checkpoint>,
}

impl SizingVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total arena size and the recorded checkpoints.
    pub fn finish(self) -> (usize, Vec<Checkpoint>) {
        (self.len, self.checkpoints)
    }
}

impl Visitor for SizingVisitor {
    const COPIES: bool = false;

    #[inline]
    fn position(&self) -> usize {
        self.len
    }

    #[inline]
    fn append(&mut self, bytes: &[u8]) -> Result<usize> {
        self.reserve(bytes.len())
    }

    #[inline]
    fn reserve(&mut self, len: usize) -> Result<usize> {
        let at = self.len;
        self.len = at
            .checked_add(len)
            .ok_or_else(|| Error::invalid("arena size overflow"))?;
        Ok(at)
    }

    fn checkpoint(&mut self, _index: usize, at: Checkpoint) -> Result<()> {
        self.checkpoints.push(at);
        Ok(())
    }
}

/// Second pass: fills an arena sized by the first pass.
#[derive(Debug)]
pub struct CopyingVisitor {
    arena: Arena,
    pos: usize,
    expected: Vec<Checkpoint>,
    policy: CheckpointPolicy,
}

impl CopyingVisitor {
    /// Allocate the arena measured by a [`SizingVisitor`].
    pub fn new(size: usize, expected: Vec<Checkpoint>, policy: CheckpointPolicy) -> Self {
        Self { arena: Arena::zeroed(size), pos: 0, expected, policy }
    }

    /// Check that the arena was filled exactly and hand it over.
    pub fn finish(self) -> Result<Arena> {
        if self.pos != self.arena.len() {
            return Err(Error::PassDivergence {
                checkpoint: self.expected.len(),
                sized: self.arena.len(),
                copied: self.pos,
            });
        }
        Ok(self.arena)
    }

    fn overflow(&self, len: usize) -> Error {
        Error::PassDivergence {
            checkpoint: self.expected.len(),
            sized: self.arena.len(),
            copied: self.pos + len,
        }
    }
}

impl Visitor for CopyingVisitor {
    const COPIES: bool = true;

    #[inline]
    fn position(&self) -> usize {
        self.pos
    }

    fn append(&mut self, bytes: &[u8]) -> Result<usize> {
        let at = self.pos;
        let end = at + bytes.len();
        if end > self.arena.len() {
            return Err(self.overflow(bytes.len()));
        }
        self.arena.bytes_mut()[at..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(at)
    }

    fn reserve(&mut self, len: usize) -> Result<usize> {
        let at = self.pos;
        if at + len > self.arena.len() {
            return Err(self.overflow(len));
        }
        self.pos += len;
        Ok(at)
    }

    fn checkpoint(&mut self, index: usize, at: Checkpoint) -> Result<()> {
        if self.policy == CheckpointPolicy::FinalOnly {
            return Ok(());
        }
        let sized = self.expected.get(index).copied().unwrap_or_default();
        if sized.output != at.output {
            return Err(Error::PassDivergence { checkpoint: index, sized: sized.output, copied: at.output });
        }
        if let Some(lane) = (0..3).find(|&l| sized.input[l] != at.input[l]) {
            return Err(Error::PassDivergence {
                checkpoint: index,
                sized: sized.input[lane],
                copied: at.input[lane],
            });
        }
        Ok(())
    }
}

/// Cursor over one host-order lane.
#[derive(Debug)]
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    lane: Lane,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8], lane: Lane) -> Self {
        Self { data, pos: 0, lane }
    }

    /// Byte range of `count` elements starting at element `start`.
    fn range(&self, start: usize, count: usize) -> Result<std::ops::Range<usize>> {
        let width = self.lane.width();
        let begin = start * width;
        let end = count
            .checked_mul(width)
            .and_then(|n| n.checked_add(begin))
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| Error::truncated(self.lane.name(), start as u64))?;
        Ok(begin..end)
    }

    /// Elements left after the current position.
    fn remaining(&self) -> usize {
        (self.data.len() / self.lane.width()).saturating_sub(self.pos)
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let range = self.range(self.pos, count)?;
        self.pos += count;
        Ok(&self.data[range])
    }

    fn span(&self, span: &InputSpan) -> Result<&'a [u8]> {
        Ok(&self.data[self.range(span.start, span.len)?])
    }
}

/// Reads the packed region, forwarding output growth to a [`Visitor`].
#[derive(Debug)]
pub struct PackedReader<'a, V> {
    lanes: [Cursor<'a>; 3],
    guard: u32,
    visitor: V,
}

impl<'a, V: Visitor> PackedReader<'a, V> {
    pub fn new(region: &'a PackedRegion, visitor: V) -> Self {
        Self {
            lanes: [
                Cursor::new(bytemuck::cast_slice(&region.words), Lane::Word),
                Cursor::new(bytemuck::cast_slice(&region.halves), Lane::Half),
                Cursor::new(&region.bytes, Lane::Byte),
            ],
            guard: 0,
            visitor,
        }
    }

    /// The traversal mode for a substructure that is or is not being skipped.
    #[inline]
    pub fn traversal(&self, skip: bool) -> Traversal {
        match (skip, V::COPIES) {
            (true, _) => Traversal::SizeAndSkip,
            (false, false) => Traversal::Size,
            (false, true) => Traversal::Copy,
        }
    }

    /// Elements consumed so far per lane.
    pub fn positions(&self) -> [usize; 3] {
        [self.lanes[0].pos, self.lanes[1].pos, self.lanes[2].pos]
    }

    /// Fail unless at least `count` more values are left in `lane`.
    ///
    /// Used for counts that size tables before the values they describe
    /// are read.
    pub fn ensure_remaining(&self, lane: Lane, count: usize, what: &'static str) -> Result<()> {
        let cursor = &self.lanes[lane.index()];
        if count > cursor.remaining() {
            return Err(Error::truncated(what, cursor.pos as u64));
        }
        Ok(())
    }

    /// Arena bytes produced so far.
    #[inline]
    pub fn output_position(&self) -> usize {
        self.visitor.position()
    }

    pub fn into_visitor(self) -> V {
        self.visitor
    }

    #[inline]
    fn lane(&mut self, lane: Lane) -> &mut Cursor<'a> {
        &mut self.lanes[lane.index()]
    }

    /// Read the next value of the 32-bit lane.
    pub fn consume_u32(&mut self) -> Result<u32> {
        let b = self.lane(Lane::Word).take(1)?;
        Ok(u32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn consume_i32(&mut self) -> Result<i32> {
        Ok(self.consume_u32()? as i32)
    }

    pub fn consume_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.consume_u32()?))
    }

    /// Read a count and reject negative values.
    pub fn consume_count(&mut self, what: &str) -> Result<usize> {
        let value = self.consume_i32()?;
        usize::try_from(value).map_err(|_| Error::invalid(format!("negative {what} count: {value}")))
    }

    pub fn consume_u16(&mut self) -> Result<u16> {
        let b = self.lane(Lane::Half).take(1)?;
        Ok(u16::from_ne_bytes([b[0], b[1]]))
    }

    pub fn consume_u8(&mut self) -> Result<u8> {
        Ok(self.lane(Lane::Byte).take(1)?[0])
    }

    /// Read one record of `T` from a lane.
    pub fn consume_pod<T: Pod>(&mut self, lane: Lane) -> Result<T> {
        let n = elements::<T>(lane, 1)?;
        Ok(bytemuck::pod_read_unaligned(self.lane(lane).take(n)?))
    }

    /// Read `count` values of `T` from a lane without touching the output.
    pub fn consume_vec<T: Pod>(&mut self, lane: Lane, count: usize) -> Result<Vec<T>> {
        let n = elements::<T>(lane, count)?;
        Ok(bytemuck::pod_collect_to_vec(self.lane(lane).take(n)?))
    }

    /// Record the next `count` lane elements and step over them.
    pub fn peek_pointer(&mut self, lane: Lane, count: usize) -> Result<InputSpan> {
        let cursor = self.lane(lane);
        let start = cursor.pos;
        cursor.take(count)?;
        Ok(InputSpan { lane, start, len: count })
    }

    /// Raw bytes of a recorded span.
    pub fn span_bytes(&self, span: &InputSpan) -> Result<&'a [u8]> {
        self.lanes[span.lane.index()].span(span)
    }

    /// Step over `count` values of `T`, returning a copy of them.
    pub fn peek_vec<T: Pod>(&mut self, lane: Lane, count: usize) -> Result<Vec<T>> {
        let span = self.peek_pointer(lane, elements::<T>(lane, count)?)?;
        Ok(bytemuck::pod_collect_to_vec(self.span_bytes(&span)?))
    }

    /// The bytes of the 8-bit lane not yet consumed.
    pub fn remaining_bytes(&self) -> &'a [u8] {
        let cursor = &self.lanes[Lane::Byte.index()];
        &cursor.data[cursor.pos..]
    }

    /// Consume `count` values of `T` and append them to the output.
    pub fn consume_and_copy<T: Pod>(
        &mut self,
        lane: Lane,
        count: usize,
        t: Traversal,
    ) -> Result<ArrayView<T>> {
        let span = self.peek_pointer(lane, elements::<T>(lane, count)?)?;
        self.copy_span(&span, count, t)
    }

    /// Like [`consume_and_copy`](Self::consume_and_copy), also returning the values.
    pub fn consume_and_copy_values<T: Pod>(
        &mut self,
        lane: Lane,
        count: usize,
        t: Traversal,
    ) -> Result<(ArrayView<T>, Vec<T>)> {
        let span = self.peek_pointer(lane, elements::<T>(lane, count)?)?;
        let values = bytemuck::pod_collect_to_vec(self.span_bytes(&span)?);
        Ok((self.copy_span(&span, count, t)?, values))
    }

    /// Append the contents of an earlier span to the output.
    pub fn copy_span<T: Pod>(
        &mut self,
        span: &InputSpan,
        count: usize,
        t: Traversal,
    ) -> Result<ArrayView<T>> {
        if t.skipping() {
            return Ok(ArrayView::new(self.visitor.position(), 0));
        }
        let bytes = self.span_bytes(span)?;
        let at = self.visitor.append(bytes)?;
        Ok(ArrayView::new(at, count))
    }

    /// Reserve `count` zeroed values of `T` without consuming input.
    pub fn allocate_only<T: Pod>(&mut self, count: usize, t: Traversal) -> Result<ArrayView<T>> {
        if t.skipping() {
            return Ok(ArrayView::new(self.visitor.position(), 0));
        }
        let len = count
            .checked_mul(std::mem::size_of::<T>())
            .ok_or_else(|| Error::invalid("arena size overflow"))?;
        let at = self.visitor.reserve(len)?;
        Ok(ArrayView::new(at, count))
    }

    /// Pad the output to a 4-byte boundary.
    pub fn align32(&mut self, t: Traversal) -> Result<()> {
        if t.skipping() {
            return Ok(());
        }
        let pad = self.visitor.position().wrapping_neg() & 3;
        self.visitor.reserve(pad)?;
        Ok(())
    }

    /// Verify one guard value in each lane against the running counter.
    pub fn check_guard(&mut self) -> Result<()> {
        let expected = self.guard;
        let found32 = self.consume_i32()?;
        let found16 = self.consume_u16()? as i16;
        let found8 = self.consume_u8()? as i8;

        let checks = [
            (Lane::Word, expected as i32, found32),
            (Lane::Half, expected as i16 as i32, found16 as i32),
            (Lane::Byte, expected as i8 as i32, found8 as i32),
        ];
        for (lane, expected, found) in checks {
            if expected != found {
                return Err(Error::GuardMismatch { lane: lane.name(), expected, found });
            }
        }

        let at = Checkpoint { output: self.visitor.position(), input: self.positions() };
        trace!(guard = expected, output = at.output, "guard checkpoint");
        self.visitor.checkpoint(expected as usize, at)?;
        self.guard += 1;
        Ok(())
    }
}

/// Lane elements covered by `count` values of `T`.
pub(crate) fn elements<T: Pod>(lane: Lane, count: usize) -> Result<usize> {
    let size = std::mem::size_of::<T>();
    if size % lane.width() != 0 {
        return Err(Error::invalid(format!(
            "{}-byte values do not tile the {} lane",
            size,
            lane.name()
        )));
    }
    count
        .checked_mul(size / lane.width())
        .ok_or_else(|| Error::truncated(lane.name(), count as u64))
}
