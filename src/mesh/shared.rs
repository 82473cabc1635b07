//! Per-decode state: the format version and the table that lets a mesh reuse
//! the vertex data of an earlier mesh of the same object.
//!
//! Every decoded mesh records where each of its shareable arrays lives: in the
//! arena when it was copied, or in the input when the mesh was skipped. A
//! later mesh that names it as parent takes the same data, copying it out of
//! the input first if the parent never reached the arena.

use bytemuck::Pod;

use crate::packed::{elements, ArrayView, InputSpan, Lane, PackedReader, Traversal, Version, Visitor};
use crate::util::{Error, Result};

/// Shareable mesh arrays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SharedField {
    Verts,
    TVerts,
    Norms,
    EncodedNorms,
    InitialTransforms,
    VertexIndex,
    BoneIndex,
    Weight,
    NodeIndex,
}

impl SharedField {
    const COUNT: usize = 9;
}

/// Where a recorded array lives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SharedSource {
    /// Never recorded (null, decal or not-yet-decoded mesh).
    #[default]
    Missing,
    /// Still in the input: lane, first lane element and value count.
    Input { lane: Lane, start: usize, len: usize },
    /// Byte offset and element count in the arena.
    Arena { offset: usize, len: usize },
}

/// Recorded sources of one mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SharedEntry {
    sources: [SharedSource; SharedField::COUNT],
    /// True when the mesh's data was copied into the arena.
    pub copied: bool,
}

impl SharedEntry {
    pub fn new(copied: bool) -> Self {
        Self { copied, ..Default::default() }
    }

    #[inline]
    pub fn get(&self, field: SharedField) -> SharedSource {
        self.sources[field as usize]
    }

    #[inline]
    pub fn set(&mut self, field: SharedField, source: SharedSource) {
        self.sources[field as usize] = source;
    }
}

/// One entry per mesh slot, filled in decode order.
#[derive(Clone, Debug, Default)]
pub struct SharedTable {
    entries: Vec<SharedEntry>,
}

impl SharedTable {
    pub fn with_len(len: usize) -> Self {
        Self { entries: vec![SharedEntry::default(); len] }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> Option<&SharedEntry> {
        self.entries.get(index)
    }

    /// Store the sources of a freshly decoded mesh.
    pub fn record(&mut self, index: usize, entry: SharedEntry) -> Result<()> {
        let count = self.entries.len();
        let slot = self.entries.get_mut(index).ok_or(Error::IndexOutOfBounds { index, count })?;
        *slot = entry;
        Ok(())
    }
}

/// State threaded through one decode call.
#[derive(Clone, Debug)]
pub struct DecodeContext {
    pub version: Version,
    pub shared: SharedTable,
}

impl DecodeContext {
    pub fn new(version: Version) -> Self {
        Self { version, shared: SharedTable::default() }
    }

    /// Read one shareable array of mesh `mesh`.
    ///
    /// Returns the view placed in the arena (empty when skipping) and the
    /// source to record for this mesh.
    #[allow(clippy::too_many_arguments)]
    pub fn shared_array<V: Visitor, T: Pod>(
        &self,
        r: &mut PackedReader<'_, V>,
        mesh: usize,
        parent: i32,
        field: SharedField,
        lane: Lane,
        count: usize,
        t: Traversal,
    ) -> Result<(ArrayView<T>, SharedSource)> {
        if parent < 0 {
            if t.skipping() {
                let span = r.peek_pointer(lane, elements::<T>(lane, count)?)?;
                let empty = ArrayView::new(r.output_position(), 0);
                return Ok((empty, SharedSource::Input { lane, start: span.start, len: count }));
            }
            let view = r.consume_and_copy::<T>(lane, count, t)?;
            return Ok((view, SharedSource::Arena { offset: view.offset(), len: count }));
        }

        let invalid = Error::InvalidSharedMesh { mesh, parent };
        let index = parent as usize;
        if index >= mesh {
            return Err(invalid);
        }
        let entry = self.shared.entry(index).ok_or_else(|| Error::InvalidSharedMesh { mesh, parent })?;
        let source = entry.get(field);

        match source {
            // skins record their initial arrays in the same slots, so a child
            // may take fewer elements than the parent holds but never more
            SharedSource::Arena { len, .. } | SharedSource::Input { len, .. } if count > len => Err(invalid),
            SharedSource::Arena { offset, .. } => Ok((ArrayView::new(offset, count), source)),
            SharedSource::Input { lane, start, .. } if !t.skipping() => {
                // parent was skipped, so its data is copied here instead
                let span = InputSpan { lane, start, len: elements::<T>(lane, count)? };
                let view = r.copy_span::<T>(&span, count, t)?;
                Ok((view, SharedSource::Arena { offset: view.offset(), len: count }))
            }
            SharedSource::Input { .. } => Ok((ArrayView::new(r.output_position(), 0), source)),
            SharedSource::Missing if t.skipping() => Ok((ArrayView::new(r.output_position(), 0), source)),
            SharedSource::Missing => Err(Error::InvalidSharedMesh { mesh, parent }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packed::{PackedRegion, SizingVisitor};

    fn region() -> PackedRegion {
        PackedRegion { words: vec![1, 2, 3, 4, 5, 6], ..Default::default() }
    }

    #[test]
    fn test_root_array_copied() {
        let region = region();
        let mut r = PackedReader::new(&region, SizingVisitor::new());
        let cx = DecodeContext::new(Version::CURRENT);
        let (view, source) = cx
            .shared_array::<_, u32>(&mut r, 0, -1, SharedField::Verts, Lane::Word, 3, Traversal::Size)
            .unwrap();
        assert_eq!(view.len(), 3);
        assert_eq!(source, SharedSource::Arena { offset: 0, len: 3 });
        assert_eq!(r.output_position(), 12);
    }

    #[test]
    fn test_skipped_parent_copied_by_child() {
        let region = region();
        let mut r = PackedReader::new(&region, SizingVisitor::new());
        let mut cx = DecodeContext::new(Version::CURRENT);
        cx.shared = SharedTable::with_len(2);

        let (_, source) = cx
            .shared_array::<_, u32>(&mut r, 0, -1, SharedField::Verts, Lane::Word, 3, Traversal::SizeAndSkip)
            .unwrap();
        assert_eq!(source, SharedSource::Input { lane: Lane::Word, start: 0, len: 3 });
        assert_eq!(r.output_position(), 0);

        let mut entry = SharedEntry::default();
        entry.set(SharedField::Verts, source);
        cx.shared.record(0, entry).unwrap();

        let (view, source) = cx
            .shared_array::<_, u32>(&mut r, 1, 0, SharedField::Verts, Lane::Word, 2, Traversal::Size)
            .unwrap();
        assert_eq!(view.len(), 2);
        assert_eq!(source, SharedSource::Arena { offset: 0, len: 2 });
        assert_eq!(r.output_position(), 8);
        // the child did not consume any input of its own
        assert_eq!(r.positions()[0], 3);
    }

    #[test]
    fn test_forward_parent_rejected() {
        let region = region();
        let mut r = PackedReader::new(&region, SizingVisitor::new());
        let mut cx = DecodeContext::new(Version::CURRENT);
        cx.shared = SharedTable::with_len(3);
        let err = cx
            .shared_array::<_, u32>(&mut r, 1, 2, SharedField::Verts, Lane::Word, 1, Traversal::Size)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSharedMesh { mesh: 1, parent: 2 }));

        let err = cx
            .shared_array::<_, u32>(&mut r, 1, 0, SharedField::Verts, Lane::Word, 1, Traversal::Size)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSharedMesh { mesh: 1, parent: 0 }));
    }

    #[test]
    fn test_child_longer_than_parent_rejected() {
        let region = region();
        let mut r = PackedReader::new(&region, SizingVisitor::new());
        let mut cx = DecodeContext::new(Version::CURRENT);
        cx.shared = SharedTable::with_len(2);

        let (_, source) = cx
            .shared_array::<_, u32>(&mut r, 0, -1, SharedField::Verts, Lane::Word, 2, Traversal::Size)
            .unwrap();
        let mut entry = SharedEntry::default();
        entry.set(SharedField::Verts, source);
        cx.shared.record(0, entry).unwrap();

        let err = cx
            .shared_array::<_, u32>(&mut r, 1, 0, SharedField::Verts, Lane::Word, 3, Traversal::Size)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSharedMesh { mesh: 1, parent: 0 }));

        let (view, _) = cx
            .shared_array::<_, u32>(&mut r, 1, 0, SharedField::Verts, Lane::Word, 2, Traversal::Size)
            .unwrap();
        assert_eq!((view.offset(), view.len()), (0, 2));
    }
}
