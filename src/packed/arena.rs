//! The single backing allocation produced by a decode, and typed views into it.
//!
//! A decoded shape keeps most of its arrays inside one [`Arena`]. Each array
//! field is an [`Array`], which is either an [`ArrayView`] (an offset/length
//! pair into the arena) or an owned `Vec` for data built or edited after the
//! decode. Views are resolved through [`Arena::resolve`].

use std::borrow::Cow;
use std::marker::PhantomData;
use std::ops::Range;

use bytemuck::Pod;

use crate::util::{Error, Result};

/// Typed `(offset, length)` descriptor into an [`Arena`].
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ArrayView<T> {
    offset: usize,
    len: usize,
    _elem: PhantomData<fn() -> T>,
}

impl<T> Clone for ArrayView<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArrayView<T> {}

impl<T> ArrayView<T> {
    /// Create a view of `len` elements starting `offset` bytes into the arena.
    #[inline]
    pub const fn new(offset: usize, len: usize) -> Self {
        Self { offset, len, _elem: PhantomData }
    }

    /// Byte offset of the first element.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Byte range covered by the view.
    #[inline]
    pub fn byte_range(&self) -> Range<usize> {
        self.offset..self.offset + self.len * std::mem::size_of::<T>()
    }
}

/// An array field: a view into the shape's arena or owned storage.
#[derive(Clone, Debug, PartialEq)]
pub enum Array<T> {
    View(ArrayView<T>),
    Owned(Vec<T>),
}

impl<T> Array<T> {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::View(v) => v.len(),
            Self::Owned(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when the data lives in the arena.
    pub fn is_view(&self) -> bool {
        matches!(self, Self::View(_))
    }
}

impl<T> Default for Array<T> {
    fn default() -> Self {
        Self::Owned(Vec::new())
    }
}

impl<T> From<Vec<T>> for Array<T> {
    fn from(v: Vec<T>) -> Self {
        Self::Owned(v)
    }
}

/// One contiguous, 4-byte aligned backing allocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Arena {
    words: Vec<u32>,
    len: usize,
}

impl Arena {
    /// A zero-filled arena of exactly `len` bytes.
    pub fn zeroed(len: usize) -> Self {
        Self { words: vec![0; len.div_ceil(4)], len }
    }

    /// Size in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The arena contents.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<u32, u8>(&self.words)[..self.len]
    }

    #[inline]
    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        let len = self.len;
        &mut bytemuck::cast_slice_mut::<u32, u8>(&mut self.words)[..len]
    }

    /// Borrow the elements of a view.
    ///
    /// The arena follows the file's packing, so a view placed after byte-sized
    /// data may be unaligned for `T`; such views are copied out instead.
    pub fn view<T: Pod>(&self, view: &ArrayView<T>) -> Result<Cow<'_, [T]>> {
        let range = view.byte_range();
        let bytes = self.bytes().get(range.clone()).ok_or(Error::IndexOutOfBounds {
            index: range.end,
            count: self.len,
        })?;
        Ok(match bytemuck::try_cast_slice(bytes) {
            Ok(slice) => Cow::Borrowed(slice),
            Err(_) => Cow::Owned(bytemuck::pod_collect_to_vec(bytes)),
        })
    }

    /// Resolve an array field to its elements.
    pub fn resolve<'a, T: Pod>(&'a self, array: &'a Array<T>) -> Result<Cow<'a, [T]>> {
        match array {
            Array::View(v) => self.view(v),
            Array::Owned(v) => Ok(Cow::Borrowed(v.as_slice())),
        }
    }

    /// Detach an array from the arena so it can be edited.
    pub fn make_mut<'a, T: Pod>(&self, array: &'a mut Array<T>) -> Result<&'a mut Vec<T>> {
        if let Array::View(view) = *array {
            let owned = self.view(&view)?.into_owned();
            *array = Array::Owned(owned);
        }
        match array {
            Array::Owned(values) => Ok(values),
            Array::View(_) => Err(Error::invalid("array is still a view")),
        }
    }

    /// Overwrite the elements of a view in place.
    pub fn write<T: Pod>(&mut self, view: &ArrayView<T>, values: &[T]) -> Result<()> {
        let range = view.byte_range();
        let src: &[u8] = bytemuck::cast_slice(values);
        if src.len() != range.len() {
            return Err(Error::IndexOutOfBounds { index: values.len(), count: view.len() });
        }
        let count = self.len;
        let dst = self
            .bytes_mut()
            .get_mut(range.clone())
            .ok_or(Error::IndexOutOfBounds { index: range.end, count })?;
        dst.copy_from_slice(src);
        Ok(())
    }
}
