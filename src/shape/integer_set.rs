//! Fixed-capacity bit set used for sequence membership.

use std::fmt;
use std::io::{Read, Write};

use crate::packed::{IStream, OStream};
use crate::util::{Error, Result};

/// Fixed capacity of an [`IntegerSet`] in bits.
pub const MAX_SET_SIZE: usize = 2048;

/// Capacity in 32-bit words.
pub const MAX_SET_WORDS: usize = MAX_SET_SIZE / 32;

/// Ordered set of small integers (node or object indices).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntegerSet {
    bits: [u32; MAX_SET_WORDS],
}

impl Default for IntegerSet {
    fn default() -> Self {
        Self { bits: [0; MAX_SET_WORDS] }
    }
}

impl IntegerSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(index: usize) -> Result<()> {
        if index >= MAX_SET_SIZE {
            return Err(Error::IndexOutOfBounds { index, count: MAX_SET_SIZE });
        }
        Ok(())
    }

    /// True when `index` is a member. Out-of-range indices are never members.
    #[inline]
    pub fn test(&self, index: usize) -> bool {
        index < MAX_SET_SIZE && self.bits[index >> 5] & (1 << (index & 31)) != 0
    }

    pub fn set(&mut self, index: usize) -> Result<()> {
        Self::check(index)?;
        self.bits[index >> 5] |= 1 << (index & 31);
        Ok(())
    }

    pub fn clear(&mut self, index: usize) -> Result<()> {
        Self::check(index)?;
        self.bits[index >> 5] &= !(1 << (index & 31));
        Ok(())
    }

    /// Clear every bit below `upto`.
    pub fn clear_all(&mut self, upto: usize) {
        let upto = upto.min(MAX_SET_SIZE);
        let whole = upto >> 5;
        self.bits[..whole].fill(0);
        if upto & 31 != 0 {
            self.bits[whole] &= !((1u32 << (upto & 31)) - 1);
        }
    }

    /// Shift every bit at `index` and above up by one, then store `value` at `index`.
    ///
    /// The highest bit of the set falls off the end.
    pub fn insert(&mut self, index: usize, value: bool) -> Result<()> {
        Self::check(index)?;
        let word = index >> 5;
        for i in (word + 1..MAX_SET_WORDS).rev() {
            self.bits[i] = (self.bits[i] << 1) | (self.bits[i - 1] >> 31);
        }

        let bit = 1u32 << (index & 31);
        let low = bit - 1;
        let high = !(low | bit);
        let w = self.bits[word];
        self.bits[word] = ((w << 1) & high) | (w & low);

        if value {
            self.bits[word] |= bit;
        }
        Ok(())
    }

    /// One past the highest member, or 0 for an empty set.
    pub fn highest_set_plus_one(&self) -> usize {
        self.bits
            .iter()
            .rposition(|&w| w != 0)
            .map_or(0, |i| i * 32 + 32 - self.bits[i].leading_zeros() as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&w| w == 0)
    }

    /// Number of members.
    pub fn count(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.highest_set_plus_one()).filter(|&i| self.test(i))
    }

    /// Number of words needed to hold every member.
    fn used_words(&self) -> usize {
        self.bits.iter().rposition(|&w| w != 0).map_or(0, |i| i + 1)
    }

    /// Read a set: a legacy count, the word count, then the words.
    pub fn read<R: Read>(is: &mut IStream<R>) -> Result<Self> {
        let _legacy = is.read_i32("integer set count")?;
        let words = is.read_i32("integer set size")?;
        let words = usize::try_from(words)
            .ok()
            .filter(|&n| n <= MAX_SET_WORDS)
            .ok_or_else(|| Error::invalid(format!("integer set holds {words} words")))?;

        let mut set = Self::default();
        for w in &mut set.bits[..words] {
            *w = is.read_u32("integer set word")?;
        }
        Ok(set)
    }

    /// Write only the words up to the highest non-zero one.
    pub fn write<W: Write>(&self, os: &mut OStream<W>) -> Result<()> {
        os.write_i32(0)?;
        let words = self.used_words();
        os.write_i32(words as i32)?;
        for &w in &self.bits[..words] {
            os.write_u32(w)?;
        }
        Ok(())
    }
}

impl fmt::Debug for IntegerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<usize> for IntegerSet {
    /// Indices past the capacity are ignored.
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = Self::default();
        for i in iter {
            let _ = set.set(i);
        }
        set
    }
}
