//! DTS format constants, version gates and the packed region split.

use crate::util::{halves_from_file, halves_to_file, words_from_file, words_to_file, Error, Result};

/// Most recent format version; the one we write.
pub const CURRENT_VERSION: u32 = 24;

/// Oldest format version we can read.
pub const MIN_VERSION: u32 = 19;

/// Exporter version stamped into freshly built shapes.
pub const MOST_RECENT_EXPORTER_VERSION: u32 = 124;

/// Format version read once per decode and consulted by every gated field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(pub u32);

impl Version {
    /// The version written by the encoder.
    pub const CURRENT: Self = Self(CURRENT_VERSION);

    /// Split the leading header word into (format version, exporter version).
    #[inline]
    pub const fn split(word: u32) -> (u32, u32) {
        (word & 0xff, word >> 16)
    }

    /// Validate a format version against the accepted range.
    pub fn checked(version: u32) -> Result<Self> {
        if !(MIN_VERSION..=CURRENT_VERSION).contains(&version) {
            return Err(Error::UnsupportedVersion(version));
        }
        Ok(Self(version))
    }

    /// Five independent track counts instead of one combined rot/trans count.
    #[inline]
    pub fn has_split_track_counts(self) -> bool {
        self.0 >= 22
    }

    /// Scale tracks section and scale membership sets.
    #[inline]
    pub fn has_scale_tracks(self) -> bool {
        self.0 > 21
    }

    /// Codebook-compressed normals stored next to the raw normals.
    #[inline]
    pub fn has_encoded_normals(self) -> bool {
        self.0 > 21
    }

    /// Sequence flags word (older files store three booleans).
    #[inline]
    pub fn has_sequence_flags(self) -> bool {
        self.0 > 21
    }

    /// Skin meshes kept in their own list after the name table.
    #[inline]
    pub fn has_separate_skins(self) -> bool {
        self.0 < 23
    }

    /// Ground-frame count and tracks.
    #[inline]
    pub fn has_ground_frames(self) -> bool {
        self.0 > 23
    }

    /// Per-material reflection amounts.
    #[inline]
    pub fn has_reflection_amounts(self) -> bool {
        self.0 > 20
    }

    /// Decal meshes still embed an empty mesh header.
    #[inline]
    pub fn has_embedded_decal_header(self) -> bool {
        self.0 < 20
    }
}

/// Sizes, in 32-bit words, describing how the packed region splits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegionLayout {
    pub total_words: u32,
    pub start16: u32,
    pub start8: u32,
}

impl RegionLayout {
    /// Check that the offsets nest inside the region.
    pub fn validate(&self) -> Result<()> {
        if self.start16 > self.start8 || self.start8 > self.total_words {
            return Err(Error::invalid(format!(
                "packed region offsets out of order: 16-bit at {}, 8-bit at {}, total {}",
                self.start16, self.start8, self.total_words
            )));
        }
        Ok(())
    }

    /// Byte length of the whole packed region.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.total_words as usize * 4
    }
}

/// The three typed lanes of the packed region, in host order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackedRegion {
    pub words: Vec<u32>,
    pub halves: Vec<u16>,
    pub bytes: Vec<u8>,
}

impl PackedRegion {
    /// Split and endian-normalize a region read from a file.
    pub fn from_file(data: &[u8], layout: &RegionLayout) -> Result<Self> {
        layout.validate()?;
        if data.len() < layout.byte_len() {
            return Err(Error::truncated("packed region", data.len() as u64));
        }
        let at16 = layout.start16 as usize * 4;
        let at8 = layout.start8 as usize * 4;
        let end = layout.byte_len();
        Ok(Self {
            words: words_from_file(&data[..at16]),
            halves: halves_from_file(&data[at16..at8]),
            bytes: data[at8..end].to_vec(),
        })
    }

    /// Join the lanes back into file order, padding each to whole words.
    pub fn to_file(&self) -> (RegionLayout, Vec<u8>) {
        let size32 = self.words.len();
        let size16 = self.halves.len().div_ceil(2);
        let size8 = self.bytes.len().div_ceil(4);

        let layout = RegionLayout {
            total_words: (size32 + size16 + size8) as u32,
            start16: size32 as u32,
            start8: (size32 + size16) as u32,
        };

        let mut out = Vec::with_capacity(layout.byte_len());
        words_to_file(&self.words, &mut out);
        halves_to_file(&self.halves, &mut out);
        out.resize((size32 + size16) * 4, 0);
        out.extend_from_slice(&self.bytes);
        out.resize(layout.byte_len(), 0);
        (layout, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_range() {
        assert!(matches!(Version::checked(18), Err(Error::UnsupportedVersion(18))));
        assert!(matches!(Version::checked(25), Err(Error::UnsupportedVersion(25))));
        for v in 19..=24 {
            assert_eq!(Version::checked(v).unwrap(), Version(v));
        }
    }

    #[test]
    fn test_split_version_word() {
        let word = CURRENT_VERSION | (MOST_RECENT_EXPORTER_VERSION << 16);
        assert_eq!(Version::split(word), (24, 124));
    }

    #[test]
    fn test_gates() {
        assert!(!Version(21).has_split_track_counts());
        assert!(Version(22).has_split_track_counts());
        assert!(Version(22).has_separate_skins());
        assert!(!Version(23).has_separate_skins());
        assert!(!Version(23).has_ground_frames());
        assert!(Version(24).has_ground_frames());
        assert!(!Version(20).has_reflection_amounts());
        assert!(Version(19).has_embedded_decal_header());
    }

    #[test]
    fn test_region_padding() {
        let region = PackedRegion {
            words: vec![7, 8],
            halves: vec![1, 2, 3],
            bytes: vec![9; 5],
        };
        let (layout, bytes) = region.to_file();
        assert_eq!(layout, RegionLayout { total_words: 6, start16: 2, start8: 4 });
        assert_eq!(bytes.len(), 24);

        let back = PackedRegion::from_file(&bytes, &layout).unwrap();
        assert_eq!(back.words, vec![7, 8]);
        assert_eq!(back.halves, vec![1, 2, 3, 0]);
        assert_eq!(&back.bytes[..5], &[9; 5]);
        assert_eq!(&back.bytes[5..], &[0; 3]);
    }

    #[test]
    fn test_region_offsets_validated() {
        let layout = RegionLayout { total_words: 2, start16: 3, start8: 1 };
        assert!(PackedRegion::from_file(&[0; 8], &layout).is_err());
    }
}
