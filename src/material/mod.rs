//! Material list stored after the sequences.
//!
//! The list is framed separately from the packed region and carries its own
//! one-byte version. Names come first, then one array per attribute.
//!
//! ```ignore
//! use dts::material::{Material, MaterialList};
//!
//! let mut list = MaterialList::default();
//! list.push(Material::new("base.png"));
//! for m in list.iter() {
//!     println!("{} flags={:#x}", m.name, m.flags);
//! }
//! ```

use std::io::{Read, Write};

use tracing::warn;

use crate::packed::{IStream, OStream, Version};
use crate::util::{Error, Result};

/// Binary version of the material list.
pub const MATERIAL_LIST_VERSION: u8 = 1;

/// Material flag bits.
pub mod flags {
    pub const S_WRAP: u32 = 0x0001;
    pub const T_WRAP: u32 = 0x0002;
    pub const TRANSLUCENT: u32 = 0x0004;
    pub const ADDITIVE: u32 = 0x0008;
    pub const SUBTRACTIVE: u32 = 0x0010;
    pub const SELF_ILLUMINATING: u32 = 0x0020;
    pub const NEVER_ENV_MAP: u32 = 0x0040;
    pub const NO_MIP_MAP: u32 = 0x0080;
    pub const MIP_MAP_ZERO_BORDER: u32 = 0x0100;
    /// Deprecated; still found in old files.
    pub const AUXILIARY_MAP: u32 = 0x0800_0000 | 0xf000_0000;
}

/// One material record.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    /// Texture name without any directory prefix.
    pub name: String,
    pub flags: u32,
    pub reflectance_map: u32,
    pub bump_map: u32,
    pub detail_map: u32,
    pub detail_scale: f32,
    pub reflection_amount: f32,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: 0,
            reflectance_map: 0,
            bump_map: 0,
            detail_map: 0,
            detail_scale: 1.0,
            reflection_amount: 1.0,
        }
    }

    #[inline]
    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }
}

/// Ordered list of materials referenced by draw primitives.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialList {
    materials: Vec<Material>,
}

impl MaterialList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Material> {
        self.materials.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Material> {
        self.materials.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Material> {
        self.materials.iter()
    }

    /// Append a material, returning its index.
    pub fn push(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Index of the material with the given name.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.materials.iter().position(|m| m.name == name)
    }

    /// Read a material list framed for format `version`.
    pub fn read<R: Read>(is: &mut IStream<R>, version: Version) -> Result<Self> {
        let found = is.read_u8("material list version")?;
        if found != MATERIAL_LIST_VERSION {
            return Err(Error::MaterialVersionMismatch { expected: MATERIAL_LIST_VERSION, found });
        }

        let count = is.read_u32("material count")? as usize;
        let mut materials = Vec::new();
        for index in 0..count {
            let raw = is.read_string("material name")?;
            if raw.is_empty() {
                return Err(Error::invalid(format!("material {index} has an empty name")));
            }
            materials.push(Material::new(material_name(&raw, index)));
        }

        for m in &mut materials {
            m.flags = is.read_u32("material flags")?;
        }
        for m in &mut materials {
            m.reflectance_map = is.read_u32("reflectance map")?;
        }
        for m in &mut materials {
            m.bump_map = is.read_u32("bump map")?;
        }
        for m in &mut materials {
            m.detail_map = is.read_u32("detail map")?;
        }
        for m in &mut materials {
            m.detail_scale = is.read_f32("detail scale")?;
        }
        if version.has_reflection_amounts() {
            for m in &mut materials {
                m.reflection_amount = is.read_f32("reflection amount")?;
            }
        }

        Ok(Self { materials })
    }

    /// Write the list in the current layout.
    pub fn write<W: Write>(&self, os: &mut OStream<W>) -> Result<()> {
        os.write_u8(MATERIAL_LIST_VERSION)?;
        os.write_u32(self.materials.len() as u32)?;
        for m in &self.materials {
            os.write_string(m.name.as_bytes())?;
        }
        for m in &self.materials {
            os.write_u32(m.flags)?;
        }
        for m in &self.materials {
            os.write_u32(m.reflectance_map)?;
        }
        for m in &self.materials {
            os.write_u32(m.bump_map)?;
        }
        for m in &self.materials {
            os.write_u32(m.detail_map)?;
        }
        for m in &self.materials {
            os.write_f32(m.detail_scale)?;
        }
        for m in &self.materials {
            os.write_f32(m.reflection_amount)?;
        }
        Ok(())
    }
}

impl FromIterator<Material> for MaterialList {
    fn from_iter<I: IntoIterator<Item = Material>>(iter: I) -> Self {
        Self { materials: iter.into_iter().collect() }
    }
}

impl<'a> IntoIterator for &'a MaterialList {
    type Item = &'a Material;
    type IntoIter = std::slice::Iter<'a, Material>;

    fn into_iter(self) -> Self::IntoIter {
        self.materials.iter()
    }
}

/// Keep only the component after the last path separator.
fn material_name(raw: &[u8], index: usize) -> String {
    let start = raw.iter().rposition(|&b| b == b'/' || b == b'\\').map_or(0, |i| i + 1);
    let tail = &raw[start..];
    match std::str::from_utf8(tail) {
        Ok(s) => s.to_owned(),
        Err(_) => {
            warn!(index, "material name is not valid UTF-8");
            String::from_utf8_lossy(tail).into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(list: &MaterialList) -> Vec<u8> {
        let mut os = OStream::new(Vec::new());
        list.write(&mut os).unwrap();
        os.into_inner()
    }

    #[test]
    fn test_round_trip() {
        let mut list = MaterialList::new();
        let mut m = Material::new("metal");
        m.flags = flags::S_WRAP | flags::T_WRAP;
        m.detail_scale = 0.5;
        m.reflection_amount = 0.25;
        list.push(m);
        list.push(Material::new("glass"));

        let bytes = encode(&list);
        let back = MaterialList::read(&mut IStream::new(bytes.as_slice()), Version::CURRENT).unwrap();
        assert_eq!(back, list);
        assert!(back.get(0).unwrap().has_flag(flags::T_WRAP));
        assert_eq!(back.find("glass"), Some(1));
    }

    #[test]
    fn test_empty_list_layout() {
        let bytes = encode(&MaterialList::new());
        assert_eq!(bytes, vec![MATERIAL_LIST_VERSION, 0, 0, 0, 0]);
    }

    #[test]
    fn test_paths_stripped() {
        let list: MaterialList =
            [Material::new("textures/stone/wall"), Material::new("c:\\art\\roof")].into_iter().collect();
        let bytes = encode(&list);
        let back = MaterialList::read(&mut IStream::new(bytes.as_slice()), Version::CURRENT).unwrap();
        let names: Vec<_> = back.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["wall", "roof"]);
    }

    #[test]
    fn test_old_versions_default_reflection() {
        let mut m = Material::new("a");
        m.reflection_amount = 0.5;
        let list: MaterialList = [m].into_iter().collect();
        let mut bytes = encode(&list);
        // v20 lists end after the detail scales
        bytes.truncate(bytes.len() - 4);
        let back = MaterialList::read(&mut IStream::new(bytes.as_slice()), Version(20)).unwrap();
        assert_eq!(back.get(0).unwrap().reflection_amount, 1.0);
    }

    #[test]
    fn test_version_mismatch() {
        let bytes = [2u8, 0, 0, 0, 0];
        let err = MaterialList::read(&mut IStream::new(&bytes[..]), Version::CURRENT).unwrap_err();
        assert!(matches!(err, Error::MaterialVersionMismatch { expected: 1, found: 2 }));
    }

    #[test]
    fn test_empty_name_rejected() {
        let bytes = [1u8, 1, 0, 0, 0, 0];
        let err = MaterialList::read(&mut IStream::new(&bytes[..]), Version::CURRENT).unwrap_err();
        assert!(matches!(err, Error::InvalidStructure(_)));
    }

    #[test]
    fn test_truncated_attributes() {
        let list: MaterialList = [Material::new("a")].into_iter().collect();
        let bytes = encode(&list);
        let err = MaterialList::read(&mut IStream::new(&bytes[..bytes.len() - 2]), Version::CURRENT).unwrap_err();
        assert!(matches!(err, Error::TruncatedStream { .. }));
    }
}
