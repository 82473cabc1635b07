//! Animation sequence records stored after the packed region.

use std::io::{Read, Write};

use super::IntegerSet;
use crate::packed::{IStream, OStream, Version};
use crate::util::Result;

/// Sequence flag bits.
pub mod flags {
    pub const UNIFORM_SCALE: u32 = 0x0001;
    pub const ALIGNED_SCALE: u32 = 0x0002;
    pub const ARBITRARY_SCALE: u32 = 0x0004;
    pub const BLEND: u32 = 0x0008;
    pub const CYCLIC: u32 = 0x0010;
    pub const MAKE_PATH: u32 = 0x0020;
    pub const HAS_TRANSLUCENCY: u32 = 0x0040;
    pub const ANY_SCALE: u32 = UNIFORM_SCALE | ALIGNED_SCALE | ARBITRARY_SCALE;
}

/// One animation: offsets into the shape's track tables plus the sets of
/// nodes and objects it animates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sequence {
    pub name_index: i32,
    pub flags: u32,
    pub num_keyframes: i32,
    pub duration: f32,
    pub priority: i32,
    pub first_ground_frame: i32,
    pub num_ground_frames: i32,
    pub base_rotation: i32,
    pub base_translation: i32,
    pub base_scale: i32,
    pub base_object_state: i32,
    /// Deprecated, kept for round trips.
    pub base_decal_state: i32,
    pub first_trigger: i32,
    pub num_triggers: i32,
    pub tool_begin: f32,

    /// Nodes with rotation tracks.
    pub rotation_matters: IntegerSet,
    /// Nodes with translation tracks.
    pub translation_matters: IntegerSet,
    /// Nodes with scale tracks.
    pub scale_matters: IntegerSet,
    /// Objects with visibility tracks.
    pub vis_matters: IntegerSet,
    /// Objects with frame tracks.
    pub frame_matters: IntegerSet,
    /// Objects with material frame tracks.
    pub mat_frame_matters: IntegerSet,
}

impl Sequence {
    #[inline]
    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    pub fn is_cyclic(&self) -> bool {
        self.has_flag(flags::CYCLIC)
    }

    pub fn is_blend(&self) -> bool {
        self.has_flag(flags::BLEND)
    }

    /// Read one sequence record laid out for `version`.
    pub fn read<R: Read>(is: &mut IStream<R>, version: Version) -> Result<Self> {
        let mut seq = Self { name_index: is.read_i32("sequence name")?, ..Default::default() };
        if version.has_sequence_flags() {
            seq.flags = is.read_u32("sequence flags")?;
        }
        seq.num_keyframes = is.read_i32("sequence keyframes")?;
        seq.duration = is.read_f32("sequence duration")?;

        if !version.has_sequence_flags() {
            for flag in [flags::BLEND, flags::CYCLIC, flags::MAKE_PATH] {
                if is.read_bool("sequence flag")? {
                    seq.flags |= flag;
                }
            }
        }

        seq.priority = is.read_i32("sequence priority")?;
        seq.first_ground_frame = is.read_i32("first ground frame")?;
        seq.num_ground_frames = is.read_i32("ground frame count")?;
        if version.has_scale_tracks() {
            seq.base_rotation = is.read_i32("base rotation")?;
            seq.base_translation = is.read_i32("base translation")?;
            seq.base_scale = is.read_i32("base scale")?;
        } else {
            seq.base_rotation = is.read_i32("base rotation")?;
            seq.base_translation = seq.base_rotation;
        }
        seq.base_object_state = is.read_i32("base object state")?;
        seq.base_decal_state = is.read_i32("base decal state")?;
        seq.first_trigger = is.read_i32("first trigger")?;
        seq.num_triggers = is.read_i32("trigger count")?;
        seq.tool_begin = is.read_f32("tool begin")?;

        seq.rotation_matters = IntegerSet::read(is)?;
        if version.has_scale_tracks() {
            seq.translation_matters = IntegerSet::read(is)?;
            seq.scale_matters = IntegerSet::read(is)?;
        } else {
            seq.translation_matters = seq.rotation_matters;
        }

        // decal and IFL membership, no longer used
        IntegerSet::read(is)?;
        IntegerSet::read(is)?;

        seq.vis_matters = IntegerSet::read(is)?;
        seq.frame_matters = IntegerSet::read(is)?;
        seq.mat_frame_matters = IntegerSet::read(is)?;
        Ok(seq)
    }

    /// Write the record in the current layout.
    pub fn write<W: Write>(&self, os: &mut OStream<W>) -> Result<()> {
        os.write_i32(self.name_index)?;
        os.write_u32(self.flags)?;
        os.write_i32(self.num_keyframes)?;
        os.write_f32(self.duration)?;
        os.write_i32(self.priority)?;
        os.write_i32(self.first_ground_frame)?;
        os.write_i32(self.num_ground_frames)?;
        os.write_i32(self.base_rotation)?;
        os.write_i32(self.base_translation)?;
        os.write_i32(self.base_scale)?;
        os.write_i32(self.base_object_state)?;
        os.write_i32(self.base_decal_state)?;
        os.write_i32(self.first_trigger)?;
        os.write_i32(self.num_triggers)?;
        os.write_f32(self.tool_begin)?;

        self.rotation_matters.write(os)?;
        self.translation_matters.write(os)?;
        self.scale_matters.write(os)?;
        IntegerSet::new().write(os)?;
        IntegerSet::new().write(os)?;
        self.vis_matters.write(os)?;
        self.frame_matters.write(os)?;
        self.mat_frame_matters.write(os)
    }
}
