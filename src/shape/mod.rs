//! The decoded shape: skeleton, objects, detail levels, meshes, sequences and
//! materials.
//!
//! Decoding reads the packed region twice (see [`crate::packed::reader`]) and
//! leaves most array fields as views into one [`Arena`] owned by the
//! [`Model`]. Editing helpers detach the arrays they touch with
//! [`Arena::make_mut`], so decoded and hand-built models mix freely.
//!
//! ```ignore
//! use dts::Model;
//!
//! let model = Model::open("player.dts")?;
//! for (i, node) in model.nodes()?.iter().enumerate() {
//!     println!("{i}: {}", model.name(node.name_index).unwrap_or("?"));
//! }
//! model.save("player_copy.dts")?;
//! ```

mod codec;
pub mod fit;
pub mod integer_set;
mod lookup;
pub mod sequence;

pub use fit::{Fit, FitBox, FitCapsule, FitHull, FitKind, FitSphere, PrimitiveFitter};
pub use integer_set::{IntegerSet, MAX_SET_SIZE, MAX_SET_WORDS};
pub use sequence::Sequence;

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use bytemuck::{Pod, Zeroable};
use memmap2::Mmap;
use tracing::debug;

use crate::material::MaterialList;
use crate::mesh::Mesh;
use crate::packed::{
    Arena, Array, CheckpointPolicy, IStream, OStream, PackedRegion, RegionLayout, Version,
    CURRENT_VERSION, MOST_RECENT_EXPORTER_VERSION,
};
use crate::util::{Box3F, Error, Quat16, Result, Vec3};

/// A bone of the skeleton.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Node {
    pub name_index: i32,
    pub parent_index: i32,
    pub first_object: i32,
    pub first_child: i32,
    pub next_sibling: i32,
}

impl Node {
    pub fn new(name_index: i32, parent_index: i32) -> Self {
        Self { name_index, parent_index, first_object: -1, first_child: -1, next_sibling: -1 }
    }
}

/// A renderable item: one mesh slot per detail level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Object {
    pub name_index: i32,
    pub num_meshes: i32,
    pub start_mesh_index: i32,
    /// Owning node, -1 for skinned objects.
    pub node_index: i32,
    pub next_sibling: i32,
    /// Deprecated.
    pub first_decal: i32,
}

impl Object {
    /// Mesh list indices covered by this object.
    pub fn mesh_range(&self) -> std::ops::Range<usize> {
        let start = self.start_mesh_index.max(0) as usize;
        start..start + self.num_meshes.max(0) as usize
    }
}

/// Animatable state of an object.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct ObjectState {
    pub vis: f32,
    pub frame_index: i32,
    pub mat_frame_index: i32,
}

/// A timed event inside a sequence.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Trigger {
    pub state: u32,
    pub pos: f32,
}

impl Trigger {
    pub const STATE_ON: u32 = 0x8000_0000;
    pub const INVERT_ON_REVERSE: u32 = 0x4000_0000;
    pub const STATE_MASK: u32 = 0x3fff_ffff;

    pub fn is_on(&self) -> bool {
        self.state & Self::STATE_ON != 0
    }

    /// The trigger number, without the state bits.
    pub fn number(&self) -> u32 {
        self.state & Self::STATE_MASK
    }
}

/// One level of detail.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Detail {
    pub name_index: i32,
    /// Sub-shape drawn at this level, negative for all of them.
    pub sub_shape_num: i32,
    pub object_detail_num: i32,
    pub size: f32,
    pub average_error: f32,
    pub max_error: f32,
    pub poly_count: i32,
}

impl Detail {
    /// Error metrics above this are treated as garbage.
    pub const MAX_SANE_ERROR: f32 = 10000.0;

    /// Reset error metrics that some exporters fill with garbage.
    ///
    /// Returns true when the detail was changed.
    pub fn sanitize(&mut self) -> bool {
        let bad = |e: f32| e == 0.0 || e > Self::MAX_SANE_ERROR;
        if !bad(self.average_error) && !bad(self.max_error) {
            return false;
        }
        self.average_error = -1.0;
        self.max_error = -1.0;
        true
    }
}

/// Decode settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Drop this many of the finest detail levels of every object.
    pub skip_details: usize,
    /// How closely the copying pass is checked against the sizing pass.
    pub checkpoints: CheckpointPolicy,
}

/// A decoded or hand-built shape.
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    /// Version the model was decoded from, `None` when built in memory.
    pub read_version: Option<Version>,
    pub exporter_version: u32,

    pub nodes: Array<Node>,
    pub objects: Array<Object>,
    pub object_states: Array<ObjectState>,
    pub sub_shape_first_node: Array<i32>,
    pub sub_shape_first_object: Array<i32>,
    pub sub_shape_num_nodes: Array<i32>,
    pub sub_shape_num_objects: Array<i32>,
    /// Sorted by descending size.
    pub details: Array<Detail>,
    pub default_rotations: Array<Quat16>,
    pub default_translations: Array<Vec3>,

    pub node_rotations: Vec<Quat16>,
    pub node_translations: Vec<Vec3>,
    pub node_uniform_scales: Vec<f32>,
    pub node_aligned_scales: Vec<Vec3>,
    pub node_arbitrary_scale_rots: Vec<Quat16>,
    pub node_arbitrary_scale_factors: Vec<Vec3>,
    pub ground_rotations: Vec<Quat16>,
    pub ground_translations: Vec<Vec3>,
    pub triggers: Vec<Trigger>,

    /// One slot per mesh index; `None` for empty, dropped or legacy slots.
    pub meshes: Vec<Option<Mesh>>,
    pub names: Vec<String>,
    pub sequences: Vec<Sequence>,
    pub materials: MaterialList,

    pub radius: f32,
    pub tube_radius: f32,
    pub center: Vec3,
    pub bounds: Box3F,
    pub smallest_visible_size: f32,
    pub smallest_visible_dl: i32,

    arena: Arena,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            read_version: None,
            exporter_version: MOST_RECENT_EXPORTER_VERSION,
            nodes: Array::default(),
            objects: Array::default(),
            object_states: Array::default(),
            sub_shape_first_node: Array::default(),
            sub_shape_first_object: Array::default(),
            sub_shape_num_nodes: Array::default(),
            sub_shape_num_objects: Array::default(),
            details: Array::default(),
            default_rotations: Array::default(),
            default_translations: Array::default(),
            node_rotations: Vec::new(),
            node_translations: Vec::new(),
            node_uniform_scales: Vec::new(),
            node_aligned_scales: Vec::new(),
            node_arbitrary_scale_rots: Vec::new(),
            node_arbitrary_scale_factors: Vec::new(),
            ground_rotations: Vec::new(),
            ground_translations: Vec::new(),
            triggers: Vec::new(),
            meshes: Vec::new(),
            names: Vec::new(),
            sequences: Vec::new(),
            materials: MaterialList::default(),
            radius: 0.0,
            tube_radius: 0.0,
            center: Vec3::ZERO,
            bounds: Box3F::ZERO,
            smallest_visible_size: f32::MAX,
            smallest_visible_dl: -1,
            arena: Arena::default(),
        }
    }
}

impl Model {
    /// An empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// The backing allocation every view-based field points into.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Resolve any array field of this model or of its meshes.
    pub fn resolve<'a, T: Pod>(&'a self, array: &'a Array<T>) -> Result<Cow<'a, [T]>> {
        self.arena.resolve(array)
    }

    pub fn nodes(&self) -> Result<Cow<'_, [Node]>> {
        self.arena.resolve(&self.nodes)
    }

    pub fn objects(&self) -> Result<Cow<'_, [Object]>> {
        self.arena.resolve(&self.objects)
    }

    pub fn object_states(&self) -> Result<Cow<'_, [ObjectState]>> {
        self.arena.resolve(&self.object_states)
    }

    pub fn details(&self) -> Result<Cow<'_, [Detail]>> {
        self.arena.resolve(&self.details)
    }

    pub fn default_rotations(&self) -> Result<Cow<'_, [Quat16]>> {
        self.arena.resolve(&self.default_rotations)
    }

    pub fn default_translations(&self) -> Result<Cow<'_, [Vec3]>> {
        self.arena.resolve(&self.default_translations)
    }

    /// Number of sub-shapes.
    pub fn num_sub_shapes(&self) -> usize {
        self.sub_shape_first_node.len()
    }

    /// Name at `index`, if any.
    pub fn name(&self, index: i32) -> Option<&str> {
        usize::try_from(index).ok().and_then(|i| self.names.get(i)).map(String::as_str)
    }

    /// Decode a shape from bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::read_with(bytes, &DecodeOptions::default())
    }

    pub fn decode_with(bytes: &[u8], options: &DecodeOptions) -> Result<Self> {
        Self::read_with(bytes, options)
    }

    /// Decode a shape from any reader.
    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        Self::read_with(reader, &DecodeOptions::default())
    }

    #[tracing::instrument(skip_all)]
    pub fn read_with<R: Read>(reader: R, options: &DecodeOptions) -> Result<Self> {
        let mut is = IStream::new(reader);

        let (version, exporter_version) = Version::split(is.read_u32("version")?);
        let version = Version::checked(version)?;
        let layout = RegionLayout {
            total_words: is.read_u32("region size")?,
            start16: is.read_u32("16-bit region start")?,
            start8: is.read_u32("8-bit region start")?,
        };
        layout.validate()?;
        debug!(version = version.0, exporter_version, words = layout.total_words, "header");

        let data = is.read_bytes("packed region", layout.byte_len())?;
        let region = PackedRegion::from_file(&data, &layout)?;
        drop(data);

        let num_sequences = is.read_i32("sequence count")?;
        let num_sequences = usize::try_from(num_sequences)
            .map_err(|_| Error::invalid(format!("negative sequence count: {num_sequences}")))?;
        let mut sequences = Vec::new();
        for _ in 0..num_sequences {
            sequences.push(Sequence::read(&mut is, version)?);
        }
        let materials = MaterialList::read(&mut is, version)?;

        let mut model = codec::assemble(&region, version, options)?;
        model.read_version = Some(version);
        model.exporter_version = exporter_version;
        model.sequences = sequences;
        model.materials = materials;
        debug!(
            nodes = model.nodes.len(),
            objects = model.objects.len(),
            meshes = model.meshes.len(),
            sequences = model.sequences.len(),
            materials = model.materials.len(),
            arena = model.arena.len(),
            "decoded shape"
        );
        Ok(model)
    }

    /// Memory-map and decode a file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, &DecodeOptions::default())
    }

    pub fn open_with(path: impl AsRef<Path>, options: &DecodeOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
            _ => Error::Io(e),
        })?;
        // SAFETY: the map is only read while decoding and dropped before returning.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::MmapFailed(e.to_string()))?;
        Self::read_with(&mmap[..], options)
    }

    /// Encode in the current format version.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    #[tracing::instrument(skip_all)]
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let region = codec::disassemble(self)?;
        let (layout, bytes) = region.to_file();

        let mut os = OStream::new(writer);
        os.write_u32(CURRENT_VERSION | (self.exporter_version << 16))?;
        os.write_u32(layout.total_words)?;
        os.write_u32(layout.start16)?;
        os.write_u32(layout.start8)?;
        os.write_bytes(&bytes)?;

        os.write_i32(self.sequences.len() as i32)?;
        for seq in &self.sequences {
            seq.write(&mut os)?;
        }
        self.materials.write(&mut os)?;
        os.flush()?;
        debug!(words = layout.total_words, bytes = os.pos(), "encoded shape");
        Ok(())
    }

    /// Encode to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        self.write_to(BufWriter::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sizes() {
        assert_eq!(std::mem::size_of::<Node>(), 20);
        assert_eq!(std::mem::size_of::<Object>(), 24);
        assert_eq!(std::mem::size_of::<ObjectState>(), 12);
        assert_eq!(std::mem::size_of::<Trigger>(), 8);
        assert_eq!(std::mem::size_of::<Detail>(), 28);
    }

    #[test]
    fn test_detail_sanitize() {
        let mut d = Detail { size: 2.0, average_error: 0.5, max_error: 1.0, ..Zeroable::zeroed() };
        assert!(!d.sanitize());
        d.max_error = 20000.0;
        assert!(d.sanitize());
        assert_eq!((d.average_error, d.max_error), (-1.0, -1.0));
        // already reset values stay put
        assert!(!d.sanitize());

        let mut d = Detail { average_error: 0.0, max_error: 1.0, ..Zeroable::zeroed() };
        assert!(d.sanitize());
    }

    #[test]
    fn test_trigger_bits() {
        let t = Trigger { state: Trigger::STATE_ON | 3, pos: 0.5 };
        assert!(t.is_on());
        assert_eq!(t.number(), 3);
    }

    #[test]
    fn test_object_mesh_range() {
        let o = Object { start_mesh_index: 2, num_meshes: 3, ..Zeroable::zeroed() };
        assert_eq!(o.mesh_range(), 2..5);
    }

    #[test]
    fn test_missing_file() {
        let err = Model::open("/nonexistent/shape.dts").unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }
}
