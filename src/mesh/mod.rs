//! Mesh types: standard, skinned and depth-sorted meshes.
//!
//! Array fields are [`Array`]s: after a decode they are views into the
//! shape's arena, while meshes built in code own their data. Resolve them
//! with [`Arena::resolve`].

pub mod codec;
pub mod normals;
pub mod shared;

use bytemuck::{Pod, Zeroable};

use crate::packed::{Arena, Array};
use crate::util::{Box3F, Error, MatrixF, Result, Vec2, Vec3};

pub use normals::{decode_normal, encode_normal, encode_normals, NORMAL_TABLE};
pub use shared::{DecodeContext, SharedField, SharedSource, SharedTable};

/// Mesh type tags stored ahead of each mesh in the packed region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MeshType {
    Standard = 0,
    Skin = 1,
    Decal = 2,
    Sorted = 3,
    Null = 4,
}

impl MeshType {
    /// Bits of the flags word that carry the type.
    pub const TYPE_MASK: u32 = 0x7;

    pub fn from_tag(tag: u32) -> Result<Self> {
        Ok(match tag {
            0 => Self::Standard,
            1 => Self::Skin,
            2 => Self::Decal,
            3 => Self::Sorted,
            4 => Self::Null,
            other => return Err(Error::UnknownMeshType(other)),
        })
    }

    #[inline]
    pub fn tag(self) -> u32 {
        self as u32
    }
}

/// Element layout of a draw primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveKind {
    Triangles,
    Strip,
    Fan,
}

/// One draw call: a run of indices (or vertices) sharing a material.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct DrawPrimitive {
    pub start: u32,
    pub num_elements: u32,
    /// Material index in the low bits, element type and flags in the high bits.
    pub mat_index: u32,
}

impl DrawPrimitive {
    pub const TRIANGLES: u32 = 0 << 30;
    pub const STRIP: u32 = 1 << 30;
    pub const FAN: u32 = 2 << 30;
    pub const INDEXED: u32 = 0x2000_0000;
    pub const NO_MATERIAL: u32 = 0x1000_0000;
    pub const TYPE_MASK: u32 = Self::STRIP | Self::FAN | Self::TRIANGLES;
    pub const MATERIAL_MASK: u32 =
        !(Self::STRIP | Self::FAN | Self::TRIANGLES | Self::INDEXED | Self::NO_MATERIAL);

    pub fn new(start: u32, num_elements: u32, mat_index: u32) -> Self {
        Self { start, num_elements, mat_index }
    }

    pub fn kind(&self) -> PrimitiveKind {
        match self.mat_index & Self::TYPE_MASK {
            Self::STRIP => PrimitiveKind::Strip,
            Self::FAN => PrimitiveKind::Fan,
            _ => PrimitiveKind::Triangles,
        }
    }

    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.mat_index & Self::INDEXED != 0
    }

    /// Material index, or `None` when the primitive has no material.
    pub fn material(&self) -> Option<u32> {
        if self.mat_index & Self::NO_MATERIAL != 0 {
            None
        } else {
            Some(self.mat_index & Self::MATERIAL_MASK)
        }
    }
}

/// Fields shared by every mesh type.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshData {
    pub num_frames: i32,
    pub num_mat_frames: i32,
    /// Mesh whose vertex data this one reuses, or -1.
    pub parent_mesh: i32,
    pub bounds: Box3F,
    pub center: Vec3,
    pub radius: f32,
    /// Positions for every frame, `verts_per_frame` at a time.
    pub verts: Array<Vec3>,
    pub tverts: Array<Vec2>,
    pub norms: Array<Vec3>,
    /// Codebook indices, parallel to `norms`. Empty in pre-v22 files.
    pub encoded_norms: Array<u8>,
    pub primitives: Vec<DrawPrimitive>,
    pub indices: Vec<u32>,
    pub verts_per_frame: i32,
    /// Flags word as stored; may carry the type bits as well.
    pub flags: u32,
}

impl MeshData {
    pub const BILLBOARD: u32 = 0x8000_0000;
    pub const HAS_DETAIL_TEXTURE: u32 = 0x4000_0000;
    pub const BILLBOARD_Z_AXIS: u32 = 0x2000_0000;
    pub const USE_ENCODED_NORMALS: u32 = 0x1000_0000;
    pub const HAS_COLOR: u32 = 0x0800_0000;
    pub const HAS_TVERT2: u32 = 0x0400_0000;
    pub const FLAG_MASK: u32 = Self::BILLBOARD
        | Self::BILLBOARD_Z_AXIS
        | Self::HAS_DETAIL_TEXTURE
        | Self::USE_ENCODED_NORMALS
        | Self::HAS_COLOR
        | Self::HAS_TVERT2;

    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    pub fn set_flag(&mut self, flag: u32, on: bool) {
        if on {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }

    /// True when vertex data comes from another mesh.
    #[inline]
    pub fn is_shared(&self) -> bool {
        self.parent_mesh >= 0
    }

    pub fn num_verts(&self) -> usize {
        self.verts.len()
    }

    /// Bounds, center and radius over every frame, or over one frame.
    pub fn compute_bounds(&self, arena: &Arena, frame: Option<usize>) -> Result<(Box3F, Vec3, f32)> {
        let verts = arena.resolve(&self.verts)?;
        let verts: &[Vec3] = match frame {
            None => &verts[..],
            Some(frame) => {
                let per = self.verts_per_frame.max(0) as usize;
                let start = frame * per;
                verts.get(start..start + per).ok_or(Error::IndexOutOfBounds {
                    index: start + per,
                    count: verts.len(),
                })?
            }
        };
        Ok(bounds_of(verts))
    }

    /// Recompute and store `bounds`, `center` and `radius`.
    pub fn update_bounds(&mut self, arena: &Arena) -> Result<()> {
        let (bounds, center, radius) = self.compute_bounds(arena, None)?;
        self.bounds = bounds;
        self.center = center;
        self.radius = radius;
        Ok(())
    }

    /// Take over another mesh's positions, texture coordinates and normals.
    pub fn copy_source_vertex_data_from(&mut self, src: &MeshData) {
        self.verts = src.verts.clone();
        self.tverts = src.tverts.clone();
        self.norms = src.norms.clone();
    }
}

impl Default for MeshData {
    fn default() -> Self {
        Self {
            num_frames: 1,
            num_mat_frames: 1,
            parent_mesh: -1,
            bounds: Box3F::ZERO,
            center: Vec3::ZERO,
            radius: 0.0,
            verts: Array::default(),
            tverts: Array::default(),
            norms: Array::default(),
            encoded_norms: Array::default(),
            primitives: Vec::new(),
            indices: Vec::new(),
            verts_per_frame: 0,
            flags: 0,
        }
    }
}

/// Box, center and radius (farthest point from the center) of a point set.
pub fn bounds_of(points: &[Vec3]) -> (Box3F, Vec3, f32) {
    let Some((first, rest)) = points.split_first() else {
        return (Box3F::ZERO, Vec3::ZERO, 0.0);
    };
    let mut bounds = Box3F::from_point(*first);
    for p in rest {
        bounds.expand_by_point(*p);
    }
    let center = bounds.center();
    let radius = points
        .iter()
        .map(|p| (*p - center).length_squared())
        .fold(0.0f32, f32::max)
        .sqrt();
    (bounds, center, radius)
}

/// A mesh deformed by weighted bones.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkinMesh {
    pub base: MeshData,
    /// Bind-pose positions.
    pub initial_verts: Array<Vec3>,
    pub initial_norms: Array<Vec3>,
    /// Codebook indices for `initial_norms`.
    pub initial_encoded_norms: Array<u8>,
    /// Per-bone bind transforms.
    pub initial_transforms: Array<MatrixF>,
    // (vertex, bone, weight) tuples
    pub vertex_index: Array<i32>,
    pub bone_index: Array<i32>,
    pub weight: Array<f32>,
    /// Bone to node mapping.
    pub node_index: Array<i32>,
}

/// A run of primitives split by a plane, for back-to-front drawing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Cluster {
    pub start_primitive: i32,
    pub end_primitive: i32,
    pub normal: Vec3,
    pub k: f32,
    /// Cluster to visit when in front of the plane, or -1.
    pub front_cluster: i32,
    /// Cluster to visit when behind the plane, or -1.
    pub back_cluster: i32,
}

/// A translucent mesh drawn in depth order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SortedMesh {
    pub base: MeshData,
    pub clusters: Array<Cluster>,
    // indexed by frame
    pub start_cluster: Array<i32>,
    pub first_verts: Array<i32>,
    pub num_verts: Array<i32>,
    /// Indexed by frame or material frame, whichever animates.
    pub first_tverts: Array<i32>,
    pub always_write_depth: bool,
}

/// Legacy decal mesh. Parsed for validation only, never kept in a shape.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecalMesh {
    pub primitives: Vec<DrawPrimitive>,
    pub indices: Vec<u16>,
    pub start_primitive: Vec<i32>,
    pub texgen_s: Vec<[f32; 4]>,
    pub texgen_t: Vec<[f32; 4]>,
    pub material_index: i32,
}

/// Any mesh that can live in a shape's mesh list.
#[derive(Clone, Debug, PartialEq)]
pub enum Mesh {
    Standard(MeshData),
    Skin(SkinMesh),
    Sorted(SortedMesh),
}

impl Mesh {
    pub fn mesh_type(&self) -> MeshType {
        match self {
            Self::Standard(_) => MeshType::Standard,
            Self::Skin(_) => MeshType::Skin,
            Self::Sorted(_) => MeshType::Sorted,
        }
    }

    pub fn base(&self) -> &MeshData {
        match self {
            Self::Standard(m) => m,
            Self::Skin(m) => &m.base,
            Self::Sorted(m) => &m.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut MeshData {
        match self {
            Self::Standard(m) => m,
            Self::Skin(m) => &mut m.base,
            Self::Sorted(m) => &mut m.base,
        }
    }

    /// Take over another mesh's vertex data; skins also take weights.
    pub fn copy_source_vertex_data_from(&mut self, src: &Mesh) {
        self.base_mut().copy_source_vertex_data_from(src.base());
        if let (Self::Skin(dst), Self::Skin(src)) = (self, src) {
            dst.weight = src.weight.clone();
            dst.bone_index = src.bone_index.clone();
            dst.vertex_index = src.vertex_index.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_type_tags() {
        assert_eq!(MeshType::from_tag(3).unwrap(), MeshType::Sorted);
        assert!(matches!(MeshType::from_tag(9), Err(Error::UnknownMeshType(9))));
        assert_eq!(MeshType::Null.tag(), 4);
    }

    #[test]
    fn test_primitive_bits() {
        let p = DrawPrimitive::new(0, 6, DrawPrimitive::STRIP | DrawPrimitive::INDEXED | 5);
        assert_eq!(p.kind(), PrimitiveKind::Strip);
        assert!(p.is_indexed());
        assert_eq!(p.material(), Some(5));

        let p = DrawPrimitive::new(0, 3, DrawPrimitive::FAN | DrawPrimitive::NO_MATERIAL);
        assert_eq!(p.kind(), PrimitiveKind::Fan);
        assert_eq!(p.material(), None);
        assert_eq!(std::mem::size_of::<Cluster>(), 32);
    }

    #[test]
    fn test_bounds_of_quad() {
        let quad = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let (b, c, r) = bounds_of(&quad);
        assert_eq!(b.max, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(c, Vec3::new(0.5, 0.5, 0.0));
        assert!((r - 0.5f32.sqrt()).abs() < 1e-6);
        assert_eq!(bounds_of(&[]).2, 0.0);
    }

    #[test]
    fn test_frame_bounds() {
        let mut mesh = MeshData::new();
        mesh.verts = vec![Vec3::ZERO, Vec3::X, Vec3::splat(5.0), Vec3::splat(6.0)].into();
        mesh.verts_per_frame = 2;
        let arena = Arena::default();
        let (b, _, _) = mesh.compute_bounds(&arena, Some(1)).unwrap();
        assert_eq!(b.min, Vec3::splat(5.0));
        assert!(mesh.compute_bounds(&arena, Some(2)).is_err());
        mesh.update_bounds(&arena).unwrap();
        assert_eq!(mesh.bounds.max, Vec3::splat(6.0));
    }

    #[test]
    fn test_skin_copies_weights() {
        let mut src = SkinMesh::default();
        src.base.verts = vec![Vec3::ONE].into();
        src.weight = vec![0.5].into();
        let mut dst = Mesh::Skin(SkinMesh::default());
        dst.copy_source_vertex_data_from(&Mesh::Skin(src));
        let Mesh::Skin(dst) = dst else { unreachable!() };
        assert_eq!(dst.weight.len(), 1);
        assert_eq!(dst.base.verts.len(), 1);
    }
}
