//! Field order of each mesh type inside the packed region.
//!
//! Skinned and sorted meshes extend the standard layout, each closing with its
//! own guard. Shared arrays (positions, texture coordinates, normals and skin
//! weights) are only present in the input when the mesh has no parent.

use tracing::warn;

use super::shared::{DecodeContext, SharedEntry, SharedField};
use super::{encode_normals, Cluster, DecalMesh, DrawPrimitive, Mesh, MeshData, MeshType, SkinMesh, SortedMesh};
use crate::packed::{Arena, Array, Lane, PackedReader, PackedWriter, Traversal, Visitor};
use crate::util::{Box3F, Error, MatrixF, Result, Vec2, Vec3};

/// Result of reading one mesh slot.
#[derive(Debug, Default)]
pub struct AssembledMesh {
    /// The mesh, unless the slot is null, a legacy decal or skipped.
    pub mesh: Option<Mesh>,
    /// Sources to record for meshes sharing with this slot.
    pub entry: Option<SharedEntry>,
}

/// Read the mesh stored in slot `index`.
pub fn assemble_mesh<V: Visitor>(
    r: &mut PackedReader<'_, V>,
    cx: &DecodeContext,
    index: usize,
    mesh_type: MeshType,
    skip: bool,
) -> Result<AssembledMesh> {
    let t = r.traversal(skip);
    let (mesh, entry) = match mesh_type {
        MeshType::Null => return Ok(AssembledMesh::default()),
        MeshType::Decal => {
            let walk_only = r.traversal(true);
            let decal = assemble_decal(r, cx, walk_only)?;
            warn!(index, primitives = decal.primitives.len(), "dropping legacy decal mesh");
            return Ok(AssembledMesh::default());
        }
        MeshType::Standard => {
            let (base, entry) = assemble_base(r, cx, index, t)?;
            (Mesh::Standard(base), entry)
        }
        MeshType::Skin => {
            let (base, entry) = assemble_base(r, cx, index, t)?;
            let (skin, entry) = assemble_skin(r, cx, index, t, base, entry)?;
            (Mesh::Skin(skin), entry)
        }
        MeshType::Sorted => {
            let (base, entry) = assemble_base(r, cx, index, t)?;
            (Mesh::Sorted(assemble_sorted(r, t, base)?), entry)
        }
    };
    Ok(AssembledMesh { mesh: (!skip).then_some(mesh), entry: Some(entry) })
}

fn assemble_base<V: Visitor>(
    r: &mut PackedReader<'_, V>,
    cx: &DecodeContext,
    index: usize,
    t: Traversal,
) -> Result<(MeshData, SharedEntry)> {
    r.check_guard()?;

    let num_frames = r.consume_i32()?;
    let num_mat_frames = r.consume_i32()?;
    let parent = r.consume_i32()?;
    let bounds: Box3F = r.consume_pod(Lane::Word)?;
    let center: Vec3 = r.consume_pod(Lane::Word)?;
    let radius = r.consume_i32()? as f32;

    let mut entry = SharedEntry::new(!t.skipping());

    let num_verts = r.consume_count("vertex")?;
    let (verts, src) =
        cx.shared_array::<_, Vec3>(r, index, parent, SharedField::Verts, Lane::Word, num_verts, t)?;
    entry.set(SharedField::Verts, src);

    let num_tverts = r.consume_count("texture vertex")?;
    let (tverts, src) =
        cx.shared_array::<_, Vec2>(r, index, parent, SharedField::TVerts, Lane::Word, num_tverts, t)?;
    entry.set(SharedField::TVerts, src);

    let (norms, encoded_norms) = if cx.version.has_encoded_normals() {
        let (norms, src) =
            cx.shared_array::<_, Vec3>(r, index, parent, SharedField::Norms, Lane::Word, num_verts, t)?;
        entry.set(SharedField::Norms, src);
        let (encoded, src) = cx.shared_array::<_, u8>(
            r,
            index,
            parent,
            SharedField::EncodedNorms,
            Lane::Byte,
            num_verts,
            t,
        )?;
        entry.set(SharedField::EncodedNorms, src);
        (norms, Array::View(encoded))
    } else {
        (r.consume_and_copy::<Vec3>(Lane::Word, num_verts, t)?, Array::default())
    };

    // primitive (start, count) pairs are 16-bit, material words 32-bit
    let num_primitives = r.consume_count("primitive")?;
    let spans: Vec<[u16; 2]> = r.peek_vec(Lane::Half, num_primitives)?;
    let materials: Vec<u32> = r.peek_vec(Lane::Word, num_primitives)?;
    let primitives = spans
        .iter()
        .zip(&materials)
        .map(|(s, m)| DrawPrimitive::new(s[0] as u32, s[1] as u32, *m))
        .collect();

    let num_indices = r.consume_count("index")?;
    let indices: Vec<u16> = r.peek_vec(Lane::Half, num_indices)?;

    // merge indices are no longer used
    let num_merge = r.consume_count("merge index")?;
    r.peek_pointer(Lane::Half, num_merge)?;
    r.align32(t)?;

    let verts_per_frame = r.consume_i32()?;
    let flags = r.consume_u32()?;

    r.check_guard()?;

    let base = MeshData {
        num_frames,
        num_mat_frames,
        parent_mesh: parent,
        bounds,
        center,
        radius,
        verts: Array::View(verts),
        tverts: Array::View(tverts),
        norms: Array::View(norms),
        encoded_norms,
        primitives,
        indices: indices.into_iter().map(u32::from).collect(),
        verts_per_frame,
        flags,
    };
    Ok((base, entry))
}

fn assemble_skin<V: Visitor>(
    r: &mut PackedReader<'_, V>,
    cx: &DecodeContext,
    index: usize,
    t: Traversal,
    base: MeshData,
    mut entry: SharedEntry,
) -> Result<(SkinMesh, SharedEntry)> {
    let parent = base.parent_mesh;

    let num_verts = r.consume_count("initial vertex")?;
    let (initial_verts, src) =
        cx.shared_array::<_, Vec3>(r, index, parent, SharedField::Verts, Lane::Word, num_verts, t)?;
    entry.set(SharedField::Verts, src);

    let (initial_norms, initial_encoded_norms) = if cx.version.has_encoded_normals() {
        let (norms, src) =
            cx.shared_array::<_, Vec3>(r, index, parent, SharedField::Norms, Lane::Word, num_verts, t)?;
        entry.set(SharedField::Norms, src);
        let (encoded, src) = cx.shared_array::<_, u8>(
            r,
            index,
            parent,
            SharedField::EncodedNorms,
            Lane::Byte,
            num_verts,
            t,
        )?;
        entry.set(SharedField::EncodedNorms, src);
        (norms, Array::View(encoded))
    } else {
        (r.consume_and_copy::<Vec3>(Lane::Word, num_verts, t)?, Array::default())
    };

    let num_bones = r.consume_count("bone")?;
    let (initial_transforms, src) = cx.shared_array::<_, MatrixF>(
        r,
        index,
        parent,
        SharedField::InitialTransforms,
        Lane::Word,
        num_bones,
        t,
    )?;
    entry.set(SharedField::InitialTransforms, src);

    let num_weights = r.consume_count("weight")?;
    let (vertex_index, src) = cx.shared_array::<_, i32>(
        r,
        index,
        parent,
        SharedField::VertexIndex,
        Lane::Word,
        num_weights,
        t,
    )?;
    entry.set(SharedField::VertexIndex, src);
    let (bone_index, src) =
        cx.shared_array::<_, i32>(r, index, parent, SharedField::BoneIndex, Lane::Word, num_weights, t)?;
    entry.set(SharedField::BoneIndex, src);
    let (weight, src) =
        cx.shared_array::<_, f32>(r, index, parent, SharedField::Weight, Lane::Word, num_weights, t)?;
    entry.set(SharedField::Weight, src);

    let num_nodes = r.consume_count("bone node")?;
    let (node_index, src) =
        cx.shared_array::<_, i32>(r, index, parent, SharedField::NodeIndex, Lane::Word, num_nodes, t)?;
    entry.set(SharedField::NodeIndex, src);

    r.check_guard()?;

    let skin = SkinMesh {
        base,
        initial_verts: Array::View(initial_verts),
        initial_norms: Array::View(initial_norms),
        initial_encoded_norms,
        initial_transforms: Array::View(initial_transforms),
        vertex_index: Array::View(vertex_index),
        bone_index: Array::View(bone_index),
        weight: Array::View(weight),
        node_index: Array::View(node_index),
    };
    Ok((skin, entry))
}

fn assemble_sorted<V: Visitor>(
    r: &mut PackedReader<'_, V>,
    t: Traversal,
    base: MeshData,
) -> Result<SortedMesh> {
    let n = r.consume_count("cluster")?;
    let clusters = r.consume_and_copy::<Cluster>(Lane::Word, n, t)?;

    let per_frame = |r: &mut PackedReader<'_, V>, what| -> Result<Array<i32>> {
        let n = r.consume_count(what)?;
        Ok(Array::View(r.consume_and_copy::<i32>(Lane::Word, n, t)?))
    };
    let start_cluster = per_frame(r, "start cluster")?;
    let first_verts = per_frame(r, "first vertex")?;
    let num_verts = per_frame(r, "vertex count")?;
    let first_tverts = per_frame(r, "first texture vertex")?;

    let always_write_depth = r.consume_u32()? != 0;

    r.check_guard()?;

    Ok(SortedMesh {
        base,
        clusters: Array::View(clusters),
        start_cluster,
        first_verts,
        num_verts,
        first_tverts,
        always_write_depth,
    })
}

/// Legacy decal meshes are always walked in skip mode.
fn assemble_decal<V: Visitor>(
    r: &mut PackedReader<'_, V>,
    cx: &DecodeContext,
    t: Traversal,
) -> Result<DecalMesh> {
    let embedded = cx.version.has_embedded_decal_header();
    if embedded {
        r.check_guard()?;
        r.peek_pointer(Lane::Word, 15)?;
    }

    let n = r.consume_count("decal primitive")?;
    let spans: Vec<[u16; 2]> = r.peek_vec(Lane::Half, n)?;
    let materials: Vec<u32> = r.peek_vec(Lane::Word, n)?;
    r.align32(t)?;

    let n = r.consume_count("decal index")?;
    let indices: Vec<u16> = r.peek_vec(Lane::Half, n)?;
    r.align32(t)?;

    if embedded {
        r.peek_pointer(Lane::Word, 3)?;
        r.check_guard()?;
    }

    let n = r.consume_count("decal start primitive")?;
    let start_primitive: Vec<i32> = r.peek_vec(Lane::Word, n)?;
    let texgen_s: Vec<[f32; 4]> = r.peek_vec(Lane::Word, n)?;
    let texgen_t: Vec<[f32; 4]> = r.peek_vec(Lane::Word, n)?;
    let material_index = r.consume_i32()?;

    r.check_guard()?;

    Ok(DecalMesh {
        primitives: spans
            .iter()
            .zip(&materials)
            .map(|(s, m)| DrawPrimitive::new(s[0] as u32, s[1] as u32, *m))
            .collect(),
        indices,
        start_primitive,
        texgen_s,
        texgen_t,
        material_index,
    })
}

/// Write one mesh in the current format.
pub fn disassemble_mesh(w: &mut PackedWriter, arena: &Arena, mesh: &Mesh) -> Result<()> {
    disassemble_base(w, arena, mesh.base(), mesh.mesh_type())?;
    match mesh {
        Mesh::Standard(_) => Ok(()),
        Mesh::Skin(skin) => disassemble_skin(w, arena, skin),
        Mesh::Sorted(sorted) => disassemble_sorted(w, arena, sorted),
    }
}

/// Raw normals followed by their codebook indices.
fn write_normals(
    w: &mut PackedWriter,
    arena: &Arena,
    num_verts: usize,
    norms: &Array<Vec3>,
    encoded: &Array<u8>,
) -> Result<()> {
    let norms = arena.resolve(norms)?;
    if norms.len() != num_verts {
        return Err(Error::invalid(format!(
            "mesh has {} normals for {} vertices",
            norms.len(),
            num_verts
        )));
    }
    w.extend32(&norms[..]);
    let encoded = arena.resolve(encoded)?;
    if encoded.len() == norms.len() {
        w.extend8(&encoded);
    } else {
        w.extend8(&encode_normals(&norms));
    }
    Ok(())
}

fn disassemble_base(w: &mut PackedWriter, arena: &Arena, m: &MeshData, mesh_type: MeshType) -> Result<()> {
    w.write_guard();

    w.push_i32(m.num_frames);
    w.push_i32(m.num_mat_frames);
    w.push_i32(m.parent_mesh);
    w.extend32(&[m.bounds]);
    w.extend32(&[m.center]);
    w.push_i32(m.radius as i32);

    let owned = !m.is_shared();
    let verts = arena.resolve(&m.verts)?;
    w.push_count(verts.len());
    if owned {
        w.extend32(&verts[..]);
    }
    let tverts = arena.resolve(&m.tverts)?;
    w.push_count(tverts.len());
    if owned {
        w.extend32(&tverts[..]);
        write_normals(w, arena, verts.len(), &m.norms, &m.encoded_norms)?;
    }

    w.push_count(m.primitives.len());
    for p in &m.primitives {
        w.push_u16(p.start as u16);
        w.push_u16(p.num_elements as u16);
        w.push_u32(p.mat_index);
    }

    w.push_count(m.indices.len());
    for i in &m.indices {
        w.push_u16(*i as u16);
    }

    // merge indices
    w.push_i32(0);

    w.push_i32(m.verts_per_frame);
    w.push_u32(mesh_type.tag() | m.flags);

    w.write_guard();
    Ok(())
}

fn disassemble_skin(w: &mut PackedWriter, arena: &Arena, skin: &SkinMesh) -> Result<()> {
    let owned = !skin.base.is_shared();

    let initial_verts = arena.resolve(&skin.initial_verts)?;
    w.push_count(initial_verts.len());
    if owned {
        w.extend32(&initial_verts[..]);
        write_normals(
            w,
            arena,
            initial_verts.len(),
            &skin.initial_norms,
            &skin.initial_encoded_norms,
        )?;
    }

    let transforms = arena.resolve(&skin.initial_transforms)?;
    w.push_count(transforms.len());
    if owned {
        w.extend32(&transforms[..]);
    }

    let vertex_index = arena.resolve(&skin.vertex_index)?;
    let bone_index = arena.resolve(&skin.bone_index)?;
    let weight = arena.resolve(&skin.weight)?;
    if bone_index.len() != vertex_index.len() || weight.len() != vertex_index.len() {
        return Err(Error::invalid("skin weight tuples have mismatched lengths"));
    }
    w.push_count(vertex_index.len());
    if owned {
        w.extend32(&vertex_index[..]);
        w.extend32(&bone_index[..]);
        w.extend32(&weight[..]);
    }

    let node_index = arena.resolve(&skin.node_index)?;
    w.push_count(node_index.len());
    if owned {
        w.extend32(&node_index[..]);
    }

    w.write_guard();
    Ok(())
}

fn disassemble_sorted(w: &mut PackedWriter, arena: &Arena, sorted: &SortedMesh) -> Result<()> {
    let clusters = arena.resolve(&sorted.clusters)?;
    w.push_count(clusters.len());
    w.extend32(&clusters[..]);

    for array in [&sorted.start_cluster, &sorted.first_verts, &sorted.num_verts, &sorted.first_tverts] {
        let values = arena.resolve(array)?;
        w.push_count(values.len());
        w.extend32(&values[..]);
    }

    w.push_u32(sorted.always_write_depth as u32);

    w.write_guard();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packed::{CheckpointPolicy, CopyingVisitor, PackedRegion, SizingVisitor, Version};

    fn quad() -> MeshData {
        let mut m = MeshData::new();
        m.verts = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ]
        .into();
        m.tverts = vec![Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y].into();
        m.norms = vec![Vec3::Z; 4].into();
        m.primitives = vec![DrawPrimitive::new(0, 6, DrawPrimitive::TRIANGLES | DrawPrimitive::INDEXED)];
        m.indices = vec![0, 1, 2, 0, 2, 3];
        m.verts_per_frame = 4;
        m.update_bounds(&Arena::default()).unwrap();
        m
    }

    fn write(meshes: &[Option<Mesh>]) -> PackedRegion {
        let mut w = PackedWriter::new();
        for mesh in meshes {
            match mesh {
                Some(mesh) => {
                    w.push_u32(mesh.mesh_type().tag());
                    disassemble_mesh(&mut w, &Arena::default(), mesh).unwrap();
                }
                None => w.push_u32(MeshType::Null.tag()),
            }
        }
        w.finish()
    }

    fn walk<V: Visitor>(
        region: &PackedRegion,
        visitor: V,
        version: Version,
        skip: &[bool],
    ) -> Result<(Vec<Option<Mesh>>, V)> {
        let mut r = PackedReader::new(region, visitor);
        let mut cx = DecodeContext::new(version);
        cx.shared = crate::mesh::SharedTable::with_len(skip.len());
        let mut out = Vec::new();
        for (i, skip) in skip.iter().enumerate() {
            let mesh_type = MeshType::from_tag(r.consume_u32()?)?;
            let assembled = assemble_mesh(&mut r, &cx, i, mesh_type, *skip)?;
            if let Some(entry) = assembled.entry {
                cx.shared.record(i, entry)?;
            }
            out.push(assembled.mesh);
        }
        Ok((out, r.into_visitor()))
    }

    fn decode(region: &PackedRegion, skip: &[bool]) -> (Vec<Option<Mesh>>, Arena) {
        let (_, sizing) = walk(region, SizingVisitor::new(), Version::CURRENT, skip).unwrap();
        let (size, checkpoints) = sizing.finish();
        let copying = CopyingVisitor::new(size, checkpoints, CheckpointPolicy::EveryGuard);
        let (meshes, copying) = walk(region, copying, Version::CURRENT, skip).unwrap();
        (meshes, copying.finish().unwrap())
    }

    #[test]
    fn test_standard_mesh() {
        let region = write(&[Some(Mesh::Standard(quad()))]);
        let (meshes, arena) = decode(&region, &[false]);
        let mesh = meshes[0].as_ref().unwrap().base();
        assert_eq!(arena.resolve(&mesh.verts).unwrap().len(), 4);
        assert_eq!(&*arena.resolve(&mesh.norms).unwrap(), &[Vec3::Z; 4]);
        let encoded = arena.resolve(&mesh.encoded_norms).unwrap();
        assert!(encoded.iter().all(|&c| c == crate::mesh::encode_normal(Vec3::Z)));
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.primitives[0].num_elements, 6);
        // radius is stored as a whole number
        assert_eq!(mesh.radius, 0.0);
    }

    #[test]
    fn test_shared_mesh_reads_parent_data() {
        let mut child = quad();
        child.parent_mesh = 0;
        let region = write(&[Some(Mesh::Standard(quad())), Some(Mesh::Standard(child))]);
        let (meshes, arena) = decode(&region, &[false, false]);
        let a = meshes[0].as_ref().unwrap().base();
        let b = meshes[1].as_ref().unwrap().base();
        assert_eq!(arena.resolve(&a.verts).unwrap(), arena.resolve(&b.verts).unwrap());
        assert_eq!(arena.resolve(&a.tverts).unwrap(), arena.resolve(&b.tverts).unwrap());
    }

    #[test]
    fn test_skipped_parent_still_feeds_child() {
        let mut child = quad();
        child.parent_mesh = 0;
        let region = write(&[Some(Mesh::Standard(quad())), Some(Mesh::Standard(child))]);
        let (meshes, arena) = decode(&region, &[true, false]);
        assert!(meshes[0].is_none());
        let b = meshes[1].as_ref().unwrap().base();
        assert_eq!(arena.resolve(&b.verts).unwrap()[2], Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(arena.resolve(&b.norms).unwrap().len(), 4);
    }

    #[test]
    fn test_skin_mesh() {
        let mut skin = SkinMesh { base: quad(), ..Default::default() };
        skin.base.verts = Array::default();
        skin.base.tverts = Array::default();
        skin.base.norms = Array::default();
        skin.initial_verts = vec![Vec3::X, Vec3::Y].into();
        skin.initial_norms = vec![Vec3::Z, Vec3::Z].into();
        skin.initial_transforms = vec![MatrixF::IDENTITY].into();
        skin.vertex_index = vec![0, 1].into();
        skin.bone_index = vec![0, 0].into();
        skin.weight = vec![1.0, 1.0].into();
        skin.node_index = vec![0].into();

        let region = write(&[Some(Mesh::Skin(skin))]);
        let (meshes, arena) = decode(&region, &[false]);
        let Some(Mesh::Skin(skin)) = &meshes[0] else { panic!("expected skin") };
        assert_eq!(&*arena.resolve(&skin.initial_verts).unwrap(), &[Vec3::X, Vec3::Y]);
        assert_eq!(&*arena.resolve(&skin.weight).unwrap(), &[1.0, 1.0]);
        assert_eq!(&*arena.resolve(&skin.initial_transforms).unwrap(), &[MatrixF::IDENTITY]);
        assert_eq!(&*arena.resolve(&skin.node_index).unwrap(), &[0]);
    }

    #[test]
    fn test_sorted_mesh() {
        let sorted = SortedMesh {
            base: quad(),
            clusters: vec![Cluster { end_primitive: 1, front_cluster: -1, back_cluster: -1, ..Default::default() }]
                .into(),
            start_cluster: vec![0].into(),
            first_verts: vec![0].into(),
            num_verts: vec![4].into(),
            first_tverts: vec![0].into(),
            always_write_depth: true,
        };
        let region = write(&[Some(Mesh::Sorted(sorted))]);
        let (meshes, arena) = decode(&region, &[false]);
        let Some(Mesh::Sorted(sorted)) = &meshes[0] else { panic!("expected sorted") };
        assert!(sorted.always_write_depth);
        assert_eq!(arena.resolve(&sorted.clusters).unwrap()[0].back_cluster, -1);
        assert_eq!(&*arena.resolve(&sorted.num_verts).unwrap(), &[4]);
    }

    #[test]
    fn test_normal_count_checked_on_write() {
        let mut m = quad();
        m.norms = vec![Vec3::Z].into();
        let mut w = PackedWriter::new();
        assert!(disassemble_mesh(&mut w, &Arena::default(), &Mesh::Standard(m)).is_err());
    }

    /// One legacy decal mesh slot followed by the guard closing the mesh list.
    fn decal_region(version: Version) -> PackedRegion {
        let embedded = version.has_embedded_decal_header();
        let mut w = PackedWriter::new();
        w.push_u32(MeshType::Decal.tag());
        if embedded {
            w.write_guard();
            w.zeros32(15);
        }
        w.push_count(1);
        w.push_u16(0);
        w.push_u16(3);
        w.push_u32(DrawPrimitive::TRIANGLES | DrawPrimitive::INDEXED);
        w.push_count(3);
        for i in [0u16, 1, 2] {
            w.push_u16(i);
        }
        if embedded {
            w.zeros32(3);
            w.write_guard();
        }
        w.push_count(1);
        w.push_i32(0);
        w.extend32(&[[1.0f32, 0.0, 0.0, 0.0]]);
        w.extend32(&[[0.0f32, 1.0, 0.0, 0.0]]);
        w.push_i32(2);
        w.write_guard();

        w.write_guard();
        w.finish()
    }

    fn read_decal_slot(region: &PackedRegion, version: Version) -> Result<(AssembledMesh, [usize; 3], usize)> {
        let mut r = PackedReader::new(region, SizingVisitor::new());
        let cx = DecodeContext::new(version);
        let mesh_type = MeshType::from_tag(r.consume_u32()?)?;
        let assembled = assemble_mesh(&mut r, &cx, 0, mesh_type, false)?;
        r.check_guard()?;
        Ok((assembled, r.positions(), r.output_position()))
    }

    #[test]
    fn test_decal_mesh_dropped() {
        for version in [Version(19), Version(20), Version::CURRENT] {
            let region = decal_region(version);
            let (assembled, positions, output) = read_decal_slot(&region, version).unwrap();
            assert!(assembled.mesh.is_none());
            assert!(assembled.entry.is_none());
            assert_eq!(output, 0);
            assert_eq!(positions, [region.words.len(), region.halves.len(), region.bytes.len()]);
        }
    }

    #[test]
    fn test_decal_header_depends_on_version() {
        // without the embedded header the reader stops short of the v19 data
        let region = decal_region(Version(19));
        let err = read_decal_slot(&region, Version(20)).err().unwrap();
        assert!(matches!(err, Error::GuardMismatch { lane: "32-bit", expected: 1, found: 0 }), "{err}");
    }
}
