//! Field order of the shape inside the packed region.
//!
//! [`walk`] runs once per decode pass. Every logical group ends with a guard,
//! and the format version read from the header decides which groups exist.
//! [`disassemble`] writes the same order in the current version.

use tracing::{debug, warn};

use super::{DecodeOptions, Detail, Model, Node, Object, ObjectState, Trigger};
use crate::mesh::codec::{assemble_mesh, disassemble_mesh};
use crate::mesh::{DecodeContext, MeshType, SharedTable};
use crate::packed::{
    Array, CopyingVisitor, Lane, PackedReader, PackedRegion, PackedWriter, SizingVisitor, Version,
    Visitor,
};
use crate::util::{Box3F, Error, Quat16, Result, Vec3};

/// Entity counts at the start of the region.
#[derive(Debug, Default)]
struct Counts {
    nodes: usize,
    objects: usize,
    decals: usize,
    sub_shapes: usize,
    ifl_materials: usize,
    rotations: usize,
    translations: usize,
    uniform_scales: usize,
    aligned_scales: usize,
    arbitrary_scales: usize,
    ground_frames: usize,
    object_states: usize,
    decal_states: usize,
    triggers: usize,
    details: usize,
    meshes: usize,
    skins: usize,
    names: usize,
}

impl Counts {
    fn read<V: Visitor>(r: &mut PackedReader<'_, V>, version: Version) -> Result<Self> {
        let mut c = Counts {
            nodes: r.consume_count("node")?,
            objects: r.consume_count("object")?,
            decals: r.consume_count("decal")?,
            sub_shapes: r.consume_count("sub-shape")?,
            ifl_materials: r.consume_count("IFL material")?,
            ..Default::default()
        };

        if version.has_split_track_counts() {
            c.rotations = r.consume_count("node rotation")?;
            c.translations = r.consume_count("node translation")?;
            c.uniform_scales = r.consume_count("uniform scale")?;
            c.aligned_scales = r.consume_count("aligned scale")?;
            c.arbitrary_scales = r.consume_count("arbitrary scale")?;
        } else {
            // one count covering default and animated transforms
            let combined = r.consume_count("node state")?;
            let animated = combined.checked_sub(c.nodes).ok_or_else(|| {
                Error::invalid(format!("{combined} node states for {} nodes", c.nodes))
            })?;
            c.rotations = animated;
            c.translations = animated;
        }
        if version.has_ground_frames() {
            c.ground_frames = r.consume_count("ground frame")?;
        }

        c.object_states = r.consume_count("object state")?;
        c.decal_states = r.consume_count("decal state")?;
        c.triggers = r.consume_count("trigger")?;
        c.details = r.consume_count("detail")?;
        c.meshes = r.consume_count("mesh")?;
        if version.has_separate_skins() {
            c.skins = r.consume_count("skin")?;
        }
        c.names = r.consume_count("name")?;

        // mesh slots are sized before they are read; each takes at least
        // one 32-bit value (its type tag, or a guard for old-style skins)
        let slots = c
            .meshes
            .checked_add(c.skins)
            .ok_or_else(|| Error::invalid("mesh count overflow"))?;
        r.ensure_remaining(Lane::Word, slots, "mesh list")?;
        Ok(c)
    }
}

/// Run both decode passes over `region`.
pub(super) fn assemble(region: &PackedRegion, version: Version, options: &DecodeOptions) -> Result<Model> {
    let (_, sizing) = walk(PackedReader::new(region, SizingVisitor::new()), version, options)?;
    let (size, checkpoints) = sizing.finish();
    debug!(size, guards = checkpoints.len(), "sizing pass complete");

    let copying = CopyingVisitor::new(size, checkpoints, options.checkpoints);
    let (mut model, copying) = walk(PackedReader::new(region, copying), version, options)?;
    model.arena = copying.finish()?;

    sanitize_details(&mut model)?;
    model.update_smallest_visible_detail()?;
    Ok(model)
}

/// One pass over the packed region.
#[tracing::instrument(skip_all, fields(copies = V::COPIES))]
fn walk<V: Visitor>(
    mut r: PackedReader<'_, V>,
    version: Version,
    options: &DecodeOptions,
) -> Result<(Model, V)> {
    let t = r.traversal(false);
    let mut m = Model::default();

    let c = Counts::read(&mut r, version)?;
    debug!(?c, "entity counts");
    m.smallest_visible_size = r.consume_i32()? as f32;
    m.smallest_visible_dl = r.consume_i32()?;
    r.check_guard()?;

    m.radius = r.consume_f32()?;
    m.tube_radius = r.consume_f32()?;
    m.center = r.consume_pod::<Vec3>(Lane::Word)?;
    m.bounds = r.consume_pod::<Box3F>(Lane::Word)?;
    r.check_guard()?;

    m.nodes = Array::View(r.consume_and_copy::<Node>(Lane::Word, c.nodes, t)?);
    r.check_guard()?;

    let (objects, object_list) = r.consume_and_copy_values::<Object>(Lane::Word, c.objects, t)?;
    m.objects = Array::View(objects);
    // room for the objects of old-style skins
    r.allocate_only::<Object>(c.skins, t)?;
    r.check_guard()?;

    // decals, no longer used
    r.peek_pointer(Lane::Word, c.decals * 5)?;
    r.check_guard()?;

    // IFL materials, no longer used
    r.consume_and_copy::<[i32; 5]>(Lane::Word, c.ifl_materials, t)?;
    r.check_guard()?;

    m.sub_shape_first_node = Array::View(r.consume_and_copy::<i32>(Lane::Word, c.sub_shapes, t)?);
    m.sub_shape_first_object = Array::View(r.consume_and_copy::<i32>(Lane::Word, c.sub_shapes, t)?);
    r.peek_pointer(Lane::Word, c.sub_shapes)?;
    r.check_guard()?;

    m.sub_shape_num_nodes = Array::View(r.consume_and_copy::<i32>(Lane::Word, c.sub_shapes, t)?);
    m.sub_shape_num_objects = Array::View(r.consume_and_copy::<i32>(Lane::Word, c.sub_shapes, t)?);
    r.consume_and_copy::<i32>(Lane::Word, c.sub_shapes, t)?;
    r.check_guard()?;

    m.default_rotations = Array::View(r.consume_and_copy::<Quat16>(Lane::Half, c.nodes, t)?);
    r.align32(t)?;
    m.default_translations = Array::View(r.consume_and_copy::<Vec3>(Lane::Word, c.nodes, t)?);

    m.node_translations = r.consume_vec::<Vec3>(Lane::Word, c.translations)?;
    m.node_rotations = r.consume_vec::<Quat16>(Lane::Half, c.rotations)?;
    r.align32(t)?;
    r.check_guard()?;

    if version.has_scale_tracks() {
        m.node_uniform_scales = r.consume_vec::<f32>(Lane::Word, c.uniform_scales)?;
        m.node_aligned_scales = r.consume_vec::<Vec3>(Lane::Word, c.aligned_scales)?;
        m.node_arbitrary_scale_factors = r.consume_vec::<Vec3>(Lane::Word, c.arbitrary_scales)?;
        m.node_arbitrary_scale_rots = r.consume_vec::<Quat16>(Lane::Half, c.arbitrary_scales)?;
        r.align32(t)?;
        r.check_guard()?;
    }

    if version.has_ground_frames() {
        m.ground_translations = r.consume_vec::<Vec3>(Lane::Word, c.ground_frames)?;
        m.ground_rotations = r.consume_vec::<Quat16>(Lane::Half, c.ground_frames)?;
        r.align32(t)?;
        r.check_guard()?;
    }

    m.object_states = Array::View(r.consume_and_copy::<ObjectState>(Lane::Word, c.object_states, t)?);
    r.allocate_only::<ObjectState>(c.skins, t)?;
    r.check_guard()?;

    // decal states, no longer used
    r.peek_pointer(Lane::Word, c.decal_states)?;
    r.check_guard()?;

    m.triggers = r.consume_vec::<Trigger>(Lane::Word, c.triggers)?;
    r.check_guard()?;

    m.details = Array::View(r.consume_and_copy::<Detail>(Lane::Word, c.details, t)?);
    r.check_guard()?;

    let skipped = skipped_meshes(&object_list, c.meshes, options.skip_details);
    let mut cx = DecodeContext::new(version);
    cx.shared = SharedTable::with_len(c.meshes);
    m.meshes = Vec::with_capacity(c.meshes);
    for index in 0..c.meshes {
        let mesh_type = MeshType::from_tag(r.consume_u32()?)?;
        let skip = skipped[index];
        let assembled = assemble_mesh(&mut r, &cx, index, mesh_type, skip)?;
        if let Some(entry) = assembled.entry {
            cx.shared.record(index, entry)?;
        }
        if skip && V::COPIES && mesh_type != MeshType::Null {
            debug!(index, "dropped finer detail mesh");
        }
        m.meshes.push(assembled.mesh);
    }
    r.check_guard()?;

    m.names = read_names(&mut r, c.names)?;
    r.align32(t)?;
    r.check_guard()?;

    if version.has_separate_skins() {
        // per-detail skin tables, no longer used
        r.peek_pointer(Lane::Word, c.details)?;
        r.peek_pointer(Lane::Word, c.details)?;
        r.check_guard()?;

        r.allocate_only::<i32>(c.skins, t)?;
        let mut skins = DecodeContext::new(version);
        skins.shared = SharedTable::with_len(c.skins);
        for index in 0..c.skins {
            let assembled = assemble_mesh(&mut r, &skins, index, MeshType::Skin, false)?;
            if let Some(entry) = assembled.entry {
                skins.shared.record(index, entry)?;
            }
            m.meshes.push(assembled.mesh);
        }
        r.check_guard()?;
    }

    Ok((m, r.into_visitor()))
}

/// Mesh slots holding the `skip` finest detail levels of each object.
fn skipped_meshes(objects: &[Object], num_meshes: usize, skip: usize) -> Vec<bool> {
    let mut skipped = vec![false; num_meshes];
    if skip == 0 {
        return skipped;
    }
    for object in objects {
        for index in object.mesh_range().take(skip) {
            if let Some(slot) = skipped.get_mut(index) {
                *slot = true;
            }
        }
    }
    skipped
}

/// Null-terminated names at the current position of the 8-bit lane.
fn read_names<V: Visitor>(r: &mut PackedReader<'_, V>, count: usize) -> Result<Vec<String>> {
    let bytes = r.remaining_bytes();
    let mut names = Vec::with_capacity(count.min(bytes.len()));
    let mut at = 0;
    for index in 0..count {
        let len = bytes[at..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| Error::truncated("name table", at as u64))?;
        let raw = &bytes[at..at + len];
        names.push(match std::str::from_utf8(raw) {
            Ok(s) => s.to_owned(),
            Err(_) => {
                if V::COPIES {
                    warn!(index, "name is not valid UTF-8");
                }
                String::from_utf8_lossy(raw).into_owned()
            }
        });
        at += len + 1;
    }
    r.peek_pointer(Lane::Byte, at)?;
    Ok(names)
}

/// Reset LOD error metrics some exporters fill with garbage.
fn sanitize_details(model: &mut Model) -> Result<()> {
    let Array::View(view) = model.details else {
        return Ok(());
    };
    let mut details = model.arena.view(&view)?.into_owned();
    let mut changed = false;
    for (index, detail) in details.iter_mut().enumerate() {
        if detail.sanitize() {
            warn!(index, size = detail.size, "reset invalid detail error metrics");
            changed = true;
        }
    }
    if changed {
        model.arena.write(&view, &details)?;
    }
    Ok(())
}

fn check_len(what: &str, len: usize, expected: usize) -> Result<()> {
    if len != expected {
        return Err(Error::invalid(format!("{what} has {len} entries, expected {expected}")));
    }
    Ok(())
}

/// Write the packed region of `model` in the current version.
#[tracing::instrument(skip_all)]
pub(super) fn disassemble(model: &Model) -> Result<PackedRegion> {
    let arena = &model.arena;
    let nodes = arena.resolve(&model.nodes)?;
    let objects = arena.resolve(&model.objects)?;
    let first_node = arena.resolve(&model.sub_shape_first_node)?;
    let first_object = arena.resolve(&model.sub_shape_first_object)?;
    let num_nodes = arena.resolve(&model.sub_shape_num_nodes)?;
    let num_objects = arena.resolve(&model.sub_shape_num_objects)?;
    let default_rotations = arena.resolve(&model.default_rotations)?;
    let default_translations = arena.resolve(&model.default_translations)?;
    let object_states = arena.resolve(&model.object_states)?;
    let details = arena.resolve(&model.details)?;

    let sub_shapes = first_node.len();
    check_len("sub-shape first object table", first_object.len(), sub_shapes)?;
    check_len("sub-shape node count table", num_nodes.len(), sub_shapes)?;
    check_len("sub-shape object count table", num_objects.len(), sub_shapes)?;
    check_len("default rotations", default_rotations.len(), nodes.len())?;
    check_len("default translations", default_translations.len(), nodes.len())?;
    check_len(
        "arbitrary scale rotations",
        model.node_arbitrary_scale_rots.len(),
        model.node_arbitrary_scale_factors.len(),
    )?;
    check_len("ground rotations", model.ground_rotations.len(), model.ground_translations.len())?;
    if let Some(name) = model.names.iter().find(|n| n.as_bytes().contains(&0)) {
        return Err(Error::invalid(format!("name {name:?} contains a NUL byte")));
    }

    let mut w = PackedWriter::new();

    w.push_count(nodes.len());
    w.push_count(objects.len());
    w.push_count(0); // decals
    w.push_count(sub_shapes);
    w.push_count(0); // IFL materials
    w.push_count(model.node_rotations.len());
    w.push_count(model.node_translations.len());
    w.push_count(model.node_uniform_scales.len());
    w.push_count(model.node_aligned_scales.len());
    w.push_count(model.node_arbitrary_scale_factors.len());
    w.push_count(model.ground_translations.len());
    w.push_count(object_states.len());
    w.push_count(0); // decal states
    w.push_count(model.triggers.len());
    w.push_count(details.len());
    w.push_count(model.meshes.len());
    w.push_count(model.names.len());
    w.push_i32(model.smallest_visible_size as i32);
    w.push_i32(model.smallest_visible_dl);
    w.write_guard();

    w.push_f32(model.radius);
    w.push_f32(model.tube_radius);
    w.extend32(&[model.center]);
    w.extend32(&[model.bounds]);
    w.write_guard();

    w.extend32(&nodes[..]);
    w.write_guard();
    w.extend32(&objects[..]);
    w.write_guard();
    // decals
    w.write_guard();
    // IFL materials
    w.write_guard();

    w.extend32(&first_node[..]);
    w.extend32(&first_object[..]);
    w.zeros32(sub_shapes);
    w.write_guard();
    w.extend32(&num_nodes[..]);
    w.extend32(&num_objects[..]);
    w.zeros32(sub_shapes);
    w.write_guard();

    w.extend16(&default_rotations[..]);
    w.extend32(&default_translations[..]);
    w.extend16(&model.node_rotations);
    w.extend32(&model.node_translations);
    w.write_guard();

    w.extend32(&model.node_uniform_scales);
    w.extend32(&model.node_aligned_scales);
    w.extend32(&model.node_arbitrary_scale_factors);
    w.extend16(&model.node_arbitrary_scale_rots);
    w.write_guard();

    w.extend32(&model.ground_translations);
    w.extend16(&model.ground_rotations);
    w.write_guard();

    w.extend32(&object_states[..]);
    w.write_guard();
    // decal states
    w.write_guard();
    w.extend32(&model.triggers);
    w.write_guard();
    w.extend32(&details[..]);
    w.write_guard();

    // slots outside every object's range are written as null meshes
    let mut referenced = vec![false; model.meshes.len()];
    for object in objects.iter() {
        for index in object.mesh_range() {
            let count = referenced.len();
            *referenced.get_mut(index).ok_or(Error::IndexOutOfBounds { index, count })? = true;
        }
    }
    for (index, mesh) in model.meshes.iter().enumerate() {
        match mesh.as_ref().filter(|_| referenced[index]) {
            Some(mesh) => {
                w.push_u32(mesh.mesh_type().tag());
                disassemble_mesh(&mut w, arena, mesh)?;
            }
            None => w.push_u32(MeshType::Null.tag()),
        }
    }
    w.write_guard();

    for name in &model.names {
        w.extend8(name.as_bytes());
        w.push_u8(0);
    }
    w.write_guard();

    debug!(guards = w.guards(), "packed region written");
    Ok(w.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(start: i32, count: i32) -> Object {
        Object { name_index: 0, num_meshes: count, start_mesh_index: start, node_index: 0, next_sibling: -1, first_decal: -1 }
    }

    #[test]
    fn test_skipped_meshes_per_object() {
        let objects = [object(0, 3), object(3, 2)];
        assert_eq!(skipped_meshes(&objects, 5, 0), vec![false; 5]);
        assert_eq!(skipped_meshes(&objects, 5, 1), vec![true, false, false, true, false]);
        assert_eq!(skipped_meshes(&objects, 5, 4), vec![true; 5]);
    }

    #[test]
    fn test_read_names() {
        let region = PackedRegion { bytes: b"root\0\0mesh\0xx".to_vec(), ..Default::default() };
        let mut r = PackedReader::new(&region, SizingVisitor::new());
        let names = read_names(&mut r, 3).unwrap();
        assert_eq!(names, ["root", "", "mesh"]);
        assert_eq!(r.positions()[2], 11);

        let mut r = PackedReader::new(&region, SizingVisitor::new());
        assert!(matches!(read_names(&mut r, 4), Err(Error::TruncatedStream { .. })));
    }

    #[test]
    fn test_mesh_outside_objects_written_null() {
        let mut model = Model::new();
        model.meshes = vec![Some(crate::mesh::Mesh::Standard(Default::default()))];
        let back = Model::decode(&model.encode().unwrap()).unwrap();
        assert_eq!(back.meshes.len(), 1);
        assert!(back.meshes[0].is_none());

        model.objects = vec![object(0, 2)].into();
        assert!(matches!(disassemble(&model), Err(Error::IndexOutOfBounds { index: 1, .. })));
    }

    #[test]
    fn test_mismatched_tables_rejected() {
        let mut model = Model::new();
        model.nodes = vec![Node::new(0, -1)].into();
        assert!(matches!(disassemble(&model), Err(Error::InvalidStructure(_))));
    }

    use crate::mesh::{DrawPrimitive, Mesh, MeshData, SkinMesh};
    use crate::util::{MatrixF, Vec2};

    fn quad_mesh() -> MeshData {
        let mut m = MeshData::new();
        m.verts = vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y].into();
        m.tverts = vec![Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y].into();
        m.norms = vec![Vec3::Z; 4].into();
        m.primitives = vec![DrawPrimitive::new(0, 6, DrawPrimitive::TRIANGLES | DrawPrimitive::INDEXED)];
        m.indices = vec![0, 1, 2, 0, 2, 3];
        m.verts_per_frame = 4;
        m
    }

    /// A one-node, one-object shape laid out the way v21 and v22 exporters did.
    fn legacy_region(version: u32) -> PackedRegion {
        let split = version >= 22;
        let mut w = PackedWriter::new();

        for count in [1, 1, 0, 1, 0] {
            w.push_i32(count); // nodes, objects, decals, sub-shapes, IFL
        }
        if split {
            w.zeros32(5);
        } else {
            w.push_i32(1); // node states, nodes included
        }
        for count in [1, 0, 0, 1, 1] {
            w.push_i32(count); // object states, decal states, triggers, details, meshes
        }
        w.push_i32(if split { 1 } else { 0 }); // skins
        w.push_i32(3); // names
        w.push_i32(2);
        w.push_i32(0);
        w.write_guard();

        w.push_f32(1.5);
        w.push_f32(0.5);
        w.extend32(&[Vec3::ZERO]);
        w.extend32(&[Box3F::new(Vec3::ZERO, Vec3::ONE)]);
        w.write_guard();

        w.extend32(&[Node::new(0, -1)]);
        w.write_guard();
        w.extend32(&[Object { name_index: 1, ..object(0, 1) }]);
        w.write_guard();
        w.write_guard();
        w.write_guard();
        w.extend32(&[0i32, 0, 0]);
        w.write_guard();
        w.extend32(&[1i32, 1, 0]);
        w.write_guard();

        w.extend16(&[Quat16::IDENTITY]);
        w.extend32(&[Vec3::new(0.0, 0.0, 2.0)]);
        w.write_guard();
        if split {
            w.write_guard();
        }

        w.extend32(&[ObjectState { vis: 1.0, frame_index: 0, mat_frame_index: 0 }]);
        w.write_guard();
        w.write_guard();
        w.write_guard();
        w.extend32(&[Detail {
            name_index: 2,
            sub_shape_num: 0,
            object_detail_num: 0,
            size: 2.0,
            average_error: 0.0,
            max_error: 0.0,
            poly_count: 2,
        }]);
        w.write_guard();

        w.push_u32(MeshType::Standard.tag());
        if split {
            disassemble_mesh(&mut w, &crate::packed::Arena::default(), &Mesh::Standard(quad_mesh())).unwrap();
        } else {
            // no codebook normals before v22
            let m = quad_mesh();
            w.write_guard();
            w.push_i32(1);
            w.push_i32(1);
            w.push_i32(-1);
            w.extend32(&[Box3F::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0))]);
            w.extend32(&[Vec3::new(0.5, 0.5, 0.0)]);
            w.push_i32(0);
            let Array::Owned(verts) = &m.verts else { unreachable!() };
            let Array::Owned(tverts) = &m.tverts else { unreachable!() };
            w.push_count(4);
            w.extend32(verts);
            w.push_count(4);
            w.extend32(tverts);
            w.extend32(&[Vec3::Z; 4]);
            w.push_count(1);
            w.push_u16(0);
            w.push_u16(6);
            w.push_u32(m.primitives[0].mat_index);
            w.push_count(6);
            for i in [0u16, 1, 2, 0, 2, 3] {
                w.push_u16(i);
            }
            w.push_i32(0);
            w.push_i32(4);
            w.push_u32(0);
            w.write_guard();
        }
        w.write_guard();

        w.extend8(b"root\0quad\0detail2\0");
        w.write_guard();

        // per-detail skin tables, then the skins themselves
        w.push_i32(0);
        w.push_i32(if split { 1 } else { 0 });
        w.write_guard();
        if split {
            let skin = SkinMesh {
                initial_verts: vec![Vec3::X, Vec3::Y].into(),
                initial_norms: vec![Vec3::Z; 2].into(),
                initial_transforms: vec![MatrixF::IDENTITY].into(),
                vertex_index: vec![0, 1].into(),
                bone_index: vec![0, 0].into(),
                weight: vec![1.0, 1.0].into(),
                node_index: vec![0].into(),
                ..Default::default()
            };
            disassemble_mesh(&mut w, &crate::packed::Arena::default(), &Mesh::Skin(skin)).unwrap();
        }
        w.write_guard();
        w.finish()
    }

    #[test]
    fn test_legacy_v21() {
        let region = legacy_region(21);
        let m = assemble(&region, Version(21), &DecodeOptions::default()).unwrap();
        assert_eq!(m.names, ["root", "quad", "detail2"]);
        assert!(m.node_rotations.is_empty());
        assert_eq!(m.radius, 1.5);
        assert_eq!(m.default_translations().unwrap()[0], Vec3::new(0.0, 0.0, 2.0));

        let mesh = m.meshes[0].as_ref().unwrap().base();
        assert_eq!(m.resolve(&mesh.norms).unwrap().len(), 4);
        assert!(mesh.encoded_norms.is_empty());
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);

        // zero error metrics are reset
        let details = m.details().unwrap();
        assert_eq!((details[0].average_error, details[0].max_error), (-1.0, -1.0));
        assert_eq!(m.smallest_visible_dl, 0);

        // re-encoding upgrades to the current layout, with normals encoded
        let back = Model::decode(&m.encode().unwrap()).unwrap();
        let mesh = back.meshes[0].as_ref().unwrap().base();
        assert_eq!(back.resolve(&mesh.encoded_norms).unwrap().len(), 4);
    }

    #[test]
    fn test_legacy_v22_skins_appended() {
        let region = legacy_region(22);
        let m = assemble(&region, Version(22), &DecodeOptions::default()).unwrap();
        assert_eq!(m.meshes.len(), 2);
        let Some(Mesh::Skin(skin)) = &m.meshes[1] else { panic!("expected appended skin") };
        assert_eq!(&*m.resolve(&skin.weight).unwrap(), &[1.0, 1.0]);
        assert_eq!(&*m.resolve(&skin.initial_verts).unwrap(), &[Vec3::X, Vec3::Y]);
    }

    #[test]
    fn test_skip_details_drops_mesh() {
        let region = legacy_region(22);
        let options = DecodeOptions { skip_details: 1, ..Default::default() };
        let full = assemble(&region, Version(22), &DecodeOptions::default()).unwrap();
        let m = assemble(&region, Version(22), &options).unwrap();
        assert!(m.meshes[0].is_none());
        assert!(m.arena.len() < full.arena.len());
    }

    #[test]
    fn test_final_only_checkpoints_agree() {
        let region = legacy_region(22);
        let options = DecodeOptions { checkpoints: crate::packed::CheckpointPolicy::FinalOnly, ..Default::default() };
        let a = assemble(&region, Version(22), &options).unwrap();
        let b = assemble(&region, Version(22), &DecodeOptions::default()).unwrap();
        assert_eq!(a.arena, b.arena);
    }

    #[test]
    fn test_oversized_skin_count_rejected() {
        let mut region = legacy_region(22);
        // counts: five entity, five track, five state/detail/mesh, then skins
        assert_eq!(region.words[15], 1);
        region.words[15] = 0x7fff_ffff;
        let err = assemble(&region, Version(22), &DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, Error::TruncatedStream { what: "mesh list", .. }), "{err}");
    }

    #[test]
    fn test_wrong_version_rejected() {
        // a v22 region read as v24 is misaligned from the ground-frame count on
        let region = legacy_region(22);
        assert!(assemble(&region, Version(24), &DecodeOptions::default()).is_err());
    }
}
