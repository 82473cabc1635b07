//! Name, node, object and detail queries plus the small edits that keep the
//! detail table consistent.

use super::{Detail, Model};
use crate::util::{Error, Mat4, Result};

impl Model {
    /// Index of `name` in the name table.
    pub fn find_name(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Index of the node called `name`.
    pub fn find_node(&self, name: &str) -> Result<Option<usize>> {
        let Some(name_index) = self.find_name(name) else {
            return Ok(None);
        };
        Ok(self.nodes()?.iter().position(|n| n.name_index == name_index as i32))
    }

    /// Index of the object called `name`.
    pub fn find_object(&self, name: &str) -> Result<Option<usize>> {
        let Some(name_index) = self.find_name(name) else {
            return Ok(None);
        };
        Ok(self.objects()?.iter().position(|o| o.name_index == name_index as i32))
    }

    /// Sub-shape whose node range contains `node`.
    pub fn sub_shape_for_node(&self, node: usize) -> Result<Option<usize>> {
        let first = self.resolve(&self.sub_shape_first_node)?;
        let count = self.resolve(&self.sub_shape_num_nodes)?;
        Ok(sub_shape_containing(&first, &count, node))
    }

    /// Sub-shape whose object range contains `object`.
    pub fn sub_shape_for_object(&self, object: usize) -> Result<Option<usize>> {
        let first = self.resolve(&self.sub_shape_first_object)?;
        let count = self.resolve(&self.sub_shape_num_objects)?;
        Ok(sub_shape_containing(&first, &count, object))
    }

    /// Details that draw `sub_shape`, including those drawing every sub-shape.
    pub fn sub_shape_details(&self, sub_shape: usize) -> Result<Vec<usize>> {
        Ok(self
            .details()?
            .iter()
            .enumerate()
            .filter(|(_, d)| d.sub_shape_num < 0 || d.sub_shape_num as usize == sub_shape)
            .map(|(i, _)| i)
            .collect())
    }

    /// Rest-pose transform of a node in shape space; `None` is the shape root.
    pub fn node_world_transform(&self, node: Option<usize>) -> Result<Mat4> {
        let Some(mut index) = node else {
            return Ok(Mat4::IDENTITY);
        };
        let nodes = self.nodes()?;
        let rotations = self.default_rotations()?;
        let translations = self.default_translations()?;

        let mut world = Mat4::IDENTITY;
        for _ in 0..nodes.len() {
            let count = nodes.len();
            let (Some(node), Some(rot), Some(pos)) =
                (nodes.get(index), rotations.get(index), translations.get(index))
            else {
                return Err(Error::IndexOutOfBounds { index, count });
            };
            let local = Mat4::from_rotation_translation(rot.to_quat().normalize(), *pos);
            world = local * world;
            match usize::try_from(node.parent_index) {
                Ok(parent) => index = parent,
                Err(_) => return Ok(world),
            }
        }
        Err(Error::invalid(format!("node hierarchy above node {index} has a cycle")))
    }

    /// Add `name` to the name table unless present; empty names are refused.
    pub fn add_name(&mut self, name: &str) -> Option<usize> {
        if name.is_empty() {
            return None;
        }
        Some(self.find_name(name).unwrap_or_else(|| {
            self.names.push(name.to_owned());
            self.names.len() - 1
        }))
    }

    /// Add a detail level named `name` followed by its size.
    ///
    /// The table stays sorted by descending size and the object detail
    /// numbers of smaller levels are shifted. Returns the detail's index,
    /// which is the existing one when an identical level is already present.
    pub fn add_detail(&mut self, name: &str, size: i32, sub_shape: i32) -> Result<usize> {
        let name_index = self.add_name(&format!("{name}{size}")).map_or(-1, |i| i as i32);
        let details = self.arena.make_mut(&mut self.details)?;
        let size = size as f32;

        let mut index = 0;
        while let Some(d) = details.get(index) {
            if d.size == size && d.sub_shape_num == sub_shape && d.name_index == name_index {
                return Ok(index);
            }
            if d.size < size {
                break;
            }
            index += 1;
        }

        details.insert(
            index,
            Detail {
                name_index,
                sub_shape_num: sub_shape,
                object_detail_num: 0,
                size,
                average_error: -1.0,
                max_error: -1.0,
                poly_count: 0,
            },
        );
        for d in &mut details[index + 1..] {
            if d.sub_shape_num >= 0 && (sub_shape == -1 || d.sub_shape_num == sub_shape) {
                d.object_detail_num += 1;
            }
        }

        self.update_smallest_visible_detail()?;
        Ok(index)
    }

    /// Recompute the smallest visible detail from the detail table.
    pub fn update_smallest_visible_detail(&mut self) -> Result<()> {
        let mut dl = -1;
        let mut smallest = f32::MAX;
        for (i, d) in self.details()?.iter().enumerate() {
            if d.size >= 0.0 && d.size < smallest {
                dl = i as i32;
                smallest = d.size;
            }
        }
        self.smallest_visible_dl = dl;
        self.smallest_visible_size = smallest;
        Ok(())
    }
}

fn sub_shape_containing(first: &[i32], count: &[i32], index: usize) -> Option<usize> {
    let index = index as i64;
    first
        .iter()
        .zip(count)
        .position(|(&start, &n)| (start as i64..start as i64 + n as i64).contains(&index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Node, Object};
    use crate::util::{Quat, Quat16, Vec3};

    fn chain() -> Model {
        let mut m = Model::new();
        let root = m.add_name("root").unwrap() as i32;
        let arm = m.add_name("arm").unwrap() as i32;
        m.nodes = vec![Node::new(root, -1), Node::new(arm, 0)].into();
        m.default_rotations = vec![
            Quat16::from_quat(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2)),
            Quat16::IDENTITY,
        ]
        .into();
        m.default_translations = vec![Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0)].into();
        m.sub_shape_first_node = vec![0].into();
        m.sub_shape_num_nodes = vec![2].into();
        m.sub_shape_first_object = vec![0].into();
        m.sub_shape_num_objects = vec![1].into();
        m.objects = vec![Object {
            name_index: arm,
            num_meshes: 0,
            start_mesh_index: 0,
            node_index: 1,
            next_sibling: -1,
            first_decal: -1,
        }]
        .into();
        m
    }

    #[test]
    fn test_find() {
        let m = chain();
        assert_eq!(m.find_name("arm"), Some(1));
        assert_eq!(m.find_node("arm").unwrap(), Some(1));
        assert_eq!(m.find_node("leg").unwrap(), None);
        assert_eq!(m.find_object("arm").unwrap(), Some(0));
        assert_eq!(m.sub_shape_for_node(1).unwrap(), Some(0));
        assert_eq!(m.sub_shape_for_node(2).unwrap(), None);
        assert_eq!(m.sub_shape_for_object(0).unwrap(), Some(0));
    }

    #[test]
    fn test_add_name_dedupes() {
        let mut m = chain();
        assert_eq!(m.add_name("root"), Some(0));
        assert_eq!(m.add_name(""), None);
        assert_eq!(m.add_name("leg"), Some(2));
    }

    #[test]
    fn test_world_transform() {
        let m = chain();
        assert_eq!(m.node_world_transform(None).unwrap(), Mat4::IDENTITY);
        let p = m.node_world_transform(Some(1)).unwrap().transform_point3(Vec3::ZERO);
        // the root turns the arm's offset from +X onto +Y
        assert!((p - Vec3::new(0.0, 1.0, 1.0)).length() < 1e-3, "{p:?}");
    }

    #[test]
    fn test_cycle_detected() {
        let mut m = chain();
        m.nodes = vec![Node::new(0, 1), Node::new(1, 0)].into();
        assert!(matches!(m.node_world_transform(Some(0)), Err(Error::InvalidStructure(_))));
    }

    #[test]
    fn test_add_detail_keeps_order() {
        let mut m = chain();
        assert_eq!(m.add_detail("detail", 2, 0).unwrap(), 0);
        assert_eq!(m.add_detail("detail", 8, 0).unwrap(), 0);
        assert_eq!(m.add_detail("detail", 4, 0).unwrap(), 1);
        assert_eq!(m.add_detail("detail", 4, 0).unwrap(), 1);

        let details = m.details().unwrap();
        let sizes: Vec<f32> = details.iter().map(|d| d.size).collect();
        assert_eq!(sizes, [8.0, 4.0, 2.0]);
        let numbers: Vec<i32> = details.iter().map(|d| d.object_detail_num).collect();
        assert_eq!(numbers, [0, 0, 2]);
        assert_eq!(m.name(details[1].name_index), Some("detail4"));
        drop(details);

        assert_eq!(m.smallest_visible_dl, 2);
        assert_eq!(m.smallest_visible_size, 2.0);
        assert_eq!(m.sub_shape_details(0).unwrap(), vec![0, 1, 2]);
        assert!(m.sub_shape_details(1).unwrap().is_empty());
    }
}
