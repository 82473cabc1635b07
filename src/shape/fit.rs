//! Collision primitive fitting.
//!
//! The fitting algorithms themselves live outside this crate. A
//! [`PrimitiveFitter`] receives the point cloud of one mesh and returns the
//! best-fit primitive; [`Model::fit_mesh`] gathers the points.

use std::f32::consts::PI;

use super::Model;
use crate::mesh::Mesh;
use crate::util::{Error, Mat4, Result, Vec3};

/// Oriented box: `sides` are full extents along the transform's axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitBox {
    pub transform: Mat4,
    pub sides: Vec3,
}

impl FitBox {
    pub fn volume(&self) -> f32 {
        self.sides.x * self.sides.y * self.sides.z
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl FitSphere {
    pub fn volume(&self) -> f32 {
        4.0 / 3.0 * PI * self.radius.powi(3)
    }
}

/// Capsule along the transform's Y axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitCapsule {
    pub transform: Mat4,
    pub radius: f32,
    pub height: f32,
}

impl FitCapsule {
    pub fn volume(&self) -> f32 {
        2.0 * PI * self.radius.powi(2) * (4.0 / 3.0 * self.radius + self.height)
    }
}

/// Convex hull as a triangle list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FitHull {
    pub points: Vec<Vec3>,
    pub indices: Vec<u32>,
}

/// Which primitive to fit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FitKind {
    Box,
    Sphere,
    Capsule,
    Hull,
}

/// A fitted primitive.
#[derive(Clone, Debug, PartialEq)]
pub enum Fit {
    Box(FitBox),
    Sphere(FitSphere),
    Capsule(FitCapsule),
    Hull(FitHull),
}

/// Best-fit algorithms over a point cloud.
pub trait PrimitiveFitter {
    fn fit_box(&self, points: &[Vec3]) -> Result<FitBox>;
    fn fit_sphere(&self, points: &[Vec3]) -> Result<FitSphere>;
    fn fit_capsule(&self, points: &[Vec3]) -> Result<FitCapsule>;
    fn fit_hull(&self, points: &[Vec3]) -> Result<FitHull>;
}

impl Model {
    /// First-frame vertices of mesh slot `index`.
    ///
    /// Skinned meshes contribute their bind pose.
    pub fn mesh_points(&self, index: usize) -> Result<Vec<Vec3>> {
        let count = self.meshes.len();
        let mesh = self
            .meshes
            .get(index)
            .ok_or(Error::IndexOutOfBounds { index, count })?
            .as_ref()
            .ok_or_else(|| Error::invalid(format!("mesh slot {index} is empty")))?;

        let verts = match mesh {
            Mesh::Skin(skin) => self.resolve(&skin.initial_verts)?,
            _ => self.resolve(&mesh.base().verts)?,
        };
        let per_frame = usize::try_from(mesh.base().verts_per_frame).unwrap_or(0);
        let n = if per_frame > 0 { per_frame.min(verts.len()) } else { verts.len() };
        Ok(verts[..n].to_vec())
    }

    /// Fit a collision primitive around mesh slot `index`.
    pub fn fit_mesh<F: PrimitiveFitter + ?Sized>(&self, index: usize, kind: FitKind, fitter: &F) -> Result<Fit> {
        let points = self.mesh_points(index)?;
        if points.is_empty() {
            return Err(Error::invalid(format!("mesh slot {index} has no vertices")));
        }
        Ok(match kind {
            FitKind::Box => Fit::Box(fitter.fit_box(&points)?),
            FitKind::Sphere => Fit::Sphere(fitter.fit_sphere(&points)?),
            FitKind::Capsule => Fit::Capsule(fitter.fit_capsule(&points)?),
            FitKind::Hull => Fit::Hull(fitter.fit_hull(&points)?),
        })
    }
}
