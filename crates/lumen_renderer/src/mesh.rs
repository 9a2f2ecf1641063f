//! Triangle meshes.
//!
//! [`MeshData`] is the indexed vertex representation handed over by asset
//! loaders; [`Mesh`] is the intersectable form with its own triangle BVH.

use crate::bvh::Bvh;
use crate::hittable::{Hittable, LocalHit};
use crate::Triangle;
use lumen_math::{Aabb, Interval, Ray, Vec2, Vec3};

/// A mesh consisting of vertex positions, optional normals and uvs, and triangle indices.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Vertex normals (optional - flat shading when absent)
    pub normals: Option<Vec<Vec3>>,

    /// UV coordinates (optional - one per vertex)
    pub uvs: Option<Vec<Vec2>>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Create a new mesh from positions and indices.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            normals: None,
            uvs: None,
            indices,
        }
    }

    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_uvs(mut self, uvs: Vec<Vec2>) -> Self {
        self.uvs = Some(uvs);
        self
    }

    /// Number of index triples.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Compute smooth vertex normals by averaging face normals.
    ///
    /// Each vertex normal is the normalized, area-weighted average of the
    /// normals of all faces sharing that vertex.
    pub fn compute_normals(&mut self) {
        let vertex_count = self.positions.len();
        let mut normals = vec![Vec3::ZERO; vertex_count];

        for face in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [face[0] as usize, face[1] as usize, face[2] as usize];
            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }

            let p0 = self.positions[i0];
            let face_normal = (self.positions[i1] - p0).cross(self.positions[i2] - p0);

            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        for normal in &mut normals {
            *normal = normal.normalize_or_zero();
        }

        self.normals = Some(normals);
    }

    /// Turn the index triples into triangles.
    ///
    /// Triples with out-of-range indices or no area are skipped.
    pub fn triangles(&self) -> Vec<Triangle> {
        let vertex_count = self.positions.len();
        let normals = self
            .normals
            .as_ref()
            .filter(|n| n.len() == vertex_count);
        let uvs = self.uvs.as_ref().filter(|uv| uv.len() == vertex_count);

        let mut triangles = Vec::with_capacity(self.triangle_count());
        let mut skipped = 0;

        for face in self.indices.chunks_exact(3) {
            let idx = [face[0] as usize, face[1] as usize, face[2] as usize];
            if idx.iter().any(|&i| i >= vertex_count) {
                skipped += 1;
                continue;
            }

            let mut triangle = Triangle::new(
                self.positions[idx[0]],
                self.positions[idx[1]],
                self.positions[idx[2]],
            );
            if triangle.is_degenerate() {
                skipped += 1;
                continue;
            }
            if let Some(normals) = normals {
                triangle = triangle.with_vertex_normals(idx.map(|i| normals[i]));
            }
            if let Some(uvs) = uvs {
                triangle = triangle.with_uvs(idx.map(|i| uvs[i]));
            }
            triangles.push(triangle);
        }

        if skipped > 0 {
            log::warn!(
                "Skipped {} invalid or degenerate triangles out of {}",
                skipped,
                self.triangle_count()
            );
        }

        triangles
    }
}

/// An intersectable triangle mesh in object space.
pub struct Mesh {
    bvh: Bvh<Triangle>,
}

impl Mesh {
    pub fn new(data: &MeshData) -> Self {
        Self::from_triangles(data.triangles())
    }

    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        let bvh = Bvh::new(triangles);
        log::debug!(
            "Built mesh BVH: {} triangles, {} nodes, depth {}",
            bvh.len(),
            bvh.node_count(),
            bvh.depth()
        );
        Self { bvh }
    }

    /// Triangles in BVH order; `LocalHit::triangle` indexes this slice.
    pub fn triangles(&self) -> &[Triangle] {
        self.bvh.items()
    }

    pub fn triangle_count(&self) -> usize {
        self.bvh.len()
    }
}

impl std::fmt::Debug for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("triangles", &self.bvh.len())
            .field("bvh_nodes", &self.bvh.node_count())
            .finish()
    }
}

impl From<MeshData> for Mesh {
    fn from(data: MeshData) -> Self {
        Self::new(&data)
    }
}

impl Hittable for Mesh {
    type Hit = LocalHit;

    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<LocalHit> {
        let (index, hit) = self.bvh.intersect_nearest(ray, ray_t)?;
        Some(self.bvh.items()[index].local_hit(&hit, index))
    }

    fn bounding_box(&self) -> Aabb {
        self.bvh.bounding_box()
    }
}
