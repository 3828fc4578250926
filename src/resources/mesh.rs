//! Triangle meshes for the path tracer.
//!
//! The fragment shader cannot take vertex buffers, so the mesh travels as a
//! data texture instead: one row of face indices, one row of vertex
//! positions, one row of vertex normals, three bytes per texel. The shader
//! walks the index row and fetches positions and normals by column, which
//! keeps the addressing to a single texture coordinate per lookup.
//!
//! Index bytes limit a mesh to 256 vertices, so this fits small props, not
//! scanned assets.

use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;

use cgmath::{InnerSpace, Vector3, Zero};
use log::warn;

use crate::error::{RenderError, Result};

/// A triangle mesh in the layout the sampler packing expects: flat `x y z`
/// position and normal arrays plus a flat index list, three indices per face.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn num_triangles(&self) -> u32 {
        (self.indices.len() / 3) as u32
    }

    /// Parse OBJ text. Normals are taken from the file when present and
    /// accumulated from face planes otherwise.
    pub fn from_obj_text(text: &str) -> Result<Self> {
        Self::from_obj_reader(&mut BufReader::new(Cursor::new(text)))
    }

    pub fn from_obj_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| RenderError::MeshLoad(e.to_string()))?;
        Self::from_obj_reader(&mut BufReader::new(file))
    }

    fn from_obj_reader(reader: &mut impl BufRead) -> Result<Self> {
        let (models, _) = tobj::load_obj_buf(
            reader,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
            // Materials come from scene uniforms, not from .mtl files.
            |_| Ok((Vec::new(), Default::default())),
        )
        .map_err(|e| RenderError::MeshLoad(e.to_string()))?;

        let model = models
            .into_iter()
            .next()
            .ok_or_else(|| RenderError::MeshLoad("OBJ source contains no models".to_owned()))?;

        let mut mesh = Self {
            positions: model.mesh.positions,
            normals: model.mesh.normals,
            indices: model.mesh.indices,
        };
        if mesh.normals.is_empty() {
            warn!("mesh has no normals, accumulating them from face planes");
            mesh.normals = face_normals(&mesh.positions, &mesh.indices);
        }
        Ok(mesh)
    }
}

fn face_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let vertex = |i: u32| {
        let i = i as usize * 3;
        Vector3::new(positions[i], positions[i + 1], positions[i + 2])
    };
    let mut normals = vec![Vector3::<f32>::zero(); positions.len() / 3];
    for face in indices.chunks_exact(3) {
        let (a, b, c) = (vertex(face[0]), vertex(face[1]), vertex(face[2]));
        let n = (b - a).cross(c - a);
        for &i in face {
            normals[i as usize] += n;
        }
    }
    normals
        .into_iter()
        .flat_map(|n| {
            let n = if n.is_zero() { n } else { n.normalize() };
            [n.x, n.y, n.z]
        })
        .collect()
}

/// Pack `mesh` into RGB bytes for a `sampler_width` x `sampler_height` data
/// texture: row 0 face indices, row 1 vertex positions, row 2 normals scaled
/// by 127. Each array must fit its row, and the sampler needs at least the
/// three rows; otherwise [`RenderError::MeshTooLarge`] is returned and no
/// texture is touched.
pub fn pack_mesh(mesh: &MeshData, sampler_width: u32, sampler_height: u32) -> Result<Vec<u8>> {
    let capacity = if sampler_height < 3 {
        0
    } else {
        3 * sampler_width as usize
    };
    let len = mesh
        .indices
        .len()
        .max(mesh.positions.len())
        .max(mesh.normals.len());
    if len > capacity {
        return Err(RenderError::MeshTooLarge { len, capacity });
    }

    // JS-typed-array value semantics: truncate toward zero, wrap mod 256.
    // Negative normal components end up as their two's-complement byte; the
    // shader undoes this when decoding.
    let byte = |v: f32| (v as i32) as u8;

    let row = sampler_width as usize * 3;
    let mut res = vec![0u8; row * sampler_height as usize];
    for (i, &index) in mesh.indices.iter().enumerate() {
        res[i] = index as u8;
    }
    for (i, &p) in mesh.positions.iter().enumerate() {
        res[row + i] = byte(p);
    }
    for (i, &n) in mesh.normals.iter().enumerate() {
        res[2 * row + i] = byte(n * 127.0);
    }
    Ok(res)
}
