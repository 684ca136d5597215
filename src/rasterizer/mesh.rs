//! Indexed triangle meshes
//!
//! Vertex and index buffers consumed by `RenderContext::draw_mesh`, plus a
//! Wavefront OBJ reader and a couple of built-in shapes.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use super::math::{Vec2, Vec3, Vec4};
use super::vertex::Vertex;

/// Error type for mesh loading
#[derive(Debug)]
pub enum MeshError {
    IoError(std::io::Error),
    ParseError { line: usize, message: String },
    IndexOutOfRange { triangle: usize, index: u32, vertex_count: usize },
}

impl From<std::io::Error> for MeshError {
    fn from(e: std::io::Error) -> Self {
        MeshError::IoError(e)
    }
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshError::IoError(e) => write!(f, "IO error: {}", e),
            MeshError::ParseError { line, message } => write!(f, "Parse error on line {}: {}", line, message),
            MeshError::IndexOutOfRange { triangle, index, vertex_count } => write!(
                f,
                "Triangle {} references vertex {} but mesh has {} vertices",
                triangle, index, vertex_count
            ),
        }
    }
}

impl std::error::Error for MeshError {}

/// Vertex buffer plus one index triple per triangle
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    triangles: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, triangles: Vec<[u32; 3]>) -> Result<Self, MeshError> {
        for (triangle, face) in triangles.iter().enumerate() {
            if let Some(&index) = face.iter().find(|&&i| i as usize >= vertices.len()) {
                return Err(MeshError::IndexOutOfRange {
                    triangle,
                    index,
                    vertex_count: vertices.len(),
                });
            }
        }
        Ok(Self { vertices, triangles })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Load a Wavefront OBJ file
    pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Self, MeshError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let mesh = Self::from_obj_str(&contents)?;
        log::info!(
            "Loaded mesh: {} ({} vertices, {} triangles)",
            path.display(),
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        Ok(mesh)
    }

    /// Parse OBJ text. Polygons are fan-triangulated; identical
    /// position/uv/normal combinations share one vertex.
    pub fn from_obj_str(source: &str) -> Result<Self, MeshError> {
        let mut positions: Vec<Vec4> = Vec::new();
        let mut tex_coords: Vec<Vec2> = Vec::new();
        let mut normals: Vec<Vec3> = Vec::new();

        let mut vertices = Vec::new();
        let mut triangles = Vec::new();
        let mut lookup: HashMap<(usize, Option<usize>, Option<usize>), u32> = HashMap::new();

        for (line_idx, raw) in source.lines().enumerate() {
            let line = line_idx + 1;
            let raw = raw.split('#').next().unwrap_or("");
            let mut tokens = raw.split_whitespace();
            let Some(cmd) = tokens.next() else {
                continue;
            };

            match cmd {
                "v" => {
                    let f = parse_floats(tokens, line, 3)?;
                    let w = f.get(3).copied().unwrap_or(1.0);
                    positions.push(Vec4::new(f[0], f[1], f[2], w));
                }
                "vt" => {
                    let f = parse_floats(tokens, line, 1)?;
                    // OBJ v points up, texture rows run top-down
                    let v = f.get(1).copied().unwrap_or(0.0);
                    tex_coords.push(Vec2::new(f[0], 1.0 - v));
                }
                "vn" => {
                    let f = parse_floats(tokens, line, 3)?;
                    normals.push(Vec3::new(f[0], f[1], f[2]).normalize());
                }
                "f" => {
                    let mut face = Vec::new();
                    for token in tokens {
                        let key = parse_face_vertex(token, line, positions.len(), tex_coords.len(), normals.len())?;
                        let index = *lookup.entry(key).or_insert_with(|| {
                            let (p, t, n) = key;
                            vertices.push(Vertex {
                                position: positions[p],
                                color: Vec4::ONE,
                                tex_coord: t.map(|t| tex_coords[t]).unwrap_or(Vec2::ZERO),
                                normal: n.map(|n| normals[n]).unwrap_or(Vec3::ZERO),
                            });
                            (vertices.len() - 1) as u32
                        });
                        face.push(index);
                    }
                    if face.len() < 3 {
                        return Err(MeshError::ParseError {
                            line,
                            message: format!("face needs at least 3 vertices, got {}", face.len()),
                        });
                    }
                    for k in 1..face.len() - 1 {
                        triangles.push([face[0], face[k], face[k + 1]]);
                    }
                }
                // Groups, materials, smoothing etc. don't affect geometry
                _ => {}
            }
        }

        Self::new(vertices, triangles)
    }

    /// Unit quad in the XY plane, counter-clockwise, with UVs and corner colors
    pub fn quad() -> Self {
        let corners = [
            (Vec4::new(-1.0, -1.0, 0.0, 1.0), Vec2::new(0.0, 1.0), Vec4::rgb(1.0, 0.0, 0.0)),
            (Vec4::new(1.0, -1.0, 0.0, 1.0), Vec2::new(1.0, 1.0), Vec4::rgb(0.0, 1.0, 1.0)),
            (Vec4::new(1.0, 1.0, 0.0, 1.0), Vec2::new(1.0, 0.0), Vec4::rgb(0.0, 0.0, 1.0)),
            (Vec4::new(-1.0, 1.0, 0.0, 1.0), Vec2::new(0.0, 0.0), Vec4::rgb(1.0, 1.0, 0.0)),
        ];
        let vertices = corners
            .iter()
            .map(|&(position, tex_coord, color)| Vertex::new(position, color, tex_coord, Vec3::new(0.0, 0.0, 1.0)))
            .collect();
        Self {
            vertices,
            triangles: vec![[0, 1, 2], [0, 2, 3]],
        }
    }

    /// Cube from -1 to 1 with per-face normals and UVs
    pub fn cube() -> Self {
        let mut vertices = Vec::new();
        let mut triangles = Vec::new();

        let positions = [
            // Front face
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
            // Back face
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            // Top face
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(-1.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, -1.0),
            // Bottom face
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            // Right face
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            // Left face
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.0, -1.0),
        ];

        let normals = [
            Vec3::new(0.0, 0.0, 1.0),  // Front
            Vec3::new(0.0, 0.0, -1.0), // Back
            Vec3::new(0.0, 1.0, 0.0),  // Top
            Vec3::new(0.0, -1.0, 0.0), // Bottom
            Vec3::new(1.0, 0.0, 0.0),  // Right
            Vec3::new(-1.0, 0.0, 0.0), // Left
        ];

        let uvs = [
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 0.0),
        ];

        for (face_idx, normal) in normals.iter().enumerate() {
            let base = face_idx * 4;
            for i in 0..4 {
                vertices.push(Vertex::new(positions[base + i].extend(1.0), Vec4::ONE, uvs[i], *normal));
            }

            // Two triangles per face
            let vbase = base as u32;
            triangles.push([vbase, vbase + 1, vbase + 2]);
            triangles.push([vbase, vbase + 2, vbase + 3]);
        }

        Self { vertices, triangles }
    }
}

fn parse_floats<'a>(tokens: impl Iterator<Item = &'a str>, line: usize, required: usize) -> Result<Vec<f32>, MeshError> {
    let values = tokens
        .map(|t| {
            t.parse::<f32>().map_err(|e| MeshError::ParseError {
                line,
                message: format!("bad number '{}': {}", t, e),
            })
        })
        .collect::<Result<Vec<f32>, MeshError>>()?;

    if values.len() < required {
        return Err(MeshError::ParseError {
            line,
            message: format!("expected at least {} values, got {}", required, values.len()),
        });
    }
    Ok(values)
}

/// Resolve a 1-based (or negative, relative) OBJ index
fn resolve_index(token: &str, count: usize, line: usize) -> Result<usize, MeshError> {
    let err = |message: String| MeshError::ParseError { line, message };
    let raw: i64 = token
        .parse()
        .map_err(|_| err(format!("bad index '{}'", token)))?;

    let resolved = if raw > 0 {
        raw - 1
    } else if raw < 0 {
        count as i64 + raw
    } else {
        return Err(err("index 0 is not valid".to_string()));
    };

    if resolved < 0 || resolved as usize >= count {
        return Err(err(format!("index {} out of range ({} defined)", raw, count)));
    }
    Ok(resolved as usize)
}

/// `v`, `v/vt`, `v//vn` or `v/vt/vn`
fn parse_face_vertex(
    token: &str,
    line: usize,
    positions: usize,
    tex_coords: usize,
    normals: usize,
) -> Result<(usize, Option<usize>, Option<usize>), MeshError> {
    let mut parts = token.split('/');
    let position = resolve_index(parts.next().unwrap_or(""), positions, line)?;
    let tex_coord = match parts.next() {
        Some(t) if !t.is_empty() => Some(resolve_index(t, tex_coords, line)?),
        _ => None,
    };
    let normal = match parts.next() {
        Some(n) if !n.is_empty() => Some(resolve_index(n, normals, line)?),
        _ => None,
    };
    Ok((position, tex_coord, normal))
}
