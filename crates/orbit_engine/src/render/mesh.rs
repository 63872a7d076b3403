//! Mesh construction from parsed geometry
//!
//! Shared vertices are expanded so every face corner owns its own position and
//! normal; the index buffer is then the sequence `0..n`. Buffers are laid out
//! as: buffer 0 positions, buffer 1 normals (when present).

use crate::assets::GeometryFile;
use crate::render::buffer::{BufferError, GpuBuffer};
use crate::render::gl::{BufferTarget, BufferUsage, GlContext, PrimitiveMode, ValueKind};
use thiserror::Error;

/// Largest index count addressable with 16-bit indices
pub const MAX_INDEX_COUNT: usize = u16::MAX as usize;

/// Mesh initialization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// No positions or no position indices
    #[error("{0}: geometry has no positions or no faces")]
    MissingGeometry(String),

    /// Position and normal index streams differ in length
    #[error("{name}: {positions} position indices but {normals} normal indices")]
    IndexCountMismatch {
        /// Source name
        name: String,
        /// Position index count
        positions: usize,
        /// Normal index count
        normals: usize,
    },

    /// More face corners than 16-bit indices can address
    #[error("{name}: {count} indices exceed the 16-bit limit of 65535")]
    TooManyIndices {
        /// Source name
        name: String,
        /// Index count
        count: usize,
    },

    /// A face index points past its component array
    #[error("{name}: face corner {corner} references {stream} {index} of {available}")]
    IndexOutOfRange {
        /// Source name
        name: String,
        /// Which stream: "position" or "normal"
        stream: &'static str,
        /// Face corner number
        corner: usize,
        /// 0-based index
        index: u16,
        /// Number of available entries
        available: usize,
    },

    /// Buffer allocation failed
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// Progress sink for long loads
///
/// Receives the total number of work units once, then one call per finished unit.
pub trait StepLoadListener {
    /// Add `count` units to the expected total
    fn add_units(&self, count: usize);
    /// One unit finished
    fn unit_done(&self);
}

/// Expanded per-corner vertex data
#[derive(Debug, Clone, PartialEq)]
pub struct Deindexed {
    /// Position components, three per corner
    pub positions: Vec<f32>,
    /// Normal components, three per corner, when the geometry carries normals
    pub normals: Option<Vec<f32>>,
    /// Sequential indices `0..n`
    pub indices: Vec<u16>,
}

impl Deindexed {
    /// Number of expanded vertices
    pub fn vertex_count(&self) -> usize {
        self.indices.len()
    }
}

fn gather(
    source: &[f32],
    index: u16,
    stream: &'static str,
    corner: usize,
    name: &str,
) -> Result<[f32; 3], MeshError> {
    let start = usize::from(index) * 3;
    source
        .get(start..start + 3)
        .map(|triple| [triple[0], triple[1], triple[2]])
        .ok_or_else(|| MeshError::IndexOutOfRange {
            name: name.to_string(),
            stream,
            corner,
            index,
            available: source.len() / 3,
        })
}

/// Expand indexed geometry into one vertex per face corner
pub fn deindex(
    geometry: &GeometryFile,
    listener: Option<&dyn StepLoadListener>,
) -> Result<Deindexed, MeshError> {
    let name = &geometry.name;
    if geometry.positions.is_empty() || geometry.position_indices.is_empty() {
        return Err(MeshError::MissingGeometry(name.clone()));
    }

    let with_normals = geometry.has_normals();
    let count = geometry.position_indices.len();
    if !geometry.normal_indices.is_empty() && geometry.normal_indices.len() != count {
        return Err(MeshError::IndexCountMismatch {
            name: name.clone(),
            positions: count,
            normals: geometry.normal_indices.len(),
        });
    }
    if count > MAX_INDEX_COUNT {
        return Err(MeshError::TooManyIndices { name: name.clone(), count });
    }

    if let Some(listener) = listener {
        listener.add_units(count);
    }

    let mut positions = Vec::with_capacity(count * 3);
    let mut normals = with_normals.then(|| Vec::with_capacity(count * 3));
    let mut indices = Vec::with_capacity(count);

    for (corner, &position_index) in geometry.position_indices.iter().enumerate() {
        positions.extend(gather(&geometry.positions, position_index, "position", corner, name)?);

        if let Some(normals) = normals.as_mut() {
            let normal_index = geometry.normal_indices[corner];
            normals.extend(gather(&geometry.normals, normal_index, "normal", corner, name)?);
        }

        // count <= u16::MAX was checked above
        indices.push(corner as u16);

        if let Some(listener) = listener {
            listener.unit_done();
        }
    }

    Ok(Deindexed { positions, normals, indices })
}

/// Index buffer plus one or two vertex buffers ready to draw
#[derive(Debug)]
pub struct Mesh {
    index_buffer: GpuBuffer,
    vertex_buffers: Vec<GpuBuffer>,
    index_count: usize,
    has_normals: bool,
}

impl Mesh {
    /// Expand `geometry` and upload it with the static usage hint
    pub fn build(
        gl: &dyn GlContext,
        geometry: &GeometryFile,
        listener: Option<&dyn StepLoadListener>,
    ) -> Result<Self, MeshError> {
        let expanded = deindex(geometry, listener)?;
        Self::from_deindexed(gl, &expanded)
    }

    /// Upload already expanded data
    pub fn from_deindexed(gl: &dyn GlContext, expanded: &Deindexed) -> Result<Self, MeshError> {
        let index_buffer = GpuBuffer::with_data(
            gl,
            BufferTarget::ElementArrayBuffer,
            BufferUsage::StaticDraw,
            &expanded.indices,
        )?;

        let mut vertex_buffers = Vec::with_capacity(2);
        let streams = std::iter::once(expanded.positions.as_slice()).chain(expanded.normals.as_deref());
        for stream in streams {
            match GpuBuffer::with_data(gl, BufferTarget::ArrayBuffer, BufferUsage::StaticDraw, stream) {
                Ok(buffer) => vertex_buffers.push(buffer),
                Err(err) => {
                    // release what was already allocated
                    index_buffer.delete(gl);
                    for buffer in vertex_buffers {
                        buffer.delete(gl);
                    }
                    return Err(err.into());
                }
            }
        }

        log::info!(
            "Built mesh: {} vertices, {} buffers, normals: {}",
            expanded.vertex_count(),
            vertex_buffers.len(),
            expanded.normals.is_some()
        );

        Ok(Self {
            index_buffer,
            index_count: expanded.indices.len(),
            has_normals: expanded.normals.is_some(),
            vertex_buffers,
        })
    }

    /// Index buffer
    pub const fn index_buffer(&self) -> &GpuBuffer {
        &self.index_buffer
    }

    /// Vertex buffer at `index`
    pub fn vertex_buffer(&self, index: usize) -> Option<&GpuBuffer> {
        self.vertex_buffers.get(index)
    }

    /// Number of vertex buffers
    pub fn vertex_buffer_count(&self) -> usize {
        self.vertex_buffers.len()
    }

    /// Number of indices to draw
    pub const fn index_count(&self) -> usize {
        self.index_count
    }

    /// Whether buffer 1 holds normals
    pub const fn has_normals(&self) -> bool {
        self.has_normals
    }

    /// Always triangles
    pub const fn primitive_mode(&self) -> PrimitiveMode {
        PrimitiveMode::Triangles
    }

    /// Always unsigned 16-bit
    pub const fn index_kind(&self) -> ValueKind {
        ValueKind::UInt16
    }

    /// Release every buffer
    pub fn delete(self, gl: &dyn GlContext) {
        self.index_buffer.delete(gl);
        for buffer in self.vertex_buffers {
            buffer.delete(gl);
        }
    }
}
