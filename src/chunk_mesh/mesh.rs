/// One decoded chunked mesh: a flat colour and its triangle-soup chunks.
#[derive(Clone, Debug, PartialEq)]
pub struct IvMesh {
    pub name: String,
    /// RGBA, 0..1.
    pub color: [f32; 4],
    pub chunks: Vec<IvChunk>,
}

/// Indexed triangle list without normals.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct IvChunk {
    pub index_data: Vec<u32>,
    /// xyz triples.
    pub position_data: Vec<f32>,
}

impl IvMesh {
    pub fn new(name: impl Into<String>, color: [f32; 4], chunks: Vec<IvChunk>) -> Self {
        Self {
            name: name.into(),
            color,
            chunks,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.chunks.iter().map(IvChunk::triangle_count).sum()
    }
}

impl IvChunk {
    pub fn new(index_data: Vec<u32>, position_data: Vec<f32>) -> Self {
        Self {
            index_data,
            position_data,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.index_data.len() / 3
    }
}
