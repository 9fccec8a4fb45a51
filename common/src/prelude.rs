pub use crate::mesh::MeshBuilder;
pub use crate::vertex::{UVVertex, Vertex};
pub use crate::vfile::{VFile, VFileSystem};
