pub mod codec;
pub mod metadata;
pub mod validation;
pub mod vertex;

pub use metadata::VertexMetadata;
pub use validation::verify_parents;
pub use vertex::{TxInput, TxOutput, Vertex, VertexKind};
