//! Service layer: the recognition core and its collaborator clients

pub mod audio;
pub mod catalogue;
pub mod ingest;
pub mod projector;
pub mod recognizer;
pub mod vector_index;

pub use audio::{AudioAnalyzer, AudioAnalyzerError, HttpAudioAnalyzer};
pub use catalogue::{SongCatalogue, SqliteCatalogue};
pub use ingest::{IngestError, Ingestor};
pub use recognizer::{RecognitionError, Recognizer, RecognizerConfig};
pub use vector_index::{
    HttpVectorIndex, IndexStats, MetadataFilter, VectorBackendError, VectorEntry, VectorIndex,
    VectorMatch,
};
