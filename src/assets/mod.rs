/// Concurrent retrieval of remote layer sources.
pub mod fetch;
/// Header-only image dimension probing.
pub mod probe;
/// Remote/local classification of layer file references.
pub mod source;
