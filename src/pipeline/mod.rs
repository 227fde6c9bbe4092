/// Stage sequencing and the caller-facing entry points.
pub mod run;
/// Canvas size derivation.
pub mod sizing;
