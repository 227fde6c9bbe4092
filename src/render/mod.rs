/// Blank canvas creation and the artifact handle.
pub mod canvas;
/// Ordered layer application.
pub mod compositor;
/// ImageMagick command contracts.
pub mod magick;
/// External process execution.
pub mod process;
