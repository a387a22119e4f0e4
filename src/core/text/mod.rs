//! Text services (ANSI parsing, width calculations, wrapping, markup rendering).
//!
//! These helpers are pure (string in, lines or cells out) and live under `core` so widgets can
//! depend on them without importing anything from the render layer.

pub mod ansi;
pub mod markup;
pub mod width;
