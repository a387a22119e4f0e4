//! Core value types and services shared by every layer.
//!
//! Invariant: nothing under `core` imports from `render`, `runtime` or `widgets`.

pub mod buffer;
pub mod geometry;
pub mod input;
pub mod keybindings;
pub mod style;
pub mod text;
pub mod theme;
