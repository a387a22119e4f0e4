//! Drawing helpers over the character buffer.

pub mod border;
pub mod frame;
pub mod scrollbar;

pub use frame::{Frame, Line, Span};
