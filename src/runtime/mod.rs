//! Runtime: the control arena and everything that routes through it.

pub mod control;
pub mod focus;
pub mod mouse;
pub mod portal;
pub mod scroll;
pub mod ticker;
pub mod tree;
pub mod window;

pub use control::{
    Container, Control, ControlProps, FocusReason, FocusTracking, Focusable, Interactive,
    MouseAware, Tickable,
};
pub use mouse::{ClickKind, DoubleClickDetector};
pub use portal::{PortalContent, PortalId};
pub use tree::{ControlEvent, ControlId, ControlTree, InvalidationReason};
pub use window::Window;
