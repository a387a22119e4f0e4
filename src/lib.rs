//! Terminal widget toolkit.
//!
//! Controls live in a [`ControlTree`] arena and go through a two-pass layout: `measure` under
//! [`core::geometry::LayoutConstraints`], then `paint` into a [`core::buffer::CharacterBuffer`]
//! clipped to the parent. Keyboard focus is hierarchical and menus render through portals drawn
//! above the regular tree.
//!
//! # Public API Overview
//! - Build a tree of widgets and host it in a [`Window`].
//! - Feed keys and mouse events to the window; read [`ControlEvent`]s back with
//!   [`Window::drain_events`].
//! - Call [`Window::render`] for a [`Frame`] of styled lines; the host owns the terminal.
//! - Capture `tracing` output into a [`LogBuffer`] and show it with [`LogViewerControl`].

#![allow(
    clippy::derivable_impls,
    clippy::needless_range_loop,
    clippy::question_mark,
    clippy::too_many_arguments,
    clippy::type_complexity,
    clippy::unnecessary_map_or
)]

pub mod config;
pub mod error;
pub mod logging;

pub mod core;
pub mod render;
pub mod runtime;
pub mod widgets;

/// Error type shared by every fallible operation.
pub use crate::error::{Result, ToolkitError};

/// Environment-driven toolkit settings.
pub use crate::config::ToolkitConfig;

/// Log capture for the log viewer.
pub use crate::logging::{LogBuffer, LogCaptureLayer, LogEntry, LogLevel, SubscriptionId};

/// Control arena, capability traits and the window host.
pub use crate::runtime::{
    Container, Control, ControlEvent, ControlId, ControlProps, ControlTree, FocusReason,
    FocusTracking, Focusable, Interactive, InvalidationReason, MouseAware, PortalContent,
    PortalId, Tickable, Window,
};

/// Built-in widgets.
pub use crate::widgets::{
    ButtonControl, ColumnControl, HorizontalGridControl, LogViewerControl, MarkupControl,
    MenuControl, MenuItem, PanelControl, ProgressBarControl, ScrollablePanelControl,
    SplitterControl, TabControl, ToolbarControl,
};

/// Keyboard and mouse input types.
pub use crate::core::input::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
/// Navigation keymap.
pub use crate::core::keybindings::{KeybindingsConfig, NavigationAction, NavigationKeymap};

/// Render-layer frame types.
pub use crate::render::{Frame, Line, Span};

/// Visible width helper that ignores ANSI control sequences.
pub use crate::core::text::width::visible_width;
