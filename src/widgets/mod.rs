//! Concrete controls built on the runtime.

mod stack;

pub mod button;
pub mod column;
pub mod grid;
pub mod log_viewer;
pub mod markup;
pub mod menu;
pub mod panel;
pub mod progress;
pub mod scrollable_panel;
pub mod splitter;
pub mod tab;
pub mod toolbar;

pub use button::ButtonControl;
pub use column::ColumnControl;
pub use grid::{compute_column_layout, ColumnWidth, HorizontalGridControl};
pub use log_viewer::LogViewerControl;
pub use markup::MarkupControl;
pub use menu::{MenuControl, MenuItem, MenuPortalContent};
pub use panel::{panel_with, PanelControl};
pub use progress::ProgressBarControl;
pub use scrollable_panel::ScrollablePanelControl;
pub use splitter::{clamp_split, SplitterControl};
pub use tab::TabControl;
pub use toolbar::{compute_row_layout, ItemSlot, ToolbarControl};
