//! Toolkit error type.
//!
//! Only configuration and structural mistakes surface as errors. Paint-time geometry
//! problems (zero-sized bounds, stale layout during a resize) are absorbed by the
//! controls themselves and never reach the caller.

use thiserror::Error;

use crate::runtime::tree::ControlId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToolkitError {
    #[error("{control} height must be at least {minimum}, got {requested}")]
    InvalidHeight {
        control: &'static str,
        minimum: usize,
        requested: usize,
    },
    #[error("{control} width must be at least {minimum}, got {requested}")]
    InvalidWidth {
        control: &'static str,
        minimum: usize,
        requested: usize,
    },
    #[error("unknown or disposed control {0:?}")]
    UnknownControl(ControlId),
    #[error("control {0:?} cannot host children")]
    NotAContainer(ControlId),
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    WouldCreateCycle { parent: ControlId, child: ControlId },
    #[error("control {id:?} is not a {expected}")]
    TypeMismatch { id: ControlId, expected: &'static str },
    #[error("tab index {index} out of range ({count} tabs)")]
    TabIndexOutOfRange { index: usize, count: usize },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, ToolkitError>;
