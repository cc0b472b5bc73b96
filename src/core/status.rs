//! Status codes reported at the handle boundary.
//!
//! Errors abort an operation, warnings describe degraded but usable
//! results (for example a mesh whose unsupported elements were skipped).

use std::fmt;

/// Outcome of the last fallible call on a session or mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Status {
    #[default]
    None,
    // Errors
    ErrNotEnoughMemory,
    ErrFileNotFound,
    ErrUnknownFormat,
    ErrIncompatibleMesh,
    ErrInvalidData,
    ErrIncompatibleDataset,
    ErrIncompatibleDatasetGroup,
    ErrMissingDriver,
    // Warnings
    WarnUnsupportedElement,
    WarnInvalidElements,
    WarnElementWithInvalidNode,
    WarnElementNotUnique,
    WarnNodeNotUnique,
}

impl Status {
    /// Check if this is one of the error kinds.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::ErrNotEnoughMemory
                | Self::ErrFileNotFound
                | Self::ErrUnknownFormat
                | Self::ErrIncompatibleMesh
                | Self::ErrInvalidData
                | Self::ErrIncompatibleDataset
                | Self::ErrIncompatibleDatasetGroup
                | Self::ErrMissingDriver
        )
    }

    /// Check if this is one of the warning kinds.
    pub fn is_warning(&self) -> bool {
        !self.is_error() && *self != Self::None
    }

    /// Check if this is `None`.
    pub fn is_ok(&self) -> bool {
        *self == Self::None
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "None",
            Self::ErrNotEnoughMemory => "Err_NotEnoughMemory",
            Self::ErrFileNotFound => "Err_FileNotFound",
            Self::ErrUnknownFormat => "Err_UnknownFormat",
            Self::ErrIncompatibleMesh => "Err_IncompatibleMesh",
            Self::ErrInvalidData => "Err_InvalidData",
            Self::ErrIncompatibleDataset => "Err_IncompatibleDataset",
            Self::ErrIncompatibleDatasetGroup => "Err_IncompatibleDatasetGroup",
            Self::ErrMissingDriver => "Err_MissingDriver",
            Self::WarnUnsupportedElement => "Warn_UnsupportedElement",
            Self::WarnInvalidElements => "Warn_InvalidElements",
            Self::WarnElementWithInvalidNode => "Warn_ElementWithInvalidNode",
            Self::WarnElementNotUnique => "Warn_ElementNotUnique",
            Self::WarnNodeNotUnique => "Warn_NodeNotUnique",
        };
        f.write_str(s)
    }
}

/// Non-fatal problem found while reading a source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Warning {
    /// Element type the driver cannot represent; skipped.
    UnsupportedElement,
    /// Elements with invalid topology; skipped.
    InvalidElements,
    /// Element referencing a vertex that does not exist.
    ElementWithInvalidNode,
    /// Element id seen more than once.
    ElementNotUnique,
    /// Vertex id seen more than once.
    NodeNotUnique,
}

impl Warning {
    pub fn status(&self) -> Status {
        match self {
            Self::UnsupportedElement => Status::WarnUnsupportedElement,
            Self::InvalidElements => Status::WarnInvalidElements,
            Self::ElementWithInvalidNode => Status::WarnElementWithInvalidNode,
            Self::ElementNotUnique => Status::WarnElementNotUnique,
            Self::NodeNotUnique => Status::WarnNodeNotUnique,
        }
    }
}

/// Warnings collected during one load call.
///
/// Drivers push into it and carry on; the caller decides whether the
/// best-effort result is good enough.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<(Warning, String)>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning with context (element id, file position, ...).
    pub fn warn(&mut self, warning: Warning, detail: impl Into<String>) {
        let detail = detail.into();
        tracing::warn!(?warning, %detail, "degraded mesh data");
        self.warnings.push((warning, detail));
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    /// Recorded warnings in order.
    pub fn iter(&self) -> impl Iterator<Item = (Warning, &str)> {
        self.warnings.iter().map(|(w, d)| (*w, d.as_str()))
    }

    /// Most recent warning, which is what a status slot reports.
    pub fn last(&self) -> Option<Warning> {
        self.warnings.last().map(|(w, _)| *w)
    }

    pub fn clear(&mut self) {
        self.warnings.clear();
    }
}
