//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The main error type [`RadianceError`] covers every failure mode of the core:
//! - GPU initialization failures
//! - Resource creation failures (invalid descriptors, unsupported formats)
//! - Registry lookup misses and duplicate inserts
//! - GPU→CPU read-back failures
//!
//! # Usage
//!
//! All fallible APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, RadianceError>`.
//!
//! ```rust,ignore
//! use radiance_core::errors::{RadianceError, Result};
//!
//! fn build_targets() -> Result<()> {
//!     Ok(())
//! }
//! ```
//!
//! Read-back errors are the only soft failures: the tone-mapping path logs
//! them and skips one adaptation step instead of propagating them.

use std::fmt;

use thiserror::Error;

/// Category of a keyed resource, used in lookup errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Texture,
    Sampler,
    Shader,
    Buffer,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Texture => "texture",
            Self::Sampler => "sampler",
            Self::Shader => "shader",
            Self::Buffer => "buffer",
        };
        f.write_str(name)
    }
}

/// The main error type for the Radiance engine.
#[derive(Error, Debug)]
pub enum RadianceError {
    // ========================================================================
    // GPU & Device Errors
    // ========================================================================
    /// Failed to request a compatible GPU adapter.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// Failed to create the GPU device.
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    // ========================================================================
    // Resource Creation Errors
    // ========================================================================
    /// A texture descriptor was rejected before reaching the device.
    #[error("Invalid texture '{label}': {reason}")]
    InvalidTextureDescriptor {
        /// Debug label of the texture being created
        label: String,
        /// Human-readable cause
        reason: String,
    },

    /// The adapter cannot use the format the way the caller requested.
    #[error("Format {format:?} does not support {usage} on this adapter")]
    UnsupportedFormat {
        format: wgpu::TextureFormat,
        /// Capability that was missing (e.g. "filtering")
        usage: &'static str,
    },

    // ========================================================================
    // Registry Errors
    // ========================================================================
    /// A keyed lookup missed.
    #[error("Missing {kind} '{key}'")]
    MissingResource { kind: ResourceKind, key: String },

    /// An insert collided with an existing key.
    #[error("Duplicate {kind} '{key}'")]
    DuplicateResource { kind: ResourceKind, key: String },

    // ========================================================================
    // Read-back Errors
    // ========================================================================
    /// Mapping a staging buffer for reading failed.
    #[error("GPU read-back failed: {0}")]
    ReadbackFailed(String),

    // ========================================================================
    // Image & I/O Errors
    // ========================================================================
    /// Source image data is malformed.
    #[error("Image decode error: {0}")]
    ImageDecodeError(String),

    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl RadianceError {
    pub(crate) fn invalid_texture(label: &str, reason: impl Into<String>) -> Self {
        Self::InvalidTextureDescriptor {
            label: label.to_owned(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for failures the frame loop may tolerate for one frame.
    #[must_use]
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::ReadbackFailed(_))
    }
}

impl From<wgpu::BufferAsyncError> for RadianceError {
    fn from(err: wgpu::BufferAsyncError) -> Self {
        RadianceError::ReadbackFailed(err.to_string())
    }
}

/// Alias for `Result<T, RadianceError>`.
pub type Result<T> = std::result::Result<T, RadianceError>;
