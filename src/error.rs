//! Error types for every fallible part of the renderer.
//!
//! Each subsystem gets its own enum so callers can match on what actually
//! went wrong; [`RenderError`] wraps them for the top level.

use std::path::PathBuf;

use thiserror::Error;

use crate::render_graph::FramePhase;
use crate::render_graph::ResourceId;

/// Failures while bringing up the wgpu device and surface.
#[derive(Error, Debug)]
pub enum GpuError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}

/// Failures while loading or preparing mesh geometry.
#[derive(Error, Debug)]
pub enum GeometryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OBJ error in {path}: {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("unknown geometry format: '{0}'")]
    UnknownFormat(String),

    #[error("model {0} contains no triangles")]
    Empty(PathBuf),
}

/// Failures while decoding textures.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{path} is {width}x{height}, textures must be 1 to {max} texels per side")]
    Size {
        path: PathBuf,
        width: u32,
        height: u32,
        max: u32,
    },

    #[error("cube map face {face} is {actual:?}, expected {expected:?}")]
    FaceSizeMismatch {
        face: usize,
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

/// Failures while binding a shader program's parameters.
#[derive(Error, Debug)]
pub enum ShaderError {
    #[error("{program}: slot '{name}' has nothing bound")]
    UnboundResource { program: String, name: String },

    #[error("{program}: parameters were bound before being flushed")]
    NotFlushed { program: String },
}

/// Invalid frame sequencing or resource hazards.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("cannot {action} during {phase:?}")]
    InvalidTransition {
        action: &'static str,
        phase: FramePhase,
    },

    #[error("{0:?} is bound as a shader input and a depth target at the same time")]
    BindingHazard(ResourceId),

    #[error("{0} shader input(s) still bound at end of frame")]
    DanglingShaderInputs(usize),

    #[error("uniform arena overflow: {requested} bytes requested, {remaining} remaining")]
    UniformArenaFull { requested: u64, remaining: u64 },
}

/// Failures while reading a demo configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
}

/// Anything that can abort a frame or the setup of one.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("failed to create window: {0}")]
    Window(String),
}

/// Failures that end the application.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
