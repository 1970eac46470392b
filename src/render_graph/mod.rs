//! Two-pass frame rendering with shadow mapping.
//!
//! Every frame runs the same fixed sequence:
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │ ShadowPass  │───▶│  MainPass   │───▶│   Present   │
//! │ (depth only)│    │ (lit + sky) │    │             │
//! └─────────────┘    └─────────────┘    └─────────────┘
//!       │                  ▲
//!       ▼                  │
//!   Shadow map ────────────┘ (sampled)
//! ```
//!
//! # Passes
//!
//! - [`ShadowPass`]: renders every entity's depth from the first
//!   shadow-casting directional light into a [`ShadowMap`]
//! - [`MainPass`]: stages lights and the shadow map on each material, draws
//!   the entities, then the sky
//!
//! [`FrameGraph`] owns both, plus the [`UniformArena`](crate::UniformArena)
//! and [`PipelineCache`] they share, and drives a [`FrameSequencer`] that
//! rejects out-of-order passes and resource hazards.
//!
//! # Example
//!
//! ```ignore
//! use penumbra::{FrameGraph, ShadowSettings};
//!
//! let mut graph = FrameGraph::new(&gpu, ShadowSettings::default());
//!
//! // In render loop:
//! scene.update(dt, &input);
//! graph.render(&gpu, &mut scene)?;
//! ```

mod graph;
mod main_pass;
mod phase;
mod pipelines;
mod render_target;
mod shadow_pass;

pub use graph::FrameGraph;
pub use main_pass::{MainPass, SHADOW_MAP_SLOT};
pub use phase::{FramePhase, FrameSequencer, InputSlots, ResourceId};
pub use pipelines::{PipelineCache, PipelineKind};
pub use render_target::{DEPTH_FORMAT, DepthBuffer, RenderContext, ShadowMap};
pub use shadow_pass::{ShadowPass, ShadowSettings, light_matrices};
