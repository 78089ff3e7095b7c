use crate::raster::AllocationError;

/// Errors surfaced by [`Compositor`](super::Compositor).
#[derive(Debug, thiserror::Error)]
pub enum CompositorError {
    /// Surface or texture storage could not be allocated.
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// The vertex and fragment stages could not be linked into a program.
    #[error("shader program failed to link: {log}")]
    ShaderLink { log: String },

    /// The backend can no longer present frames (typically out of memory).
    #[error("graphics device lost")]
    DeviceLost,
}
