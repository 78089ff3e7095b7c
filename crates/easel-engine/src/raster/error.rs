/// Failure to allocate a pixel buffer of the requested size.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum AllocationError {
    #[error("surface has zero area ({width}x{height})")]
    ZeroSize { width: u32, height: u32 },

    #[error("surface of {width}x{height} exceeds addressable memory")]
    TooLarge { width: u32, height: u32 },

    #[error("out of memory allocating a {width}x{height} surface")]
    OutOfMemory { width: u32, height: u32 },
}
