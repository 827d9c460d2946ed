/// This error will be returned if a frame of discernment cannot be indexed.
#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone)]
pub enum FrameError {
    #[error("frame has no events")]
    Empty,
    #[error("frame has {0} events, at most {max} are supported", max = crate::MAX_FRAME_SIZE)]
    TooLarge(usize),
}

/// This error will be returned if two or more mass assignments cannot be combined.
#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone)]
pub enum CombineError {
    #[error("mass assignments are defined over different frames")]
    FrameMismatch,
    #[error("mass assignments are in total conflict")]
    TotalConflict,
    #[error("no mass assignments to combine")]
    Empty,
}
