use thiserror::Error;

/// Unified error type for the crate (SPEC_FULL.md's ambient error-handling
/// section, grounded on the teacher's `Result<_, &'static str>` usage
/// generalized into a proper `std::error::Error` via `thiserror`).
#[derive(Error, Debug)]
pub enum RtError {
    /// Raised at geometry construction: zero vector, degenerate triangle or
    /// polygon, non-convex polygon, non-positive radius, or an unsupported
    /// non-uniform scale on a tube/ellipsoid.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Raised at camera/scene finalization: non-perpendicular camera basis,
    /// non-positive view-plane dimensions, unsupported option combination.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Raised when a computation produces NaN/infinity outside the places
    /// the tracer already recovers from locally (spec.md §7); surfaced only
    /// when no local recovery is defined for the call site.
    #[error("numerical degeneracy: {0}")]
    NumericalDegeneracy(String),

    /// Recursion would exceed `maxDepth`, or attenuation fell below `minK`.
    /// Not a user-visible error; kept as a variant so scheduler/tracer code
    /// can use `Result` uniformly, but callers in the render path treat it
    /// as "stop, return background/black" rather than propagating it.
    #[error("resource exhaustion: {0}")]
    ResourceExhaustion(String),

    #[error("scene deserialization failed: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("scene I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("image encode failed: {0}")]
    Image(#[from] image::ImageError),
}

pub type RtResult<T> = Result<T, RtError>;
