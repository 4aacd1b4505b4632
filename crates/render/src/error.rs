use thiserror::Error;

pub type Result<T> = std::result::Result<T, RenderError>;

#[derive(Error, Debug)]
pub enum RenderError {
    /// The structural-outline provider failed for one resource. Recoverable:
    /// the class renderer logs and skips the file.
    #[error("outline provider failed for `{resource}`: {message}")]
    Outline { resource: String, message: String },

    /// An include/exclude pattern in the scan configuration did not compile.
    #[error("invalid scan pattern: {0}")]
    Pattern(#[from] globset::Error),

    /// A declaration pattern did not compile. Internal: the patterns are
    /// fixed at build time.
    #[error("invalid declaration pattern: {0}")]
    Declaration(#[from] regex::Error),
}
