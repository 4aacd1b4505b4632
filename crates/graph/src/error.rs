use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    /// The relation source failed while resolving a node. Fatal for the
    /// whole build: a partially pruned graph would misrepresent in-degrees.
    #[error("relation source failed for `{symbol}`: {message}")]
    Source { symbol: String, message: String },

    /// An expansion task was cancelled or panicked under the builder.
    #[error("build task failed: {0}")]
    Task(String),
}
