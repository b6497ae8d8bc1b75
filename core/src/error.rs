//! Genuine Rust-level failures: things that happen before an `Engine` (or
//! a journal writer) can even be constructed. Distinct from `OrderResult`,
//! which remains the value-level outcome of `submit` and never becomes a
//! `Result` at that boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("journal I/O error: {0}")]
    Journal(#[from] std::io::Error),
}
