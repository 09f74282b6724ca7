//! Adds Green strain (GE) field outputs to finite-element results archives
//! for every frame that holds Nominal strain (NE).
//!
//! ```text
//! GE = 1/2 (V * V^T - I)
//! V  = NE + I
//! ```

pub mod archive;
pub mod datatypes;
pub mod error;
pub mod report;
pub mod settings;
pub mod tensor;
pub mod walker;

pub use crate::archive::{FrameKey, JsonArchive, ResultsArchive};
pub use crate::error::{GreenStrainError, GreenStrainResult};
pub use crate::report::{ArchiveReport, RunReport};
pub use crate::settings::Settings;
pub use crate::tensor::green_strain;
pub use crate::walker::{on_job_completion, FrameWalker};
