#![deny(missing_docs)]
#![doc = "Draw storage, typed parameter keys and shared error types for posterior post-processing."]

pub mod csv_io;
pub mod draws;
pub mod errors;
pub mod provenance;
pub mod rng;

pub use csv_io::{load_column, load_draws, read_column, read_draws};
pub use draws::{Draw, DrawStore, DrawValue, ParamKey};
pub use errors::{check_draws, check_probability, ErrorInfo, PosteriorError};
pub use provenance::{AnalysisProvenance, SchemaVersion};
pub use rng::{derive_substream_seed, RngHandle, DEFAULT_SEED};
