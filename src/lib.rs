pub mod aggregate;
pub mod config;
pub mod engine;
pub mod mapping;
pub mod palette;
pub mod report;
pub mod scorer;

pub use engine::{ScoreReport, ScoringEngine};
pub use mapping::{ReferenceMapping, UserMapping};
pub use palette::{closest_color_name, color_similarity};
pub use scorer::{compare, score};
