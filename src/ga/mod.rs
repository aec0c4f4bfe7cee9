//! Genetic Algorithm framework.
//!
//! A generic GA loop built on trait-based abstractions. A problem is
//! defined by implementing [`GaProblem`], which specifies how to create,
//! evaluate, crossover and mutate individuals. The timetabling problem in
//! [`crate::timetable`] is one such implementation.
//!
//! # Core Traits
//!
//! - [`Individual`]: A candidate solution with associated fitness type
//! - [`GaProblem`]: Problem definition: initialization, evaluation, operators
//!
//! # Key Types
//!
//! - [`GaConfig`]: Algorithm parameters
//! - [`GaRunner`]: Executes the evolutionary loop
//! - [`GaResult`]: Final optimization result with statistics
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*

mod config;
mod runner;
mod selection;
mod types;

pub use config::GaConfig;
pub use runner::{GaResult, GaRunner, GenerationStats};
pub use selection::tournament;
pub use types::{Fitness, GaProblem, Individual};
