pub mod core;
pub mod model;
pub mod risk;
pub mod utils;
pub mod web;

pub use crate::core::{config::*, error::*, types::*};
pub use model::{Classifier, LoadedModel, ModelError, Scaler};
pub use risk::{categorize, evaluate, RiskEvaluator};
