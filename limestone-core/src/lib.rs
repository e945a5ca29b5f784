//! # limestone-core: LIME explanation translation
//!
//! Local surrogate explanations of the loan-default classifiers come back as
//! conditions over the *transformed* feature space, e.g.
//! `num_log_iter__CLAGE_log <= -0.43` or `cat__JOB_Office > 0.00`. This crate
//! inverts the fitted preprocessing (standard scaling, log1p, one-hot
//! encoding) to turn them into statements in original units, such as
//! `CLAGE <= 44.29` or `JOB is Office`.
//!
//! ```text
//! (condition, weight)* ──► translator ──► numeric parser ──┐
//!                                    └──► categorical parser ┴─► (readable condition, weight)*
//! ```
//!
//! Translation of a single condition never fails: anything a parser cannot
//! decide is passed through verbatim. Only a pipeline of the wrong shape is an
//! error.

pub mod categorical;
pub mod condition;
pub mod config;
pub mod error;
pub mod features;
pub mod gateway;
pub mod numeric;
pub mod pipeline;
pub mod registry;
pub mod translator;

pub use condition::{ExplanationItem, ParseContext, Translation};
pub use config::{LimestoneConfig, load_config};
pub use error::LimestoneError;
pub use features::{FeatureGroup, FeatureGroups};
pub use pipeline::{ColumnTransformer, Pipeline, StandardScaler, TransformerHandle};
pub use registry::PipelineRegistry;
pub use translator::{ConditionTranslator, translate_explanation};
