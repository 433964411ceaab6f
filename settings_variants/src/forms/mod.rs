//! Form orchestration over the value engine.
//!
//! Rendering belongs to the embedding application. These types take the
//! submitted trees the form pipeline delivers and drive the engine through
//! validation, extraction, persistence and reset.

mod config_form;
mod errors;
mod variation_form;

pub use config_form::{ConfigForm, ConfigSubmission};
pub use errors::{FORM_KEY, FormError, FormErrors};
pub use variation_form::{
    VariationForm, VariationSubmission, prepare_default_user_input, remove_default_values,
};
