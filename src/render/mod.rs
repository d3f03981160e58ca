//! Rendering of parse outcomes: JSON for downstream systems and a review
//! report for people.

mod json;
mod report;

pub use json::{questions_to_json, to_json, JsonFormat};
pub use report::{to_review_text, ReviewItem, ReviewReport};
