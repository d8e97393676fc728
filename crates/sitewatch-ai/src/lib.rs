//! Natural-language rule translation.
//!
//! A [`RuleTranslator`] turns free text ("alert me when a forklift gets
//! within 10 feet of a worker") into a [`RuleDraft`]. The draft is
//! untrusted model output; the server validates it through the same gate
//! as manual input before anything is stored.

pub mod models;
pub mod prompt;
pub mod providers;
pub mod translator;

pub use providers::openai::OpenAiProvider;
pub use translator::{RuleDraft, RuleTranslator, TranslateError};
