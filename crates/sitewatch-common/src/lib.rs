//! Shared domain types and id generation for the sitewatch workspace.

pub mod id;
pub mod types;
