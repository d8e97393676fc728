//! Prompt construction for rule translation.
//!
//! The condition catalog in the prompt is generated from the same
//! parameter table the validator uses, so the model can only be asked
//! for shapes the gate will accept.

use sitewatch_common::types::ConditionType;
use sitewatch_rules::{parameter_specs, ParamKind};

pub const SYSTEM_PROMPT: &str = "You are a construction site safety expert. \
Convert plain-language safety requirements into structured alert rules. \
Respond with a single JSON object and nothing else.";

/// Build the user prompt for one translation request.
pub fn build_translation_prompt(text: &str) -> String {
    let mut out = String::with_capacity(2048);
    out.push_str("Convert the following safety requirement into an alert rule.\n\n");
    out.push_str("Available condition types and their parameters:\n");

    for t in ConditionType::ALL {
        out.push_str(&format!("- {t}:\n"));
        for spec in parameter_specs(t) {
            match spec.kind {
                ParamKind::Number => {
                    out.push_str(&format!("    {} (number)\n", spec.key));
                }
                ParamKind::Text => {
                    out.push_str(&format!("    {} (text)\n", spec.key));
                }
                ParamKind::OneOf(options) => {
                    out.push_str(&format!("    {} (one of: {})\n", spec.key, options.join(", ")));
                }
            }
        }
    }

    out.push_str(
        "\nRespond with JSON of this exact shape:\n\
         {\n\
         \x20 \"name\": \"short rule name\",\n\
         \x20 \"description\": \"one sentence\",\n\
         \x20 \"type\": \"<condition type>\",\n\
         \x20 \"severity\": \"LOW\" | \"MEDIUM\" | \"HIGH\" | \"CRITICAL\",\n\
         \x20 \"condition\": { <parameters for the chosen type> }\n\
         }\n\n",
    );
    out.push_str("Safety requirement: ");
    out.push_str(text);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_every_condition_type() {
        let prompt = build_translation_prompt("no forklifts near people");
        for t in ConditionType::ALL {
            assert!(prompt.contains(&format!("- {t}:")), "missing {t}");
        }
        assert!(prompt.ends_with("no forklifts near people"));
    }

    #[test]
    fn prompt_includes_option_lists() {
        let prompt = build_translation_prompt("x");
        assert!(prompt.contains("one of: hard_hat, safety_vest, safety_glasses, gloves, boots"));
        assert!(prompt.contains("threshold (number)"));
    }
}
