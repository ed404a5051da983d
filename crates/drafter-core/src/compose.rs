//! Prompt assembly and parsing of the model's draft.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::profile::ProfileInfo;

pub const SYSTEM_PROMPT: &str = "You're a skilled B2B copywriter who knows how to write cold emails that actually get replies. \
Your job is to craft short, thoughtful, and personalized emails based on the recipient's profile and a quick briefing from the sender.\n\n\
Always start with: Dear [First Name],\n\
Keep it brief: aim for 4 to 6 sentences total.\n\
Make it personal: use relevant profile details to show you've done your homework.\n\
Focus on real value: how does this help solve a challenge or make their work easier?\n\
Use a natural, conversational tone, like it was written by a thoughtful human.\n\
End with a light, low-pressure call to action, like asking if they'd be open to a quick call.\n\
Avoid fluff: skip generic intros, marketing buzzwords, and long walls of text.\n\n\
Output format (JSON only):\n\
{\n  \"email_output\": \"...\",\n  \"analysis_rationale\": [\"...\", \"...\"]\n}\n\n\
Never include anything outside this JSON structure.";

pub const IMPROVE_SYSTEM_PROMPT: &str = "You're a skilled B2B copywriter who knows how to improve cold emails to make them more effective. \
Your job is to refine and enhance an existing email based on specific improvement instructions.\n\n\
Always start with: Dear [First Name],\n\
Keep it brief: aim for 4 to 6 sentences total.\n\
Make it personal and keep any personalization from the original email.\n\
Focus on real value: how does this offering solve a challenge or make their work easier?\n\
Use a natural, conversational tone, like it was written by a thoughtful human.\n\
End with a light, low-pressure call to action, like asking if they'd be open to a quick call.\n\
Avoid fluff: skip generic intros, marketing buzzwords, and long walls of text.\n\n\
Output format (JSON only):\n\
{\n  \"email_output\": \"...\",\n  \"improvement_rationale\": [\"...\", \"...\"]\n}\n\n\
Never include anything outside this JSON structure.";

/// Append extra guidance to a base system prompt.
pub fn with_guidance(base: &str, guidance: Option<&str>) -> String {
    match guidance.map(str::trim).filter(|g| !g.is_empty()) {
        Some(guidance) => format!("{}\n\n--- Additional Guidance ---\n{}", base, guidance),
        None => base.to_string(),
    }
}

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("empty draft returned by model")]
    Empty,

    #[error("model output is missing email_output")]
    MissingEmail,

    #[error("model output is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// A parsed draft with the model's reasoning, which is only logged. The
/// reasoning comes from `analysis_rationale` for new drafts and
/// `improvement_rationale` for reworked ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedEmail {
    pub body: String,
    pub rationale: Vec<String>,
}

pub fn build_user_prompt(profile: &ProfileInfo, context: &str) -> String {
    let mut prompt = String::new();

    if !profile.is_empty() {
        prompt.push_str("Here is the profile info:\n");
        prompt.push_str(&profile.to_prompt());
        prompt.push('\n');
    }
    if let Some(first_name) = profile.first_name() {
        prompt.push_str(&format!("Their first name is {}.\n\n", first_name));
    }

    prompt.push_str("Important prompt: [ ");
    prompt.push_str(context);
    prompt.push_str(" ]");
    prompt
}

pub fn build_improve_prompt(profile: &ProfileInfo, draft: &str, instructions: &str) -> String {
    format!(
        "Here is the original email:\n\n{}\n\nThe recipient's name is {}.\n\nImprovement instructions: {}",
        draft,
        profile.first_name().unwrap_or("there"),
        instructions
    )
}

fn fenced_json() -> Option<&'static Regex> {
    static FENCED: OnceLock<Option<Regex>> = OnceLock::new();
    FENCED
        .get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)```").ok())
        .as_ref()
}

/// Pull the email out of raw model output.
///
/// Models wrap the JSON in code fences, add chatter around it, or stop before
/// the final braces, so the JSON is located and repaired before parsing.
/// Output with no JSON object at all is taken as the email itself.
pub fn parse_model_output(raw: &str) -> Result<ComposedEmail, ComposeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ComposeError::Empty);
    }

    let candidate = fenced_json()
        .and_then(|re| re.captures(trimmed))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(trimmed);

    let Some(start) = candidate.find('{') else {
        return Ok(ComposedEmail {
            body: trimmed.to_string(),
            rationale: Vec::new(),
        });
    };
    let end = candidate.rfind('}').filter(|end| *end > start);
    let slice = match end {
        Some(end) => &candidate[start..=end],
        None => &candidate[start..],
    };

    let mut fixed = slice.to_string();
    let open = fixed.matches('{').count();
    let close = fixed.matches('}').count();
    if open > close {
        fixed.push_str(&"}".repeat(open - close));
    }

    let parsed: Value = serde_json::from_str(&fixed)?;
    let body = parsed
        .get("email_output")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|body| !body.is_empty())
        .ok_or(ComposeError::MissingEmail)?
        .to_string();
    let rationale = ["analysis_rationale", "improvement_rationale"]
        .iter()
        .find_map(|key| parsed.get(*key).and_then(Value::as_array))
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    Ok(ComposedEmail { body, rationale })
}
