use serde::{Deserialize, Serialize};

/// What a tab's script knows about the person on the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ProfileInfo {
    /// Render the known fields as `Label: value` lines for an LLM prompt.
    pub fn to_prompt(&self) -> String {
        let fields = [
            ("Name", &self.full_name),
            ("Headline", &self.headline),
            ("Location", &self.location),
            ("About", &self.about),
            ("Email", &self.email),
        ];

        let mut out = String::new();
        for (label, value) in fields {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                out.push_str(&format!("{}: {}\n", label, value));
            }
        }
        out
    }

    /// First word of the full name, used for the greeting.
    pub fn first_name(&self) -> Option<&str> {
        self.full_name.as_deref()?.split_whitespace().next()
    }

    pub fn is_empty(&self) -> bool {
        self.to_prompt().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_skips_missing_and_blank() {
        let profile = ProfileInfo {
            full_name: Some("Ada Lovelace".into()),
            headline: Some("  ".into()),
            about: Some("Analytical engines".into()),
            ..Default::default()
        };
        assert_eq!(
            profile.to_prompt(),
            "Name: Ada Lovelace\nAbout: Analytical engines\n"
        );
        assert_eq!(profile.first_name(), Some("Ada"));
    }

    #[test]
    fn test_deserializes_camel_case() {
        let profile: ProfileInfo =
            serde_json::from_str(r#"{"fullName": "Grace Hopper", "headline": "Admiral"}"#).unwrap();
        assert_eq!(profile.full_name.as_deref(), Some("Grace Hopper"));
        assert!(ProfileInfo::default().is_empty());
    }
}
