/*!
Rich-text display names.

Display names are styled text trees, persisted as their JSON form.
*/

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A styled text segment with optional nested segments appended after it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct RichText {
    #[serde(default)]
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<RichText>,
}

impl RichText {
    /// Unstyled text
    pub fn literal<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_color<S: Into<String>>(mut self, color: S) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = Some(bold);
        self
    }

    pub fn with_italic(mut self, italic: bool) -> Self {
        self.italic = Some(italic);
        self
    }

    /// Append a child segment
    pub fn append(mut self, child: RichText) -> Self {
        self.extra.push(child);
        self
    }

    /// Concatenate the text of this segment and all of its children, depth first
    pub fn to_plain_string(&self) -> String {
        let mut out = String::new();
        self.collect_plain(&mut out);
        out
    }

    fn collect_plain(&self, out: &mut String) {
        out.push_str(&self.text);
        for child in &self.extra {
            child.collect_plain(out);
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl fmt::Display for RichText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_plain_string())
    }
}

impl From<&str> for RichText {
    fn from(text: &str) -> Self {
        Self::literal(text)
    }
}

impl From<String> for RichText {
    fn from(text: String) -> Self {
        Self::literal(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_string_flattens_children() {
        let text = RichText::literal("Steve")
            .with_color("gold")
            .append(RichText::literal(" [admin]").with_bold(true));
        assert_eq!(text.to_plain_string(), "Steve [admin]");
        assert_eq!(text.to_string(), "Steve [admin]");
    }

    #[test]
    fn test_json_omits_unset_styles() {
        let json = RichText::literal("Alex").to_json().unwrap();
        assert_eq!(json, r#"{"text":"Alex"}"#);
    }

    #[test]
    fn test_json_roundtrip_keeps_styles() {
        let text = RichText::literal("Alex")
            .with_italic(true)
            .append(RichText::literal("!").with_color("red"));
        let back = RichText::from_json(&text.to_json().unwrap()).unwrap();
        assert_eq!(back, text);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(RichText::from_json("not json").is_err());
    }
}
