use serde::Serialize;

/// Tone of a reply. Routing never looks at it; only presentation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Success,
    Error,
    Warning,
    Neutral,
}

impl Severity {
    pub fn marker(&self) -> &'static str {
        match self {
            Severity::Success => "✅",
            Severity::Error => "❌",
            Severity::Warning => "⚠️",
            Severity::Neutral => "▫️",
        }
    }
}

/// A message reply ready to be sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyPayload {
    pub content: String,
    pub severity: Severity,
    pub ephemeral: bool,
}

impl ReplyPayload {
    pub fn new(content: impl Into<String>, severity: Severity, ephemeral: bool) -> Self {
        Self {
            content: content.into(),
            severity,
            ephemeral,
        }
    }

    /// Content with the severity marker in front
    pub fn render(&self) -> String {
        format!("{} {}", self.severity.marker(), self.content)
    }
}

/// The first response to an interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitialResponse {
    Message(ReplyPayload),
    /// "Thinking..." placeholder; the real content follows later
    Deferred { ephemeral: bool },
    Pong,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_prefixes_marker() {
        let payload = ReplyPayload::new("Done.", Severity::Success, false);
        assert_eq!(payload.render(), "✅ Done.");
        assert_eq!(ReplyPayload::new("0", Severity::Neutral, false).render(), "▫️ 0");
    }
}
