//! Delimiter lines: `\n∞∞∞<language>(-a)?(;key=value)*\n`.
//!
//! Only `created` is interpreted. Every other metadata entry is carried along
//! untouched so rewriting a delimiter (new language, fresh timestamp) never
//! loses what another tool wrote there.

use blockpad_syntax::{LanguageTable, SENTINEL};
use chrono::{DateTime, SecondsFormat, Utc};

pub const AUTO_FLAG: &str = "-a";
pub const CREATED_KEY: &str = "created";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiter {
    pub language: String,
    pub auto: bool,
    pub created: Option<DateTime<Utc>>,
    /// Entries other than a valid `created`, in source order
    pub metadata: Vec<(String, String)>,
}

impl Delimiter {
    pub fn new(language: impl Into<String>, auto: bool) -> Self {
        Self {
            language: language.into(),
            auto,
            created: None,
            metadata: Vec::new(),
        }
    }

    /// Build from raw metadata entries. The first `created` entry holding a
    /// valid timestamp becomes [`Delimiter::created`]; anything else stays an
    /// opaque entry.
    pub fn from_entries(
        language: impl Into<String>,
        auto: bool,
        entries: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        let mut delimiter = Self::new(language, auto);
        for (key, value) in entries {
            if delimiter.created.is_none()
                && key == CREATED_KEY
                && let Some(created) = parse_timestamp(&value)
            {
                delimiter.created = Some(created);
                continue;
            }
            delimiter.metadata.push((key, value));
        }
        delimiter
    }

    /// Set `created`, dropping any opaque `created` entry it replaces.
    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self.metadata.retain(|(key, _)| key != CREATED_KEY);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>, auto: bool) -> Self {
        self.language = language.into();
        self.auto = auto;
        self
    }

    /// Parse a delimiter line without its surrounding newlines.
    pub fn parse_line(line: &str, languages: &LanguageTable) -> Option<Self> {
        if line.contains('\n') {
            return None;
        }

        let rest = line.strip_prefix(SENTINEL)?;
        let token_len = rest
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();
        let (language, mut rest) = rest.split_at(token_len);
        if language.is_empty() || !languages.contains(language) {
            return None;
        }

        let auto = match rest.strip_prefix(AUTO_FLAG) {
            Some(after) if after.is_empty() || after.starts_with(';') => {
                rest = after;
                true
            }
            _ => false,
        };

        let mut entries = Vec::new();
        if !rest.is_empty() {
            let entries_text = rest.strip_prefix(';')?;
            for entry in entries_text.split(';') {
                let (key, value) = entry.split_once('=')?;
                if !is_valid_key(key) {
                    return None;
                }
                entries.push((key.to_string(), value.to_string()));
            }
        }

        Some(Self::from_entries(language, auto, entries))
    }

    /// Parse full delimiter text, both newlines included.
    pub fn parse(text: &str, languages: &LanguageTable) -> Option<Self> {
        let line = text.strip_prefix('\n')?.strip_suffix('\n')?;
        Self::parse_line(line, languages)
    }

    /// The delimiter line without its surrounding newlines.
    pub fn line(&self) -> String {
        let mut line = format!("{SENTINEL}{}", self.language);
        if self.auto {
            line.push_str(AUTO_FLAG);
        }
        if let Some(created) = self.created {
            line.push(';');
            line.push_str(CREATED_KEY);
            line.push('=');
            line.push_str(&format_timestamp(created));
        }
        for (key, value) in &self.metadata {
            line.push(';');
            line.push_str(key);
            line.push('=');
            line.push_str(value);
        }
        line
    }

    pub fn to_text(&self) -> String {
        format!("\n{}\n", self.line())
    }
}

/// Canonical delimiter text for a block with no extra metadata.
pub fn serialize(language: &str, auto: bool, created: Option<DateTime<Utc>>) -> String {
    let mut delimiter = Delimiter::new(language, auto);
    delimiter.created = created;
    delimiter.to_text()
}

/// RFC 3339 with millisecond precision and a `Z` suffix.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|timestamp| timestamp.with_timezone(&Utc))
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}
