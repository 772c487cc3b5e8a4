#![allow(dead_code)]

use std::fmt;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier of a stored resume. Assigned by the service, opaque to the client.
///
/// The service uses integer ids; they are sent back as JSON numbers so the
/// request bodies match what the service validates against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResumeId(String);

impl ResumeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The integer form, only when the id is a canonical integer (`"7"`, not `"007"`).
    fn as_integer(&self) -> Option<i64> {
        self.0
            .parse::<i64>()
            .ok()
            .filter(|n| n.to_string() == self.0)
    }
}

impl fmt::Display for ResumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResumeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl Serialize for ResumeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_integer() {
            Some(n) => serializer.serialize_i64(n),
            None => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for ResumeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => ResumeId(n.to_string()),
            RawId::Text(s) => ResumeId(s),
        })
    }
}

/// One entry of `GET /resume/history`. Created server-side on upload, never
/// mutated by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub id: ResumeId,
    pub original_filename: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub uploaded_at: DateTime<Utc>,
}

impl ResumeRecord {
    /// How a record is offered for selection: `resume.pdf (Mar 4, 2025, 09:15 AM)`.
    pub fn label(&self) -> String {
        format!(
            "{} ({})",
            self.original_filename,
            self.uploaded_at.format("%b %-d, %Y, %I:%M %p")
        )
    }
}

/// Accepts RFC 3339 timestamps and naive ISO-8601 ones (read as UTC).
fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>().map(|naive| naive.and_utc())
}

/// Response of `POST /resume/upload`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadReceipt {
    pub resume_id: ResumeId,
    #[serde(default)]
    pub original_filename: Option<String>,
    #[serde(default)]
    pub extracted_text_preview: Option<String>,
}

/// A resume file staged for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ResumeFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type_for(&file_name);
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "resume.pdf".to_string());
        Ok(Self::new(file_name, bytes))
    }
}

/// The service only accepts PDFs; anything else is sent as-is and rejected remotely.
fn content_type_for(file_name: &str) -> &'static str {
    if file_name.to_lowercase().ends_with(".pdf") {
        "application/pdf"
    } else {
        "application/octet-stream"
    }
}

/// Response of `POST /resume/optimize`. The text is plain and whitespace-significant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedResume {
    #[serde(rename = "optimized_resume_text")]
    pub text: String,
}
