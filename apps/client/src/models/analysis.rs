#![allow(dead_code)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::resume::ResumeId;

// ────────────────────────────────────────────────────────────────────────────
// Requests
// ────────────────────────────────────────────────────────────────────────────

/// How the user prefers to learn. The wire strings are fixed by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LearningPreference {
    #[default]
    #[serde(rename = "Coding Projects")]
    CodingProjects,
    #[serde(rename = "Video Courses")]
    VideoCourses,
    #[serde(rename = "Reading / Docs")]
    ReadingDocs,
}

impl LearningPreference {
    pub const ALL: [LearningPreference; 3] = [
        LearningPreference::CodingProjects,
        LearningPreference::VideoCourses,
        LearningPreference::ReadingDocs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LearningPreference::CodingProjects => "Coding Projects",
            LearningPreference::VideoCourses => "Video Courses",
            LearningPreference::ReadingDocs => "Reading / Docs",
        }
    }
}

impl fmt::Display for LearningPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LearningPreference {
    type Err = String;

    /// Accepts the wire label or a short alias (`projects`, `videos`, `reading`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        match needle.as_str() {
            "coding projects" | "projects" | "coding" => Ok(LearningPreference::CodingProjects),
            "video courses" | "videos" | "video" => Ok(LearningPreference::VideoCourses),
            "reading / docs" | "reading" | "docs" => Ok(LearningPreference::ReadingDocs),
            _ => Err(format!(
                "unknown learning preference '{s}' (expected one of: {})",
                LearningPreference::ALL.map(|p| p.as_str()).join(", ")
            )),
        }
    }
}

/// Body of `POST /skill-gap/analyze`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillGapRequest {
    pub resume_id: ResumeId,
    pub role_name: String,
    pub learning_preference: LearningPreference,
}

/// Body of `POST /resume/optimize`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizeRequest {
    pub resume_id: ResumeId,
    pub role_name: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Skill gap report
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    Matched,
    Partial,
    Missing,
}

/// One actionable step of a learning plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningStep {
    #[serde(rename = "step_title")]
    pub title: String,
    pub estimated_hours: f64,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillComparison {
    pub skill_name: String,
    pub match_status: MatchStatus,
    pub justification: String,
    /// Empty for matched skills; the service sends `null` there.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub learning_plan: Vec<LearningStep>,
}

impl SkillComparison {
    pub fn total_hours(&self) -> f64 {
        self.learning_plan.iter().map(|s| s.estimated_hours).sum()
    }
}

/// Result of a skill-gap analysis for one resume against one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillGapReport {
    /// 0 – 100
    #[serde(rename = "skill_match_score")]
    pub score: f64,
    #[serde(rename = "analysis_summary")]
    pub summary: String,
    #[serde(rename = "skill_comparison")]
    pub comparisons: Vec<SkillComparison>,
}

impl SkillGapReport {
    /// Checks the numeric bounds the service promises. Returns a description of
    /// the first violation.
    pub fn check_bounds(&self) -> Result<(), String> {
        if !(0.0..=100.0).contains(&self.score) {
            return Err(format!("skill match score {} outside 0-100", self.score));
        }
        for comparison in &self.comparisons {
            if let Some(step) = comparison
                .learning_plan
                .iter()
                .find(|s| s.estimated_hours.is_nan() || s.estimated_hours < 0.0)
            {
                return Err(format!(
                    "learning step '{}' for {} has invalid hours {}",
                    step.title, comparison.skill_name, step.estimated_hours
                ));
            }
        }
        Ok(())
    }

    pub fn count(&self, status: MatchStatus) -> usize {
        self.comparisons
            .iter()
            .filter(|c| c.match_status == status)
            .count()
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
