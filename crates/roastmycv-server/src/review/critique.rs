//! The structured review a model returns, and the fallback used when it doesn't.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Critique {
    pub hard_truth: String,
    pub section_critique: SectionCritique,
    pub delete_list: Vec<String>,
    pub power_rewrite: String,
    pub final_verdict: FinalVerdict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionCritique {
    pub professional_summary: String,
    pub experience_achievements: String,
    pub skills_tech_stack: String,
}

/// Scores are 1-10.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalVerdict {
    pub clarity: u8,
    pub impact: u8,
    pub hireability: u8,
    pub critical_change: String,
}

const SCORE_RANGE: std::ops::RangeInclusive<u8> = 1..=10;

impl Critique {
    /// Shown when the model's output can't be used.
    pub fn placeholder() -> Self {
        let failed = || "Analysis failed".to_string();
        Self {
            hard_truth: "Unable to parse AI response. Please try again.".to_string(),
            section_critique: SectionCritique {
                professional_summary: failed(),
                experience_achievements: failed(),
                skills_tech_stack: failed(),
            },
            delete_list: vec!["Please try again or review manually".to_string()],
            power_rewrite: failed(),
            final_verdict: FinalVerdict {
                clarity: 5,
                impact: 5,
                hireability: 5,
                critical_change: "Retry the analysis".to_string(),
            },
        }
    }

    /// Parse model output. `None` if it isn't a well-formed critique.
    pub fn parse(text: &str) -> Option<Self> {
        let critique: Critique = serde_json::from_str(strip_json_fences(text)).ok()?;
        let v = &critique.final_verdict;
        [v.clarity, v.impact, v.hireability]
            .iter()
            .all(|s| SCORE_RANGE.contains(s))
            .then_some(critique)
    }

    /// Mean of the three verdict scores.
    pub fn average_score(&self) -> f64 {
        let v = &self.final_verdict;
        (f64::from(v.clarity) + f64::from(v.impact) + f64::from(v.hireability)) / 3.0
    }
}

/// Models sometimes wrap JSON in ```json fences even when asked not to.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(inner) = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
    else {
        return text;
    };
    inner
        .trim_start()
        .strip_suffix("```")
        .map(str::trim)
        .unwrap_or(inner.trim_start())
}
