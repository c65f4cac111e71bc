/// Build the reviewer prompt around the (already truncated) CV text.
pub fn review_prompt(cv_text: &str) -> String {
    format!(
        r#"Role: You are an HR professional with 10 years of experience screening resumes for mid-level positions. You know what recruiters look for and what gets candidates called for interviews. You give honest, practical feedback that helps regular job seekers improve.

Objective: Review the CV and give practical feedback. Be direct and honest - if something needs work, say so clearly. Your goal is to help the candidate get more interviews.

Evaluation Focus:
- Does it read easily and quickly?
- Are achievements backed up with numbers or results?
- Is the language active and strong?
- Any red flags that might make recruiters pass?
- Will it pass computer screening (ATS)?

CV Content:
{cv_text}

Provide your review in this JSON format:
{{
  "hardTruth": "<3-sentence honest summary of what's wrong and why it might not get interviews>",
  "sectionCritique": {{
    "professionalSummary": "<is it a wish list or does it sell the person?>",
    "experienceAchievements": "<which bullets are just tasks vs actual results>",
    "skillsTechStack": "<real skills vs stuff everyone lists>"
  }},
  "deleteList": [<5 things to remove or fix>],
  "powerRewrite": "<rewrite the weakest bullet to sound more impressive with results>",
  "finalVerdict": {{
    "clarity": <1-10: is it easy to read and scan>,
    "impact": <1-10: do achievements sound impressive with numbers/results>,
    "hireability": <1-10: how likely to get an interview>,
    "criticalChange": "<the one thing to fix in 30 minutes that will make the biggest difference>"
  }}
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_cv_and_schema() {
        let p = review_prompt("Experienced engineer");
        assert!(p.contains("CV Content:\nExperienced engineer\n"));
        assert!(p.contains("\"finalVerdict\": {"));
        assert!(!p.contains("{{"));
    }
}
