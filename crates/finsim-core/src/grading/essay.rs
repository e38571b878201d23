//! Boundary types for the essay grader.
//!
//! The completion call itself belongs to the caller. This module builds the
//! fixed instruction template and turns whatever text comes back into an
//! [`EssayGrade`], falling back to a sentinel instead of failing.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::FinSimError;
use crate::FinSimResult;

/// Score reported when the grader's reply could not be used.
pub const SENTINEL_SCORE: Decimal = dec!(-1);

const MAX_SCORE: Decimal = dec!(10);

const APOLOGY: &str = "Sorry, we couldn't grade this answer right now. Please try again.";

const NO_REFERENCE: &str = "No reference answer provided.";

const SYSTEM_PROMPT: &str = r#"You are an expert Investment Banking interview coach. You grade candidates' answers to IB interview questions.

You MUST respond with valid JSON only, no markdown, no extra text. Use this exact format:
{
  "score": <number 0-10>,
  "strengths": ["strength1", "strength2"],
  "weaknesses": ["weakness1", "weakness2"],
  "improvements": ["improvement1", "improvement2"],
  "summary": "One sentence overall assessment"
}

Grading criteria:
- 9-10: Perfect answer, demonstrates deep understanding, well-structured, covers all key points
- 7-8: Strong answer, covers most key points, minor gaps
- 5-6: Adequate answer, covers some key points but missing important details
- 3-4: Weak answer, major gaps in understanding
- 1-2: Poor answer, largely incorrect or irrelevant
- 0: No meaningful content or completely wrong

Be fair but thorough. Compare against the reference answer for completeness and accuracy."#;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeRequest {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_answer: Option<String>,
    pub user_answer: String,
}

impl GradeRequest {
    pub fn validate(&self) -> FinSimResult<()> {
        if self.question.trim().is_empty() {
            return Err(FinSimError::InvalidInput {
                field: "question".into(),
                reason: "Question is required".into(),
            });
        }
        if self.user_answer.trim().is_empty() {
            return Err(FinSimError::InvalidInput {
                field: "user_answer".into(),
                reason: "Answer is required".into(),
            });
        }
        Ok(())
    }
}

/// System and user messages for one grading call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingPrompt {
    pub system: String,
    pub user: String,
}

pub fn build_prompts(request: &GradeRequest) -> FinSimResult<GradingPrompt> {
    request.validate()?;

    let reference = request
        .reference_answer
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(NO_REFERENCE);

    let user = format!(
        "**Interview Question:**\n{}\n\n**Reference Answer (ideal):**\n{}\n\n**Candidate's Answer:**\n{}\n\nGrade this answer. Return JSON only.",
        request.question, reference, request.user_answer
    );

    Ok(GradingPrompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
    })
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EssayGrade {
    /// 0–10, or [`SENTINEL_SCORE`] when grading failed
    pub score: Decimal,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

impl EssayGrade {
    pub fn sentinel() -> Self {
        EssayGrade {
            score: SENTINEL_SCORE,
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            improvements: Vec::new(),
            summary: APOLOGY.to_string(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.score == SENTINEL_SCORE
    }
}

/// Interpret the grader's raw reply.
///
/// Accepts a bare JSON object, or the outermost `{...}` span when the model
/// wrapped it in prose or a code fence. Anything unusable becomes the
/// sentinel grade.
pub fn parse_grade_response(raw: &str) -> EssayGrade {
    let trimmed = raw.trim();
    let parsed = serde_json::from_str::<EssayGrade>(trimmed).or_else(|e| {
        match (trimmed.find('{'), trimmed.rfind('}')) {
            (Some(open), Some(close)) if open < close => {
                serde_json::from_str::<EssayGrade>(&trimmed[open..=close])
            }
            _ => Err(e),
        }
    });

    match parsed {
        Ok(grade) if grade.score >= Decimal::ZERO && grade.score <= MAX_SCORE => grade,
        Ok(grade) => {
            warn!(score = %grade.score, "grader returned a score outside 0-10");
            EssayGrade::sentinel()
        }
        Err(e) => {
            warn!(error = %e, "grader reply was not valid grade JSON");
            EssayGrade::sentinel()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GradeRequest {
        GradeRequest {
            question: "Walk me through a DCF.".into(),
            reference_answer: None,
            user_answer: "Project free cash flows, discount them at WACC...".into(),
        }
    }

    #[test]
    fn test_prompts_include_question_and_answer() {
        let prompt = build_prompts(&request()).unwrap();
        assert!(prompt.system.starts_with("You are an expert Investment Banking interview coach."));
        assert!(prompt.user.contains("**Interview Question:**\nWalk me through a DCF."));
        assert!(prompt.user.contains(NO_REFERENCE));
        assert!(prompt.user.ends_with("Grade this answer. Return JSON only."));
    }

    #[test]
    fn test_prompts_use_reference_when_present() {
        let mut req = request();
        req.reference_answer = Some("Unlevered FCF, terminal value, discount.".into());
        let prompt = build_prompts(&req).unwrap();
        assert!(prompt.user.contains("Unlevered FCF, terminal value, discount."));
        assert!(!prompt.user.contains(NO_REFERENCE));
    }

    #[test]
    fn test_missing_answer_rejected() {
        let mut req = request();
        req.user_answer = "   ".into();
        let err = build_prompts(&req).unwrap_err();
        assert!(matches!(err, FinSimError::InvalidInput { ref field, .. } if field == "user_answer"));
    }

    #[test]
    fn test_parse_clean_json() {
        let grade = parse_grade_response(
            r#"{"score": 7, "strengths": ["clear"], "weaknesses": [], "improvements": ["mention TV"], "summary": "Solid."}"#,
        );
        assert_eq!(grade.score, dec!(7));
        assert_eq!(grade.strengths, vec!["clear".to_string()]);
        assert_eq!(grade.summary, "Solid.");
        assert!(!grade.is_sentinel());
    }

    #[test]
    fn test_parse_json_wrapped_in_prose() {
        let raw = "Here is the grade:\n```json\n{\"score\": 8.5, \"summary\": \"Strong.\"}\n```";
        let grade = parse_grade_response(raw);
        assert_eq!(grade.score, dec!(8.5));
        assert!(grade.weaknesses.is_empty());
    }

    #[test]
    fn test_garbage_yields_sentinel() {
        let grade = parse_grade_response("I cannot grade this.");
        assert!(grade.is_sentinel());
        assert_eq!(grade.summary, APOLOGY);
        assert_eq!(parse_grade_response(""), EssayGrade::sentinel());
    }

    #[test]
    fn test_out_of_range_score_yields_sentinel() {
        assert!(parse_grade_response(r#"{"score": 11}"#).is_sentinel());
        assert!(parse_grade_response(r#"{"score": -3}"#).is_sentinel());
    }
}
