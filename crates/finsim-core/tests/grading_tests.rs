use finsim_core::grading::{build_prompts, parse_grade_response, GradeRequest};
use finsim_core::FinSimError;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

fn request(answer: &str) -> GradeRequest {
    GradeRequest {
        question: "What happens to the three statements when depreciation goes up by $10?".into(),
        reference_answer: Some("Net income falls by $6 at a 40% tax rate; cash rises by $4.".into()),
        user_answer: answer.into(),
    }
}

#[test]
fn test_request_deserializes_without_reference() {
    let json = r#"{"question": "Why is EBITDA used?", "user_answer": "It approximates operating cash flow."}"#;
    let req: GradeRequest = serde_json::from_str(json).unwrap();
    assert!(req.reference_answer.is_none());
    let prompt = build_prompts(&req).unwrap();
    assert!(prompt.user.contains("No reference answer provided."));
}

#[test]
fn test_blank_question_rejected() {
    let mut req = request("Net income drops.");
    req.question = String::new();
    match build_prompts(&req).unwrap_err() {
        FinSimError::InvalidInput { field, .. } => assert_eq!(field, "question"),
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_prompt_carries_all_three_texts() {
    let prompt = build_prompts(&request("Net income drops by 6, cash up 4.")).unwrap();
    assert!(prompt.user.contains("depreciation goes up by $10"));
    assert!(prompt.user.contains("cash rises by $4"));
    assert!(prompt.user.contains("Net income drops by 6, cash up 4."));
    assert!(prompt.system.contains("Grading criteria:"));
}

#[test]
fn test_fenced_reply_is_recovered() {
    let raw = r#"```json
{
  "score": 9,
  "strengths": ["Correct tax shield", "Walks all three statements"],
  "weaknesses": [],
  "improvements": ["Mention the balance sheet check"],
  "summary": "Near-perfect answer."
}
```"#;
    let grade = parse_grade_response(raw);
    assert_eq!(grade.score, dec!(9));
    assert_eq!(grade.strengths.len(), 2);
    assert_eq!(grade.improvements, vec!["Mention the balance sheet check".to_string()]);
}

#[test]
fn test_reply_missing_score_falls_back() {
    let grade = parse_grade_response(r#"{"summary": "Good effort"}"#);
    assert!(grade.is_sentinel());
    assert_eq!(grade.score, dec!(-1));
    assert!(grade.strengths.is_empty());
}
