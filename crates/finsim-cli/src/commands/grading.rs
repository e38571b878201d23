use clap::Args;
use serde_json::Value;

use finsim_core::grading::{self, GradeRequest};

use crate::input;

/// Arguments for building grading prompts
#[derive(Args)]
pub struct GradePromptArgs {
    /// Interview question
    #[arg(long)]
    pub question: Option<String>,

    /// Candidate's answer
    #[arg(long)]
    pub answer: Option<String>,

    /// Ideal answer to compare against
    #[arg(long)]
    pub reference: Option<String>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for parsing a grader reply
#[derive(Args)]
pub struct ParseGradeArgs {
    /// Path to a file holding the raw reply text
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_grade_prompt(args: GradePromptArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: GradeRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        GradeRequest {
            question: args
                .question
                .ok_or("--question is required (or provide --input)")?,
            reference_answer: args.reference,
            user_answer: args
                .answer
                .ok_or("--answer is required (or provide --input)")?,
        }
    };
    let prompts = grading::build_prompts(&request)?;
    Ok(serde_json::to_value(prompts)?)
}

/// Raw replies are free text, so stdin is read verbatim rather than as JSON.
pub fn run_parse_grade(args: ParseGradeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let raw = if let Some(ref path) = args.input {
        input::file::read_text(path)?
    } else if let Some(text) = input::stdin::read_stdin_text()? {
        text
    } else {
        return Err("--input <reply.txt> or stdin required for parse-grade".into());
    };
    Ok(serde_json::to_value(grading::parse_grade_response(&raw))?)
}
