pub mod essay;

pub use essay::{build_prompts, parse_grade_response, EssayGrade, GradeRequest, GradingPrompt};
