use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const QUESTIONS_PER_PAGE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Question {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub category: i64,
    pub difficulty: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub question: String,
    pub answer: String,
    pub category: i64,
    pub difficulty: i32,
}

pub fn category_map(categories: &[Category]) -> BTreeMap<i64, String> {
    categories
        .iter()
        .map(|c| (c.id, c.kind.clone()))
        .collect()
}

/// Accepts `1`, `1.0` and `"1"`.
pub fn lenient_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn lenient_i32(value: &Value) -> Option<i32> {
    lenient_i64(value).and_then(|v| i32::try_from(v).ok())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub issue: &'static str,
}

// Optional fields so an incomplete body reaches validation.
#[derive(Debug, Default, Deserialize)]
pub struct NewQuestionPayload {
    pub question: Option<Value>,
    pub answer: Option<Value>,
    pub difficulty: Option<Value>,
    pub category: Option<Value>,
}

impl NewQuestionPayload {
    pub fn validate(self) -> Result<NewQuestion, Vec<ValidationIssue>> {
        let mut issues = Vec::new();

        let question = required_text(self.question, "question", &mut issues);
        let answer = required_text(self.answer, "answer", &mut issues);
        let difficulty = match self.difficulty.filter(|v| !v.is_null()) {
            None => {
                issues.push(ValidationIssue { field: "difficulty", issue: "is required" });
                None
            }
            Some(v) => {
                let parsed = lenient_i32(&v);
                if parsed.is_none() {
                    issues.push(ValidationIssue { field: "difficulty", issue: "must be an integer" });
                }
                parsed
            }
        };
        let category = match self.category.filter(|v| !v.is_null()) {
            None => {
                issues.push(ValidationIssue { field: "category", issue: "is required" });
                None
            }
            Some(v) => {
                let parsed = lenient_i64(&v);
                if parsed.is_none() {
                    issues.push(ValidationIssue { field: "category", issue: "must be an integer id" });
                }
                parsed
            }
        };

        match (question, answer, difficulty, category) {
            (Some(question), Some(answer), Some(difficulty), Some(category)) if issues.is_empty() => {
                Ok(NewQuestion { question, answer, category, difficulty })
            }
            _ => Err(issues),
        }
    }
}

fn required_text(value: Option<Value>, field: &'static str, issues: &mut Vec<ValidationIssue>) -> Option<String> {
    match value {
        None | Some(Value::Null) => {
            issues.push(ValidationIssue { field, issue: "is required" });
            None
        }
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(_) => {
            issues.push(ValidationIssue { field, issue: "must be text" });
            None
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchPayload {
    #[serde(rename = "searchTerm")]
    pub search_term: Option<Value>,
}

impl SearchPayload {
    // `5` searches for "5".
    pub fn term(self) -> Option<String> {
        match self.search_term? {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct QuizPayload {
    pub previous_questions: Option<Value>,
    pub quiz_category: Option<Value>,
}
