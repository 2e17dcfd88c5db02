use crate::error::AppError;
use crate::gateway::GatewayError;
use crate::models::{category_map, NewQuestionPayload, Question, QuizPayload, SearchPayload};
use crate::quiz::{next_question, previous_ids, QuizCategory};
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

fn request_id_from_headers(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

fn internal(req_id: &str, op: &str, err: GatewayError) -> AppError {
    error!(request_id = %req_id, "{} failed: {}", op, err);
    AppError::internal()
}

fn parse_body<T: DeserializeOwned>(body: Result<Json<Value>, JsonRejection>) -> Result<T, AppError> {
    let Json(value) = body.map_err(|rejection| {
        debug!("rejected request body: {}", rejection);
        AppError::bad_request()
    })?;
    if !value.is_object() {
        return Err(AppError::bad_request());
    }
    serde_json::from_value(value).map_err(|_| AppError::bad_request())
}

fn parse_page(raw: Option<&str>) -> Result<u32, AppError> {
    match raw {
        None | Some("") => Ok(1),
        Some(raw) if raw.bytes().all(|b| b.is_ascii_digit()) => Ok(raw.parse().unwrap_or(u32::MAX)),
        Some(_) => Err(AppError::bad_request()),
    }
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub success: bool,
    pub categories: BTreeMap<i64, String>,
}

pub async fn list_categories(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CategoriesResponse>, AppError> {
    let req_id = request_id_from_headers(&headers);
    let categories = match state.gateway.list_categories().await {
        Ok(categories) => categories,
        Err(GatewayError::NotFound) => return Err(AppError::unprocessable()),
        Err(err) => return Err(internal(&req_id, "list categories", err)),
    };
    Ok(Json(CategoriesResponse {
        success: true,
        categories: category_map(&categories),
    }))
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuestionsResponse {
    pub success: bool,
    pub questions: Vec<Question>,
    pub total_questions: u64,
    pub current_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<BTreeMap<i64, String>>,
}

pub async fn list_questions(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<QuestionsResponse>, AppError> {
    let req_id = request_id_from_headers(&headers);
    let Query(query) = query.map_err(|_| AppError::bad_request())?;
    let page = parse_page(query.page.as_deref())?;

    let result = state
        .gateway
        .list_questions(page)
        .await
        .map_err(|err| internal(&req_id, "list questions", err))?;
    if result.total == 0 {
        return Err(AppError::not_found());
    }

    let categories = match state.gateway.list_categories().await {
        Ok(categories) => category_map(&categories),
        Err(GatewayError::NotFound) => BTreeMap::new(),
        Err(err) => return Err(internal(&req_id, "list categories", err)),
    };

    Ok(Json(QuestionsResponse {
        success: true,
        questions: result.items,
        total_questions: result.total,
        current_category: None,
        categories: Some(categories),
    }))
}

pub async fn delete_question(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let req_id = request_id_from_headers(&headers);
    let Path(id) = id.map_err(|_| AppError::not_found())?;

    let existing = state
        .gateway
        .find_question(id)
        .await
        .map_err(|err| internal(&req_id, "find question", err))?;
    if existing.is_none() {
        return Err(AppError::not_found());
    }

    match state.gateway.delete_question(id).await {
        Ok(()) => {
            info!(request_id = %req_id, "deleted question {}", id);
            Ok(Json(serde_json::json!({ "success": true, "deleted": id })))
        }
        Err(GatewayError::NotFound) => Err(AppError::not_found()),
        Err(err) => Err(internal(&req_id, "delete question", err)),
    }
}

pub async fn create_question(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let req_id = request_id_from_headers(&headers);
    let payload: NewQuestionPayload = parse_body(body)?;
    let question = payload.validate().map_err(|issues| {
        debug!(request_id = %req_id, ?issues, "question payload rejected");
        AppError::bad_request()
    })?;

    let id = state
        .gateway
        .insert_question(question)
        .await
        .map_err(|err| internal(&req_id, "insert question", err))?;
    info!(request_id = %req_id, "created question {}", id);
    Ok(Json(serde_json::json!({ "success": true, "created": id })))
}

pub async fn search_questions(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<QuestionsResponse>, AppError> {
    let req_id = request_id_from_headers(&headers);
    let payload: SearchPayload = parse_body(body)?;
    let term = payload.term().ok_or_else(AppError::bad_request)?;

    let result = state
        .gateway
        .search_questions(&term)
        .await
        .map_err(|err| internal(&req_id, "search questions", err))?;
    Ok(Json(QuestionsResponse {
        success: true,
        questions: result.items,
        total_questions: result.total,
        current_category: None,
        categories: None,
    }))
}

pub async fn questions_by_category(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<QuestionsResponse>, AppError> {
    let req_id = request_id_from_headers(&headers);
    let Path(id) = id.map_err(|_| AppError::not_found())?;

    let category = state
        .gateway
        .find_category(id)
        .await
        .map_err(|err| internal(&req_id, "find category", err))?
        .ok_or_else(AppError::not_found)?;

    let result = state
        .gateway
        .questions_by_category(category.id)
        .await
        .map_err(|err| internal(&req_id, "questions by category", err))?;
    Ok(Json(QuestionsResponse {
        success: true,
        questions: result.items,
        total_questions: result.total,
        current_category: Some(category.kind),
        categories: None,
    }))
}

#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub success: bool,
    pub question: Question,
}

pub async fn play_quiz(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<QuizResponse>, AppError> {
    let req_id = request_id_from_headers(&headers);
    let payload: QuizPayload = parse_body(body)?;
    let (Some(previous), Some(category)) = (
        payload.previous_questions.filter(|v| !v.is_null()),
        payload.quiz_category.filter(|v| !v.is_null()),
    ) else {
        return Err(AppError::bad_request());
    };
    // present but unreadable: 500
    let previous = previous_ids(&previous).ok_or_else(|| {
        warn!(request_id = %req_id, %previous, "previous_questions is not an array");
        AppError::internal()
    })?;
    let category = QuizCategory::from_json(&category).ok_or_else(|| {
        warn!(request_id = %req_id, %category, "quiz_category has no usable id");
        AppError::internal()
    })?;

    let question = next_question(state.gateway.as_ref(), category, &previous, state.random.as_ref())
        .await
        .map_err(|err| internal(&req_id, "load quiz pool", err))?;
    match question {
        Some(question) => Ok(Json(QuizResponse { success: true, question })),
        None => {
            warn!(request_id = %req_id, ?category, "no questions to draw from");
            Err(AppError::internal())
        }
    }
}

pub async fn method_not_allowed() -> AppError {
    AppError::method_not_allowed()
}

pub async fn not_found() -> AppError {
    AppError::not_found()
}
