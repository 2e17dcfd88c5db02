use crate::models::{Category, NewQuestion, Question, QUESTIONS_PER_PAGE};
use futures::future::BoxFuture;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("record not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invalid row: {0}")]
    InvalidRow(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    // 1-based
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: QUESTIONS_PER_PAGE,
        }
    }

    pub fn first() -> Self {
        Self::new(1)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.per_page)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionFilter {
    pub search: Option<String>,
    pub category: Option<i64>,
}

impl QuestionFilter {
    pub fn matches(&self, question: &Question) -> bool {
        if let Some(category) = self.category {
            if question.category != category {
                return false;
            }
        }
        match &self.search {
            Some(term) => question
                .question
                .to_lowercase()
                .contains(&term.to_lowercase()),
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionQuery {
    pub filter: QuestionFilter,
    pub page: PageRequest,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionPage {
    pub items: Vec<Question>,
    // across all pages
    pub total: u64,
}

pub trait TriviaGateway: Send + Sync {
    /// Ordered by type. Fails with `NotFound` when there are none.
    fn list_categories(&self) -> BoxFuture<'_, GatewayResult<Vec<Category>>>;

    fn find_category(&self, id: i64) -> BoxFuture<'_, GatewayResult<Option<Category>>>;

    fn find_question(&self, id: i64) -> BoxFuture<'_, GatewayResult<Option<Question>>>;

    /// Items ordered by id; pages past the end come back empty with the real total.
    fn query_questions(&self, query: QuestionQuery) -> BoxFuture<'_, GatewayResult<QuestionPage>>;

    fn candidate_pool(&self, category: Option<i64>) -> BoxFuture<'_, GatewayResult<Vec<Question>>>;

    fn insert_question(&self, question: NewQuestion) -> BoxFuture<'_, GatewayResult<i64>>;

    fn delete_question(&self, id: i64) -> BoxFuture<'_, GatewayResult<()>>;

    fn list_questions(&self, page: u32) -> BoxFuture<'_, GatewayResult<QuestionPage>> {
        self.query_questions(QuestionQuery {
            filter: QuestionFilter::default(),
            page: PageRequest::new(page),
        })
    }

    /// First page only; an empty term matches nothing.
    fn search_questions(&self, term: &str) -> BoxFuture<'_, GatewayResult<QuestionPage>> {
        if term.is_empty() {
            return Box::pin(async { Ok(QuestionPage::default()) });
        }
        self.query_questions(QuestionQuery {
            filter: QuestionFilter {
                search: Some(term.to_string()),
                category: None,
            },
            page: PageRequest::first(),
        })
    }

    fn questions_by_category(&self, category: i64) -> BoxFuture<'_, GatewayResult<QuestionPage>> {
        self.query_questions(QuestionQuery {
            filter: QuestionFilter {
                search: None,
                category: Some(category),
            },
            page: PageRequest::first(),
        })
    }
}
