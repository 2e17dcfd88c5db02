use crate::gateway::{GatewayError, GatewayResult, QuestionPage, QuestionQuery, TriviaGateway};
use crate::models::{Category, NewQuestion, Question};
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

// Same rows as migrations/0002_seed_categories.sql.
pub const DEFAULT_CATEGORIES: [&str; 6] = [
    "Science",
    "Art",
    "Geography",
    "History",
    "Entertainment",
    "Sports",
];

pub struct InMemoryGateway {
    categories: RwLock<BTreeMap<i64, Category>>,
    questions: RwLock<BTreeMap<i64, Question>>,
    next_question_id: AtomicI64,
}

impl InMemoryGateway {
    pub fn new(categories: Vec<Category>) -> Self {
        Self {
            categories: RwLock::new(categories.into_iter().map(|c| (c.id, c)).collect()),
            questions: RwLock::new(BTreeMap::new()),
            next_question_id: AtomicI64::new(1),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn seeded() -> Self {
        Self::new(
            DEFAULT_CATEGORIES
                .iter()
                .zip(1..)
                .map(|(kind, id)| Category { id, kind: kind.to_string() })
                .collect(),
        )
    }

    fn next_question_id(&self) -> i64 {
        self.next_question_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::seeded()
    }
}

impl TriviaGateway for InMemoryGateway {
    fn list_categories(&self) -> BoxFuture<'_, GatewayResult<Vec<Category>>> {
        Box::pin(async move {
            let mut categories: Vec<Category> = self.categories.read().await.values().cloned().collect();
            if categories.is_empty() {
                return Err(GatewayError::NotFound);
            }
            // matches the case-insensitive collation of `categories.type`
            categories.sort_by(|a, b| {
                a.kind
                    .to_lowercase()
                    .cmp(&b.kind.to_lowercase())
                    .then(a.id.cmp(&b.id))
            });
            Ok(categories)
        })
    }

    fn find_category(&self, id: i64) -> BoxFuture<'_, GatewayResult<Option<Category>>> {
        Box::pin(async move { Ok(self.categories.read().await.get(&id).cloned()) })
    }

    fn find_question(&self, id: i64) -> BoxFuture<'_, GatewayResult<Option<Question>>> {
        Box::pin(async move { Ok(self.questions.read().await.get(&id).cloned()) })
    }

    fn query_questions(&self, query: QuestionQuery) -> BoxFuture<'_, GatewayResult<QuestionPage>> {
        Box::pin(async move {
            let questions = self.questions.read().await;
            let matching: Vec<&Question> = questions
                .values()
                .filter(|q| query.filter.matches(q))
                .collect();
            let offset = usize::try_from(query.page.offset()).unwrap_or(usize::MAX);
            let items = matching
                .iter()
                .skip(offset)
                .take(query.page.per_page as usize)
                .map(|q| (*q).clone())
                .collect();
            Ok(QuestionPage {
                items,
                total: matching.len() as u64,
            })
        })
    }

    fn candidate_pool(&self, category: Option<i64>) -> BoxFuture<'_, GatewayResult<Vec<Question>>> {
        Box::pin(async move {
            Ok(self
                .questions
                .read()
                .await
                .values()
                .filter(|q| category.map_or(true, |c| q.category == c))
                .cloned()
                .collect())
        })
    }

    fn insert_question(&self, question: NewQuestion) -> BoxFuture<'_, GatewayResult<i64>> {
        Box::pin(async move {
            let id = self.next_question_id();
            let record = Question {
                id,
                question: question.question,
                answer: question.answer,
                category: question.category,
                difficulty: question.difficulty,
            };
            self.questions.write().await.insert(id, record);
            Ok(id)
        })
    }

    fn delete_question(&self, id: i64) -> BoxFuture<'_, GatewayResult<()>> {
        Box::pin(async move {
            self.questions
                .write()
                .await
                .remove(&id)
                .map(|_| ())
                .ok_or(GatewayError::NotFound)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn new_question(text: &str, category: i64) -> NewQuestion {
        NewQuestion {
            question: text.into(),
            answer: "answer".into(),
            category,
            difficulty: 2,
        }
    }

    async fn filled(count: usize) -> InMemoryGateway {
        let gw = InMemoryGateway::seeded();
        for i in 0..count {
            gw.insert_question(new_question(&format!("Question {i}"), (i % 3) as i64 + 1))
                .await
                .unwrap();
        }
        gw
    }

    #[tokio::test]
    async fn categories_sorted_by_type() {
        let gw = InMemoryGateway::seeded();
        let kinds: Vec<_> = gw
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.kind)
            .collect();
        assert_eq!(kinds, vec!["Art", "Entertainment", "Geography", "History", "Science", "Sports"]);
    }

    #[tokio::test]
    async fn categories_sort_ignores_case() {
        let gw = InMemoryGateway::new(vec![
            Category { id: 1, kind: "beta".into() },
            Category { id: 2, kind: "Gamma".into() },
            Category { id: 3, kind: "alpha".into() },
            Category { id: 4, kind: "Alpha".into() },
        ]);
        let ids: Vec<_> = gw.list_categories().await.unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 4, 1, 2]);
    }

    #[tokio::test]
    async fn empty_categories_is_not_found() {
        let gw = InMemoryGateway::empty();
        assert!(matches!(gw.list_categories().await, Err(GatewayError::NotFound)));
    }

    #[tokio::test]
    async fn pages_cover_every_question_once() {
        let gw = filled(23).await;
        let first = gw.list_questions(1).await.unwrap();
        assert_eq!(first.total, 23);

        let pages = first.total.div_ceil(10) as u32;
        let mut seen = HashSet::new();
        for page in 1..=pages {
            let result = gw.list_questions(page).await.unwrap();
            assert!(result.items.len() <= 10);
            for q in result.items {
                assert!(seen.insert(q.id), "question {} listed twice", q.id);
            }
        }
        assert_eq!(seen.len(), 23);
    }

    #[tokio::test]
    async fn page_past_end_is_empty_with_total() {
        let gw = filled(5).await;
        let result = gw.list_questions(4).await.unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.total, 5);
    }

    #[tokio::test]
    async fn delete_then_find_is_gone() {
        let gw = filled(2).await;
        gw.delete_question(1).await.unwrap();
        assert_eq!(gw.find_question(1).await.unwrap(), None);
        assert!(matches!(gw.delete_question(1).await, Err(GatewayError::NotFound)));
    }

    #[tokio::test]
    async fn insert_appears_once_in_category() {
        let gw = filled(4).await;
        let id = gw.insert_question(new_question("Fresh", 6)).await.unwrap();
        let page = gw.questions_by_category(6).await.unwrap();
        assert_eq!(page.items.iter().filter(|q| q.id == id).count(), 1);
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn search_empty_or_missing_term() {
        let gw = filled(4).await;
        assert_eq!(gw.search_questions("").await.unwrap(), QuestionPage::default());
        let none = gw.search_questions("zebra").await.unwrap();
        assert!(none.items.is_empty());
        assert_eq!(none.total, 0);
        let some = gw.search_questions("QUESTION 3").await.unwrap();
        assert_eq!(some.total, 1);
    }

    #[tokio::test]
    async fn search_and_category_only_return_first_page() {
        let gw = filled(40).await;
        let search = gw.search_questions("question").await.unwrap();
        assert_eq!(search.items.len(), 10);
        assert_eq!(search.total, 40);
        assert_eq!(search.items[0].id, 1);
    }

    #[tokio::test]
    async fn candidate_pool_filters_by_category() {
        let gw = filled(9).await;
        assert_eq!(gw.candidate_pool(None).await.unwrap().len(), 9);
        let pool = gw.candidate_pool(Some(2)).await.unwrap();
        assert_eq!(pool.len(), 3);
        assert!(pool.iter().all(|q| q.category == 2));
    }
}
