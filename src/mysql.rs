use crate::gateway::{GatewayError, GatewayResult, QuestionFilter, QuestionPage, QuestionQuery, TriviaGateway};
use crate::models::{Category, NewQuestion, Question};
use futures::future::BoxFuture;
use sqlx::mysql::MySqlPool;
use sqlx::{MySql, QueryBuilder};

const QUESTION_COLUMNS: &str = "SELECT id, question, answer, category, difficulty FROM questions";

#[derive(Clone)]
pub struct MySqlGateway {
    pool: MySqlPool,
}

impl MySqlGateway {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn push_filter<'a>(builder: &mut QueryBuilder<'a, MySql>, filter: &QuestionFilter) {
    let mut has_where = false;
    if let Some(category) = filter.category {
        builder.push(" WHERE category = ").push_bind(category);
        has_where = true;
    }
    if let Some(term) = &filter.search {
        builder.push(if has_where { " AND " } else { " WHERE " });
        builder.push("LOWER(question) LIKE ").push_bind(like_pattern(term));
    }
}

impl TriviaGateway for MySqlGateway {
    fn list_categories(&self) -> BoxFuture<'_, GatewayResult<Vec<Category>>> {
        Box::pin(async move {
            let categories: Vec<Category> =
                sqlx::query_as("SELECT id, `type` FROM categories ORDER BY `type`, id")
                    .fetch_all(&self.pool)
                    .await?;
            if categories.is_empty() {
                return Err(GatewayError::NotFound);
            }
            Ok(categories)
        })
    }

    fn find_category(&self, id: i64) -> BoxFuture<'_, GatewayResult<Option<Category>>> {
        Box::pin(async move {
            let category: Option<Category> = sqlx::query_as("SELECT id, `type` FROM categories WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(category)
        })
    }

    fn find_question(&self, id: i64) -> BoxFuture<'_, GatewayResult<Option<Question>>> {
        Box::pin(async move {
            let question: Option<Question> = sqlx::query_as(&format!("{QUESTION_COLUMNS} WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(question)
        })
    }

    fn query_questions(&self, query: QuestionQuery) -> BoxFuture<'_, GatewayResult<QuestionPage>> {
        Box::pin(async move {
            let mut count = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM questions");
            push_filter(&mut count, &query.filter);
            let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

            let mut select = QueryBuilder::<MySql>::new(QUESTION_COLUMNS);
            push_filter(&mut select, &query.filter);
            select
                .push(" ORDER BY id LIMIT ")
                .push_bind(u64::from(query.page.per_page))
                .push(" OFFSET ")
                .push_bind(query.page.offset());
            let items: Vec<Question> = select.build_query_as().fetch_all(&self.pool).await?;

            let total = u64::try_from(total)
                .map_err(|_| GatewayError::InvalidRow(format!("negative count {total}")))?;
            Ok(QuestionPage { items, total })
        })
    }

    fn candidate_pool(&self, category: Option<i64>) -> BoxFuture<'_, GatewayResult<Vec<Question>>> {
        Box::pin(async move {
            let mut select = QueryBuilder::<MySql>::new(QUESTION_COLUMNS);
            push_filter(
                &mut select,
                &QuestionFilter {
                    search: None,
                    category,
                },
            );
            select.push(" ORDER BY id");
            let pool: Vec<Question> = select.build_query_as().fetch_all(&self.pool).await?;
            Ok(pool)
        })
    }

    fn insert_question(&self, question: NewQuestion) -> BoxFuture<'_, GatewayResult<i64>> {
        Box::pin(async move {
            let result = sqlx::query(
                "INSERT INTO questions (question, answer, category, difficulty) VALUES (?, ?, ?, ?)",
            )
            .bind(&question.question)
            .bind(&question.answer)
            .bind(question.category)
            .bind(question.difficulty)
            .execute(&self.pool)
            .await?;
            let id = result.last_insert_id();
            i64::try_from(id).map_err(|_| GatewayError::InvalidRow(format!("question id {id} out of range")))
        })
    }

    fn delete_question(&self, id: i64) -> BoxFuture<'_, GatewayResult<()>> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM questions WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await?;
            if result.rows_affected() == 0 {
                return Err(GatewayError::NotFound);
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Title"), "%title%");
        assert_eq!(like_pattern("100%_a\\b"), "%100\\%\\_a\\\\b%");
    }

    #[test]
    fn filter_sql_shapes() {
        let mut builder = QueryBuilder::<MySql>::new(QUESTION_COLUMNS);
        push_filter(
            &mut builder,
            &QuestionFilter {
                search: Some("x".into()),
                category: Some(2),
            },
        );
        assert_eq!(
            builder.sql(),
            format!("{QUESTION_COLUMNS} WHERE category = ? AND LOWER(question) LIKE ?")
        );

        let mut builder = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM questions");
        push_filter(&mut builder, &QuestionFilter::default());
        assert_eq!(builder.sql(), "SELECT COUNT(*) FROM questions");
    }
}
