use crate::gateway::{GatewayResult, TriviaGateway};
use crate::models::{lenient_i64, Question};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Mutex;

// Category id `0` on the wire means all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizCategory {
    All,
    Only(i64),
}

impl QuizCategory {
    pub fn from_id(id: i64) -> Self {
        if id == 0 {
            Self::All
        } else {
            Self::Only(id)
        }
    }

    pub fn from_json(value: &Value) -> Option<Self> {
        value.get("id").and_then(lenient_i64).map(Self::from_id)
    }

    fn filter(self) -> Option<i64> {
        match self {
            Self::All => None,
            Self::Only(id) => Some(id),
        }
    }
}

/// Entries that are not ids are ignored; only a non-array fails.
pub fn previous_ids(value: &Value) -> Option<HashSet<i64>> {
    Some(value.as_array()?.iter().filter_map(lenient_i64).collect())
}

pub trait RandomSource: Send + Sync {
    /// Callers guarantee `len > 0`.
    fn pick_index(&self, len: usize) -> usize;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn pick_index(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn pick_index(&self, len: usize) -> usize {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.gen_range(0..len)
    }
}

/// Prefers ids not in `previous`; once every question has been seen the whole
/// pool is eligible again. `None` only for an empty pool.
pub fn select_question(pool: Vec<Question>, previous: &HashSet<i64>, random: &dyn RandomSource) -> Option<Question> {
    if pool.is_empty() {
        return None;
    }
    let (mut unseen, seen): (Vec<Question>, Vec<Question>) =
        pool.into_iter().partition(|q| !previous.contains(&q.id));
    if unseen.is_empty() {
        let mut everything = seen;
        let idx = random.pick_index(everything.len());
        return Some(everything.swap_remove(idx));
    }
    let idx = random.pick_index(unseen.len());
    Some(unseen.swap_remove(idx))
}

pub async fn next_question(
    gateway: &dyn TriviaGateway,
    category: QuizCategory,
    previous: &HashSet<i64>,
    random: &dyn RandomSource,
) -> GatewayResult<Option<Question>> {
    let pool = gateway.candidate_pool(category.filter()).await?;
    Ok(select_question(pool, previous, random))
}
