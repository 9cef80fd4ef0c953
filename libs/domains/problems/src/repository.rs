use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ProblemResult;
use crate::models::{Problem, ProblemStatus};

/// Repository trait for support ticket persistence operations
#[async_trait]
pub trait ProblemRepository: Send + Sync {
    async fn insert(&self, problem: Problem) -> ProblemResult<Problem>;
    async fn get_by_id(&self, id: Uuid) -> ProblemResult<Option<Problem>>;
    async fn list(&self, limit: i64, offset: u64) -> ProblemResult<Vec<Problem>>;
    async fn set_status(&self, id: Uuid, status: ProblemStatus)
        -> ProblemResult<Option<Problem>>;
}

/// In-memory implementation of ProblemRepository for testing
#[derive(Clone, Default)]
pub struct InMemoryProblemRepository {
    problems: Arc<RwLock<HashMap<Uuid, Problem>>>,
}

impl InMemoryProblemRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProblemRepository for InMemoryProblemRepository {
    async fn insert(&self, problem: Problem) -> ProblemResult<Problem> {
        let mut problems = self.problems.write().await;
        problems.insert(problem.id, problem.clone());
        Ok(problem)
    }

    async fn get_by_id(&self, id: Uuid) -> ProblemResult<Option<Problem>> {
        let problems = self.problems.read().await;
        Ok(problems.get(&id).cloned())
    }

    async fn list(&self, limit: i64, offset: u64) -> ProblemResult<Vec<Problem>> {
        let problems = self.problems.read().await;
        let mut all: Vec<Problem> = problems.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all
            .into_iter()
            .skip(offset as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ProblemStatus,
    ) -> ProblemResult<Option<Problem>> {
        let mut problems = self.problems.write().await;
        match problems.get_mut(&id) {
            Some(problem) => {
                problem.status = status;
                problem.updated_at = chrono::Utc::now();
                Ok(Some(problem.clone()))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateProblem;

    fn sample() -> Problem {
        Problem::new(
            Uuid::new_v4(),
            "labo@exemple.fr".to_string(),
            CreateProblem {
                subject: "Paiement refusé".to_string(),
                message: "Le virement a été rejeté.".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn resolve_flips_status() {
        let repo = InMemoryProblemRepository::new();
        let problem = repo.insert(sample()).await.unwrap();

        let resolved = repo
            .set_status(problem.id, ProblemStatus::Resolved)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.status, ProblemStatus::Resolved);

        assert!(repo
            .set_status(Uuid::new_v4(), ProblemStatus::Resolved)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let repo = InMemoryProblemRepository::new();
        repo.insert(sample()).await.unwrap();
        let later = repo.insert(sample()).await.unwrap();

        let listed = repo.list(50, 0).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, later.id);
    }
}
