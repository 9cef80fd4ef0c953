use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Lifecycle of a support ticket
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProblemStatus {
    Open,
    Resolved,
}

/// Problem entity - a support ticket raised by any authenticated user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Problem {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    /// Reporter
    pub user_id: Uuid,
    /// Reporter's email, snapshotted so admins can reply after deletion
    pub email: String,
    pub subject: String,
    pub message: String,
    pub status: ProblemStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Problem {
    pub fn new(user_id: Uuid, email: String, input: CreateProblem) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            email,
            subject: input.subject,
            message: input.message,
            status: ProblemStatus::Open,
            created_at: now,
            updated_at: now,
        }
    }
}

/// DTO for reporting a problem
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProblem {
    #[validate(length(min = 1, max = 200))]
    pub subject: String,
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_problem_starts_open() {
        let problem = Problem::new(
            Uuid::new_v4(),
            "labo@exemple.fr".to_string(),
            CreateProblem {
                subject: "Commande bloquée".to_string(),
                message: "Ma commande est en cours depuis trois semaines.".to_string(),
            },
        );
        assert_eq!(problem.status, ProblemStatus::Open);
    }

    #[test]
    fn status_wire_names_are_lowercase() {
        assert_eq!(
            serde_json::to_string(&ProblemStatus::Open).unwrap(),
            "\"open\""
        );
        assert_eq!(
            serde_json::to_string(&ProblemStatus::Resolved).unwrap(),
            "\"resolved\""
        );
    }

    #[test]
    fn empty_subject_fails_validation() {
        let input = CreateProblem {
            subject: String::new(),
            message: "Détail".to_string(),
        };
        assert!(input.validate().is_err());
    }
}
