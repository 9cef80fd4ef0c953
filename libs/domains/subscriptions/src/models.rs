use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Lifecycle of a subscription window
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Expired,
}

/// Subscription entity - an access window granted to one user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Subscription {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    /// User the window belongs to
    pub user_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn new(input: CreateSubscription) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id: input.user_id,
            start_date: input.start_date,
            end_date: input.end_date,
            status: SubscriptionStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the window has run out, regardless of the stored status.
    /// The stored status only catches up when a login attempt observes this.
    pub fn is_expired_at(&self, at: DateTime<Utc>) -> bool {
        self.end_date < at
    }

    /// Apply updates from UpdateSubscription DTO
    pub fn apply_update(&mut self, update: UpdateSubscription) {
        if let Some(start_date) = update.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = update.end_date {
            self.end_date = end_date;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        self.updated_at = Utc::now();
    }
}

/// A user's current subscription, enriched with the remaining validity
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CurrentSubscription {
    #[serde(flatten)]
    pub subscription: Subscription,
    /// Whole days left before the window closes; 0 once it has
    pub days_remaining: i64,
}

impl CurrentSubscription {
    pub fn at(subscription: Subscription, now: DateTime<Utc>) -> Self {
        let days_remaining = (subscription.end_date - now).num_days().max(0);
        Self {
            subscription,
            days_remaining,
        }
    }
}

/// DTO for granting a new subscription window
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_window"))]
pub struct CreateSubscription {
    pub user_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// DTO for updating an existing subscription
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSubscription {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<SubscriptionStatus>,
}

fn validate_window(input: &CreateSubscription) -> Result<(), ValidationError> {
    if input.end_date <= input.start_date {
        return Err(ValidationError::new("empty_window")
            .with_message("end_date must be after start_date".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn create_rejects_inverted_window() {
        let now = Utc::now();
        let inverted = CreateSubscription {
            user_id: Uuid::new_v4(),
            start_date: now,
            end_date: now - Duration::days(1),
        };
        assert!(inverted.validate().is_err());

        let valid = CreateSubscription {
            user_id: Uuid::new_v4(),
            start_date: now,
            end_date: now + Duration::days(30),
        };
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn expiry_is_judged_against_end_date_not_stored_status() {
        let now = Utc::now();
        let subscription = Subscription::new(CreateSubscription {
            user_id: Uuid::new_v4(),
            start_date: now - Duration::days(40),
            end_date: now - Duration::days(10),
        });

        // Freshly created windows start out active even when already stale
        assert_eq!(subscription.status, SubscriptionStatus::Active);
        assert!(subscription.is_expired_at(now));
        assert!(!subscription.is_expired_at(now - Duration::days(20)));
    }

    #[test]
    fn days_remaining_never_goes_negative() {
        let now = Utc::now();
        let stale = Subscription::new(CreateSubscription {
            user_id: Uuid::new_v4(),
            start_date: now - Duration::days(60),
            end_date: now - Duration::days(5),
        });
        assert_eq!(CurrentSubscription::at(stale, now).days_remaining, 0);

        let fresh = Subscription::new(CreateSubscription {
            user_id: Uuid::new_v4(),
            start_date: now,
            end_date: now + Duration::days(30),
        });
        assert_eq!(CurrentSubscription::at(fresh, now).days_remaining, 30);
    }

    #[test]
    fn status_wire_names_are_lowercase() {
        assert_eq!(
            serde_json::to_string(&SubscriptionStatus::Active).unwrap(),
            "\"active\""
        );
        assert_eq!(
            serde_json::to_string(&SubscriptionStatus::Expired).unwrap(),
            "\"expired\""
        );
    }
}
