use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;
use validator::Validate;

use axum_helpers::auth::Role;
use domain_notifications::repository::NotificationRepository;
use domain_notifications::{Notification, NotificationKind};
use domain_users::models::UserFilter;
use domain_users::repository::UserRepository;
use realtime::{EventPublisher, RealtimeEvent, Room};

use crate::error::{ProblemError, ProblemResult};
use crate::models::{CreateProblem, Problem, ProblemStatus};
use crate::repository::ProblemRepository;

/// Upper bound on the admin fan-out when a ticket lands.
const ADMIN_FANOUT_LIMIT: i64 = 100;

/// Service layer for support tickets.
///
/// Reporting a problem persists the ticket, drops a durable notification in
/// every admin's feed, and announces it to the `admins` realtime room. The
/// side effects are best-effort; the ticket itself always lands first.
pub struct ProblemService<P, U, N>
where
    P: ProblemRepository,
    U: UserRepository,
    N: NotificationRepository,
{
    problems: Arc<P>,
    users: Arc<U>,
    notifications: Arc<N>,
    publisher: Arc<dyn EventPublisher>,
}

impl<P, U, N> ProblemService<P, U, N>
where
    P: ProblemRepository,
    U: UserRepository,
    N: NotificationRepository,
{
    pub fn new(
        problems: Arc<P>,
        users: Arc<U>,
        notifications: Arc<N>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            problems,
            users,
            notifications,
            publisher,
        }
    }

    /// Report a problem on behalf of the caller.
    #[instrument(skip(self, input))]
    pub async fn report(
        &self,
        user_id: Uuid,
        email: String,
        input: CreateProblem,
    ) -> ProblemResult<Problem> {
        input
            .validate()
            .map_err(|e| ProblemError::Validation(e.to_string()))?;

        let problem = self
            .problems
            .insert(Problem::new(user_id, email, input))
            .await?;

        self.notify_admins(&problem).await;
        self.publisher.publish(
            Room::Admins,
            RealtimeEvent::NewProblem {
                problem_id: problem.id,
                user_id: problem.user_id,
                email: problem.email.clone(),
            },
        );

        Ok(problem)
    }

    /// Durable notification for every admin. Failures never fail the report.
    async fn notify_admins(&self, problem: &Problem) {
        let filter = UserFilter {
            role: Some(Role::Admin),
            limit: ADMIN_FANOUT_LIMIT,
            ..UserFilter::default()
        };
        let admins = match self.users.list(filter).await {
            Ok(admins) => admins,
            Err(e) => {
                warn!(problem_id = %problem.id, "Failed to list admins for notification: {}", e);
                return;
            }
        };

        let message = format!("Nouveau problème signalé: {}", problem.subject);
        for admin in admins {
            if let Err(e) = self
                .notifications
                .insert(Notification::new(
                    problem.user_id,
                    admin.id,
                    NotificationKind::Probleme,
                    message.clone(),
                ))
                .await
            {
                warn!(
                    problem_id = %problem.id,
                    admin_id = %admin.id,
                    "Failed to record admin notification: {}",
                    e
                );
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> ProblemResult<Problem> {
        self.problems
            .get_by_id(id)
            .await?
            .ok_or(ProblemError::NotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn list(&self, limit: i64, offset: u64) -> ProblemResult<Vec<Problem>> {
        self.problems.list(limit, offset).await
    }

    /// Close a ticket.
    #[instrument(skip(self))]
    pub async fn resolve(&self, id: Uuid) -> ProblemResult<Problem> {
        self.problems
            .set_status(id, ProblemStatus::Resolved)
            .await?
            .ok_or(ProblemError::NotFound(id))
    }
}

impl<P, U, N> Clone for ProblemService<P, U, N>
where
    P: ProblemRepository,
    U: UserRepository,
    N: NotificationRepository,
{
    fn clone(&self) -> Self {
        Self {
            problems: Arc::clone(&self.problems),
            users: Arc::clone(&self.users),
            notifications: Arc::clone(&self.notifications),
            publisher: Arc::clone(&self.publisher),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryProblemRepository;
    use domain_notifications::repository::InMemoryNotificationRepository;
    use domain_users::models::{RegisterUser, User};
    use domain_users::repository::InMemoryUserRepository;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct CapturingPublisher {
        published: Mutex<Vec<(Room, RealtimeEvent)>>,
    }

    impl EventPublisher for CapturingPublisher {
        fn publish(&self, room: Room, event: RealtimeEvent) {
            if let Ok(mut published) = self.published.try_lock() {
                published.push((room, event));
            }
        }
    }

    struct Fixture {
        service: ProblemService<
            InMemoryProblemRepository,
            InMemoryUserRepository,
            InMemoryNotificationRepository,
        >,
        users: Arc<InMemoryUserRepository>,
        notifications: Arc<InMemoryNotificationRepository>,
        publisher: Arc<CapturingPublisher>,
    }

    fn fixture() -> Fixture {
        let problems = Arc::new(InMemoryProblemRepository::new());
        let users = Arc::new(InMemoryUserRepository::new());
        let notifications = Arc::new(InMemoryNotificationRepository::new());
        let publisher = Arc::new(CapturingPublisher::default());
        Fixture {
            service: ProblemService::new(
                problems,
                Arc::clone(&users),
                Arc::clone(&notifications),
                publisher.clone() as Arc<dyn EventPublisher>,
            ),
            users,
            notifications,
            publisher,
        }
    }

    async fn seeded_admin(f: &Fixture) -> User {
        let user = User::new(
            RegisterUser {
                name: "Admin".to_string(),
                email: format!("{}@marche.fr", Uuid::new_v4()),
                password: "motdepasse".to_string(),
                role: Role::Admin,
                labo_type: None,
            },
            "hash".to_string(),
        );
        f.users.create(user).await.unwrap()
    }

    fn ticket() -> CreateProblem {
        CreateProblem {
            subject: "Livraison en retard".to_string(),
            message: "La commande n'est jamais passée à on route.".to_string(),
        }
    }

    #[tokio::test]
    async fn report_notifies_every_admin_and_the_admins_room() {
        let f = fixture();
        let admin_a = seeded_admin(&f).await;
        let admin_b = seeded_admin(&f).await;
        let reporter = Uuid::new_v4();

        let problem = f
            .service
            .report(reporter, "labo@exemple.fr".to_string(), ticket())
            .await
            .unwrap();
        assert_eq!(problem.status, ProblemStatus::Open);

        for admin in [&admin_a, &admin_b] {
            let feed = f
                .notifications
                .list_for_receiver(admin.id, true, 50)
                .await
                .unwrap();
            assert_eq!(feed.len(), 1);
            assert!(feed[0].message.contains("Livraison en retard"));
            assert_eq!(feed[0].kind, NotificationKind::Probleme);
            assert_eq!(feed[0].sender_id, reporter);
        }

        let published = f.publisher.published.lock().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, Room::Admins);
        assert!(matches!(
            &published[0].1,
            RealtimeEvent::NewProblem { problem_id, user_id, email }
                if *problem_id == problem.id
                    && *user_id == reporter
                    && email == "labo@exemple.fr"
        ));
    }

    #[tokio::test]
    async fn non_admins_are_not_notified() {
        let f = fixture();
        let client = f
            .users
            .create(User::new(
                RegisterUser {
                    name: "Labo".to_string(),
                    email: "labo@client.fr".to_string(),
                    password: "motdepasse".to_string(),
                    role: Role::Client,
                    labo_type: Some("analyse".to_string()),
                },
                "hash".to_string(),
            ))
            .await
            .unwrap();

        f.service
            .report(Uuid::new_v4(), "qui@exemple.fr".to_string(), ticket())
            .await
            .unwrap();

        let feed = f
            .notifications
            .list_for_receiver(client.id, true, 50)
            .await
            .unwrap();
        assert!(feed.is_empty());
    }

    #[tokio::test]
    async fn resolve_flips_the_ticket() {
        let f = fixture();
        let problem = f
            .service
            .report(Uuid::new_v4(), "labo@exemple.fr".to_string(), ticket())
            .await
            .unwrap();

        let resolved = f.service.resolve(problem.id).await.unwrap();
        assert_eq!(resolved.status, ProblemStatus::Resolved);

        let err = f.service.resolve(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ProblemError::NotFound(_)));
    }
}
