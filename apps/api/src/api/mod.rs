//! API routes module
//!
//! Builds every repository and service once, then mounts the domain routers
//! with their role policies. The whole tree is nested under `/api` by
//! `axum_helpers::create_router`.

pub mod activation;
pub mod health;
pub mod ws;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    Router,
};
use axum_helpers::{
    auth::{jwt_auth_middleware, optional_jwt_auth_middleware, require_role, JwtAuth, Role},
    uploads::{DOCUMENT_UPLOAD, PAYMENT_PROOF_UPLOAD, PRODUCT_MEDIA_UPLOAD},
};
use std::sync::Arc;
use tracing::info;

use domain_documents::{DocumentService, MongoDocumentRepository};
use domain_notifications::{MongoNotificationRepository, NotificationService};
use domain_orders::{MongoOrderRepository, OrderService};
use domain_payments::{MongoPaymentRepository, PaymentService};
use domain_problems::{MongoProblemRepository, ProblemService};
use domain_products::{MongoProductRepository, ProductService};
use domain_stats::{MongoStatsRepository, StatsService};
use domain_subscriptions::{MongoSubscriptionRepository, SubscriptionService};
use domain_users::{LogMailer, Mailer, MongoTokenStore, MongoUserRepository, UserService};
use realtime::EventPublisher;

use crate::state::AppState;
use activation::RepositoryActivator;

/// Multipart framing allowance on top of the largest accepted upload
const UPLOAD_OVERHEAD: usize = 64 * 1024;

/// Create all API routes
/// Note: These are nested under /api by axum_helpers::create_router
pub fn routes(state: &AppState) -> Router {
    let auth = JwtAuth::new(&state.config.jwt);

    let users = Arc::new(MongoUserRepository::new(&state.db));
    let tokens = Arc::new(MongoTokenStore::new(&state.db));
    let subscriptions = Arc::new(MongoSubscriptionRepository::new(&state.db));
    let products = Arc::new(MongoProductRepository::new(&state.db));
    let orders = Arc::new(MongoOrderRepository::new(&state.db));
    let notifications = Arc::new(MongoNotificationRepository::new(&state.db));
    let payments = Arc::new(MongoPaymentRepository::new(&state.db));
    let documents = Arc::new(MongoDocumentRepository::new(&state.db));
    let problems = Arc::new(MongoProblemRepository::new(&state.db));
    let stats = Arc::new(MongoStatsRepository::new(&state.db));

    let publisher: Arc<dyn EventPublisher> = Arc::new(state.hub.clone());
    let mailer: Arc<dyn Mailer> = Arc::new(LogMailer);

    let user_service = UserService::new(
        Arc::clone(&users),
        Arc::clone(&tokens),
        Arc::clone(&subscriptions),
        auth.clone(),
        mailer,
    );
    let product_service = ProductService::new(Arc::clone(&products));
    let order_service = OrderService::new(
        Arc::clone(&orders),
        Arc::clone(&products),
        Arc::clone(&notifications),
        Arc::clone(&publisher),
    );
    let payment_service = PaymentService::new(Arc::clone(&payments), Arc::clone(&orders));
    let notification_service = NotificationService::new(Arc::clone(&notifications));
    let subscription_service = SubscriptionService::new(
        Arc::clone(&subscriptions),
        Arc::new(RepositoryActivator::new(Arc::clone(&users))),
    );
    let document_service = DocumentService::new(Arc::clone(&documents), Arc::clone(&users));
    let problem_service = ProblemService::new(
        Arc::clone(&problems),
        Arc::clone(&users),
        Arc::clone(&notifications),
        Arc::clone(&publisher),
    );
    let stats_service = StatsService::new(stats);

    let jwt = || from_fn_with_state(auth.clone(), jwt_auth_middleware);
    let admin_only = || from_fn_with_state(Role::Admin, require_role);

    // Registration, login and token management stay public
    let auth_routes = domain_users::auth_handlers::auth_router(user_service.clone());

    // Profile self-service for any role, account management for admins
    let user_routes = domain_users::handlers::profile_router(user_service.clone())
        .merge(domain_users::handlers::admin_router(user_service).layer(admin_only()))
        .layer(jwt());

    // Catalog reads are public; the supplier policy on writes sits inside the
    // domain router, so extraction is optional here
    let product_routes = domain_products::handlers::router(
        product_service,
        state.config.uploads.subdir("products"),
    )
    .layer(from_fn_with_state(
        auth.clone(),
        optional_jwt_auth_middleware,
    ))
    .layer(DefaultBodyLimit::max(
        PRODUCT_MEDIA_UPLOAD.max_bytes + UPLOAD_OVERHEAD,
    ));

    // Payment capture shares the orders mount: POST /commandes/{id}/payment
    let commandes_routes = domain_orders::handlers::router(order_service)
        .merge(domain_payments::handlers::capture_router(
            payment_service.clone(),
            state.config.uploads.subdir("payments"),
        ))
        .layer(jwt())
        .layer(DefaultBodyLimit::max(
            PAYMENT_PROOF_UPLOAD.max_bytes + UPLOAD_OVERHEAD,
        ));

    let payment_routes = domain_payments::handlers::router(payment_service).layer(jwt());

    let notification_routes =
        domain_notifications::handlers::router(notification_service).layer(jwt());

    // Window management is admin-only; /me carries only the JWT policy
    let subscription_routes = domain_subscriptions::handlers::router(subscription_service.clone())
        .layer(admin_only())
        .merge(domain_subscriptions::handlers::me_router(
            subscription_service,
        ))
        .layer(jwt());

    // A supplier bundle is three documents, so the limit covers all of them
    let papiers_routes = domain_documents::handlers::router(
        document_service,
        state.config.uploads.subdir("papiers"),
    )
    .layer(jwt())
    .layer(DefaultBodyLimit::max(
        3 * DOCUMENT_UPLOAD.max_bytes + UPLOAD_OVERHEAD,
    ));

    let problem_routes = domain_problems::handlers::router(problem_service).layer(jwt());

    let stats_routes = domain_stats::handlers::router(stats_service)
        .layer(admin_only())
        .layer(jwt());

    Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/produits", product_routes)
        .nest("/commandes", commandes_routes)
        .nest("/payments", payment_routes)
        .nest("/notifications", notification_routes)
        .nest("/abonnements", subscription_routes)
        .nest("/papiers", papiers_routes)
        .nest("/problems", problem_routes)
        .nest("/stats", stats_routes)
        .merge(ws::router(auth, state.hub.clone()))
        .merge(health::router(state.clone()))
}

/// Initialize indexes for every MongoDB-backed collection
pub async fn init_indexes(db: &mongodb::Database) -> eyre::Result<()> {
    MongoUserRepository::new(db).init_indexes().await?;
    MongoTokenStore::new(db).init_indexes().await?;
    MongoProductRepository::new(db).init_indexes().await?;
    MongoOrderRepository::new(db).init_indexes().await?;
    MongoNotificationRepository::new(db).init_indexes().await?;
    MongoSubscriptionRepository::new(db).init_indexes().await?;
    MongoPaymentRepository::new(db).init_indexes().await?;
    MongoDocumentRepository::new(db).init_indexes().await?;
    MongoProblemRepository::new(db).init_indexes().await?;
    info!("MongoDB collection indexes created");
    Ok(())
}
