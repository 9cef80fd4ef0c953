//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for all APIs
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Labmarket API",
        version = "0.1.0",
        description = "Marketplace backend for laboratory equipment: accounts, catalog, orders, payments, subscriptions and support",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api/auth", api = domain_users::AuthApiDoc),
        (path = "/api/users", api = domain_users::ApiDoc),
        (path = "/api/produits", api = domain_products::ApiDoc),
        (path = "/api/commandes", api = domain_orders::ApiDoc),
        (path = "/api", api = domain_payments::CaptureApiDoc),
        (path = "/api/payments", api = domain_payments::ApiDoc),
        (path = "/api/notifications", api = domain_notifications::ApiDoc),
        (path = "/api/abonnements", api = domain_subscriptions::ApiDoc),
        (path = "/api/papiers", api = domain_documents::ApiDoc),
        (path = "/api/problems", api = domain_problems::ApiDoc),
        (path = "/api/stats", api = domain_stats::ApiDoc)
    ),
    tags(
        (name = "Auth", description = "Registration and authentication"),
        (name = "Users", description = "Profiles and account management"),
        (name = "Products", description = "Laboratory equipment catalog"),
        (name = "Orders", description = "Order placement and delivery tracking"),
        (name = "Payments", description = "Payment capture and records"),
        (name = "Notifications", description = "Durable per-user notifications"),
        (name = "Subscriptions", description = "Subscription windows"),
        (name = "Papiers", description = "Identity paperwork review"),
        (name = "Problems", description = "Support tickets"),
        (name = "Stats", description = "Admin dashboard")
    )
)]
pub struct ApiDoc;
