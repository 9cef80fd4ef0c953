//! Business logic for order creation and delivery tracking

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

use axum_helpers::auth::Role;
use domain_notifications::repository::NotificationRepository;
use domain_notifications::{Notification, NotificationKind};
use domain_products::repository::ProductRepository;
use domain_products::Product;
use realtime::{EventPublisher, RealtimeEvent, Room};

use crate::error::{OrderError, OrderResult};
use crate::models::{CreateOrder, Order, OrderLine, OrderStatus};
use crate::repository::OrderRepository;

/// Order service containing business logic.
///
/// Owns the cross-domain workflow: stock consumption on the product side,
/// durable notifications, and realtime fan-out through the injected publisher.
pub struct OrderService<O, P, N>
where
    O: OrderRepository,
    P: ProductRepository,
    N: NotificationRepository,
{
    orders: Arc<O>,
    products: Arc<P>,
    notifications: Arc<N>,
    publisher: Arc<dyn EventPublisher>,
}

impl<O, P, N> OrderService<O, P, N>
where
    O: OrderRepository,
    P: ProductRepository,
    N: NotificationRepository,
{
    pub fn new(
        orders: Arc<O>,
        products: Arc<P>,
        notifications: Arc<N>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            orders,
            products,
            notifications,
            publisher,
        }
    }

    /// Create an order for a client.
    ///
    /// All referenced products must exist and belong to the same supplier;
    /// both checks run before any stock moves. Stock is then consumed line by
    /// line through the conditional decrement; if a line cannot be covered,
    /// every already-consumed line is restored and the whole order fails.
    #[instrument(skip(self, input), fields(client_id = %client_id, line_count = input.lines.len()))]
    pub async fn create_order(
        &self,
        client_id: Uuid,
        client_name: String,
        input: CreateOrder,
    ) -> OrderResult<Order> {
        if input.lines.is_empty() {
            return Err(OrderError::Validation(
                "An order needs at least one line".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for line in &input.lines {
            if !seen.insert(line.product_id) {
                return Err(OrderError::Validation(format!(
                    "Product {} appears more than once",
                    line.product_id
                )));
            }
            if line.quantity < 1 {
                return Err(OrderError::Validation(
                    "Line quantity must be at least 1".to_string(),
                ));
            }
        }

        // Load and check everything before mutating any stock
        let mut products: Vec<Product> = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let product = self
                .products
                .get_by_id(line.product_id)
                .await
                .map_err(OrderError::from)?
                .ok_or(OrderError::ProductNotFound(line.product_id))?;
            products.push(product);
        }

        let supplier_id = products[0].supplier_id;
        if products.iter().any(|p| p.supplier_id != supplier_id) {
            return Err(OrderError::MultipleSuppliers);
        }

        // Consume stock line by line, rolling back on the first shortage
        let mut consumed: Vec<(Uuid, i64)> = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let decremented = self
                .products
                .decrement_quantity(line.product_id, line.quantity)
                .await
                .map_err(OrderError::from)?;

            if decremented.is_none() {
                self.rollback_consumed(&consumed).await;

                let available = self
                    .products
                    .get_by_id(line.product_id)
                    .await
                    .ok()
                    .flatten()
                    .map(|p| p.quantity)
                    .unwrap_or(0);
                return Err(OrderError::InsufficientStock {
                    product_id: line.product_id,
                    available,
                    requested: line.quantity,
                });
            }
            consumed.push((line.product_id, line.quantity));
        }

        let lines: Vec<OrderLine> = input
            .lines
            .iter()
            .zip(products.iter())
            .map(|(line, product)| OrderLine {
                product_id: product.id,
                product_name: product.name.clone(),
                unit_price: product.selling_price,
                quantity: line.quantity,
            })
            .collect();

        let order = Order::new(client_id, client_name, supplier_id, lines);
        let order = match self.orders.insert(order).await {
            Ok(order) => order,
            Err(e) => {
                self.rollback_consumed(&consumed).await;
                return Err(e);
            }
        };

        // Notification failures never fail the order
        let message = format!("Nouvelle commande de {}", order.client_name);
        if let Err(e) = self
            .notifications
            .insert(Notification::new(
                order.client_id,
                order.supplier_id,
                NotificationKind::Commande,
                message,
            ))
            .await
        {
            warn!(order_id = %order.id, "Failed to record supplier notification: {}", e);
        }

        self.publisher.publish(
            Room::Supplier(order.supplier_id),
            RealtimeEvent::NewOrder {
                order_id: order.id,
                total: order.total,
                buyer_name: order.client_name.clone(),
                item_count: order.item_count(),
            },
        );

        Ok(order)
    }

    async fn rollback_consumed(&self, consumed: &[(Uuid, i64)]) {
        for (product_id, quantity) in consumed {
            if let Err(e) = self.products.increment_quantity(*product_id, *quantity).await {
                warn!(
                    product_id = %product_id,
                    quantity,
                    "Failed to restore stock during order rollback: {}", e
                );
            }
        }
    }

    /// Advance an order's delivery status.
    ///
    /// Only the supplier the order is addressed to may move it, and only to
    /// the immediately following status.
    #[instrument(skip(self))]
    pub async fn advance_status(
        &self,
        supplier_id: Uuid,
        order_id: Uuid,
        requested: OrderStatus,
    ) -> OrderResult<Order> {
        let order = self
            .orders
            .get_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        if order.supplier_id != supplier_id {
            return Err(OrderError::NotOwner);
        }

        if order.status.next() != Some(requested) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: requested,
            });
        }

        // Compare-and-set: a concurrent transition between our read and this
        // write leaves the filter unmatched instead of reverting the status.
        let updated = self
            .orders
            .update_status(order_id, order.status, requested)
            .await?
            .ok_or(OrderError::InvalidTransition {
                from: order.status,
                to: requested,
            })?;

        let message = requested.buyer_message(order_id);
        if let Err(e) = self
            .notifications
            .insert(Notification::new(
                supplier_id,
                updated.client_id,
                NotificationKind::Commande,
                message.clone(),
            ))
            .await
        {
            warn!(order_id = %order_id, "Failed to record buyer notification: {}", e);
        }

        self.publisher.publish(
            Room::Client(updated.client_id),
            RealtimeEvent::OrderStatusUpdate {
                order_id,
                status: requested.to_string(),
                message,
            },
        );

        Ok(updated)
    }

    /// Fetch an order on behalf of a caller, enforcing that clients and
    /// suppliers only see their own orders. Admins see everything.
    #[instrument(skip(self))]
    pub async fn get_order_for(&self, role: Role, user_id: Uuid, id: Uuid) -> OrderResult<Order> {
        let order = self
            .orders
            .get_by_id(id)
            .await?
            .ok_or(OrderError::NotFound(id))?;

        let allowed = match role {
            Role::Admin => true,
            Role::Client => order.client_id == user_id,
            Role::Supplier => order.supplier_id == user_id,
        };
        if !allowed {
            return Err(OrderError::NotOwner);
        }
        Ok(order)
    }

    /// List orders visible to a caller: own purchases for clients, own inbox
    /// for suppliers, everything for admins.
    #[instrument(skip(self))]
    pub async fn list_orders_for(
        &self,
        role: Role,
        user_id: Uuid,
        limit: i64,
        offset: u64,
    ) -> OrderResult<Vec<Order>> {
        match role {
            Role::Client => self.orders.list_for_client(user_id, limit, offset).await,
            Role::Supplier => self.orders.list_for_supplier(user_id, limit, offset).await,
            Role::Admin => self.orders.list_all(limit, offset).await,
        }
    }
}

impl<O, P, N> Clone for OrderService<O, P, N>
where
    O: OrderRepository,
    P: ProductRepository,
    N: NotificationRepository,
{
    fn clone(&self) -> Self {
        Self {
            orders: Arc::clone(&self.orders),
            products: Arc::clone(&self.products),
            notifications: Arc::clone(&self.notifications),
            publisher: Arc::clone(&self.publisher),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateOrderLine;
    use crate::repository::InMemoryOrderRepository;
    use domain_notifications::repository::InMemoryNotificationRepository;
    use domain_products::models::CreateProduct;
    use domain_products::repository::InMemoryProductRepository;
    use std::sync::Mutex;

    /// Publisher that records every published envelope for assertions.
    #[derive(Default)]
    struct CapturingPublisher {
        published: Mutex<Vec<(Room, RealtimeEvent)>>,
    }

    impl EventPublisher for CapturingPublisher {
        fn publish(&self, room: Room, event: RealtimeEvent) {
            self.published.lock().unwrap().push((room, event));
        }
    }

    struct Fixture {
        service: OrderService<
            InMemoryOrderRepository,
            InMemoryProductRepository,
            InMemoryNotificationRepository,
        >,
        products: Arc<InMemoryProductRepository>,
        notifications: Arc<InMemoryNotificationRepository>,
        publisher: Arc<CapturingPublisher>,
    }

    fn fixture() -> Fixture {
        let orders = Arc::new(InMemoryOrderRepository::new());
        let products = Arc::new(InMemoryProductRepository::new());
        let notifications = Arc::new(InMemoryNotificationRepository::new());
        let publisher = Arc::new(CapturingPublisher::default());

        let service = OrderService::new(
            orders,
            Arc::clone(&products),
            Arc::clone(&notifications),
            publisher.clone() as Arc<dyn EventPublisher>,
        );

        Fixture {
            service,
            products,
            notifications,
            publisher,
        }
    }

    async fn seed_product(
        products: &InMemoryProductRepository,
        supplier_id: Uuid,
        price: f64,
        quantity: i64,
    ) -> Product {
        products
            .create(Product::new(
                supplier_id,
                CreateProduct {
                    name: "Microscope optique".to_string(),
                    description: String::new(),
                    purchase_price: price / 2.0,
                    selling_price: price,
                    quantity,
                    product_type: "microscope".to_string(),
                },
            ))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_order_snapshots_total_and_consumes_stock() {
        let f = fixture();
        let supplier = Uuid::new_v4();
        let client = Uuid::new_v4();
        let product = seed_product(&f.products, supplier, 500.0, 10).await;

        let order = f
            .service
            .create_order(
                client,
                "Labo Curie".to_string(),
                CreateOrder {
                    lines: vec![CreateOrderLine {
                        product_id: product.id,
                        quantity: 2,
                    }],
                },
            )
            .await
            .unwrap();

        assert_eq!(order.total, 1000.0);
        assert_eq!(order.status, OrderStatus::EnCours);
        assert_eq!(order.supplier_id, supplier);

        let remaining = f.products.get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(remaining.quantity, 8);

        // Supplier got a durable notification
        let feed = f.notifications.list_for_receiver(supplier, true, 50).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert!(feed[0].message.contains("Labo Curie"));
        assert_eq!(feed[0].sender_id, client);
        assert_eq!(feed[0].kind, NotificationKind::Commande);

        // And a realtime event in their room
        let published = f.publisher.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, Room::Supplier(supplier));
        match &published[0].1 {
            RealtimeEvent::NewOrder {
                order_id,
                total,
                buyer_name,
                item_count,
            } => {
                assert_eq!(*order_id, order.id);
                assert_eq!(*total, 1000.0);
                assert_eq!(buyer_name, "Labo Curie");
                assert_eq!(*item_count, 1);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_order_rejects_mixed_suppliers_without_touching_stock() {
        let f = fixture();
        let product_a = seed_product(&f.products, Uuid::new_v4(), 500.0, 10).await;
        let product_b = seed_product(&f.products, Uuid::new_v4(), 300.0, 5).await;

        let err = f
            .service
            .create_order(
                Uuid::new_v4(),
                "Labo Curie".to_string(),
                CreateOrder {
                    lines: vec![
                        CreateOrderLine {
                            product_id: product_a.id,
                            quantity: 1,
                        },
                        CreateOrderLine {
                            product_id: product_b.id,
                            quantity: 1,
                        },
                    ],
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::MultipleSuppliers));

        // No stock moved, no notification, no event
        assert_eq!(
            f.products.get_by_id(product_a.id).await.unwrap().unwrap().quantity,
            10
        );
        assert_eq!(
            f.products.get_by_id(product_b.id).await.unwrap().unwrap().quantity,
            5
        );
        assert!(f.publisher.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn shortage_on_a_later_line_rolls_back_earlier_lines() {
        let f = fixture();
        let supplier = Uuid::new_v4();
        let plenty = seed_product(&f.products, supplier, 500.0, 10).await;
        let scarce = seed_product(&f.products, supplier, 300.0, 1).await;

        let err = f
            .service
            .create_order(
                Uuid::new_v4(),
                "Labo Curie".to_string(),
                CreateOrder {
                    lines: vec![
                        CreateOrderLine {
                            product_id: plenty.id,
                            quantity: 4,
                        },
                        CreateOrderLine {
                            product_id: scarce.id,
                            quantity: 3,
                        },
                    ],
                },
            )
            .await
            .unwrap_err();

        match err {
            OrderError::InsufficientStock {
                product_id,
                available,
                requested,
            } => {
                assert_eq!(product_id, scarce.id);
                assert_eq!(available, 1);
                assert_eq!(requested, 3);
            }
            other => panic!("unexpected error: {other}"),
        }

        // First line restored
        assert_eq!(
            f.products.get_by_id(plenty.id).await.unwrap().unwrap().quantity,
            10
        );
    }

    #[tokio::test]
    async fn create_order_rejects_duplicate_product_lines() {
        let f = fixture();
        let product = seed_product(&f.products, Uuid::new_v4(), 500.0, 10).await;

        let err = f
            .service
            .create_order(
                Uuid::new_v4(),
                "Labo Curie".to_string(),
                CreateOrder {
                    lines: vec![
                        CreateOrderLine {
                            product_id: product.id,
                            quantity: 1,
                        },
                        CreateOrderLine {
                            product_id: product.id,
                            quantity: 2,
                        },
                    ],
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::Validation(_)));
    }

    async fn seeded_order(f: &Fixture, supplier: Uuid, client: Uuid) -> Order {
        let product = seed_product(&f.products, supplier, 500.0, 10).await;
        f.service
            .create_order(
                client,
                "Labo Curie".to_string(),
                CreateOrder {
                    lines: vec![CreateOrderLine {
                        product_id: product.id,
                        quantity: 1,
                    }],
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn advance_status_walks_the_machine_and_notifies_the_buyer() {
        let f = fixture();
        let supplier = Uuid::new_v4();
        let client = Uuid::new_v4();
        let order = seeded_order(&f, supplier, client).await;

        let on_route = f
            .service
            .advance_status(supplier, order.id, OrderStatus::OnRoute)
            .await
            .unwrap();
        assert_eq!(on_route.status, OrderStatus::OnRoute);

        let arrived = f
            .service
            .advance_status(supplier, order.id, OrderStatus::Arrived)
            .await
            .unwrap();
        assert_eq!(arrived.status, OrderStatus::Arrived);

        // Buyer received a durable notification per transition
        let feed = f.notifications.list_for_receiver(client, true, 50).await.unwrap();
        assert_eq!(feed.len(), 2);

        // And realtime events in the client room (after the newOrder one)
        let published = f.publisher.published.lock().unwrap();
        let client_events: Vec<_> = published
            .iter()
            .filter(|(room, _)| *room == Room::Client(client))
            .collect();
        assert_eq!(client_events.len(), 2);
        match &client_events[0].1 {
            RealtimeEvent::OrderStatusUpdate { status, .. } => {
                assert_eq!(status, "on route");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn advance_status_rejects_skips_and_reverts() {
        let f = fixture();
        let supplier = Uuid::new_v4();
        let order = seeded_order(&f, supplier, Uuid::new_v4()).await;

        // Skipping a step
        let err = f
            .service
            .advance_status(supplier, order.id, OrderStatus::Arrived)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition { .. }));

        // Reverting to the current (or an earlier) status
        let err = f
            .service
            .advance_status(supplier, order.id, OrderStatus::EnCours)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition { .. }));

        // Terminal status cannot move
        f.service
            .advance_status(supplier, order.id, OrderStatus::OnRoute)
            .await
            .unwrap();
        f.service
            .advance_status(supplier, order.id, OrderStatus::Arrived)
            .await
            .unwrap();
        let err = f
            .service
            .advance_status(supplier, order.id, OrderStatus::Arrived)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn advance_status_rejects_other_suppliers() {
        let f = fixture();
        let order = seeded_order(&f, Uuid::new_v4(), Uuid::new_v4()).await;

        let err = f
            .service
            .advance_status(Uuid::new_v4(), order.id, OrderStatus::OnRoute)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::NotOwner));
    }

    #[tokio::test]
    async fn visibility_is_scoped_by_role() {
        let f = fixture();
        let supplier = Uuid::new_v4();
        let client = Uuid::new_v4();
        let order = seeded_order(&f, supplier, client).await;

        // Each party sees the order through their own scope
        f.service
            .get_order_for(Role::Client, client, order.id)
            .await
            .unwrap();
        f.service
            .get_order_for(Role::Supplier, supplier, order.id)
            .await
            .unwrap();
        f.service
            .get_order_for(Role::Admin, Uuid::new_v4(), order.id)
            .await
            .unwrap();

        // Strangers do not
        let err = f
            .service
            .get_order_for(Role::Client, Uuid::new_v4(), order.id)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::NotOwner));

        let mine = f
            .service
            .list_orders_for(Role::Client, client, 50, 0)
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);

        let not_mine = f
            .service
            .list_orders_for(Role::Client, Uuid::new_v4(), 50, 0)
            .await
            .unwrap();
        assert!(not_mine.is_empty());
    }
}
