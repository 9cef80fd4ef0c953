use axum_helpers::auth::Role;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{PaymentError, PaymentResult};
use crate::models::{CreatePayment, Payment};
use crate::repository::PaymentRepository;
use domain_orders::repository::OrderRepository;

/// Service layer for payment business logic.
///
/// A client declares a payment against one of their own orders; the declared
/// amount must match the order total within a cent. The proof document is
/// attached afterwards in a second, multipart step.
pub struct PaymentService<P, O>
where
    P: PaymentRepository,
    O: OrderRepository,
{
    payments: Arc<P>,
    orders: Arc<O>,
}

impl<P, O> PaymentService<P, O>
where
    P: PaymentRepository,
    O: OrderRepository,
{
    pub fn new(payments: Arc<P>, orders: Arc<O>) -> Self {
        Self { payments, orders }
    }

    /// Declare a payment for an order owned by `client_id`.
    #[instrument(skip(self, input), fields(order_id = %input.order_id))]
    pub async fn create_payment(
        &self,
        client_id: Uuid,
        input: CreatePayment,
    ) -> PaymentResult<Payment> {
        input
            .validate()
            .map_err(|e| PaymentError::Validation(e.to_string()))?;

        let order = self
            .orders
            .get_by_id(input.order_id)
            .await?
            .ok_or(PaymentError::OrderNotFound(input.order_id))?;

        if order.client_id != client_id {
            return Err(PaymentError::NotOwner);
        }
        if !Payment::amount_matches(input.amount, order.total) {
            return Err(PaymentError::AmountMismatch {
                expected: order.total,
                actual: input.amount,
            });
        }

        let payment = Payment::new(order.id, client_id, input.amount);
        self.payments.insert(payment).await
    }

    /// Attach the stored proof file to a payment owned by `client_id`.
    #[instrument(skip(self, file_name))]
    pub async fn attach_proof(
        &self,
        client_id: Uuid,
        id: Uuid,
        file_name: &str,
    ) -> PaymentResult<Payment> {
        let payment = self
            .payments
            .get_by_id(id)
            .await?
            .ok_or(PaymentError::NotFound(id))?;
        if payment.client_id != client_id {
            return Err(PaymentError::NotOwner);
        }

        self.payments
            .set_proof(id, file_name)
            .await?
            .ok_or(PaymentError::NotFound(id))
    }

    /// Fetch a payment on behalf of a caller. Clients see their own payments,
    /// suppliers the payments of their orders, admins everything.
    #[instrument(skip(self))]
    pub async fn get_payment_for(
        &self,
        role: Role,
        user_id: Uuid,
        id: Uuid,
    ) -> PaymentResult<Payment> {
        let payment = self
            .payments
            .get_by_id(id)
            .await?
            .ok_or(PaymentError::NotFound(id))?;

        let allowed = match role {
            Role::Admin => true,
            Role::Client => payment.client_id == user_id,
            Role::Supplier => {
                let order = self
                    .orders
                    .get_by_id(payment.order_id)
                    .await?
                    .ok_or(PaymentError::OrderNotFound(payment.order_id))?;
                order.supplier_id == user_id
            }
        };
        if !allowed {
            return Err(PaymentError::NotOwner);
        }
        Ok(payment)
    }

    /// List payments visible to a caller.
    #[instrument(skip(self))]
    pub async fn list_payments_for(
        &self,
        role: Role,
        user_id: Uuid,
        limit: i64,
        offset: u64,
    ) -> PaymentResult<Vec<Payment>> {
        match role {
            Role::Client => self.payments.list_for_client(user_id, limit, offset).await,
            // Suppliers get the full page filtered down to their own orders
            Role::Supplier => {
                let page = self.payments.list_all(limit, offset).await?;
                let mut visible = Vec::new();
                for payment in page {
                    if let Some(order) = self.orders.get_by_id(payment.order_id).await? {
                        if order.supplier_id == user_id {
                            visible.push(payment);
                        }
                    }
                }
                Ok(visible)
            }
            Role::Admin => self.payments.list_all(limit, offset).await,
        }
    }
}

impl<P, O> Clone for PaymentService<P, O>
where
    P: PaymentRepository,
    O: OrderRepository,
{
    fn clone(&self) -> Self {
        Self {
            payments: Arc::clone(&self.payments),
            orders: Arc::clone(&self.orders),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryPaymentRepository;
    use domain_orders::models::{Order, OrderLine};
    use domain_orders::repository::InMemoryOrderRepository;

    struct Fixture {
        service: PaymentService<InMemoryPaymentRepository, InMemoryOrderRepository>,
        orders: Arc<InMemoryOrderRepository>,
    }

    fn fixture() -> Fixture {
        let payments = Arc::new(InMemoryPaymentRepository::new());
        let orders = Arc::new(InMemoryOrderRepository::new());
        Fixture {
            service: PaymentService::new(payments, Arc::clone(&orders)),
            orders,
        }
    }

    async fn seeded_order(f: &Fixture, client_id: Uuid, supplier_id: Uuid, total: f64) -> Order {
        let order = Order::new(
            client_id,
            "Labo Pasteur".to_string(),
            supplier_id,
            vec![OrderLine {
                product_id: Uuid::new_v4(),
                product_name: "Microscope".to_string(),
                unit_price: total,
                quantity: 1,
            }],
        );
        f.orders.insert(order).await.unwrap()
    }

    #[tokio::test]
    async fn declares_payment_matching_order_total() {
        let f = fixture();
        let client = Uuid::new_v4();
        let order = seeded_order(&f, client, Uuid::new_v4(), 1500.0).await;

        let payment = f
            .service
            .create_payment(
                client,
                CreatePayment {
                    order_id: order.id,
                    amount: 1500.0,
                },
            )
            .await
            .unwrap();

        assert_eq!(payment.order_id, order.id);
        assert_eq!(payment.client_id, client);
        assert!(payment.proof_file.is_none());
    }

    #[tokio::test]
    async fn mismatched_amount_is_rejected() {
        let f = fixture();
        let client = Uuid::new_v4();
        let order = seeded_order(&f, client, Uuid::new_v4(), 1500.0).await;

        let err = f
            .service
            .create_payment(
                client,
                CreatePayment {
                    order_id: order.id,
                    amount: 1400.0,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PaymentError::AmountMismatch { expected, actual }
                if expected == 1500.0 && actual == 1400.0
        ));
    }

    #[tokio::test]
    async fn only_the_buyer_can_declare_a_payment() {
        let f = fixture();
        let order = seeded_order(&f, Uuid::new_v4(), Uuid::new_v4(), 200.0).await;

        let err = f
            .service
            .create_payment(
                Uuid::new_v4(),
                CreatePayment {
                    order_id: order.id,
                    amount: 200.0,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::NotOwner));
    }

    #[tokio::test]
    async fn second_declaration_for_same_order_conflicts() {
        let f = fixture();
        let client = Uuid::new_v4();
        let order = seeded_order(&f, client, Uuid::new_v4(), 300.0).await;
        let input = CreatePayment {
            order_id: order.id,
            amount: 300.0,
        };

        f.service
            .create_payment(client, input.clone())
            .await
            .unwrap();
        let err = f.service.create_payment(client, input).await.unwrap_err();
        assert!(matches!(err, PaymentError::DuplicateOrder(id) if id == order.id));
    }

    #[tokio::test]
    async fn proof_attachment_is_ownership_checked() {
        let f = fixture();
        let client = Uuid::new_v4();
        let order = seeded_order(&f, client, Uuid::new_v4(), 99.99).await;
        let payment = f
            .service
            .create_payment(
                client,
                CreatePayment {
                    order_id: order.id,
                    amount: 99.99,
                },
            )
            .await
            .unwrap();

        let err = f
            .service
            .attach_proof(Uuid::new_v4(), payment.id, "preuve.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::NotOwner));

        let updated = f
            .service
            .attach_proof(client, payment.id, "preuve.pdf")
            .await
            .unwrap();
        assert_eq!(updated.proof_file.as_deref(), Some("preuve.pdf"));
    }

    #[tokio::test]
    async fn supplier_sees_payments_for_their_orders_only() {
        let f = fixture();
        let client = Uuid::new_v4();
        let supplier = Uuid::new_v4();
        let order = seeded_order(&f, client, supplier, 500.0).await;
        let other_order = seeded_order(&f, client, Uuid::new_v4(), 700.0).await;

        let payment = f
            .service
            .create_payment(
                client,
                CreatePayment {
                    order_id: order.id,
                    amount: 500.0,
                },
            )
            .await
            .unwrap();
        f.service
            .create_payment(
                client,
                CreatePayment {
                    order_id: other_order.id,
                    amount: 700.0,
                },
            )
            .await
            .unwrap();

        f.service
            .get_payment_for(Role::Supplier, supplier, payment.id)
            .await
            .unwrap();

        let visible = f
            .service
            .list_payments_for(Role::Supplier, supplier, 50, 0)
            .await
            .unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, payment.id);

        let err = f
            .service
            .get_payment_for(Role::Supplier, Uuid::new_v4(), payment.id)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::NotOwner));
    }
}
