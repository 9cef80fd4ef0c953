//! In-process real-time fan-out for marketplace events.
//!
//! Connected clients join rooms derived from their JWT identity
//! (`client_<id>`, `supplier_<id>`, `admins`); domain services publish events
//! through the [`EventPublisher`] trait without knowing whether anyone is
//! listening. Delivery is best-effort: a failed or missing subscriber never
//! fails the request that produced the event.
//!
//! ```text
//!  OrderService ──publish──▶ Hub (broadcast channel)
//!                              │
//!                              ├──▶ ws session (supplier_42) ── filters rooms
//!                              └──▶ ws session (admins)
//! ```

pub mod event;
pub mod hub;
pub mod ws;

pub use event::{Envelope, EventPublisher, NullPublisher, RealtimeEvent, Room};
pub use hub::Hub;
pub use ws::serve_socket;
