/**
 * Transport layer: HTTP delivery and submission modes.
 *
 * - `http`: ureq-based client for `POST {endpoint}/entries`
 * - `delivery`: silent / synchronous / asynchronous submission
 */

pub mod delivery;
pub mod http;

pub use delivery::{Delivery, DeliveryMode};
pub use http::Transport;
