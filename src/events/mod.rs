pub mod publisher;
pub mod types;

pub use publisher::{EventPublisher, PublishedEvent};
pub use types::FulfillmentEvent;
