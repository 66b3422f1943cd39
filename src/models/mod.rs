//! Shared data model: orders, custom steps, and product step templates.

pub mod order;
pub mod step;
pub mod template;

pub use order::{Order, OrderStatus};
pub use step::{CustomStep, StepDuration, StepStatus, TimeUnit};
pub use template::{Product, StepTemplateEntry};
