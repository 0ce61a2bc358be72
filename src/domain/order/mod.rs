// ============================================================================
// Order Domain - Business Logic for the Order Aggregate
// ============================================================================
//
// This module contains ALL Order-specific code:
// - Value objects (OrderItem, OrderStatus, PaymentStatus)
// - Requests / responses (OrderRequest validation, OrderResponse envelope)
// - Errors (OrderError, OrchestrationError)
// - Aggregate (Order with its state machine)
// - Orchestrator (OrderOrchestrator driving inventory, payment and persistence)
//
// ============================================================================

pub mod value_objects;
pub mod requests;
pub mod responses;
pub mod errors;
pub mod aggregate;
pub mod orchestrator;

// Re-export for convenience
pub use value_objects::*;
pub use requests::*;
pub use responses::*;
pub use errors::*;
pub use aggregate::*;
pub use orchestrator::*;
