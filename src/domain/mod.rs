// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// The order aggregate, its state machine and the orchestration workflow.
// Ports to the outside world (repository, inventory, payment) are defined in
// their own modules; this layer only depends on their traits.
//
// ============================================================================

pub mod order;
