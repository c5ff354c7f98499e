//! Core business logic - framework-agnostic consultation and store operations.

/// Signed-in user context
pub mod auth;
/// Per-session consultation board with refresh generations
pub mod board;
/// Cart and wishlist session
pub mod cart;
/// Checkout validation and order submission
pub mod checkout;
/// Consultation lifecycle operations
pub mod consultation;
/// Consultant and user directory
pub mod directory;
/// Pricing derivation
pub mod pricing;
/// Dashboard read models
pub mod report;
/// Device-local key/value storage
pub mod storage;
