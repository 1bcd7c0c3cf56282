// Main library file for the tour marketplace client core

// Export modules for each component
pub mod api;
pub mod auth;
pub mod booking;
pub mod currency;
pub mod models;
pub mod router;
pub mod storage;

// Re-export key types for convenience
pub use api::{ApiError, BackendApi, ClientConfig, RestClient};
pub use auth::{AuthOutcome, AuthSession};
pub use booking::{
    BookingLedger, BookingRecord, BookingStep, BookingWizard, LogLedger, TourContext, WizardConfig,
};
pub use currency::{
    Currency, CurrencyService, OpenRatesProvider, RateError, RatesProvider, RATE_REFRESH_INTERVAL,
};
pub use models::{ApiEnvelope, AuthPayload, Tour, TourOperator, TourPayload, User, UserRole};
pub use router::{Location, Page, RouteMatch, Router, SubscriptionId};
pub use storage::{KeyValueStore, MemoryStore};
