//! Event publishing adapters.
//!
//! - `InMemoryEventBus` - captures envelopes for tests and local runs
//! - `LoggingEventPublisher` - emits envelopes through `tracing`

mod in_memory;
mod logging;

pub use in_memory::InMemoryEventBus;
pub use logging::LoggingEventPublisher;
