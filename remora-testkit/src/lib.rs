//! In-memory fakes for exercising remora without cloud infrastructure.
//!
//! The queue fake models the at-least-once contract: batch receive,
//! redelivery of failed deliveries via [`queue::InMemoryWorkQueue::settle`],
//! receive counting, and a dead-letter bucket once redeliveries are
//! exhausted. The store fake enforces the same error taxonomy the real
//! boundary promises.

pub mod events;
pub mod queue;
pub mod store;
pub mod todo;
pub mod translate;

pub use events::CapturingEventSink;
pub use queue::InMemoryWorkQueue;
pub use store::InMemoryJobStore;
pub use todo::InMemoryTodoStore;
pub use translate::FakeTranslator;
