pub mod aggregation;
pub mod classifier;
pub mod event_repository;
pub mod identity;
pub mod openagenda;
pub mod sources;
pub mod timeline;

pub use aggregation::EventService;
pub use event_repository::PgEventStore;
pub use openagenda::OpenAgendaClient;
pub use sources::{EventFeed, EventFilter, EventStore};
