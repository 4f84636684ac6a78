mod inmemory;
mod mongo;

pub use inmemory::InMemoryResourceCalendarRepo;
pub use mongo::MongoResourceCalendarRepo;

use calgate_domain::ResourceCalendar;

/// Persistence for resource-calendar descriptions. `delete` reports whether
/// a record was actually removed.
#[async_trait::async_trait]
pub trait IResourceCalendarRepo: Send + Sync {
    async fn store(&self, resource: &ResourceCalendar) -> anyhow::Result<()>;
    async fn list(&self) -> anyhow::Result<Vec<ResourceCalendar>>;
    async fn delete(&self, name: &str) -> anyhow::Result<bool>;
}
