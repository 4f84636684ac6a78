use super::IResourceCalendarRepo;
use calgate_domain::ResourceCalendar;
use std::sync::Mutex;

pub struct InMemoryResourceCalendarRepo {
    resources: Mutex<Vec<ResourceCalendar>>,
}

impl InMemoryResourceCalendarRepo {
    pub fn new() -> Self {
        Self {
            resources: Mutex::new(Vec::new()),
        }
    }
}

impl Default for InMemoryResourceCalendarRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IResourceCalendarRepo for InMemoryResourceCalendarRepo {
    async fn store(&self, resource: &ResourceCalendar) -> anyhow::Result<()> {
        let mut resources = self.resources.lock().unwrap();
        if resources.iter().any(|r| r.name == resource.name) {
            anyhow::bail!("resource-calendar {} already exists", resource.name);
        }

        resources.push(resource.clone());
        Ok(())
    }

    async fn list(&self) -> anyhow::Result<Vec<ResourceCalendar>> {
        Ok(self.resources.lock().unwrap().clone())
    }

    async fn delete(&self, name: &str) -> anyhow::Result<bool> {
        let mut resources = self.resources.lock().unwrap();
        let before = resources.len();
        resources.retain(|r| r.name != name);
        Ok(resources.len() != before)
    }
}
