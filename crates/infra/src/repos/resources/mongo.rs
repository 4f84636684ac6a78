use super::IResourceCalendarRepo;
use anyhow::Context as _;
use calgate_domain::ResourceCalendar;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};

const COLLECTION_NAME: &str = "resource-calendars";

pub struct MongoResourceCalendarRepo {
    collection: Collection<ResourceCalendarMongo>,
}

impl MongoResourceCalendarRepo {
    pub async fn new(db: &Database) -> anyhow::Result<Self> {
        let collection = db.collection(COLLECTION_NAME);

        collection
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "name": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
                None,
            )
            .await
            .context("failed to create resource-calendar name index")?;

        Ok(Self { collection })
    }
}

#[async_trait::async_trait]
impl IResourceCalendarRepo for MongoResourceCalendarRepo {
    async fn store(&self, resource: &ResourceCalendar) -> anyhow::Result<()> {
        self.collection
            .insert_one(ResourceCalendarMongo::from_domain(resource), None)
            .await
            .context("failed to store resource-calendar")?;

        Ok(())
    }

    async fn list(&self) -> anyhow::Result<Vec<ResourceCalendar>> {
        let cursor = self
            .collection
            .find(doc! {}, None)
            .await
            .context("failed to list resource-calendars")?;

        let docs: Vec<ResourceCalendarMongo> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(|d| d.to_domain()).collect())
    }

    async fn delete(&self, name: &str) -> anyhow::Result<bool> {
        let res = self
            .collection
            .delete_one(doc! { "name": name }, None)
            .await
            .context("failed to delete resource-calendar")?;

        Ok(res.deleted_count > 0)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ResourceCalendarMongo {
    name: String,
    display_name: String,
    description: String,
    color: String,
    max_concurrent_use: i64,
}

impl ResourceCalendarMongo {
    fn to_domain(self) -> ResourceCalendar {
        ResourceCalendar {
            name: self.name,
            display_name: self.display_name,
            description: self.description,
            color: self.color,
            max_concurrent_use: self.max_concurrent_use,
        }
    }

    fn from_domain(resource: &ResourceCalendar) -> Self {
        Self {
            name: resource.name.clone(),
            display_name: resource.display_name.clone(),
            description: resource.description.clone(),
            color: resource.color.clone(),
            max_concurrent_use: resource.max_concurrent_use,
        }
    }
}
