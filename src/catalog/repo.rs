use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// Entry of the services catalog.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Service {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[async_trait]
pub trait ServiceCatalog: Send + Sync {
    async fn list(&self) -> anyhow::Result<Vec<Service>>;
}

#[derive(Clone)]
pub struct PgServiceCatalog {
    db: PgPool,
}

impl PgServiceCatalog {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ServiceCatalog for PgServiceCatalog {
    async fn list(&self) -> anyhow::Result<Vec<Service>> {
        let rows = sqlx::query_as::<_, Service>(
            r#"
            SELECT id, title, description, price, created_at, updated_at
            FROM services
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list services")?;
        Ok(rows)
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct MemoryServiceCatalog {
    services: tokio::sync::RwLock<Vec<Service>>,
}

#[cfg(test)]
impl MemoryServiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, title: &str, description: &str, price: f64) -> Service {
        let mut services = self.services.write().await;
        let now = OffsetDateTime::now_utc();
        let service = Service {
            id: services.len() as i64 + 1,
            title: title.to_string(),
            description: description.to_string(),
            price,
            created_at: now,
            updated_at: now,
        };
        services.push(service.clone());
        service
    }
}

#[cfg(test)]
#[async_trait]
impl ServiceCatalog for MemoryServiceCatalog {
    async fn list(&self) -> anyhow::Result<Vec<Service>> {
        Ok(self.services.read().await.clone())
    }
}
