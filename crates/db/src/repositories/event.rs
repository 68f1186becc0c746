//! Domain event persistence.

use chrono::Utc;
use sairex_core::events::{DomainEvent, EventSink, EventSinkError};
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set};

use crate::entities::domain_events;
use crate::rls::RlsConnection;

/// Repository that appends domain events.
#[derive(Debug, Clone)]
pub struct DomainEventRepository {
    db: DatabaseConnection,
}

impl DomainEventRepository {
    /// Creates a new domain event repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn insert(&self, event: DomainEvent) -> Result<(), DbErr> {
        let rls = match event.organization_id {
            Some(organization_id) => RlsConnection::new(&self.db, organization_id).await?,
            None => RlsConnection::platform(&self.db).await?,
        };

        domain_events::ActiveModel {
            id: Set(event.id),
            organization_id: Set(event.organization_id),
            event_type: Set(event.event_type.as_str().to_string()),
            payload: Set(event.payload),
            occurred_at: Set(event.occurred_at.into()),
            created_at: Set(Utc::now().into()),
        }
        .insert(rls.transaction())
        .await?;

        rls.commit().await
    }
}

impl EventSink for DomainEventRepository {
    async fn record(&self, event: DomainEvent) -> Result<(), EventSinkError> {
        self.insert(event)
            .await
            .map_err(|e| EventSinkError(e.to_string()))
    }
}
