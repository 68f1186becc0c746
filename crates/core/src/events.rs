//! Domain events recorded for audit and observability.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of domain events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainEventType {
    /// An OPEN revenue cycle was created.
    RevenueCycleCreated,
    /// A revenue cycle was closed.
    RevenueCycleClosed,
    /// An organization's orchestrator pass failed.
    RevenueCycleOrchestrationFailed,
    /// An orchestrator run finished.
    RevenueCycleOrchestratorCompleted,
}

impl DomainEventType {
    /// Returns the stored name of the event type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RevenueCycleCreated => "REVENUE_CYCLE_CREATED",
            Self::RevenueCycleClosed => "REVENUE_CYCLE_CLOSED",
            Self::RevenueCycleOrchestrationFailed => "REVENUE_CYCLE_ORCHESTRATION_FAILED",
            Self::RevenueCycleOrchestratorCompleted => "REVENUE_CYCLE_ORCHESTRATOR_COMPLETED",
        }
    }
}

impl fmt::Display for DomainEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single domain event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Event ID.
    pub id: Uuid,
    /// Tenant the event concerns; `None` for platform-wide events.
    pub organization_id: Option<Uuid>,
    /// Event kind.
    pub event_type: DomainEventType,
    /// Event-specific data.
    pub payload: serde_json::Value,
    /// When it happened.
    pub occurred_at: DateTime<Utc>,
}

impl DomainEvent {
    /// Create an event timestamped `occurred_at`.
    #[must_use]
    pub fn new(
        organization_id: Option<Uuid>,
        event_type: DomainEventType,
        payload: serde_json::Value,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            organization_id,
            event_type,
            payload,
            occurred_at,
        }
    }
}

/// Error returned by an event sink.
#[derive(Debug, thiserror::Error)]
#[error("Failed to record domain event: {0}")]
pub struct EventSinkError(pub String);

/// Destination for domain events.
///
/// This trait is implemented by the db crate.
pub trait EventSink: Send + Sync {
    /// Persist one event.
    fn record(
        &self,
        event: DomainEvent,
    ) -> impl std::future::Future<Output = Result<(), EventSinkError>> + Send;
}
