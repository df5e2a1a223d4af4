//! ConnectorHandle / DeviceSession - fixed orchestration around a connector
//!
//! A `ConnectorHandle` is the shared, registry-owned instance of a device
//! kind. Work against a device always goes through a `DeviceSession`, which
//! holds the handle's lock for its whole lifetime: bind, operate and unbind
//! form one critical section per connector instance, and dropping the
//! session unbinds on every path.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{
    CommandParams, CommandRequest, ContractError, Device, DeviceStatus, ExecOutcome, MessageType,
    Publisher, ReportKind, ReportOutcome,
};
use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;
use tracing::{debug, error, instrument, trace, warn};

use crate::connector::DeviceConnector;
use crate::envelope::{render_topic, PublishEnvelope};

const DEFAULT_TOPIC_TEMPLATE: &str = "/{type}/{device}";

/// Shared connector instance plus its status cache
pub struct ConnectorHandle {
    connector: Arc<dyn DeviceConnector>,
    publisher: Arc<dyn Publisher>,
    topic_template: String,
    /// None = cached status is held until cleared
    status_ttl: Option<Duration>,
    state: Mutex<ConnectorState>,
    status_fetches: AtomicU64,
}

#[derive(Default)]
struct ConnectorState {
    cached: Option<CachedStatus>,
}

struct CachedStatus {
    device_code: String,
    status: DeviceStatus,
    fetched_at: Instant,
}

impl ConnectorHandle {
    pub fn new(connector: Arc<dyn DeviceConnector>, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            connector,
            publisher,
            topic_template: DEFAULT_TOPIC_TEMPLATE.to_string(),
            status_ttl: None,
            state: Mutex::new(ConnectorState::default()),
            status_fetches: AtomicU64::new(0),
        }
    }

    /// Set the publish topic template (`{type}`, `{device}`)
    pub fn with_topic_template(mut self, template: impl Into<String>) -> Self {
        self.topic_template = template.into();
        self
    }

    /// Expire the cached status after `ttl`
    pub fn with_status_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.status_ttl = ttl;
        self
    }

    pub fn identify(&self) -> &str {
        self.connector.identify()
    }

    pub fn tag(&self) -> &str {
        self.connector.tag()
    }

    /// Number of `fetch_status` calls made so far
    pub fn status_fetches(&self) -> u64 {
        self.status_fetches.load(Ordering::Relaxed)
    }

    /// Bind a device, waiting for any other session on this connector to end
    ///
    /// The cached status survives only if it belongs to the same device and
    /// has not outlived the configured TTL.
    #[instrument(
        name = "connector_bind",
        skip(self, device),
        fields(connector = %self.tag(), device = %device.code)
    )]
    pub async fn bind(&self, device: Device) -> DeviceSession<'_> {
        let mut state = self.state.lock().await;

        let stale = state.cached.as_ref().is_some_and(|cached| {
            cached.device_code != device.code
                || self
                    .status_ttl
                    .is_some_and(|ttl| cached.fetched_at.elapsed() >= ttl)
        });
        if stale {
            debug!("cached device status invalidated");
            state.cached = None;
        }

        trace!("device bound");
        DeviceSession {
            handle: self,
            device,
            state,
        }
    }
}

/// A device bound to a connector
///
/// Holds the connector lock; other sessions on the same connector wait until
/// this one is dropped.
pub struct DeviceSession<'a> {
    handle: &'a ConnectorHandle,
    device: Device,
    state: MutexGuard<'a, ConnectorState>,
}

impl DeviceSession<'_> {
    /// The bound device
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Validate and execute a command, acknowledging non-empty results
    ///
    /// Validation failures, execution errors and publish errors all reach
    /// the connector's `handle_exec_error` hook and end in a typed outcome.
    #[instrument(
        name = "connector_exec",
        skip(self, request),
        fields(
            connector = %self.handle.tag(),
            device = %self.device.code,
            command = %request.identify
        )
    )]
    pub async fn exec(&self, request: &CommandRequest) -> ExecOutcome {
        let outcome = self.exec_inner(request).await;
        observability::record_command(&outcome);
        outcome
    }

    async fn exec_inner(&self, request: &CommandRequest) -> ExecOutcome {
        let connector = &self.handle.connector;

        let params = match validate_request(request) {
            Ok(params) => params,
            Err(err) => {
                connector.handle_exec_error(&self.device, &request.identify, &err);
                return ExecOutcome::Invalid(err.to_string());
            }
        };

        let result = match connector
            .do_exec(&self.device, &request.identify, params)
            .await
        {
            Ok(result) => result,
            Err(err) => {
                connector.handle_exec_error(&self.device, &request.identify, &err);
                return ExecOutcome::Failed(err.to_string());
            }
        };

        let Some(data) = result.filter(|value| !is_empty_result(value)) else {
            debug!("command produced no result");
            return ExecOutcome::NoResult;
        };

        match self.publish(MessageType::CommandAcknowledgment, data).await {
            Ok(()) => ExecOutcome::Acknowledged,
            Err(err) => {
                connector.handle_exec_error(&self.device, &request.identify, &err);
                ExecOutcome::Failed(err.to_string())
            }
        }
    }

    pub async fn report_property(&self) -> ReportOutcome {
        self.report(ReportKind::Property).await
    }

    pub async fn report_event(&self) -> ReportOutcome {
        self.report(ReportKind::Event).await
    }

    /// Build and publish one report; empty results are skipped
    #[instrument(
        name = "connector_report",
        skip(self),
        fields(connector = %self.handle.tag(), device = %self.device.code)
    )]
    pub async fn report(&self, kind: ReportKind) -> ReportOutcome {
        let connector = &self.handle.connector;
        let result = match kind {
            ReportKind::Property => connector.do_report_property(&self.device).await,
            ReportKind::Event => connector.do_report_event(&self.device).await,
        };

        let data = match result {
            Ok(Some(data)) if !is_empty_result(&data) => data,
            Ok(_) => {
                debug!(%kind, "empty report skipped");
                return ReportOutcome::Empty;
            }
            Err(err) => {
                error!(%kind, error = %err, "report failed");
                return ReportOutcome::Failed(err.to_string());
            }
        };

        match self.publish(kind.message_type(), data).await {
            Ok(()) => ReportOutcome::Published,
            Err(err) => {
                error!(%kind, error = %err, "report publish failed");
                ReportOutcome::Failed(err.to_string())
            }
        }
    }

    /// Cached device status, fetched on first use
    ///
    /// Returns `None` if fetching fails; a failed fetch is not cached.
    pub async fn device_status(&mut self) -> Option<DeviceStatus> {
        if let Some(cached) = &self.state.cached {
            return Some(cached.status.clone());
        }

        self.handle.status_fetches.fetch_add(1, Ordering::Relaxed);
        match self.handle.connector.fetch_status(&self.device).await {
            Ok(status) => {
                self.state.cached = Some(CachedStatus {
                    device_code: self.device.code.clone(),
                    status: status.clone(),
                    fetched_at: Instant::now(),
                });
                Some(status)
            }
            Err(err) => {
                warn!(
                    connector = %self.handle.tag(),
                    device = %self.device.code,
                    error = %err,
                    "device status fetch failed"
                );
                None
            }
        }
    }

    /// Drop the cached status
    pub fn clear_status(&mut self) {
        self.state.cached = None;
    }

    async fn publish(&self, message_type: MessageType, data: Value) -> Result<(), ContractError> {
        let topic = render_topic(&self.handle.topic_template, message_type, &self.device.code);
        let envelope = PublishEnvelope::new(&self.device.code, message_type, data);
        let payload = serde_json::to_string(&envelope)
            .map_err(|e| ContractError::publish(&topic, e.to_string()))?;

        self.handle
            .publisher
            .publish(&topic, &payload, message_type)
            .await?;
        debug!(%topic, message_type = %message_type, "published");
        Ok(())
    }
}

impl Drop for DeviceSession<'_> {
    fn drop(&mut self) {
        trace!(connector = %self.handle.tag(), device = %self.device.code, "device unbound");
    }
}

fn validate_request(request: &CommandRequest) -> Result<&CommandParams, ContractError> {
    if request.identify.trim().is_empty() {
        return Err(ContractError::validation(
            "identify",
            "command identifier is empty",
        ));
    }
    request
        .params
        .as_ref()
        .ok_or_else(|| ContractError::validation("params", "command parameters are missing"))
}

/// Whether a connector result carries nothing worth publishing
pub fn is_empty_result(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
