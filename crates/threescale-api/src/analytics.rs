// Usage statistics
//
// Stats live outside `/admin/api` and come back without an entity envelope;
// the decoded body is returned as-is.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};
use tracing::{debug, info};

use crate::entity::EntityId;
use crate::error::Error;
use crate::transport::{Params, Transport, TransportExt};

/// Which kind of resource usage is aggregated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum UsageTarget {
    Applications,
    Services,
}

/// Reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Period {
    Hour,
    Day,
    Week,
    Month,
    #[default]
    Year,
}

/// Bucket size of the returned series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Granularity {
    Hour,
    Day,
    Month,
}

/// Bound of a reporting window, a whole day or an exact instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageTime {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl From<NaiveDate> for UsageTime {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

impl From<NaiveDateTime> for UsageTime {
    fn from(at: NaiveDateTime) -> Self {
        Self::DateTime(at)
    }
}

impl std::fmt::Display for UsageTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::DateTime(at) => write!(f, "{}", at.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// Parameters of one usage query.
#[derive(Debug, Clone)]
pub struct UsageQuery {
    pub target: UsageTarget,
    pub id: EntityId,
    pub metric_name: String,
    pub since: UsageTime,
    pub period: Period,
    pub until: Option<UsageTime>,
    pub granularity: Option<Granularity>,
    pub timezone: Option<String>,
    pub skip_change: Option<bool>,
    /// Extra filters passed through untouched; they win over the named ones.
    pub filters: Params,
}

impl UsageQuery {
    pub fn new(
        target: UsageTarget,
        id: impl Into<EntityId>,
        metric_name: impl Into<String>,
        since: impl Into<UsageTime>,
    ) -> Self {
        Self {
            target,
            id: id.into(),
            metric_name: metric_name.into(),
            since: since.into(),
            period: Period::default(),
            until: None,
            granularity: None,
            timezone: None,
            skip_change: None,
            filters: Params::new(),
        }
    }

    /// Usage of one application.
    pub fn application(
        id: impl Into<EntityId>,
        metric_name: impl Into<String>,
        since: impl Into<UsageTime>,
    ) -> Self {
        Self::new(UsageTarget::Applications, id, metric_name, since)
    }

    /// Usage of one service.
    pub fn service(
        id: impl Into<EntityId>,
        metric_name: impl Into<String>,
        since: impl Into<UsageTime>,
    ) -> Self {
        Self::new(UsageTarget::Services, id, metric_name, since)
    }

    pub fn period(mut self, period: Period) -> Self {
        self.period = period;
        self
    }

    pub fn until(mut self, until: impl Into<UsageTime>) -> Self {
        self.until = Some(until.into());
        self
    }

    /// Time zone the server aggregates in, e.g. `"Europe/Prague"`.
    pub fn timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = Some(granularity);
        self
    }

    pub fn skip_change(mut self, skip: bool) -> Self {
        self.skip_change = Some(skip);
        self
    }

    pub fn path(&self) -> String {
        format!("/stats/{}/{}/usage", self.target, self.id)
    }

    pub fn params(&self) -> Params {
        let mut params = Params::new();
        params.insert("metric_name".into(), self.metric_name.clone());
        params.insert("since".into(), self.since.to_string());
        params.insert("period".into(), self.period.to_string());
        if let Some(until) = self.until {
            params.insert("until".into(), until.to_string());
        }
        if let Some(granularity) = self.granularity {
            params.insert("granularity".into(), granularity.to_string());
        }
        if let Some(timezone) = &self.timezone {
            params.insert("timezone".into(), timezone.clone());
        }
        if let Some(skip) = self.skip_change {
            params.insert("skip_change".into(), skip.to_string());
        }
        params.extend(self.filters.clone());
        params
    }
}

/// Typed view of a usage report.
#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub total: Option<i64>,
    #[serde(default)]
    pub values: Vec<i64>,
    #[serde(default)]
    pub change: Option<f64>,
    #[serde(default)]
    pub period: Option<Value>,
    #[serde(default)]
    pub metric: Option<Value>,
}

/// Read-only access to usage statistics.
#[derive(Clone)]
pub struct Analytics {
    transport: Arc<dyn Transport>,
}

impl Analytics {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Decoded usage report, unchanged (`Null` for an empty body).
    pub fn usage(&self, query: &UsageQuery) -> Result<Value, Error> {
        let path = query.path();
        info!(resource = "analytics", %path, metric = %query.metric_name, "usage");
        let body = self.transport.get(&path, Some(&query.params()))?;
        debug!(resource = "analytics", found = body.is_some(), "usage fetched");
        Ok(body.unwrap_or(Value::Null))
    }

    /// [`usage`](Self::usage) deserialized into [`Usage`].
    pub fn usage_view(&self, query: &UsageQuery) -> Result<Usage, Error> {
        let body = self.usage(query)?;
        serde_json::from_value(body.clone()).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: body.to_string(),
        })
    }
}

impl std::fmt::Debug for Analytics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analytics").finish_non_exhaustive()
    }
}
