//! Read-only attendance reports.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::StoreError;
use crate::model::{AttendanceRecord, EventType};
use crate::store::RecordSource;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct EventCounts {
    pub check_ins: u64,
    pub check_outs: u64,
}

impl EventCounts {
    fn count(&mut self, event_type: EventType) {
        match event_type {
            EventType::CheckIn => self.check_ins += 1,
            EventType::CheckOut => self.check_outs += 1,
        }
    }
}

pub struct Reports {
    source: Arc<dyn RecordSource>,
}

impl Reports {
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self { source }
    }

    fn filtered(
        &self,
        keep: impl Fn(&AttendanceRecord) -> bool,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        Ok(self.source.records()?.into_iter().filter(keep).collect())
    }

    /// Records for one zone on one UTC calendar day.
    pub fn by_zone_on_date(&self, zone: &str, date: NaiveDate) -> Result<Vec<AttendanceRecord>, StoreError> {
        self.filtered(|r| r.zone_name == zone && r.timestamp_utc.date_naive() == date)
    }

    pub fn by_employee(&self, employee_id: &str) -> Result<Vec<AttendanceRecord>, StoreError> {
        self.filtered(|r| r.employee_id == employee_id)
    }

    /// Records with `start <= timestamp <= end`.
    pub fn in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        self.filtered(|r| r.timestamp_utc >= start && r.timestamp_utc <= end)
    }

    /// Check-in/check-out counts per employee.
    pub fn summary(&self) -> Result<BTreeMap<String, EventCounts>, StoreError> {
        self.tally(|r| &r.employee_id)
    }

    /// Check-in/check-out counts per zone.
    pub fn zone_summary(&self) -> Result<BTreeMap<String, EventCounts>, StoreError> {
        self.tally(|r| &r.zone_name)
    }

    fn tally(
        &self,
        key: impl Fn(&AttendanceRecord) -> &String,
    ) -> Result<BTreeMap<String, EventCounts>, StoreError> {
        let mut out: BTreeMap<String, EventCounts> = BTreeMap::new();
        for record in self.source.records()? {
            out.entry(key(&record).clone())
                .or_default()
                .count(record.event_type);
        }
        Ok(out)
    }
}
