//! Office-scoped access to the attendance store.
//!
//! Handlers never see the [`AttendanceStore`] itself. They ask the
//! [`GuardedStore`] for a handle, and a handle is only issued when the
//! authenticated user's scope covers the office (or, for
//! [`AllOfficesHandle`], when the user is an admin).

use tracing::warn;

use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::attendance::{AttendanceEntry, AttendanceRecord, Month};
use crate::store::{AttendanceStore, StoreError};

pub struct GuardedStore {
    store: AttendanceStore,
}

impl GuardedStore {
    pub fn new(store: AttendanceStore) -> Self {
        Self { store }
    }

    pub fn office(&self, user: &AuthUser, office: &str) -> Result<OfficeHandle<'_>, ApiError> {
        if !user.can_access(office) {
            warn!(
                username = %user.username,
                office,
                "Office access denied"
            );
            return Err(ApiError::forbidden(format!("No access to office '{office}'")));
        }

        Ok(OfficeHandle {
            store: &self.store,
            office: office.to_string(),
        })
    }

    pub fn all_offices(&self, user: &AuthUser) -> Result<AllOfficesHandle<'_>, ApiError> {
        user.require_admin()?;
        Ok(AllOfficesHandle { store: &self.store })
    }
}

/// Read and write access to one office's attendance.
pub struct OfficeHandle<'a> {
    store: &'a AttendanceStore,
    office: String,
}

impl OfficeHandle<'_> {
    pub fn office(&self) -> &str {
        &self.office
    }

    pub fn mark_attendance(
        &self,
        date: &str,
        records: Vec<AttendanceRecord>,
    ) -> Result<(), StoreError> {
        self.store.mark_attendance(&self.office, date, records)
    }

    pub fn attendance(&self, month: Option<Month>) -> Vec<AttendanceEntry> {
        self.store.get_office_attendance(&self.office, month)
    }

    pub fn daily_roster(&self, date: &str) -> Option<Vec<AttendanceRecord>> {
        self.store.get_daily_roster(&self.office, date)
    }
}

/// Read access across every office. Admins only.
pub struct AllOfficesHandle<'a> {
    store: &'a AttendanceStore,
}

impl AllOfficesHandle<'_> {
    pub fn attendance(&self, month: Option<Month>) -> Vec<AttendanceEntry> {
        self.store.get_all_attendance(month)
    }

    pub fn offices_reported(&self, date: &str) -> Vec<String> {
        self.store.offices_reported(date)
    }
}
