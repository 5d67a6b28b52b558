//! Internal Diesel row structs for `sys_user`.
//!
//! Timestamps are stored as naive UTC.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::{AuditName, SysUser, UserId, UserValidationError, Username};

use super::schema::sys_user;

/// Row read from `sys_user`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = sys_user)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SysUserRow {
    pub id: String,
    pub username: String,
    pub create_user: String,
    pub update_user: String,
    pub create_time: NaiveDateTime,
    pub update_time: NaiveDateTime,
}

impl TryFrom<SysUserRow> for SysUser {
    type Error = UserValidationError;

    fn try_from(row: SysUserRow) -> Result<Self, Self::Error> {
        Ok(Self::restore(
            UserId::new(row.id)?,
            Username::new(row.username)?,
            (AuditName::new(row.create_user)?, AuditName::new(row.update_user)?),
            row.create_time.and_utc(),
            row.update_time.and_utc(),
        ))
    }
}

/// Row inserted into `sys_user`.
#[derive(Debug, Insertable)]
#[diesel(table_name = sys_user)]
pub(crate) struct NewSysUserRow<'a> {
    pub id: &'a str,
    pub username: &'a str,
    pub create_user: &'a str,
    pub update_user: &'a str,
    pub create_time: NaiveDateTime,
    pub update_time: NaiveDateTime,
}

impl<'a> From<&'a SysUser> for NewSysUserRow<'a> {
    fn from(user: &'a SysUser) -> Self {
        Self {
            id: user.id().as_ref(),
            username: user.username().as_ref(),
            create_user: user.create_user().as_ref(),
            update_user: user.update_user().as_ref(),
            create_time: user.create_time().naive_utc(),
            update_time: user.update_time().naive_utc(),
        }
    }
}
