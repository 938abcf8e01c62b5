/*
 * Responsibility
 * - Users の request (query) / response DTO
 * - validation (形式チェック) は validate() / key() に持たせる
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repos::UserRow;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListUsersQuery {
    /// Returns `(limit, offset)` with defaults applied.
    pub fn validate(&self) -> Result<(i64, i64), &'static str> {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err("limit must be between 1 and 100");
        }

        let offset = self.offset.unwrap_or(0);
        if offset < 0 {
            return Err("offset must be >= 0");
        }

        Ok((limit, offset))
    }
}

/// `GET /users/lookup?email=...` など。キーはちょうど 1 つ指定する
#[derive(Debug, Default, Deserialize)]
pub struct LookupUserQuery {
    pub appwrite_id: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKey<'a> {
    AppwriteId(&'a str),
    Email(&'a str),
    Phone(&'a str),
    Username(&'a str),
}

impl LookupUserQuery {
    pub fn key(&self) -> Result<LookupKey<'_>, &'static str> {
        fn given(v: &Option<String>) -> Option<&str> {
            v.as_deref().map(str::trim).filter(|s| !s.is_empty())
        }

        let keys: Vec<LookupKey<'_>> = [
            given(&self.appwrite_id).map(LookupKey::AppwriteId),
            given(&self.email).map(LookupKey::Email),
            given(&self.phone).map(LookupKey::Phone),
            given(&self.username).map(LookupKey::Username),
        ]
        .into_iter()
        .flatten()
        .collect();

        match keys.as_slice() {
            [key] => Ok(*key),
            [] => Err("one of appwrite_id, email, phone, username is required"),
            _ => Err("only one lookup key may be given"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub appwrite_id: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserResponse {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            appwrite_id: row.appwrite_id,
            email: row.email,
            phone: row.phone,
            username: row.username,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_defaults_and_bounds() {
        assert_eq!(ListUsersQuery::default().validate(), Ok((50, 0)));

        let q = ListUsersQuery {
            limit: Some(0),
            offset: None,
        };
        assert!(q.validate().is_err());

        let q = ListUsersQuery {
            limit: Some(10),
            offset: Some(-1),
        };
        assert!(q.validate().is_err());
    }

    #[test]
    fn lookup_requires_exactly_one_key() {
        let q = LookupUserQuery {
            email: Some(" ada@example.com ".into()),
            ..Default::default()
        };
        assert_eq!(q.key(), Ok(LookupKey::Email("ada@example.com")));

        let q = LookupUserQuery {
            email: Some("ada@example.com".into()),
            phone: Some("+15550000".into()),
            ..Default::default()
        };
        assert!(q.key().is_err());

        let q = LookupUserQuery {
            username: Some("   ".into()),
            ..Default::default()
        };
        assert!(q.key().is_err());
    }
}
