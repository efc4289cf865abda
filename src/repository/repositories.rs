//! Holding-institution rows.

use rusqlite::{params, Connection};

use super::{to_option, Result};
use crate::models::RepositoryInfo;

/// A repository row together with its database ID.
#[derive(Debug, Clone)]
pub struct RepositoryRow {
    pub id: i64,
    pub info: RepositoryInfo,
}

pub struct RepositoryStore<'a> {
    conn: &'a Connection,
}

impl<'a> RepositoryStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Find a repository by its short name.
    pub fn find(&self, short_name: &str) -> Result<Option<RepositoryRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, short_name, logo_url, catalogue_url
             FROM repositories WHERE short_name = ?",
        )?;
        to_option(stmt.query_row(params![short_name], |row| {
            Ok(RepositoryRow {
                id: row.get("id")?,
                info: RepositoryInfo {
                    name: row.get("name")?,
                    short_name: row.get("short_name")?,
                    logo_url: row.get("logo_url")?,
                    catalogue_url: row.get("catalogue_url")?,
                },
            })
        }))
    }

    /// Find-or-create by short name, returning the row ID. Existing rows
    /// are left untouched.
    pub fn ensure(&self, info: &RepositoryInfo) -> Result<i64> {
        if let Some(existing) = self.find(&info.short_name)? {
            return Ok(existing.id);
        }
        self.conn.execute(
            "INSERT INTO repositories (name, short_name, logo_url, catalogue_url)
             VALUES (?, ?, ?, ?)",
            params![info.name, info.short_name, info.logo_url, info.catalogue_url],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All repositories with their manuscript counts, for status output.
    pub fn list_with_counts(&self) -> Result<Vec<(RepositoryRow, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.id, r.name, r.short_name, r.logo_url, r.catalogue_url,
                    COUNT(m.id) AS manuscript_count
             FROM repositories r
             LEFT JOIN manuscripts m ON m.repository_id = r.id
             GROUP BY r.id
             ORDER BY r.name",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    RepositoryRow {
                        id: row.get("id")?,
                        info: RepositoryInfo {
                            name: row.get("name")?,
                            short_name: row.get("short_name")?,
                            logo_url: row.get("logo_url")?,
                            catalogue_url: row.get("catalogue_url")?,
                        },
                    },
                    row.get("manuscript_count")?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{connect, init_schema};

    fn repo_info() -> RepositoryInfo {
        RepositoryInfo::new(
            "Parker Library, Corpus Christi College",
            "parker",
            None,
            "https://parker.stanford.edu",
        )
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let conn = connect(&dir.path().join("test.db")).unwrap();
        init_schema(&conn).unwrap();
        let store = RepositoryStore::new(&conn);

        let first = store.ensure(&repo_info()).unwrap();
        let second = store.ensure(&repo_info()).unwrap();
        assert_eq!(first, second);

        let rows = store.list_with_counts().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1, 0);
    }

    #[test]
    fn test_ensure_leaves_existing_row_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let conn = connect(&dir.path().join("test.db")).unwrap();
        init_schema(&conn).unwrap();
        let store = RepositoryStore::new(&conn);

        let id = store.ensure(&repo_info()).unwrap();
        let mut renamed = repo_info();
        renamed.name = "Parker Library".to_string();
        assert_eq!(store.ensure(&renamed).unwrap(), id);

        let row = store.find("parker").unwrap().unwrap();
        assert_eq!(row.info.name, "Parker Library, Corpus Christi College");
    }
}
