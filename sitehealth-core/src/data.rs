use rusqlite::{Connection, OptionalExtension, Result, params};
use serde::{Deserialize, Serialize};
use sitehealth_crawler::LinkResult;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

pub struct Database {
    conn: Connection,
}

/// Persisted view of one crawl session with its aggregate counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub id: String,
    pub start_url: String,
    pub started_at: i64,
    pub completed_at: Option<i64>,
    pub max_depth: i64,
    pub total_pages: i64,
    pub total_links: i64,
    pub errors: i64,
    pub warnings: i64,
    pub status: String,
}

/// One stored link-check row, as read back from the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredLinkResult {
    pub source_url: String,
    pub target_url: String,
    pub link_type: String,
    pub status_code: Option<i64>,
    pub response_time_ms: i64,
    pub severity: String,
    pub error_message: Option<String>,
    pub final_url: Option<String>,
    pub checked_at: i64,
}

fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

impl Database {
    pub fn drop(path: &Path) {
        fs::remove_file(path).unwrap();
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Optimize for concurrent writes
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            -- Crawl sessions
            CREATE TABLE IF NOT EXISTS crawls (
    id TEXT PRIMARY KEY,
    start_url TEXT NOT NULL,
    started_at INTEGER NOT NULL,
    completed_at INTEGER,
    max_depth INTEGER NOT NULL,
    total_pages INTEGER NOT NULL DEFAULT 0,
    total_links INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL CHECK(status IN ('running', 'completed', 'failed'))
);

-- One row per checked link
CREATE TABLE IF NOT EXISTS link_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    crawl_id TEXT NOT NULL,
    source_url TEXT NOT NULL,
    target_url TEXT NOT NULL,
    link_type TEXT NOT NULL CHECK(link_type IN ('page', 'image', 'stylesheet', 'script', 'external')),
    status_code INTEGER,
    response_time_ms INTEGER NOT NULL,
    severity TEXT NOT NULL CHECK(severity IN ('error', 'warning', 'success')),
    error_message TEXT,
    final_url TEXT,
    checked_at INTEGER NOT NULL,
    FOREIGN KEY(crawl_id) REFERENCES crawls(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_link_results_crawl ON link_results(crawl_id);
CREATE INDEX IF NOT EXISTS idx_link_results_severity ON link_results(crawl_id, severity);
CREATE INDEX IF NOT EXISTS idx_link_results_type ON link_results(crawl_id, link_type);
            ",
        )?;
        Ok(())
    }

    // Session management
    pub fn create_crawl(&self, start_url: &str, max_depth: usize) -> Result<String> {
        let crawl_id = uuid::Uuid::new_v4().to_string();
        let timestamp = current_timestamp();

        self.conn.execute(
            "INSERT INTO crawls (id, start_url, started_at, max_depth, status) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![&crawl_id, start_url, timestamp, max_depth as i64, "running"],
        )?;

        Ok(crawl_id)
    }

    pub fn complete_crawl(
        &self,
        crawl_id: &str,
        total_pages: usize,
        total_links: usize,
    ) -> Result<()> {
        let timestamp = current_timestamp();
        self.conn.execute(
            "UPDATE crawls SET status = ?1, completed_at = ?2, total_pages = ?3, total_links = ?4 WHERE id = ?5",
            params!["completed", timestamp, total_pages as i64, total_links as i64, crawl_id],
        )?;
        Ok(())
    }

    pub fn fail_crawl(&self, crawl_id: &str) -> Result<()> {
        let timestamp = current_timestamp();
        self.conn.execute(
            "UPDATE crawls SET status = ?1, completed_at = ?2 WHERE id = ?3",
            params!["failed", timestamp, crawl_id],
        )?;
        Ok(())
    }

    // Result storage
    pub fn save_link_result(&self, crawl_id: &str, result: &LinkResult) -> Result<i64> {
        let timestamp = current_timestamp();

        self.conn.execute(
            "INSERT INTO link_results (
                crawl_id, source_url, target_url, link_type, status_code,
                response_time_ms, severity, error_message, final_url, checked_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                crawl_id,
                &result.source_url,
                &result.target_url,
                result.link_type.as_str(),
                result.status_code.map(|c| c as i64),
                result.response_time.as_millis() as i64,
                result.severity.as_str(),
                &result.error_message,
                &result.final_url,
                timestamp,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    /// Insert a whole run's results inside one transaction.
    pub fn save_link_results(&mut self, crawl_id: &str, results: &[LinkResult]) -> Result<()> {
        let timestamp = current_timestamp();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO link_results (
                    crawl_id, source_url, target_url, link_type, status_code,
                    response_time_ms, severity, error_message, final_url, checked_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;

            for result in results {
                stmt.execute(params![
                    crawl_id,
                    &result.source_url,
                    &result.target_url,
                    result.link_type.as_str(),
                    result.status_code.map(|c| c as i64),
                    result.response_time.as_millis() as i64,
                    result.severity.as_str(),
                    &result.error_message,
                    &result.final_url,
                    timestamp,
                ])?;
            }
        }
        tx.commit()
    }

    // Query methods
    pub fn get_crawl_summary(&self, crawl_id: &str) -> Result<Option<CrawlSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, start_url, started_at, completed_at, max_depth, total_pages, total_links, status
             FROM crawls WHERE id = ?1",
        )?;

        let row = stmt
            .query_row(params![crawl_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, i64>(6)?,
                    row.get::<_, String>(7)?,
                ))
            })
            .optional()?;

        let Some((id, start_url, started_at, completed_at, max_depth, total_pages, total_links, status)) =
            row
        else {
            return Ok(None);
        };

        let errors = self.count_severity(crawl_id, "error")?;
        let warnings = self.count_severity(crawl_id, "warning")?;

        Ok(Some(CrawlSummary {
            id,
            start_url,
            started_at,
            completed_at,
            max_depth,
            total_pages,
            total_links,
            errors,
            warnings,
            status,
        }))
    }

    fn count_severity(&self, crawl_id: &str, severity: &str) -> Result<i64> {
        self.conn.query_row(
            "SELECT COUNT(*) FROM link_results WHERE crawl_id = ?1 AND severity = ?2",
            params![crawl_id, severity],
            |row| row.get(0),
        )
    }

    pub fn get_link_results(
        &self,
        crawl_id: &str,
        severity: Option<&str>,
    ) -> Result<Vec<StoredLinkResult>> {
        let mut stmt = self.conn.prepare(
            "SELECT source_url, target_url, link_type, status_code, response_time_ms,
                    severity, error_message, final_url, checked_at
             FROM link_results
             WHERE crawl_id = ?1 AND (?2 IS NULL OR severity = ?2)
             ORDER BY id",
        )?;

        let results = stmt
            .query_map(params![crawl_id, severity], |row| {
                Ok(StoredLinkResult {
                    source_url: row.get(0)?,
                    target_url: row.get(1)?,
                    link_type: row.get(2)?,
                    status_code: row.get(3)?,
                    response_time_ms: row.get(4)?,
                    severity: row.get(5)?,
                    error_message: row.get(6)?,
                    final_url: row.get(7)?,
                    checked_at: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;

        Ok(results)
    }

    pub fn get_counts_by_severity(&self, crawl_id: &str) -> Result<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT severity, COUNT(*) FROM link_results WHERE crawl_id = ?1 GROUP BY severity",
        )?;

        let counts = stmt
            .query_map(params![crawl_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>>>()?;

        Ok(counts)
    }

    pub fn get_counts_by_link_type(&self, crawl_id: &str) -> Result<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT link_type, COUNT(*) FROM link_results WHERE crawl_id = ?1 GROUP BY link_type",
        )?;

        let counts = stmt
            .query_map(params![crawl_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>>>()?;

        Ok(counts)
    }

    /// Most recently started crawl, for `report` without an explicit id.
    pub fn latest_crawl_id(&self) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT id FROM crawls ORDER BY started_at DESC, rowid DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()
    }

    pub fn get_connection(&self) -> &Connection {
        &self.conn
    }
}
