//! Cached response entries.
//!
//! Every write is an upsert keyed by (store, request identity). Only GET
//! requests may be stored.

use super::connection::CacheDb;
use super::hash::compute_request_key;
use super::stores::ensure_store;
use crate::{Error, Request, Response};
use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A response ready to be written, with its key precomputed.
struct PendingEntry {
    key_hash: String,
    request_url: String,
    method: String,
    response_url: String,
    status: i64,
    headers_json: String,
    body: Bytes,
}

impl PendingEntry {
    fn new(request: &Request, response: &Response) -> Result<Self, Error> {
        if !request.is_get() {
            return Err(Error::InvalidInput(format!("cannot cache {} request for {}", request.method, request.url)));
        }

        let headers_json =
            serde_json::to_string(&response.headers).map_err(|e| Error::InvalidInput(format!("headers: {e}")))?;

        Ok(Self {
            key_hash: compute_request_key(&request.method, &request.url),
            request_url: request.url.to_string(),
            method: request.method.to_ascii_uppercase(),
            response_url: response.url.clone(),
            status: i64::from(response.status),
            headers_json,
            body: response.body.clone(),
        })
    }

    fn upsert(&self, conn: &rusqlite::Connection, cache_name: &str, now: &str) -> Result<(), Error> {
        conn.execute(
            "INSERT INTO cache_entries (
                cache_name, key_hash, request_url, method, response_url,
                status, headers_json, body, stored_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(cache_name, key_hash) DO UPDATE SET
                request_url = excluded.request_url,
                method = excluded.method,
                response_url = excluded.response_url,
                status = excluded.status,
                headers_json = excluded.headers_json,
                body = excluded.body,
                stored_at = excluded.stored_at",
            params![
                cache_name,
                &self.key_hash,
                &self.request_url,
                &self.method,
                &self.response_url,
                self.status,
                &self.headers_json,
                &self.body[..],
                now,
            ],
        )?;
        Ok(())
    }
}

/// Raw row as read back from SQLite.
struct EntryRow {
    response_url: String,
    status: i64,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self { response_url: row.get(0)?, status: row.get(1)?, headers_json: row.get(2)?, body: row.get(3)? })
    }

    fn into_response(self) -> Result<Response, Error> {
        let status = u16::try_from(self.status)
            .map_err(|_| Error::CorruptEntry(format!("status {} out of range", self.status)))?;
        let headers: Vec<(String, String)> =
            serde_json::from_str(&self.headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        Ok(Response { url: self.response_url, status, headers, body: Bytes::from(self.body) })
    }
}

fn optional_row(result: rusqlite::Result<EntryRow>) -> Result<Option<EntryRow>, Error> {
    match result {
        Ok(row) => Ok(Some(row)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl CacheDb {
    /// Look up a request in one store.
    ///
    /// Non-GET requests never match.
    pub async fn match_entry(&self, cache_name: &str, request: &Request) -> Result<Option<Response>, Error> {
        if !request.is_get() {
            return Ok(None);
        }

        let cache_name = cache_name.to_string();
        let key_hash = compute_request_key(&request.method, &request.url);
        let row = self
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT response_url, status, headers_json, body
                     FROM cache_entries WHERE cache_name = ?1 AND key_hash = ?2",
                )?;
                optional_row(stmt.query_row(params![cache_name, key_hash], EntryRow::from_row))
            })
            .await
            .map_err(Error::from)?;

        row.map(EntryRow::into_response).transpose()
    }

    /// Look up a request across all stores, oldest store first.
    pub async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        if !request.is_get() {
            return Ok(None);
        }

        let key_hash = compute_request_key(&request.method, &request.url);
        let row = self
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT e.response_url, e.status, e.headers_json, e.body
                     FROM cache_entries e
                     JOIN cache_stores s ON s.name = e.cache_name
                     WHERE e.key_hash = ?1
                     ORDER BY s.rowid ASC
                     LIMIT 1",
                )?;
                optional_row(stmt.query_row(params![key_hash], EntryRow::from_row))
            })
            .await
            .map_err(Error::from)?;

        row.map(EntryRow::into_response).transpose()
    }

    /// Store a response, overwriting any previous entry for the same request.
    ///
    /// Creates the store if needed.
    pub async fn put_entry(&self, cache_name: &str, request: &Request, response: &Response) -> Result<(), Error> {
        let entry = PendingEntry::new(request, response)?;
        let cache_name = cache_name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_store(&tx, &cache_name, &now)?;
                entry.upsert(&tx, &cache_name, &now)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Store several responses in one transaction.
    ///
    /// Either every entry is written or none is.
    pub async fn put_entries(&self, cache_name: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
        let pending = entries
            .iter()
            .map(|(request, response)| PendingEntry::new(request, response))
            .collect::<Result<Vec<_>, _>>()?;
        let cache_name = cache_name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_store(&tx, &cache_name, &now)?;
                for entry in &pending {
                    entry.upsert(&tx, &cache_name, &now)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Request URLs stored in a store, sorted.
    pub async fn request_urls(&self, cache_name: &str) -> Result<Vec<String>, Error> {
        let cache_name = cache_name.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt =
                    conn.prepare("SELECT request_url FROM cache_entries WHERE cache_name = ?1 ORDER BY request_url")?;
                let urls = stmt
                    .query_map(params![cache_name], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn get(url: &str) -> Request {
        Request::get(Url::parse(url).unwrap())
    }

    fn js(body: &str) -> Response {
        Response::new("https://bar.example/main.dart.js", 200, body.to_string())
            .with_header("content-type", "application/javascript")
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = get("https://bar.example/main.dart.js");

        db.put_entry("v1", &request, &js("console.log(1)")).await.unwrap();

        let cached = db.match_entry("v1", &request).await.unwrap().unwrap();
        assert_eq!(cached.status, 200);
        assert_eq!(cached.body, Bytes::from("console.log(1)"));
        assert_eq!(cached.content_type(), Some("application/javascript"));
        assert!(db.has_cache("v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_match_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_cache("v1").await.unwrap();
        assert!(db.match_entry("v1", &get("https://bar.example/none")).await.unwrap().is_none());
        assert!(db.match_any(&get("https://bar.example/none")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = get("https://bar.example/main.dart.js");

        db.put_entry("v1", &request, &js("stale")).await.unwrap();
        db.put_entry("v1", &request, &js("fresh")).await.unwrap();

        let cached = db.match_entry("v1", &request).await.unwrap().unwrap();
        assert_eq!(cached.body, Bytes::from("fresh"));
        assert_eq!(db.request_urls("v1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_put_rejects_non_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = get("https://bar.example/api").with_method("POST");

        let result = db.put_entry("v1", &request, &js("x")).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(db.match_entry("v1", &request).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_entries_all_or_nothing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entries = vec![
            (get("https://bar.example/index.html"), js("<html>")),
            (get("https://bar.example/api").with_method("POST"), js("x")),
        ];

        assert!(db.put_entries("v1", &entries).await.is_err());
        assert!(db.request_urls("v1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_put_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entries = vec![
            (get("https://bar.example/index.html"), js("<html>")),
            (get("https://bar.example/main.dart.js"), js("main")),
        ];

        db.put_entries("v1", &entries).await.unwrap();
        assert_eq!(
            db.request_urls("v1").await.unwrap(),
            vec!["https://bar.example/index.html", "https://bar.example/main.dart.js"]
        );
    }

    #[tokio::test]
    async fn test_match_any_prefers_oldest_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = get("https://bar.example/index.html");

        db.put_entry("v1", &request, &js("old shell")).await.unwrap();
        db.put_entry("v2", &request, &js("new shell")).await.unwrap();

        let cached = db.match_any(&request).await.unwrap().unwrap();
        assert_eq!(cached.body, Bytes::from("old shell"));

        db.delete_cache("v1").await.unwrap();
        let cached = db.match_any(&request).await.unwrap().unwrap();
        assert_eq!(cached.body, Bytes::from("new shell"));
    }

    #[tokio::test]
    async fn test_delete_cache_drops_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = get("https://bar.example/index.html");
        db.put_entry("v0", &request, &js("<html>")).await.unwrap();

        db.delete_cache("v0").await.unwrap();

        assert!(db.match_any(&request).await.unwrap().is_none());
        assert!(db.request_urls("v0").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_entries_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sqlite");
        let request = get("https://bar.example/index.html");

        {
            let db = CacheDb::open(&path).await.unwrap();
            db.put_entry("smartbar-pwa-v1", &request, &js("<html>")).await.unwrap();
        }

        let db = CacheDb::open(&path).await.unwrap();
        let cached = db.match_entry("smartbar-pwa-v1", &request).await.unwrap().unwrap();
        assert_eq!(cached.body, Bytes::from("<html>"));
    }
}
