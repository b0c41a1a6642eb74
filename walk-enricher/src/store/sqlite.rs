//! SQLite-backed stop store, address source and route sink.

use std::sync::Arc;

use futures::Stream;
use futures::stream::{self, StreamExt};
use rusqlite::{Connection, params};
use tokio::task;
use tracing::{debug, instrument};

use crate::domain::{Address, AddressId, Coordinate, RouteRecord, Stop, StopId, StopSet};
use crate::enrich::RouteSink;

use super::connection::{ConnectionPool, DatabaseConfig, create_pool};
use super::error::StoreError;

/// Default number of address rows fetched per query.
const DEFAULT_PAGE_SIZE: u32 = 500;

/// Which addresses the source yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressQuery {
    /// Rows fetched per round trip.
    pub page_size: u32,

    /// Only yield addresses that have no routes stored yet.
    pub pending_only: bool,
}

impl AddressQuery {
    /// Set the page size.
    pub fn with_page_size(mut self, n: u32) -> Self {
        self.page_size = n;
        self
    }

    /// Restrict to addresses without stored routes.
    pub fn pending_only(mut self, pending_only: bool) -> Self {
        self.pending_only = pending_only;
        self
    }
}

impl Default for AddressQuery {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            pending_only: false,
        }
    }
}

/// Position of a paged address scan.
enum Cursor {
    /// Next page starts after this id (`None` before the first page).
    After(Option<i64>),
    Done,
}

/// SQLite store holding stops, addresses and computed routes.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: Arc<ConnectionPool>,
}

impl SqliteStore {
    /// Open (or create) the database described by `config`.
    pub fn open(config: &DatabaseConfig) -> Result<Self, StoreError> {
        Ok(Self {
            pool: Arc::new(create_pool(config)?),
        })
    }

    /// Load every stop, ordered by id.
    ///
    /// Fails on the first stop with an unusable coordinate.
    #[instrument(skip(self))]
    pub async fn all_stops(&self) -> Result<StopSet, StoreError> {
        let pool = Arc::clone(&self.pool);

        let stops = task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt =
                conn.prepare("SELECT id, latitude, longitude FROM stops ORDER BY id")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?, row.get::<_, f64>(2)?))
            })?;

            let mut stops = Vec::new();
            for row in rows {
                let (id, lat, lon) = row?;
                let location = Coordinate::new(lat, lon).map_err(|source| {
                    StoreError::InvalidCoordinate {
                        table: "stops",
                        id,
                        source,
                    }
                })?;
                stops.push(Stop::new(StopId::new(id), location));
            }

            Ok::<_, StoreError>(StopSet::new(stops))
        })
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))??;

        debug!(count = stops.len(), "loaded stops");
        Ok(stops)
    }

    /// Stream addresses in id order, one page of rows at a time.
    ///
    /// The stream is forward-only. Rows with an unusable coordinate are
    /// yielded as row errors and the scan continues past them; a failed
    /// page query is yielded once and ends the stream.
    pub fn addresses(
        &self,
        query: AddressQuery,
    ) -> impl Stream<Item = Result<Address, StoreError>> + use<> {
        let pool = Arc::clone(&self.pool);

        stream::unfold(Cursor::After(None), move |cursor| {
            let pool = Arc::clone(&pool);
            async move {
                let Cursor::After(after) = cursor else {
                    return None;
                };

                let page = task::spawn_blocking(move || {
                    let conn = pool.get()?;
                    fetch_address_page(&conn, after, query)
                })
                .await
                .map_err(|e| StoreError::Unavailable(e.to_string()))
                .and_then(|page| page);

                match page {
                    Ok(rows) if rows.is_empty() => None,
                    Ok(rows) => {
                        let next = if rows.len() < query.page_size as usize {
                            Cursor::Done
                        } else {
                            Cursor::After(rows.last().map(|(id, _, _)| *id))
                        };
                        let addresses: Vec<_> = rows.into_iter().map(row_to_address).collect();
                        Some((addresses, next))
                    }
                    Err(e) => Some((vec![Err(e)], Cursor::Done)),
                }
            }
        })
        .flat_map(stream::iter)
    }

    /// Number of routes stored.
    pub async fn route_count(&self) -> Result<u64, StoreError> {
        let pool = Arc::clone(&self.pool);

        task::spawn_blocking(move || {
            let conn = pool.get()?;
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM routes", [], |row| row.get(0))?;
            Ok(u64::try_from(count).unwrap_or_default())
        })
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?
    }
}

impl RouteSink for SqliteStore {
    #[instrument(skip(self, record), fields(address = %record.address_id, stop = %record.stop_id))]
    async fn add_route(&self, record: &RouteRecord) -> Result<(), StoreError> {
        let pool = Arc::clone(&self.pool);
        let record = *record;

        task::spawn_blocking(move || {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO routes (address_id, stop_id, distance, time)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.address_id.get(),
                    record.stop_id.get(),
                    record.distance,
                    record.time,
                ],
            )?;
            Ok::<_, StoreError>(())
        })
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))??;

        debug!("saved route");
        Ok(())
    }
}

type AddressRow = (i64, f64, f64);

/// Fetch up to `page_size` address rows with id greater than `after`.
fn fetch_address_page(
    conn: &Connection,
    after: Option<i64>,
    query: AddressQuery,
) -> Result<Vec<AddressRow>, StoreError> {
    let sql = if query.pending_only {
        "SELECT a.id, a.latitude, a.longitude FROM addresses a
         WHERE (?1 IS NULL OR a.id > ?1)
           AND NOT EXISTS (SELECT 1 FROM routes r WHERE r.address_id = a.id)
         ORDER BY a.id LIMIT ?2"
    } else {
        "SELECT a.id, a.latitude, a.longitude FROM addresses a
         WHERE (?1 IS NULL OR a.id > ?1)
         ORDER BY a.id LIMIT ?2"
    };

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![after, query.page_size], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn row_to_address((id, lat, lon): AddressRow) -> Result<Address, StoreError> {
    Coordinate::new(lat, lon)
        .map(|location| Address::new(AddressId::new(id), location))
        .map_err(|source| StoreError::InvalidCoordinate {
            table: "addresses",
            id,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use std::io;
    use std::sync::Mutex;
    use tempfile::{TempDir, tempdir};
    use tracing::instrument::WithSubscriber;
    use tracing_subscriber::fmt::MakeWriter;

    fn open_temp() -> (TempDir, SqliteStore, String) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.sqlite3").to_string_lossy().into_owned();
        let store = SqliteStore::open(&DatabaseConfig::new(&path)).unwrap();
        (dir, store, path)
    }

    fn seed(path: &str, sql: &str) {
        Connection::open(path).unwrap().execute_batch(sql).unwrap();
    }

    fn read_routes(path: &str) -> Vec<(i64, i64, f64, f64)> {
        let conn = Connection::open(path).unwrap();
        let mut stmt = conn
            .prepare("SELECT address_id, stop_id, distance, time FROM routes ORDER BY address_id, stop_id")
            .unwrap();
        stmt.query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
    }

    #[tokio::test]
    async fn loads_stops_in_id_order() {
        let (_dir, store, path) = open_temp();
        seed(
            &path,
            "INSERT INTO stops VALUES (3, 10.0, 10.0);
             INSERT INTO stops VALUES (1, 0.0, 0.0);
             INSERT INTO stops VALUES (2, 1.0, 1.0);",
        );

        let stops = store.all_stops().await.unwrap();
        let ids: Vec<i64> = stops.as_slice().iter().map(|s| s.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(stops.as_slice()[2].location.latitude(), 10.0);
    }

    #[tokio::test]
    async fn empty_stop_table_gives_empty_set() {
        let (_dir, store, _path) = open_temp();
        assert!(store.all_stops().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn infinite_stop_coordinate_fails_load() {
        let (_dir, store, path) = open_temp();
        seed(&path, "INSERT INTO stops VALUES (1, 9e999, 0.0);");

        let err = store.all_stops().await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidCoordinate { table: "stops", id: 1, .. }
        ));
    }

    #[tokio::test]
    async fn streams_all_addresses_across_pages() {
        let (_dir, store, path) = open_temp();
        let inserts: String = (1..=7)
            .map(|i| format!("INSERT INTO addresses VALUES ({i}, {i}.0, 0.5);"))
            .collect();
        seed(&path, &inserts);

        let addresses: Vec<Address> = store
            .addresses(AddressQuery::default().with_page_size(3))
            .try_collect()
            .await
            .unwrap();

        let ids: Vec<i64> = addresses.iter().map(|a| a.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[tokio::test]
    async fn exact_page_multiple_terminates() {
        let (_dir, store, path) = open_temp();
        seed(
            &path,
            "INSERT INTO addresses VALUES (1, 0.0, 0.0);
             INSERT INTO addresses VALUES (2, 0.0, 0.0);",
        );

        let addresses: Vec<Address> = store
            .addresses(AddressQuery::default().with_page_size(2))
            .try_collect()
            .await
            .unwrap();
        assert_eq!(addresses.len(), 2);
    }

    #[tokio::test]
    async fn empty_address_table_yields_nothing() {
        let (_dir, store, _path) = open_temp();
        let items: Vec<_> = store.addresses(AddressQuery::default()).collect().await;
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn bad_address_row_is_yielded_as_row_error() {
        let (_dir, store, path) = open_temp();
        seed(
            &path,
            "INSERT INTO addresses VALUES (1, 0.0, 0.0);
             INSERT INTO addresses VALUES (2, 0.0, -9e999);
             INSERT INTO addresses VALUES (3, 1.0, 1.0);",
        );

        let items: Vec<_> = store
            .addresses(AddressQuery::default().with_page_size(2))
            .collect()
            .await;

        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok());
        assert!(items[1].as_ref().unwrap_err().is_row_error());
        assert_eq!(items[2].as_ref().unwrap().id, AddressId::new(3));
    }

    #[tokio::test]
    async fn add_route_persists_record() {
        let (_dir, store, path) = open_temp();
        let record = RouteRecord {
            address_id: AddressId::new(5),
            stop_id: StopId::new(8),
            distance: 412.5,
            time: 300.0,
        };

        store.add_route(&record).await.unwrap();

        assert_eq!(read_routes(&path), vec![(5, 8, 412.5, 300.0)]);
        assert_eq!(store.route_count().await.unwrap(), 1);
    }

    /// Collects formatted log output in memory.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn store_logs_carry_span_fields() {
        let (_dir, store, path) = open_temp();
        seed(&path, "INSERT INTO stops VALUES (1, 0.0, 0.0);");

        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(logs.clone())
            .finish();

        let record = RouteRecord {
            address_id: AddressId::new(5),
            stop_id: StopId::new(8),
            distance: 412.5,
            time: 300.0,
        };
        async {
            store.all_stops().await.unwrap();
            store.add_route(&record).await.unwrap();
        }
        .with_subscriber(subscriber)
        .await;

        let output = logs.contents();
        let saved = output
            .lines()
            .find(|line| line.contains("saved route"))
            .unwrap();
        assert!(saved.contains("address=5"), "{saved}");
        assert!(saved.contains("stop=8"), "{saved}");
        assert!(output.contains("loaded stops"), "{output}");
    }

    #[tokio::test]
    async fn duplicate_route_is_an_error() {
        let (_dir, store, _path) = open_temp();
        let record = RouteRecord {
            address_id: AddressId::new(1),
            stop_id: StopId::new(1),
            distance: 1.0,
            time: 1.0,
        };

        store.add_route(&record).await.unwrap();
        let err = store.add_route(&record).await.unwrap_err();
        assert!(matches!(err, StoreError::Sqlite(_)));
        assert_eq!(store.route_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn pending_only_skips_addresses_with_routes() {
        let (_dir, store, path) = open_temp();
        seed(
            &path,
            "INSERT INTO addresses VALUES (1, 0.0, 0.0);
             INSERT INTO addresses VALUES (2, 0.0, 0.0);
             INSERT INTO addresses VALUES (3, 0.0, 0.0);
             INSERT INTO routes VALUES (2, 1, 10.0, 8.0);",
        );

        let ids: Vec<i64> = store
            .addresses(AddressQuery::default().pending_only(true))
            .map_ok(|a| a.id.get())
            .try_collect()
            .await
            .unwrap();
        assert_eq!(ids, vec![1, 3]);

        let all: Vec<Address> = store
            .addresses(AddressQuery::default())
            .try_collect()
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
    }
}
