//! Shared fixtures for tests: an in-memory store with migrations applied, or
//! a throwaway on-disk store when a test needs several connections at once.

use std::path::PathBuf;

use chrono::Utc;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::{
    appointments::{self, NewAppointment},
    auth::new_id,
    models::{AppointmentRow, ROLE_CUSTOMER, ROLE_VENDOR},
    notifier::Notifier,
    queue::{QueueService, Requester, DEFAULT_AVG_SERVICE_MINUTES},
    salons,
    state::{AppState, QueueSettings},
};

/// Single connection so every query sees the same in-memory database.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory sqlite");
    crate::db::run_migrations(&pool).await.expect("migrations");
    pool
}

/// WAL database file under the temp dir, removed with its side files on drop.
pub struct TempDatabase {
    path: PathBuf,
}

impl TempDatabase {
    fn new() -> Self {
        Self {
            path: std::env::temp_dir().join(format!("salon-queue-{}.db", new_id())),
        }
    }

    fn url(&self) -> String {
        format!("sqlite://{}", self.path.display())
    }
}

impl Drop for TempDatabase {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.path.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

pub struct Fixture {
    pub db: SqlitePool,
    pub events: Notifier,
    pub settings: QueueSettings,
    pub vendor: Requester,
    pub salon_id: String,
    _file: Option<TempDatabase>,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_pool(memory_pool().await, None).await
    }

    /// Backed by a multi-connection WAL pool, so queries really run concurrently.
    pub async fn on_disk() -> Self {
        let file = TempDatabase::new();
        let db = crate::db::connect(&file.url()).await.expect("open sqlite file");
        crate::db::run_migrations(&db).await.expect("migrations");
        Self::with_pool(db, Some(file)).await
    }

    async fn with_pool(db: SqlitePool, file: Option<TempDatabase>) -> Self {
        let vendor_id = insert_user(&db, "vendor", ROLE_VENDOR).await;
        let salon = salons::create(&db, "Fixture Salon", &vendor_id, None, None)
            .await
            .expect("salon");
        Self {
            db,
            events: Notifier::new(16),
            settings: QueueSettings {
                avg_service_minutes: DEFAULT_AVG_SERVICE_MINUTES,
            },
            vendor: Requester::new(vendor_id, ROLE_VENDOR),
            salon_id: salon.id,
            _file: file,
        }
    }

    pub fn service(&self) -> QueueService<'_> {
        QueueService::new(&self.db, &self.events, self.settings)
    }

    pub fn state(&self) -> AppState {
        AppState {
            db: self.db.clone(),
            events: self.events.clone(),
            queue: self.settings,
        }
    }

    pub async fn customer(&self, name: &str) -> Requester {
        Requester::new(insert_user(&self.db, name, ROLE_CUSTOMER).await, ROLE_CUSTOMER)
    }

    pub async fn vendor(&self, name: &str) -> Requester {
        Requester::new(insert_user(&self.db, name, ROLE_VENDOR).await, ROLE_VENDOR)
    }

    pub async fn salon(&self, name: &str) -> String {
        salons::create(&self.db, name, &self.vendor.user_id, None, None)
            .await
            .expect("salon")
            .id
    }

    pub async fn appointment(&self, customer: &Requester, salon_id: &str) -> String {
        appointments::create(
            &self.db,
            NewAppointment {
                user_id: &customer.user_id,
                salon_id,
                service: "Haircut",
                stylist: None,
                start_time: "2030-01-01T09:00:00+00:00",
            },
        )
        .await
        .expect("appointment")
        .id
    }

    pub async fn find_appointment(&self, id: &str) -> AppointmentRow {
        appointments::find(&self.db, id)
            .await
            .expect("query")
            .expect("appointment exists")
    }

    pub async fn count_entries(&self, salon_id: &str) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM queue_entries WHERE salon_id = ?")
            .bind(salon_id)
            .fetch_one(&self.db)
            .await
            .expect("count")
    }
}

/// Users that never log in skip password hashing.
async fn insert_user(db: &SqlitePool, name: &str, role: &str) -> String {
    let id = new_id();
    sqlx::query(
        r#"INSERT INTO users (id, username, display_name, role, password_hash, active, created_at)
           VALUES (?, ?, ?, ?, '!', 1, ?)"#,
    )
    .bind(&id)
    .bind(name)
    .bind(name)
    .bind(role)
    .bind(Utc::now().to_rfc3339())
    .execute(db)
    .await
    .expect("insert user");
    id
}
