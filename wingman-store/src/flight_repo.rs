use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;
use wingman_core::flight::{FlightKey, FlightRecord, NewFlight};
use wingman_core::repository::{FlightRepository, RepoResult};

pub struct PostgresFlightRepository {
    pool: PgPool,
}

impl PostgresFlightRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct FlightRow {
    id: i64,
    user_id: i64,
    carrier_code: String,
    flight_number: String,
    departure_date: DateTime<Utc>,
    departure_location: String,
    arrival_date: DateTime<Utc>,
    arrival_location: String,
    cabin_class: String,
    emissions: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<FlightRow> for FlightRecord {
    fn from(row: FlightRow) -> Self {
        FlightRecord {
            id: row.id,
            user_id: row.user_id,
            carrier_code: row.carrier_code,
            flight_number: row.flight_number,
            departure_date: row.departure_date,
            departure_location: row.departure_location,
            arrival_date: row.arrival_date,
            arrival_location: row.arrival_location,
            cabin_class: row.cabin_class,
            emissions: row.emissions,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const FLIGHT_COLUMNS: &str = "id, user_id, carrier_code, flight_number, departure_date, departure_location, \
    arrival_date, arrival_location, cabin_class, emissions, created_at, updated_at";

#[async_trait]
impl FlightRepository for PostgresFlightRepository {
    async fn list_for_user(&self, user_id: i64) -> RepoResult<Vec<FlightRecord>> {
        let sql = format!(
            "SELECT {} FROM flights WHERE user_id = $1 ORDER BY departure_date, id",
            FLIGHT_COLUMNS
        );
        let rows = sqlx::query_as::<_, FlightRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(FlightRecord::from).collect())
    }

    async fn insert(&self, user_id: i64, flight: &NewFlight) -> RepoResult<FlightRecord> {
        let sql = format!(
            r#"
            INSERT INTO flights (user_id, carrier_code, flight_number, departure_date, departure_location,
                                 arrival_date, arrival_location, cabin_class, emissions)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            FLIGHT_COLUMNS
        );
        let row = sqlx::query_as::<_, FlightRow>(&sql)
            .bind(user_id)
            .bind(&flight.carrier_code)
            .bind(&flight.flight_number)
            .bind(flight.departure_date)
            .bind(&flight.departure_location)
            .bind(flight.arrival_date)
            .bind(&flight.arrival_location)
            .bind(&flight.cabin_class)
            .bind(flight.emissions)
            .fetch_one(&self.pool)
            .await?;

        info!("Flight {} {} saved for user {}", row.carrier_code, row.flight_number, user_id);
        Ok(row.into())
    }

    async fn delete_matching(&self, key: &FlightKey) -> RepoResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM flights
            WHERE user_id = $1
              AND flight_number = $2
              AND carrier_code = $3
              AND departure_date = $4
              AND arrival_date = $5
            "#,
        )
        .bind(key.user_id)
        .bind(&key.flight_number)
        .bind(&key.carrier_code)
        .bind(key.departure_date)
        .bind(key.arrival_date)
        .execute(&self.pool)
        .await?;

        info!("Deleted {} flight rows for user {}", result.rows_affected(), key.user_id);
        Ok(result.rows_affected())
    }
}
