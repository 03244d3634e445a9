use duckdb::Connection;
use log::debug;

use crate::csv_load::config::{LoaderConfig, RunMode};
use crate::csv_load::demo_strategy::DemoStrategy;
use crate::csv_load::error::LoaderError;
use crate::csv_load::load_strategy::LoadStrategy;
use crate::csv_load::production_strategy::ProductionStrategy;

// Fixed input files, resolved against the working directory
pub const BRAND_CSV: &str = "brand-detail-url-etc_0_0_0.csv";
pub const SPEND_CSV: &str = "2021-01-19--data_01be88c2-0306-48b3-0042-fa0703282ad6_1304_5_0.csv";

// Alias the destination database is attached under
const PG_DB: &str = "spend_db";
const PG_SCHEMA: &str = "public";

pub const BRAND_TABLE: &str = "BrandDetail";
pub const SPEND_TABLE: &str = "DailySpend";

// Local staging tables holding the normalized CSV rows
pub const BRAND_STAGE: &str = "brand_stage";
pub const SPEND_STAGE: &str = "spend_stage";

// Demo runs load the first 50 rows per table; production inserts the child
// rows in committed chunks of 1000
pub const DEMO_ROW_LIMIT: usize = 50;
pub const SPEND_CHUNK_SIZE: usize = 1000;

pub const BRAND_COLUMNS: [&str; 7] = [
    "BRAND_ID",
    "BRAND_NAME",
    "BRAND_TYPE",
    "BRAND_URL_ADDR",
    "INDUSTRY_NAME",
    "SUBINDUSTRY_ID",
    "SUBINDUSTRY_NAME",
];

pub const SPEND_COLUMNS: [&str; 8] = [
    "ID",
    "BRAND_ID",
    "BRAND_NAME",
    "SPEND_AMOUNT",
    "STATE_ABBR",
    "TRANS_COUNT",
    "TRANS_DATE",
    "VERSION",
];

/// Conditional DDL for the parent table. Safe to run on every load.
pub const BRAND_DETAIL_DDL: &str = r#"CREATE TABLE IF NOT EXISTS "BrandDetail" (
    "BRAND_ID" INTEGER PRIMARY KEY,
    "BRAND_NAME" VARCHAR(255),
    "BRAND_TYPE" VARCHAR(100),
    "BRAND_URL_ADDR" VARCHAR(500),
    "INDUSTRY_NAME" VARCHAR(255),
    "SUBINDUSTRY_ID" INTEGER,
    "SUBINDUSTRY_NAME" VARCHAR(255)
)"#;

/// Conditional DDL for the child table, with the foreign key back to
/// BrandDetail enforced at the destination.
pub const DAILY_SPEND_DDL: &str = r#"CREATE TABLE IF NOT EXISTS "DailySpend" (
    "ID" INTEGER GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
    "BRAND_ID" INTEGER REFERENCES "BrandDetail" ("BRAND_ID"),
    "BRAND_NAME" VARCHAR(255),
    "SPEND_AMOUNT" DECIMAL(18,2),
    "STATE_ABBR" VARCHAR(10),
    "TRANS_COUNT" DECIMAL(18,2),
    "TRANS_DATE" DATE,
    "VERSION" DATE
)"#;

/// Clear statements in dependency order: children before the parent they
/// reference, since the foreign key forbids deleting a referenced brand
/// while spend rows exist.
pub const CLEAR_STATEMENTS: [&str; 2] = [
    r#"DELETE FROM "DailySpend""#,
    r#"DELETE FROM "BrandDetail""#,
];

// Escape a string for use inside a single-quoted SQL literal
fn quote_sql_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Build the staging statement for the brand CSV. Columns are projected by
/// name so a reordered CSV still lands in the right destination columns, and
/// missing text values are normalized to the empty string. `seq` captures the
/// file order of the rows.
pub fn build_brand_stage_sql(csv_path: &str, limit: Option<usize>) -> String {
    let limit_clause = limit
        .map(|n| format!(" LIMIT {}", n))
        .unwrap_or_default();

    format!(
        "CREATE TABLE {stage} AS \
         SELECT row_number() OVER () AS seq, * FROM ( \
             SELECT \
                 CAST(nullif(\"BRAND_ID\", '') AS INTEGER) AS brand_id, \
                 coalesce(\"BRAND_NAME\", '') AS brand_name, \
                 coalesce(\"BRAND_TYPE\", '') AS brand_type, \
                 coalesce(\"BRAND_URL_ADDR\", '') AS brand_url_addr, \
                 coalesce(\"INDUSTRY_NAME\", '') AS industry_name, \
                 CAST(nullif(\"SUBINDUSTRY_ID\", '') AS INTEGER) AS subindustry_id, \
                 coalesce(\"SUBINDUSTRY_NAME\", '') AS subindustry_name \
             FROM read_csv('{path}', header = true, all_varchar = true){limit} \
         );",
        stage = BRAND_STAGE,
        path = quote_sql_literal(csv_path),
        limit = limit_clause,
    )
}

/// Build the staging statement for the spend CSV. Missing numeric values are
/// normalized to zero and the two date columns are coerced from their textual
/// representation to plain dates. When `filter_to_staged_brands` is set, rows
/// whose brand is not in the brand stage are dropped before any truncation,
/// so the first N surviving rows in file order are kept.
pub fn build_spend_stage_sql(
    csv_path: &str,
    filter_to_staged_brands: bool,
    limit: Option<usize>,
) -> String {
    let filter_clause = if filter_to_staged_brands {
        format!(
            " WHERE brand_id IN (SELECT brand_id FROM {})",
            BRAND_STAGE
        )
    } else {
        String::new()
    };
    let limit_clause = limit
        .map(|n| format!(" LIMIT {}", n))
        .unwrap_or_default();

    format!(
        "CREATE TABLE {stage} AS \
         SELECT row_number() OVER () AS seq, * FROM ( \
             SELECT * FROM ( \
                 SELECT \
                     CAST(nullif(\"BRAND_ID\", '') AS INTEGER) AS brand_id, \
                     coalesce(\"BRAND_NAME\", '') AS brand_name, \
                     coalesce(CAST(nullif(\"SPEND_AMOUNT\", '') AS DECIMAL(18,2)), 0) AS spend_amount, \
                     coalesce(\"STATE_ABBR\", '') AS state_abbr, \
                     coalesce(CAST(nullif(\"TRANS_COUNT\", '') AS DECIMAL(18,2)), 0) AS trans_count, \
                     CAST(CAST(nullif(\"TRANS_DATE\", '') AS TIMESTAMP) AS DATE) AS trans_date, \
                     CAST(CAST(nullif(\"VERSION\", '') AS TIMESTAMP) AS DATE) AS version \
                 FROM read_csv('{path}', header = true, all_varchar = true) \
             ){filter}{limit} \
         );",
        stage = SPEND_STAGE,
        path = quote_sql_literal(csv_path),
        filter = filter_clause,
        limit = limit_clause,
    )
}

/// Insert all staged brand rows into the destination in one statement, with
/// explicit column lists on both sides.
pub fn build_brand_insert_sql(qualified_table: &str) -> String {
    format!(
        "INSERT INTO {table} \
         (\"BRAND_ID\", \"BRAND_NAME\", \"BRAND_TYPE\", \"BRAND_URL_ADDR\", \
          \"INDUSTRY_NAME\", \"SUBINDUSTRY_ID\", \"SUBINDUSTRY_NAME\") \
         SELECT brand_id, brand_name, brand_type, brand_url_addr, \
                industry_name, subindustry_id, subindustry_name \
         FROM {stage} ORDER BY seq;",
        table = qualified_table,
        stage = BRAND_STAGE,
    )
}

/// Insert staged spend rows into the destination. `range` is a half-open
/// `(lo, hi]` slice of the `seq` column; `None` inserts the whole stage in
/// one statement.
pub fn build_spend_insert_sql(qualified_table: &str, range: Option<(usize, usize)>) -> String {
    let range_clause = range
        .map(|(lo, hi)| format!(" WHERE seq > {} AND seq <= {}", lo, hi))
        .unwrap_or_default();

    format!(
        "INSERT INTO {table} \
         (\"BRAND_ID\", \"BRAND_NAME\", \"SPEND_AMOUNT\", \"STATE_ABBR\", \
          \"TRANS_COUNT\", \"TRANS_DATE\", \"VERSION\") \
         SELECT brand_id, brand_name, spend_amount, state_abbr, \
                trans_count, trans_date, version \
         FROM {stage}{range} ORDER BY seq;",
        table = qualified_table,
        stage = SPEND_STAGE,
        range = range_clause,
    )
}

/// Half-open `(lo, hi]` seq ranges covering `total` rows in steps of
/// `chunk_size`. Produces `ceil(total / chunk_size)` ranges.
pub fn chunk_ranges(total: usize, chunk_size: usize) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    if chunk_size == 0 {
        return ranges;
    }
    let mut lo = 0;
    while lo < total {
        let hi = (lo + chunk_size).min(total);
        ranges.push((lo, hi));
        lo = hi;
    }
    ranges
}

/// Row counts reported back to the caller after a completed run.
#[derive(Debug, Clone, Copy)]
pub struct LoadReport {
    pub brand_rows: i64,
    pub spend_rows: i64,
    pub spend_chunks: usize,
}

// Owns the DuckDB connection for the whole run.
// Handles the postgres attach, destination DDL/DML via postgres_execute, and
// the local staging tables built from the CSVs. Strategies drive it.
pub struct CoreLoader {
    conn: Connection,
}

impl CoreLoader {
    // Open the staging engine and attach the destination
    fn connect(config: &LoaderConfig) -> Result<Self, LoaderError> {
        let conn = Connection::open_in_memory().map_err(LoaderError::Connect)?;

        conn.execute("INSTALL postgres;", [])
            .map_err(LoaderError::Connect)?;
        conn.execute("LOAD postgres;", [])
            .map_err(LoaderError::Connect)?;

        conn.execute(
            &format!(
                "ATTACH '{}' AS {} (TYPE POSTGRES)",
                quote_sql_literal(&config.postgres_conn_string()),
                PG_DB
            ),
            [],
        )
        .map_err(LoaderError::Connect)?;

        Ok(Self { conn })
    }

    // Destination table as seen from the attached catalog
    pub fn qualified_table(&self, table: &str) -> String {
        format!("{}.{}.\"{}\"", PG_DB, PG_SCHEMA, table)
    }

    // Run a statement on the destination side through the postgres extension
    fn postgres_execute(&self, sql: &str) -> Result<(), duckdb::Error> {
        debug!("postgres_execute: {}", sql);
        self.conn.execute(
            &format!(
                "CALL postgres_execute('{}', '{}');",
                PG_DB,
                quote_sql_literal(sql)
            ),
            [],
        )?;
        Ok(())
    }

    /// Create both destination tables if they are not already present.
    /// The DDL is conditional, so a second run is a no-op.
    pub fn ensure_schema(&self) -> Result<(), LoaderError> {
        self.postgres_execute(BRAND_DETAIL_DDL)
            .map_err(LoaderError::Schema)?;
        self.postgres_execute(DAILY_SPEND_DDL)
            .map_err(LoaderError::Schema)?;
        Ok(())
    }

    /// Delete all rows from both destination tables, in the order of
    /// [`CLEAR_STATEMENTS`].
    pub fn clear_existing_data(&self) -> Result<(), LoaderError> {
        for sql in CLEAR_STATEMENTS {
            self.postgres_execute(sql)
                .map_err(LoaderError::data("clearing existing rows"))?;
        }
        Ok(())
    }

    /// Stage the brand CSV locally and return the staged row count.
    pub fn stage_brand_csv(
        &self,
        csv_path: &str,
        limit: Option<usize>,
    ) -> Result<i64, LoaderError> {
        let sql = build_brand_stage_sql(csv_path, limit);
        debug!("staging brands: {}", sql);
        self.conn
            .execute(&sql, [])
            .map_err(LoaderError::data("staging the BrandDetail CSV"))?;
        self.count_rows(BRAND_STAGE)
            .map_err(LoaderError::data("counting staged BrandDetail rows"))
    }

    /// Stage the spend CSV locally and return the staged row count.
    pub fn stage_spend_csv(
        &self,
        csv_path: &str,
        filter_to_staged_brands: bool,
        limit: Option<usize>,
    ) -> Result<i64, LoaderError> {
        let sql = build_spend_stage_sql(csv_path, filter_to_staged_brands, limit);
        debug!("staging spend: {}", sql);
        self.conn
            .execute(&sql, [])
            .map_err(LoaderError::data("staging the DailySpend CSV"))?;
        self.count_rows(SPEND_STAGE)
            .map_err(LoaderError::data("counting staged DailySpend rows"))
    }

    /// Push every staged brand row into the destination in one insert.
    pub fn insert_staged_brands(&self) -> Result<(), LoaderError> {
        let sql = build_brand_insert_sql(&self.qualified_table(BRAND_TABLE));
        debug!("inserting brands: {}", sql);
        self.conn
            .execute(&sql, [])
            .map_err(LoaderError::data("inserting BrandDetail rows"))?;
        Ok(())
    }

    /// Push staged spend rows into the destination. Each call is one
    /// statement and commits independently.
    pub fn insert_staged_spend(&self, range: Option<(usize, usize)>) -> Result<(), LoaderError> {
        let sql = build_spend_insert_sql(&self.qualified_table(SPEND_TABLE), range);
        debug!("inserting spend: {}", sql);
        self.conn
            .execute(&sql, [])
            .map_err(LoaderError::data("inserting DailySpend rows"))?;
        Ok(())
    }

    /// Count the rows a destination table holds right now.
    pub fn count_destination_rows(&self, table: &str) -> Result<i64, LoaderError> {
        self.count_rows(&self.qualified_table(table))
            .map_err(LoaderError::data("verifying destination row counts"))
    }

    fn count_rows(&self, target: &str) -> Result<i64, duckdb::Error> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT COUNT(*) FROM {}", target))?;
        let mut rows = stmt.query([])?;
        if let Some(row) = rows.next()? {
            row.get(0)
        } else {
            Ok(0)
        }
    }

    /// Print up to `n` rows from a destination table, all columns rendered
    /// as text. Display only, not part of any contract.
    pub fn print_sample_rows(
        &self,
        table: &str,
        columns: &[&str],
        n: usize,
    ) -> Result<(), LoaderError> {
        let projection = columns
            .iter()
            .map(|column| format!("CAST(\"{}\" AS VARCHAR)", column))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {} FROM {} LIMIT {}",
            projection,
            self.qualified_table(table),
            n
        );

        let run = || -> Result<(), duckdb::Error> {
            let mut stmt = self.conn.prepare(&sql)?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let mut values = Vec::with_capacity(columns.len());
                for i in 0..columns.len() {
                    let value: Option<String> = row.get(i)?;
                    values.push(value.unwrap_or_default());
                }
                println!("   {}", values.join(" | "));
            }
            Ok(())
        };
        run().map_err(LoaderError::data("sampling destination rows"))
    }
}

/// Run a full load against the destination described by `config`.
/// The connection is dropped, and with it closed, on every exit path.
pub fn run_load(config: &LoaderConfig, mode: RunMode) -> Result<LoadReport, LoaderError> {
    println!("Connecting to the destination database...");
    let core = CoreLoader::connect(config)?;
    println!("Connected.");

    let strategy: Box<dyn LoadStrategy> = match mode {
        RunMode::Demo => Box::new(DemoStrategy::new(DEMO_ROW_LIMIT)),
        RunMode::Production => Box::new(ProductionStrategy::new(SPEND_CHUNK_SIZE)),
    };

    strategy.load_into_postgres(&core)
}
