//! SQL schema for the SQLite listing store.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per ingested snapshot. Rows are appended and only ever removed by
-- a full reset.
CREATE TABLE IF NOT EXISTS observations (
    id                    INTEGER PRIMARY KEY AUTOINCREMENT,
    property_id           INTEGER NOT NULL,
    address               TEXT    NOT NULL DEFAULT '',
    city                  TEXT    NOT NULL DEFAULT '',
    state                 TEXT    NOT NULL DEFAULT '',
    zipcode               TEXT    NOT NULL DEFAULT '',
    price                 REAL,             -- NULL = unknown, never 0
    bedrooms              INTEGER,
    bathrooms             REAL,
    squarefeet            REAL,
    price_per_square_feet REAL,             -- derived at insert
    observed_at           TEXT              -- 'YYYY-MM-DD HH:MM:SS' or NULL
);

CREATE INDEX IF NOT EXISTS observations_property_idx
    ON observations(property_id, observed_at);

PRAGMA user_version = 1;
";
