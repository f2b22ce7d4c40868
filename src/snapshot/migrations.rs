pub const BASE_MIGRATION: &str = r#"
CREATE TABLE IF NOT EXISTS prior_readings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_name TEXT,
    api_code TEXT NOT NULL,
    spread REAL,
    percent_bid REAL,
    fixed_ask REAL,
    percent_ask REAL,
    fixed_bid REAL,
    match_score REAL NOT NULL,
    is_troublesome INTEGER NOT NULL,
    trouble_reasons TEXT NOT NULL DEFAULT '',
    percent_fixed_mix TEXT,
    updated_at TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_prior_readings_api_code
    ON prior_readings(api_code);
"#;
