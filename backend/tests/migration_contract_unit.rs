//! Static contract checks for the initial schema migration SQL.

use rstest::rstest;

const INITIAL_UP: &str = include_str!("../migrations/2025-11-14-000000_initial_schema/up.sql");
const INITIAL_DOWN: &str =
    include_str!("../migrations/2025-11-14-000000_initial_schema/down.sql");

#[rstest]
#[case("CREATE TYPE upload_status_enum AS ENUM ('uploading', 'parsing', 'ready', 'failed')")]
#[case("CREATE TYPE generation_status_enum AS ENUM ('queued', 'generating', 'complete', 'failed')")]
#[case("CREATE TYPE mindmap_status_enum AS ENUM ('queued', 'generating', 'complete', 'failed')")]
fn creates_status_enums(#[case] ddl: &str) {
    assert!(INITIAL_UP.contains(ddl), "expected migration to contain: {ddl}");
}

#[rstest]
#[case("CREATE TABLE IF NOT EXISTS users")]
#[case("CREATE TABLE IF NOT EXISTS documents")]
#[case("CREATE TABLE IF NOT EXISTS summaries")]
#[case("CREATE TABLE IF NOT EXISTS mindmaps")]
#[case("CREATE TABLE IF NOT EXISTS api_logs")]
fn creates_expected_tables(#[case] table_ddl: &str) {
    assert!(
        INITIAL_UP.contains(table_ddl),
        "expected migration to contain: {table_ddl}"
    );
}

#[rstest]
#[case("CONSTRAINT ck_document_max_size CHECK (file_size_bytes <= 104857600)")]
#[case("CONSTRAINT uq_user_document_hash UNIQUE (user_id, file_hash)")]
#[case("CONSTRAINT ck_apilog_operation CHECK (operation IN ('summarize', 'mindmap'))")]
#[case(
    "CONSTRAINT ck_apilog_status CHECK (status IN ('success', 'rate_limited', 'timeout', 'error'))"
)]
#[case("CONSTRAINT ck_apilog_cost_positive CHECK (cost_usd >= 0)")]
#[case("CONSTRAINT ck_apilog_latency_positive CHECK (latency_ms >= 0)")]
fn declares_integrity_constraints(#[case] constraint: &str) {
    // Literal checks; update alongside any reformatting of the DDL.
    assert!(
        INITIAL_UP.contains(constraint),
        "expected migration to contain constraint: {constraint}"
    );
}

#[rstest]
#[case("user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE")]
#[case("document_id INTEGER NOT NULL UNIQUE REFERENCES documents (id) ON DELETE CASCADE")]
#[case("document_id INTEGER REFERENCES documents (id) ON DELETE SET NULL")]
fn declares_foreign_key_behaviour(#[case] fragment: &str) {
    assert!(
        INITIAL_UP.contains(fragment),
        "expected migration to contain: {fragment}"
    );
}

#[rstest]
#[case("ix_users_email")]
#[case("ix_documents_user_id")]
#[case("ix_documents_upload_status")]
#[case("ix_documents_expires_at")]
#[case("ix_documents_user_created ON documents (user_id, created_at)")]
#[case("ix_summaries_document_id")]
#[case("ix_mindmaps_generation_status")]
#[case("ix_api_logs_created_at")]
fn creates_lookup_indexes(#[case] index_fragment: &str) {
    assert!(
        INITIAL_UP.contains(index_fragment),
        "expected migration to contain index fragment: {index_fragment}"
    );
}

#[rstest]
fn down_migration_drops_tables_before_types() {
    let tables = [
        "DROP TABLE IF EXISTS api_logs",
        "DROP TABLE IF EXISTS mindmaps",
        "DROP TABLE IF EXISTS summaries",
        "DROP TABLE IF EXISTS documents",
        "DROP TABLE IF EXISTS users",
    ];
    let positions: Vec<usize> = tables
        .iter()
        .map(|stmt| {
            INITIAL_DOWN
                .find(stmt)
                .unwrap_or_else(|| panic!("down migration should contain: {stmt}"))
        })
        .collect();
    assert!(
        positions.windows(2).all(|pair| pair[0] < pair[1]),
        "tables must be dropped children first"
    );

    let first_type = INITIAL_DOWN
        .find("DROP TYPE IF EXISTS")
        .expect("down migration drops enum types");
    assert!(positions.iter().all(|pos| *pos < first_type));
}
