//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `migrations/` exactly. They are used by Diesel
//! for compile-time query validation and type-safe SQL generation.
//!
//! # Maintenance
//!
//! When migrations change the schema, regenerate this file with
//! `diesel print-schema` against a migrated database, then restore the doc
//! comments. The static contract tests in `tests/migration_contract_unit.rs`
//! flag drift in the SQL itself.

/// PostgreSQL enum types created by the initial migration.
pub mod sql_types {
    /// `upload_status_enum`: `uploading`, `parsing`, `ready`, `failed`.
    #[derive(diesel::query_builder::QueryId, Debug, Clone, Copy, diesel::sql_types::SqlType)]
    #[diesel(postgres_type(name = "upload_status_enum"))]
    pub struct UploadStatusEnum;

    /// `generation_status_enum`: `queued`, `generating`, `complete`, `failed`.
    #[derive(diesel::query_builder::QueryId, Debug, Clone, Copy, diesel::sql_types::SqlType)]
    #[diesel(postgres_type(name = "generation_status_enum"))]
    pub struct GenerationStatusEnum;

    /// `mindmap_status_enum`: same labels as `generation_status_enum`.
    #[derive(diesel::query_builder::QueryId, Debug, Clone, Copy, diesel::sql_types::SqlType)]
    #[diesel(postgres_type(name = "mindmap_status_enum"))]
    pub struct MindmapStatusEnum;
}

diesel::table! {
    /// Registered users. Soft-deleted rows keep `deleted_at` set.
    users (id) {
        /// Primary key.
        id -> Int4,
        /// Unique login address (max 255 characters).
        email -> Varchar,
        /// Display name (max 255 characters).
        name -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamp,
        /// Last modification timestamp.
        updated_at -> Timestamp,
        /// Soft-deletion marker.
        deleted_at -> Nullable<Timestamp>,
    }
}

diesel::table! {
    use diesel::sql_types::*;
    use super::sql_types::UploadStatusEnum;

    /// Uploaded PDF documents.
    ///
    /// `(user_id, file_hash)` is unique so a user cannot upload the same
    /// bytes twice. `file_size_bytes` is capped at 100 MiB by a check
    /// constraint.
    documents (id) {
        /// Primary key.
        id -> Int4,
        /// Owning user; rows cascade on user deletion.
        user_id -> Int4,
        /// Sanitised client filename.
        filename -> Varchar,
        /// Storage location of the uploaded bytes.
        file_path -> Text,
        /// Upload size in bytes.
        file_size_bytes -> Int4,
        /// Lowercase hex SHA-256 of the content.
        file_hash -> Varchar,
        /// Page count once parsed.
        page_count -> Nullable<Int4>,
        /// Plain text extracted from the PDF.
        extracted_text -> Nullable<Text>,
        /// Free-form document metadata.
        metadata -> Nullable<Jsonb>,
        /// Processing state.
        upload_status -> UploadStatusEnum,
        /// Failure reason when `upload_status` is `failed`.
        error_message -> Nullable<Text>,
        /// Record creation timestamp.
        created_at -> Timestamp,
        /// Last modification timestamp.
        updated_at -> Timestamp,
        /// Retention deadline.
        expires_at -> Timestamp,
    }
}

diesel::table! {
    use diesel::sql_types::*;
    use super::sql_types::GenerationStatusEnum;

    /// Generated summaries, at most one per document.
    summaries (id) {
        /// Primary key.
        id -> Int4,
        /// Summarised document (unique).
        document_id -> Int4,
        /// Generated summary text.
        summary_text -> Text,
        /// Generation state.
        generation_status -> GenerationStatusEnum,
        /// Failure reason.
        error_message -> Nullable<Text>,
        /// Prompt tokens consumed.
        tokens_input -> Int4,
        /// Completion tokens produced.
        tokens_output -> Int4,
        /// Upstream call latency in milliseconds.
        latency_ms -> Int4,
        /// Record creation timestamp.
        created_at -> Timestamp,
        /// Last modification timestamp.
        updated_at -> Timestamp,
    }
}

diesel::table! {
    use diesel::sql_types::*;
    use super::sql_types::MindmapStatusEnum;

    /// Generated mindmaps, at most one per document.
    mindmaps (id) {
        /// Primary key.
        id -> Int4,
        /// Source document (unique).
        document_id -> Int4,
        /// Hierarchy shaped as `{title, children: [...]}`.
        mindmap_json -> Jsonb,
        /// Generation state.
        generation_status -> MindmapStatusEnum,
        /// Failure reason.
        error_message -> Nullable<Text>,
        /// Prompt tokens consumed.
        tokens_input -> Int4,
        /// Completion tokens produced.
        tokens_output -> Int4,
        /// Upstream call latency in milliseconds.
        latency_ms -> Int4,
        /// Record creation timestamp.
        created_at -> Timestamp,
        /// Last modification timestamp.
        updated_at -> Timestamp,
    }
}

diesel::table! {
    /// Audit log of generative API calls.
    ///
    /// `operation` is `summarize` or `mindmap`; `status` is one of
    /// `success`, `rate_limited`, `timeout`, `error`. Rows outlive their
    /// document (`document_id` is nulled on delete).
    api_logs (id) {
        /// Primary key.
        id -> Int4,
        /// Related document, if still present.
        document_id -> Nullable<Int4>,
        /// Operation name.
        operation -> Varchar,
        /// Prompt tokens consumed.
        tokens_input -> Int4,
        /// Completion tokens produced.
        tokens_output -> Int4,
        /// Call cost in USD, `DECIMAL(10, 6)`.
        cost_usd -> Numeric,
        /// Call latency in milliseconds.
        latency_ms -> Int4,
        /// Call outcome.
        status -> Varchar,
        /// `ErrorKind` wire code on failure.
        error_code -> Nullable<Varchar>,
        /// Record creation timestamp.
        created_at -> Timestamp,
    }
}

diesel::joinable!(documents -> users (user_id));
diesel::joinable!(summaries -> documents (document_id));
diesel::joinable!(mindmaps -> documents (document_id));
diesel::joinable!(api_logs -> documents (document_id));

diesel::allow_tables_to_appear_in_same_query!(users, documents, summaries, mindmaps, api_logs);
