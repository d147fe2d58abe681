// src/schema.rs

use google_cloud_bigquery::http::job::{CreateDisposition, JobConfigurationLoad, WriteDisposition};
use google_cloud_bigquery::http::table::{
    SourceFormat, TableFieldMode, TableFieldSchema, TableFieldType, TableSchema,
    TimePartitionType, TimePartitioning,
};

use crate::config::LoaderConfig;

/// Column the destination table is partitioned on, by day.
pub const PARTITION_FIELD: &str = "fee_date";

/// Declared columns of the fees table, in CSV order. All are REQUIRED.
pub const COLUMNS: [(&str, TableFieldType); 5] = [
    ("client_id", TableFieldType::String),
    ("client_nino", TableFieldType::String),
    ("adviser_id", TableFieldType::String),
    ("fee_date", TableFieldType::Date),
    ("fee_amount", TableFieldType::Float64),
];

/// Header rows skipped at the top of every source file.
pub const HEADER_ROWS: i64 = 1;

pub fn fees_schema() -> TableSchema {
    TableSchema {
        fields: COLUMNS
            .iter()
            .map(|(name, data_type)| TableFieldSchema {
                name: name.to_string(),
                data_type: data_type.clone(),
                mode: Some(TableFieldMode::Required),
                ..Default::default()
            })
            .collect(),
    }
}

pub fn fees_partitioning() -> TimePartitioning {
    TimePartitioning {
        partition_type: TimePartitionType::Day,
        expiration_ms: None,
        field: Some(PARTITION_FIELD.to_string()),
    }
}

/// Build the truncate-and-reload job for the configured bucket and destination.
///
/// The schema is declared, never inferred. Jagged rows fail the job instead of
/// being padded, and quoted newlines inside fields are accepted.
pub fn load_configuration(config: &LoaderConfig) -> JobConfigurationLoad {
    JobConfigurationLoad {
        source_uris: vec![config.source_uri()],
        schema: Some(fees_schema()),
        destination_table: (&config.table_ref()).into(),
        create_disposition: Some(CreateDisposition::CreateIfNeeded),
        write_disposition: Some(WriteDisposition::WriteTruncate),
        skip_leading_rows: Some(HEADER_ROWS),
        allow_quoted_newlines: Some(true),
        source_format: Some(SourceFormat::Csv),
        allow_jagged_rows: Some(false),
        autodetect: Some(false),
        time_partitioning: Some(fees_partitioning()),
        ..Default::default()
    }
}

/// One-line description of a table's partitioning, e.g. `DAY on fee_date`.
pub fn describe_partitioning(partitioning: Option<&TimePartitioning>) -> String {
    match partitioning {
        None => "none".to_string(),
        Some(p) => {
            let unit = match p.partition_type {
                TimePartitionType::Hour => "HOUR",
                TimePartitionType::Day => "DAY",
                TimePartitionType::Month => "MONTH",
                TimePartitionType::Year => "YEAR",
            };
            match &p.field {
                Some(field) => format!("{unit} on {field}"),
                None => format!("{unit} on ingestion time"),
            }
        }
    }
}
