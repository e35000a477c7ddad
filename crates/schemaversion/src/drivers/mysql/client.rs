//! MySQL engine client using mysql_async.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use mysql_async::consts::ColumnType;
use mysql_async::prelude::*;
use mysql_async::{Column, Conn, Opts, OptsBuilder, Value};
use rust_decimal::Decimal;
use tracing::info;

use crate::config::{AdapterConfig, DriverKind};
use crate::core::traits::EngineClient;
use crate::core::value::{EngineResult, Field, Row, SqlValue};
use crate::drivers::common::SslMode;
use crate::drivers::not_connected;
use crate::error::{EngineError, Result};

/// A single MySQL connection, opened on [`connect`](EngineClient::connect).
pub struct MysqlClient {
    opts: Opts,
    conn: Option<Conn>,
}

impl MysqlClient {
    /// Prepare connection options. No I/O happens here.
    pub fn new(config: &AdapterConfig) -> Result<Self> {
        let ssl_mode = SslMode::parse(&config.ssl_mode)?;

        let builder = OptsBuilder::default()
            .ip_or_hostname(config.host.clone())
            .tcp_port(config.port.unwrap_or(DriverKind::Mysql.default_port()))
            .user(Some(config.username.clone()))
            .pass(Some(config.password.clone()))
            .db_name(Some(config.database.clone()))
            .ssl_opts(ssl_mode.mysql_ssl_opts());

        Ok(Self {
            opts: builder.into(),
            conn: None,
        })
    }
}

#[async_trait]
impl EngineClient for MysqlClient {
    async fn connect(&mut self) -> std::result::Result<(), EngineError> {
        let conn = Conn::new(self.opts.clone()).await?;
        info!(
            "Connected to MySQL: {}:{}/{}",
            self.opts.ip_or_hostname(),
            self.opts.tcp_port(),
            self.opts.db_name().unwrap_or_default()
        );
        self.conn = Some(conn);
        Ok(())
    }

    async fn query(&mut self, sql: &str) -> std::result::Result<EngineResult, EngineError> {
        let conn = self.conn.as_mut().ok_or_else(not_connected)?;

        let mut result = conn.query_iter(sql).await?;
        let mut rows = Vec::new();
        let mut fields = Vec::new();

        // A multi-statement script yields one result set per statement.
        while !result.is_empty() {
            if let Some(columns) = result.columns() {
                if fields.is_empty() {
                    fields = columns.iter().map(convert_field).collect();
                }
            }
            let set: Vec<mysql_async::Row> = result.collect().await?;
            rows.extend(set.into_iter().map(convert_row));
        }

        Ok(EngineResult {
            rows: Some(rows),
            fields: Some(fields),
        })
    }

    async fn close(&mut self) -> std::result::Result<(), EngineError> {
        if let Some(conn) = self.conn.take() {
            conn.disconnect().await?;
        }
        Ok(())
    }
}

fn convert_field(column: &Column) -> Field {
    Field::new(
        column.name_str().into_owned(),
        Some(format!("{:?}", column.column_type())),
    )
}

fn convert_row(row: mysql_async::Row) -> Row {
    let columns = row.columns();
    let values = row.unwrap();

    columns
        .iter()
        .zip(values)
        .map(|(column, value)| {
            (
                column.name_str().into_owned(),
                convert_value(column.column_type(), value),
            )
        })
        .collect()
}

/// Convert a mysql_async value.
///
/// The text protocol delivers everything but NULL as bytes, so the column
/// type decides how the bytes are read.
fn convert_value(column_type: ColumnType, value: Value) -> SqlValue {
    match value {
        Value::NULL => SqlValue::Null,
        Value::Int(v) => SqlValue::I64(v),
        Value::UInt(v) => i64::try_from(v)
            .map(SqlValue::I64)
            .unwrap_or(SqlValue::U64(v)),
        Value::Float(v) => SqlValue::F64(f64::from(v)),
        Value::Double(v) => SqlValue::F64(v),
        Value::Date(year, month, day, hour, minute, second, micros) => {
            NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
                .and_then(|date| {
                    date.and_hms_micro_opt(
                        u32::from(hour),
                        u32::from(minute),
                        u32::from(second),
                        micros,
                    )
                })
                .map(SqlValue::DateTime)
                // Zero dates (0000-00-00) have no chrono representation.
                .unwrap_or(SqlValue::Null)
        }
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let total_hours = days * 24 + u32::from(hours);
            SqlValue::Text(format!(
                "{}{:02}:{:02}:{:02}.{:06}",
                if negative { "-" } else { "" },
                total_hours,
                minutes,
                seconds,
                micros
            ))
        }
        Value::Bytes(bytes) => convert_text(column_type, bytes),
    }
}

fn convert_text(column_type: ColumnType, bytes: Vec<u8>) -> SqlValue {
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => return SqlValue::Bytes(e.into_bytes()),
    };

    match column_type {
        ColumnType::MYSQL_TYPE_TINY
        | ColumnType::MYSQL_TYPE_SHORT
        | ColumnType::MYSQL_TYPE_INT24
        | ColumnType::MYSQL_TYPE_LONG
        | ColumnType::MYSQL_TYPE_LONGLONG
        | ColumnType::MYSQL_TYPE_YEAR => {
            if let Ok(v) = text.parse::<i64>() {
                SqlValue::I64(v)
            } else if let Ok(v) = text.parse::<u64>() {
                SqlValue::U64(v)
            } else {
                SqlValue::Text(text)
            }
        }
        ColumnType::MYSQL_TYPE_FLOAT | ColumnType::MYSQL_TYPE_DOUBLE => text
            .parse::<f64>()
            .map(SqlValue::F64)
            .unwrap_or(SqlValue::Text(text)),
        ColumnType::MYSQL_TYPE_DECIMAL | ColumnType::MYSQL_TYPE_NEWDECIMAL => {
            match Decimal::from_str(&text) {
                Ok(d) => SqlValue::Decimal(d),
                Err(_) => SqlValue::Text(text),
            }
        }
        _ => SqlValue::Text(text),
    }
}
