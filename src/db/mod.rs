use std::str::FromStr;

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

pub mod appraisals;
pub mod cycles;
pub mod evaluations;
pub mod groups;
pub mod notify;
pub mod org;
pub mod people;
pub mod seed;
pub mod templates;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Decode a TEXT column into one of the closed status enums. Rows are
/// written through the same enums, so a decode failure means the table was
/// edited out-of-band.
pub(crate) fn parse_text<T>(row: &PgRow, col: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.try_get(col)?;
    raw.parse::<T>().map_err(|err| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(err),
    })
}

pub(crate) fn parse_text_opt<T>(row: &PgRow, col: &str) -> Result<Option<T>, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: Option<String> = row.try_get(col)?;
    raw.map(|value| {
        value.parse::<T>().map_err(|err| sqlx::Error::ColumnDecode {
            index: col.to_string(),
            source: Box::new(err),
        })
    })
    .transpose()
}
