//! Render PostgreSQL cells to text.

use postgres::Row;

/// Render cell `idx` of `row`. SQL NULL is `None`.
///
/// Types without a dedicated arm are read as text; a query returning such a
/// column fails with a type error and should cast it (`col::text`).
pub(super) fn cell_text(row: &Row, idx: usize) -> Result<Option<String>, postgres::Error> {
    let type_name = row.columns()[idx].type_().name().to_string();

    let text = match type_name.as_str() {
        "bool" => row
            .try_get::<_, Option<bool>>(idx)?
            .map(|v| v.to_string()),
        "int2" => row.try_get::<_, Option<i16>>(idx)?.map(|v| v.to_string()),
        "int4" => row.try_get::<_, Option<i32>>(idx)?.map(|v| v.to_string()),
        "int8" => row.try_get::<_, Option<i64>>(idx)?.map(|v| v.to_string()),
        "oid" => row.try_get::<_, Option<u32>>(idx)?.map(|v| v.to_string()),
        "float4" => row.try_get::<_, Option<f32>>(idx)?.map(|v| v.to_string()),
        "float8" => row.try_get::<_, Option<f64>>(idx)?.map(|v| v.to_string()),
        "numeric" => row
            .try_get::<_, Option<rust_decimal::Decimal>>(idx)?
            .map(|v| v.to_string()),
        "uuid" => row
            .try_get::<_, Option<uuid::Uuid>>(idx)?
            .map(|v| v.to_string()),
        "timestamp" => row
            .try_get::<_, Option<chrono::NaiveDateTime>>(idx)?
            .map(|v| v.to_string()),
        "timestamptz" => row
            .try_get::<_, Option<chrono::DateTime<chrono::FixedOffset>>>(idx)?
            .map(|v| v.to_rfc3339()),
        "date" => row
            .try_get::<_, Option<chrono::NaiveDate>>(idx)?
            .map(|v| v.to_string()),
        "time" => row
            .try_get::<_, Option<chrono::NaiveTime>>(idx)?
            .map(|v| v.to_string()),
        "bytea" => row
            .try_get::<_, Option<Vec<u8>>>(idx)?
            .map(hex::encode),
        "json" | "jsonb" => row
            .try_get::<_, Option<serde_json::Value>>(idx)?
            .map(|v| v.to_string()),
        _ => row.try_get::<_, Option<String>>(idx)?,
    };

    Ok(text)
}
