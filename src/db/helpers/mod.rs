use anyhow::{anyhow, Context, Result};

pub fn encode_calibration_params(params: &[f64; 3]) -> Result<String> {
    serde_json::to_string(params).context("failed to serialize calibration params")
}

pub fn decode_calibration_params(value: &str) -> Result<[f64; 3]> {
    let params: Vec<f64> = serde_json::from_str(value)
        .with_context(|| format!("failed to parse calibration params '{value}'"))?;
    <[f64; 3]>::try_from(params.as_slice())
        .map_err(|_| anyhow!("calibration params must have 3 entries, got {}", params.len()))
}

/// Wraps an `anyhow` error so it can be returned from a rusqlite row mapper.
pub fn conversion_error(err: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            err.to_string(),
        )),
    )
}
