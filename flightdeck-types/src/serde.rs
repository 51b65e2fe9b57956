use serde::{
    Deserialize,
    Deserializer,
};

/// `serde_json` writes non-finite floats as `null`, so we read them back as
/// `NaN`.
pub(crate) fn deserialize_value<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}
