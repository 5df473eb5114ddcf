//! Content fingerprints used to find cached comparison results

use crate::config::ComparisonConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::value::Value;
use blake3::Hasher;

/// A fingerprint represented as a hex string
pub type Fingerprint = String;

/// Fingerprint of a single dataset: schema then rows, in order
pub fn dataset_fingerprint(dataset: &Dataset) -> Fingerprint {
    let mut hasher = Hasher::new();
    update_dataset(&mut hasher, dataset);
    hasher.finalize().to_hex().to_string()
}

/// Fingerprint of a full comparison request. Identical inputs and
/// configuration always give the same fingerprint.
pub fn comparison_fingerprint(
    a: &Dataset,
    b: &Dataset,
    config: &ComparisonConfig,
) -> Result<Fingerprint> {
    let mut hasher = Hasher::new();
    hasher.update(crate::FORMAT_VERSION.as_bytes());
    hasher.update(b"|a|");
    update_dataset(&mut hasher, a);
    hasher.update(b"|b|");
    update_dataset(&mut hasher, b);
    hasher.update(b"|config|");
    hasher.update(&serde_json::to_vec(config)?);
    Ok(hasher.finalize().to_hex().to_string())
}

fn update_dataset(hasher: &mut Hasher, dataset: &Dataset) {
    hasher.update(&(dataset.column_count() as u64).to_le_bytes());
    for column in dataset.columns() {
        update_str(hasher, &column.name);
        update_str(hasher, &column.data_type.to_string());
        hasher.update(&[column.nullable as u8]);
    }

    hasher.update(&(dataset.row_count() as u64).to_le_bytes());
    for row in dataset.rows() {
        for value in row {
            update_value(hasher, value);
        }
    }
}

fn update_value(hasher: &mut Hasher, value: &Value) {
    match value {
        Value::Null => {
            hasher.update(&[0]);
        }
        Value::Integer(i) => {
            hasher.update(&[1]);
            hasher.update(&i.to_le_bytes());
        }
        Value::Float(f) => {
            hasher.update(&[2]);
            hasher.update(&f.to_bits().to_le_bytes());
        }
        Value::String(s) => {
            hasher.update(&[3]);
            update_str(hasher, s);
        }
        Value::Boolean(b) => {
            hasher.update(&[4, *b as u8]);
        }
        Value::DateTime(dt) => {
            hasher.update(&[5]);
            let utc = dt.and_utc();
            hasher.update(&utc.timestamp().to_le_bytes());
            hasher.update(&utc.timestamp_subsec_nanos().to_le_bytes());
        }
    }
}

fn update_str(hasher: &mut Hasher, s: &str) {
    hasher.update(&(s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}
