//! Locating and decoding the raw QC report of a run.

use std::io::Read;

use flate2::read::GzDecoder;
use serde_json::Value;
use tracing::debug;

use crate::capability::{CapabilityError, ObjectStore, with_timeout};
use crate::config::EngineConfig;
use crate::error::ReportError;

pub const GZIP_SUFFIX: &str = ".gz";

/// Fetches `multiqc_data.json` for `run_id`, falling back to a gzipped
/// sibling when the plain object is absent.
pub async fn load_report(
    store: &dyn ObjectStore,
    config: &EngineConfig,
    run_id: &str,
) -> Result<Value, ReportError> {
    let bucket = config.reports_bucket.as_str();
    let key = config.report_key(run_id);
    let limit = config.request_timeout();

    match with_timeout("report fetch", limit, store.get(bucket, &key)).await {
        Ok(bytes) => decode_report(&key, &bytes),
        Err(err) if err.is_not_found() => {
            let gz_key = format!("{key}{GZIP_SUFFIX}");
            let bytes = with_timeout("report fetch", limit, store.get(bucket, &gz_key))
                .await
                .map_err(|err| missing_or_capability(err, bucket, &key))?;
            debug!(key = %gz_key, bytes = bytes.len(), "using gzipped report");
            let plain = gunzip(&gz_key, &bytes)?;
            decode_report(&gz_key, &plain)
        }
        Err(err) => Err(ReportError::Capability(err)),
    }
}

fn missing_or_capability(err: CapabilityError, bucket: &str, key: &str) -> ReportError {
    if err.is_not_found() {
        ReportError::Missing {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    } else {
        ReportError::Capability(err)
    }
}

pub fn gunzip(key: &str, bytes: &[u8]) -> Result<Vec<u8>, ReportError> {
    let mut out = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut out)
        .map_err(|source| ReportError::Gzip {
            key: key.to_string(),
            source,
        })?;
    Ok(out)
}

/// Parses report bytes. Blank input and anything other than a non-empty
/// JSON object count as an unavailable report.
pub fn decode_report(key: &str, bytes: &[u8]) -> Result<Value, ReportError> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(ReportError::Empty {
            key: key.to_string(),
        });
    }
    let doc: Value = serde_json::from_slice(bytes).map_err(|source| ReportError::Json {
        key: key.to_string(),
        source,
    })?;
    match doc.as_object() {
        Some(map) if !map.is_empty() => Ok(doc),
        _ => Err(ReportError::NotObject {
            key: key.to_string(),
        }),
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/tests.rs"]
mod tests;
