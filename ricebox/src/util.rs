use std::time::{Duration, SystemTime};

use crate::error::{Error, Result};

pub fn format_size(bytes: u64) -> String {
    use humansize::{FormatSize, BINARY};
    bytes.format_size(BINARY)
}

pub fn format_time(time: SystemTime) -> String {
    let datetime: chrono::DateTime<chrono::Utc> = time.into();
    datetime.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// The creation time requested through `SOURCE_DATE_EPOCH`, if any.
pub fn source_date_epoch() -> Result<Option<SystemTime>> {
    match std::env::var("SOURCE_DATE_EPOCH") {
        Ok(value) => parse_epoch(&value).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_epoch(value: &str) -> Result<SystemTime> {
    let secs = value
        .trim()
        .parse::<u64>()
        .map_err(|source| Error::SourceDateEpoch {
            value: value.to_string(),
            source,
        })?;
    Ok(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_values() {
        assert_eq!(parse_epoch("0").unwrap(), SystemTime::UNIX_EPOCH);
        assert_eq!(
            parse_epoch("1700000000\n").unwrap(),
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
        );
        assert!(matches!(
            parse_epoch("yesterday"),
            Err(Error::SourceDateEpoch { .. })
        ));
    }

    #[test]
    fn formats_time() {
        let t = SystemTime::UNIX_EPOCH + Duration::from_secs(86_400);
        assert_eq!(format_time(t), "1970-01-02T00:00:00Z");
    }
}
