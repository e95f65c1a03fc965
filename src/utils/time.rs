use chrono::{DateTime, SecondsFormat};

/// Convert Windows FILETIME values (100-nanosecond intervals since 1601-01-01 UTC) to unixepoch seconds
pub(crate) fn filetime_to_unixepoch(filetime: &u64) -> i64 {
    let windows_nano = 10000000;
    let seconds_to_unix: i64 = 11644473600;

    (filetime / windows_nano) as i64 - seconds_to_unix
}

/// Convert unixepoch seconds back to a Windows FILETIME value
pub(crate) fn unixepoch_to_filetime(timestamp: &i64) -> u64 {
    let windows_nano = 10000000;
    let seconds_to_unix = 11644473600;

    ((timestamp + seconds_to_unix) as u64) * windows_nano
}

/// Render unixepoch seconds as an ISO8601 UTC string
pub(crate) fn unixepoch_to_iso(timestamp: &i64) -> String {
    let date_opt = DateTime::from_timestamp(*timestamp, 0);
    match date_opt {
        Some(result) => result.to_rfc3339_opts(SecondsFormat::Secs, true),
        None => String::from("1970-01-01T00:00:00Z"),
    }
}

#[cfg(test)]
mod tests {
    use super::{filetime_to_unixepoch, unixepoch_to_filetime, unixepoch_to_iso};

    #[test]
    fn test_filetime_to_unixepoch() {
        let test_data = 132244766418940254;
        assert_eq!(filetime_to_unixepoch(&test_data), 1580003041)
    }

    #[test]
    fn test_unixepoch_to_filetime() {
        let test_data = 1559390400;
        assert_eq!(unixepoch_to_filetime(&test_data), 132038640000000000)
    }

    #[test]
    fn test_filetime_round_trip() {
        let test_data = 132038640000000000;
        let unix = filetime_to_unixepoch(&test_data);
        assert_eq!(unixepoch_to_filetime(&unix), test_data)
    }

    #[test]
    fn test_unixepoch_to_iso() {
        let test_data = 1559390400;
        assert_eq!(unixepoch_to_iso(&test_data), "2019-06-01T12:00:00Z")
    }
}
