//! Cache-control policy for gateway responses.
//!
//! Content-addressed artifacts (loose objects, packs, indexes) never change
//! once named and may be cached forever. Symbolic refs and listings change
//! underneath any cache and must never be cached. The policy is fixed per
//! route, not computed.

use axum::http::{header, HeaderName, HeaderValue};
use chrono::{DateTime, TimeDelta, Utc};

/// Seconds in the one-year immutable-cache window.
const YEAR_SECS: i64 = 31_536_000;

/// Expires value predating any cache.
const EPOCH_EXPIRES: &str = "Fri, 01 Jan 1980 00:00:00 GMT";

/// Cache class of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Mutable content: refs, listings, alternates.
    Never,
    /// Immutable content-addressed artifacts.
    Forever,
}

impl CachePolicy {
    /// Header set implementing this policy.
    pub fn headers(&self) -> Vec<(HeaderName, HeaderValue)> {
        match self {
            CachePolicy::Never => vec![
                (header::EXPIRES, HeaderValue::from_static(EPOCH_EXPIRES)),
                (header::PRAGMA, HeaderValue::from_static("no-cache")),
                (
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("no-cache, max-age=0, must-revalidate"),
                ),
            ],
            CachePolicy::Forever => {
                let now = Utc::now();
                let expires = now + TimeDelta::seconds(YEAR_SECS);
                vec![
                    (header::DATE, date_value(now)),
                    (header::EXPIRES, date_value(expires)),
                    (
                        header::CACHE_CONTROL,
                        HeaderValue::from_static("public, max-age=31536000"),
                    ),
                ]
            }
        }
    }
}

/// Formats a timestamp as an RFC 7231 IMF-fixdate.
pub(crate) fn imf_fixdate(t: DateTime<Utc>) -> String {
    t.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn date_value(t: DateTime<Utc>) -> HeaderValue {
    HeaderValue::from_str(&imf_fixdate(t))
        .unwrap_or_else(|_| HeaderValue::from_static(EPOCH_EXPIRES))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn header<'a>(
        headers: &'a [(HeaderName, HeaderValue)],
        name: &HeaderName,
    ) -> Option<&'a HeaderValue> {
        headers.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    #[test]
    fn never_policy_headers() {
        let headers = CachePolicy::Never.headers();
        assert_eq!(
            header(&headers, &header::EXPIRES).unwrap(),
            "Fri, 01 Jan 1980 00:00:00 GMT"
        );
        assert_eq!(header(&headers, &header::PRAGMA).unwrap(), "no-cache");
        assert_eq!(
            header(&headers, &header::CACHE_CONTROL).unwrap(),
            "no-cache, max-age=0, must-revalidate"
        );
        assert!(header(&headers, &header::DATE).is_none());
    }

    #[test]
    fn forever_policy_headers() {
        let headers = CachePolicy::Forever.headers();
        assert_eq!(
            header(&headers, &header::CACHE_CONTROL).unwrap(),
            "public, max-age=31536000"
        );

        let date = header(&headers, &header::DATE).unwrap().to_str().unwrap();
        let expires = header(&headers, &header::EXPIRES)
            .unwrap()
            .to_str()
            .unwrap();
        let date = DateTime::parse_from_rfc2822(&date.replace("GMT", "+0000")).unwrap();
        let expires = DateTime::parse_from_rfc2822(&expires.replace("GMT", "+0000")).unwrap();
        assert_eq!((expires - date).num_seconds(), YEAR_SECS);

        assert!(header(&headers, &header::PRAGMA).is_none());
    }

    #[test]
    fn imf_fixdate_format() {
        let t = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
        assert_eq!(imf_fixdate(t), "Sun, 06 Nov 1994 08:49:37 GMT");
    }
}
