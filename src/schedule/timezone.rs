//! Caller timezone resolution
//!
//! Devices send an IANA zone name in the `X-Timezone` header. A missing
//! header means the configured default; an unknown name also resolves to
//! UTC, it never fails the request.

use chrono_tz::Tz;

/// Header carrying the device timezone
pub const TIMEZONE_HEADER: &str = "X-Timezone";

/// Result of resolving a caller-supplied zone name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTimezone {
    pub tz: Tz,
    /// True when the supplied name could not be parsed
    pub fell_back: bool,
}

/// Resolve an optional zone name against `default`.
pub fn resolve_timezone(name: Option<&str>, default: Tz) -> ResolvedTimezone {
    let name = name.map(str::trim).filter(|n| !n.is_empty());

    match name {
        None => ResolvedTimezone {
            tz: default,
            fell_back: false,
        },
        Some(raw) => match raw.parse::<Tz>() {
            Ok(tz) => ResolvedTimezone {
                tz,
                fell_back: false,
            },
            Err(_) => ResolvedTimezone {
                tz: Tz::UTC,
                fell_back: true,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_header_uses_default() {
        let resolved = resolve_timezone(None, Tz::UTC);
        assert_eq!(resolved.tz, Tz::UTC);
        assert!(!resolved.fell_back);

        let resolved = resolve_timezone(Some("  "), Tz::Asia__Jakarta);
        assert_eq!(resolved.tz, Tz::Asia__Jakarta);
        assert!(!resolved.fell_back);
    }

    #[test]
    fn test_valid_zone() {
        let resolved = resolve_timezone(Some("Asia/Jakarta"), Tz::UTC);
        assert_eq!(resolved.tz, Tz::Asia__Jakarta);
        assert!(!resolved.fell_back);
    }

    #[test]
    fn test_unknown_zone_falls_back_to_utc() {
        let resolved = resolve_timezone(Some("Mars/Olympus_Mons"), Tz::Asia__Jakarta);
        assert_eq!(resolved.tz, Tz::UTC);
        assert!(resolved.fell_back);
    }
}
