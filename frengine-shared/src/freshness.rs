/// Freshness reconciliation for conditional GET
///
/// A project's "last touched" instant is never stored. It is derived from
/// three independently updated sources:
///
/// - `metadata_edited_at`: last rename or ownership transfer (optional)
/// - `created_at`: project creation (always present)
/// - the latest revision's `created_at` (optional)
///
/// Absent sources are left out of the maximum rather than treated as the
/// epoch, so a project without edits or revisions is as fresh as its creation.
///
/// Comparisons against `If-Modified-Since` happen at one-second granularity,
/// the precision of HTTP dates.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use frengine_shared::freshness::{is_fresh, reconcile, Freshness};
///
/// let created = Utc.timestamp_opt(50, 0).unwrap();
/// let edited = Utc.timestamp_opt(100, 0).unwrap();
/// let revised = Utc.timestamp_opt(200, 0).unwrap();
///
/// let touched = reconcile(Some(edited), created, Some(revised));
/// assert_eq!(touched, revised);
///
/// assert_eq!(is_fresh(Some(revised), touched), Freshness::Fresh);
/// assert_eq!(is_fresh(None, touched), Freshness::Stale);
/// ```

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::models::{project::Project, revision::Revision};

/// IMF-fixdate, the preferred HTTP date format (RFC 9110 §5.6.7)
const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// ANSI C `asctime()` format, still accepted from clients
const ASCTIME: &str = "%a %b %e %H:%M:%S %Y";

/// Obsolete RFC 850 format with a two-digit year
const RFC850: &str = "%A, %d-%b-%y %H:%M:%S GMT";

/// Outcome of a conditional GET check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The client's copy is current: answer 304 with no body
    Fresh,

    /// The client's copy is missing or outdated: send the full representation
    Stale,
}

impl Freshness {
    /// Whether the caller should short-circuit with "not modified"
    pub fn is_fresh(&self) -> bool {
        matches!(self, Freshness::Fresh)
    }
}

/// Computes the canonical "last touched" instant of a resource
///
/// Returns the maximum of whichever inputs are present. `created_at` is the
/// floor: optional sources can only move the result forward.
pub fn reconcile(
    metadata_edited_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    latest_revision_created_at: Option<DateTime<Utc>>,
) -> DateTime<Utc> {
    [metadata_edited_at, latest_revision_created_at]
        .into_iter()
        .flatten()
        .fold(created_at, std::cmp::max)
}

/// Reconciles a project together with its latest revision, if any
pub fn reconcile_project(project: &Project, latest_revision: Option<&Revision>) -> DateTime<Utc> {
    reconcile(
        project.metadata_edited_at,
        project.created_at,
        latest_revision.map(|r| r.created_at),
    )
}

/// Latest of several already-reconciled instants
///
/// Used for collection responses. Returns `None` for an empty collection,
/// which carries no `Last-Modified` at all.
pub fn reconcile_many<I>(instants: I) -> Option<DateTime<Utc>>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    instants.into_iter().max()
}

/// Decides whether a client's cached copy is still valid
///
/// `Fresh` iff `if_modified_since` is present and, truncated to whole
/// seconds, is at or after the reconciled instant.
pub fn is_fresh(if_modified_since: Option<DateTime<Utc>>, reconciled: DateTime<Utc>) -> Freshness {
    match if_modified_since {
        Some(since) if since.timestamp() >= reconciled.timestamp() => Freshness::Fresh,
        _ => Freshness::Stale,
    }
}

/// Formats an instant as an HTTP date (`Last-Modified` header value)
pub fn http_date(instant: DateTime<Utc>) -> String {
    instant.format(IMF_FIXDATE).to_string()
}

/// Parses an `If-Modified-Since` header value
///
/// Accepts IMF-fixdate, RFC 850 and asctime. Anything unparseable yields `None`, and
/// the request is then treated as unconditional.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    [RFC850, ASCTIME]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_reconcile_creation_only() {
        assert_eq!(reconcile(None, at(50), None), at(50));
    }

    #[test]
    fn test_reconcile_takes_maximum() {
        assert_eq!(reconcile(Some(at(100)), at(50), Some(at(200))), at(200));
        assert_eq!(reconcile(Some(at(300)), at(50), Some(at(200))), at(300));
        assert_eq!(reconcile(Some(at(100)), at(50), None), at(100));
        assert_eq!(reconcile(None, at(50), Some(at(75))), at(75));
    }

    #[test]
    fn test_reconcile_never_drops_below_creation() {
        // Clock skew between sources must not move the instant backwards
        assert_eq!(reconcile(Some(at(10)), at(50), Some(at(20))), at(50));
    }

    #[test]
    fn test_reconcile_project_uses_revision() {
        let project = Project {
            id: Uuid::now_v7(),
            name: "p".to_string(),
            owner_id: Uuid::now_v7(),
            owner_name: "alice".to_string(),
            created_at: at(50),
            metadata_edited_at: Some(at(100)),
            deleted_at: None,
        };
        let revision = Revision {
            id: Uuid::now_v7(),
            project_id: project.id,
            content: "v2".to_string(),
            created_at: at(200),
        };

        assert_eq!(reconcile_project(&project, None), at(100));
        assert_eq!(reconcile_project(&project, Some(&revision)), at(200));
    }

    #[test]
    fn test_reconcile_many() {
        assert_eq!(reconcile_many(Vec::new()), None);
        assert_eq!(reconcile_many(vec![at(3), at(9), at(5)]), Some(at(9)));
    }

    #[test]
    fn test_is_fresh_boundaries() {
        let t = at(1_000);
        assert_eq!(is_fresh(Some(t), t), Freshness::Fresh);
        assert_eq!(is_fresh(Some(at(1_001)), t), Freshness::Fresh);
        assert_eq!(is_fresh(Some(at(999)), t), Freshness::Stale);
        assert_eq!(is_fresh(None, t), Freshness::Stale);
    }

    #[test]
    fn test_is_fresh_ignores_sub_second_precision() {
        // HTTP dates carry whole seconds; a reconciled instant 0.5s past the
        // header's second is still the same second.
        let reconciled = at(1_000) + Duration::milliseconds(500);
        assert!(is_fresh(Some(at(1_000)), reconciled).is_fresh());
    }

    #[test]
    fn test_http_date_format() {
        let instant = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
        assert_eq!(http_date(instant), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[test]
    fn test_parse_http_date_formats() {
        let expected = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
        assert_eq!(parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT"), Some(expected));
        assert_eq!(parse_http_date("Sun Nov  6 08:49:37 1994"), Some(expected));
        assert_eq!(parse_http_date("Sunday, 06-Nov-94 08:49:37 GMT"), Some(expected));
        assert_eq!(parse_http_date("yesterday"), None);
        assert_eq!(parse_http_date(""), None);
    }

    #[test]
    fn test_http_date_roundtrip_truncates() {
        let instant = at(1_700_000_000) + Duration::milliseconds(250);
        let parsed = parse_http_date(&http_date(instant)).unwrap();
        assert_eq!(parsed.timestamp(), instant.timestamp());
        assert!(is_fresh(Some(parsed), instant).is_fresh());
    }
}
