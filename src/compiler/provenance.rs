use chrono::{DateTime, SecondsFormat, Utc};

use crate::schema::constants::is_standard_global_attribute;
use crate::schema::{AttributeSet, AttributeValue};

/// Millisecond UTC ISO 8601 timestamp with a `Z` suffix
pub(crate) fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Global attributes as written to the root scope.
///
/// Configured attributes come first. With a `stamp`, `history` is prefixed
/// with `Created <timestamp>` and `date_created`/`date_modified` are set.
/// `extra` attributes are applied last and win.
pub(crate) fn global_attributes(
    configured: &AttributeSet,
    extra: &AttributeSet,
    stamp: Option<DateTime<Utc>>,
) -> AttributeSet {
    let mut attrs = AttributeSet::new();
    for attr in configured {
        if !is_standard_global_attribute(&attr.name) {
            log::warn!(
                "{} not in list of standard global attributes or ACDD",
                attr.name
            );
        }
        attrs.insert(attr.name.clone(), attr.value.clone());
    }

    if let Some(now) = stamp {
        let created = timestamp(now);
        let history = match configured.get("history") {
            Some(AttributeValue::Text(previous)) => format!("Created {created} {previous}"),
            Some(other) => format!("Created {created} {other}"),
            None => format!("Created {created}"),
        };
        attrs.insert("history", history);
        attrs.insert("date_created", created.clone());
        attrs.insert("date_modified", created);
    }

    attrs.merge(extra);
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_timestamp_format() {
        assert_eq!(timestamp(fixed_time()), "2024-03-01T12:30:00.000Z");
    }

    #[test]
    fn test_history_prefixed() {
        let configured = AttributeSet::new()
            .with("title", "t")
            .with("history", "regridded");
        let attrs = global_attributes(&configured, &AttributeSet::new(), Some(fixed_time()));
        assert_eq!(
            attrs.get("history").and_then(|v| v.as_text()),
            Some("Created 2024-03-01T12:30:00.000Z regridded")
        );
        assert_eq!(
            attrs.get("date_modified"),
            attrs.get("date_created")
        );
        // Order: configured keys keep their position.
        assert_eq!(attrs.names().next(), Some("title"));
    }

    #[test]
    fn test_without_stamp_and_extra_override() {
        let configured = AttributeSet::new().with("title", "t").with("custom", 1i64);
        let extra = AttributeSet::new().with("title", "override");
        let attrs = global_attributes(&configured, &extra, None);
        assert!(!attrs.contains("history"));
        assert_eq!(attrs.get("title").and_then(|v| v.as_text()), Some("override"));
        assert_eq!(attrs.len(), 2);
    }
}
