use tracklify_types::{FilterCriteria, LogRecord};

/// Check whether a record satisfies every active predicate in the criteria.
///
/// Pure and total: absent criteria are vacuously true, absent optional fields
/// compare as empty strings. The search term is a case-insensitive substring
/// match against content, application, window title and device id. Time
/// bounds are inclusive. A record with no severity never matches a severity
/// filter.
pub fn matches(record: &LogRecord, criteria: &FilterCriteria) -> bool {
    if !criteria.search_term.is_empty() {
        let term = criteria.search_term.to_lowercase();
        let hit = record.content.to_lowercase().contains(&term)
            || field(&record.application).to_lowercase().contains(&term)
            || field(&record.window_title).to_lowercase().contains(&term)
            || record.device_id.to_lowercase().contains(&term);
        if !hit {
            return false;
        }
    }

    if let Some(device) = criteria.active_device() {
        if record.device_id != device {
            return false;
        }
    }

    if let Some(severity) = criteria.severity {
        if record.severity != Some(severity) {
            return false;
        }
    }

    if let Some(since) = criteria.since {
        if record.created_at < since {
            return false;
        }
    }

    if let Some(until) = criteria.until {
        if record.created_at > until {
            return false;
        }
    }

    true
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tracklify_types::{ALL_DEVICES, Severity};

    fn sample() -> LogRecord {
        let mut record = LogRecord::new(
            "r1",
            "WS-ACCT-03",
            "Composing an email to the team",
            Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap(),
        )
        .with_application("Google Chrome")
        .with_window_title("Gmail - Inbox");
        record.severity = Some(Severity::Info);
        record
    }

    #[test]
    fn empty_criteria_matches_everything() {
        assert!(matches(&sample(), &FilterCriteria::default()));
    }

    #[test]
    fn search_term_is_case_insensitive() {
        let record = sample();
        let upper = FilterCriteria {
            search_term: "EMAIL".to_string(),
            ..Default::default()
        };
        let lower = FilterCriteria {
            search_term: "email".to_string(),
            ..Default::default()
        };
        assert_eq!(matches(&record, &upper), matches(&record, &lower));
        assert!(matches(&record, &upper));
    }

    #[test]
    fn search_covers_all_searchable_fields() {
        let record = sample();
        for term in ["team", "chrome", "gmail", "ws-acct"] {
            let criteria = FilterCriteria {
                search_term: term.to_string(),
                ..Default::default()
            };
            assert!(matches(&record, &criteria), "term {term:?} should match");
        }

        let criteria = FilterCriteria {
            search_term: "zzz-not-there".to_string(),
            ..Default::default()
        };
        assert!(!matches(&record, &criteria));
    }

    #[test]
    fn search_tolerates_missing_optional_fields() {
        let mut record = sample();
        record.application = None;
        record.window_title = None;
        let criteria = FilterCriteria {
            search_term: "chrome".to_string(),
            ..Default::default()
        };
        assert!(!matches(&record, &criteria));
    }

    #[test]
    fn device_filter_is_exact_with_all_sentinel() {
        let record = sample();

        let exact = FilterCriteria {
            device_id: Some("WS-ACCT-03".to_string()),
            ..Default::default()
        };
        assert!(matches(&record, &exact));

        let other = FilterCriteria {
            device_id: Some("WS-ACCT-04".to_string()),
            ..Default::default()
        };
        assert!(!matches(&record, &other));

        let all = FilterCriteria {
            device_id: Some(ALL_DEVICES.to_string()),
            ..Default::default()
        };
        assert!(matches(&record, &all));
    }

    #[test]
    fn severity_filter_never_matches_unclassified_records() {
        let mut record = sample();
        let criteria = FilterCriteria {
            severity: Some(Severity::Info),
            ..Default::default()
        };
        assert!(matches(&record, &criteria));

        record.severity = None;
        assert!(!matches(&record, &criteria));
    }

    #[test]
    fn time_bounds_are_inclusive() {
        let record = sample();
        let at = record.created_at;

        let exact = FilterCriteria {
            since: Some(at),
            until: Some(at),
            ..Default::default()
        };
        assert!(matches(&record, &exact));

        let before = FilterCriteria {
            until: Some(at - chrono::Duration::seconds(1)),
            ..Default::default()
        };
        assert!(!matches(&record, &before));

        let after = FilterCriteria {
            since: Some(at + chrono::Duration::seconds(1)),
            ..Default::default()
        };
        assert!(!matches(&record, &after));
    }

    #[test]
    fn predicates_combine_with_logical_and() {
        let record = sample();
        let criteria = FilterCriteria {
            search_term: "email".to_string(),
            device_id: Some("WS-ACCT-03".to_string()),
            severity: Some(Severity::Critical),
            ..Default::default()
        };
        // Search and device match, severity does not
        assert!(!matches(&record, &criteria));
    }
}
