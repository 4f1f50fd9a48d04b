use chrono::{DateTime, Duration, Utc};

use tracklify_types::{LogRecord, Severity};

/// Fixed demo dataset shown when the backing collection does not exist yet.
///
/// Timestamps are offsets from the supplied `now` so the feed looks recent;
/// ids are stable so re-initialization is idempotent. Two entries carry
/// secret-like content on purpose, so the severity classification is visible
/// in demo mode.
pub fn sample_records(now: DateTime<Utc>) -> Vec<LogRecord> {
    let entry = |n: u32,
                 minutes_ago: i64,
                 device: &str,
                 user: &str,
                 app: &str,
                 window: &str,
                 content: &str,
                 severity: Severity| {
        let mut record = LogRecord::new(
            format!("sample-{n}"),
            device,
            content,
            now - Duration::minutes(minutes_ago),
        )
        .with_user(user)
        .with_application(app)
        .with_window_title(window);
        record.severity = Some(severity);
        record
    };

    vec![
        entry(
            1,
            5,
            "WS-JDOE-01",
            "john.doe@example.com",
            "Microsoft Word",
            "Document1.docx - Microsoft Word",
            "This is a sample keystroke log for testing purposes.",
            Severity::Warning,
        ),
        entry(
            2,
            15,
            "WS-JSMITH-02",
            "jane.smith@example.com",
            "Google Chrome",
            "Gmail - Inbox",
            "Composing an email to the team about the project status.",
            Severity::Warning,
        ),
        entry(
            3,
            30,
            "WS-RJOHN-03",
            "robert.johnson@example.com",
            "File Explorer",
            "C:\\Users\\Robert\\Documents",
            "password123",
            Severity::Critical,
        ),
        entry(
            4,
            45,
            "WS-EDAVIS-04",
            "emily.davis@example.com",
            "Outlook",
            "Inbox - emily.davis@example.com",
            "Sending email with attachment",
            Severity::Info,
        ),
        entry(
            5,
            60,
            "WS-MWILSON-05",
            "michael.wilson@example.com",
            "Command Prompt",
            "C:\\Windows\\System32\\cmd.exe",
            "cd /d C:\\Users\\Michael\\Documents && del /f /q secret.txt",
            Severity::Critical,
        ),
        entry(
            6,
            90,
            "WS-SBROWN-06",
            "sarah.brown@example.com",
            "Slack",
            "Tracklify Team - Slack",
            "Hey team, just finished the new feature implementation!",
            Severity::Info,
        ),
        entry(
            7,
            120,
            "WS-DMILLER-07",
            "david.miller@example.com",
            "Visual Studio Code",
            "project.rs - tracklify",
            "fn handle_submit() { tracing::info!(\"form submitted\"); }",
            Severity::Warning,
        ),
        entry(
            8,
            180,
            "WS-JTAYLOR-08",
            "jennifer.taylor@example.com",
            "FileZilla",
            "FileZilla - Connecting to ftp.example.com",
            "username: admin\npassword: securePassword!23",
            Severity::Critical,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_set_is_nonempty_with_unique_ids() {
        let records = sample_records(Utc::now());
        assert!(!records.is_empty());

        let mut ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), records.len());
    }

    #[test]
    fn sample_set_is_newest_first_and_classified() {
        let records = sample_records(Utc::now());
        for pair in records.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
        assert!(records.iter().all(|r| r.severity.is_some()));
    }
}
