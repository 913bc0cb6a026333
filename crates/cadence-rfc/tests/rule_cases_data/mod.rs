pub struct RuleCase {
    pub name: &'static str,
    pub rule: &'static str,
    pub window_start: &'static str,
    pub window_end: &'static str,
    pub expected: &'static [&'static str],
}

#[expect(clippy::too_many_lines)]
pub fn rule_cases() -> Vec<RuleCase> {
    vec![
        RuleCase {
            name: "daily_count",
            rule: "DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY;COUNT=3",
            window_start: "2024-01-01T00:00:00Z",
            window_end: "2024-02-01T00:00:00Z",
            expected: &[
                "2024-01-01T09:00:00Z",
                "2024-01-02T09:00:00Z",
                "2024-01-03T09:00:00Z",
            ],
        },
        RuleCase {
            name: "weekly_byday",
            rule: "DTSTART:20240102T100000Z\nRRULE:FREQ=WEEKLY;BYDAY=TU,TH;COUNT=4",
            window_start: "2024-01-01T00:00:00Z",
            window_end: "2024-02-01T00:00:00Z",
            expected: &[
                "2024-01-02T10:00:00Z",
                "2024-01-04T10:00:00Z",
                "2024-01-09T10:00:00Z",
                "2024-01-11T10:00:00Z",
            ],
        },
        RuleCase {
            name: "weekly_interval",
            rule: "DTSTART:20240101T170000Z\nRRULE:FREQ=WEEKLY;INTERVAL=2;COUNT=3",
            window_start: "2024-01-01T00:00:00Z",
            window_end: "2024-03-01T00:00:00Z",
            expected: &[
                "2024-01-01T17:00:00Z",
                "2024-01-15T17:00:00Z",
                "2024-01-29T17:00:00Z",
            ],
        },
        RuleCase {
            name: "monthly_second_tuesday",
            rule: "DTSTART:20240109T180000Z\nRRULE:FREQ=MONTHLY;BYDAY=2TU;COUNT=3",
            window_start: "2024-01-01T00:00:00Z",
            window_end: "2024-12-31T00:00:00Z",
            expected: &[
                "2024-01-09T18:00:00Z",
                "2024-02-13T18:00:00Z",
                "2024-03-12T18:00:00Z",
            ],
        },
        RuleCase {
            name: "until_is_inclusive",
            rule: "DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY;UNTIL=20240103T090000Z",
            window_start: "2024-01-01T00:00:00Z",
            window_end: "2024-02-01T00:00:00Z",
            expected: &[
                "2024-01-01T09:00:00Z",
                "2024-01-02T09:00:00Z",
                "2024-01-03T09:00:00Z",
            ],
        },
        RuleCase {
            name: "window_start_is_inclusive_end_is_exclusive",
            rule: "DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY;COUNT=10",
            window_start: "2024-01-03T09:00:00Z",
            window_end: "2024-01-05T09:00:00Z",
            expected: &["2024-01-03T09:00:00Z", "2024-01-04T09:00:00Z"],
        },
        RuleCase {
            name: "window_before_rule",
            rule: "DTSTART:20240601T090000Z\nRRULE:FREQ=DAILY;COUNT=5",
            window_start: "2024-01-01T00:00:00Z",
            window_end: "2024-02-01T00:00:00Z",
            expected: &[],
        },
        RuleCase {
            name: "window_after_until",
            rule: "DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY;UNTIL=20240105",
            window_start: "2024-03-01T00:00:00Z",
            window_end: "2024-04-01T00:00:00Z",
            expected: &[],
        },
        RuleCase {
            name: "zero_count",
            rule: "DTSTART:20240101T090000Z\nRRULE:FREQ=WEEKLY;COUNT=0",
            window_start: "2024-01-01T00:00:00Z",
            window_end: "2024-02-01T00:00:00Z",
            expected: &[],
        },
        RuleCase {
            name: "zoned_start_keeps_local_time_across_dst",
            rule: "DTSTART;TZID=America/New_York:20240307T090000\nRRULE:FREQ=DAILY;COUNT=4",
            window_start: "2024-03-01T00:00:00Z",
            window_end: "2024-04-01T00:00:00Z",
            expected: &[
                "2024-03-07T14:00:00Z",
                "2024-03-08T14:00:00Z",
                "2024-03-09T14:00:00Z",
                "2024-03-10T13:00:00Z",
            ],
        },
        RuleCase {
            name: "open_ended_stops_at_horizon",
            rule: "DTSTART:20240101T090000Z\nRRULE:FREQ=WEEKLY;INTERVAL=26",
            window_start: "2023-01-01T00:00:00Z",
            window_end: "2030-01-01T00:00:00Z",
            expected: &[
                "2024-01-01T09:00:00Z",
                "2024-07-01T09:00:00Z",
                "2024-12-30T09:00:00Z",
                "2025-06-30T09:00:00Z",
                "2025-12-29T09:00:00Z",
            ],
        },
    ]
}

pub fn parse_instant(s: &str) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339(s)
        .unwrap()
        .with_timezone(&chrono::Utc)
}
