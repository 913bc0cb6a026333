use cadence_rfc::rfc::recur::{RecurrenceRule, Window, expand, format_rule, parse_rule};

include!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/rule_cases_data/mod.rs"));

#[test_log::test]
fn rule_cases_survive_formatting() {
    for case in rule_cases() {
        let rule: RecurrenceRule = case.rule.parse().unwrap();
        let reparsed = parse_rule(&format_rule(&rule)).unwrap();
        assert_eq!(reparsed, rule, "case {}", case.name);

        let window = Window::new(
            parse_instant(case.window_start),
            parse_instant(case.window_end),
        );
        assert_eq!(
            expand(&reparsed, &window).unwrap().len(),
            case.expected.len(),
            "case {}",
            case.name
        );
    }
}
