// tests/core_scenarios.rs
use chrono::{DateTime, TimeZone, Utc};
use rss_daily_digest::filter::matcher::{group_matches, should_include};
use rss_daily_digest::report::aggregate_occurrences;
use rss_daily_digest::{
    build_report, remove_duplicates, sort_by_priority, ContentFilter, GroupResult, Item, Ruleset,
    WordGroup, WordSegmenter,
};

fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 10, h, m, 0).unwrap()
}

fn item(title: &str, link: &str) -> Item {
    Item::new(title, link, "", "src", at(8, 0))
}

fn with_summary(title: &str, summary: &str) -> Item {
    Item::new(title, format!("https://x/{title}"), summary, "src", at(8, 0))
}

fn words(ws: &[&str]) -> Vec<String> {
    ws.iter().map(|s| s.to_string()).collect()
}

#[test]
fn dedup_drops_by_title_then_by_link() {
    let items = vec![item("A", "l1"), item("A", "l2"), item("B", "l1")];
    assert_eq!(remove_duplicates(&items), vec![item("A", "l1")]);
}

#[test]
fn exclusion_beats_inclusion() {
    let rs = Ruleset::new(["AI"], ["ad"]);
    let f = ContentFilter::new();
    assert!(!f.should_include(&with_summary("AI breakthrough", "ad content"), &rs));
    assert!(f.filter_articles(&[with_summary("AI breakthrough", "ad content")], &rs).is_empty());
}

#[test]
fn must_only_group_with_exclusion() {
    let group = WordGroup {
        keywords: vec![],
        must_keywords: words(&["chip"]),
        exclude_keywords: words(&["rumor"]),
    };
    assert!(group_matches(&item("new chip launch", "1"), &group, &WordSegmenter));
    assert!(!group_matches(&item("chip rumor", "2"), &group, &WordSegmenter));
}

#[test]
fn repeated_pair_becomes_one_bucket() {
    let a = Item::new("Y", "l1", "", "X", at(9, 0));
    let b = Item::new("Y", "l2", "", "X", at(9, 30));
    let stats = aggregate_occurrences(&[a.clone(), b.clone()]);
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].count, 2);

    let report = build_report(&[GroupResult {
        group: WordGroup {
            keywords: words(&["Y"]),
            ..Default::default()
        },
        matched_articles: vec![a, b],
    }]);
    assert!(report.contains("09:00 ~ 09:30 (x2)"), "{report}");
}

#[test]
fn zero_match_group_keeps_its_header() {
    let f = ContentFilter::new();
    let items = vec![item("AI chip news", "1"), item("EV sales", "2")];
    let groups = vec![
        WordGroup { keywords: words(&["AI"]), ..Default::default() },
        WordGroup { keywords: words(&["blockchain"]), ..Default::default() },
        WordGroup { keywords: words(&["EV"]), ..Default::default() },
    ];
    let report = build_report(&f.filter_by_groups(&items, &groups));

    let headers: Vec<&str> = report
        .lines()
        .filter(|l| !l.is_empty() && !l.starts_with("  "))
        .collect();
    assert_eq!(headers, vec!["AI (1)", "blockchain (0)", "EV (1)"]);
    assert!(report.contains("blockchain (0)\n\nEV (1)\n"));
}

// ---- properties over small hand-built corpora ----

fn corpus() -> Vec<Item> {
    vec![
        item("A", "1"),
        item("A", "2"),
        item(" A", "3"),
        item("B", "1"),
        item("C", " 3 "),
        item("D", "4"),
        item("d", "5"),
        item("", "6"),
        item("", "7"),
    ]
}

#[test]
fn dedup_is_idempotent_and_or_keyed() {
    let once = remove_duplicates(&corpus());
    assert_eq!(remove_duplicates(&once), once);

    let twins = vec![item("same", "x"), item("same", "y")];
    assert_eq!(remove_duplicates(&twins), vec![item("same", "x")]);
}

#[test]
fn empty_keyword_ruleset_depends_only_on_excludes() {
    let excl = words(&["spam", "广告"]);
    let rs = Ruleset { keywords: vec![], exclude_keywords: excl.clone() };
    for it in [
        with_summary("Anything", ""),
        with_summary("buy now", "spam offer"),
        with_summary("限时广告", ""),
        with_summary("", ""),
    ] {
        let content = it.match_content();
        let expected = !excl.iter().any(|x| content.contains(&x.to_lowercase()));
        assert_eq!(should_include(&it, &rs, &WordSegmenter), expected, "{it:?}");
    }
}

#[test]
fn adding_must_keywords_never_adds_matches() {
    let items = vec![
        with_summary("AI chip launch", "new release"),
        with_summary("AI model", "open weights"),
        with_summary("chip shortage", ""),
        with_summary("人工智能芯片", "发布会"),
    ];
    let base = WordGroup {
        keywords: words(&["AI", "chip", "人工智能"]),
        ..Default::default()
    };
    let mut narrower = base.clone();
    narrower.must_keywords.push("launch".into());
    let mut narrowest = narrower.clone();
    narrowest.must_keywords.push("release".into());

    let f = ContentFilter::new();
    let res = f.filter_by_groups(&items, &[base, narrower, narrowest]);
    for pair in res.windows(2) {
        assert!(pair[1]
            .matched_articles
            .iter()
            .all(|it| pair[0].matched_articles.contains(it)));
        assert!(pair[1].matched_articles.len() <= pair[0].matched_articles.len());
    }
}

#[test]
fn priority_sort_keeps_relative_order_of_ties() {
    let items = vec![
        with_summary("one", ""),
        with_summary("ChatGPT two", ""),
        with_summary("three", ""),
        with_summary("AI four", "ChatGPT"),
        with_summary("five", ""),
        with_summary("AI six", ""),
    ];
    let sorted = sort_by_priority(&items, &["AI", "ChatGPT"]);
    let titles: Vec<&str> = sorted.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["AI four", "ChatGPT two", "AI six", "one", "three", "five"]
    );
}

#[test]
fn occurrence_ranges_stay_ordered() {
    let times = [at(12, 0), at(3, 15), at(23, 59), at(3, 15), at(0, 1)];
    let items: Vec<Item> = times
        .iter()
        .enumerate()
        .map(|(i, t)| Item::new("T", format!("l{i}"), "", "S", *t))
        .collect();
    let stats = aggregate_occurrences(&items);
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].count, 5);
    assert_eq!(stats[0].first_time, at(0, 1));
    assert_eq!(stats[0].last_time, at(23, 59));
    assert!(stats[0].first_time <= stats[0].last_time);
}

#[test]
fn empty_inputs_are_total() {
    let f = ContentFilter::new();
    assert!(remove_duplicates(&[]).is_empty());
    assert!(sort_by_priority::<&str>(&[], &[]).is_empty());
    assert!(f.filter_by_groups(&[], &[]).is_empty());
    assert_eq!(build_report(&[]), "");
    assert_eq!(f.filter_articles(&[], &Ruleset::default()), Vec::<Item>::new());
}
