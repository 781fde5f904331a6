//! Report fixtures shared by the integration tests

use chrono::{TimeZone, Utc};
use radar_notify::{ReportData, ReportItem, ReportMode, SideData, SideEntry, TopicGroup};

/// Small report: two topics, a failed source and a mix of new and repeated items
pub fn sample_report() -> ReportData {
    let mut report = ReportData::new(
        "Daily Summary",
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap(),
    );
    report.topics = vec![
        TopicGroup {
            keyword: "AI".into(),
            items: vec![
                ReportItem {
                    count: 3,
                    is_new: true,
                    ..ReportItem::new("Open model tops the leaderboard", "weibo")
                        .with_url("https://news.example.com/ai/1")
                },
                ReportItem::new("Chip export rules tightened", "zhihu")
                    .with_url("https://news.example.com/ai/2"),
            ],
        },
        TopicGroup {
            keyword: "Rust".into(),
            items: vec![
                ReportItem::new("Rust 1.90 released", "hackernews")
                    .with_url("https://blog.rust-lang.org/"),
            ],
        },
    ];
    report.failed_sources = vec!["toutiao".into()];
    report
}

/// Report big enough to need several batches on any channel with a small budget
pub fn large_report(topics: usize, items_per_topic: usize) -> ReportData {
    let mut report = ReportData::new(
        "Current Ranking",
        Utc.with_ymd_and_hms(2025, 3, 1, 20, 0, 0).unwrap(),
    );
    report.mode = ReportMode::Current;
    report.topics = (0..topics)
        .map(|t| TopicGroup {
            keyword: format!("topic {t}"),
            items: (0..items_per_topic)
                .map(|i| {
                    ReportItem::new(format!("热点新闻 {t}-{i}: headline with some padding"), "baidu")
                        .with_url(format!("https://news.example.com/{t}/{i}"))
                })
                .collect(),
        })
        .collect();
    report
}

/// Side content with one audio entry and one summary-only entry
pub fn side_data() -> SideData {
    SideData::new(vec![
        SideEntry {
            topic: "AI".into(),
            audio_url: Some("https://cdn.example.com/podcast/ai.mp3".into()),
            summary: Some("Generated summary of today's AI news".into()),
            item_count: 2,
        },
        SideEntry {
            topic: "Rust".into(),
            audio_url: None,
            summary: Some("Generated summary of today's Rust news".into()),
            item_count: 1,
        },
    ])
}
