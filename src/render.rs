//! Report rendering
//!
//! Turns a [`ReportData`] into an ordered list of text fragments in one
//! [`TextFormat`]. Fragments are the units the splitter packs: a fragment is
//! never cut, so every chunk boundary lands between complete report items.
//!
//! The first item of each topic shares a fragment with the topic heading,
//! which keeps a heading from ending up alone at the bottom of a batch.
//!
//! [`render_fitted`] additionally shortens the title of any item whose
//! fragment would not fit a byte budget. The title is cut as raw text before
//! any markup is applied, so a shortened fragment is still well-formed.

use crate::config::TextFormat;
use crate::format::{ELLIPSIS, escape_html, escape_mrkdwn};
use crate::types::{ReportData, ReportItem, TopicGroup};

/// Render the report as ordered fragments
///
/// A report without matched items renders to no fragments at all, even when
/// it carries failed sources or an update notice.
pub fn render_fragments(report: &ReportData, format: TextFormat) -> Vec<String> {
    render_with(report, format, None)
}

/// Render the report as ordered fragments, fitting each item into `max_bytes`
///
/// Items that already fit render exactly as in [`render_fragments`].
pub fn render_fitted(report: &ReportData, format: TextFormat, max_bytes: usize) -> Vec<String> {
    render_with(report, format, Some(max_bytes))
}

/// Render the whole report as one string
pub fn render_report(report: &ReportData, format: TextFormat) -> String {
    render_fragments(report, format).concat()
}

fn render_with(report: &ReportData, format: TextFormat, max_bytes: Option<usize>) -> Vec<String> {
    if report.is_empty() {
        return Vec::new();
    }

    let markup = Markup(format);
    let mut fragments = vec![intro(report, markup)];

    let topics = report.topics.iter().filter(|t| !t.items.is_empty());
    for (position, topic) in topics.enumerate() {
        if position > 0 {
            fragments.push(markup.separator().to_string());
        }
        topic_fragments(topic, markup, max_bytes, &mut fragments);
    }

    if !report.failed_sources.is_empty() {
        let sources = report
            .failed_sources
            .iter()
            .map(|s| markup.text(s))
            .collect::<Vec<_>>()
            .join(", ");
        fragments.push(format!(
            "\n\n⚠️ {} {}\n",
            markup.bold("Failed sources:"),
            sources
        ));
    }

    if let Some(update) = &report.update {
        let notice = format!(
            "New version {} available (running {})",
            markup.text(&update.latest_version),
            markup.text(&update.current_version)
        );
        fragments.push(format!("\n\n{}\n", markup.muted(&notice)));
    }

    fragments
}

fn intro(report: &ReportData, markup: Markup) -> String {
    let counts = format!(
        "{} items across {} topics",
        report.total_items(),
        report.active_topics()
    );
    format!(
        "📊 {}\n{}\n\n",
        markup.bold(report.mode.heading()),
        markup.muted(&counts)
    )
}

fn topic_fragments(
    topic: &TopicGroup,
    markup: Markup,
    max_bytes: Option<usize>,
    out: &mut Vec<String>,
) {
    let heading = format!(
        "🔥 {} · {} items\n\n",
        markup.bold(&markup.text(&topic.keyword)),
        topic.items.len()
    );

    for (index, item) in topic.items.iter().enumerate() {
        let number = index + 1;
        let prefix = if index == 0 { heading.as_str() } else { "" };
        let fragment = format!("{prefix}{}", item_line(number, item, &item.title, markup));
        match max_bytes {
            Some(max_bytes) if fragment.len() > max_bytes => {
                out.push(fit_item(prefix, number, item, markup, max_bytes));
            }
            _ => out.push(fragment),
        }
    }
}

fn item_line(number: usize, item: &ReportItem, title: &str, markup: Markup) -> String {
    let mut line = format!(
        "{number}. {} {}",
        markup.muted(&format!("[{}]", markup.text(&item.source))),
        markup.link(title, item.url.as_deref())
    );
    if item.count > 1 {
        line.push_str(&format!(" ×{}", item.count));
    }
    if item.is_new {
        line.push_str(" 🆕");
    }
    line.push('\n');
    line
}

/// Shorten an item's title until its fragment fits `max_bytes`
///
/// When even an empty title leaves the fragment too large (a huge source,
/// keyword or URL), the item degrades to a bare numbered title without
/// heading, source or link.
fn fit_item(
    prefix: &str,
    number: usize,
    item: &ReportItem,
    markup: Markup,
    max_bytes: usize,
) -> String {
    let full = |title: &str| format!("{prefix}{}", item_line(number, item, title, markup));
    let bare = |title: &str| format!("{number}. {}\n", markup.text(title));

    let fitted = longest_fit(&item.title, max_bytes, &full)
        .or_else(|| longest_fit(&item.title, max_bytes, &bare));
    match fitted {
        Some(fragment) => {
            tracing::warn!(
                bytes = fragment.len(),
                title_bytes = item.title.len(),
                max_bytes,
                "shortened report item to fit the batch budget"
            );
            fragment
        }
        None => {
            tracing::warn!(max_bytes, "batch budget too small for any report item");
            bare(ELLIPSIS)
        }
    }
}

/// Render with the longest title prefix whose output fits `max_bytes`
///
/// Returns `None` when not even the ellipsis alone fits.
fn longest_fit<F>(title: &str, max_bytes: usize, render: F) -> Option<String>
where
    F: Fn(&str) -> String,
{
    let cuts: Vec<usize> = title.char_indices().map(|(at, _)| at).collect();
    let shortened = |keep: usize| match cuts.get(keep) {
        Some(&cut) => format!("{}{ELLIPSIS}", &title[..cut]),
        None => title.to_string(),
    };

    // Output grows with the kept prefix, so the cut can be found by bisection
    let (mut low, mut high) = (0, cuts.len());
    let mut best = None;
    while low <= high {
        let keep = low + (high - low) / 2;
        let rendered = render(&shortened(keep));
        if rendered.len() <= max_bytes {
            best = Some(rendered);
            low = keep + 1;
        } else if keep == 0 {
            break;
        } else {
            high = keep - 1;
        }
    }
    best
}

/// Inline markup for one text format
#[derive(Clone, Copy)]
struct Markup(TextFormat);

impl Markup {
    fn text(&self, raw: &str) -> String {
        match self.0 {
            TextFormat::PlainHtml => escape_html(raw),
            TextFormat::Mrkdwn => escape_mrkdwn(raw),
            _ => raw.to_string(),
        }
    }

    fn bold(&self, text: &str) -> String {
        match self.0 {
            TextFormat::PlainHtml => format!("<b>{text}</b>"),
            TextFormat::PlainText => text.to_string(),
            _ => format!("**{text}**"),
        }
    }

    fn muted(&self, text: &str) -> String {
        match self.0 {
            TextFormat::JsonCard => format!("<font color='grey'>{text}</font>"),
            TextFormat::PlainHtml => format!("<i>{text}</i>"),
            _ => text.to_string(),
        }
    }

    fn link(&self, title: &str, url: Option<&str>) -> String {
        let title = self.text(title);
        let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
            return title;
        };
        match self.0 {
            TextFormat::PlainHtml => format!("<a href=\"{}\">{title}</a>", escape_html(url)),
            TextFormat::PlainText => format!("{title} {url}"),
            _ => format!("[{title}]({url})"),
        }
    }

    fn separator(&self) -> &'static str {
        match self.0 {
            TextFormat::PlainHtml | TextFormat::PlainText => "\n",
            _ => "\n---\n\n",
        }
    }
}
