//! Chronological merge of every source into one stream.
//!
//! Records are bucketed by local date (`YYYYMMDD`) and time (`HHMMSS`) of their
//! primary timestamp, then rendered newest day first, newest time first.
//! Records sharing a timestamp keep the order they were added in.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::adapters::display_host;
use crate::domain::{Article, Bookmark, FeedEntry, Folder};

use super::renderer::RenderError;
use super::template::{load_or_default, DateStyle, Template};

/// Source type of a stream entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryKind {
    Bookmark,
    Article,
    RssArticle,
}

impl EntryKind {
    pub const ALL: [EntryKind; 3] = [EntryKind::Bookmark, EntryKind::Article, EntryKind::RssArticle];

    /// Tag used in template file names and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Bookmark => "bookmark",
            EntryKind::Article => "article",
            EntryKind::RssArticle => "rss-article",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bookmark" => Ok(EntryKind::Bookmark),
            "article" => Ok(EntryKind::Article),
            "rss-article" => Ok(EntryKind::RssArticle),
            other => Err(RenderError::UnrecognizedType(other.to_string())),
        }
    }
}

/// One tagged record in the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEntry {
    Bookmark { bookmark: Bookmark, folder: String },
    Article(Article),
    RssArticle(FeedEntry),
}

impl StreamEntry {
    pub fn kind(&self) -> EntryKind {
        match self {
            StreamEntry::Bookmark { .. } => EntryKind::Bookmark,
            StreamEntry::Article(_) => EntryKind::Article,
            StreamEntry::RssArticle(_) => EntryKind::RssArticle,
        }
    }

    /// The instant the entry is filed under
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            StreamEntry::Bookmark { bookmark, .. } => bookmark.added_at,
            StreamEntry::Article(article) => article.archived_at,
            StreamEntry::RssArticle(entry) => entry.modified_at,
        }
    }
}

/// All entries sharing one local time of day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSlot {
    /// `HHMMSS`
    pub time: String,
    pub entries: Vec<StreamEntry>,
}

/// All entries of one local day, newest time first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateBucket {
    /// `YYYYMMDD`
    pub date: String,
    pub slots: Vec<TimeSlot>,
}

/// Buckets entries from any number of sources by date and time
#[derive(Debug, Clone)]
pub struct StreamMerger {
    dates: DateStyle,
    buckets: BTreeMap<String, BTreeMap<String, Vec<StreamEntry>>>,
    len: usize,
}

impl StreamMerger {
    /// Create a merger that derives keys in the zone of `dates`
    pub fn new(dates: DateStyle) -> Self {
        Self {
            dates,
            buckets: BTreeMap::new(),
            len: 0,
        }
    }

    /// File a single entry
    pub fn push(&mut self, entry: StreamEntry) {
        let local = self.dates.localize(entry.timestamp());
        let date = local.format("%Y%m%d").to_string();
        let time = local.format("%H%M%S").to_string();

        self.buckets
            .entry(date)
            .or_default()
            .entry(time)
            .or_default()
            .push(entry);
        self.len += 1;
    }

    /// File every bookmark of every folder, tagged with its folder title
    pub fn add_folders(&mut self, folders: &[Folder]) {
        for folder in folders {
            for bookmark in &folder.bookmarks {
                self.push(StreamEntry::Bookmark {
                    bookmark: bookmark.clone(),
                    folder: folder.title.clone(),
                });
            }
        }
    }

    pub fn add_articles(&mut self, articles: impl IntoIterator<Item = Article>) {
        for article in articles {
            self.push(StreamEntry::Article(article));
        }
    }

    pub fn add_feed_entries(&mut self, entries: impl IntoIterator<Item = FeedEntry>) {
        for entry in entries {
            self.push(StreamEntry::RssArticle(entry));
        }
    }

    /// Number of entries filed
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of distinct days
    pub fn date_count(&self) -> usize {
        self.buckets.len()
    }

    /// Buckets newest day first, slots newest time first
    pub fn into_buckets(self) -> Vec<DateBucket> {
        self.buckets
            .into_iter()
            .rev()
            .map(|(date, slots)| DateBucket {
                date,
                slots: slots
                    .into_iter()
                    .rev()
                    .map(|(time, entries)| TimeSlot { time, entries })
                    .collect(),
            })
            .collect()
    }
}

/// Templates for the stream document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamTemplates {
    /// Document preamble
    pub header: Template,

    /// Day heading, takes `{date}`
    pub date_header: Template,

    /// One template per entry type
    pub entries: HashMap<EntryKind, Template>,
}

impl StreamTemplates {
    pub const HEADER: &'static str = "public:: true";
    pub const DATE_HEADER: &'static str = "- **{date}**";
    pub const BOOKMARK: &'static str = "\t- Bookmarked [{title}]({url}) ({host})";
    pub const ARTICLE: &'static str =
        "\t- Read [{title}]({share_url}) {tags}\n\t  original article at [{host}]({original_url})";
    pub const RSS_ARTICLE: &'static str = "\t- Published [{title}]({link}) ({host})";

    fn default_entry(kind: EntryKind) -> &'static str {
        match kind {
            EntryKind::Bookmark => Self::BOOKMARK,
            EntryKind::Article => Self::ARTICLE,
            EntryKind::RssArticle => Self::RSS_ARTICLE,
        }
    }

    /// Load overrides from `dir` (`stream.md`, `stream-header.md` and
    /// `stream-<type>.md`), falling back to the defaults
    pub async fn load(dir: Option<&Path>) -> Result<Self> {
        let mut entries = HashMap::new();
        for kind in EntryKind::ALL {
            let file = format!("stream-{}.md", kind);
            let template = load_or_default(dir, &file, Self::default_entry(kind)).await?;
            entries.insert(kind, template);
        }

        Ok(Self {
            header: load_or_default(dir, "stream.md", Self::HEADER).await?,
            date_header: load_or_default(dir, "stream-header.md", Self::DATE_HEADER).await?,
            entries,
        })
    }

    /// Drop the template for one entry type
    pub fn without(mut self, kind: EntryKind) -> Self {
        self.entries.remove(&kind);
        self
    }
}

impl Default for StreamTemplates {
    fn default() -> Self {
        Self {
            header: Template::new(Self::HEADER),
            date_header: Template::new(Self::DATE_HEADER),
            entries: EntryKind::ALL
                .into_iter()
                .map(|kind| (kind, Template::new(Self::default_entry(kind))))
                .collect(),
        }
    }
}

/// Renders merged buckets as Markdown
#[derive(Debug, Clone, Default)]
pub struct StreamRenderer {
    templates: StreamTemplates,
    dates: DateStyle,
}

impl StreamRenderer {
    pub fn new(templates: StreamTemplates, dates: DateStyle) -> Self {
        Self { templates, dates }
    }

    /// Header followed by every bucket
    pub fn render_document(&self, buckets: &[DateBucket]) -> Result<String, RenderError> {
        let mut document = self.templates.header.render(&[]).trim().to_string();
        document.push('\n');
        document.push_str(&self.render(buckets)?);
        Ok(document)
    }

    /// Render buckets in the given order.
    ///
    /// An entry type without a template stops rendering with
    /// `RenderError::UnrecognizedType`.
    pub fn render(&self, buckets: &[DateBucket]) -> Result<String, RenderError> {
        let mut out = String::new();

        for bucket in buckets {
            let date = match NaiveDate::parse_from_str(&bucket.date, "%Y%m%d") {
                Ok(date) => self.dates.format_date(date),
                Err(_) => bucket.date.clone(),
            };
            push_block(&mut out, &self.templates.date_header.render(&[("date", date.as_str())]));

            for slot in &bucket.slots {
                for entry in &slot.entries {
                    let block = self.render_entry(entry)?;
                    push_block(&mut out, &block);
                }
            }
        }

        debug!(days = buckets.len(), "Rendered stream");
        Ok(out)
    }

    /// Render one entry through its type's template
    pub fn render_entry(&self, entry: &StreamEntry) -> Result<String, RenderError> {
        let kind = entry.kind();
        let template = self
            .templates
            .entries
            .get(&kind)
            .ok_or_else(|| RenderError::UnrecognizedType(kind.to_string()))?;

        let rendered = match entry {
            StreamEntry::Bookmark { bookmark, folder } => {
                let host = display_host(&bookmark.url);
                template.render(&[
                    ("title", bookmark.title.as_str()),
                    ("url", bookmark.url.as_str()),
                    ("host", host.as_str()),
                    ("folder", folder.as_str()),
                ])
            }
            StreamEntry::Article(article) => {
                let host = display_host(&article.original_url);
                let tags = article.tag_references();
                let archived = self.dates.format(article.archived_at);
                let mut block = template.render(&[
                    ("title", article.title.as_str()),
                    ("share_url", article.share_url.as_str()),
                    ("tags", tags.as_str()),
                    ("host", host.as_str()),
                    ("original_url", article.original_url.as_str()),
                    ("archived", archived.as_str()),
                ]);
                append_annotations(&mut block, article, template);
                block
            }
            StreamEntry::RssArticle(feed_entry) => {
                let host = display_host(&feed_entry.link);
                let authors = feed_entry.authors.join(", ");
                template.render(&[
                    ("title", feed_entry.title.as_str()),
                    ("link", feed_entry.link.as_str()),
                    ("host", host.as_str()),
                    ("description", feed_entry.description.as_str()),
                    ("authors", authors.as_str()),
                ])
            }
        };

        Ok(rendered)
    }
}

/// Annotations go one level below the entry's first line
fn append_annotations(block: &mut String, article: &Article, template: &Template) {
    if article.annotations.is_empty() {
        return;
    }

    let first_line = template.source().lines().next().unwrap_or_default();
    let lead: String = first_line.chars().take_while(|c| c.is_whitespace()).collect();

    block.push_str(&format!("\n{}\t- Annotations", lead));
    for annotation in &article.annotations {
        block.push_str(&format!("\n{}\t\t- > {}", lead, annotation.quote.trim()));
        let text = annotation.text.trim();
        if !text.is_empty() {
            block.push_str(&format!("\n{}\t\t  {}", lead, text));
        }
    }
}

/// Append a rendered block, dropping trailing whitespace from every line
fn push_block(out: &mut String, block: &str) {
    for line in block.lines() {
        out.push_str(line.trim_end());
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{parse_timestamp, Annotation, DEFAULT_TIMEZONE};

    fn article(title: &str, archived: &str) -> Article {
        Article {
            title: title.to_string(),
            original_url: "https://www.example.com/post".to_string(),
            archived_at: parse_timestamp(archived, DEFAULT_TIMEZONE).unwrap(),
            created_at: parse_timestamp("2023-12-01T08:00:00", DEFAULT_TIMEZONE).unwrap(),
            share_url: format!("https://read.example.com/share/{}", title),
            tags: Vec::new(),
            annotations: Vec::new(),
        }
    }

    #[test]
    fn test_entry_kind_round_trip_names() {
        for kind in EntryKind::ALL {
            assert_eq!(kind.as_str().parse::<EntryKind>().unwrap(), kind);
        }
        assert_eq!(
            "tweet".parse::<EntryKind>(),
            Err(RenderError::UnrecognizedType("tweet".to_string()))
        );
    }

    #[test]
    fn test_keys_follow_civil_zone() {
        let mut merger = StreamMerger::new(DateStyle::default());
        // 23:30 UTC is 00:30 the next day in Amsterdam
        merger.add_articles(vec![article("late", "2024-01-01T23:30:00Z")]);

        let buckets = merger.into_buckets();
        assert_eq!(buckets[0].date, "20240102");
        assert_eq!(buckets[0].slots[0].time, "003000");
    }

    #[test]
    fn test_same_timestamp_keeps_arrival_order() {
        let mut merger = StreamMerger::new(DateStyle::default());
        merger.add_articles(vec![
            article("first", "2024-01-02T10:00:00"),
            article("second", "2024-01-02T10:00:00"),
        ]);

        let buckets = merger.into_buckets();
        let titles: Vec<String> = buckets[0].slots[0]
            .entries
            .iter()
            .map(|e| match e {
                StreamEntry::Article(a) => a.title.clone(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(titles, vec!["first", "second"]);
    }

    #[test]
    fn test_annotations_are_nested_under_article() {
        let mut entry = article("annotated", "2024-01-02T10:00:00");
        entry.add_tag("rust");
        entry.annotations.push(Annotation {
            quote: "A quote".to_string(),
            text: "My note".to_string(),
        });
        entry.annotations.push(Annotation {
            quote: "Bare quote".to_string(),
            text: String::new(),
        });

        let block = StreamRenderer::default()
            .render_entry(&StreamEntry::Article(entry))
            .unwrap();
        assert_eq!(
            block,
            "\t- Read [annotated](https://read.example.com/share/annotated) #[[rust]]\n\
             \t  original article at [example.com](https://www.example.com/post)\n\
             \t\t- Annotations\n\
             \t\t\t- > A quote\n\
             \t\t\t  My note\n\
             \t\t\t- > Bare quote"
        );
    }
}
