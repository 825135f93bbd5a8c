//! Local text books: the stored list, import, decoding and chapter split.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::settings::user_keys;
use crate::store::KvStore;

/// Chapter headings such as `第十二章 归来` or `Chapter 3`.
pub const DEFAULT_CHAPTER_REGEX: &str =
    r"^\s*(第[0-9零〇一二两三四五六七八九十百千万]+[章回节卷集部篇]|[Cc]hapter\s+\d+).*$";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingPosition {
    pub paragraph_index: usize,
    pub character_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub name: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_chapter: Option<usize>,
    #[serde(default)]
    pub last_page: ReadingPosition,
    #[serde(default = "default_chapter_regex")]
    pub chapter_title_reg_exp: String,
}

fn default_chapter_regex() -> String {
    DEFAULT_CHAPTER_REGEX.to_string()
}

impl Book {
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_stem()
            .unwrap_or_else(|| path.as_os_str())
            .to_string_lossy()
            .into_owned();
        Self {
            name,
            path: path.to_string_lossy().into_owned(),
            last_chapter: None,
            last_page: ReadingPosition::default(),
            chapter_title_reg_exp: default_chapter_regex(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chapter {
    pub title: String,
    pub content: String,
}

impl Chapter {
    /// Paragraphs are the lines of `content`; reading positions index into them.
    pub fn paragraph_count(&self) -> usize {
        self.content.lines().count()
    }
}

/// Chapter and paragraph a book reopens at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumePoint {
    pub chapter: usize,
    #[serde(flatten)]
    pub position: ReadingPosition,
}

/// The saved place in `book`, clamped to `chapters`. A chapter that no longer
/// exists starts over at the last chapter's first paragraph.
pub fn resume_point(book: &Book, chapters: &[Chapter]) -> ResumePoint {
    let Some(last) = chapters.len().checked_sub(1) else {
        return ResumePoint::default();
    };
    let saved = book.last_chapter.unwrap_or(0);
    if saved > last {
        return ResumePoint {
            chapter: last,
            position: ReadingPosition::default(),
        };
    }

    let paragraphs = chapters[saved].paragraph_count();
    let mut position = book.last_page;
    if position.paragraph_index >= paragraphs {
        position = ReadingPosition {
            paragraph_index: paragraphs.saturating_sub(1),
            character_index: 0,
        };
    }
    ResumePoint {
        chapter: saved,
        position,
    }
}

pub fn load_list(store: &KvStore) -> Vec<Book> {
    store.get_as(user_keys::BOOK_LIST, Vec::new())
}

pub fn save_list(store: &KvStore, books: &[Book]) {
    match serde_json::to_value(books) {
        Ok(value) => store.set_logged(user_keys::BOOK_LIST, value),
        Err(e) => warn!(error = %e, "Failed to serialize book list"),
    }
}

/// Append a book for every path not already in `books`. Returns how many were added.
pub fn merge_paths<I>(books: &mut Vec<Book>, paths: I) -> usize
where
    I: IntoIterator<Item = PathBuf>,
{
    let before = books.len();
    for path in paths {
        let book = Book::from_path(&path);
        if books.iter().any(|existing| existing.path == book.path) {
            debug!(path = %book.path, "Book already imported");
            continue;
        }
        books.push(book);
    }
    books.len() - before
}

/// Decode `bytes` with a BOM, valid UTF-8, or a statistical guess, in that order.
pub fn decode_text(bytes: &[u8]) -> (Cow<'_, str>, &'static Encoding) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return (text, encoding);
    }
    if let Ok(text) = std::str::from_utf8(bytes) {
        return (Cow::Borrowed(text), UTF_8);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors && encoding != UTF_8 {
        debug!(encoding = encoding.name(), "Guessed encoding produced replacements");
    }
    (text, encoding)
}

/// Full text of the book at `path`. A missing or unreadable file reads as empty.
pub fn read_content(path: &Path) -> String {
    match fs::read(path) {
        Ok(bytes) => {
            let (text, encoding) = decode_text(&bytes);
            debug!(path = %path.display(), encoding = encoding.name(), "Decoded book");
            text.into_owned()
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Book content unavailable");
            String::new()
        }
    }
}

/// Split `text` at lines matching `pattern`.
///
/// Text before the first heading becomes an untitled chapter. A pattern that
/// does not compile, or that matches nothing, yields the whole text as one chapter.
pub fn split_chapters(text: &str, pattern: &str) -> Vec<Chapter> {
    let whole = || {
        vec![Chapter {
            title: String::new(),
            content: text.to_string(),
        }]
    };

    let regex = match Regex::new(&format!("(?m){pattern}")) {
        Ok(regex) => regex,
        Err(e) => {
            warn!(pattern, error = %e, "Invalid chapter title pattern");
            return whole();
        }
    };

    let headings: Vec<_> = regex.find_iter(text).filter(|m| !m.as_str().trim().is_empty()).collect();
    if headings.is_empty() {
        return whole();
    }

    let mut chapters = Vec::with_capacity(headings.len() + 1);
    let preface = &text[..headings[0].start()];
    if !preface.trim().is_empty() {
        chapters.push(Chapter {
            title: String::new(),
            content: preface.trim_matches(['\r', '\n']).to_string(),
        });
    }

    for (i, heading) in headings.iter().enumerate() {
        let end = headings.get(i + 1).map_or(text.len(), |next| next.start());
        chapters.push(Chapter {
            title: heading.as_str().trim().to_string(),
            content: text[heading.end()..end].trim_matches(['\r', '\n']).to_string(),
        });
    }
    chapters
}
