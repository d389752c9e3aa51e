//! `efetch` XML (`PubmedArticleSet`) to [`PubMedRecord`]s.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::client::PubMedError;
use super::types::PubMedRecord;

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Fields collected while inside one `PubmedArticle` or `PubmedBookArticle`.
#[derive(Default)]
struct RecordBuilder {
    pmid: Option<String>,
    article_title: String,
    book_title: String,
    journal: Option<String>,
    year: String,
    month: String,
    day: String,
    medline_date: String,
    doi: Option<String>,
    elocation_doi: Option<String>,
    abstract_parts: Vec<String>,
    abstract_part: String,
}

impl RecordBuilder {
    fn text(&mut self, path: &[String], text: &str, doi_id: bool) {
        if ends_with(path, &["MedlineCitation", "PMID"]) || ends_with(path, &["BookDocument", "PMID"]) {
            if self.pmid.is_none() {
                self.pmid = Some(text.trim().to_string());
            }
        } else if contains(path, "ArticleTitle") {
            self.article_title.push_str(text);
        } else if contains(path, "BookTitle") {
            self.book_title.push_str(text);
        } else if ends_with(path, &["Journal", "Title"]) {
            self.journal.get_or_insert_with(String::new).push_str(text);
        } else if contains(path, "PubDate") {
            match path.last().map(String::as_str) {
                Some("Year") => self.year.push_str(text),
                Some("Month") => self.month.push_str(text),
                Some("Day") => self.day.push_str(text),
                Some("MedlineDate") => self.medline_date.push_str(text),
                _ => {}
            }
        } else if contains(path, "AbstractText") && contains(path, "Abstract") {
            self.abstract_part.push_str(text);
        } else if doi_id
            && (ends_with(path, &["PubmedData", "ArticleIdList", "ArticleId"])
                || ends_with(path, &["PubmedBookData", "ArticleIdList", "ArticleId"]))
        {
            self.doi.get_or_insert_with(String::new).push_str(text);
        } else if doi_id && ends_with(path, &["Article", "ELocationID"]) {
            self.elocation_doi.get_or_insert_with(String::new).push_str(text);
        }
    }

    fn end_abstract_text(&mut self) {
        let part = std::mem::take(&mut self.abstract_part);
        let part = part.trim();
        if !part.is_empty() {
            self.abstract_parts.push(part.to_string());
        }
    }

    fn finish(self) -> Option<PubMedRecord> {
        let pmid = self.pmid.filter(|p| !p.is_empty())?;
        let abstract_text = if self.abstract_parts.is_empty() {
            None
        } else {
            Some(self.abstract_parts.join("\n"))
        };
        Some(PubMedRecord {
            pmid,
            title: non_empty(self.article_title).or_else(|| non_empty(self.book_title)),
            journal: self.journal.map(|j| j.trim().to_string()),
            publication_date: format_pub_date(&self.year, &self.month, &self.day, &self.medline_date),
            doi: self.doi.and_then(non_empty).or_else(|| self.elocation_doi.and_then(non_empty)),
            abstract_text,
        })
    }
}

fn ends_with(path: &[String], suffix: &[&str]) -> bool {
    path.len() >= suffix.len()
        && path[path.len() - suffix.len()..]
            .iter()
            .zip(suffix)
            .all(|(a, b)| a == b)
}

fn contains(path: &[String], name: &str) -> bool {
    path.iter().any(|p| p == name)
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

/// True when the element is an `ArticleId IdType="doi"` or `ELocationID EIdType="doi"`.
fn is_doi_id(e: &BytesStart<'_>) -> bool {
    let attr = match e.local_name().as_ref() {
        b"ArticleId" => "IdType",
        b"ELocationID" => "EIdType",
        _ => return false,
    };
    e.try_get_attribute(attr)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(Cow::into_owned))
        .is_some_and(|v| v.eq_ignore_ascii_case("doi"))
}

fn month_number(month: &str) -> Option<u8> {
    if let Ok(n) = month.parse::<u8>() {
        return (1..=12).contains(&n).then_some(n);
    }
    let prefix = month.get(..3)?.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == prefix)
        .and_then(|i| u8::try_from(i + 1).ok())
}

/// `YYYY`, `YYYY-MM` or `YYYY-MM-DD` from the structured date, falling back
/// to the free-text `MedlineDate` (e.g. `2019 Nov-Dec`).
fn format_pub_date(year: &str, month: &str, day: &str, medline_date: &str) -> Option<String> {
    let year = year.trim();
    if year.is_empty() {
        return non_empty(medline_date.to_string());
    }
    let mut date = year.to_string();
    if let Some(m) = month_number(month.trim()) {
        date.push_str(&format!("-{m:02}"));
        if let Ok(d) = day.trim().parse::<u8>()
            && (1..=31).contains(&d)
        {
            date.push_str(&format!("-{d:02}"));
        }
    }
    Some(date)
}

/// Parse a `PubmedArticleSet` document. Records without a PMID are skipped.
pub fn parse_article_set(xml: &str) -> Result<Vec<PubMedRecord>, PubMedError> {
    let mut reader = Reader::from_str(xml);
    let mut records = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut current: Option<RecordBuilder> = None;
    let mut doi_id = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            PubMedError::Parse(format!(
                "efetch XML at byte {}: {e}",
                reader.buffer_position()
            ))
        })?;
        match event {
            Event::Start(e) => {
                let name = local_name(&e);
                if name == "PubmedArticle" || name == "PubmedBookArticle" {
                    current = Some(RecordBuilder::default());
                }
                doi_id = is_doi_id(&e);
                path.push(name);
            }
            Event::Text(e) => {
                if let Some(builder) = current.as_mut() {
                    let text = e
                        .unescape()
                        .map(Cow::into_owned)
                        .unwrap_or_else(|_| String::from_utf8_lossy(&e).into_owned());
                    builder.text(&path, &text, doi_id);
                }
            }
            Event::CData(e) => {
                if let Some(builder) = current.as_mut() {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    builder.text(&path, &text, doi_id);
                }
            }
            Event::End(e) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"AbstractText" => {
                        if let Some(builder) = current.as_mut() {
                            builder.end_abstract_text();
                        }
                    }
                    b"PubmedArticle" | b"PubmedBookArticle" => {
                        if let Some(record) = current.take().and_then(RecordBuilder::finish) {
                            records.push(record);
                        }
                    }
                    _ => {}
                }
                doi_id = false;
                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(records)
}
