//! Field extraction from lookup result pages
//!
//! The lookup site renders its answer as a two-column table of
//! `header | value` rows with no stable schema. Extraction is a best-effort
//! pass over those rows:
//!
//! - Pages with no `<table>` at all are a negative answer ([`ExtractError::NoTables`])
//! - Only tables matching the results-table selector are read
//! - Each row with at least two cells is matched against an ordered rule
//!   list on its header text; the first matching rule assigns the field
//! - Unmatched headers are ignored and unmatched fields stay absent
//!
//! Missing fields are expected and tolerated. False positives are kept down
//! by rule order and the negative condition on the bank-name rule.

use crate::identifier::Identifier;
use crate::lookup::record::{BankDetails, InstitutionRecord};
use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use std::borrow::Cow;
use thiserror::Error;
use url::Url;

/// Errors produced while reading a lookup page
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The body is binary rather than an HTML document
    #[error("malformed document: {0}")]
    Malformed(String),

    /// The document contains no tables, i.e. the site found nothing
    #[error("no tables")]
    NoTables,

    /// A selector failed to compile
    #[error("invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },
}

/// Target field of an extraction rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    SwiftCode,
    BankName,
    Country,
    City,
    Branch,
    Address,
}

/// Header predicate paired with the field it assigns
struct Rule {
    field: Field,
    matches: fn(&str) -> bool,
}

fn is_swift_header(header: &str) -> bool {
    header.contains("Swift") || header.contains("BIC")
}

// "Bank Code" rows carry the national sort code, not the bank's name.
fn is_bank_name_header(header: &str) -> bool {
    header.contains("Bank") && !header.to_lowercase().contains("code")
}

fn is_country_header(header: &str) -> bool {
    header.contains("Country")
}

fn is_city_header(header: &str) -> bool {
    header.contains("City")
}

fn is_branch_header(header: &str) -> bool {
    header.contains("Branch")
}

fn is_address_header(header: &str) -> bool {
    header.contains("Address")
}

/// Extraction rules in priority order
const RULES: [Rule; 6] = [
    Rule {
        field: Field::SwiftCode,
        matches: is_swift_header,
    },
    Rule {
        field: Field::BankName,
        matches: is_bank_name_header,
    },
    Rule {
        field: Field::Country,
        matches: is_country_header,
    },
    Rule {
        field: Field::City,
        matches: is_city_header,
    },
    Rule {
        field: Field::Branch,
        matches: is_branch_header,
    },
    Rule {
        field: Field::Address,
        matches: is_address_header,
    },
];

/// Returns the field a header maps to, if any
fn classify_header(header: &str) -> Option<Field> {
    RULES
        .iter()
        .find(|rule| (rule.matches)(header))
        .map(|rule| rule.field)
}

fn compile(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Text content with each text node trimmed and empty nodes dropped
fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Extracts institution fields from lookup result pages
#[derive(Debug, Clone)]
pub struct Extractor {
    base_url: Url,
    any_table: Selector,
    results_table: Selector,
    row: Selector,
    cell: Selector,
    link: Selector,
    title: Selector,
}

impl Extractor {
    /// Default selector for the site's results table
    pub const DEFAULT_TABLE_SELECTOR: &'static str = "table.table";

    /// Creates an extractor
    ///
    /// # Arguments
    ///
    /// * `base_url` - Site base URL used to absolutize Swift code links
    /// * `results_table_selector` - CSS selector for the results table(s)
    pub fn new(base_url: Url, results_table_selector: &str) -> Result<Self, ExtractError> {
        Ok(Self {
            base_url,
            any_table: compile("table")?,
            results_table: compile(results_table_selector)?,
            row: compile("tr")?,
            cell: compile("th, td")?,
            link: compile("a")?,
            title: compile("title")?,
        })
    }

    /// Extracts fields and stamps them with the identifier and capture time
    ///
    /// # Example
    ///
    /// ```
    /// use iban_probe::lookup::Extractor;
    /// use iban_probe::Identifier;
    /// use url::Url;
    ///
    /// let extractor = Extractor::new(
    ///     Url::parse("https://bank-code.net").unwrap(),
    ///     Extractor::DEFAULT_TABLE_SELECTOR,
    /// )
    /// .unwrap();
    /// let html = br#"<table class="table"><tr><td>Swift Code</td><td>AAAAROBU</td></tr></table>"#;
    /// let id = Identifier::normalize("RO49AAAA1B31007593840000").unwrap();
    ///
    /// let record = extractor.extract(html, &id).unwrap();
    /// assert_eq!(record.swift_code(), Some("AAAAROBU"));
    /// ```
    pub fn extract(
        &self,
        document: &[u8],
        identifier: &Identifier,
    ) -> Result<InstitutionRecord, ExtractError> {
        let details = self.extract_details(document)?;
        Ok(InstitutionRecord {
            source_identifier: identifier.clone(),
            resolved_at: Utc::now(),
            details,
        })
    }

    /// Extracts fields from a document without stamping
    ///
    /// Deterministic: the same bytes always yield the same details.
    pub fn extract_details(&self, document: &[u8]) -> Result<BankDetails, ExtractError> {
        let text = String::from_utf8_lossy(document);
        if let Cow::Owned(_) = text {
            tracing::debug!("Body is not valid UTF-8; undecodable bytes replaced");
        }
        if text.contains('\0') {
            return Err(ExtractError::Malformed(
                "body contains NUL bytes and is not an HTML document".to_string(),
            ));
        }
        let html = Html::parse_document(&text);

        if let Some(title) = html.select(&self.title).next() {
            tracing::trace!("Page title: {}", stripped_text(title));
        }

        let table_count = html.select(&self.any_table).count();
        if table_count == 0 {
            tracing::debug!("No tables found on page");
            return Err(ExtractError::NoTables);
        }

        let mut details = BankDetails::default();
        let mut results_tables = 0;

        for table in html.select(&self.results_table) {
            results_tables += 1;
            for row in table.select(&self.row) {
                self.apply_row(row, &mut details);
            }
        }

        tracing::debug!(
            tables = table_count,
            results_tables,
            fields = details.field_count(),
            "Extracted lookup page"
        );

        Ok(details)
    }

    /// Assigns at most one field from a table row
    fn apply_row(&self, row: ElementRef<'_>, details: &mut BankDetails) {
        let mut cells = row.select(&self.cell);
        let (Some(header_cell), Some(value_cell)) = (cells.next(), cells.next()) else {
            return;
        };

        let header = stripped_text(header_cell);
        let Some(field) = classify_header(&header) else {
            return;
        };

        let slot = match field {
            Field::SwiftCode => {
                self.apply_swift_cell(value_cell, details);
                return;
            }
            Field::BankName => &mut details.bank_name,
            Field::Country => &mut details.country,
            Field::City => &mut details.city,
            Field::Branch => &mut details.branch,
            Field::Address => &mut details.address,
        };
        *slot = Some(stripped_text(value_cell));
    }

    /// Reads the Swift code, preferring a link's visible text
    fn apply_swift_cell(&self, value_cell: ElementRef<'_>, details: &mut BankDetails) {
        match value_cell.select(&self.link).next() {
            Some(link) => {
                details.swift_code = Some(stripped_text(link));
                details.swift_url = link
                    .value()
                    .attr("href")
                    .and_then(|href| self.absolutize(href));
            }
            None => {
                details.swift_code = Some(stripped_text(value_cell));
            }
        }
    }

    /// Resolves scheme-relative, root-relative, and relative links against the base URL
    fn absolutize(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        self.base_url.join(href).ok().map(|url| url.to_string())
    }
}
