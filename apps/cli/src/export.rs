//! Report rendering: paginated text table, JSON and CSV.

use chrono::NaiveDate;
use orphanscan_core::PageDetails;
use serde_json::json;

/// CSV header row, in column order.
const CSV_HEADER: [&str; 9] = [
    "ID",
    "Type",
    "URL",
    "Title",
    "Published Date",
    "Modified Date",
    "Categories",
    "Tags",
    "Author",
];

/// Default export file name for a given day.
pub(crate) fn default_csv_name(date: NaiveDate) -> String {
    format!("orphan-pages-{}.csv", date.format("%Y-%m-%d"))
}

/// Quote a field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_line(fields: &[&str]) -> String {
    let mut line = fields.iter().map(|f| csv_field(f)).collect::<Vec<_>>().join(",");
    line.push('\n');
    line
}

pub(crate) fn render_csv(rows: &[PageDetails]) -> String {
    let mut out = csv_line(&CSV_HEADER);
    for row in rows {
        let id = row.id.to_string();
        out.push_str(&csv_line(&[
            id.as_str(),
            row.type_label.as_str(),
            row.url.as_str(),
            row.title.as_str(),
            row.published.as_str(),
            row.modified.as_str(),
            row.categories.as_str(),
            row.tags.as_str(),
            row.author.as_str(),
        ]));
    }
    out
}

pub(crate) fn render_json(cache_key: &str, rows: &[PageDetails]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&json!({
        "cache_key": cache_key,
        "total": rows.len(),
        "orphans": rows,
    }))
}

/// Position of a text page within the whole result.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PageWindow {
    pub page: usize,
    pub page_count: usize,
    pub total: usize,
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut cut: String = value.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

pub(crate) fn render_text(rows: &[PageDetails], window: PageWindow) -> String {
    if window.total == 0 {
        return "No orphan pages found.\n".to_string();
    }

    let mut out = format!(
        "{} orphan page(s), page {} of {}\n\n",
        window.total,
        window.page,
        window.page_count.max(1)
    );
    if rows.is_empty() {
        out.push_str("  (no entries on this page)\n");
        return out;
    }

    out.push_str(&format!(
        "  {:<8} {:<8} {:<32} {:<16} {}\n",
        "ID", "Type", "Title", "Published", "URL"
    ));
    for row in rows {
        out.push_str(&format!(
            "  {:<8} {:<8} {:<32} {:<16} {}\n",
            row.id.to_string(),
            row.type_label,
            truncate(&row.title, 32),
            row.published,
            row.url
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use orphanscan_shared::PageId;

    use super::*;

    fn row(id: u64, title: &str) -> PageDetails {
        PageDetails {
            id: PageId(id),
            type_label: "Page".into(),
            url: format!("https://example.com/{id}/"),
            title: title.into(),
            published: "2024-03-01 12:30".into(),
            modified: "2024-03-02 08:00".into(),
            categories: "News, Updates".into(),
            tags: String::new(),
            author: "Ada".into(),
        }
    }

    #[test]
    fn csv_has_header_and_quotes() {
        let csv = render_csv(&[row(7, r#"Say "hi""#)]);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "ID,Type,URL,Title,Published Date,Modified Date,Categories,Tags,Author"
        );
        assert_eq!(
            lines.next().unwrap(),
            r#"7,Page,https://example.com/7/,"Say ""hi""",2024-03-01 12:30,2024-03-02 08:00,"News, Updates",,Ada"#
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn deleted_rows_export() {
        let csv = render_csv(&[PageDetails::deleted(PageId(9), "https://example.com/gone/")]);
        assert!(csv.contains("9,Deleted,https://example.com/gone/,Page Not Found,N/A,N/A,,,N/A"));
    }

    #[test]
    fn csv_file_name_uses_date() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 4).unwrap();
        assert_eq!(default_csv_name(date), "orphan-pages-2024-07-04.csv");
    }

    #[test]
    fn json_lists_rows() {
        let text = render_json("orphans_all_redirect_url_none", &[row(1, "About")]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["total"], 1);
        assert_eq!(value["orphans"][0]["type"], "Page");
        assert_eq!(value["orphans"][0]["id"], 1);
    }

    #[test]
    fn text_reports_empty_and_paged_results() {
        let empty = render_text(&[], PageWindow { page: 1, page_count: 0, total: 0 });
        assert_eq!(empty, "No orphan pages found.\n");

        let text = render_text(&[row(3, "Pricing")], PageWindow { page: 2, page_count: 2, total: 21 });
        assert!(text.starts_with("21 orphan page(s), page 2 of 2"));
        assert!(text.contains("Pricing"));

        let past_end = render_text(&[], PageWindow { page: 5, page_count: 2, total: 21 });
        assert!(past_end.contains("no entries on this page"));
    }
}
