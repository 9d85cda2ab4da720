use std::fmt::Write;

use chrono::NaiveDate;

use crate::aggregator::AggregateResult;

/// Render the aggregated result as a markdown digest: one section per
/// source with a numbered title/link list. Sources with no items are
/// omitted. Output is deterministic because the result orders its keys.
pub fn render(result: &AggregateResult) -> String {
    let mut out = String::new();
    for (source, items) in result {
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(out, "## {source}\n");
        for (i, item) in items.iter().enumerate() {
            let _ = writeln!(out, "{}. [{}]({})", i + 1, item.title, item.url);
        }
        out.push('\n');
    }
    out
}

/// Full digest document: a date heading followed by the rendered sections.
pub fn render_document(date: NaiveDate, result: &AggregateResult) -> String {
    format!("# {}\n\n{}", date.format("%Y-%m-%d"), render(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewsItem;
    use chrono::Utc;

    fn item(title: &str, url: &str) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            url: url.to_string(),
            description: String::new(),
            source: "Test".to_string(),
            sub_source: None,
            published_at: Utc::now(),
            score: 0,
            comments: 0,
        }
    }

    #[test]
    fn renders_numbered_sections_and_skips_empty_sources() {
        let mut result = AggregateResult::new();
        result.insert("A".to_string(), vec![item("T1", "u1")]);
        result.insert("B".to_string(), Vec::new());

        let text = render(&result);
        assert_eq!(text, "## A\n\n1. [T1](u1)\n\n");
        assert!(!text.contains("## B"));
    }

    #[test]
    fn renders_sources_in_key_order() {
        let mut result = AggregateResult::new();
        result.insert("zebra".to_string(), vec![item("Z", "uz")]);
        result.insert("alpha".to_string(), vec![item("A", "ua")]);

        let text = render(&result);
        let alpha = text.find("## alpha").unwrap();
        let zebra = text.find("## zebra").unwrap();
        assert!(alpha < zebra);
    }

    #[test]
    fn document_starts_with_the_date_heading() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 4).unwrap();
        let mut result = AggregateResult::new();
        result.insert("A".to_string(), vec![item("T1", "u1")]);

        let text = render_document(date, &result);
        assert!(text.starts_with("# 2025-07-04\n\n## A\n"));
    }
}
