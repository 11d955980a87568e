use scraper::{Html, Selector};

use crate::error::{Error, Result};
use crate::utils::clean_cell;

/// Anchor id carrying the last-page link on paginated source pages.
const LAST_PAGE_ANCHOR: &str = "a#quotes_content_left_lb_LastPage";

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Parse(format!("Bad selector '{}': {}", css, e)))
}

/// Extract the data table from a symbol page as a 2D grid of cleaned cell
/// text. A page without the expected container yields an empty row set,
/// which signals "no data" upstream rather than an error.
pub fn extract_rows(html: &str) -> Result<Vec<Vec<String>>> {
    let doc = Html::parse_document(html);

    let container_sel = selector("div.genTable")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("td")?;

    let Some(container) = doc.select(&container_sel).next() else {
        return Ok(Vec::new());
    };

    Ok(container
        .select(&row_sel)
        .map(|row| {
            row.select(&cell_sel)
                .map(|cell| clean_cell(&cell.text().collect::<String>()))
                .collect()
        })
        .collect())
}

/// Last-page number from the pagination indicator, taken from the `page=`
/// value in the anchor's href. A missing or unparseable indicator means the
/// source has a single page.
pub fn last_page(html: &str) -> Option<u32> {
    let doc = Html::parse_document(html);
    let anchor_sel = Selector::parse(LAST_PAGE_ANCHOR).ok()?;

    let href = doc.select(&anchor_sel).next()?.value().attr("href")?;
    let (_, tail) = href.split_once("page=")?;
    let digits: String = tail.chars().take_while(|c| c.is_ascii_digit()).collect();

    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(table_body: &str) -> String {
        format!("<html><body><div class=\"genTable\"><table>{}</table></div></body></html>", table_body)
    }

    #[test]
    fn test_extract_rows_cleans_cells() {
        let html = page(
            "<tr><td> 11/18/2018\r\n</td><td>120.30</td></tr>\
             <tr><td>11/19/2018</td><td>121.00</td></tr>",
        );

        let rows = extract_rows(&html).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["11/18/2018", "120.30"]);
    }

    #[test]
    fn test_extract_rows_missing_container_is_empty() {
        let html = "<html><body><p>No data for this symbol</p></body></html>";
        assert!(extract_rows(html).unwrap().is_empty());
    }

    #[test]
    fn test_extract_rows_keeps_embedded_newlines() {
        let html = page("<tr><td>first\nline</td></tr>");
        let rows = extract_rows(&html).unwrap();
        assert_eq!(rows[0][0], "first\nline");
    }

    #[test]
    fn test_last_page_from_indicator() {
        let html = format!(
            "{}<a id=\"quotes_content_left_lb_LastPage\" href=\"?symbol=abc&page=7\">Last</a>",
            page("<tr><td>x</td></tr>")
        );
        assert_eq!(last_page(&html), Some(7));
    }

    #[test]
    fn test_last_page_absent_means_single_page() {
        assert_eq!(last_page(&page("<tr><td>x</td></tr>")), None);
    }

    #[test]
    fn test_last_page_unparseable_means_single_page() {
        let html = "<a id=\"quotes_content_left_lb_LastPage\" href=\"?page=\">Last</a>";
        assert_eq!(last_page(html), None);
    }
}
