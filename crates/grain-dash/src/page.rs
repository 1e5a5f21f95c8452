//! Server-side rendering of the dashboard page.
//!
//! One surface: the price-entry form plus the recent-entries list. All
//! service-sourced text is escaped, and an entry whose embedded market or
//! commodity is missing renders a fallback label instead of failing the
//! rest of the list.

use grain_common::{PriceEntryRow, QualityGrade};

use crate::controller::{Notice, ViewState};

/// Fallback label for an entry whose embedded reference did not resolve.
const UNKNOWN_NAME: &str = "(unknown)";

/// Escape text for HTML body and attribute positions.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the full dashboard page.
pub fn render_page(state: &ViewState) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n<title>Grain Price Tracker</title>\n");
    html.push_str("</head>\n<body>\n<h1>Grain Price Tracker</h1>\n");

    if let Some(notice) = &state.notice {
        html.push_str(&render_notice(notice));
    }

    html.push_str(&render_form(state));
    html.push_str(&render_entries(&state.entries));
    html.push_str("</body>\n</html>\n");
    html
}

fn render_notice(notice: &Notice) -> String {
    match notice {
        Notice::Success(text) => {
            format!("<p class=\"notice success\">{}</p>\n", escape(text))
        }
        Notice::Error(text) => {
            format!("<p class=\"notice error\">Error adding price: {}</p>\n", escape(text))
        }
    }
}

fn render_form(state: &ViewState) -> String {
    let mut html = String::new();
    html.push_str("<section class=\"entry-form\">\n<h2>Add Price Entry</h2>\n");
    html.push_str("<form method=\"post\" action=\"/submit\">\n");

    // Market selector
    html.push_str("<label>Market:\n<select name=\"market_id\" required>\n");
    html.push_str("<option value=\"\">Select Market</option>\n");
    for market in &state.markets {
        let selected = if state.draft.market_id == market.id.to_string() {
            " selected"
        } else {
            ""
        };
        html.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>\n",
            market.id,
            selected,
            escape(&market.name)
        ));
    }
    html.push_str("</select>\n</label>\n");

    // Commodity selector
    html.push_str("<label>Commodity:\n<select name=\"commodity_id\" required>\n");
    html.push_str("<option value=\"\">Select Commodity</option>\n");
    for commodity in &state.commodities {
        let selected = if state.draft.commodity_id == commodity.id.to_string() {
            " selected"
        } else {
            ""
        };
        html.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>\n",
            commodity.id,
            selected,
            escape(&commodity.name)
        ));
    }
    html.push_str("</select>\n</label>\n");

    // Price input
    html.push_str(&format!(
        "<label>Price (\u{20a6} per bag):\n<input type=\"number\" name=\"price\" step=\"any\" \
         value=\"{}\" placeholder=\"Enter price\" required>\n</label>\n",
        escape(&state.draft.price)
    ));

    // Quality grade selector
    html.push_str("<label>Quality Grade:\n<select name=\"quality_grade\">\n");
    for grade in QualityGrade::ALL {
        let selected = if state.draft.quality_grade == grade {
            " selected"
        } else {
            ""
        };
        html.push_str(&format!(
            "<option value=\"{0}\"{1}>Grade {0}</option>\n",
            grade.as_str(),
            selected
        ));
    }
    html.push_str("</select>\n</label>\n");

    html.push_str("<button type=\"submit\">Add Price Entry</button>\n</form>\n</section>\n");
    html
}

fn render_entries(entries: &[PriceEntryRow]) -> String {
    let mut html = String::new();
    html.push_str("<section class=\"recent-entries\">\n<h2>Recent Price Entries</h2>\n<ul>\n");
    for entry in entries {
        html.push_str(&render_entry(entry));
    }
    html.push_str("</ul>\n</section>\n");
    html
}

fn render_entry(entry: &PriceEntryRow) -> String {
    let market = entry.market_name().unwrap_or(UNKNOWN_NAME);
    let commodity = entry.commodity_name().unwrap_or(UNKNOWN_NAME);
    let timestamp = entry.created_at.format("%Y-%m-%d %H:%M:%S UTC");

    format!(
        "<li class=\"entry\"><strong>{}</strong> &ndash; {}<br>\
         Price: \u{20a6}{} per bag | Quality: {}<br>\
         <small>{}</small></li>\n",
        escape(market),
        escape(commodity),
        entry.price,
        entry.quality_grade.as_str(),
        timestamp
    )
}
