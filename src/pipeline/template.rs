//! HTML rendering of a [`StructuredReport`] through a Tera template.
//!
//! The template is registered under a `.html` name so Tera autoescapes every
//! substituted value: model output goes into the page as text, never markup.
//! The stylesheet carries the page geometry (A4, 2.5 cm margins, running
//! header and page-number footer) used by the PDF layout in [`super::render`].

use crate::error::ReportError;
use crate::report::StructuredReport;
use std::error::Error as _;
use tera::{Context, Tera};
use tracing::debug;

const TEMPLATE_NAME: &str = "report.html";

/// Running header text on every page.
pub const HEADER_TEXT: &str = "CONFIDENTIAL | Inuvaira";

const REPORT_CSS: &str = r#"
@page {
    size: A4;
    margin: 2.5cm;
    @top-right {
        content: "CONFIDENTIAL | Inuvaira";
        font-family: 'Helvetica', sans-serif;
        font-size: 8pt;
        color: #7f8c8d;
    }
    @bottom-center {
        content: "Page " counter(page);
        font-family: 'Helvetica', sans-serif;
        font-size: 9pt;
        color: #7f8c8d;
    }
}
body { font-family: 'Helvetica', sans-serif; color: #333; line-height: 1.6; font-size: 11pt; }
.cover-page { text-align: center; padding-top: 35%; break-after: page; }
h1.title { font-size: 36pt; color: #2c3e50; margin-bottom: 20px; font-weight: bold; }
.subtitle { font-size: 16pt; color: #7f8c8d; margin-bottom: 15px; }
.author-line { font-size: 14pt; color: #2980b9; margin-bottom: 60px; font-weight: bold; }
h2 { color: #2980b9; border-bottom: 2px solid #eee; padding-bottom: 10px; margin-top: 35px; }
table { width: 100%; border-collapse: collapse; margin: 25px 0; font-size: 10pt; border: 1px solid #eee; }
thead tr { background-color: #2c3e50; color: #ffffff; text-align: left; }
th, td { padding: 12px 15px; border-bottom: 1px solid #ddd; }
tbody tr:nth-of-type(even) { background-color: #f8f9fa; }
tbody tr:last-of-type { border-bottom: 2px solid #2c3e50; }
"#;

const REPORT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>{{ data.meta.title }}</title>
    <meta charset="utf-8">
    <style>{{ css | safe }}</style>
</head>
<body>
    <div class="cover-page">
        <h1 class="title">{{ data.meta.title }}</h1>
        <div class="subtitle">Prepared for: {{ data.meta.client }}</div>
        <div class="author-line">Report Author: {{ data.meta.author }}</div>
        <p><strong>Date:</strong> {{ data.meta.date }}</p>
    </div>
{% for section in data.sections %}
    <div class="section">
        <h2>{{ section.heading }}</h2>
        <p>{{ section.content }}</p>
{%- if section.table_data %}
        <table>
            <thead>
                <tr>{% for col in section.table_data.columns %}<th>{{ col }}</th>{% endfor %}</tr>
            </thead>
            <tbody>
{%- for row in section.table_data.rows %}
                <tr>{% for cell in row %}<td>{{ cell }}</td>{% endfor %}</tr>
{%- endfor %}
            </tbody>
        </table>
{%- endif %}
    </div>
{% endfor %}
</body>
</html>
"#;

/// Render `report` to a complete HTML document.
pub fn render_html(report: &StructuredReport) -> Result<String, ReportError> {
    let mut tera = Tera::default();
    tera.add_raw_template(TEMPLATE_NAME, REPORT_TEMPLATE)
        .map_err(template_error)?;

    let mut ctx = Context::new();
    ctx.insert("data", report);
    ctx.insert("css", REPORT_CSS);

    let html = tera.render(TEMPLATE_NAME, &ctx).map_err(template_error)?;
    debug!(
        "Rendered HTML for '{}' ({} sections, {} bytes)",
        report.meta.title,
        report.sections.len(),
        html.len()
    );
    Ok(html)
}

/// Tera puts the useful part of the message in the source chain.
fn template_error(e: tera::Error) -> ReportError {
    let mut detail = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        detail.push_str(": ");
        detail.push_str(&s.to_string());
        source = s.source();
    }
    ReportError::TemplateFailed { detail }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ReportMeta, Section, Table};

    fn report() -> StructuredReport {
        StructuredReport {
            meta: ReportMeta {
                title: "Strategic Overview".into(),
                client: "Internal Report".into(),
                author: "Jane Doe".into(),
                date: "2026-01-06".into(),
            },
            sections: vec![
                Section {
                    heading: "Summary".into(),
                    content: "Costs are down.".into(),
                    table_data: None,
                },
                Section {
                    heading: "Financials".into(),
                    content: "Key figures.".into(),
                    table_data: Table::new(
                        vec!["Metric".into(), "Value".into()],
                        vec![
                            vec!["Costs".into(), "50000".into()],
                            vec!["Revenue".into(), "120000".into()],
                        ],
                    ),
                },
                Section {
                    heading: "Outlook".into(),
                    content: "Positive.".into(),
                    table_data: None,
                },
            ],
        }
    }

    #[test]
    fn cover_page_fields() {
        let html = render_html(&report()).unwrap();
        assert!(html.contains("<h1 class=\"title\">Strategic Overview</h1>"));
        assert!(html.contains("Prepared for: Internal Report"));
        assert!(html.contains("Report Author: Jane Doe"));
        assert!(html.contains("<strong>Date:</strong> 2026-01-06"));
        assert!(html.contains("size: A4"));
    }

    #[test]
    fn headings_in_section_order() {
        let html = render_html(&report()).unwrap();
        assert_eq!(html.matches("<h2>").count(), 3);
        let pos = |h: &str| html.find(&format!("<h2>{h}</h2>")).unwrap();
        assert!(pos("Summary") < pos("Financials"));
        assert!(pos("Financials") < pos("Outlook"));
    }

    #[test]
    fn table_shape_matches_data() {
        let html = render_html(&report()).unwrap();
        assert_eq!(html.matches("<table>").count(), 1);
        assert_eq!(html.matches("<th>").count(), 2);
        assert_eq!(html.matches("<td>").count(), 4);
        // header row + two body rows
        assert_eq!(html.matches("<tr>").count(), 3);
        let costs = html.find("<td>Costs</td>").unwrap();
        let revenue = html.find("<td>Revenue</td>").unwrap();
        assert!(costs < revenue);
    }

    #[test]
    fn values_are_escaped() {
        let mut r = report();
        r.sections[0].content = "<script>alert(1)</script> & more".into();
        let html = render_html(&r).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&amp; more"));
    }

    #[test]
    fn empty_report_renders_cover_only() {
        let r = StructuredReport {
            meta: report().meta,
            sections: vec![],
        };
        let html = render_html(&r).unwrap();
        assert_eq!(html.matches("<h2>").count(), 0);
        assert!(html.contains("Report Author: Jane Doe"));
    }
}
