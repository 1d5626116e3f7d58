//! Two-column Letter page layout of a sheet report.
//!
//! The layout is produced as a flat list of draw operations so any PDF
//! writer can replay it; nothing here knows about a particular output format.

use chrono::NaiveDate;
use serde::Serialize;

use crate::catalog::Category;
use crate::document::StoredMaterials;

/// Letter size in points
pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;

const MISSING: &str = "-";

/// Fixed geometry of the report boxes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub row_height: f32,
    pub header_height: f32,
    pub gap: f32,
    pub box_width: f32,
    pub column_top: f32,
    pub left_x: f32,
    pub right_x: f32,
    pub title_size: f32,
    pub row_size: f32,
    pub header_fill: f32,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            row_height: 16.0,
            header_height: 18.0,
            gap: 20.0,
            box_width: 260.0,
            column_top: 740.0,
            left_x: 40.0,
            right_x: 320.0,
            title_size: 10.0,
            row_size: 8.0,
            header_fill: 0.9,
        }
    }
}

/// A single drawing primitive, y measured from the bottom of the page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        /// Grey level of the fill, `None` for an outline only
        fill: Option<f32>,
        border_width: f32,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        thickness: f32,
    },
    Text {
        x: f32,
        y: f32,
        size: f32,
        text: String,
    },
}

/// A titled box of label/value rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub title: String,
    pub rows: Vec<(String, String)>,
}

impl Section {
    pub fn new(title: impl Into<String>, rows: Vec<(String, String)>) -> Self {
        Self {
            title: title.into(),
            rows,
        }
    }

    pub fn height(&self, metrics: &Metrics) -> f32 {
        self.rows.len() as f32 * metrics.row_height + metrics.header_height
    }
}

/// A section with its final position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedSection {
    pub section: Section,
    pub x: f32,
    pub top: f32,
    pub height: f32,
}

impl PlacedSection {
    pub fn bottom(&self) -> f32 {
        self.top - self.height
    }
}

/// Everything needed to draw one report page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLayout {
    pub width: f32,
    pub height: f32,
    pub sections: Vec<PlacedSection>,
    pub ops: Vec<DrawOp>,
}

impl PageLayout {
    /// True when some box runs past the bottom edge; there is no second page.
    pub fn overflows(&self) -> bool {
        self.sections.iter().any(|placed| placed.bottom() < 0.0)
    }

    pub fn section(&self, title: &str) -> Option<&PlacedSection> {
        self.sections
            .iter()
            .find(|placed| placed.section.title == title)
    }
}

/// Data about a sheet the report prints besides its materials
#[derive(Debug, Clone)]
pub struct ReportSheet<'a> {
    pub date: NaiveDate,
    pub notes: &'a str,
}

/// Format a 24-hour `HH:MM` string as `H:MM AM/PM`.
///
/// Seconds (`HH:MM:SS`) are dropped. Empty input prints as `-`; an hour that
/// cannot be parsed is returned unchanged.
pub fn format_time(value: Option<&str>) -> String {
    let value = match value {
        Some(v) if !v.is_empty() => v,
        _ => return MISSING.to_string(),
    };

    let mut parts = value.split(':');
    let hour_part = parts.next().unwrap_or_default();
    let minute = parts.next().unwrap_or("00");

    let hour = match leading_int(hour_part) {
        Some(hour) => hour,
        None => return value.to_string(),
    };

    let meridiem = if hour >= 12 { "PM" } else { "AM" };
    let hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{} {}", hour, minute, meridiem)
}

/// Integer prefix of a string, ignoring leading whitespace
fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// `M/D/YYYY`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

fn text_or_missing(doc: &StoredMaterials, field: &str) -> String {
    match doc.text(field) {
        Some(text) if !text.is_empty() => text,
        _ => MISSING.to_string(),
    }
}

fn row(label: &str, value: String) -> (String, String) {
    (label.to_string(), value)
}

/// Rows for a line-item category, one per printed label
pub fn category_section(category: Category, doc: &StoredMaterials) -> Section {
    let rows = category
        .report_labels()
        .iter()
        .map(|label| {
            let value = doc
                .line_item(category, label)
                .map(|n| crate::materials::Quantity(n).display())
                .unwrap_or_else(|| MISSING.to_string());
            row(label, value)
        })
        .collect();
    Section::new(category.title(), rows)
}

/// Sections of the left and right columns, top to bottom
pub fn report_sections(
    sheet: &ReportSheet<'_>,
    doc: &StoredMaterials,
) -> (Vec<Section>, Vec<Section>) {
    let job_details = Section::new(
        "Job Details",
        vec![
            row("Date", format_date(sheet.date)),
            row("Road", text_or_missing(doc, "road_name")),
            row("Contractor", text_or_missing(doc, "contractor")),
            row("File #", text_or_missing(doc, "contract_number")),
            row("Workers", text_or_missing(doc, "workers")),
            row("Arrived", format_time(doc.text("job_time_arrived").as_deref())),
            row("Finished", format_time(doc.text("job_time_finished").as_deref())),
        ],
    );

    let admin = Section::new(
        "Admin / Totals",
        vec![
            row(
                "DOT Employee",
                if doc.flag("dot_employee") { "Yes" } else { "No" }.to_string(),
            ),
            row("DOT Name/ID", text_or_missing(doc, "dot_employee_name")),
            row("DOT Employee Email", text_or_missing(doc, "dot_employee_email")),
            row("Invoice #", text_or_missing(doc, "invoice_number")),
            row("FED Payroll", text_or_missing(doc, "fed_payroll")),
            row("Job Totals", text_or_missing(doc, "job_totals")),
            row("Daily Minimum", text_or_missing(doc, "daily_minimum")),
            row("Location", text_or_missing(doc, "location")),
        ],
    );

    let notes = if sheet.notes.is_empty() {
        MISSING.to_string()
    } else {
        sheet.notes.to_string()
    };

    let left = vec![
        job_details,
        category_section(Category::Paint, doc),
        category_section(Category::Rpm, doc),
        category_section(Category::Grinding, doc),
    ];
    let right = vec![
        admin,
        category_section(Category::Thermo, doc),
        Section::new("NOTES", vec![row("Notes", notes)]),
    ];

    (left, right)
}

/// Baselines of the letterhead lines; further lines are not printed
const LETTERHEAD: [(f32, f32); 4] = [(770.0, 14.0), (750.0, 10.0), (735.0, 10.0), (720.0, 10.0)];

/// Stack sections down a column starting at `top`, returning the next free y
fn place_column(
    sections: Vec<Section>,
    x: f32,
    top: f32,
    metrics: &Metrics,
    placed: &mut Vec<PlacedSection>,
    ops: &mut Vec<DrawOp>,
) -> f32 {
    let mut cursor = top;
    for section in sections {
        let height = section.height(metrics);
        draw_section(&section, x, cursor, height, metrics, ops);
        placed.push(PlacedSection {
            section,
            x,
            top: cursor,
            height,
        });
        cursor = cursor - height - metrics.gap;
    }
    cursor
}

fn draw_section(
    section: &Section,
    x: f32,
    top: f32,
    height: f32,
    metrics: &Metrics,
    ops: &mut Vec<DrawOp>,
) {
    let width = metrics.box_width;

    ops.push(DrawOp::Rect {
        x,
        y: top - height,
        width,
        height,
        fill: None,
        border_width: 1.0,
    });
    ops.push(DrawOp::Rect {
        x,
        y: top - metrics.header_height,
        width,
        height: metrics.header_height,
        fill: Some(metrics.header_fill),
        border_width: 1.0,
    });
    ops.push(DrawOp::Text {
        x: x + 4.0,
        y: top - 12.0,
        size: metrics.title_size,
        text: section.title.clone(),
    });

    let mut y = top - metrics.header_height;
    for (label, value) in &section.rows {
        ops.push(DrawOp::Line {
            x1: x,
            y1: y,
            x2: x + width,
            y2: y,
            thickness: 0.5,
        });
        ops.push(DrawOp::Text {
            x: x + 4.0,
            y: y - 12.0,
            size: metrics.row_size,
            text: label.clone(),
        });
        ops.push(DrawOp::Text {
            x: x + width / 2.0,
            y: y - 12.0,
            size: metrics.row_size,
            text: value.clone(),
        });
        y -= metrics.row_height;
    }
}

/// Lay out a full report page
pub fn layout_report(
    sheet: &ReportSheet<'_>,
    doc: &StoredMaterials,
    letterhead: &[String],
    metrics: &Metrics,
) -> PageLayout {
    let mut ops = Vec::new();
    let mut sections = Vec::new();

    for (line, (y, size)) in letterhead.iter().zip(LETTERHEAD) {
        ops.push(DrawOp::Text {
            x: metrics.left_x,
            y,
            size,
            text: line.clone(),
        });
    }

    let (left, right) = report_sections(sheet, doc);
    place_column(left, metrics.left_x, metrics.column_top, metrics, &mut sections, &mut ops);
    place_column(right, metrics.right_x, metrics.column_top, metrics, &mut sections, &mut ops);

    PageLayout {
        width: PAGE_WIDTH,
        height: PAGE_HEIGHT,
        sections,
        ops,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use serde_json::{json, Map, Value};

    fn sheet(notes: &str) -> ReportSheet<'_> {
        ReportSheet {
            date: NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
            notes,
        }
    }

    fn value_of<'a>(layout: &'a PageLayout, title: &str, label: &str) -> &'a str {
        layout
            .section(title)
            .and_then(|placed| placed.section.rows.iter().find(|(l, _)| l == label))
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(Some("08:00")), "8:00 AM");
        assert_eq!(format_time(Some("12:30")), "12:30 PM");
        assert_eq!(format_time(Some("00:15")), "12:15 AM");
        assert_eq!(format_time(Some("17:05")), "5:05 PM");
        assert_eq!(format_time(Some("noon")), "noon");
        assert_eq!(format_time(Some("")), "-");
        assert_eq!(format_time(None), "-");
        assert_eq!(format_time(Some("9")), "9:00 AM");
    }

    #[test]
    fn test_format_time_drops_seconds() {
        assert_eq!(format_time(Some("08:30:00")), "8:30 AM");
        assert_eq!(format_time(Some("23:45:59")), "11:45 PM");
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2024, 11, 5).unwrap();
        assert_eq!(format_date(date), "11/5/2024");
    }

    #[test]
    fn test_column_positions() {
        let metrics = Metrics::default();
        let doc = StoredMaterials::classify(&Value::Null);
        let layout = layout_report(&sheet(""), &doc, &[], &metrics);

        let job = layout.section("Job Details").unwrap();
        assert_eq!(job.x, 40.0);
        assert_eq!(job.top, 740.0);
        assert_eq!(job.height, 7.0 * 16.0 + 18.0);

        let paint = layout.section("PAINT").unwrap();
        assert_eq!(paint.top, 740.0 - job.height - 20.0);
        assert_eq!(paint.height, 17.0 * 16.0 + 18.0);

        let rpm = layout.section("RPM").unwrap();
        assert_eq!(rpm.top, paint.top - paint.height - 20.0);

        let admin = layout.section("Admin / Totals").unwrap();
        assert_eq!(admin.x, 320.0);
        assert_eq!(admin.top, 740.0);

        let thermo = layout.section("THERMO").unwrap();
        assert_eq!(thermo.top, 740.0 - admin.height - 20.0);
    }

    #[test]
    fn test_section_draw_ops() {
        let metrics = Metrics::default();
        let mut ops = Vec::new();
        let section = Section::new("NOTES", vec![("Notes".into(), "dry".into())]);
        let height = section.height(&metrics);
        draw_section(&section, 320.0, 500.0, height, &metrics, &mut ops);

        assert_eq!(
            ops,
            vec![
                DrawOp::Rect {
                    x: 320.0,
                    y: 466.0,
                    width: 260.0,
                    height: 34.0,
                    fill: None,
                    border_width: 1.0,
                },
                DrawOp::Rect {
                    x: 320.0,
                    y: 482.0,
                    width: 260.0,
                    height: 18.0,
                    fill: Some(0.9),
                    border_width: 1.0,
                },
                DrawOp::Text {
                    x: 324.0,
                    y: 488.0,
                    size: 10.0,
                    text: "NOTES".into(),
                },
                DrawOp::Line {
                    x1: 320.0,
                    y1: 482.0,
                    x2: 580.0,
                    y2: 482.0,
                    thickness: 0.5,
                },
                DrawOp::Text {
                    x: 324.0,
                    y: 470.0,
                    size: 8.0,
                    text: "Notes".into(),
                },
                DrawOp::Text {
                    x: 450.0,
                    y: 470.0,
                    size: 8.0,
                    text: "dry".into(),
                },
            ]
        );
    }

    #[test]
    fn test_report_values() {
        let mut form = Map::new();
        form.insert("road_name".into(), json!("Main Street"));
        form.insert("job_time_arrived".into(), json!("08:00"));
        form.insert("dot_employee".into(), json!(true));
        form.insert("paint_4_yel_sld".into(), json!("120"));
        form.insert("rpm_clear_2_way".into(), json!(5));
        let doc = StoredMaterials::classify(&normalize(&form).to_value());

        let layout = layout_report(&sheet("Night shift"), &doc, &[], &Metrics::default());

        assert_eq!(value_of(&layout, "Job Details", "Date"), "3/7/2024");
        assert_eq!(value_of(&layout, "Job Details", "Road"), "Main Street");
        assert_eq!(value_of(&layout, "Job Details", "Contractor"), "-");
        assert_eq!(value_of(&layout, "Job Details", "Arrived"), "8:00 AM");
        assert_eq!(value_of(&layout, "Job Details", "Finished"), "-");
        assert_eq!(value_of(&layout, "Admin / Totals", "DOT Employee"), "Yes");
        assert_eq!(value_of(&layout, "PAINT", r#"4" YEL SLD"#), "120");
        assert_eq!(value_of(&layout, "PAINT", "COMBO"), "0");
        // stored under `yield`, so the label never resolves
        assert_eq!(value_of(&layout, "PAINT", "YIELD (12x18)"), "-");
        assert_eq!(value_of(&layout, "RPM", "CLEAR 2 way"), "5");
        assert_eq!(value_of(&layout, "GRINDING", "ARROWS"), "-");
        assert_eq!(value_of(&layout, "NOTES", "Notes"), "Night shift");
    }

    #[test]
    fn test_letterhead_lines() {
        let letterhead = vec![
            "Striping Co".to_string(),
            "Email: office@example.com".to_string(),
        ];
        let doc = StoredMaterials::classify(&Value::Null);
        let layout = layout_report(&sheet(""), &doc, &letterhead, &Metrics::default());

        assert_eq!(
            layout.ops[0],
            DrawOp::Text { x: 40.0, y: 770.0, size: 14.0, text: "Striping Co".into() }
        );
        assert_eq!(
            layout.ops[1],
            DrawOp::Text { x: 40.0, y: 750.0, size: 10.0, text: "Email: office@example.com".into() }
        );
    }

    #[test]
    fn test_standard_report_fits_the_page() {
        let doc = StoredMaterials::classify(&Value::Null);
        let layout = layout_report(&sheet("short"), &doc, &[], &Metrics::default());
        assert!(!layout.overflows());
        assert_eq!(layout.sections.len(), 7);
    }
}
