//! Single-page PDF output for laid-out reports.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use roadsheet_core::{DrawOp, PageLayout};

use crate::error::AppError;

const FONT_NAME: &str = "F1";

fn real(value: f32) -> Object {
    Object::Real(value)
}

/// Helvetica uses WinAnsi; characters outside Latin-1 print as `?`
fn encode_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) < 256 { c as u8 } else { b'?' })
        .collect()
}

fn draw_operations(op: &DrawOp) -> Vec<Operation> {
    match op {
        DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill,
            border_width,
        } => {
            let mut ops = vec![
                Operation::new("w", vec![real(*border_width)]),
                Operation::new("RG", vec![real(0.0), real(0.0), real(0.0)]),
            ];
            if let Some(gray) = fill {
                ops.push(Operation::new("g", vec![real(*gray)]));
            }
            ops.push(Operation::new(
                "re",
                vec![real(*x), real(*y), real(*width), real(*height)],
            ));
            ops.push(Operation::new(if fill.is_some() { "B" } else { "S" }, vec![]));
            ops
        }
        DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            thickness,
        } => vec![
            Operation::new("w", vec![real(*thickness)]),
            Operation::new("m", vec![real(*x1), real(*y1)]),
            Operation::new("l", vec![real(*x2), real(*y2)]),
            Operation::new("S", vec![]),
        ],
        DrawOp::Text { x, y, size, text } => vec![
            Operation::new("g", vec![real(0.0)]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![FONT_NAME.into(), real(*size)]),
            Operation::new("Td", vec![real(*x), real(*y)]),
            Operation::new("Tj", vec![Object::string_literal(encode_text(text))]),
            Operation::new("ET", vec![]),
        ],
    }
}

/// Render a page layout as a standalone PDF document
pub fn render(layout: &PageLayout) -> Result<Vec<u8>, AppError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            FONT_NAME => font_id,
        },
    });

    let content: Content<Vec<Operation>> = Content {
        operations: layout.ops.iter().flat_map(draw_operations).collect(),
    };
    let encoded = content
        .encode()
        .map_err(|e| AppError::Internal(format!("Failed to encode page: {}", e)))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), real(layout.width), real(layout.height)],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| AppError::Internal(format!("Failed to write PDF: {}", e)))?;

    tracing::debug!("Rendered report PDF ({} bytes)", bytes.len());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use roadsheet_core::{layout_report, Metrics, ReportSheet, StoredMaterials};
    use serde_json::json;

    fn sample_layout() -> PageLayout {
        let doc = StoredMaterials::classify(&json!({
            "road_name": "Main Street",
            "paint": { "4_yel_sld": 120 }
        }));
        let sheet = ReportSheet {
            date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            notes: "Dry",
        };
        layout_report(&sheet, &doc, &["Letterhead".to_string()], &Metrics::default())
    }

    #[test]
    fn test_render_produces_pdf() {
        let bytes = render(&sample_layout()).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let parsed = Document::load_mem(&bytes).unwrap();
        assert_eq!(parsed.get_pages().len(), 1);
    }

    #[test]
    fn test_text_operations_select_font() {
        let ops = draw_operations(&DrawOp::Text {
            x: 40.0,
            y: 700.0,
            size: 8.0,
            text: "Main".to_string(),
        });
        let operators: Vec<&str> = ops.iter().map(|op| op.operator.as_str()).collect();
        assert_eq!(operators, vec!["g", "BT", "Tf", "Td", "Tj", "ET"]);
    }

    #[test]
    fn test_encode_text_replaces_wide_chars() {
        assert_eq!(encode_text("Café ✓"), b"Caf\xe9 ?".to_vec());
    }
}
