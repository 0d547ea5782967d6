//! Fixed seven-section layout of an allowance request.

use super::layout::{
    wrap_text, Column, Font, Layout, Table, CONTENT_WIDTH, MARGIN, PAGE_WIDTH,
};
use crate::models::DiariaRecord;

pub const TITLE: &str = "TRAVEL ALLOWANCE REQUEST AND REPORT";
pub const SUBTITLE: &str = "OFFICIAL EXPENSE ACCOUNTABILITY DOCUMENT";

const HEADING_SIZE: f64 = 10.0;
const BODY_SIZE: f64 = 9.0;
const CAPTION_SIZE: f64 = 8.0;
/// Distance between wrapped lines of the free-text sections.
const FLOW_LINE_HEIGHT: f64 = 5.0;
/// Width of the label columns in the trip table.
const LABEL_COLUMN_WIDTH: f64 = 30.0;
const RULE_END: f64 = PAGE_WIDTH - MARGIN;
const PLATE_PLACEHOLDER: &str = "N/A";

/// Lay out every section of the document on a single page.
///
/// The cursor only moves down. Nothing is moved to a second page, so long
/// reports can run past the bottom edge; [`Layout::overflowed`] reports it.
pub fn layout_record(record: &DiariaRecord) -> Layout {
    let mut layout = Layout::default();
    let center = PAGE_WIDTH / 2.0;
    let mut y = 20.0;

    layout.centered_text(center, y, TITLE, Font::Bold, 16.0);
    y += 10.0;
    layout.centered_text(center, y, SUBTITLE, Font::Regular, HEADING_SIZE);
    y += 15.0;

    // 1. Servant
    y = ruled_heading(&mut layout, y, "1. SERVANT DATA");
    let servant = &record.servant;
    let servant_rows = vec![
        vec![
            format!("Name: {}", servant.name),
            format!("Registration: {}", servant.registration_id),
        ],
        vec![
            format!("Role: {}", servant.role),
            format!("Department: {}", servant.department),
        ],
        vec![
            format!("Tax ID: {}", servant.tax_id),
            format!(
                "Bank: {} / Agency: {} / Account: {}",
                servant.bank, servant.branch, servant.account
            ),
        ],
    ];
    y = Table::plain(servant_rows, 2).draw(&mut layout, MARGIN, y) + 10.0;

    // 2. Trip
    y = ruled_heading(&mut layout, y, "2. TRIP DETAILS");
    let trip = &record.trip;
    let plate = if trip.plate.is_empty() {
        PLATE_PLACEHOLDER
    } else {
        trip.plate.as_str()
    };
    let trip_rows = vec![
        vec![
            "Origin:".to_string(),
            trip.origin.clone(),
            "Destination:".to_string(),
            format!("{} ({})", trip.destination, trip.zone.as_str()),
        ],
        vec![
            "Departure:".to_string(),
            format!("{} at {}", trip.departure_date, trip.departure_time),
            "Return:".to_string(),
            format!("{} at {}", trip.return_date, trip.return_time),
        ],
        vec![
            "Vehicle:".to_string(),
            trip.vehicle.clone(),
            "Plate:".to_string(),
            plate.to_string(),
        ],
    ];
    let label = Column {
        width: Some(LABEL_COLUMN_WIDTH),
        bold: true,
    };
    let trip_columns = vec![label, Column::default(), label, Column::default()];
    y = Table::grid(trip_rows, trip_columns).draw(&mut layout, MARGIN, y) + 10.0;

    // 3. Objective
    layout.text(MARGIN, y, "3. MISSION OBJECTIVE", Font::Bold, HEADING_SIZE);
    y += 5.0;
    y = flowed_block(&mut layout, y, &trip.purpose) + 10.0;

    // 4. Report
    layout.text(
        MARGIN,
        y,
        "4. NARRATIVE REPORT OF ACTIVITIES",
        Font::Bold,
        HEADING_SIZE,
    );
    y += 5.0;
    y = flowed_block(&mut layout, y, &record.report) + 15.0;

    // 5. Finance
    y = ruled_heading(&mut layout, y, "5. FINANCIAL STATEMENT");
    let finance = &record.finance;
    layout.text(
        MARGIN,
        y,
        format!("Unit Value: R$ {}", format_money(finance.unit_value)),
        Font::Bold,
        HEADING_SIZE,
    );
    layout.text(
        MARGIN + 60.0,
        y,
        format!("Allowance Qty: {}", format_quantity(finance.quantity)),
        Font::Bold,
        HEADING_SIZE,
    );
    layout.text(
        MARGIN + 110.0,
        y,
        format!("TOTAL DUE: R$ {}", format_money(finance.total)),
        Font::Bold,
        HEADING_SIZE,
    );

    // Signatures sit a fixed distance below the financial line.
    y += 40.0;
    layout.line(MARGIN, y, MARGIN + 70.0, y);
    layout.line(120.0, y, RULE_END, y);
    y += 5.0;
    layout.centered_text(MARGIN + 35.0, y, "SERVANT SIGNATURE", Font::Bold, CAPTION_SIZE);
    layout.centered_text(
        155.0,
        y,
        "IMMEDIATE SUPERVISOR SIGNATURE",
        Font::Bold,
        CAPTION_SIZE,
    );

    layout
}

/// Bold heading with a rule underneath. Returns the cursor below the rule.
fn ruled_heading(layout: &mut Layout, y: f64, title: &str) -> f64 {
    layout.text(MARGIN, y, title, Font::Bold, HEADING_SIZE);
    let rule_y = y + 5.0;
    layout.line(MARGIN, rule_y, RULE_END, rule_y);
    rule_y + 7.0
}

/// Wrapped free text drawn just below `y`. Returns `y` advanced by the block.
fn flowed_block(layout: &mut Layout, y: f64, text: &str) -> f64 {
    let lines = wrap_text(text, CONTENT_WIDTH, Font::Regular, BODY_SIZE);
    layout.lines(MARGIN, y + 5.0, &lines, Font::Regular, BODY_SIZE, FLOW_LINE_HEIGHT);
    y + lines.len() as f64 * FLOW_LINE_HEIGHT
}

/// Two decimal places, no grouping.
pub fn format_money(value: f64) -> String {
    format!("{:.2}", value + 0.0)
}

/// Quantity as entered: `2` rather than `2.00`, `1.5` stays `1.5`.
pub fn format_quantity(value: f64) -> String {
    // Adding zero turns -0 into 0.
    format!("{}", value + 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::layout::{DrawOp, PAGE_HEIGHT};
    use crate::models::{Finance, Zone};

    fn sample_record() -> DiariaRecord {
        let mut record = DiariaRecord::default();
        record.servant.name = "Maria Souza".to_string();
        record.servant.registration_id = "4521-0".to_string();
        record.servant.bank = "Banco do Brasil".to_string();
        record.servant.branch = "1234-5".to_string();
        record.servant.account = "67890-1".to_string();
        record.trip.origin = "Garanhuns".to_string();
        record.trip.destination = "Recife".to_string();
        record.trip.zone = Zone::Rural;
        record.trip.departure_date = "01/05/2024".to_string();
        record.trip.return_date = "02/05/2024".to_string();
        record.trip.purpose = "Participar de capacitação".to_string();
        record.report = "Participou-se do curso.".to_string();
        record.finance = Finance::default().with_unit_value(150.0).with_quantity(1.5);
        record
    }

    fn text_y(layout: &Layout, needle: &str) -> f64 {
        layout
            .ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Text { text, y, .. } if text == needle => Some(*y),
                _ => None,
            })
            .unwrap_or_else(|| panic!("text {:?} not found", needle))
    }

    #[test]
    fn test_sections_in_order() {
        let layout = layout_record(&sample_record());
        let headings = [
            TITLE,
            SUBTITLE,
            "1. SERVANT DATA",
            "2. TRIP DETAILS",
            "3. MISSION OBJECTIVE",
            "4. NARRATIVE REPORT OF ACTIVITIES",
            "5. FINANCIAL STATEMENT",
            "SERVANT SIGNATURE",
        ];

        let ys: Vec<f64> = headings.iter().map(|h| text_y(&layout, h)).collect();
        assert!(ys.windows(2).all(|w| w[0] < w[1]), "{:?}", ys);
        assert_eq!(ys[0], 20.0);
        assert_eq!(ys[1], 30.0);
        assert_eq!(ys[2], 45.0);
    }

    #[test]
    fn test_field_values_rendered() {
        let layout = layout_record(&sample_record());
        let texts: Vec<&str> = layout.texts().collect();

        assert!(texts.contains(&"Name: Maria Souza"));
        assert!(texts.contains(&"Registration: 4521-0"));
        assert!(texts.contains(&"Recife (Rural)"));
        assert!(texts.contains(&"01/05/2024 at 08:00"));
        assert!(texts.contains(&"02/05/2024 at 18:00"));
        assert!(texts.contains(&"Official"));
        assert!(texts.contains(&"Participar de capacitação"));
        assert!(texts.contains(&"Participou-se do curso."));
        assert!(texts.contains(&"Unit Value: R$ 150.00"));
        assert!(texts.contains(&"Allowance Qty: 1.5"));
        assert!(texts.contains(&"TOTAL DUE: R$ 225.00"));
        assert!(texts.contains(&"IMMEDIATE SUPERVISOR SIGNATURE"));
    }

    #[test]
    fn test_banking_triple_wraps_within_cell() {
        let layout = layout_record(&sample_record());
        let banking: String = layout
            .texts()
            .skip_while(|t| !t.starts_with("Bank:"))
            .take_while(|t| !t.starts_with("2. "))
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(
            banking,
            "Bank: Banco do Brasil / Agency: 1234-5 / Account: 67890-1"
        );
    }

    #[test]
    fn test_empty_plate_uses_placeholder() {
        let mut record = sample_record();
        let layout = layout_record(&record);
        assert!(layout.texts().any(|t| t == "N/A"));

        record.trip.plate = "ABC-1234".to_string();
        let layout = layout_record(&record);
        assert!(layout.texts().any(|t| t == "ABC-1234"));
        assert!(!layout.texts().any(|t| t == "N/A"));
    }

    #[test]
    fn test_empty_record_renders_blank_cells() {
        let layout = layout_record(&DiariaRecord::default());
        let texts: Vec<&str> = layout.texts().collect();

        assert!(texts.contains(&"Name:"));
        assert!(texts.contains(&"(Urban)"));
        assert!(texts.contains(&"Allowance Qty: 1"));
        assert!(texts.contains(&"TOTAL DUE: R$ 0.00"));
        assert!(!layout.overflowed);
    }

    #[test]
    fn test_report_advances_cursor_by_line_count() {
        let short = layout_record(&sample_record());

        let mut record = sample_record();
        record.report = "linha\n".repeat(4) + "linha";
        let long = layout_record(&record);

        let shift = text_y(&long, "5. FINANCIAL STATEMENT")
            - text_y(&short, "5. FINANCIAL STATEMENT");
        assert!((shift - 4.0 * FLOW_LINE_HEIGHT).abs() < 1e-9);

        let sig_gap = text_y(&long, "SERVANT SIGNATURE") - text_y(&long, "5. FINANCIAL STATEMENT");
        assert!((sig_gap - (12.0 + 40.0 + 5.0)).abs() < 1e-9);
    }

    #[test]
    fn test_long_report_overflows_single_page() {
        let mut record = sample_record();
        record.report = "Realizou-se a atividade prevista.\n".repeat(80);

        let layout = layout_record(&record);
        assert!(layout.overflowed);
        assert!(text_y(&layout, "SERVANT SIGNATURE") > PAGE_HEIGHT);
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_money(0.0), "0.00");
        assert_eq!(format_money(1234.5), "1234.50");
        assert_eq!(format_money(0.1 * 3.0), "0.30");
        assert_eq!(format_quantity(2.0), "2");
        assert_eq!(format_quantity(0.5), "0.5");
        assert_eq!(format_money(-5.0 * 0.0), "0.00");
        assert_eq!(format_money(-0.0), "0.00");
        assert_eq!(format_quantity(-0.0), "0");
    }
}
