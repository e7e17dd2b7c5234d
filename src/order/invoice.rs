//! Invoice documents.
//!
//! Two renderings of the same order: a plain-text receipt and a paginated
//! layout made of sections. Byte formatting of the layout (PDF, ...) is left
//! to the caller.

use serde::Serialize;
use url::Url;

use crate::config::Configuration;
use crate::order::{Order, ServiceDetails, Status, round_cents};

const RULE: &str = "=====================================";
const SEPARATOR: &str = "-------------------------------------";

/// Lines available on one layout page.
pub const LINES_PER_PAGE: usize = 48;
const NOTE_WIDTH: usize = 72;

/// Paginated invoice.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub title: String,
    pub filename: String,
    pub pages: Vec<Page>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Page {
    pub number: usize,
    pub sections: Vec<Section>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Section {
    HeaderBand { title: String, subtitle: String },
    Metadata { rows: Vec<(String, String)> },
    Table {
        title: String,
        columns: [String; 2],
        rows: Vec<(String, String)>,
    },
    Notes { lines: Vec<String> },
    Footer { lines: Vec<String> },
}

impl Section {
    /// Lines taken on a page.
    fn height(&self) -> usize {
        match self {
            Section::HeaderBand { .. } => 4,
            Section::Metadata { rows } => rows.len() + 1,
            Section::Table { rows, .. } => rows.len() + 3,
            Section::Notes { lines } | Section::Footer { lines } => {
                lines.len() + 1
            },
        }
    }
}

/// Counters of the invoice book.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTotals {
    pub invoices: usize,
    /// Invoices of completed orders.
    pub paid: usize,
    pub total_revenue: f64,
}

pub fn invoice_totals(orders: &[Order]) -> InvoiceTotals {
    InvoiceTotals {
        invoices: orders.len(),
        paid: orders
            .iter()
            .filter(|o| o.status == Status::Completed)
            .count(),
        total_revenue: round_cents(orders.iter().map(|o| o.price).sum()),
    }
}

/// Text receipt ready to be written out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub filename: String,
    pub contents: String,
}

/// Renders invoices on behalf of one instance.
#[derive(Clone, Debug)]
pub struct InvoiceRenderer {
    name: String,
    site: String,
}

impl InvoiceRenderer {
    pub fn new(config: &Configuration) -> Self {
        let site = Url::parse(&config.url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_owned))
            .unwrap_or_else(|| config.url.clone());

        Self {
            name: config.name.clone(),
            site,
        }
    }

    /// Plain-text receipt.
    pub fn render_text(&self, order: &Order) -> String {
        let title = self.name.to_uppercase();
        let status = order.status.as_str().to_uppercase();
        let price = format!("${:.2}", order.price);

        format!(
            "{title} - INVOICE\n{RULE}\n\n\
             Order ID: {id}\nDate: {date}\nStatus: {status}\n\n\
             {SEPARATOR}\nSERVICE DETAILS\n{SEPARATOR}\n\
             Service: {service}\nType: {kind}\nQuantity: {quantity}\n\n\
             {SEPARATOR}\nBILLING\n{SEPARATOR}\n\
             Subtotal: {price}\nTax (0%): $0.00\nTotal: {price}\n\n\
             {SEPARATOR}\nThank you for your business!\n\
             Visit us at {site}\n{RULE}\n",
            id = order.id,
            date = order.date,
            service = order.service,
            kind = order.kind,
            quantity = order.quantity,
            site = self.site,
        )
    }

    /// One text receipt per order, in input order.
    pub fn render_all(&self, orders: &[Order]) -> Vec<Receipt> {
        orders
            .iter()
            .map(|order| Receipt {
                filename: text_filename(order),
                contents: self.render_text(order),
            })
            .collect()
    }

    /// Paginated layout.
    pub fn render_layout(&self, order: &Order) -> Document {
        let mut sections = vec![
            Section::HeaderBand {
                title: self.name.to_uppercase(),
                subtitle: "INVOICE".to_owned(),
            },
            Section::Metadata {
                rows: vec![
                    row("Invoice", &order.id),
                    row("Date", &order.date.to_string()),
                    row("Status", &order.status.as_str().to_uppercase()),
                    row("Customer", &order.customer),
                ],
            },
            Section::Table {
                title: "Service details".to_owned(),
                columns: ["Item".to_owned(), "Value".to_owned()],
                rows: service_rows(order),
            },
            Section::Table {
                title: "Billing".to_owned(),
                columns: ["Description".to_owned(), "Amount".to_owned()],
                rows: vec![
                    row("Subtotal", &format!("${:.2}", order.price)),
                    row("Tax (0%)", "$0.00"),
                    row("Total", &format!("${:.2}", order.price)),
                ],
            },
        ];

        let notes = wrap(&order.description, NOTE_WIDTH);
        if !notes.is_empty() {
            sections.push(Section::Notes { lines: notes });
        }
        sections.push(Section::Footer {
            lines: vec![
                "Thank you for your business!".to_owned(),
                format!("Visit us at {}", self.site),
            ],
        });

        Document {
            title: format!("{} Invoice {}", self.name, order.id),
            filename: layout_filename(order),
            pages: paginate(sections),
        }
    }
}

fn row(label: &str, value: &str) -> (String, String) {
    (label.to_owned(), value.to_owned())
}

fn service_rows(order: &Order) -> Vec<(String, String)> {
    let mut rows = vec![
        row("Service", &order.service),
        row("Type", &order.kind),
        row("Quantity", &order.quantity.to_string()),
    ];

    match &order.details {
        ServiceDetails::Printing { material, .. } => {
            rows.push(row("Material", material.label()));
        },
        ServiceDetails::Food { delivery_time, .. } => {
            if let Some(time) = delivery_time {
                rows.push(row("Delivery time", time));
            }
        },
        ServiceDetails::Recruitment { salary_range, .. } => {
            if let Some(range) = salary_range {
                rows.push(row("Salary range", range.label()));
            }
        },
        ServiceDetails::RealEstate { budget, .. } => {
            if let Some(budget) = budget {
                rows.push(row("Budget", budget));
            }
        },
    }
    rows
}

/// Split sections over pages. Notes are the only section split across a
/// page boundary.
fn paginate(sections: Vec<Section>) -> Vec<Page> {
    let mut pages = vec![Page {
        number: 1,
        sections: Vec::new(),
    }];
    let mut used = 0;

    for section in sections {
        let mut pending = Some(section);
        while let Some(section) = pending.take() {
            let free = LINES_PER_PAGE - used;

            if section.height() > free {
                if let Section::Notes { mut lines } = section {
                    if free > 1 {
                        let rest = lines.split_off(free - 1);
                        push(&mut pages, Section::Notes { lines });
                        pending = Some(Section::Notes { lines: rest });
                    } else {
                        pending = Some(Section::Notes { lines });
                    }
                } else if used > 0 {
                    pending = Some(section);
                } else {
                    push(&mut pages, section);
                    used = LINES_PER_PAGE;
                    continue;
                }

                pages.push(Page {
                    number: pages.len() + 1,
                    sections: Vec::new(),
                });
                used = 0;
                continue;
            }

            used += section.height();
            push(&mut pages, section);
        }
    }

    pages
}

fn push(pages: &mut [Page], section: Section) {
    if let Some(page) = pages.last_mut() {
        page.sections.push(section);
    }
}

/// Greedy word wrap.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if !line.is_empty() && line.len() + 1 + word.len() > width {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        if !line.is_empty() {
            lines.push(line);
        }
    }

    lines
}

/// File name of the text receipt.
pub fn text_filename(order: &Order) -> String {
    format!("Invoice_{}.txt", order.id)
}

/// File name of the layout export.
pub fn layout_filename(order: &Order) -> String {
    let mut name = format!("Unifyr_Invoice_{}_{}", order.id, order.date);
    for part in [&order.customer, &order.service] {
        let slug = slug(part);
        if !slug.is_empty() {
            name.push('_');
            name.push_str(&slug);
        }
    }

    name + ".pdf"
}

/// ASCII alphanumerics joined by single underscores.
fn slug(value: &str) -> String {
    value
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::order::{Material, PrintType, Status};

    fn order() -> Order {
        Order {
            id: "ORD-600000".into(),
            owner: "1761825600000".into(),
            customer: "Jane Doe".into(),
            service: "Printing & Branding".into(),
            kind: "Business Cards".into(),
            quantity: 100,
            price: 60.0,
            status: Status::InProgress,
            date: NaiveDate::from_ymd_opt(2025, 10, 30).unwrap(),
            description: String::new(),
            details: ServiceDetails::Printing {
                print_type: Some(PrintType::BusinessCard),
                quantity: 100,
                material: Material::Premium,
            },
            sequence: 1,
        }
    }

    fn renderer() -> InvoiceRenderer {
        InvoiceRenderer::new(&Configuration::default())
    }

    #[test]
    fn test_render_text() {
        let text = renderer().render_text(&order());
        let expected = "\
UNIFYR - INVOICE
=====================================

Order ID: ORD-600000
Date: 2025-10-30
Status: IN-PROGRESS

-------------------------------------
SERVICE DETAILS
-------------------------------------
Service: Printing & Branding
Type: Business Cards
Quantity: 100

-------------------------------------
BILLING
-------------------------------------
Subtotal: $60.00
Tax (0%): $0.00
Total: $60.00

-------------------------------------
Thank you for your business!
Visit us at unifyr.com
=====================================
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_layout() {
        let document = renderer().render_layout(&order());
        assert_eq!(document.pages.len(), 1);
        assert_eq!(document.title, "Unifyr Invoice ORD-600000");

        let sections = &document.pages[0].sections;
        assert!(matches!(sections[0], Section::HeaderBand { .. }));
        assert!(matches!(sections.last(), Some(Section::Footer { .. })));

        let Section::Table { rows, .. } = &sections[2] else {
            panic!("expected service table");
        };
        assert!(rows.contains(&row("Material", "Premium")));
        let Section::Table { rows, .. } = &sections[3] else {
            panic!("expected billing table");
        };
        assert_eq!(rows[2], row("Total", "$60.00"));
    }

    #[test]
    fn test_long_notes_span_pages() {
        let mut order = order();
        order.description = "lorem ipsum dolor ".repeat(400);

        let document = renderer().render_layout(&order);
        assert!(document.pages.len() > 1);
        for (index, page) in document.pages.iter().enumerate() {
            assert_eq!(page.number, index + 1);
            let height: usize = page.sections.iter().map(Section::height).sum();
            assert!(height <= LINES_PER_PAGE, "page {} overflows", page.number);
        }

        let notes: usize = document
            .pages
            .iter()
            .flat_map(|p| &p.sections)
            .map(|s| match s {
                Section::Notes { lines } => lines.len(),
                _ => 0,
            })
            .sum();
        assert_eq!(notes, wrap(&order.description, NOTE_WIDTH).len());
        assert!(matches!(
            document.pages.last().and_then(|p| p.sections.last()),
            Some(Section::Footer { .. })
        ));
    }

    #[test]
    fn test_invoice_book() {
        let renderer = renderer();
        let first = order();
        let second = Order {
            id: "ORD-600001".into(),
            price: 15.5,
            status: Status::Completed,
            ..order()
        };
        let orders = vec![first.clone(), second.clone()];

        assert_eq!(invoice_totals(&orders), InvoiceTotals {
            invoices: 2,
            paid: 1,
            total_revenue: 75.50,
        });
        assert_eq!(invoice_totals(&[]), InvoiceTotals::default());

        let receipts = renderer.render_all(&orders);
        assert_eq!(receipts.len(), 2);
        assert_eq!(receipts[0].filename, "Invoice_ORD-600000.txt");
        assert_eq!(receipts[0].contents, renderer.render_text(&first));
        assert!(receipts[1].contents.contains("Status: COMPLETED"));
        assert!(renderer.render_all(&[]).is_empty());
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("a bb ccc", 4), vec!["a bb", "ccc"]);
        assert_eq!(wrap("one\n\ntwo", 10), vec!["one", "two"]);
        assert!(wrap("   ", 10).is_empty());
    }

    #[test]
    fn test_filenames() {
        let order = order();
        assert_eq!(text_filename(&order), "Invoice_ORD-600000.txt");
        assert_eq!(
            layout_filename(&order),
            "Unifyr_Invoice_ORD-600000_2025-10-30_Jane_Doe_Printing_Branding.pdf"
        );

        let anonymous = Order {
            customer: "  ".into(),
            service: "Zoë".into(),
            ..order
        };
        assert_eq!(
            layout_filename(&anonymous),
            "Unifyr_Invoice_ORD-600000_2025-10-30_Zo.pdf"
        );
    }
}
