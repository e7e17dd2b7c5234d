//! Service orders.
mod invoice;
mod ledger;
mod pricing;
mod tracking;

pub use invoice::*;
pub use ledger::*;
pub use pricing::*;
pub use tracking::*;

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Service category an order belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Printing,
    Food,
    Recruitment,
    #[serde(alias = "realestate")]
    RealEstate,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Printing => "printing",
            Category::Food => "food",
            Category::Recruitment => "recruitment",
            Category::RealEstate => "real-estate",
        }
    }

    /// Human-readable service name.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Printing => "Printing & Branding",
            Category::Food => "Food Delivery",
            Category::Recruitment => "Recruitment & Hiring",
            Category::RealEstate => "Real Estate",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "printing" => Ok(Category::Printing),
            "food" => Ok(Category::Food),
            "recruitment" => Ok(Category::Recruitment),
            "real-estate" | "realestate" => Ok(Category::RealEstate),
            other => Err(Error::UnknownCategory(other.to_owned())),
        }
    }
}

/// Order life cycle.
///
/// Every transition is allowed; `completed` and `cancelled` are only
/// terminal by convention.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::InProgress => "in-progress",
            Status::Completed => "completed",
            Status::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed | Status::Cancelled)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Status::Pending),
            "in-progress" => Ok(Status::InProgress),
            "completed" => Ok(Status::Completed),
            "cancelled" => Ok(Status::Cancelled),
            other => Err(format!("unknown status {other:?}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintType {
    BusinessCard,
    Banner,
    Flyer,
    Signage,
    Sticker,
}

impl PrintType {
    pub fn label(&self) -> &'static str {
        match self {
            PrintType::BusinessCard => "Business Cards",
            PrintType::Banner => "Banners",
            PrintType::Flyer => "Flyers",
            PrintType::Signage => "Signage",
            PrintType::Sticker => "Stickers",
        }
    }
}

impl FromStr for PrintType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "business_card" => Ok(PrintType::BusinessCard),
            "banner" => Ok(PrintType::Banner),
            "flyer" => Ok(PrintType::Flyer),
            "signage" => Ok(PrintType::Signage),
            "sticker" => Ok(PrintType::Sticker),
            other => Err(format!("unknown print type {other:?}")),
        }
    }
}

/// Print material quality.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    #[default]
    Standard,
    Premium,
    Luxury,
}

impl Material {
    pub fn label(&self) -> &'static str {
        match self {
            Material::Standard => "Standard",
            Material::Premium => "Premium",
            Material::Luxury => "Luxury",
        }
    }
}

impl FromStr for Material {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Material::Standard),
            "premium" => Ok(Material::Premium),
            "luxury" => Ok(Material::Luxury),
            other => Err(format!("unknown material {other:?}")),
        }
    }
}

/// Yearly salary bracket of a job posting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SalaryRange {
    #[serde(rename = "0-30k")]
    UpTo30k,
    #[serde(rename = "30k-60k")]
    From30kTo60k,
    #[serde(rename = "60k-100k")]
    From60kTo100k,
    #[serde(rename = "100k+")]
    Over100k,
}

impl SalaryRange {
    pub fn label(&self) -> &'static str {
        match self {
            SalaryRange::UpTo30k => "$0 - $30,000",
            SalaryRange::From30kTo60k => "$30,000 - $60,000",
            SalaryRange::From60kTo100k => "$60,000 - $100,000",
            SalaryRange::Over100k => "$100,000+",
        }
    }
}

impl FromStr for SalaryRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0-30k" => Ok(SalaryRange::UpTo30k),
            "30k-60k" => Ok(SalaryRange::From30kTo60k),
            "60k-100k" => Ok(SalaryRange::From60kTo100k),
            "100k+" => Ok(SalaryRange::Over100k),
            other => Err(format!("unknown salary range {other:?}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Apartment,
    House,
    Commercial,
    Land,
}

impl PropertyType {
    pub fn label(&self) -> &'static str {
        match self {
            PropertyType::Apartment => "Apartment",
            PropertyType::House => "House",
            PropertyType::Commercial => "Commercial",
            PropertyType::Land => "Land",
        }
    }
}

impl FromStr for PropertyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "apartment" => Ok(PropertyType::Apartment),
            "house" => Ok(PropertyType::House),
            "commercial" => Ok(PropertyType::Commercial),
            "land" => Ok(PropertyType::Land),
            other => Err(format!("unknown property type {other:?}")),
        }
    }
}

/// Category-specific fields of an order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "service",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServiceDetails {
    Printing {
        print_type: Option<PrintType>,
        quantity: u32,
        material: Material,
    },
    Food {
        meal_count: u32,
        delivery_time: Option<String>,
    },
    Recruitment {
        positions: u32,
        salary_range: Option<SalaryRange>,
    },
    #[serde(alias = "realestate")]
    RealEstate {
        property_type: Option<PropertyType>,
        budget: Option<String>,
    },
}

impl ServiceDetails {
    pub fn category(&self) -> Category {
        match self {
            ServiceDetails::Printing { .. } => Category::Printing,
            ServiceDetails::Food { .. } => Category::Food,
            ServiceDetails::Recruitment { .. } => Category::Recruitment,
            ServiceDetails::RealEstate { .. } => Category::RealEstate,
        }
    }

    /// Label shown in the order's `type` column.
    pub fn type_label(&self) -> &'static str {
        match self {
            ServiceDetails::Printing { print_type, .. } => print_type
                .map(|p| p.label())
                .unwrap_or("Print Order"),
            ServiceDetails::Food { .. } => "Food Order",
            ServiceDetails::Recruitment { .. } => "Job Posting",
            ServiceDetails::RealEstate { property_type, .. } => property_type
                .map(|p| p.label())
                .unwrap_or("Property"),
        }
    }

    /// Units ordered. A property search always counts as one.
    pub fn quantity(&self) -> u32 {
        match self {
            ServiceDetails::Printing { quantity, .. } => *quantity,
            ServiceDetails::Food { meal_count, .. } => *meal_count,
            ServiceDetails::Recruitment { positions, .. } => *positions,
            ServiceDetails::RealEstate { .. } => 1,
        }
    }
}

/// Order as stored in the order table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    /// Id of the owning account.
    pub owner: String,
    /// Owner's display name when the order was placed.
    pub customer: String,
    /// Service label.
    pub service: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub quantity: u32,
    pub price: f64,
    pub status: Status,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
    pub details: ServiceDetails,
    /// Insertion counter, higher is newer.
    pub sequence: u64,
}

impl Order {
    pub fn category(&self) -> Category {
        self.details.category()
    }
}

/// Raw order form, every field as typed.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderForm {
    pub service: String,
    pub print_type: Option<String>,
    pub quantity: Option<String>,
    pub material: Option<String>,
    pub meal_count: Option<String>,
    pub delivery_time: Option<String>,
    pub positions: Option<String>,
    pub salary_range: Option<String>,
    pub property_type: Option<String>,
    pub budget: Option<String>,
    pub description: String,
}

impl OrderForm {
    /// Keep only the fields relevant to the selected category.
    ///
    /// Unrecognised choices are dropped, an unrecognised material is
    /// standard.
    pub fn details(&self) -> Result<ServiceDetails, Error> {
        let category: Category = self.service.parse()?;

        Ok(match category {
            Category::Printing => ServiceDetails::Printing {
                print_type: choice(&self.print_type),
                quantity: parse_count(self.quantity.as_deref(), 0),
                material: choice(&self.material).unwrap_or_default(),
            },
            Category::Food => ServiceDetails::Food {
                meal_count: parse_count(self.meal_count.as_deref(), 0),
                delivery_time: text(&self.delivery_time),
            },
            Category::Recruitment => ServiceDetails::Recruitment {
                positions: parse_count(self.positions.as_deref(), 1),
                salary_range: choice(&self.salary_range),
            },
            Category::RealEstate => ServiceDetails::RealEstate {
                property_type: choice(&self.property_type),
                budget: text(&self.budget),
            },
        })
    }
}

fn choice<T: FromStr>(value: &Option<String>) -> Option<T> {
    value.as_deref().and_then(|v| v.trim().parse().ok())
}

fn text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Parse a count from its leading decimal digits.
///
/// Missing or non-numeric input yields `default`, negative input yields 0
/// and overflow saturates.
pub fn parse_count(input: Option<&str>, default: u32) -> u32 {
    let Some(input) = input.map(str::trim_start) else {
        return default;
    };

    let (negative, rest) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };

    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..end];

    if digits.is_empty() {
        default
    } else if negative {
        0
    } else {
        digits.parse().unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(Some("100"), 0), 100);
        assert_eq!(parse_count(Some(" 12abc"), 0), 12);
        assert_eq!(parse_count(Some("+7"), 0), 7);
        assert_eq!(parse_count(Some("-5"), 1), 0);
        assert_eq!(parse_count(Some("abc"), 1), 1);
        assert_eq!(parse_count(Some(""), 0), 0);
        assert_eq!(parse_count(None, 1), 1);
        assert_eq!(parse_count(Some("99999999999"), 0), u32::MAX);
    }

    #[test]
    fn test_form_details() {
        let form = OrderForm {
            service: "printing".into(),
            print_type: Some("banner".into()),
            quantity: Some("100".into()),
            material: Some("premium".into()),
            meal_count: Some("4".into()),
            ..Default::default()
        };
        assert_eq!(
            form.details().unwrap(),
            ServiceDetails::Printing {
                print_type: Some(PrintType::Banner),
                quantity: 100,
                material: Material::Premium,
            }
        );

        let form = OrderForm {
            service: "realestate".into(),
            property_type: Some("castle".into()),
            budget: Some("  ".into()),
            ..Default::default()
        };
        let details = form.details().unwrap();
        assert_eq!(details.category(), Category::RealEstate);
        assert_eq!(details.type_label(), "Property");
        assert_eq!(details.quantity(), 1);

        let form = OrderForm {
            service: "laundry".into(),
            ..Default::default()
        };
        assert!(matches!(form.details(), Err(Error::UnknownCategory(_))));
    }

    #[test]
    fn test_recruitment_defaults_to_one_position() {
        let form = OrderForm {
            service: "recruitment".into(),
            ..Default::default()
        };
        assert_eq!(form.details().unwrap().quantity(), 1);
    }

    #[test]
    fn test_details_wire_shape() {
        let details = ServiceDetails::Food {
            meal_count: 10,
            delivery_time: Some("12:30".into()),
        };
        assert_eq!(
            serde_json::to_value(&details).unwrap(),
            serde_json::json!({
                "service": "food",
                "mealCount": 10,
                "deliveryTime": "12:30",
            })
        );

        let parsed: ServiceDetails = serde_json::from_value(serde_json::json!({
            "service": "realestate",
            "propertyType": "land",
            "budget": null,
        }))
        .unwrap();
        assert_eq!(parsed.type_label(), "Land");
    }

    #[test]
    fn test_status() {
        assert_eq!("in-progress".parse::<Status>(), Ok(Status::InProgress));
        assert!("done".parse::<Status>().is_err());
        assert!(Status::Cancelled.is_terminal());
        assert!(!Status::InProgress.is_terminal());
        assert_eq!(
            serde_json::to_string(&Status::InProgress).unwrap(),
            r#""in-progress""#
        );
    }
}
