//! Price quotes.

use crate::order::{Material, ServiceDetails};

pub const PRINT_UNIT_PRICE: f64 = 0.50;
pub const MEAL_PRICE: f64 = 5.00;
pub const POSITION_PRICE: f64 = 100.00;
pub const REAL_ESTATE_FLAT_FEE: f64 = 200.00;

impl Material {
    /// Price multiplier applied once on a printing order.
    pub fn multiplier(&self) -> f64 {
        match self {
            Material::Standard => 1.0,
            Material::Premium => 1.2,
            Material::Luxury => 1.5,
        }
    }
}

/// Price of an order, in dollars rounded to the cent.
pub fn quote(details: &ServiceDetails) -> f64 {
    let price = match details {
        ServiceDetails::Printing {
            quantity, material, ..
        } => PRINT_UNIT_PRICE * f64::from(*quantity) * material.multiplier(),
        ServiceDetails::Food { meal_count, .. } => {
            MEAL_PRICE * f64::from(*meal_count)
        },
        ServiceDetails::Recruitment { positions, .. } => {
            POSITION_PRICE * f64::from((*positions).max(1))
        },
        ServiceDetails::RealEstate { .. } => REAL_ESTATE_FLAT_FEE,
    };

    round_cents(price)
}

/// Round to two decimals.
#[inline]
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{PropertyType, SalaryRange};

    fn printing(quantity: u32, material: Material) -> ServiceDetails {
        ServiceDetails::Printing {
            print_type: None,
            quantity,
            material,
        }
    }

    #[test]
    fn test_printing() {
        assert_eq!(quote(&printing(100, Material::Premium)), 60.00);
        assert_eq!(quote(&printing(100, Material::Luxury)), 75.00);
        assert_eq!(quote(&printing(100, Material::Standard)), 50.00);
        assert_eq!(quote(&printing(0, Material::Luxury)), 0.00);
        assert_eq!(quote(&printing(3, Material::Premium)), 1.80);

        for quantity in [1, 7, 33, 250, 1001] {
            for material in
                [Material::Standard, Material::Premium, Material::Luxury]
            {
                let expected = round_cents(
                    0.5 * f64::from(quantity) * material.multiplier(),
                );
                assert_eq!(quote(&printing(quantity, material)), expected);
            }
        }
    }

    #[test]
    fn test_food() {
        for meal_count in [0, 1, 10, 37] {
            let details = ServiceDetails::Food {
                meal_count,
                delivery_time: None,
            };
            assert_eq!(quote(&details), 5.0 * f64::from(meal_count));
        }
    }

    #[test]
    fn test_recruitment_floor() {
        let quote_for = |positions| {
            quote(&ServiceDetails::Recruitment {
                positions,
                salary_range: Some(SalaryRange::Over100k),
            })
        };
        assert_eq!(quote_for(0), 100.00);
        assert_eq!(quote_for(1), 100.00);
        assert_eq!(quote_for(4), 400.00);
    }

    #[test]
    fn test_real_estate_is_flat() {
        for property_type in [None, Some(PropertyType::Land)] {
            let details = ServiceDetails::RealEstate {
                property_type,
                budget: Some("1000000".into()),
            };
            assert_eq!(quote(&details), 200.00);
        }
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(0.1 + 0.2), 0.3);
        assert_eq!(round_cents(12.344), 12.34);
        assert_eq!(round_cents(60.000000001), 60.0);
    }
}
