use super::{Record, Reference};
use crate::error::{FieldError, RentalError, RentalResult};
use crate::money::Amount;
use serde::{Deserialize, Serialize};

/// Image field as stored by the document store (`{"asset": {"_ref": ...}}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub asset: Reference,
}

/// A car listing. Managed outside the storefront; read-only here apart from
/// catalog seeding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,

    /// Category (e.g. "Sport", "SUV")
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub car_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,

    pub price_per_day: Amount,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_capacity: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transmission: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seating_capacity: Option<String>,
}

impl Record for Car {
    const DOC_TYPE: &'static str = "car";
    const KIND: &'static str = "Car";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Car {
    /// Create a car with the required fields
    pub fn new(id: impl Into<String>, name: impl Into<String>, price_per_day: Amount) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            brand: None,
            car_type: None,
            image: None,
            price_per_day,
            fuel_capacity: None,
            transmission: None,
            seating_capacity: None,
        }
    }

    /// Builder: set brand
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Builder: set category
    pub fn with_type(mut self, car_type: impl Into<String>) -> Self {
        self.car_type = Some(car_type.into());
        self
    }

    /// Builder: set image asset reference
    pub fn with_image(mut self, asset_ref: impl Into<String>) -> Self {
        self.image = Some(ImageRef {
            asset: Reference::to(asset_ref),
        });
        self
    }

    /// Reject listings that could never be priced
    pub fn validate(&self) -> RentalResult<()> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        }
        if !self.price_per_day.is_positive() {
            errors.push(FieldError::new("pricePerDay", "Price per day must be positive"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(RentalError::Validation(errors))
        }
    }
}

/// Car catalog loaded from `config/cars.toml` to seed an in-memory store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CarCatalog {
    #[serde(default)]
    pub cars: Vec<Car>,
}

impl CarCatalog {
    /// Load catalog from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}
