//! # Cart Store
//!
//! Ordered list of cars the renter intends to book, persisted as a JSON
//! array under a single storage key after every mutation.
//!
//! A [`CartStore`] is owned by one session. The browser build persists it to
//! `localStorage`; the server and tests use [`MemoryCartStorage`].

use crate::error::{FieldError, RentalError, RentalResult};
use crate::money::Amount;
use crate::period::{rental_price, RentalPeriod};
use crate::records::Car;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Storage key the cart is persisted under
pub const CART_STORAGE_KEY: &str = "cart";

/// Key/value persistence for the cart
pub trait CartStorage {
    fn load(&self, key: &str) -> RentalResult<Option<String>>;
    fn save(&mut self, key: &str, value: &str) -> RentalResult<()>;
    fn remove(&mut self, key: &str) -> RentalResult<()>;
}

/// Process-local [`CartStorage`]
#[derive(Debug, Clone, Default)]
pub struct MemoryCartStorage {
    entries: HashMap<String, String>,
}

impl MemoryCartStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw persisted value, as another reader of the storage would see it
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl CartStorage for MemoryCartStorage {
    fn load(&self, key: &str) -> RentalResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> RentalResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> RentalResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A car in the cart with its chosen dates.
///
/// Display fields are copied from the car when added so the cart renders
/// without another catalog fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Car `_id`
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(rename = "type", default)]
    pub car_type: String,
    #[serde(default)]
    pub fuel_capacity: String,
    #[serde(default)]
    pub transmission: String,
    #[serde(default)]
    pub seating_capacity: String,
    pub price_per_day: Amount,
    pub rental_start_date: DateTime<Utc>,
    pub rental_end_date: DateTime<Utc>,
    pub total_price: Amount,
    /// Resolved image URL
    #[serde(default)]
    pub image: String,
}

impl CartItem {
    /// Build a cart entry for `car` over `period`
    pub fn from_car(car: &Car, period: &RentalPeriod, image_url: Option<String>) -> Self {
        Self {
            id: car.id.clone(),
            name: car.name.clone(),
            brand: car.brand.clone().unwrap_or_default(),
            car_type: car.car_type.clone().unwrap_or_default(),
            fuel_capacity: car.fuel_capacity.clone().unwrap_or_default(),
            transmission: car.transmission.clone().unwrap_or_default(),
            seating_capacity: car.seating_capacity.clone().unwrap_or_default(),
            price_per_day: car.price_per_day,
            rental_start_date: period.start(),
            rental_end_date: period.end(),
            total_price: period.price(car.price_per_day),
            image: image_url.unwrap_or_default(),
        }
    }

    /// The item's dates as a validated period
    pub fn period(&self) -> RentalResult<RentalPeriod> {
        RentalPeriod::new(self.rental_start_date, self.rental_end_date)
    }

    /// Check date order, pricing and total
    pub fn validate(&self) -> RentalResult<()> {
        let mut errors = Vec::new();
        if self.id.is_empty() {
            errors.push(FieldError::new("id", "Car is required"));
        }
        if self.rental_end_date <= self.rental_start_date {
            errors.push(FieldError::new(
                "rentalEndDate",
                "End date must be after start date",
            ));
        }
        if !self.price_per_day.is_positive() {
            errors.push(FieldError::new(
                "pricePerDay",
                "Price per day must be positive",
            ));
        }
        let expected = rental_price(
            self.price_per_day,
            self.rental_start_date,
            self.rental_end_date,
        );
        if errors.is_empty() && self.total_price != expected {
            errors.push(FieldError::new(
                "totalPrice",
                format!(
                    "Total price must be {} for the selected dates",
                    expected.as_major()
                ),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(RentalError::Validation(errors))
        }
    }
}

/// Cart bound to a storage backend
#[derive(Debug)]
pub struct CartStore<S: CartStorage> {
    storage: S,
    items: Vec<CartItem>,
}

impl<S: CartStorage> CartStore<S> {
    /// Open the cart persisted in `storage`. An unreadable value is treated
    /// as an empty cart.
    pub fn open(storage: S) -> RentalResult<Self> {
        let items = match storage.load(CART_STORAGE_KEY)? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "Discarding unreadable cart");
                Vec::new()
            }),
            None => Vec::new(),
        };
        Ok(Self { storage, items })
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Sum of every item's total price
    pub fn total_cost(&self) -> Amount {
        self.items.iter().map(|item| item.total_price).sum()
    }

    /// Append an item. The same car may appear more than once.
    pub fn add_to_cart(&mut self, item: CartItem) -> RentalResult<()> {
        debug!(car_id = %item.id, "Adding to cart");
        let mut items = self.items.clone();
        items.push(item);
        self.commit(items)
    }

    /// Remove the first item for `car_id`. Unknown ids are a no-op.
    pub fn remove_from_cart(&mut self, car_id: &str) -> RentalResult<()> {
        let mut items = self.items.clone();
        if let Some(pos) = items.iter().position(|item| item.id == car_id) {
            items.remove(pos);
        }
        self.commit(items)
    }

    /// Replace the dates of the first item for `car_id` and reprice it.
    pub fn update_rental_dates(
        &mut self,
        car_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RentalResult<&CartItem> {
        let period = RentalPeriod::new(start, end).map_err(|_| {
            RentalError::Validation(vec![FieldError::new(
                "rentalEndDate",
                "End date must be after start date",
            )])
        })?;

        let pos = self
            .items
            .iter()
            .position(|item| item.id == car_id)
            .ok_or_else(|| RentalError::not_found("Cart item", car_id))?;

        let mut items = self.items.clone();
        let item = &mut items[pos];
        item.rental_start_date = period.start();
        item.rental_end_date = period.end();
        item.total_price = period.price(item.price_per_day);

        self.commit(items)?;
        Ok(&self.items[pos])
    }

    /// Empty the cart and erase its persisted value
    pub fn clear_cart(&mut self) -> RentalResult<()> {
        self.storage.remove(CART_STORAGE_KEY)?;
        self.items.clear();
        Ok(())
    }

    /// Take ownership of the storage backend
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Save `items`, then make them the cart's contents. A failed save
    /// leaves the cart as it was.
    fn commit(&mut self, items: Vec<CartItem>) -> RentalResult<()> {
        let raw = serde_json::to_string(&items)?;
        self.storage.save(CART_STORAGE_KEY, &raw)?;
        self.items = items;
        Ok(())
    }
}
