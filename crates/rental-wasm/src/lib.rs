//! # rental-wasm
//!
//! WebAssembly bindings for the car-rental storefront.
//!
//! This crate provides:
//! - A cart persisted to `localStorage` under the `cart` key
//! - Rental day and price calculations
//! - Availability checks for the date picker
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmCart, fetchUnavailableDates, checkAvailability } from 'rental-wasm';
//!
//! await init();
//!
//! const blocked = await fetchUnavailableDates('https://api.example.com', car._id);
//! const check = checkAvailability(blocked, '2025-03-10', '2025-03-12');
//!
//! if (check.available) {
//!   const cart = new WasmCart();
//!   cart.addToCart(car, '2025-03-10T10:00:00Z', '2025-03-12T10:00:00Z');
//!   console.log('Total:', cart.totalCost());
//! }
//! ```
//!
//! ## Building
//!
//! ```bash
//! wasm-pack build --target web
//! ```

mod storage;

pub use storage::LocalStorage;

use chrono::{DateTime, NaiveDate, Utc};
use rental_core::{
    Amount, Availability, BlockingPolicy, BookingChecker, Car, CartItem, CartStore, CheckMode,
    Currency, Price, Rental, RentalError, RentalPeriod, RentalResult,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Serialize as plain JS objects and arrays (no `Map`s)
fn to_js_value<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

/// Parse an RFC 3339 timestamp, or a bare `YYYY-MM-DD` as midnight UTC
pub fn parse_instant(raw: &str) -> RentalResult<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| RentalError::InvalidRequest(format!("invalid date: {}", raw)))
}

fn parse_period(start: &str, end: &str) -> RentalResult<RentalPeriod> {
    RentalPeriod::new(parse_instant(start)?, parse_instant(end)?)
}

/// A car as returned by the catalog API, image already resolved
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarListing {
    #[serde(flatten)]
    pub car: Car,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Cart entry for `listing` between `start` and `end`
pub fn cart_item(listing: &CarListing, start: &str, end: &str) -> RentalResult<CartItem> {
    let period = parse_period(start, end)?;
    let item = CartItem::from_car(&listing.car, &period, listing.image_url.clone());
    item.validate()?;
    Ok(item)
}

/// Days blocked for `car_id` by `rentals`
pub fn blocked_days(car_id: &str, rentals: &[Rental], policy: BlockingPolicy) -> BTreeSet<NaiveDate> {
    BookingChecker::new(policy, CheckMode::default()).unavailable_dates(car_id, rentals)
}

/// Check `start..end` against a precomputed list of blocked days
pub fn check_range(unavailable: &[NaiveDate], start: &str, end: &str, mode: CheckMode) -> RentalResult<Availability> {
    let period = parse_period(start, end)?;
    let unavailable: BTreeSet<NaiveDate> = unavailable.iter().copied().collect();
    Ok(BookingChecker::new(BlockingPolicy::default(), mode).check(&unavailable, &period))
}

fn parse_option<T>(raw: Option<String>) -> Result<T, JsValue>
where
    T: std::str::FromStr<Err = String> + Default,
{
    match raw {
        Some(value) => value.parse().map_err(to_js),
        None => Ok(T::default()),
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The renter's cart, saved to `localStorage` after every change
#[wasm_bindgen]
pub struct WasmCart {
    inner: CartStore<LocalStorage>,
}

#[wasm_bindgen]
impl WasmCart {
    /// Open the cart saved in this browser. A corrupt saved value opens as
    /// an empty cart.
    #[wasm_bindgen(constructor)]
    pub fn open() -> Result<WasmCart, JsValue> {
        let storage = LocalStorage::from_window().map_err(to_js)?;
        let inner = CartStore::open(storage).map_err(to_js)?;
        Ok(Self { inner })
    }

    /// Add `car` (a catalog API car) for the given dates. Returns the new item.
    #[wasm_bindgen(js_name = addToCart)]
    pub fn add_to_cart(&mut self, car: JsValue, start: &str, end: &str) -> Result<JsValue, JsValue> {
        let listing: CarListing = serde_wasm_bindgen::from_value(car)?;
        let item = cart_item(&listing, start, end).map_err(to_js)?;
        let result = to_js_value(&item)?;
        self.inner.add_to_cart(item).map_err(to_js)?;
        Ok(result)
    }

    #[wasm_bindgen(js_name = removeFromCart)]
    pub fn remove_from_cart(&mut self, car_id: &str) -> Result<(), JsValue> {
        self.inner.remove_from_cart(car_id).map_err(to_js)
    }

    /// Change an item's dates and reprice it. Returns the updated item.
    #[wasm_bindgen(js_name = updateRentalDates)]
    pub fn update_rental_dates(&mut self, car_id: &str, start: &str, end: &str) -> Result<JsValue, JsValue> {
        let start = parse_instant(start).map_err(to_js)?;
        let end = parse_instant(end).map_err(to_js)?;
        let item = self
            .inner
            .update_rental_dates(car_id, start, end)
            .map_err(to_js)?;
        to_js_value(item)
    }

    #[wasm_bindgen(js_name = clearCart)]
    pub fn clear_cart(&mut self) -> Result<(), JsValue> {
        self.inner.clear_cart().map_err(to_js)
    }

    /// Items in the order they were added
    pub fn items(&self) -> Result<JsValue, JsValue> {
        to_js_value(self.inner.items())
    }

    /// Sum of item totals, in major units
    #[wasm_bindgen(js_name = totalCost)]
    pub fn total_cost(&self) -> f64 {
        self.inner.total_cost().as_major()
    }

    #[wasm_bindgen(getter)]
    pub fn length(&self) -> usize {
        self.inner.len()
    }

    #[wasm_bindgen(js_name = isEmpty)]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

// =============================================================================
// Pricing
// =============================================================================

/// Billable days between two instants (partial days round up)
#[wasm_bindgen(js_name = rentalDays)]
pub fn rental_days(start: &str, end: &str) -> Result<u32, JsValue> {
    let days = rental_core::rental_days(
        parse_instant(start).map_err(to_js)?,
        parse_instant(end).map_err(to_js)?,
    );
    u32::try_from(days).map_err(to_js)
}

/// `pricePerDay` times billable days, in major units
#[wasm_bindgen(js_name = rentalPrice)]
pub fn rental_price(price_per_day: f64, start: &str, end: &str) -> Result<f64, JsValue> {
    let price = rental_core::rental_price(
        Amount::from_major(price_per_day),
        parse_instant(start).map_err(to_js)?,
        parse_instant(end).map_err(to_js)?,
    );
    Ok(price.as_major())
}

/// Format an amount for display (e.g. `$297.00`)
#[wasm_bindgen(js_name = formatPrice)]
pub fn format_price(amount: f64, currency: Option<String>) -> Result<String, JsValue> {
    let currency: Currency = parse_option(currency)?;
    Ok(Price::new(Amount::from_major(amount), currency).display())
}

// =============================================================================
// Availability
// =============================================================================

/// Blocked days (`YYYY-MM-DD`) for `carId` from rental documents.
/// `policy` is `all` (default) or `exclude-cancelled`.
#[wasm_bindgen(js_name = unavailableDates)]
pub fn unavailable_dates(car_id: &str, rentals: JsValue, policy: Option<String>) -> Result<JsValue, JsValue> {
    let rentals: Vec<Rental> = serde_wasm_bindgen::from_value(rentals)?;
    let policy: BlockingPolicy = parse_option(policy)?;
    let days: Vec<NaiveDate> = blocked_days(car_id, &rentals, policy).into_iter().collect();
    to_js_value(&days)
}

/// Check a candidate range against blocked days. `mode` is `endpoints`
/// (default) or `full-range`.
#[wasm_bindgen(js_name = checkAvailability)]
pub fn check_availability(
    unavailable: JsValue,
    start: &str,
    end: &str,
    mode: Option<String>,
) -> Result<JsValue, JsValue> {
    let unavailable: Vec<NaiveDate> = serde_wasm_bindgen::from_value(unavailable)?;
    let mode: CheckMode = parse_option(mode)?;
    let availability = check_range(&unavailable, start, end, mode).map_err(to_js)?;
    to_js_value(&availability)
}

/// Fetch a car's blocked days from the storefront API
#[wasm_bindgen(js_name = fetchUnavailableDates)]
pub async fn fetch_unavailable_dates(api_base_url: String, car_id: String) -> Result<JsValue, JsValue> {
    let window = web_sys::window().ok_or_else(|| to_js("no global window"))?;
    let url = format!(
        "{}/api/v1/cars/{}/availability",
        api_base_url.trim_end_matches('/'),
        String::from(js_sys::encode_uri_component(&car_id))
    );

    let response: web_sys::Response = JsFuture::from(window.fetch_with_str(&url))
        .await?
        .dyn_into()?;
    if !response.ok() {
        return Err(to_js(format!(
            "availability request failed: HTTP {}",
            response.status()
        )));
    }

    let body = JsFuture::from(response.json()?).await?;
    js_sys::Reflect::get(&body, &JsValue::from_str("unavailableDates"))
}

/// Log to browser console
#[wasm_bindgen]
pub fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

/// Get library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
