//! # rental-sanity
//!
//! Sanity-backed [`rental_core::DocumentStore`] for the car-rental
//! storefront.
//!
//! ```rust,ignore
//! use rental_sanity::SanityClient;
//! use rental_core::{Car, Repository};
//!
//! let store = Arc::new(SanityClient::from_env()?);
//! let cars: Repository<Car> = Repository::new(store);
//! let all = cars.list().await?;
//! ```

pub mod client;
pub mod config;
pub mod image;

pub use client::{build_groq, SanityClient};
pub use config::SanityConfig;
pub use image::image_url;
