//! NOR-flash backend for the sidechain preset store.
//!
//! [`NvStore`] implements [`sidechain::PresetStorage`] on top of any
//! [`embedded_storage::nor_flash::NorFlash`] device, using one dedicated
//! erase region described by an [`NvRegion`].
//!
//! # Crate Features
//!
//! - **`defmt`**: structured logging via [`defmt`](https://docs.rs/defmt).

#![no_std]

pub mod error;
mod store;

#[cfg(test)]
mod mem_flash;

pub use error::NvError;
pub use store::{NvRegion, NvStore};
