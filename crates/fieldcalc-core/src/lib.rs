//! # fieldcalc-core
//!
//! Core data structures for the fieldcalc formula engine.
//!
//! This crate provides the fundamental types used throughout fieldcalc:
//! - [`Value`] - Runtime values (numbers, text, booleans, dates, objects)
//! - [`ValueType`] - Coarse static types used for validation
//! - [`FieldDescriptor`] and [`FieldCatalog`] - Field declarations with
//!   display and source names
//!
//! ## Example
//!
//! ```rust
//! use fieldcalc_core::{FieldCatalog, FieldDescriptor, FieldType, Value};
//!
//! let catalog = FieldCatalog::from_fields([
//!     FieldDescriptor::new("年龄", "age", FieldType::Number),
//! ])
//! .unwrap();
//! assert_eq!(catalog.by_display_name("年龄").unwrap().source_name, "age");
//!
//! assert_eq!(Value::text("10").as_number(), Some(10.0));
//! ```

pub mod error;
pub mod field;
pub mod value;

pub use error::{Error, Result};
pub use field::{FieldCatalog, FieldDescriptor, FieldType};
pub use value::{SharedString, Value, ValueType};
