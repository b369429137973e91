//! # zoned-range
//!
//! DST-safe date-time range selection.
//!
//! A date-range picker collects a start and end as wall-clock readings in
//! some IANA timezone. This crate turns those readings into absolute
//! instants without tripping over Daylight Saving Time, and checks the
//! resulting range against a set of constraints.
//!
//! ## Modules
//!
//! - [`civil`] — Shared vocabulary: instants, civil dates and times, ranges
//! - [`oracle`] — The injected timezone rules (`chrono-tz` or fixed offsets)
//! - [`dst`] — Gap and overlap policies for DST transitions
//! - [`resolver`] — Civil date-time ⇄ instant conversion by bisection
//! - [`constraints`] — Constraint sets, loadable from JSON
//! - [`validator`] — Ordered rule evaluation over a resolved range
//! - [`error`] — Error types
//!
//! The resolver and the validator are independent: resolve civil inputs to
//! instants first, then validate the instant pair.
//!
//! ```
//! use zoned_range::{CivilDate, ConstraintConfig, DateTimeRange, RangeValidator, TimezoneResolver};
//!
//! let resolver = TimezoneResolver::tzdb();
//! let day = CivilDate::new(2024, 3, 15).unwrap();
//! let start = resolver.resolve_input(day, "9:00am", "America/New_York").unwrap();
//! let end = resolver.resolve_input(day, "5:30pm", "America/New_York").unwrap();
//!
//! let constraints = ConstraintConfig::new().with_max_duration_minutes(8 * 60);
//! let error = RangeValidator::with_projection(chrono_tz::America::New_York)
//!     .validate(&DateTimeRange::new(start, end), &constraints)
//!     .unwrap();
//! assert_eq!(error.to_string(), "Range must be at most 480 minutes");
//! ```

pub mod civil;
pub mod constraints;
pub mod dst;
pub mod error;
pub mod oracle;
pub mod resolver;
pub mod validator;

pub use civil::{
    CivilDate, CivilDateTime, CivilProjection, CivilTimeOfDay, DateTimeRange, Instant,
};
pub use constraints::ConstraintConfig;
pub use dst::{DstPolicy, GapPolicy, OverlapPolicy};
pub use error::{RangeError, Result};
pub use oracle::{FixedOffsetOracle, OffsetOracle, TzdbOracle};
pub use resolver::{LocalResolution, TimezoneResolver, ZonedInstant};
pub use validator::{RangeValidator, ValidationError, ValidationErrorKind};
