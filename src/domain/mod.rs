pub mod booking;
pub mod bucket;
pub mod commands;
pub mod errors;
pub mod pagination;
pub mod value_objects;

pub use booking::{Booking, BookingState, NewBooking};
pub use bucket::{BookingBucket, BookingFilter};
pub use errors::*;
pub use pagination::Page;
pub use value_objects::*;
