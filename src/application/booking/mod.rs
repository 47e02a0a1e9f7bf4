mod access;
mod booking_queries;
mod booking_service;
mod errors;

pub use booking_queries::{
    ItemBookingSummary, can_review_item, item_booking_summary, list_for_booker, list_for_owner,
};
pub use booking_service::{ServiceDependencies, approve_booking, create_booking, get_booking};
pub use errors::{BookingApplicationError, Result};
