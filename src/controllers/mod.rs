//! Экраны приложения без привязки к способу отображения: что загрузить,
//! как отфильтровать и какое сообщение показать пользователю.

pub mod bookings;
pub mod movies;
pub mod profile;

pub use bookings::{refund_eligible, MyBookings, RefundError};
pub use movies::{filter_and_sort, GenreFilter, MovieQuery, SortBy};
pub use profile::Profile;
