pub mod user;
pub mod movie;
pub mod seat;
pub mod booking;
pub mod showtime;
pub mod payment;

pub use user::{User, UserStats};
pub use movie::{Movie, PriceTable, Rating, Runtime};
pub use seat::{Seat, SeatCategory, SeatId, SeatStatus};
pub use booking::{BookedMovie, Booking, BookingSeat, BookingStatus};
pub use showtime::{CategoryRule, Showtime};
pub use payment::PaymentMethod;
