pub mod guard;
pub mod session;

pub use guard::{admit, guard, NavLink, NavLinks, Navigator, Route};
pub use session::{Session, SessionError};
