pub mod booking;
pub mod combo;
pub mod common;
pub mod pagination;
pub mod show;
pub mod theme;
pub mod ticket;
pub mod ticket_type;
pub mod user;

pub use booking::*;
pub use combo::*;
pub use common::*;
pub use pagination::*;
pub use show::*;
pub use theme::*;
pub use ticket::*;
pub use ticket_type::*;
pub use user::*;
