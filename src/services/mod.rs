pub mod auth_service;
pub mod booking_service;
pub mod session_store;
pub mod show_service;
pub mod storefront;
pub mod theme_service;
pub mod ticket_service;
pub mod ticket_type_service;

pub use auth_service::*;
pub use booking_service::*;
pub use session_store::*;
pub use show_service::*;
pub use storefront::*;
pub use theme_service::*;
pub use ticket_service::*;
pub use ticket_type_service::*;
