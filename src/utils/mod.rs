pub mod color;
pub mod jwt;
pub mod money;
pub mod phone;

pub use color::*;
pub use jwt::*;
pub use money::format_vnd;
pub use phone::*;
