pub mod pagination;
pub mod share_access;
pub mod upload;
pub mod user;

pub use pagination::*;
pub use share_access::*;
pub use upload::*;
pub use user::*;
