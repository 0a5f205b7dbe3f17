pub mod auth;
pub mod share;
pub mod upload;
pub mod user;

pub use auth::AuthService;
pub use share::ShareService;
pub use upload::UploadService;
pub use user::UserService;
