mod model;
pub mod store;

pub use model::{NewUser, User};
pub use store::{PgUserStore, UserStore};
