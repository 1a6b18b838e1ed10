pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod schema;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryAccountStore;
pub use models::account::{Account, NewAccount, PublicProfile};
pub use postgres::PgAccountStore;
pub use repository::{AccountFilter, AccountStore};
