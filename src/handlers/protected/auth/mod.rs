pub mod role;
pub mod whoami;

pub use role::role_put;
pub use whoami::whoami_get;
