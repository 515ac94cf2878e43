pub mod error;
pub mod factory;
pub mod local;
pub mod remote;
pub mod traits;

pub use error::StoreError;
pub use factory::create_store;
pub use local::LocalStore;
pub use remote::RemoteStore;
pub use traits::{ChangeCallback, RecordStore, Subscription};
