mod store;

pub use store::{OpportunityStore, StoreError};
