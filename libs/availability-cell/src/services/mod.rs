pub mod availability;
pub mod memory;
pub mod store;

pub use availability::AvailabilityService;
pub use memory::InMemoryAvailabilityStore;
pub use store::{AvailabilityStore, SupabaseAvailabilityStore};
