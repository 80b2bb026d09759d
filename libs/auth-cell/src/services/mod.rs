pub mod memory;
pub mod store;
pub mod token_service;
pub mod tokens;

pub use memory::InMemoryAccountTokenStore;
pub use store::{AccountTokenStore, SupabaseAccountTokenStore};
pub use token_service::TokenService;
