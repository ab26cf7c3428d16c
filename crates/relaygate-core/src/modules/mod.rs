// Modules - configuration, logging and account storage

pub mod config;
pub mod logger;
pub mod memory_repository;
pub mod repository;

pub use memory_repository::InMemoryAccountRepository;
pub use repository::{AccountErrorObserver, AccountRepository, RepoResult, RepositoryError};
