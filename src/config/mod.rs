/// Database configuration and connection management
pub mod database;

/// Chart-of-accounts seeding from accounts.toml
pub mod accounts;
