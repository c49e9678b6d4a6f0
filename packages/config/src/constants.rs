// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across Quadbase

// Server
pub const QUADBASE_HOST: &str = "QUADBASE_HOST";
pub const QUADBASE_PORT: &str = "QUADBASE_PORT";
pub const PORT: &str = "PORT"; // Legacy

// CORS
pub const QUADBASE_CORS_ORIGIN: &str = "QUADBASE_CORS_ORIGIN";

// Storage
pub const QUADBASE_DATABASE_PATH: &str = "QUADBASE_DATABASE_PATH";
pub const QUADBASE_MEDIA_DIR: &str = "QUADBASE_MEDIA_DIR";
pub const QUADBASE_MAX_UPLOAD_BYTES: &str = "QUADBASE_MAX_UPLOAD_BYTES";

// Logging
pub const RUST_LOG: &str = "RUST_LOG";

// System Environment Variables
pub const HOME: &str = "HOME";
