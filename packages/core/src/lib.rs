// ABOUTME: Core types, constants and utilities for Porchlight
// ABOUTME: Foundational package shared by every Porchlight package

pub mod constants;
pub mod pagination;
pub mod utils;
pub mod validation;

// Re-export constants
pub use constants::{default_database_path, porchlight_dir, DATABASE_FILE, SERVICE_NAME};

// Re-export pagination types
pub use pagination::{PaginatedResponse, PaginationMeta, PaginationParams};

// Re-export utilities
pub use utils::{escape_html, generate_code, generate_id, slugify, truncate};

// Re-export validation
pub use validation::{
    clean_optional, is_valid_email, normalize_email, normalize_phone, FieldError,
    ValidationError, Validator,
};
