/// Page size used when a list request does not ask for one
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound for a requested page size
pub const MAX_PAGE_SIZE: u32 = 100;

/// Locale registered when nothing else is configured
pub const DEFAULT_LOCALE: &str = "en_US";

/// Longest accepted taxon code
pub const MAX_CODE_LENGTH: usize = 255;

/// Longest accepted translation name or slug
pub const MAX_TRANSLATION_FIELD_LENGTH: usize = 255;

/// Guard against corrupted parent chains when walking ancestors
pub const MAX_TREE_DEPTH: usize = 512;
