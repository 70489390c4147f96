use sea_query::Iden;

/// Submissions table - one row per seller listing
#[derive(Iden, Clone, Copy)]
pub enum Submissions {
    Table,
    Id,
    MaterialType,
    Title,
    Description,
    Quantity,
    Name,
    Location,
    Contact,
    Email,
    /// Stored photo filenames joined by commas
    Photos,
    SubmissionDate,
}

/// Scrap prices table - one row per (category, subcategory)
#[derive(Iden, Clone, Copy)]
pub enum ScrapPrices {
    Table,
    Id,
    Category,
    Subcategory,
    Price,
    Unit,
    LastUpdated,
}

/// Columns matched by the admin free-text search
pub const SEARCHABLE_COLUMNS: [Submissions; 7] = [
    Submissions::MaterialType,
    Submissions::Title,
    Submissions::Description,
    Submissions::Name,
    Submissions::Location,
    Submissions::Contact,
    Submissions::Email,
];
