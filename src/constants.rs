use rand::Rng;

/// File extensions accepted for listing photos (lowercase, without the dot)
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// Maximum request body size in megabytes
pub const MAX_UPLOAD_MB: usize = 16;

/// Page size used by the admin listing when no limit is given
pub const DEFAULT_PAGE_LIMIT: u64 = 50;

/// Number of submissions shown on the dashboard
pub const RECENT_SUBMISSIONS: u64 = 5;

/// Photos shown per recent submission on the dashboard
pub const RECENT_PHOTO_PREVIEW: usize = 3;

/// Description length shown on the dashboard before truncation
pub const DESCRIPTION_PREVIEW_CHARS: usize = 100;

/// Route prefix under which stored photos are served
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Unit used when a price update does not name one
pub const DEFAULT_PRICE_UNIT: &str = "kg";

/// Format of `submissions.submission_date` (local time)
pub const SUBMISSION_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format of `scrap_prices.last_updated` (UTC)
pub const PRICE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Seed price list: (category, subcategory, price, unit)
pub const DEFAULT_PRICES: [(&str, &str, f64, &str); 17] = [
    ("metal", "iron", 25.0, "kg"),
    ("metal", "copper", 650.0, "kg"),
    ("metal", "aluminum", 150.0, "kg"),
    ("electronics", "smartphones", 500.0, "piece"),
    ("electronics", "laptops", 2000.0, "piece"),
    ("electronics", "components", 120.0, "kg"),
    ("paper", "newspapers", 8.0, "kg"),
    ("paper", "books", 12.0, "kg"),
    ("paper", "cardboard", 6.0, "kg"),
    ("plastic", "pet", 20.0, "kg"),
    ("plastic", "containers", 15.0, "kg"),
    ("plastic", "mixed-plastic", 10.0, "kg"),
    ("automotive", "batteries", 180.0, "piece"),
    ("automotive", "tires", 50.0, "piece"),
    ("automotive", "auto-parts", 30.0, "kg"),
    ("construction", "steel", 40.0, "kg"),
    ("construction", "concrete", 2.0, "kg"),
];

/// Generate the random prefix put in front of every stored upload
/// Eight lowercase hex characters
pub fn generate_upload_prefix() -> String {
    format!("{:08x}", rand::thread_rng().gen::<u32>())
}
