use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Prefix of every version id
pub const VERSION_PREFIX: &str = "v_";

/// Number of content-hash hex characters embedded in a version id
pub const VERSION_HASH_CHARS: usize = 8;

/// Build a version id: `v_<unix_ms>_<first 8 hex chars of the content hash>`
pub fn version_id(tracked_at: &DateTime<Utc>, content_hash: &str) -> String {
    let short = &content_hash[..content_hash.len().min(VERSION_HASH_CHARS)];
    format!("{}{}_{}", VERSION_PREFIX, tracked_at.timestamp_millis(), short)
}

/// Generate a session id: `session_<unix_ms>_<random suffix>`
pub fn generate_session_id(now: &DateTime<Utc>) -> String {
    format!("session_{}_{}", now.timestamp_millis(), random_suffix())
}

/// Generate a feedback report id: `report_<unix_ms>_<random suffix>`
pub fn generate_report_id(now: &DateTime<Utc>) -> String {
    format!("report_{}_{}", now.timestamp_millis(), random_suffix())
}

fn random_suffix() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}

/// Lowercase a free-form name into a path/field friendly slug
pub fn slugify(name: &str, separator: char) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push(separator);
            }
            pending_sep = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    slug
}
