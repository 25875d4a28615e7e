use sha2::{Digest, Sha256};

/// SHA-256 of document content as lowercase hex
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        assert_eq!(
            content_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hash_is_content_addressed() {
        assert_eq!(content_hash("## A\nfoo"), content_hash("## A\nfoo"));
        assert_ne!(content_hash("## A\nfoo"), content_hash("## A\nfoo\n"));
    }
}
