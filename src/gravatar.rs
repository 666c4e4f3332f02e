use md5::{Digest, Md5};

/// Gravatar image for an e-mail address: 200px, rated PG, "mystery person"
/// fallback when the address has no gravatar.
pub fn avatar_url(email: &str) -> String {
    let normalized = email.trim().to_lowercase();
    let hash = Md5::digest(normalized.as_bytes());
    format!("//www.gravatar.com/avatar/{:x}?s=200&r=pg&d=mm", hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_normalized_address() {
        assert_eq!(
            avatar_url(" MyEmailAddress@example.com "),
            "//www.gravatar.com/avatar/0bc83cb571cd1c50ba6f3e8a78ef1346?s=200&r=pg&d=mm"
        );
    }
}
