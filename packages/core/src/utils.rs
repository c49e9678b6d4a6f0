// ABOUTME: Shared utility functions for Quadbase
// ABOUTME: Prefixed identifier generation used by every persisted record

/// Generate a record identifier of the form `<prefix>-<nanoid>`.
pub fn generate_id(prefix: &str) -> String {
    format!("{}-{}", prefix, nanoid::nanoid!(12))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id() {
        let id1 = generate_id("cmp");
        let id2 = generate_id("cmp");

        assert!(id1.starts_with("cmp-"));
        assert_eq!(id1.len(), "cmp-".len() + 12);
        assert_ne!(id1, id2);
    }
}
