const DEFAULT_PROFILE: &str = "default";

pub fn resolve_profile(requested: &str) -> String {
    let trimmed = requested.trim();
    if trimmed.is_empty() || trimmed.contains(['/', '\\']) {
        return DEFAULT_PROFILE.to_string();
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_path_like_names_fall_back() {
        assert_eq!(resolve_profile("  "), "default");
        assert_eq!(resolve_profile("../etc"), "default");
        assert_eq!(resolve_profile(" work "), "work");
    }
}
