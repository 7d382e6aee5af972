use std::time::Duration;

/// Tunables for one game session.
///
/// Passed explicitly into [`crate::session::GameSession`] at construction;
/// nothing in the engine reads the environment ambiently. The embedding bot
/// can use [`GameConfig::from_env`] once at startup.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Exclusive upper bound of the provider's category id space. Standard
    /// game assembly samples candidate categories from `0..max_category_id`.
    pub max_category_id: u32,
    /// Minimum bigram-overlap score accepted as a correct answer (0.0–1.0).
    pub similarity_threshold: f64,
    /// How long players get to answer an open clue. Attempt-dedup markers
    /// live twice this long so a late duplicate inside the window is still
    /// caught.
    pub answer_window: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_category_id: 18_500,
            similarity_threshold: 0.5,
            answer_window: Duration::from_secs(30),
        }
    }
}

impl GameConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults field by field. Honors a `.env` file if present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Self {
            max_category_id: std::env::var("MAX_CATEGORY_ID")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_category_id),
            similarity_threshold: std::env::var("SIMILARITY_THRESHOLD")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.similarity_threshold),
            answer_window: std::env::var("ANSWER_TIME_SECONDS")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.answer_window),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_default_config() {
        let config = GameConfig::default();
        assert_eq!(config.max_category_id, 18_500);
        assert_eq!(config.similarity_threshold, 0.5);
        assert_eq!(config.answer_window, Duration::from_secs(30));
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        std::env::set_var("MAX_CATEGORY_ID", "500");
        std::env::set_var("SIMILARITY_THRESHOLD", "0.7");
        std::env::set_var("ANSWER_TIME_SECONDS", "45");

        let config = GameConfig::from_env();
        assert_eq!(config.max_category_id, 500);
        assert_eq!(config.similarity_threshold, 0.7);
        assert_eq!(config.answer_window, Duration::from_secs(45));

        std::env::remove_var("MAX_CATEGORY_ID");
        std::env::remove_var("SIMILARITY_THRESHOLD");
        std::env::remove_var("ANSWER_TIME_SECONDS");
    }

    #[test]
    #[serial]
    fn test_from_env_ignores_garbage() {
        std::env::set_var("SIMILARITY_THRESHOLD", "not a number");
        let config = GameConfig::from_env();
        assert_eq!(config.similarity_threshold, 0.5);
        std::env::remove_var("SIMILARITY_THRESHOLD");
    }
}
