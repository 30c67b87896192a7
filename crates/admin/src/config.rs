use forkful_db::{ConfigError, DbConfig};

/// One ingredient to seed, with an optional default unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedIngredient {
    pub name: String,
    pub default_unit: Option<String>,
}

/// Operator configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub db: DbConfig,
    /// System GLOBAL tags to ensure exist.
    pub global_tags: Vec<String>,
    /// APPROVED ingredients to ensure exist.
    pub ingredients: Vec<SeedIngredient>,
}

impl AdminConfig {
    /// | Env Var            | Default    | Format                      |
    /// |--------------------|------------|-----------------------------|
    /// | `DATABASE_URL`     | (required) |                             |
    /// | `SEED_GLOBAL_TAGS` | empty      | `vegan,quick,dessert`       |
    /// | `SEED_INGREDIENTS` | empty      | `flour:g,milk:ml,egg`       |
    pub fn from_env() -> Result<Self, ConfigError> {
        let db = DbConfig::from_env()?;
        let global_tags = parse_list(&std::env::var("SEED_GLOBAL_TAGS").unwrap_or_default());
        let ingredients = parse_ingredients(&std::env::var("SEED_INGREDIENTS").unwrap_or_default())?;
        Ok(Self {
            db,
            global_tags,
            ingredients,
        })
    }
}

/// Split a comma-separated list, dropping blanks.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse `name[:unit]` entries.
pub fn parse_ingredients(raw: &str) -> Result<Vec<SeedIngredient>, ConfigError> {
    parse_list(raw)
        .into_iter()
        .map(|entry| {
            let (name, unit) = match entry.split_once(':') {
                Some((name, unit)) => (name.trim(), Some(unit.trim())),
                None => (entry.as_str(), None),
            };
            if name.is_empty() || unit.is_some_and(str::is_empty) {
                return Err(ConfigError::Invalid {
                    name: "SEED_INGREDIENTS",
                    value: entry.clone(),
                });
            }
            Ok(SeedIngredient {
                name: name.to_string(),
                default_unit: unit.map(str::to_string),
            })
        })
        .collect()
}
