use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Map a dotted settings key to the environment variable that sets it
pub fn to_env_var(field_path: &str) -> String {
    let mut env_var = String::from("PAJE_");
    for (i, part) in field_path.split('.').enumerate() {
        if i > 0 {
            env_var.push_str("__");
        }
        env_var.push_str(&part.to_uppercase());
    }
    env_var
}
