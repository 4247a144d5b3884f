use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use secrecy::SecretString;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::search::DEFAULT_TTL_MINUTES;

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Config {
    pub application: Application,
    pub storage: Storage,
    pub jwt: Jwt,
    pub content: Content,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Application {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    #[serde(default = "default_true")]
    pub allow_guest: bool,
}

impl Application {
    pub fn get_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Storage {
    /// Profile file. Progress lives in memory only when unset.
    pub path: Option<PathBuf>,
    #[serde(
        default = "default_search_ttl",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub search_ttl_minutes: i64,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Jwt {
    pub secret: SecretString,
    pub iss: SecretString,
    pub aud: SecretString,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Content {
    pub base_url: String,
    pub user_agent: String,
    pub token: Option<SecretString>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub languages: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_search_ttl() -> i64 {
    DEFAULT_TTL_MINUTES
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

impl Config {
    pub fn new() -> Result<Self, anyhow::Error> {
        let base_path = std::env::current_dir()?;
        let config_directory = base_path.join("configuration");

        let environment: Environment = std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()
            .map_err(anyhow::Error::msg)?;

        let environment_filename = format!("{}.yaml", environment.as_str());

        let config = Figment::new()
            .merge(Yaml::file(config_directory.join("base.yaml")))
            .merge(Yaml::file(config_directory.join(environment_filename)))
            .merge(Env::prefixed("APP_").split("__"))
            .extract()?;

        Ok(config)
    }
}
