use core_config::FromEnv;
use core_config::retention::RetentionConfig;
use database::mongodb::MongoConfig;

pub use core_config::Environment;

/// CLI configuration, composed from the shared config components
#[derive(Clone, Debug)]
pub struct Config {
    pub mongodb: MongoConfig,
    pub retention: RetentionConfig,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let mut mongodb = MongoConfig::from_env()?;
        if mongodb.app_name.is_none() {
            mongodb = mongodb.with_app_name(env!("CARGO_PKG_NAME"));
        }
        let retention = RetentionConfig::from_env()?;

        Ok(Self {
            mongodb,
            retention,
            environment,
        })
    }
}
