use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Author {
    User,
    Docchat,
    Model,
}

impl ToString for Author {
    fn to_string(&self) -> String {
        match self {
            Author::User => return Config::get(ConfigKey::Username),
            Author::Docchat => return String::from("Docchat"),
            Author::Model => {
                let model = Config::get(ConfigKey::Model);
                return model.trim_start_matches("models/").to_string();
            }
        }
    }
}
