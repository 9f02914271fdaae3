use serde::{Deserialize, Deserializer};

// the legacy client sends some ids as strings, so accept both
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    serde_aux::field_attributes::deserialize_number_from_string(deserializer)
}

#[derive(Deserialize)]
#[serde(try_from = "String")]
pub struct Stri64(pub i64);

impl TryFrom<String> for Stri64 {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.parse::<i64>() {
            Ok(v) => Ok(Stri64(v)),
            Err(_) => Err(format!("Wrong value {value}, can not parse to i64")),
        }
    }
}
