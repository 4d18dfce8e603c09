//! Field level (de)serialization helpers for form-like request bodies.

/// Strips surrounding whitespace while deserializing a string.
pub mod trimmed {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(s.trim().to_owned())
    }

    pub fn deserialize_option<'de, D>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        Ok(s.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty()))
    }
}

/// Trims and lowercases, used for case-insensitive keys such as emails.
pub mod lowercase {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(s.trim().to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Form {
        #[serde(deserialize_with = "super::lowercase::deserialize")]
        email: String,
        #[serde(deserialize_with = "super::trimmed::deserialize")]
        name: String,
        #[serde(deserialize_with = "super::trimmed::deserialize_option", default)]
        role: Option<String>,
    }

    #[test]
    fn cleans_up_form_fields() {
        let form: Form = serde_json::from_str(
            r#"{"email": "  Ana@Example.COM ", "name": " Ana ", "role": "   "}"#,
        )
        .unwrap();
        assert_eq!(form.email, "ana@example.com");
        assert_eq!(form.name, "Ana");
        assert_eq!(form.role, None);
    }

    #[test]
    fn missing_optional_field_is_none() {
        let form: Form =
            serde_json::from_str(r#"{"email": "a@b.c", "name": "A"}"#).unwrap();
        assert_eq!(form.role, None);
    }
}
