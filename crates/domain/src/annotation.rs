use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical type name of the one annotation shape the service understands.
pub const CUSTOMER_ANNOTATION_TYPE: &str = "calgate.v1.CustomerAnnotation";

/// Structured customer metadata attached to an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerAnnotation {
    pub customer_source: String,
    pub customer_id: String,
    pub animal_ids: Vec<String>,
    pub created_by_user_id: String,
}

/// A self-describing envelope for opaque structured metadata.
///
/// Dispatch happens on `type_url`; both the bare canonical name and a legacy
/// `googleapis/<name>`-style prefix are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraData {
    pub type_url: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("unsupported type url for extra data: {0}")]
    UnsupportedType(String),
    #[error("malformed annotation payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ExtraData {
    pub fn new(annotation: &CustomerAnnotation) -> Self {
        Self {
            type_url: CUSTOMER_ANNOTATION_TYPE.to_string(),
            // A CustomerAnnotation always serializes to a JSON object.
            value: serde_json::to_value(annotation).unwrap_or(serde_json::Value::Null),
        }
    }

    /// Decodes the envelope into the one known annotation shape.
    pub fn decode(&self) -> Result<CustomerAnnotation, AnnotationError> {
        let mut name = self.type_url.as_str();
        if name.contains("googleapis") {
            if let Some((_, rest)) = name.split_once('/') {
                name = rest;
            }
        }

        if name != CUSTOMER_ANNOTATION_TYPE {
            return Err(AnnotationError::UnsupportedType(self.type_url.clone()));
        }

        Ok(serde_json::from_value(self.value.clone())?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_bare_canonical_name() {
        let extra = ExtraData {
            type_url: CUSTOMER_ANNOTATION_TYPE.into(),
            value: json!({ "customerId": "42", "animalIds": ["a", "b"] }),
        };

        let annotation = extra.decode().unwrap();
        assert_eq!(annotation.customer_id, "42");
        assert_eq!(annotation.animal_ids, vec!["a", "b"]);
    }

    #[test]
    fn decodes_legacy_googleapis_prefix() {
        let extra = ExtraData {
            type_url: format!("type.googleapis.com/{}", CUSTOMER_ANNOTATION_TYPE),
            value: json!({ "customerId": "42" }),
        };

        assert_eq!(extra.decode().unwrap().customer_id, "42");
    }

    #[test]
    fn rejects_unknown_type_url() {
        let extra = ExtraData {
            type_url: "calgate.v1.SomethingElse".into(),
            value: json!({}),
        };

        assert!(matches!(
            extra.decode(),
            Err(AnnotationError::UnsupportedType(_))
        ));
    }

    #[test]
    fn round_trips_through_envelope() {
        let annotation = CustomerAnnotation {
            customer_source: "crm".into(),
            customer_id: "7".into(),
            animal_ids: vec!["x".into()],
            created_by_user_id: "u-1".into(),
        };

        assert_eq!(ExtraData::new(&annotation).decode().unwrap(), annotation);
    }
}
