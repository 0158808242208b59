use serde::{Deserialize, Serialize};

/// Common record shape shared by every integration adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationItem {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub name: String,
    pub creation_time: Option<String>,
    pub last_modified_time: Option<String>,
    pub parent_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_discriminator_as_type() {
        let item = IntegrationItem {
            id: "1".to_string(),
            item_type: "contact".to_string(),
            name: "Jane Doe".to_string(),
            creation_time: None,
            last_modified_time: None,
            parent_id: None,
        };

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], json!("contact"));
        assert_eq!(value["parent_id"], json!(null));
        assert!(value.get("item_type").is_none());
    }
}
