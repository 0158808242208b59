/// HubSpot CRM item loading
/// Pulls contacts and companies with a consumed credential blob and maps
/// them into integration items
use crate::config::FetchFailureMode;
use crate::error::{AppError, AppResult};
use crate::models::IntegrationItem;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// One CRM object collection and the properties requested for it
#[derive(Debug, Clone, Copy)]
pub struct CrmCollection {
    pub path: &'static str,
    pub item_type: &'static str,
    pub properties: &'static str,
}

pub const CONTACTS: CrmCollection = CrmCollection {
    path: "/crm/v3/objects/contacts",
    item_type: "contact",
    properties: "firstname,lastname,email,createdate,hs_lastmodifieddate",
};

pub const COMPANIES: CrmCollection = CrmCollection {
    path: "/crm/v3/objects/companies",
    item_type: "company",
    properties: "name,createdate,hs_lastmodifieddate",
};

/// Outcome of fetching a single collection
#[derive(Debug)]
pub struct CollectionFetch {
    pub collection: CrmCollection,
    pub result: Result<Vec<IntegrationItem>, String>,
}

#[derive(Debug, Deserialize)]
struct CrmPage {
    #[serde(default)]
    results: Vec<Value>,
}

pub struct HubSpotItemsService {
    client: Client,
    api_base_url: String,
    failure_mode: FetchFailureMode,
}

impl HubSpotItemsService {
    pub fn new(client: Client, api_base_url: String, failure_mode: FetchFailureMode) -> Self {
        Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            failure_mode,
        }
    }

    /// Load contacts, then companies, for the given credential blob
    pub async fn get_items(&self, credentials: &str) -> AppResult<Vec<IntegrationItem>> {
        let access_token = access_token_from(credentials)?;

        let mut items = Vec::new();
        for collection in [CONTACTS, COMPANIES] {
            let fetch = self.fetch_collection(&access_token, collection).await;
            match fetch.result {
                Ok(mut batch) => items.append(&mut batch),
                Err(reason) => match self.failure_mode {
                    FetchFailureMode::Skip => {
                        warn!(
                            "Skipping HubSpot {} collection: {}",
                            fetch.collection.item_type, reason
                        );
                    }
                    FetchFailureMode::Fail => {
                        return Err(AppError::ExternalServiceError(format!(
                            "Failed to fetch HubSpot {} collection: {}",
                            fetch.collection.item_type, reason
                        )));
                    }
                },
            }
        }

        info!("Loaded {} HubSpot integration items", items.len());
        Ok(items)
    }

    /// Fetch the first page of one collection as an independent result
    pub async fn fetch_collection(
        &self,
        access_token: &str,
        collection: CrmCollection,
    ) -> CollectionFetch {
        let url = format!("{}{}", self.api_base_url, collection.path);
        debug!("Fetching HubSpot {} from {}", collection.item_type, url);

        let result = self.fetch_page(&url, access_token, collection).await;

        CollectionFetch { collection, result }
    }

    async fn fetch_page(
        &self,
        url: &str,
        access_token: &str,
        collection: CrmCollection,
    ) -> Result<Vec<IntegrationItem>, String> {
        let response = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .query(&[("properties", collection.properties)])
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status));
        }

        let page: CrmPage = response
            .json()
            .await
            .map_err(|e| format!("invalid response body: {}", e))?;

        Ok(page
            .results
            .iter()
            .map(|record| create_integration_item(record, collection.item_type))
            .collect())
    }
}

fn access_token_from(credentials: &str) -> AppResult<String> {
    let credentials: Value = serde_json::from_str(credentials)
        .map_err(|_| AppError::BadRequest("Invalid credentials.".to_string()))?;

    credentials
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::BadRequest("Credentials have no access_token.".to_string()))
}

/// Map one raw CRM record into an integration item. Never fails: missing
/// fields fall back to generated names.
pub fn create_integration_item(record: &Value, item_type: &str) -> IntegrationItem {
    let empty = Map::new();
    let properties = record
        .get("properties")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let id = record.get("id").map(scalar_to_string).unwrap_or_default();

    let name = match item_type {
        "contact" => {
            let firstname = string_property(properties, "firstname").unwrap_or_default();
            let lastname = string_property(properties, "lastname").unwrap_or_default();
            let full_name = format!("{} {}", firstname, lastname).trim().to_string();

            if !full_name.is_empty() {
                full_name
            } else {
                string_property(properties, "email")
                    .filter(|email| !email.is_empty())
                    .unwrap_or_else(|| format!("Contact {}", id))
            }
        }
        "company" => string_property(properties, "name")
            .unwrap_or_else(|| format!("Company {}", id)),
        other => format!("{} {}", capitalize(other), id),
    };

    IntegrationItem {
        id,
        item_type: item_type.to_string(),
        name,
        creation_time: string_property(properties, "createdate"),
        last_modified_time: string_property(properties, "hs_lastmodifieddate"),
        parent_id: None,
    }
}

/// Null properties count as absent
fn string_property(properties: &Map<String, Value>, key: &str) -> Option<String> {
    match properties.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => Some(scalar_to_string(value)),
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    const CREDENTIALS: &str = r#"{"access_token": "at-123", "expires_in": 1800}"#;

    #[test]
    fn test_contact_name_from_first_and_last() {
        let item = create_integration_item(
            &json!({"id": "1", "properties": {"firstname": "Jane", "lastname": "Doe"}}),
            "contact",
        );
        assert_eq!(item.name, "Jane Doe");
        assert_eq!(item.item_type, "contact");
        assert_eq!(item.parent_id, None);
    }

    #[test]
    fn test_contact_name_fallbacks() {
        let only_first = create_integration_item(
            &json!({"id": "5", "properties": {"firstname": "Jane"}}),
            "contact",
        );
        assert_eq!(only_first.name, "Jane");

        let email = create_integration_item(
            &json!({"id": "6", "properties": {"firstname": null, "email": "jane@example.com"}}),
            "contact",
        );
        assert_eq!(email.name, "jane@example.com");

        let empty_email = create_integration_item(
            &json!({"id": "8", "properties": {"firstname": "", "email": ""}}),
            "contact",
        );
        assert_eq!(empty_email.name, "Contact 8");

        let bare = create_integration_item(&json!({"id": "2", "properties": {}}), "contact");
        assert_eq!(bare.name, "Contact 2");

        let no_properties = create_integration_item(&json!({"id": 7}), "contact");
        assert_eq!(no_properties.id, "7");
        assert_eq!(no_properties.name, "Contact 7");
    }

    #[test]
    fn test_company_name() {
        let named =
            create_integration_item(&json!({"id": "3", "properties": {"name": "Acme"}}), "company");
        assert_eq!(named.name, "Acme");

        let unnamed = create_integration_item(&json!({"id": "4", "properties": {}}), "company");
        assert_eq!(unnamed.name, "Company 4");
    }

    #[test]
    fn test_other_types_are_capitalized() {
        let item = create_integration_item(&json!({"id": "9"}), "DEAL");
        assert_eq!(item.name, "Deal 9");
        assert_eq!(item.item_type, "DEAL");
    }

    #[test]
    fn test_timestamps_carried_through() {
        let item = create_integration_item(
            &json!({"id": "1", "properties": {
                "createdate": "2024-01-02T03:04:05.000Z",
                "hs_lastmodifieddate": "2024-02-03T04:05:06.000Z"
            }}),
            "company",
        );
        assert_eq!(item.creation_time.as_deref(), Some("2024-01-02T03:04:05.000Z"));
        assert_eq!(
            item.last_modified_time.as_deref(),
            Some("2024-02-03T04:05:06.000Z")
        );
    }

    async fn mock_collection(
        server: &MockServer,
        collection: CrmCollection,
        response: ResponseTemplate,
    ) {
        Mock::given(method("GET"))
            .and(path(collection.path))
            .and(header("authorization", "Bearer at-123"))
            .and(query_param("properties", collection.properties))
            .respond_with(response)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_contacts_then_companies_in_order() {
        let server = MockServer::start().await;
        mock_collection(
            &server,
            CONTACTS,
            ResponseTemplate::new(200).set_body_json(json!({"results": [
                {"id": "1", "properties": {"firstname": "Jane", "lastname": "Doe"}},
                {"id": "2", "properties": {}}
            ]})),
        )
        .await;
        mock_collection(
            &server,
            COMPANIES,
            ResponseTemplate::new(200).set_body_json(json!({"results": [
                {"id": "3", "properties": {"name": "Acme"}}
            ]})),
        )
        .await;

        let service =
            HubSpotItemsService::new(reqwest::Client::new(), server.uri(), FetchFailureMode::Skip);
        let items = service.get_items(CREDENTIALS).await.unwrap();

        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Jane Doe", "Contact 2", "Acme"]);
        let types: Vec<_> = items.iter().map(|i| i.item_type.as_str()).collect();
        assert_eq!(types, vec!["contact", "contact", "company"]);
    }

    #[tokio::test]
    async fn test_failed_companies_skipped() {
        let server = MockServer::start().await;
        mock_collection(
            &server,
            CONTACTS,
            ResponseTemplate::new(200).set_body_json(json!({"results": [
                {"id": "1", "properties": {"firstname": "Jane", "lastname": "Doe"}},
                {"id": "2", "properties": {"email": "b@example.com"}}
            ]})),
        )
        .await;
        mock_collection(&server, COMPANIES, ResponseTemplate::new(500)).await;

        let service =
            HubSpotItemsService::new(reqwest::Client::new(), server.uri(), FetchFailureMode::Skip);
        let items = service.get_items(CREDENTIALS).await.unwrap();

        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.item_type == "contact"));
        assert_eq!(items[0].id, "1");
        assert_eq!(items[1].name, "b@example.com");
    }

    #[tokio::test]
    async fn test_failed_companies_abort_in_fail_mode() {
        let server = MockServer::start().await;
        mock_collection(
            &server,
            CONTACTS,
            ResponseTemplate::new(200).set_body_json(json!({"results": []})),
        )
        .await;
        mock_collection(&server, COMPANIES, ResponseTemplate::new(500)).await;

        let service =
            HubSpotItemsService::new(reqwest::Client::new(), server.uri(), FetchFailureMode::Fail);
        let result = service.get_items(CREDENTIALS).await;

        assert!(matches!(result, Err(AppError::ExternalServiceError(_))));
    }

    #[tokio::test]
    async fn test_fetch_collection_reports_status() {
        let server = MockServer::start().await;
        mock_collection(&server, CONTACTS, ResponseTemplate::new(401)).await;

        let service =
            HubSpotItemsService::new(reqwest::Client::new(), server.uri(), FetchFailureMode::Skip);
        let fetch = service.fetch_collection("at-123", CONTACTS).await;

        assert_eq!(fetch.collection.item_type, "contact");
        assert!(fetch.result.unwrap_err().contains("401"));
    }

    #[tokio::test]
    async fn test_invalid_credentials_rejected() {
        let service = HubSpotItemsService::new(
            reqwest::Client::new(),
            "http://unused".to_string(),
            FetchFailureMode::Skip,
        );

        assert!(matches!(
            service.get_items("not json").await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            service.get_items(r#"{"refresh_token": "rt"}"#).await,
            Err(AppError::BadRequest(_))
        ));
    }
}
