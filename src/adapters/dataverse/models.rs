//! Dataverse Web API response shapes

use serde::Deserialize;
use serde_json::Value;

/// One page of the `accountid` listing
#[derive(Debug, Deserialize)]
pub struct IdPageResponse {
    #[serde(default)]
    pub value: Vec<AccountIdRow>,

    /// Absolute URL of the next page
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AccountIdRow {
    #[serde(default)]
    pub accountid: Option<String>,
}

/// Detail query response; rows stay untyped so mapping can be lenient
#[derive(Debug, Deserialize)]
pub struct DetailResponse {
    #[serde(default)]
    pub value: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_page_with_next_link() {
        let page: IdPageResponse = serde_json::from_str(
            r#"{
                "@odata.context": "https://org.crm.dynamics.com/api/data/v9.2/$metadata#accounts(accountid)",
                "value": [{"@odata.etag": "W/\"1\"", "accountid": "a"}, {"accountid": null}],
                "@odata.nextLink": "https://org.crm.dynamics.com/api/data/v9.2/accounts?$skiptoken=x"
            }"#,
        )
        .unwrap();

        assert_eq!(page.value.len(), 2);
        assert_eq!(page.value[0].accountid.as_deref(), Some("a"));
        assert!(page.value[1].accountid.is_none());
        assert!(page.next_link.unwrap().contains("$skiptoken"));
    }

    #[test]
    fn test_last_page_has_no_next_link() {
        let page: IdPageResponse = serde_json::from_str(r#"{"value": []}"#).unwrap();
        assert!(page.value.is_empty());
        assert!(page.next_link.is_none());
    }
}
