use serde_json::Value;
use tracing::debug;

use super::{HelpScoutClient, MAX_PAGE_SIZE};
use crate::error::{ConnectorError, Result};
use crate::models::{PagedResponse, RequestSpec};

impl HelpScoutClient {
    /// Follows `_links.next.href` until exhausted, concatenating
    /// `_embedded.<collection>` from every page in order.
    ///
    /// The first request carries `page=1` plus the caller's query; follow-up
    /// requests use the next link verbatim.
    pub async fn collect_all(&self, spec: &RequestSpec, collection: &str) -> Result<Vec<Value>> {
        let mut request = spec.clone();
        request.set_query("page", "1");

        let mut items = Vec::new();
        let mut pages = 0usize;
        loop {
            if let Some(max_pages) = self.config().max_pages {
                if pages >= max_pages {
                    return Err(ConnectorError::PageLimitExceeded { max_pages });
                }
            }

            let response = self.send(&request).await?;
            pages += 1;
            let page = PagedResponse::from_value(&response);
            items.extend(page.collection(collection));

            match page.next_link() {
                Some(next) => {
                    request = RequestSpec::new(spec.method.clone(), next)
                        .with_body(spec.body.clone());
                }
                None => break,
            }
        }

        debug!(collection, pages, items = items.len(), "collected help scout pages");
        Ok(items)
    }

    /// Single page request capped at `limit` records.
    pub async fn fetch_limited(
        &self,
        spec: &RequestSpec,
        collection: &str,
        limit: usize,
    ) -> Result<Vec<Value>> {
        let mut request = spec.clone();
        request.set_query("pageSize", limit.min(MAX_PAGE_SIZE).to_string());

        let response = self.send(&request).await?;
        let mut items = embedded_items(&response, collection);
        items.truncate(limit);
        Ok(items)
    }
}

pub fn embedded_items(response: &Value, collection: &str) -> Vec<Value> {
    PagedResponse::from_value(response).collection(collection)
}

/// Drops `_links` and hoists each `_embedded` collection to the top level.
pub fn simplify_response(value: Value) -> Value {
    let Value::Object(mut map) = value else {
        return value;
    };

    map.remove("_links");
    if let Some(Value::Object(embedded)) = map.remove("_embedded") {
        for (key, collection) in embedded {
            map.insert(key, collection);
        }
    }
    Value::Object(map)
}

/// Trailing numeric path segment of a resource link, e.g. a `Location` URL.
pub fn extract_id_from_link(link: &str) -> Option<u64> {
    link.rsplit('/').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{embedded_items, extract_id_from_link, simplify_response};

    #[test]
    fn embedded_items_missing_collection_is_empty() {
        let response = json!({"_embedded": {"tags": [{"id": 1}]}});
        assert_eq!(embedded_items(&response, "tags").len(), 1);
        assert!(embedded_items(&response, "users").is_empty());
        assert!(embedded_items(&json!({"success": true}), "tags").is_empty());
    }

    #[test]
    fn simplify_hoists_embedded_and_drops_links() {
        let simplified = simplify_response(json!({
            "id": 5,
            "_links": {"self": {"href": "x"}},
            "_embedded": {"threads": []}
        }));
        assert_eq!(simplified, json!({"id": 5, "threads": []}));
    }

    #[test]
    fn extract_id_reads_last_segment() {
        assert_eq!(
            extract_id_from_link("https://api.helpscout.net/v2/conversations/123"),
            Some(123)
        );
        assert_eq!(
            extract_id_from_link("https://api.helpscout.net/v2/customers/9/"),
            None
        );
        assert_eq!(extract_id_from_link("https://api.helpscout.net/v2/users/me"), None);
    }
}
