//! URL query helpers shared by the client.

use crate::error::Result;
use url::Url;

/// Page number, page size, and sort order for a BoxCast list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationArgs {
    pub page: String,
    pub limit: u32,
    /// Empty means the API's default ordering.
    pub sort: String,
}

impl Default for PaginationArgs {
    fn default() -> Self {
        Self {
            page: "0".to_string(),
            limit: 50,
            sort: String::new(),
        }
    }
}

impl PaginationArgs {
    /// Arguments for page `page` of `limit` items in the default order.
    pub fn page(page: impl Into<String>, limit: u32) -> Self {
        Self {
            page: page.into(),
            limit,
            ..Self::default()
        }
    }

    /// Renders the arguments as a query string, including the leading `?`.
    pub fn to_query(&self) -> String {
        format!("?p={}&s={}&l={}", self.page, self.sort, self.limit)
    }

    /// Applies the arguments to `endpoint`.
    ///
    /// Endpoints without a query get the arguments appended verbatim. Endpoints that already
    /// carry a query have the arguments merged in, replacing any existing `p`, `s`, or `l`.
    pub fn apply(&self, endpoint: &str) -> Result<String> {
        if endpoint.contains('?') {
            merge_url_query_params(
                endpoint,
                [
                    ("p", self.page.as_str()),
                    ("s", self.sort.as_str()),
                    ("l", self.limit.to_string().as_str()),
                ],
            )
        } else {
            Ok(format!("{endpoint}{}", self.to_query()))
        }
    }
}

/// Shorthand for [`PaginationArgs::to_query`].
pub fn pagination_args(page: impl std::fmt::Display, limit: u32, sort: &str) -> String {
    format!("?p={page}&s={sort}&l={limit}")
}

/// Overlays `additional` onto the query of `url` and returns the re-serialized URL.
///
/// Existing pairs keep their order, blank values included. A key present in `additional`
/// replaces every existing value for that key; keys not yet present are appended in the order
/// given.
pub fn merge_url_query_params<K, V>(
    url: &str,
    additional: impl IntoIterator<Item = (K, V)>,
) -> Result<String>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut url = Url::parse(url)?;
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    for (key, value) in additional {
        let (key, value) = (key.as_ref(), value.as_ref());
        let mut replaced = false;
        pairs.retain_mut(|(k, v)| {
            if k.as_str() != key {
                return true;
            }
            if replaced {
                return false;
            }
            replaced = true;
            *v = value.to_string();
            true
        });
        if !replaced {
            pairs.push((key.to_string(), value.to_string()));
        }
    }

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(&pairs)
        .finish();
    url.set_query(if query.is_empty() { None } else { Some(&query) });
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn query_map(url: &str) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (k, v) in Url::parse(url).unwrap().query_pairs() {
            map.entry(k.into_owned()).or_default().push(v.into_owned());
        }
        map
    }

    #[test]
    fn test_pagination_args_defaults() {
        assert_eq!(PaginationArgs::default().to_query(), "?p=0&s=&l=50");
        assert_eq!(pagination_args(0, 50, ""), "?p=0&s=&l=50");
        assert_eq!(pagination_args(3, 10, "-starts_at"), "?p=3&s=-starts_at&l=10");
    }

    #[test]
    fn test_pagination_args_append_to_plain_endpoint() {
        let url = PaginationArgs::page("2", 50)
            .apply("https://api.boxcast.com/account/channels")
            .unwrap();
        assert_eq!(url, "https://api.boxcast.com/account/channels?p=2&s=&l=50");
    }

    #[test]
    fn test_pagination_args_merge_into_existing_query() {
        let url = PaginationArgs::page("1", 25)
            .apply("https://api.boxcast.com/channels/c1/broadcasts?q=timeframe%3Acurrent&p=9")
            .unwrap();
        let query = query_map(&url);
        assert_eq!(query["q"], vec!["timeframe:current"]);
        assert_eq!(query["p"], vec!["1"]);
        assert_eq!(query["s"], vec![""]);
        assert_eq!(query["l"], vec!["25"]);
    }

    #[test]
    fn test_merge_keeps_original_and_adds_new() {
        let url = format!(
            "https://api.boxcast.com/broadcasts{}",
            PaginationArgs::default().to_query()
        );
        let merged =
            merge_url_query_params(&url, [("q", "timeframe:current timeframe:future")]).unwrap();

        assert!(merged.starts_with("https://api.boxcast.com/broadcasts?"));
        let query = query_map(&merged);
        assert_eq!(query.len(), 4);
        assert_eq!(query["p"], vec!["0"]);
        assert_eq!(query["s"], vec![""]);
        assert_eq!(query["l"], vec!["50"]);
        assert_eq!(query["q"], vec!["timeframe:current timeframe:future"]);
    }

    #[test]
    fn test_merge_additional_wins_on_conflict() {
        let merged = merge_url_query_params(
            "https://api.boxcast.com/broadcasts?l=50&tag=a&tag=b",
            [("tag", "c"), ("l", "10")],
        )
        .unwrap();
        assert_eq!(merged, "https://api.boxcast.com/broadcasts?l=10&tag=c");
    }

    #[test]
    fn test_merge_without_existing_query() {
        let merged = merge_url_query_params("https://api.boxcast.com/boxcasters", [("p", "0")])
            .unwrap();
        assert_eq!(merged, "https://api.boxcast.com/boxcasters?p=0");

        let merged = merge_url_query_params(
            "https://api.boxcast.com/boxcasters",
            std::iter::empty::<(&str, &str)>(),
        )
        .unwrap();
        assert_eq!(merged, "https://api.boxcast.com/boxcasters");
    }

    #[test]
    fn test_merge_rejects_relative_url() {
        let err = merge_url_query_params("/broadcasts?p=0", [("q", "x")]).unwrap_err();
        insta::assert_snapshot!(err, @"invalid URL");
    }
}
