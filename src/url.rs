use crate::Id;

/// Joins the base URL, endpoint, optional identifier and query parameters.
///
/// Exactly one trailing `/` is removed from `base` and one leading `/` from
/// `endpoint`. Query pairs keep their order and are not percent-encoded.
///
/// Example: `("http://h/api", "/todos", Some(5), [("done", "true")])`
/// → `"http://h/api/todos/5?done=true"`
pub fn combine(base: &str, endpoint: &str, id: Option<&Id>, query: &[(String, String)]) -> String {
    let base = base.strip_suffix('/').unwrap_or(base);
    let endpoint = endpoint.strip_prefix('/').unwrap_or(endpoint);

    let mut url = String::with_capacity(base.len() + endpoint.len() + 16);
    url.push_str(base);
    url.push('/');
    url.push_str(endpoint);

    if let Some(id) = id {
        url.push('/');
        url.push_str(&id.to_string());
    }

    if !query.is_empty() {
        url.push('?');
        for (index, (key, value)) in query.iter().enumerate() {
            if index > 0 {
                url.push('&');
            }
            url.push_str(key);
            url.push('=');
            url.push_str(value);
        }
    }

    url
}

#[cfg(test)]
mod tests {
    use super::combine;
    use crate::Id;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn single_separator_for_every_slash_combination() {
        for base in ["http://h/api", "http://h/api/"] {
            for endpoint in ["todos", "/todos"] {
                assert_eq!(combine(base, endpoint, None, &[]), "http://h/api/todos");
            }
        }
    }

    #[test]
    fn strips_only_one_slash_on_each_side() {
        assert_eq!(combine("http://h//", "//x", None, &[]), "http://h///x");
    }

    #[test]
    fn identifier_precedes_query_string() {
        let url = combine(
            "http://h/api",
            "/todos",
            Some(&Id::integer(5)),
            &pairs(&[("done", "true")]),
        );
        assert_eq!(url, "http://h/api/todos/5?done=true");
    }

    #[test]
    fn text_identifier_uses_string_form() {
        let url = combine("http://h", "users", Some(&Id::text("kit")), &[]);
        assert!(url.ends_with("/users/kit"));
    }

    #[test]
    fn query_pairs_keep_insertion_order() {
        let url = combine(
            "http://h",
            "/s",
            None,
            &pairs(&[("z", "1"), ("a", "2"), ("m", "3")]),
        );
        assert_eq!(url, "http://h/s?z=1&a=2&m=3");
        assert_eq!(url.matches('?').count(), 1);
    }

    #[test]
    fn negative_identifier_and_empty_value_are_written_verbatim() {
        let url = combine(
            "http://h",
            "/s",
            Some(&Id::integer(-3)),
            &pairs(&[("flag", ""), ("k", "v")]),
        );
        assert_eq!(url, "http://h/s/-3?flag=&k=v");
    }

    #[test]
    fn values_are_not_encoded() {
        let url = combine("http://h", "/s", None, &pairs(&[("q", "a b")]));
        assert_eq!(url, "http://h/s?q=a b");
    }
}
