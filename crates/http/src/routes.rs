/// The page handler selected by the `handler` query parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageHandler {
    /// No handler: render the landing page.
    Index,
    Storage,
    Cosmos,
}

impl PageHandler {
    /// Selects the handler for a request query string.
    ///
    /// Handler names match case-insensitively. Returns `None` for an unknown
    /// handler name.
    pub fn from_query(query: Option<&str>) -> Option<Self> {
        let name = query.and_then(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .find(|(key, _)| key.eq_ignore_ascii_case("handler"))
                .map(|(_, value)| value.into_owned())
        });
        match name.as_deref() {
            None | Some("") => Some(Self::Index),
            Some(n) if n.eq_ignore_ascii_case("storage") => Some(Self::Storage),
            Some(n) if n.eq_ignore_ascii_case("cosmos") => Some(Self::Cosmos),
            Some(_) => None,
        }
    }

    /// The route recorded on request spans.
    pub fn route(&self) -> &'static str {
        match self {
            Self::Index => "/",
            Self::Storage => "/?handler=Storage",
            Self::Cosmos => "/?handler=Cosmos",
        }
    }
}

/// Whether a path addresses the index page.
pub(crate) fn is_index_path(path: &str) -> bool {
    let path = path.trim_end_matches('/');
    path.is_empty() || path.eq_ignore_ascii_case("/index")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_from_query() {
        assert_eq!(PageHandler::from_query(None), Some(PageHandler::Index));
        assert_eq!(PageHandler::from_query(Some("")), Some(PageHandler::Index));
        assert_eq!(PageHandler::from_query(Some("handler=")), Some(PageHandler::Index));
        assert_eq!(
            PageHandler::from_query(Some("handler=Storage")),
            Some(PageHandler::Storage)
        );
        assert_eq!(
            PageHandler::from_query(Some("x=1&handler=cosmos")),
            Some(PageHandler::Cosmos)
        );
        assert_eq!(PageHandler::from_query(Some("handler=Sql")), None);
    }

    #[test]
    fn index_paths() {
        assert!(is_index_path("/"));
        assert!(is_index_path("/Index"));
        assert!(is_index_path("/index/"));
        assert!(!is_index_path("/Privacy"));
    }
}
