//! Endpoint descriptors for the catalog API.

use url::Url;

use crate::catalog::BeerId;

/// One request the catalog API understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `GET beers`, optionally paged and filtered.
    Beers {
        /// 0-based page index.
        page: Option<u32>,
        per_page: Option<usize>,
        name: Option<String>,
        ids: Option<Vec<BeerId>>,
    },
    /// `GET beers/random`. Answers with a one-element array.
    RandomBeer,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Beers { .. } => "beers",
            Endpoint::RandomBeer => "beers/random",
        }
    }

    /// Query parameters in wire form. The API counts pages from 1.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Endpoint::Beers {
            page,
            per_page,
            name,
            ids,
        } = self
        {
            if let Some(page) = page {
                params.push(("page", (page + 1).to_string()));
            }
            if let Some(per_page) = per_page {
                params.push(("per_page", per_page.to_string()));
            }
            if let Some(name) = name {
                params.push(("beer_name", name.clone()));
            }
            if let Some(ids) = ids {
                let joined = ids
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join("|");
                params.push(("ids", joined));
            }
        }
        params
    }

    /// Absolute URL under `base`.
    pub fn url(&self, base: &Url) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            self.path()
        ))?;

        let params = self.query();
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}
