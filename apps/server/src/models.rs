//! Request and response bodies of the HTTP API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use catalog_core::taxons::{self as core_taxons, TaxonInput, TranslationInput};
use catalog_core::Page;

pub const TAXONS_PATH: &str = "/api/v1/taxons";

#[derive(Deserialize, ToSchema, Debug, Clone, Default)]
pub struct TranslationRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
}

/// Body of create, replace and patch requests.
///
/// Unknown fields are ignored. `parent: null` is kept apart from an absent
/// `parent` so that PATCH can detach a taxon.
#[derive(Deserialize, ToSchema, Debug, Clone, Default)]
pub struct TaxonRequest {
    pub code: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub parent: Option<Option<String>>,
    pub position: Option<i32>,
    pub translations: Option<BTreeMap<String, TranslationRequest>>,
}

impl From<TranslationRequest> for TranslationInput {
    fn from(t: TranslationRequest) -> Self {
        Self {
            name: t.name,
            slug: t.slug,
            description: t.description,
        }
    }
}

impl From<TaxonRequest> for TaxonInput {
    fn from(r: TaxonRequest) -> Self {
        Self {
            code: r.code,
            parent: r.parent,
            position: r.position,
            translations: r.translations.map(|translations| {
                translations
                    .into_iter()
                    .map(|(locale, t)| (locale, TranslationInput::from(t)))
                    .collect()
            }),
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone, PartialEq)]
pub struct Link {
    pub href: String,
}

impl Link {
    fn new(href: String) -> Self {
        Self { href }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct TaxonLinks {
    #[serde(rename = "self")]
    pub self_link: Link,
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct Translation {
    pub locale: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

impl From<core_taxons::TaxonTranslation> for Translation {
    fn from(t: core_taxons::TaxonTranslation) -> Self {
        Self {
            locale: t.locale,
            name: t.name,
            slug: t.slug,
            description: t.description,
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct Taxon {
    pub id: i64,
    pub code: String,
    pub position: i32,
    /// Code of the parent taxon.
    pub parent: Option<String>,
    /// Codes of the direct children.
    pub children: Vec<String>,
    pub translations: BTreeMap<String, Translation>,
    #[serde(rename = "_links")]
    pub links: TaxonLinks,
}

impl From<core_taxons::Taxon> for Taxon {
    fn from(t: core_taxons::Taxon) -> Self {
        Self {
            links: TaxonLinks {
                self_link: Link::new(format!("{TAXONS_PATH}/{}", t.id)),
            },
            id: t.id,
            code: t.code,
            position: t.position,
            parent: t.parent,
            children: t.children,
            translations: t
                .translations
                .into_iter()
                .map(|(locale, translation)| (locale, Translation::from(translation)))
                .collect(),
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct PageLinks {
    #[serde(rename = "self")]
    pub self_link: Link,
    pub first: Link,
    pub last: Link,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Link>,
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct EmbeddedTaxons {
    pub items: Vec<Taxon>,
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct TaxonPage {
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
    pub total: u64,
    #[serde(rename = "_links")]
    pub links: PageLinks,
    #[serde(rename = "_embedded")]
    pub embedded: EmbeddedTaxons,
}

fn page_link(page: u32, limit: u32) -> Link {
    Link::new(format!("{TAXONS_PATH}/?page={page}&limit={limit}"))
}

impl From<Page<core_taxons::Taxon>> for TaxonPage {
    fn from(page: Page<core_taxons::Taxon>) -> Self {
        let limit = page.limit;
        let links = PageLinks {
            self_link: page_link(page.page, limit),
            first: page_link(1, limit),
            last: page_link(page.pages, limit),
            previous: page
                .has_previous()
                .then(|| page_link(page.page.min(page.pages + 1) - 1, limit)),
            next: page.has_next().then(|| page_link(page.page + 1, limit)),
        };
        Self {
            page: page.page,
            limit,
            pages: page.pages,
            total: page.total,
            links,
            embedded: EmbeddedTaxons {
                items: page.items.into_iter().map(Taxon::from).collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::PageRequest;

    fn taxon(id: i64, code: &str) -> core_taxons::Taxon {
        core_taxons::Taxon {
            id,
            code: code.to_string(),
            parent_id: None,
            parent: None,
            position: 0,
            children: Vec::new(),
            translations: BTreeMap::new(),
            created_at: Default::default(),
            updated_at: Default::default(),
        }
    }

    #[test]
    fn request_keeps_explicit_null_parent() {
        let detach: TaxonRequest = serde_json::from_str(r#"{"parent": null}"#).unwrap();
        assert_eq!(detach.parent, Some(None));

        let absent: TaxonRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.parent, None);

        let moved: TaxonRequest = serde_json::from_str(r#"{"parent": "books"}"#).unwrap();
        assert_eq!(moved.parent, Some(Some("books".to_string())));
    }

    #[test]
    fn taxon_serializes_with_self_link() {
        let json = serde_json::to_value(Taxon::from(taxon(3, "women"))).unwrap();
        assert_eq!(json["_links"]["self"]["href"], "/api/v1/taxons/3");
        assert_eq!(json["parent"], serde_json::Value::Null);
    }

    #[test]
    fn page_links_point_at_neighbours() {
        let items = (11..=20).map(|id| taxon(id, "t")).collect();
        let page = Page::new(PageRequest::new(2, 10), 25, items);
        let json = serde_json::to_value(TaxonPage::from(page)).unwrap();

        assert_eq!(json["pages"], 3);
        assert_eq!(json["_links"]["next"]["href"], "/api/v1/taxons/?page=3&limit=10");
        assert_eq!(json["_links"]["previous"]["href"], "/api/v1/taxons/?page=1&limit=10");
        assert_eq!(json["_links"]["last"]["href"], "/api/v1/taxons/?page=3&limit=10");
        assert_eq!(json["_embedded"]["items"].as_array().unwrap().len(), 10);
    }

    #[test]
    fn last_page_has_no_next_link() {
        let page = Page::new(PageRequest::new(9, 10), 12, Vec::new());
        let json = serde_json::to_value(TaxonPage::from(page)).unwrap();
        assert!(json["_links"].get("next").is_none());
        assert_eq!(json["_links"]["previous"]["href"], "/api/v1/taxons/?page=2&limit=10");
    }
}
