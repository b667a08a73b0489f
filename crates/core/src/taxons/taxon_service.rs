//! Taxon service implementation.
//!
//! Checks that read stored taxons run inside the repository's write
//! transaction through a [`TaxonPlan`], so two concurrent requests cannot
//! both pass a check that only one of them may pass.

use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

use crate::constants::MAX_TREE_DEPTH;
use crate::errors::{DatabaseError, FieldErrors};
use crate::locales::LocaleServiceTrait;
use crate::pagination::{Page, PageRequest};
use crate::{Error, Result};

use super::{
    NewTaxon, Taxon, TaxonInput, TaxonReader, TaxonRepositoryTrait, TaxonServiceTrait,
    TaxonTranslation, TaxonUpdate,
};

pub struct TaxonService {
    repository: Arc<dyn TaxonRepositoryTrait>,
    locales: Arc<dyn LocaleServiceTrait>,
}

impl TaxonService {
    pub fn new(
        repository: Arc<dyn TaxonRepositoryTrait>,
        locales: Arc<dyn LocaleServiceTrait>,
    ) -> Self {
        Self {
            repository,
            locales,
        }
    }

    /// One error per locale that is not in the registry.
    fn check_locales<'a>(&self, locales: impl Iterator<Item = &'a str>) -> Result<FieldErrors> {
        let mut errors = FieldErrors::default();
        for locale in locales {
            if !self.locales.is_registered(locale)? {
                errors.add(
                    format!("translations.{locale}"),
                    format!("Locale '{locale}' is not registered."),
                );
            }
        }
        Ok(errors)
    }
}

fn submitted_locales(input: &TaxonInput) -> impl Iterator<Item = &str> {
    input
        .translations
        .iter()
        .flat_map(|translations| translations.keys())
        .map(String::as_str)
}

fn not_found(id: i64) -> Error {
    DatabaseError::NotFound(format!("Taxon {id} not found")).into()
}

fn require_taxon(reader: &mut dyn TaxonReader, id: i64) -> Result<Taxon> {
    reader.get_taxon(id)?.ok_or_else(|| not_found(id))
}

fn check_slugs(
    reader: &mut dyn TaxonReader,
    taxon_id: Option<i64>,
    translations: &[TaxonTranslation],
    errors: &mut FieldErrors,
) -> Result<()> {
    for translation in translations {
        let owner = reader.find_slug_owner(&translation.locale, &translation.slug)?;
        if owner.is_some() && owner != taxon_id {
            errors.add(
                format!("translations.{}.slug", translation.locale),
                "Taxon slug must be unique.",
            );
        }
    }
    Ok(())
}

/// Resolves a parent code to an id. For an existing taxon the parent must
/// not be the taxon itself or one of its descendants.
fn resolve_parent(
    reader: &mut dyn TaxonReader,
    taxon_id: Option<i64>,
    parent_code: Option<&str>,
    errors: &mut FieldErrors,
) -> Result<Option<i64>> {
    let Some(code) = parent_code else {
        return Ok(None);
    };
    let Some(parent) = reader.get_taxon_by_code(code)? else {
        errors.add("parent", format!("Parent taxon '{code}' does not exist."));
        return Ok(None);
    };

    if let Some(id) = taxon_id {
        let mut cursor = Some(parent.id);
        let mut depth = 0;
        while let Some(ancestor) = cursor {
            if ancestor == id {
                errors.add("parent", "Taxon cannot be moved under itself or its children.");
                return Ok(None);
            }
            depth += 1;
            if depth > MAX_TREE_DEPTH {
                return Err(Error::ConstraintViolation(format!(
                    "Taxon tree above '{code}' is deeper than {MAX_TREE_DEPTH} levels"
                )));
            }
            cursor = reader.get_parent_id(ancestor)?;
        }
    }

    Ok(Some(parent.id))
}

/// Keeps the current position unless the taxon moves to another parent.
fn keep_position(current: &Taxon, parent_id: Option<i64>, requested: Option<i32>) -> Option<i32> {
    requested.or_else(|| (parent_id == current.parent_id).then_some(current.position))
}

#[async_trait]
impl TaxonServiceTrait for TaxonService {
    fn get_taxons(&self, request: PageRequest) -> Result<Page<Taxon>> {
        let total = self.repository.count_taxons()?;
        let items = self
            .repository
            .list_taxons(request.offset(), i64::from(request.limit()))?;
        Ok(Page::new(request, total, items))
    }

    fn get_taxon(&self, id: i64) -> Result<Taxon> {
        self.repository.get_taxon(id)?.ok_or_else(|| not_found(id))
    }

    async fn create_taxon(&self, input: TaxonInput) -> Result<Taxon> {
        let validated = input.validate_create()?;
        let locale_errors =
            self.check_locales(validated.translations.iter().map(|t| t.locale.as_str()))?;

        debug!("Creating taxon {}", validated.code);
        self.repository
            .create_taxon(Box::new(
                move |reader: &mut dyn TaxonReader| -> Result<NewTaxon> {
                    let mut errors = locale_errors;
                    if reader.get_taxon_by_code(&validated.code)?.is_some() {
                        errors.add("code", "Taxon with given code already exists.");
                    }
                    let parent_id =
                        resolve_parent(reader, None, validated.parent.as_deref(), &mut errors)?;
                    check_slugs(reader, None, &validated.translations, &mut errors)?;
                    errors.into_result()?;

                    Ok(NewTaxon {
                        code: validated.code,
                        parent_id,
                        position: validated.position,
                        translations: validated.translations,
                    })
                },
            ))
            .await
    }

    async fn replace_taxon(&self, id: i64, input: TaxonInput) -> Result<Taxon> {
        let locale_errors = self.check_locales(submitted_locales(&input))?;

        debug!("Replacing taxon {}", id);
        self.repository
            .update_taxon(Box::new(
                move |reader: &mut dyn TaxonReader| -> Result<TaxonUpdate> {
                    let current = require_taxon(reader, id)?;
                    let validated = input.validate_replace(&current.code)?;

                    let mut errors = locale_errors;
                    let parent_id =
                        resolve_parent(reader, Some(id), validated.parent.as_deref(), &mut errors)?;
                    check_slugs(reader, Some(id), &validated.translations, &mut errors)?;
                    errors.into_result()?;

                    Ok(TaxonUpdate {
                        id,
                        parent_id,
                        position: keep_position(&current, parent_id, validated.position),
                        translations: validated.translations,
                    })
                },
            ))
            .await
    }

    async fn patch_taxon(&self, id: i64, input: TaxonInput) -> Result<Taxon> {
        let locale_errors = self.check_locales(submitted_locales(&input))?;

        debug!("Patching taxon {}", id);
        self.repository
            .update_taxon(Box::new(
                move |reader: &mut dyn TaxonReader| -> Result<TaxonUpdate> {
                    // Merge into the stored state as seen by this transaction.
                    let current = require_taxon(reader, id)?;
                    let validated = input.validate_patch(&current)?;

                    let mut errors = locale_errors;
                    let parent_id = match &validated.parent {
                        Some(parent) => {
                            resolve_parent(reader, Some(id), parent.as_deref(), &mut errors)?
                        }
                        None => current.parent_id,
                    };
                    check_slugs(reader, Some(id), &validated.translations, &mut errors)?;
                    errors.into_result()?;

                    Ok(TaxonUpdate {
                        id,
                        parent_id,
                        position: keep_position(&current, parent_id, validated.position),
                        translations: validated.translations,
                    })
                },
            ))
            .await
    }

    async fn delete_taxon(&self, id: i64) -> Result<()> {
        let deleted = self.repository.delete_taxon(id).await?;
        if deleted == 0 {
            return Err(not_found(id));
        }
        debug!("Deleted taxon {} ({} rows)", id, deleted);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ValidationError;
    use crate::taxons::{TaxonPlan, TranslationInput};
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Registry that knows a fixed set of locales.
    struct FixedLocales(Vec<&'static str>);

    #[async_trait]
    impl LocaleServiceTrait for FixedLocales {
        fn get_locales(&self) -> Result<Vec<crate::locales::Locale>> {
            Ok(Vec::new())
        }

        fn is_registered(&self, code: &str) -> Result<bool> {
            Ok(self.0.iter().any(|known| *known == code))
        }

        async fn ensure_locales(&self, _codes: &[String]) -> Result<Vec<crate::locales::Locale>> {
            Ok(Vec::new())
        }
    }

    /// Hydrated view of the stored rows.
    fn hydrate(rows: &[Taxon], mut taxon: Taxon) -> Taxon {
        taxon.parent = taxon
            .parent_id
            .and_then(|pid| rows.iter().find(|t| t.id == pid))
            .map(|p| p.code.clone());
        taxon.children = rows
            .iter()
            .filter(|t| t.parent_id == Some(taxon.id))
            .map(|t| t.code.clone())
            .collect();
        taxon
    }

    fn next_position(rows: &[Taxon], parent_id: Option<i64>) -> i32 {
        rows.iter()
            .filter(|t| t.parent_id == parent_id)
            .map(|t| t.position + 1)
            .max()
            .unwrap_or(0)
    }

    struct RowsReader<'a>(&'a [Taxon]);

    impl TaxonReader for RowsReader<'_> {
        fn get_taxon(&mut self, id: i64) -> Result<Option<Taxon>> {
            Ok(self
                .0
                .iter()
                .find(|t| t.id == id)
                .map(|t| hydrate(self.0, t.clone())))
        }

        fn get_taxon_by_code(&mut self, code: &str) -> Result<Option<Taxon>> {
            Ok(self
                .0
                .iter()
                .find(|t| t.code == code)
                .map(|t| hydrate(self.0, t.clone())))
        }

        fn get_parent_id(&mut self, id: i64) -> Result<Option<i64>> {
            Ok(self.0.iter().find(|t| t.id == id).and_then(|t| t.parent_id))
        }

        fn find_slug_owner(&mut self, locale: &str, slug: &str) -> Result<Option<i64>> {
            Ok(self
                .0
                .iter()
                .find(|t| t.translation(locale).is_some_and(|tr| tr.slug == slug))
                .map(|t| t.id))
        }
    }

    /// Plans run while the row lock is held, like the SQLite writer.
    #[derive(Default)]
    struct InMemoryTaxons {
        rows: Mutex<Vec<Taxon>>,
    }

    impl InMemoryTaxons {
        fn rows(&self) -> std::sync::MutexGuard<'_, Vec<Taxon>> {
            self.rows.lock().unwrap()
        }
    }

    #[async_trait]
    impl TaxonRepositoryTrait for InMemoryTaxons {
        fn count_taxons(&self) -> Result<u64> {
            Ok(self.rows().len() as u64)
        }

        fn list_taxons(&self, offset: i64, limit: i64) -> Result<Vec<Taxon>> {
            let rows = self.rows();
            Ok(rows
                .iter()
                .skip(offset as usize)
                .take(limit as usize)
                .map(|t| hydrate(&rows, t.clone()))
                .collect())
        }

        fn get_taxon(&self, id: i64) -> Result<Option<Taxon>> {
            RowsReader(&self.rows()).get_taxon(id)
        }

        async fn create_taxon(&self, plan: TaxonPlan<NewTaxon>) -> Result<Taxon> {
            let mut rows = self.rows();
            let taxon = plan(&mut RowsReader(&rows))?;
            let id = rows.iter().map(|t| t.id).max().unwrap_or(0) + 1;
            let now = chrono::Utc::now().naive_utc();
            let position = taxon
                .position
                .unwrap_or_else(|| next_position(&rows, taxon.parent_id));
            let stored = Taxon {
                id,
                code: taxon.code,
                parent_id: taxon.parent_id,
                parent: None,
                position,
                children: Vec::new(),
                translations: taxon
                    .translations
                    .into_iter()
                    .map(|t| (t.locale.clone(), t))
                    .collect(),
                created_at: now,
                updated_at: now,
            };
            rows.push(stored.clone());
            Ok(hydrate(&rows, stored))
        }

        async fn update_taxon(&self, plan: TaxonPlan<TaxonUpdate>) -> Result<Taxon> {
            let mut rows = self.rows();
            let update = plan(&mut RowsReader(&rows))?;
            let position = update
                .position
                .unwrap_or_else(|| next_position(&rows, update.parent_id));
            let index = rows
                .iter()
                .position(|t| t.id == update.id)
                .ok_or_else(|| Error::from(DatabaseError::NotFound("Taxon".to_string())))?;
            let row = &mut rows[index];
            row.parent_id = update.parent_id;
            row.position = position;
            row.translations = update
                .translations
                .into_iter()
                .map(|t| (t.locale.clone(), t))
                .collect();
            let stored = row.clone();
            Ok(hydrate(&rows, stored))
        }

        async fn delete_taxon(&self, id: i64) -> Result<usize> {
            let mut rows = self.rows();
            let mut doomed = vec![id];
            let mut index = 0;
            while index < doomed.len() {
                let parent = doomed[index];
                doomed.extend(rows.iter().filter(|t| t.parent_id == Some(parent)).map(|t| t.id));
                index += 1;
            }
            let before = rows.len();
            rows.retain(|t| !doomed.contains(&t.id));
            Ok(before - rows.len())
        }
    }

    fn service() -> TaxonService {
        TaxonService::new(
            Arc::new(InMemoryTaxons::default()),
            Arc::new(FixedLocales(vec!["en_US", "nl_NL"])),
        )
    }

    fn input(code: &str, parent: Option<&str>, translations: &[(&str, &str, &str)]) -> TaxonInput {
        TaxonInput {
            code: Some(code.to_string()),
            parent: parent.map(|p| Some(p.to_string())),
            position: None,
            translations: Some(
                translations
                    .iter()
                    .map(|(locale, name, slug)| {
                        (
                            locale.to_string(),
                            TranslationInput {
                                name: Some(name.to_string()),
                                slug: Some(slug.to_string()),
                                description: None,
                            },
                        )
                    })
                    .collect::<BTreeMap<_, _>>(),
            ),
        }
    }

    fn field_errors(err: Error) -> FieldErrors {
        match err {
            Error::Validation(ValidationError::Fields(errors)) => errors,
            other => panic!("expected field errors, got {other:?}"),
        }
    }

    async fn seed(service: &TaxonService) -> (Taxon, Taxon, Taxon) {
        let category = service
            .create_taxon(input("category", None, &[("en_US", "Category", "category")]))
            .await
            .unwrap();
        let t_shirts = service
            .create_taxon(input(
                "t_shirts",
                Some("category"),
                &[("en_US", "T-Shirts", "t-shirts")],
            ))
            .await
            .unwrap();
        let women = service
            .create_taxon(input(
                "women",
                Some("t_shirts"),
                &[("en_US", "Women", "t-shirts/women")],
            ))
            .await
            .unwrap();
        (category, t_shirts, women)
    }

    #[tokio::test]
    async fn create_then_show_returns_submitted_data() {
        let service = service();
        let created = service
            .create_taxon(input(
                "fluffy_pets",
                None,
                &[
                    ("en_US", "Fluffy Pets", "fluffy-pets"),
                    ("nl_NL", "Pluizige Huisdieren", "pluizige-huisdieren"),
                ],
            ))
            .await
            .unwrap();

        let shown = service.get_taxon(created.id).unwrap();
        assert_eq!(shown.code, "fluffy_pets");
        assert_eq!(shown.translations.len(), 2);
        assert_eq!(shown.translation("nl_NL").unwrap().slug, "pluizige-huisdieren");
    }

    #[tokio::test]
    async fn create_rejects_duplicate_code_and_unknown_references() {
        let service = service();
        seed(&service).await;

        let err = service
            .create_taxon(input("women", Some("shoes"), &[("de_DE", "Frauen", "frauen")]))
            .await
            .unwrap_err();

        let errors = field_errors(err);
        assert!(errors.contains("code"));
        assert!(errors.contains("parent"));
        assert!(errors.contains("translations.de_DE"));
    }

    #[tokio::test]
    async fn create_rejects_slug_taken_in_same_locale() {
        let service = service();
        seed(&service).await;

        let err = service
            .create_taxon(input("ladies", None, &[("en_US", "Ladies", "t-shirts/women")]))
            .await
            .unwrap_err();

        assert!(field_errors(err).contains("translations.en_US.slug"));
    }

    #[tokio::test]
    async fn children_are_appended_after_siblings() {
        let service = service();
        let (_, t_shirts, women) = seed(&service).await;
        let men = service
            .create_taxon(input("men", Some("t_shirts"), &[("en_US", "Men", "t-shirts/men")]))
            .await
            .unwrap();

        assert_eq!(women.position, 0);
        assert_eq!(men.position, 1);
        let t_shirts = service.get_taxon(t_shirts.id).unwrap();
        assert_eq!(t_shirts.children, vec!["women".to_string(), "men".to_string()]);
    }

    #[tokio::test]
    async fn replace_moves_taxon_and_replaces_translations() {
        let service = service();
        let (_, _, women) = seed(&service).await;
        service
            .create_taxon(input("books", None, &[("en_US", "Books", "books")]))
            .await
            .unwrap();

        service
            .replace_taxon(
                women.id,
                input("women", Some("books"), &[("nl_NL", "Vrouwen", "vrouwen")]),
            )
            .await
            .unwrap();

        let shown = service.get_taxon(women.id).unwrap();
        assert_eq!(shown.parent.as_deref(), Some("books"));
        assert!(shown.translation("en_US").is_none());
        assert_eq!(shown.translation("nl_NL").unwrap().name, "Vrouwen");
    }

    #[tokio::test]
    async fn replace_without_parent_moves_to_root() {
        let service = service();
        let (_, _, women) = seed(&service).await;

        let mut replacement = input("women", None, &[("en_US", "Women", "women")]);
        replacement.code = None;
        let updated = service.replace_taxon(women.id, replacement).await.unwrap();

        assert_eq!(updated.parent_id, None);
    }

    #[tokio::test]
    async fn replace_keeps_own_slug() {
        let service = service();
        let (_, _, women) = seed(&service).await;

        let updated = service
            .replace_taxon(
                women.id,
                input("women", Some("t_shirts"), &[("en_US", "Ladies", "t-shirts/women")]),
            )
            .await
            .unwrap();

        assert_eq!(updated.translation("en_US").unwrap().name, "Ladies");
        assert_eq!(updated.position, women.position);
    }

    #[tokio::test]
    async fn patch_rejects_moving_under_descendant() {
        let service = service();
        let (category, _, _) = seed(&service).await;

        let patch = TaxonInput {
            parent: Some(Some("women".to_string())),
            ..Default::default()
        };
        let err = service.patch_taxon(category.id, patch).await.unwrap_err();
        assert!(field_errors(err).contains("parent"));

        let self_parent = TaxonInput {
            parent: Some(Some("category".to_string())),
            ..Default::default()
        };
        let err = service.patch_taxon(category.id, self_parent).await.unwrap_err();
        assert!(field_errors(err).contains("parent"));
    }

    #[tokio::test]
    async fn patch_changes_only_given_fields() {
        let service = service();
        let (_, _, women) = seed(&service).await;

        let mut translations = BTreeMap::new();
        translations.insert(
            "en_US".to_string(),
            TranslationInput {
                name: Some("Girl".to_string()),
                slug: Some("girl".to_string()),
                description: None,
            },
        );
        service
            .patch_taxon(
                women.id,
                TaxonInput {
                    translations: Some(translations),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let shown = service.get_taxon(women.id).unwrap();
        assert_eq!(shown.parent.as_deref(), Some("t_shirts"));
        assert_eq!(shown.translation("en_US").unwrap().slug, "girl");
    }

    #[tokio::test]
    async fn missing_taxon_is_not_found() {
        let service = service();

        assert!(service.get_taxon(42).unwrap_err().is_not_found());
        assert!(service
            .patch_taxon(42, TaxonInput::default())
            .await
            .unwrap_err()
            .is_not_found());
        assert!(service.delete_taxon(42).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn delete_removes_subtree_and_second_delete_is_not_found() {
        let service = service();
        let (_, t_shirts, women) = seed(&service).await;

        service.delete_taxon(t_shirts.id).await.unwrap();

        assert!(service.get_taxon(women.id).unwrap_err().is_not_found());
        assert!(service
            .delete_taxon(t_shirts.id)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn pages_past_the_end_are_empty() {
        let service = service();
        seed(&service).await;

        let first = service.get_taxons(PageRequest::new(1, 2)).unwrap();
        assert_eq!(first.total, 3);
        assert_eq!(first.pages, 2);
        assert_eq!(first.items.len(), 2);

        let beyond = service.get_taxons(PageRequest::new(5, 2)).unwrap();
        assert_eq!(beyond.page, 5);
        assert!(beyond.items.is_empty());
    }
}
