//! Client-supplied taxon data and its shape validation.
//!
//! Checks here only look at the input itself. Checks against stored data
//! (unique code, existing parent, registered locale, unique slug) live in
//! the service.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_CODE_LENGTH, MAX_TRANSLATION_FIELD_LENGTH};
use crate::errors::FieldErrors;
use crate::Result;

use super::{Taxon, TaxonTranslation};

/// Raw taxon fields as received from a client.
///
/// `parent` distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`), which detaches the taxon to the root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxonInput {
    pub code: Option<String>,
    pub parent: Option<Option<String>>,
    pub position: Option<i32>,
    pub translations: Option<BTreeMap<String, TranslationInput>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<Option<String>>,
}

#[derive(Debug)]
pub(crate) struct ValidatedCreate {
    pub code: String,
    pub parent: Option<String>,
    pub position: Option<i32>,
    pub translations: Vec<TaxonTranslation>,
}

#[derive(Debug)]
pub(crate) struct ValidatedReplace {
    pub parent: Option<String>,
    pub position: Option<i32>,
    pub translations: Vec<TaxonTranslation>,
}

#[derive(Debug)]
pub(crate) struct ValidatedPatch {
    /// `None` keeps the current parent.
    pub parent: Option<Option<String>>,
    pub position: Option<i32>,
    /// Current translations with the patch merged in.
    pub translations: Vec<TaxonTranslation>,
}

impl TaxonInput {
    pub(crate) fn validate_create(self) -> Result<ValidatedCreate> {
        let mut errors = FieldErrors::default();

        let code = match self.code {
            Some(code) if !code.trim().is_empty() => {
                check_code_format(&code, &mut errors);
                Some(code)
            }
            _ => {
                errors.add("code", "Please enter taxon code.");
                None
            }
        };
        check_position(self.position, &mut errors);
        let translations = required_translations(self.translations, &mut errors);

        errors.into_result()?;
        Ok(ValidatedCreate {
            code: code.unwrap_or_default(),
            parent: self.parent.and_then(normalize_parent),
            position: self.position,
            translations,
        })
    }

    pub(crate) fn validate_replace(self, current_code: &str) -> Result<ValidatedReplace> {
        let mut errors = FieldErrors::default();

        check_code_unchanged(self.code.as_deref(), current_code, &mut errors);
        check_position(self.position, &mut errors);
        let translations = required_translations(self.translations, &mut errors);

        errors.into_result()?;
        Ok(ValidatedReplace {
            parent: self.parent.and_then(normalize_parent),
            position: self.position,
            translations,
        })
    }

    pub(crate) fn validate_patch(self, current: &Taxon) -> Result<ValidatedPatch> {
        let mut errors = FieldErrors::default();

        check_code_unchanged(self.code.as_deref(), &current.code, &mut errors);
        check_position(self.position, &mut errors);

        let mut merged = current.translations.clone();
        for (locale, input) in self.translations.unwrap_or_default() {
            let field = format!("translations.{locale}");
            let translation = match merged.remove(&locale) {
                Some(existing) => merge_translation(existing, input, &field, &mut errors),
                None => new_translation(&locale, input, &field, &mut errors),
            };
            if let Some(translation) = translation {
                merged.insert(locale, translation);
            }
        }

        errors.into_result()?;
        Ok(ValidatedPatch {
            parent: self.parent.map(normalize_parent),
            position: self.position,
            translations: merged.into_values().collect(),
        })
    }
}

/// An empty parent code means "no parent".
fn normalize_parent(parent: Option<String>) -> Option<String> {
    parent.filter(|code| !code.trim().is_empty())
}

fn check_code_format(code: &str, errors: &mut FieldErrors) {
    if code.len() > MAX_CODE_LENGTH {
        errors.add(
            "code",
            format!("Taxon code must not be longer than {MAX_CODE_LENGTH} characters."),
        );
    }
    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    {
        errors.add(
            "code",
            "Taxon code can only be comprised of letters, numbers, dashes and underscores.",
        );
    }
}

fn check_code_unchanged(code: Option<&str>, current_code: &str, errors: &mut FieldErrors) {
    if let Some(code) = code {
        if code != current_code {
            errors.add("code", "Taxon code cannot be changed.");
        }
    }
}

fn check_position(position: Option<i32>, errors: &mut FieldErrors) {
    if matches!(position, Some(p) if p < 0) {
        errors.add("position", "Position must be zero or greater.");
    }
}

fn required_translations(
    translations: Option<BTreeMap<String, TranslationInput>>,
    errors: &mut FieldErrors,
) -> Vec<TaxonTranslation> {
    let translations = translations.unwrap_or_default();
    if translations.is_empty() {
        errors.add("translations", "Please add at least one translation.");
        return Vec::new();
    }

    translations
        .into_iter()
        .filter_map(|(locale, input)| {
            let field = format!("translations.{locale}");
            new_translation(&locale, input, &field, errors)
        })
        .collect()
}

fn new_translation(
    locale: &str,
    input: TranslationInput,
    field: &str,
    errors: &mut FieldErrors,
) -> Option<TaxonTranslation> {
    let name = required_text(input.name, &format!("{field}.name"), "name", errors);
    let slug = required_text(input.slug, &format!("{field}.slug"), "slug", errors);
    Some(TaxonTranslation {
        locale: locale.to_string(),
        name: name?,
        slug: slug?,
        description: input.description.and_then(normalize_description),
    })
}

fn merge_translation(
    existing: TaxonTranslation,
    input: TranslationInput,
    field: &str,
    errors: &mut FieldErrors,
) -> Option<TaxonTranslation> {
    let name = match input.name {
        Some(name) => required_text(Some(name), &format!("{field}.name"), "name", errors),
        None => Some(existing.name),
    };
    let slug = match input.slug {
        Some(slug) => required_text(Some(slug), &format!("{field}.slug"), "slug", errors),
        None => Some(existing.slug),
    };
    let description = match input.description {
        Some(description) => normalize_description(description),
        None => existing.description,
    };
    Some(TaxonTranslation {
        locale: existing.locale,
        name: name?,
        slug: slug?,
        description,
    })
}

fn required_text(
    value: Option<String>,
    field: &str,
    label: &str,
    errors: &mut FieldErrors,
) -> Option<String> {
    match value {
        Some(value) if !value.trim().is_empty() => {
            if value.len() > MAX_TRANSLATION_FIELD_LENGTH {
                errors.add(
                    field,
                    format!(
                        "Taxon {label} must not be longer than {MAX_TRANSLATION_FIELD_LENGTH} characters."
                    ),
                );
                None
            } else {
                Some(value)
            }
        }
        _ => {
            errors.add(field, format!("Please enter taxon {label}."));
            None
        }
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description.filter(|d| !d.trim().is_empty())
}
