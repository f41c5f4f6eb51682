//! Declarative validation for product input.
//!
//! Each operation has a table of per-field rule lists. [`check`] walks a
//! table against a [`ProductInput`] and reports at most one message per
//! field, in table order. Evaluation is pure: the only fact that needs the
//! database (is this name taken?) is looked up beforehand and passed in as
//! [`Uniqueness`].

use axum_helpers::FieldErrors;
use serde_json::Value;

use crate::image::ImageKind;
use crate::input::{IMAGE_FIELD, ProductInput, UploadedFile};
use crate::models::{NewProduct, ProductChanges, ValidImage};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    /// Skip the field entirely when it is absent from the request
    Sometimes,
    Required,
    /// `null` passes and ends evaluation for the field
    Nullable,
    String,
    Numeric,
    /// Lower bound on the value, length or kilobytes depending on the field
    Min(f64),
    /// Upper bound on the value, length or kilobytes depending on the field
    Max(f64),
    Image,
    /// Allowed file extensions, matched against the detected image type
    Mimes(&'static [&'static str]),
    /// Value must not already be used by another product
    Unique,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRules {
    pub field: &'static str,
    pub rules: &'static [Rule],
}

const IMAGE_MIMES: &[&str] = &["jpeg", "png", "jpg", "gif"];

/// Rules for creating a product
pub const STORE_RULES: &[FieldRules] = &[
    FieldRules {
        field: "name",
        rules: &[Rule::Required, Rule::String, Rule::Max(255.0), Rule::Unique],
    },
    FieldRules {
        field: "category",
        rules: &[Rule::Required, Rule::String, Rule::Max(255.0)],
    },
    FieldRules {
        field: "price",
        rules: &[Rule::Required, Rule::Numeric, Rule::Min(0.0)],
    },
    FieldRules {
        field: "rating",
        rules: &[Rule::Nullable, Rule::Numeric, Rule::Min(0.0), Rule::Max(5.0)],
    },
    FieldRules {
        field: "description",
        rules: &[Rule::Nullable, Rule::String],
    },
    FieldRules {
        field: IMAGE_FIELD,
        rules: &[Rule::Nullable, Rule::Image, Rule::Mimes(IMAGE_MIMES), Rule::Max(2048.0)],
    },
];

/// Rules for updating a product. `Unique` ignores the product being updated.
pub const UPDATE_RULES: &[FieldRules] = &[
    FieldRules {
        field: "name",
        rules: &[
            Rule::Sometimes,
            Rule::Required,
            Rule::String,
            Rule::Max(255.0),
            Rule::Unique,
        ],
    },
    FieldRules {
        field: "category",
        rules: &[Rule::Sometimes, Rule::Required, Rule::String, Rule::Max(255.0)],
    },
    FieldRules {
        field: "price",
        rules: &[Rule::Sometimes, Rule::Required, Rule::Numeric, Rule::Min(0.0)],
    },
    FieldRules {
        field: "rating",
        rules: &[Rule::Nullable, Rule::Numeric, Rule::Min(0.0), Rule::Max(5.0)],
    },
    FieldRules {
        field: "description",
        rules: &[Rule::Nullable, Rule::String],
    },
    FieldRules {
        field: IMAGE_FIELD,
        rules: &[Rule::Nullable, Rule::Image, Rule::Mimes(IMAGE_MIMES), Rule::Max(2048.0)],
    },
];

/// Fields whose submitted value is already in use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Uniqueness {
    taken: Vec<&'static str>,
}

impl Uniqueness {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_taken(mut self, field: &'static str) -> Self {
        self.taken.push(field);
        self
    }

    fn is_taken(&self, field: &str) -> bool {
        self.taken.contains(&field)
    }
}

enum Subject<'a> {
    Missing,
    Null,
    Value(&'a Value),
    File(&'a UploadedFile),
}

impl<'a> Subject<'a> {
    fn of(input: &'a ProductInput, field: &str) -> Self {
        if field == IMAGE_FIELD {
            if let Some(file) = input.image() {
                return Subject::File(file);
            }
        }
        match input.get(field) {
            None => Subject::Missing,
            Some(Value::Null) => Subject::Null,
            Some(value) => Subject::Value(value),
        }
    }

    fn is_filled(&self) -> bool {
        match self {
            Subject::Missing | Subject::Null => false,
            Subject::Value(Value::Array(items)) => !items.is_empty(),
            Subject::Value(Value::Object(map)) => !map.is_empty(),
            Subject::Value(_) => true,
            Subject::File(file) => !file.bytes.is_empty(),
        }
    }
}

/// Check `input` against `table`.
pub fn check(
    table: &[FieldRules],
    input: &ProductInput,
    uniqueness: &Uniqueness,
) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    for entry in table {
        if let Some(message) = check_field(entry, input, uniqueness) {
            errors.add(entry.field, message);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_field(entry: &FieldRules, input: &ProductInput, uniqueness: &Uniqueness) -> Option<String> {
    let subject = Subject::of(input, entry.field);
    let rules = entry.rules;
    let attribute = entry.field.replace('_', " ");

    if rules.contains(&Rule::Sometimes) && matches!(subject, Subject::Missing) {
        return None;
    }
    if rules.contains(&Rule::Nullable) && matches!(subject, Subject::Null) {
        return None;
    }

    let numeric = rules.contains(&Rule::Numeric);

    for rule in rules {
        let passes = match *rule {
            Rule::Sometimes | Rule::Nullable => true,
            Rule::Required => {
                if !subject.is_filled() {
                    return Some(format!("The {} field is required.", attribute));
                }
                true
            }
            // Everything below only applies to fields that were sent
            _ if matches!(subject, Subject::Missing) => return None,
            Rule::String => matches!(subject, Subject::Value(Value::String(_))),
            Rule::Numeric => as_number(&subject).is_some(),
            Rule::Min(min) => size(&subject, numeric).is_none_or(|s| s >= min),
            Rule::Max(max) => size(&subject, numeric).is_none_or(|s| s <= max),
            Rule::Image => image_kind(&subject).is_some(),
            Rule::Mimes(allowed) => image_kind(&subject).is_some_and(|k| k.matches_any(allowed)),
            Rule::Unique => !uniqueness.is_taken(entry.field),
        };

        if !passes {
            return Some(message(*rule, &attribute, &subject, numeric));
        }
    }

    None
}

fn message(rule: Rule, attribute: &str, subject: &Subject<'_>, numeric: bool) -> String {
    let unit = match subject {
        _ if numeric => "",
        Subject::File(_) => " kilobytes",
        Subject::Value(Value::String(_)) => " characters",
        _ => "",
    };

    match rule {
        Rule::String => format!("The {} field must be a string.", attribute),
        Rule::Numeric => format!("The {} field must be a number.", attribute),
        Rule::Min(min) => format!("The {} field must be at least {}{}.", attribute, min, unit),
        Rule::Max(max) => format!(
            "The {} field must not be greater than {}{}.",
            attribute, max, unit
        ),
        Rule::Image => format!("The {} field must be an image.", attribute),
        Rule::Mimes(allowed) => format!(
            "The {} field must be a file of type: {}.",
            attribute,
            allowed.join(", ")
        ),
        Rule::Unique => format!("The {} has already been taken.", attribute),
        Rule::Required => format!("The {} field is required.", attribute),
        Rule::Sometimes | Rule::Nullable => format!("The {} field is invalid.", attribute),
    }
}

fn as_number(subject: &Subject<'_>) -> Option<f64> {
    match subject {
        Subject::Value(value) => number(value),
        _ => None,
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Size of the subject as compared by `Min` / `Max`.
fn size(subject: &Subject<'_>, numeric: bool) -> Option<f64> {
    match subject {
        Subject::File(file) => Some(file.kilobytes()),
        _ if numeric => as_number(subject),
        Subject::Value(Value::String(s)) => Some(s.chars().count() as f64),
        Subject::Value(Value::Array(items)) => Some(items.len() as f64),
        _ => None,
    }
}

fn image_kind(subject: &Subject<'_>) -> Option<ImageKind> {
    match subject {
        Subject::File(file) => ImageKind::sniff(&file.bytes),
        _ => None,
    }
}

fn text(input: &ProductInput, field: &str) -> Option<String> {
    input.str(field).map(str::to_string)
}

fn valid_image(input: &ProductInput) -> Option<ValidImage> {
    let file = input.image()?;
    ImageKind::sniff(&file.bytes).map(|kind| ValidImage {
        kind,
        bytes: file.bytes.clone(),
    })
}

/// Validate a create request and extract its typed values.
pub fn validate_store(
    input: &ProductInput,
    uniqueness: &Uniqueness,
) -> Result<NewProduct, FieldErrors> {
    check(STORE_RULES, input, uniqueness)?;

    let required = |field: &str| FieldErrors::single(field, format!("The {} field is required.", field));

    Ok(NewProduct {
        name: text(input, "name").ok_or_else(|| required("name"))?,
        category: text(input, "category").ok_or_else(|| required("category"))?,
        price: input
            .get("price")
            .and_then(number)
            .ok_or_else(|| required("price"))?,
        rating: input.get("rating").and_then(number),
        description: text(input, "description"),
        image: valid_image(input),
    })
}

/// Validate an update request. Absent fields come back as `None` and are
/// left unchanged.
pub fn validate_update(
    input: &ProductInput,
    uniqueness: &Uniqueness,
) -> Result<ProductChanges, FieldErrors> {
    check(UPDATE_RULES, input, uniqueness)?;

    Ok(ProductChanges {
        name: text(input, "name"),
        category: text(input, "category"),
        price: input.get("price").and_then(number),
        rating: input
            .has("rating")
            .then(|| input.get("rating").and_then(number)),
        description: input
            .has("description")
            .then(|| text(input, "description")),
        image: valid_image(input),
    })
}
