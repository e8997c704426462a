use std::fmt;

use uuid::Uuid;

use crate::error::AppError;

const SUBTREE_SUFFIX: &str = "/*";

/// Category filter as accepted on the search boundary.
///
/// - `<uuid>` matches one category by id
/// - `<name>` matches one category by name, ignoring case
/// - `<uuid or name>/*` matches that category and every descendant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    Id(Uuid),
    Name(String),
    Subtree(Box<CategoryFilter>),
}

impl CategoryFilter {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AppError::InvalidFilter(
                "category filter cannot be empty".to_string(),
            ));
        }

        match raw.strip_suffix(SUBTREE_SUFFIX) {
            Some(root) => Ok(CategoryFilter::Subtree(Box::new(parse_single(root)?))),
            None => parse_single(raw),
        }
    }
}

/// True when `name` can be selected through [`CategoryFilter::Name`].
pub fn is_addressable_name(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && !name.contains(['*', '/']) && Uuid::parse_str(name).is_err()
}

fn parse_single(raw: &str) -> Result<CategoryFilter, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::InvalidFilter(
            "subtree filter needs a root category".to_string(),
        ));
    }
    if raw.contains(['*', '/']) {
        return Err(AppError::InvalidFilter(format!(
            "malformed category filter: {raw}"
        )));
    }

    Ok(match Uuid::parse_str(raw) {
        Ok(id) => CategoryFilter::Id(id),
        Err(_) => CategoryFilter::Name(raw.to_string()),
    })
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::Id(id) => write!(f, "{id}"),
            CategoryFilter::Name(name) => write!(f, "{name}"),
            CategoryFilter::Subtree(root) => write!(f, "{root}{SUBTREE_SUFFIX}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::CategoryFilter;
    use crate::error::AppError;

    #[test]
    fn parses_id_name_and_subtree() {
        let id = Uuid::from_u128(7);

        assert_eq!(
            CategoryFilter::parse(&id.to_string()).unwrap(),
            CategoryFilter::Id(id)
        );
        assert_eq!(
            CategoryFilter::parse(" SUV ").unwrap(),
            CategoryFilter::Name("SUV".to_string())
        );
        assert_eq!(
            CategoryFilter::parse("Cars/*").unwrap(),
            CategoryFilter::Subtree(Box::new(CategoryFilter::Name("Cars".to_string())))
        );
    }

    #[test]
    fn rejects_malformed_filters() {
        for raw in ["", "   ", "/*", "SU*V", "Cars/SUV", "Cars/*/*"] {
            assert!(
                matches!(CategoryFilter::parse(raw), Err(AppError::InvalidFilter(_))),
                "expected {raw:?} to be rejected"
            );
        }
    }

    #[test]
    fn display_round_trips_subtree_syntax() {
        let filter = CategoryFilter::parse("Vans/*").unwrap();
        assert_eq!(filter.to_string(), "Vans/*");
    }
}
