//! Case-style renaming for record keys and enumerant names.

use convert_case::{Case, Casing};

/// A naming convention applied to serialized names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseStyle {
    /// `fooBar`
    CamelCase,
    /// `FooBar`
    PascalCase,
    /// `foo_bar`
    SnakeCase,
    /// `FOO_BAR`
    ScreamingSnakeCase,
    /// `foo-bar`
    KebabCase,
}

impl CaseStyle {
    /// Renames `name` into this style.
    ///
    /// ```rust
    /// use kryo::CaseStyle;
    ///
    /// assert_eq!(CaseStyle::KebabCase.rename("BinaryOperator"), "binary-operator");
    /// assert_eq!(CaseStyle::ScreamingSnakeCase.rename("xMax"), "X_MAX");
    /// ```
    pub fn rename(self, name: &str) -> String {
        let case = match self {
            CaseStyle::CamelCase => Case::Camel,
            CaseStyle::PascalCase => Case::Pascal,
            CaseStyle::SnakeCase => Case::Snake,
            CaseStyle::ScreamingSnakeCase => Case::ScreamingSnake,
            CaseStyle::KebabCase => Case::Kebab,
        };
        name.to_case(case)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_styles() {
        assert_eq!(CaseStyle::CamelCase.rename("x_min"), "xMin");
        assert_eq!(CaseStyle::PascalCase.rename("xMin"), "XMin");
        assert_eq!(CaseStyle::SnakeCase.rename("yMax"), "y_max");
        assert_eq!(CaseStyle::KebabCase.rename("yMax"), "y-max");
    }
}
