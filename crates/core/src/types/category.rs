//! Item categories.
//!
//! A closed set of two-letter codes. The code is what gets stored and sent
//! over the wire; the label is for display.

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`ItemCategory`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CategoryError {
    /// No code was given.
    #[error("category cannot be empty")]
    Empty,
    /// The code is not one of the known categories.
    #[error("\"{0}\" is not a valid category")]
    Unknown(String),
}

macro_rules! categories {
    ($($variant:ident => ($code:literal, $label:literal)),+ $(,)?) => {
        /// Category of a donated item.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum ItemCategory {
            $(
                #[doc = $label]
                $variant,
            )+
        }

        impl ItemCategory {
            /// Every category, in display order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Two-letter storage code.
            #[must_use]
            pub const fn code(self) -> &'static str {
                match self {
                    $(Self::$variant => $code,)+
                }
            }

            /// Display label.
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            /// Parse a category from its code (case-insensitive).
            ///
            /// # Errors
            ///
            /// Returns [`CategoryError::Empty`] for blank input and
            /// [`CategoryError::Unknown`] for codes outside the enumeration.
            pub fn parse(s: &str) -> Result<Self, CategoryError> {
                let code = s.trim();
                if code.is_empty() {
                    return Err(CategoryError::Empty);
                }
                match code.to_ascii_uppercase().as_str() {
                    $($code => Ok(Self::$variant),)+
                    _ => Err(CategoryError::Unknown(code.to_owned())),
                }
            }
        }
    };
}

categories! {
    Roupas => ("RO", "Roupas"),
    Moveis => ("MO", "Móveis"),
    Comidas => ("CO", "Comidas"),
    Pereciveis => ("PE", "Perecíveis"),
    Eletronicos => ("EL", "Eletrônicos"),
    Livros => ("LI", "Livros"),
    Brinquedos => ("BR", "Brinquedos"),
    UtensiliosDomesticos => ("UD", "Utensílios Domésticos"),
    MaterialEscolar => ("MS", "Material Escolar"),
    Ferramentas => ("FE", "Ferramentas"),
    JornaisRevistas => ("JR", "Jornais/Revistas"),
    Cobertores => ("CB", "Cobertores"),
    Calcados => ("CA", "Calçados"),
    Acessorios => ("AC", "Acessórios"),
    InstrumentosMusicais => ("IM", "Instrumentos Musicais"),
    ProdutosHigiene => ("PH", "Produtos de Higiene"),
    Medicamentos => ("ME", "Medicamentos"),
    Veiculos => ("VE", "Veículos"),
    Eletrodomesticos => ("ED", "Eletrodomésticos"),
    MateriaisConstrucao => ("MC", "Materiais de Construção"),
    Outros => ("OU", "Outros"),
}

impl std::fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for ItemCategory {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ItemCategory {
    type Error = CategoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ItemCategory> for String {
    fn from(category: ItemCategory) -> Self {
        category.code().to_owned()
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ItemCategory {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ItemCategory {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ItemCategory {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.code(), buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_has_twenty_one_unique_codes() {
        assert_eq!(ItemCategory::ALL.len(), 21);
        let mut codes: Vec<_> = ItemCategory::ALL.iter().map(|c| c.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 21);
    }

    #[test]
    fn test_every_code_parses_back() {
        for category in ItemCategory::ALL {
            assert_eq!(ItemCategory::parse(category.code()).unwrap(), *category);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(ItemCategory::parse(" ro ").unwrap(), ItemCategory::Roupas);
    }

    #[test]
    fn test_parse_rejects_unknown_and_empty() {
        assert_eq!(ItemCategory::parse(""), Err(CategoryError::Empty));
        assert_eq!(
            ItemCategory::parse("XX"),
            Err(CategoryError::Unknown("XX".to_owned()))
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(ItemCategory::JornaisRevistas.label(), "Jornais/Revistas");
        assert_eq!(
            ItemCategory::MateriaisConstrucao.label(),
            "Materiais de Construção"
        );
    }

    #[test]
    fn test_serializes_as_code() {
        assert_eq!(
            serde_json::to_string(&ItemCategory::Livros).unwrap(),
            "\"LI\""
        );
        assert!(serde_json::from_str::<ItemCategory>("\"ZZ\"").is_err());
    }
}
